pub mod channels;
pub mod line;
pub mod output_router;
pub mod server;
