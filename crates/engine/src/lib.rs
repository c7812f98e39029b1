pub mod combat;
pub mod command;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod scene;
pub mod turn;

pub use command::CommandOutcome;
pub use config::{CombatConfig, GameConfig};
pub use coordinator::Coordinator;
pub use events::{Audience, GameEvent};
pub use turn::{TurnEvent, TurnEventKind};
