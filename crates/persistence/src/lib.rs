pub mod error;
pub mod manager;
pub mod snapshot;

pub use error::PersistenceError;
pub use manager::SnapshotManager;
pub use snapshot::{capture, restore, RestoredState, WorldSnapshot, SNAPSHOT_VERSION};
