pub mod content;
pub mod entity;
pub mod room;
pub mod rules;
pub mod types;
pub mod verb;
#[allow(clippy::module_inception)]
pub mod world;

pub use content::{load_dir, load_from_strings, ContentError};
pub use entity::{Behavior, Entity, EntityKind, Location, SpriteStats, SpriteTemplate, DEFAULT_STATE};
pub use room::{Direction, Room};
pub use rules::TransformRule;
pub use types::{EntityId, Props, PropertyValue, RoomId, VerbId};
pub use verb::Verb;
pub use world::World;
