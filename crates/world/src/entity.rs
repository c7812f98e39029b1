use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::{prop, EntityId, Props, RoomId, VerbId};

/// State label an entity starts in unless content says otherwise.
pub const DEFAULT_STATE: &str = "normal";

/// Where an entity currently is. Exactly one owner at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// On the floor of a room.
    Room(RoomId),
    /// In the named player's inventory.
    Carried(String),
    /// Inside a container entity or held by a sprite.
    Inside(EntityId),
    /// Out of play (consumed, or waiting to be spawned in).
    Removed,
}

impl Location {
    pub fn room(&self) -> Option<&RoomId> {
        match self {
            Location::Room(r) => Some(r),
            _ => None,
        }
    }
}

/// AI disposition tag for sprites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    Passive,
    Aggressive,
}

impl Behavior {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "passive" => Some(Behavior::Passive),
            "aggressive" => Some(Behavior::Aggressive),
            _ => None,
        }
    }
}

/// Combat and AI fields carried only by sprites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteStats {
    pub health: i32,
    pub max_health: i32,
    pub damage: i32,
    pub aggression: f64,
    pub behavior: Behavior,
    pub can_pickup: bool,
}

impl SpriteStats {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn is_hostile(&self) -> bool {
        self.aggression > 0.5
    }
}

/// Distinguishes plain objects from NPC sprites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Object,
    Sprite(SpriteStats),
}

/// Any object or sprite in the game world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub description: String,
    pub props: Props,
    /// The entity's row in the action matrix.
    pub verbs: BTreeSet<VerbId>,
    pub location: Location,
    pub state: String,
    /// Turns spent continuously in the current state.
    pub state_age: u64,
    pub kind: EntityKind,
}

impl Entity {
    pub fn object(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(id),
            name: name.into(),
            description: description.into(),
            props: Props::new(),
            verbs: BTreeSet::new(),
            location: Location::Removed,
            state: DEFAULT_STATE.to_string(),
            state_age: 0,
            kind: EntityKind::Object,
        }
    }

    pub fn accepts(&self, verb: &VerbId) -> bool {
        self.verbs.contains(verb)
    }

    pub fn is_sprite(&self) -> bool {
        matches!(self.kind, EntityKind::Sprite(_))
    }

    pub fn sprite(&self) -> Option<&SpriteStats> {
        match &self.kind {
            EntityKind::Sprite(s) => Some(s),
            EntityKind::Object => None,
        }
    }

    pub fn sprite_mut(&mut self) -> Option<&mut SpriteStats> {
        match &mut self.kind {
            EntityKind::Sprite(s) => Some(s),
            EntityKind::Object => None,
        }
    }

    /// Objects are takeable unless content says otherwise; sprites never are.
    pub fn is_takeable(&self) -> bool {
        match self.props.get(prop::TAKEABLE) {
            Some(v) => matches!(v, crate::types::PropertyValue::Bool(true)),
            None => !self.is_sprite(),
        }
    }

    pub fn is_container(&self) -> bool {
        self.props.flag(prop::CONTAINER)
    }

    pub fn is_weapon(&self) -> bool {
        self.props.flag(prop::WEAPON)
    }

    pub fn weapon_damage(&self) -> i64 {
        self.props.int(prop::DAMAGE).unwrap_or(0)
    }

    pub fn is_consumable(&self) -> bool {
        self.props.flag(prop::CONSUMABLE)
    }

    pub fn heal_amount(&self) -> i64 {
        self.props.int(prop::HEALTH_RESTORE).unwrap_or(0)
    }

    pub fn spawn_chance(&self) -> f64 {
        self.props.float(prop::SPAWN_CHANCE).unwrap_or(0.0)
    }

    /// Matches player-typed names: exact on name or id, else substring of
    /// the display name.
    pub fn matches_name(&self, wanted: &str) -> bool {
        let name = self.name.to_lowercase();
        name == wanted || self.id.as_str().to_lowercase() == wanted || name.contains(wanted)
    }
}

/// Blueprint the spawner builds sprites from. Spawned instances get fresh
/// identifiers derived from the template id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub health: i32,
    pub damage: i32,
    pub aggression: f64,
    pub behavior: Behavior,
    pub can_pickup: bool,
    pub spawn_chance: f64,
    pub verbs: BTreeSet<VerbId>,
}

impl SpriteTemplate {
    pub fn instantiate(&self, id: EntityId, room: RoomId) -> Entity {
        Entity {
            id,
            name: self.name.clone(),
            description: self.description.clone(),
            props: Props::new(),
            verbs: self.verbs.clone(),
            location: Location::Room(room),
            state: DEFAULT_STATE.to_string(),
            state_age: 0,
            kind: EntityKind::Sprite(SpriteStats {
                health: self.health,
                max_health: self.health,
                damage: self.damage,
                aggression: self.aggression,
                behavior: self.behavior,
                can_pickup: self.can_pickup,
            }),
        }
    }
}
