use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a room. World content addresses rooms by these strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

/// Identifies an object or sprite. Stable across state transformations;
/// spawned sprites get fresh ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

/// Identifies a verb in the action matrix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerbId(String);

macro_rules! id_impls {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        // Allows map lookups by &str without allocating.
        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

id_impls!(RoomId);
id_impls!(EntityId);
id_impls!(VerbId);

/// A typed property value. World content may only attach these kinds of
/// values to rooms and entities; the loader rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Property bag keyed by name. Engine code reads known keys through the
/// typed accessors; a key of the wrong kind reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(BTreeMap<String, PropertyValue>);

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(PropertyValue::Bool(true)))
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(PropertyValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(PropertyValue::Float(f)) => Some(*f),
            // Whole numbers in content are parsed as Int; accept them here.
            Some(PropertyValue::Int(n)) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(PropertyValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Property keys the engine itself understands.
pub mod prop {
    pub const TAKEABLE: &str = "takeable";
    pub const CONTAINER: &str = "container";
    pub const WEAPON: &str = "weapon";
    pub const DAMAGE: &str = "damage";
    pub const CONSUMABLE: &str = "consumable";
    pub const HEALTH_RESTORE: &str = "health_restore";
    pub const SPAWN_CHANCE: &str = "spawn_chance";
    pub const COLD: &str = "cold";
    pub const START: &str = "start";
}
