use std::collections::BTreeMap;
use std::fmt;

use crate::types::{prop, Props, RoomId};

/// Compass directions a room exit can point in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::Up,
        Direction::Down,
    ];

    /// Accepts full names and one-letter shorthands.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "north" | "n" => Some(Direction::North),
            "south" | "s" => Some(Direction::South),
            "east" | "e" => Some(Direction::East),
            "west" | "w" => Some(Direction::West),
            "up" | "u" => Some(Direction::Up),
            "down" | "d" => Some(Direction::Down),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location in the game world. Immutable after load; only the entities
/// inside a room change over time.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub description: String,
    pub exits: BTreeMap<Direction, RoomId>,
    pub props: Props,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: RoomId::new(id),
            name: name.into(),
            description: description.into(),
            exits: BTreeMap::new(),
            props: Props::new(),
        }
    }

    pub fn with_exit(mut self, dir: Direction, to: impl Into<String>) -> Self {
        self.exits.insert(dir, RoomId::new(to));
        self
    }

    pub fn exit(&self, dir: Direction) -> Option<&RoomId> {
        self.exits.get(&dir)
    }

    pub fn flag(&self, key: &str) -> bool {
        self.props.flag(key)
    }

    pub fn is_start(&self) -> bool {
        self.flag(prop::START)
    }

    pub fn is_cold(&self) -> bool {
        self.flag(prop::COLD)
    }
}
