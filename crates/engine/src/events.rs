use world::RoomId;

/// Who should see a broadcast line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// One named player.
    Player(String),
    /// Everyone in a room, minus the excluded names.
    Room { room: RoomId, exclude: Vec<String> },
    /// Every connected player, minus at most one name.
    All { exclude: Option<String> },
}

/// A player-visible line produced while resolving a command, addressed to
/// someone other than the actor (the actor gets the command reply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEvent {
    pub audience: Audience,
    pub text: String,
}

impl GameEvent {
    pub fn to_player(player: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            audience: Audience::Player(player.into()),
            text: text.into(),
        }
    }

    pub fn to_room(room: RoomId, text: impl Into<String>) -> Self {
        Self {
            audience: Audience::Room {
                room,
                exclude: Vec::new(),
            },
            text: text.into(),
        }
    }

    pub fn to_room_except(room: RoomId, exclude: &[&str], text: impl Into<String>) -> Self {
        Self {
            audience: Audience::Room {
                room,
                exclude: exclude.iter().map(|s| s.to_string()).collect(),
            },
            text: text.into(),
        }
    }

    pub fn to_all_except(exclude: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            audience: Audience::All {
                exclude: Some(exclude.into()),
            },
            text: text.into(),
        }
    }

    pub fn to_all(text: impl Into<String>) -> Self {
        Self {
            audience: Audience::All { exclude: None },
            text: text.into(),
        }
    }
}
