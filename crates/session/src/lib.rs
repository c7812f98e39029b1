use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use world::{EntityId, RoomId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// One line of text destined for a session.
#[derive(Debug, Clone)]
pub struct SessionOutput {
    pub session_id: SessionId,
    pub text: String,
    /// When true, the output router closes the session's write channel after
    /// delivering this message, dropping the TCP connection.
    pub disconnect: bool,
}

impl SessionOutput {
    pub fn new(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
            disconnect: false,
        }
    }

    /// A final message that disconnects the session after delivery.
    pub fn with_disconnect(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
            disconnect: true,
        }
    }
}

/// Connection-level state of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, name prompt outstanding.
    AwaitingName,
    /// Bound to the named player record.
    Playing(String),
}

/// Durable per-player view of the shared world. Exactly one record exists
/// per connected player name; it outlives individual commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub room: RoomId,
    pub inventory: BTreeSet<EntityId>,
    pub health: i32,
    pub max_health: i32,
    pub pvp_enabled: bool,
    pub turns: u64,
    pub kills: u64,
    pub deaths: u64,
    pub potions_consumed: u64,
}

impl PlayerRecord {
    pub fn new(name: impl Into<String>, room: RoomId, max_health: i32) -> Self {
        Self {
            name: name.into(),
            room,
            inventory: BTreeSet::new(),
            health: max_health,
            max_health,
            pvp_enabled: false,
            turns: 0,
            kills: 0,
            deaths: 0,
            potions_consumed: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Maps live sessions to player records and answers room-membership queries
/// for broadcasts. Single-threaded; the game loop is the only caller.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: BTreeMap<SessionId, SessionState>,
    players: BTreeMap<String, PlayerRecord>,
    name_to_session: BTreeMap<String, SessionId>,
    /// Records of players who disconnected (or were restored from a
    /// snapshot) and may reconnect under the same name.
    dormant: BTreeMap<String, PlayerRecord>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, id: SessionId) {
        self.sessions.insert(id, SessionState::AwaitingName);
    }

    pub fn state(&self, id: SessionId) -> Option<&SessionState> {
        self.sessions.get(&id)
    }

    /// Is this name bound to a live session? Two simultaneous connections
    /// may never share one record.
    pub fn name_in_use(&self, name: &str) -> bool {
        self.name_to_session.contains_key(name)
    }

    /// Bind a session to a player record, resuming a dormant record for the
    /// same name when one exists.
    pub fn bind_player(&mut self, id: SessionId, record: PlayerRecord) -> &PlayerRecord {
        let name = record.name.clone();
        let record = self.dormant.remove(&name).unwrap_or(record);
        self.sessions.insert(id, SessionState::Playing(name.clone()));
        self.name_to_session.insert(name.clone(), id);
        self.players.entry(name.clone()).or_insert(record);
        &self.players[&name]
    }

    /// Stash a record for later reconnection (snapshot restore at boot).
    pub fn add_dormant(&mut self, record: PlayerRecord) {
        self.dormant.insert(record.name.clone(), record);
    }

    pub fn dormant(&self, name: &str) -> Option<&PlayerRecord> {
        self.dormant.get(name)
    }

    pub fn dormant_players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.dormant.values()
    }

    /// Tear down a session. Returns the player record it was bound to, now
    /// parked in the dormant pool.
    pub fn disconnect(&mut self, id: SessionId) -> Option<String> {
        match self.sessions.remove(&id)? {
            SessionState::Playing(name) => {
                self.name_to_session.remove(&name);
                if let Some(record) = self.players.remove(&name) {
                    self.dormant.insert(name.clone(), record);
                }
                Some(name)
            }
            SessionState::AwaitingName => None,
        }
    }

    pub fn player(&self, name: &str) -> Option<&PlayerRecord> {
        self.players.get(name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut PlayerRecord> {
        self.players.get_mut(name)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.players.values()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Case-insensitive lookup of a connected player's proper name.
    pub fn resolve_player_name(&self, typed: &str) -> Option<String> {
        let wanted = typed.to_lowercase();
        self.players
            .keys()
            .find(|n| n.to_lowercase() == wanted)
            .cloned()
    }

    pub fn session_for(&self, name: &str) -> Option<SessionId> {
        self.name_to_session.get(name).copied()
    }

    pub fn player_for(&self, id: SessionId) -> Option<&str> {
        match self.sessions.get(&id)? {
            SessionState::Playing(name) => Some(name),
            SessionState::AwaitingName => None,
        }
    }

    /// Names of players in a room, sorted.
    pub fn players_in_room(&self, room: &RoomId) -> Vec<String> {
        self.players
            .values()
            .filter(|p| &p.room == room)
            .map(|p| p.name.clone())
            .collect()
    }

    pub fn all_sessions(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    /// Inventory sets keyed by player name, in the shape the world's
    /// consistency check expects.
    pub fn inventories(&self) -> BTreeMap<String, BTreeSet<EntityId>> {
        self.players
            .values()
            .map(|p| (p.name.clone(), p.inventory.clone()))
            .collect()
    }
}
