use serde::{Deserialize, Serialize};
use session::PlayerRecord;
use world::{Entity, World};

use crate::error::PersistenceError;

pub const SNAPSHOT_VERSION: u32 = 1;

/// Full world snapshot: every entity as it stands (location, state, age,
/// properties, and sprite vitals), plus every player record and the turn
/// counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub turn: u64,
    pub spawn_serial: u64,
    pub players: Vec<PlayerRecord>,
    pub entities: Vec<Entity>,
}

/// What a restore hands back to the session layer.
#[derive(Debug)]
pub struct RestoredState {
    pub turn: u64,
    pub players: Vec<PlayerRecord>,
}

/// Capture the current world and player records.
pub fn capture<'a>(
    world: &World,
    players: impl IntoIterator<Item = &'a PlayerRecord>,
    turn: u64,
) -> WorldSnapshot {
    WorldSnapshot {
        version: SNAPSHOT_VERSION,
        turn,
        spawn_serial: world.spawn_serial(),
        players: players.into_iter().cloned().collect(),
        entities: world.entities().cloned().collect(),
    }
}

/// Restore a snapshot onto a freshly content-loaded world. Entities are
/// re-applied wholesale, so location/state/state-age round-trip exactly;
/// spawned sprites absent from content are recreated. Player records are
/// returned for the session layer to re-adopt.
pub fn restore(snapshot: WorldSnapshot, world: &mut World) -> Result<RestoredState, PersistenceError> {
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(PersistenceError::VersionMismatch {
            expected: SNAPSHOT_VERSION,
            got: snapshot.version,
        });
    }

    for entity in snapshot.entities {
        if world.entity(entity.id.as_str()).is_none() && !entity.is_sprite() {
            tracing::warn!(entity = %entity.id, "snapshot entity unknown to current content");
        }
        world.upsert_entity(entity);
    }
    world.set_spawn_serial(snapshot.spawn_serial);

    tracing::info!(
        turn = snapshot.turn,
        players = snapshot.players.len(),
        "snapshot restored"
    );
    Ok(RestoredState {
        turn: snapshot.turn,
        players: snapshot.players,
    })
}
