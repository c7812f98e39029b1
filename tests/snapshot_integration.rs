//! Snapshot persistence end to end: autosave through the coordinator,
//! restore into a fresh world, and reconnection onto restored records.

mod common;

use engine::{Coordinator, GameConfig};
use persistence::manager::SnapshotManager;
use persistence::snapshot;
use session::SessionId;
use world::{Location, RoomId};

use common::{test_config, test_world};

const ALICE: SessionId = SessionId(1);

#[test]
fn autosave_restore_roundtrip_preserves_players_and_entities() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = GameConfig {
        turn_every_commands: 1,
        snapshot_interval: 1,
        attrition_interval: 1000,
        ..test_config()
    };

    let mut coordinator = Coordinator::new(test_world(), cfg.clone())
        .with_snapshots(SnapshotManager::new(dir.path()));
    coordinator.connect(ALICE);
    coordinator.line(ALICE, "Alice");

    // Pick up the sword, walk to the kitchen; every command autosaves.
    coordinator.line(ALICE, "take old sword");
    coordinator.line(ALICE, "north");
    let turn_at_save = coordinator.turn();
    assert!(turn_at_save >= 2);

    // Boot a fresh server against the same save directory.
    let manager = SnapshotManager::new(dir.path());
    assert!(manager.has_latest());
    let mut fresh_world = test_world();
    let restored = snapshot::restore(manager.load_latest().unwrap(), &mut fresh_world).unwrap();
    assert_eq!(restored.turn, turn_at_save);

    // Entity placement came back exactly.
    assert_eq!(
        fresh_world.entity("sword").unwrap().location,
        Location::Carried("Alice".to_string())
    );

    let mut coordinator = Coordinator::new(fresh_world, cfg);
    coordinator.adopt_restored(restored.players, restored.turn);
    assert_eq!(coordinator.turn(), turn_at_save);

    // Reconnecting under the same name resumes the restored record.
    coordinator.connect(SessionId(5));
    coordinator.line(SessionId(5), "Alice");
    let alice = coordinator.sessions().player("Alice").unwrap();
    assert_eq!(alice.room, RoomId::new("kitchen"));
    assert!(alice.inventory.contains(&world::EntityId::new("sword")));
}

#[test]
fn save_command_reports_success_and_disabled_state() {
    let dir = tempfile::tempdir().unwrap();

    let mut with_saves = Coordinator::new(test_world(), test_config())
        .with_snapshots(SnapshotManager::new(dir.path()));
    with_saves.connect(ALICE);
    with_saves.line(ALICE, "Alice");
    let outs = with_saves.line(ALICE, "save");
    assert!(outs.iter().any(|o| o.text.contains("Game saved")));

    let mut without = Coordinator::new(test_world(), test_config());
    without.connect(ALICE);
    without.line(ALICE, "Alice");
    let outs = without.line(ALICE, "save");
    assert!(outs.iter().any(|o| o.text.contains("Saving is disabled")));
}

#[test]
fn player_counters_survive_the_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut coordinator = Coordinator::new(test_world(), test_config())
        .with_snapshots(SnapshotManager::new(dir.path()));
    coordinator.connect(ALICE);
    coordinator.line(ALICE, "Alice");
    {
        let alice = coordinator.sessions_mut().player_mut("Alice").unwrap();
        alice.kills = 3;
        alice.deaths = 1;
        alice.potions_consumed = 2;
        alice.health = 77;
    }
    coordinator.line(ALICE, "save");

    let manager = SnapshotManager::new(dir.path());
    let mut fresh_world = test_world();
    let restored = snapshot::restore(manager.load_latest().unwrap(), &mut fresh_world).unwrap();
    let alice = restored
        .players
        .iter()
        .find(|p| p.name == "Alice")
        .expect("alice persisted");
    assert_eq!(alice.kills, 3);
    assert_eq!(alice.deaths, 1);
    assert_eq!(alice.potions_consumed, 2);
    assert_eq!(alice.health, 77);
}
