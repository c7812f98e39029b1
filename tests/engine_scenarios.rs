//! End-to-end simulation scenarios: transformations, combat, attrition,
//! action-matrix enforcement, and ownership consistency.

mod common;

use engine::{command, turn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use session::{PlayerRecord, SessionId, SessionManager};
use world::{EntityId, Location, RoomId, World};

use common::{test_config, test_world};

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

fn join(sessions: &mut SessionManager, id: u64, name: &str, room: &str) {
    let sid = SessionId(id);
    sessions.connect(sid);
    sessions.bind_player(sid, PlayerRecord::new(name, RoomId::new(room), 100));
}

fn run_turns(world: &mut World, sessions: &mut SessionManager, from: u64, count: u64) -> Vec<turn::TurnEvent> {
    let cfg = test_config();
    let mut rng = rng();
    let mut events = Vec::new();
    for t in from + 1..=from + count {
        events.extend(turn::process_turn(world, sessions, &cfg, &mut rng, t));
    }
    events
}

#[test]
fn water_freezes_after_exactly_three_turns_in_the_cold() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    world.move_to_room("water", &RoomId::new("freezer"));

    // Two turns: threshold not reached, nothing happens.
    let events = run_turns(&mut world, &mut sessions, 0, 2);
    assert!(events.iter().all(|e| e.kind != turn::TurnEventKind::Transform));
    assert_eq!(world.entity("water").unwrap().state, "liquid");

    // Third turn: state flips, template replaces name, message emitted.
    let events = run_turns(&mut world, &mut sessions, 2, 1);
    let transforms: Vec<_> = events
        .iter()
        .filter(|e| e.kind == turn::TurnEventKind::Transform)
        .collect();
    assert_eq!(transforms.len(), 1);
    assert_eq!(transforms[0].text, "The water in the tin cup freezes solid.");

    let water = world.entity("water").unwrap();
    assert_eq!(water.state, "frozen");
    assert_eq!(water.state_age, 0);
    assert_eq!(water.name, "cup of ice");
    assert_eq!(water.location, Location::Room(RoomId::new("freezer")));
}

#[test]
fn water_does_not_freeze_outside_cold_rooms() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    // Stays in the kitchen: the freeze rule requires the cold flag.
    let events = run_turns(&mut world, &mut sessions, 0, 6);
    assert!(events.iter().all(|e| e.kind != turn::TurnEventKind::Transform));
    assert_eq!(world.entity("water").unwrap().state, "liquid");
}

#[test]
fn ice_melts_unless_kept_cold() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    {
        let water = world.entity_mut("water").unwrap();
        water.state = "frozen".to_string();
        water.state_age = 0;
    }

    // Frozen in the freezer: the no-flag melt rule is forbidden by cold.
    world.move_to_room("water", &RoomId::new("freezer"));
    let events = run_turns(&mut world, &mut sessions, 0, 6);
    assert!(events.iter().all(|e| e.kind != turn::TurnEventKind::Transform));
    assert_eq!(world.entity("water").unwrap().state, "frozen");

    // Moved to the kitchen it melts once the threshold passes.
    world.move_to_room("water", &RoomId::new("kitchen"));
    {
        world.entity_mut("water").unwrap().state_age = 0;
    }
    let events = run_turns(&mut world, &mut sessions, 6, 4);
    assert!(events.iter().any(|e| e.kind == turn::TurnEventKind::Transform));
    assert_eq!(world.entity("water").unwrap().state, "liquid");
}

#[test]
fn turn_processor_is_idempotent_once_at_rest() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    world.move_to_room("water", &RoomId::new("freezer"));

    // Let the freeze fire.
    run_turns(&mut world, &mut sessions, 0, 3);
    assert_eq!(world.entity("water").unwrap().state, "frozen");

    // The fired rule no longer matches; re-evaluating it is a no-op.
    let events = run_turns(&mut world, &mut sessions, 3, 5);
    assert!(events.iter().all(|e| e.kind != turn::TurnEventKind::Transform));
    assert_eq!(world.entity("water").unwrap().state, "frozen");
}

#[test]
fn action_matrix_rejects_and_leaves_state_untouched() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "cellar");

    // The coin accepts examine/take/drop/put only.
    world.move_to_room("coin", &RoomId::new("cellar"));
    let before = world.entity("coin").unwrap().clone();

    for verb in ["use", "open", "close"] {
        let outcome = command::execute(
            &mut world,
            &mut sessions,
            &cfg,
            &mut rng,
            "Alice",
            &format!("{verb} coin"),
        );
        assert_eq!(
            outcome.reply,
            format!("You can't {verb} the gold coin."),
            "verb {verb} must be rejected by the matrix"
        );
        assert!(outcome.events.is_empty());
        assert_eq!(world.entity("coin").unwrap(), &before);
    }
}

#[test]
fn examine_bypasses_the_action_matrix() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "kitchen");

    // Strip examine from the knife's row; it must still be examinable.
    world.entity_mut("knife").unwrap().verbs.remove(&world::VerbId::new("examine"));
    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "examine knife");
    assert!(outcome.reply.contains("A kitchen knife."));
    assert!(outcome.reply.contains("[weapon: 10 damage]"));
}

#[test]
fn sprite_dies_at_zero_and_drops_its_holdings() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "entrance_hall");

    // Sword in hand: 5 unarmed + 15 weapon = 20 damage.
    world.give_to("sword", "Alice");
    sessions
        .player_mut("Alice")
        .unwrap()
        .inventory
        .insert(EntityId::new("sword"));

    let goblin = world.spawn_sprite("goblin", &RoomId::new("entrance_hall")).unwrap();
    world.entity_mut(goblin.as_str()).unwrap().sprite_mut().unwrap().health = 10;
    world.move_to_room("coin", &RoomId::new("kitchen"));
    world.put_inside("coin", &goblin);

    let outcome = command::execute(
        &mut world,
        &mut sessions,
        &cfg,
        &mut rng,
        "Alice",
        "attack goblin with old sword",
    );

    assert!(outcome.reply.contains("for 20 damage"));
    assert!(outcome.reply.contains("has been slain"));
    assert!(outcome.reply.contains("gold coin"));

    // Deleted, not marked: the id no longer resolves at all.
    assert!(world.entity(goblin.as_str()).is_none());
    assert!(world.sprites_in_room("entrance_hall").is_empty());
    assert_eq!(
        world.entity("coin").unwrap().location,
        Location::Room(RoomId::new("entrance_hall"))
    );
    assert_eq!(sessions.player("Alice").unwrap().kills, 1);
}

#[test]
fn dead_sprite_is_no_longer_targetable() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "entrance_hall");

    let goblin = world.spawn_sprite("goblin", &RoomId::new("entrance_hall")).unwrap();
    world.entity_mut(goblin.as_str()).unwrap().sprite_mut().unwrap().health = 1;

    let first = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "attack goblin");
    assert!(first.reply.contains("has been slain"));

    let second = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "attack goblin");
    assert_eq!(second.reply, "I don't see a goblin here.");
}

#[test]
fn pvp_attack_refused_when_victim_has_it_disabled() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "kitchen");
    join(&mut sessions, 2, "Bob", "kitchen");
    sessions.player_mut("Alice").unwrap().pvp_enabled = true;

    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "attack bob");
    assert_eq!(outcome.reply, "Bob has PvP disabled. They are protected.");
    assert!(outcome.events.is_empty());
    assert_eq!(sessions.player("Bob").unwrap().health, 100);
}

#[test]
fn pvp_attack_requires_attacker_opt_in_too() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "kitchen");
    join(&mut sessions, 2, "Bob", "kitchen");
    sessions.player_mut("Bob").unwrap().pvp_enabled = true;

    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "attack bob");
    assert_eq!(outcome.reply, "You must enable PvP mode first. Type 'pvp' to enable.");
    assert_eq!(sessions.player("Bob").unwrap().health, 100);
}

#[test]
fn pvp_kill_drops_loot_and_respawns_victim() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "kitchen");
    join(&mut sessions, 2, "Bob", "kitchen");
    sessions.player_mut("Alice").unwrap().pvp_enabled = true;
    {
        let bob = sessions.player_mut("Bob").unwrap();
        bob.pvp_enabled = true;
        bob.health = 5;
        bob.inventory.insert(EntityId::new("coin"));
    }
    world.give_to("coin", "Bob");

    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "attack bob");
    assert!(outcome.reply.contains("Bob has been slain"));

    let bob = sessions.player("Bob").unwrap();
    assert_eq!(bob.deaths, 1);
    assert_eq!(bob.health, bob.max_health);
    assert!(bob.inventory.is_empty());
    assert_eq!(bob.room, RoomId::new("entrance_hall"));
    assert_eq!(sessions.player("Alice").unwrap().kills, 1);
    // Loot fell where Bob died, not where he respawned.
    assert_eq!(
        world.entity("coin").unwrap().location,
        Location::Room(RoomId::new("kitchen"))
    );
    // The victim was told directly.
    assert!(outcome
        .events
        .iter()
        .any(|e| e.audience == engine::Audience::Player("Bob".to_string())
            && e.text.contains("You have been slain by Alice")));
}

#[test]
fn attrition_kills_independently_of_combat() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "cellar");
    {
        let alice = sessions.player_mut("Alice").unwrap();
        alice.health = 2;
        alice.inventory.insert(EntityId::new("coin"));
    }
    world.give_to("coin", "Alice");

    // Attrition fires on multiples of the interval (5).
    let events = turn::process_turn(&mut world, &mut sessions, &cfg, &mut rng, 5);
    let death: Vec<_> = events
        .iter()
        .filter(|e| e.kind == turn::TurnEventKind::PlayerDeath)
        .collect();
    assert_eq!(death.len(), 1);
    assert_eq!(death[0].player.as_deref(), Some("Alice"));
    assert!(death[0].text.contains("died from exhaustion"));

    let alice = sessions.player("Alice").unwrap();
    assert_eq!(alice.deaths, 1);
    assert_eq!(alice.health, alice.max_health);
    assert_eq!(alice.room, RoomId::new("entrance_hall"));
    assert_eq!(
        world.entity("coin").unwrap().location,
        Location::Room(RoomId::new("cellar"))
    );
}

#[test]
fn drinking_a_potion_heals_and_consumes_it() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "cellar");
    sessions.player_mut("Alice").unwrap().health = 50;

    let take = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "take healing potion");
    assert_eq!(take.reply, "Taken: healing potion");

    let drink = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "drink potion");
    assert!(drink.reply.contains("restore 30 HP"));

    let alice = sessions.player("Alice").unwrap();
    assert_eq!(alice.health, 80);
    assert_eq!(alice.potions_consumed, 1);
    assert!(alice.inventory.is_empty());
    assert_eq!(world.entity("healing_potion").unwrap().location, Location::Removed);
}

#[test]
fn open_container_lists_contents() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "cellar");

    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "open chest");
    assert_eq!(outcome.reply, "The oak chest contains: gold coin");
}

#[test]
fn unknown_verb_and_missing_target_messages() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "kitchen");

    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "dance wildly");
    assert_eq!(outcome.reply, "I don't know how to 'dance'.");

    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "take dragon");
    assert_eq!(outcome.reply, "I don't see a dragon here.");

    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "go west");
    assert_eq!(outcome.reply, "You can't go west.");
}

#[test]
fn movement_shortcuts_and_broadcasts() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "entrance_hall");
    join(&mut sessions, 2, "Bob", "entrance_hall");

    let outcome = command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", "n");
    assert!(outcome.reply.contains("Abandoned Kitchen"));
    assert_eq!(sessions.player("Alice").unwrap().room, RoomId::new("kitchen"));
    assert!(outcome.events.iter().any(|e| e.text == "Alice goes north."));
    assert!(outcome.events.iter().any(|e| e.text == "Alice arrives."));
}

#[test]
fn ownership_stays_consistent_through_command_sequences() {
    let mut world = test_world();
    let mut sessions = SessionManager::new();
    let cfg = test_config();
    let mut rng = rng();
    join(&mut sessions, 1, "Alice", "entrance_hall");

    for line in [
        "take old sword",
        "n",
        "take knife",
        "take cup of water",
        "drop old sword",
        "s",
        "down",
        "put knife in chest",
        "take healing potion",
        "drink healing potion",
        "up",
    ] {
        command::execute(&mut world, &mut sessions, &cfg, &mut rng, "Alice", line);
        let violations = world.location_violations(&sessions.inventories());
        assert!(violations.is_empty(), "after '{line}': {violations:?}");
    }
}
