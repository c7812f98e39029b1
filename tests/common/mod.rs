//! Shared fixtures for the integration suites: a small world with the
//! kitchen/freezer transformation pair, weapons, a container, and sprite
//! templates.

use std::collections::BTreeSet;

use engine::GameConfig;
use world::{
    Behavior, Direction, Entity, Location, PropertyValue, Room, RoomId, SpriteTemplate,
    TransformRule, Verb, VerbId, World,
};

pub fn verb_set(ids: &[&str]) -> BTreeSet<VerbId> {
    ids.iter().map(|id| VerbId::new(*id)).collect()
}

pub fn test_world() -> World {
    let mut world = World::new();

    let mut hall = Room::new("entrance_hall", "Entrance Hall", "A vaulted stone hall.")
        .with_exit(Direction::North, "kitchen")
        .with_exit(Direction::Down, "cellar");
    hall.props.set("start", PropertyValue::Bool(true));
    world.add_room(hall);

    world.add_room(
        Room::new("kitchen", "Abandoned Kitchen", "Copper pots hang over a dead hearth.")
            .with_exit(Direction::South, "entrance_hall")
            .with_exit(Direction::North, "freezer"),
    );

    let mut freezer = Room::new("freezer", "Walk-in Freezer", "Your breath fogs.")
        .with_exit(Direction::South, "kitchen");
    freezer.props.set("cold", PropertyValue::Bool(true));
    world.add_room(freezer);

    world.add_room(Room::new("cellar", "Root Cellar", "Low beams, dirt floor.").with_exit(Direction::Up, "entrance_hall"));

    for (id, requires_target, aliases) in [
        ("look", false, vec!["l"]),
        ("examine", true, vec!["x", "inspect"]),
        ("go", true, vec![]),
        ("take", true, vec!["get", "grab"]),
        ("drop", true, vec![]),
        ("inventory", false, vec!["i", "inv"]),
        ("put", true, vec![]),
        ("open", true, vec![]),
        ("close", true, vec![]),
        ("use", true, vec![]),
        ("drink", true, vec!["quaff"]),
        ("attack", true, vec!["hit", "kill"]),
        ("flee", false, vec!["run"]),
        ("health", false, vec!["hp"]),
    ] {
        let mut verb = Verb::new(id, requires_target);
        verb.aliases = aliases.into_iter().map(str::to_string).collect();
        world.add_verb(verb);
    }

    let mut knife = Entity::object("knife", "rusty knife", "A kitchen knife.");
    knife.props.set("weapon", PropertyValue::Bool(true));
    knife.props.set("damage", PropertyValue::Int(10));
    knife.verbs = verb_set(&["examine", "take", "drop", "put", "attack", "use"]);
    knife.location = Location::Room(RoomId::new("kitchen"));
    world.add_entity(knife);

    let mut sword = Entity::object("sword", "old sword", "A soldier's blade.");
    sword.props.set("weapon", PropertyValue::Bool(true));
    sword.props.set("damage", PropertyValue::Int(15));
    sword.verbs = verb_set(&["examine", "take", "drop", "put", "attack", "use"]);
    sword.location = Location::Room(RoomId::new("entrance_hall"));
    world.add_entity(sword);

    let mut water = Entity::object("water", "cup of water", "A battered tin cup of water.");
    water.state = "liquid".to_string();
    water.verbs = verb_set(&["examine", "take", "drop", "put"]);
    water.location = Location::Room(RoomId::new("kitchen"));
    world.add_entity(water);

    let mut ice = Entity::object("ice_form", "cup of ice", "The cup, frozen solid.");
    ice.verbs = verb_set(&["examine", "take", "drop", "put"]);
    world.add_entity(ice);

    let mut potion = Entity::object("healing_potion", "healing potion", "A vial of red liquid.");
    potion.props.set("consumable", PropertyValue::Bool(true));
    potion.props.set("health_restore", PropertyValue::Int(30));
    potion.props.set("spawn_chance", PropertyValue::Float(0.5));
    potion.verbs = verb_set(&["examine", "take", "drop", "put", "drink"]);
    potion.location = Location::Room(RoomId::new("cellar"));
    world.add_entity(potion);

    let mut chest = Entity::object("chest", "oak chest", "A heavy oak chest.");
    chest.props.set("takeable", PropertyValue::Bool(false));
    chest.props.set("container", PropertyValue::Bool(true));
    chest.verbs = verb_set(&["examine", "open", "close", "put"]);
    chest.location = Location::Room(RoomId::new("cellar"));
    world.add_entity(chest);

    let mut coin = Entity::object("coin", "gold coin", "A thick gold coin.");
    coin.verbs = verb_set(&["examine", "take", "drop", "put"]);
    coin.location = Location::Inside(world::EntityId::new("chest"));
    world.add_entity(coin);

    world.add_template(SpriteTemplate {
        id: "goblin".to_string(),
        name: "goblin".to_string(),
        description: "Knee-high and green.".to_string(),
        health: 30,
        damage: 8,
        aggression: 0.7,
        behavior: Behavior::Aggressive,
        can_pickup: true,
        spawn_chance: 0.0,
        verbs: verb_set(&["examine", "attack"]),
    });

    let mut freeze = TransformRule::new("freeze_water", "water");
    freeze.require_state = Some("liquid".to_string());
    freeze.require_room_flag = Some("cold".to_string());
    freeze.min_turns = 3;
    freeze.new_state = Some("frozen".to_string());
    freeze.replace_with = Some(world::EntityId::new("ice_form"));
    freeze.message = "The water in the tin cup freezes solid.".to_string();
    world.add_rule(freeze);

    let mut melt = TransformRule::new("melt_ice", "water");
    melt.require_state = Some("frozen".to_string());
    melt.min_turns = 4;
    melt.new_state = Some("liquid".to_string());
    melt.message = "The ice melts back into water.".to_string();
    world.add_rule(melt);

    world
}

pub fn test_config() -> GameConfig {
    GameConfig {
        rng_seed: Some(7),
        ..GameConfig::default()
    }
}
