//! Tokenizes command lines, resolves verbs and targets against the action
//! matrix, and runs the world-verb handlers.
//!
//! Command failure is a normal game event: every path returns a message
//! string, never an error. Handlers only mutate state after their
//! precondition checks pass.

use rand::rngs::StdRng;
use rand::Rng;
use session::SessionManager;
use world::{Direction, RoomId, VerbId, World};

use crate::combat;
use crate::config::GameConfig;
use crate::events::GameEvent;

/// Result of resolving one command: a reply for the actor plus broadcast
/// lines for everyone else.
#[derive(Debug)]
pub struct CommandOutcome {
    pub reply: String,
    pub events: Vec<GameEvent>,
}

impl CommandOutcome {
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: text.into(),
            events: Vec::new(),
        }
    }

    pub fn with_events(text: impl Into<String>, events: Vec<GameEvent>) -> Self {
        Self {
            reply: text.into(),
            events,
        }
    }
}

/// Verbs exempt from the action matrix: anything can be examined, and
/// anything can be tested for drinkability.
const MATRIX_EXEMPT: [&str; 2] = ["examine", "drink"];

/// Resolve one command line for a playing player.
pub fn execute(
    world: &mut World,
    sessions: &mut SessionManager,
    cfg: &GameConfig,
    rng: &mut StdRng,
    actor: &str,
    line: &str,
) -> CommandOutcome {
    let lower = line.trim().to_lowercase();
    let mut tokens = lower.split_whitespace();
    let Some(verb_token) = tokens.next() else {
        return CommandOutcome::reply("I didn't understand that.");
    };
    let phrase = tokens.collect::<Vec<_>>().join(" ");

    // Directional shortcuts skip verb resolution and the action matrix.
    if let Some(dir) = Direction::parse(verb_token) {
        return go(world, sessions, actor, dir);
    }

    let Some(verb) = world.resolve_verb(verb_token) else {
        return CommandOutcome::reply(format!("I don't know how to '{verb_token}'."));
    };
    let verb_id = verb.id.clone();
    let requires_target = verb.requires_target;

    match verb_id.as_str() {
        "go" => match Direction::parse(&phrase) {
            Some(dir) => go(world, sessions, actor, dir),
            None if phrase.is_empty() => CommandOutcome::reply("Go where?"),
            None => CommandOutcome::reply(format!("You can't go {phrase}.")),
        },
        "look" if phrase.is_empty() => {
            CommandOutcome::reply(render_look(world, sessions, actor))
        }
        // "look knife" reads as examine.
        "look" | "examine" => examine(world, sessions, actor, &phrase),
        "inventory" => show_inventory(world, actor),
        "health" => check_health(sessions, actor),
        "flee" => flee(world, sessions, rng, actor),
        "attack" => {
            let (target, weapon) = split_attack_phrase(&phrase);
            if target.is_empty() {
                return CommandOutcome::reply("Attack what?");
            }
            combat::attack(world, sessions, cfg, actor, &target, weapon.as_deref())
        }
        "put" => {
            let (item, container) = split_put_phrase(&phrase);
            if item.is_empty() || container.is_empty() {
                return CommandOutcome::reply("Put what in what?");
            }
            with_target(world, sessions, actor, &verb_id, verb_token, &item, |w, s| {
                put(w, s, actor, &item, &container)
            })
        }
        "take" | "drop" | "open" | "close" | "use" | "drink" => {
            if phrase.is_empty() {
                let prompt = capitalize(verb_token);
                return CommandOutcome::reply(format!("{prompt} what?"));
            }
            with_target(world, sessions, actor, &verb_id, verb_token, &phrase, |w, s| {
                match verb_id.as_str() {
                    "take" => take(w, s, actor, &phrase),
                    "drop" => drop_item(w, s, actor, &phrase),
                    "open" => open(w, s, actor, &phrase),
                    "close" => close(w, s, actor, &phrase),
                    "use" => use_item(w, s, actor, &phrase),
                    "drink" => drink(w, s, actor, &phrase),
                    _ => unreachable!(),
                }
            })
        }
        _ => {
            if requires_target && phrase.is_empty() {
                let prompt = capitalize(verb_token);
                return CommandOutcome::reply(format!("{prompt} what?"));
            }
            // A content-defined verb with no built-in behavior.
            CommandOutcome::reply("Nothing happens.")
        }
    }
}

/// Locate the target, apply the action-matrix check, then run the handler.
fn with_target(
    world: &mut World,
    sessions: &mut SessionManager,
    actor: &str,
    verb_id: &VerbId,
    verb_token: &str,
    phrase: &str,
    handler: impl FnOnce(&mut World, &mut SessionManager) -> CommandOutcome,
) -> CommandOutcome {
    let Some(record) = sessions.player(actor) else {
        return CommandOutcome::reply("You are nowhere.");
    };
    let room = record.room.clone();

    let Some(id) = world.find_object(actor, room.as_str(), phrase) else {
        return CommandOutcome::reply(format!("I don't see a {phrase} here."));
    };

    if !MATRIX_EXEMPT.contains(&verb_id.as_str()) {
        let entity = world.entity(id.as_str()).expect("target just resolved");
        if !entity.accepts(verb_id) {
            return CommandOutcome::reply(format!("You can't {verb_token} the {}.", entity.name));
        }
    }

    handler(world, sessions)
}

/// Attack phrases may name a weapon after a literal "with".
fn split_attack_phrase(phrase: &str) -> (String, Option<String>) {
    match phrase.split_once(" with ") {
        Some((target, weapon)) => (target.trim().to_string(), Some(weapon.trim().to_string())),
        None => (phrase.to_string(), None),
    }
}

fn split_put_phrase(phrase: &str) -> (String, String) {
    match phrase.split_once(" in ") {
        Some((item, container)) => (item.trim().to_string(), container.trim().to_string()),
        None => (phrase.to_string(), String::new()),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

pub(crate) fn health_bar(current: i32, max: i32) -> String {
    let max = max.max(1);
    let cells = 10usize;
    let filled = ((current.max(0) as usize * cells) + max as usize - 1) / max as usize;
    let filled = filled.min(cells);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(cells - filled))
}

// ---- handlers -------------------------------------------------------------

/// Render the actor's current room: description, exits, other players,
/// living sprites, objects.
pub fn render_look(world: &World, sessions: &SessionManager, actor: &str) -> String {
    let Some(record) = sessions.player(actor) else {
        return "You are nowhere.".to_string();
    };
    let Some(room) = world.room(record.room.as_str()) else {
        return "You are nowhere.".to_string();
    };

    let mut out = vec![room.name.clone(), "=".repeat(room.name.len()), room.description.clone()];

    if !room.exits.is_empty() {
        let exits: Vec<&str> = room.exits.keys().map(|d| d.as_str()).collect();
        out.push(format!("Exits: {}", exits.join(", ")));
    }

    let names = sessions.players_in_room(&room.id);
    let others: Vec<&String> = names.iter().filter(|name| name.as_str() != actor).collect();
    if !others.is_empty() {
        out.push("Players here:".to_string());
        for name in others {
            let Some(other) = sessions.player(name.as_str()) else { continue };
            let mut line = format!(
                "  {} {} {}/{} HP",
                other.name,
                health_bar(other.health, other.max_health),
                other.health,
                other.max_health
            );
            let held: Vec<String> = world
                .carried_by(name)
                .iter()
                .map(|e| e.name.clone())
                .collect();
            if !held.is_empty() {
                line.push_str(&format!(" (holding: {})", held.join(", ")));
            }
            line.push_str(if other.pvp_enabled { " [PvP]" } else { " [safe]" });
            out.push(line);
        }
    }

    let sprites = world.sprites_in_room(room.id.as_str());
    if !sprites.is_empty() {
        out.push("Enemies:".to_string());
        for sprite in sprites {
            let stats = sprite.sprite().expect("sprites_in_room returns sprites");
            let mut line = format!(
                "  {} {} {}/{} HP",
                sprite.name,
                health_bar(stats.health, stats.max_health),
                stats.health,
                stats.max_health
            );
            let held: Vec<String> = world
                .inside(sprite.id.as_str())
                .iter()
                .map(|e| e.name.clone())
                .collect();
            if !held.is_empty() {
                line.push_str(&format!(" (holding: {})", held.join(", ")));
            }
            out.push(line);
        }
    }

    let objects = world.objects_in_room(room.id.as_str());
    if !objects.is_empty() {
        out.push("You can see:".to_string());
        for obj in objects {
            let mut line = format!("  - {}", obj.name);
            if obj.state != world::DEFAULT_STATE {
                line.push_str(&format!(" ({})", obj.state));
            }
            if obj.is_weapon() {
                line.push_str(" [weapon]");
            }
            out.push(line);
        }
    }

    out.join("\n")
}

fn examine(world: &World, sessions: &SessionManager, actor: &str, phrase: &str) -> CommandOutcome {
    let Some(record) = sessions.player(actor) else {
        return CommandOutcome::reply("You are nowhere.");
    };
    let Some(id) = world.find_object(actor, record.room.as_str(), phrase) else {
        return CommandOutcome::reply(format!("I don't see a {phrase} here."));
    };
    let entity = world.entity(id.as_str()).expect("target just resolved");

    let mut text = entity.description.clone();
    if entity.state != world::DEFAULT_STATE {
        text.push_str(&format!(" It appears to be {}.", entity.state));
    }
    if entity.is_weapon() {
        text.push_str(&format!(" [weapon: {} damage]", entity.weapon_damage()));
    }
    if entity.is_consumable() {
        text.push_str(&format!(" [potion: restores {} HP]", entity.heal_amount()));
    }
    CommandOutcome::reply(text)
}

fn take(world: &mut World, sessions: &mut SessionManager, actor: &str, phrase: &str) -> CommandOutcome {
    let record = sessions.player(actor).expect("actor is playing");
    let room = record.room.clone();
    let id = world
        .find_object(actor, room.as_str(), phrase)
        .expect("target resolved by caller");
    let entity = world.entity(id.as_str()).expect("target resolved");
    let name = entity.name.clone();

    if !entity.is_takeable() {
        return CommandOutcome::reply(format!("You can't take the {name}."));
    }
    if record.inventory.contains(&id) {
        return CommandOutcome::reply("You already have that.");
    }

    world.give_to(id.as_str(), actor);
    sessions
        .player_mut(actor)
        .expect("actor is playing")
        .inventory
        .insert(id);
    CommandOutcome::with_events(
        format!("Taken: {name}"),
        vec![GameEvent::to_room_except(
            room,
            &[actor],
            format!("{actor} picks up the {name}."),
        )],
    )
}

fn drop_item(world: &mut World, sessions: &mut SessionManager, actor: &str, phrase: &str) -> CommandOutcome {
    let record = sessions.player(actor).expect("actor is playing");
    let room = record.room.clone();
    let id = world
        .find_object(actor, room.as_str(), phrase)
        .expect("target resolved by caller");
    let name = world.entity(id.as_str()).expect("target resolved").name.clone();

    if !record.inventory.contains(&id) {
        return CommandOutcome::reply("You don't have that.");
    }

    sessions
        .player_mut(actor)
        .expect("actor is playing")
        .inventory
        .remove(&id);
    world.move_to_room(id.as_str(), &room);
    CommandOutcome::with_events(
        format!("Dropped: {name}"),
        vec![GameEvent::to_room_except(
            room,
            &[actor],
            format!("{actor} drops the {name}."),
        )],
    )
}

fn show_inventory(world: &World, actor: &str) -> CommandOutcome {
    let carried = world.carried_by(actor);
    if carried.is_empty() {
        return CommandOutcome::reply("You aren't carrying anything.");
    }
    let mut out = vec!["You are carrying:".to_string()];
    for item in carried {
        let mut line = format!("  - {}", item.name);
        if item.is_weapon() {
            line.push_str(" [weapon]");
        }
        if item.is_consumable() {
            line.push_str(" [potion]");
        }
        out.push(line);
    }
    CommandOutcome::reply(out.join("\n"))
}

fn go(world: &mut World, sessions: &mut SessionManager, actor: &str, dir: Direction) -> CommandOutcome {
    let Some(record) = sessions.player(actor) else {
        return CommandOutcome::reply("You are nowhere.");
    };
    let from = record.room.clone();
    let Some(room) = world.room(from.as_str()) else {
        return CommandOutcome::reply("You can't go anywhere from here.");
    };
    let Some(dest) = room.exit(dir).cloned() else {
        return CommandOutcome::reply(format!("You can't go {dir}."));
    };

    sessions.player_mut(actor).expect("actor is playing").room = dest.clone();
    let events = vec![
        GameEvent::to_room_except(from, &[actor], format!("{actor} goes {dir}.")),
        GameEvent::to_room_except(dest, &[actor], format!("{actor} arrives.")),
    ];
    CommandOutcome::with_events(render_look(world, sessions, actor), events)
}

fn put(
    world: &mut World,
    sessions: &mut SessionManager,
    actor: &str,
    item_phrase: &str,
    container_phrase: &str,
) -> CommandOutcome {
    let record = sessions.player(actor).expect("actor is playing");
    let room = record.room.clone();
    let item_id = world
        .find_object(actor, room.as_str(), item_phrase)
        .expect("target resolved by caller");
    let item_name = world.entity(item_id.as_str()).expect("resolved").name.clone();

    let Some(container_id) = world.find_object(actor, room.as_str(), container_phrase) else {
        return CommandOutcome::reply(format!("I don't see a {container_phrase} here."));
    };
    let container = world.entity(container_id.as_str()).expect("resolved");
    let container_name = container.name.clone();
    if !container.is_container() {
        return CommandOutcome::reply(format!("You can't put things in the {container_name}."));
    }
    if !record.inventory.contains(&item_id) {
        return CommandOutcome::reply("You need to be holding it first.");
    }

    sessions
        .player_mut(actor)
        .expect("actor is playing")
        .inventory
        .remove(&item_id);
    world.put_inside(item_id.as_str(), &container_id);
    CommandOutcome::with_events(
        format!("You put the {item_name} in the {container_name}."),
        vec![GameEvent::to_room_except(
            room,
            &[actor],
            format!("{actor} puts the {item_name} in the {container_name}."),
        )],
    )
}

fn open(world: &mut World, sessions: &mut SessionManager, actor: &str, phrase: &str) -> CommandOutcome {
    let record = sessions.player(actor).expect("actor is playing");
    let id = world
        .find_object(actor, record.room.as_str(), phrase)
        .expect("target resolved by caller");
    let entity = world.entity(id.as_str()).expect("resolved");
    let name = entity.name.clone();
    if !entity.is_container() {
        return CommandOutcome::reply(format!("You can't open the {name}."));
    }
    let contents: Vec<String> = world.inside(id.as_str()).iter().map(|e| e.name.clone()).collect();
    if contents.is_empty() {
        CommandOutcome::reply(format!("The {name} is empty."))
    } else {
        CommandOutcome::reply(format!("The {name} contains: {}", contents.join(", ")))
    }
}

fn close(world: &mut World, sessions: &mut SessionManager, actor: &str, phrase: &str) -> CommandOutcome {
    let record = sessions.player(actor).expect("actor is playing");
    let id = world
        .find_object(actor, record.room.as_str(), phrase)
        .expect("target resolved by caller");
    let entity = world.entity(id.as_str()).expect("resolved");
    if !entity.is_container() {
        return CommandOutcome::reply(format!("You can't close the {}.", entity.name));
    }
    CommandOutcome::reply(format!("You close the {}.", entity.name))
}

fn use_item(world: &mut World, sessions: &mut SessionManager, actor: &str, phrase: &str) -> CommandOutcome {
    let record = sessions.player(actor).expect("actor is playing");
    let id = world
        .find_object(actor, record.room.as_str(), phrase)
        .expect("target resolved by caller");
    let name = &world.entity(id.as_str()).expect("resolved").name;
    CommandOutcome::reply(format!("You're not sure how to use the {name}."))
}

fn drink(world: &mut World, sessions: &mut SessionManager, actor: &str, phrase: &str) -> CommandOutcome {
    let record = sessions.player(actor).expect("actor is playing");
    let room = record.room.clone();
    let id = world
        .find_object(actor, room.as_str(), phrase)
        .expect("target resolved by caller");
    let entity = world.entity(id.as_str()).expect("resolved");
    let name = entity.name.clone();

    if !entity.is_consumable() {
        return CommandOutcome::reply(format!("You can't drink the {name}."));
    }
    if !record.inventory.contains(&id) {
        return CommandOutcome::reply("You need to be holding it first.");
    }

    let heal = entity.heal_amount() as i32;
    let record = sessions.player_mut(actor).expect("actor is playing");
    record.health = (record.health + heal).min(record.max_health);
    record.potions_consumed += 1;
    record.inventory.remove(&id);
    let (health, max) = (record.health, record.max_health);
    world.remove_from_play(id.as_str());

    CommandOutcome::reply(format!(
        "You drink the {name} and restore {heal} HP. (Health: {health}/{max})"
    ))
}

fn check_health(sessions: &SessionManager, actor: &str) -> CommandOutcome {
    let Some(record) = sessions.player(actor) else {
        return CommandOutcome::reply("You are nowhere.");
    };
    let pct = record.health as f64 / record.max_health.max(1) as f64 * 100.0;
    let status = if pct < 30.0 {
        "Critical!"
    } else if pct < 60.0 {
        "Wounded"
    } else {
        "Healthy"
    };
    CommandOutcome::reply(format!(
        "Health: {} {}/{} HP ({:.0}%) - {}",
        health_bar(record.health, record.max_health),
        record.health,
        record.max_health,
        pct,
        status
    ))
}

fn flee(world: &mut World, sessions: &mut SessionManager, rng: &mut StdRng, actor: &str) -> CommandOutcome {
    let Some(record) = sessions.player(actor) else {
        return CommandOutcome::reply("You are nowhere.");
    };
    let from = record.room.clone();
    let exits: Vec<(Direction, RoomId)> = match world.room(from.as_str()) {
        Some(room) => room.exits.iter().map(|(d, r)| (*d, r.clone())).collect(),
        None => Vec::new(),
    };
    if exits.is_empty() {
        return CommandOutcome::reply("There's nowhere to run!");
    }

    let (dir, dest) = exits[rng.gen_range(0..exits.len())].clone();
    sessions.player_mut(actor).expect("actor is playing").room = dest.clone();
    let events = vec![
        GameEvent::to_room_except(from, &[actor], format!("{actor} flees {dir}!")),
        GameEvent::to_room_except(dest, &[actor], format!("{actor} arrives, out of breath.")),
    ];
    CommandOutcome::with_events(
        format!("You flee {dir}!\n\n{}", render_look(world, sessions, actor)),
        events,
    )
}
