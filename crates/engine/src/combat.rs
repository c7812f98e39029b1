//! Damage resolution for player-vs-sprite and player-vs-player attacks.

use session::SessionManager;
use world::{EntityId, World};

use crate::command::{health_bar, CommandOutcome};
use crate::config::GameConfig;
use crate::events::GameEvent;

/// Route an attack to the right resolver. Connected player names take
/// priority over sprites; attacking a plain object is refused.
pub fn attack(
    world: &mut World,
    sessions: &mut SessionManager,
    cfg: &GameConfig,
    actor: &str,
    target: &str,
    weapon_phrase: Option<&str>,
) -> CommandOutcome {
    if let Some(victim) = sessions.resolve_player_name(target) {
        if victim != actor {
            return attack_player(world, sessions, cfg, actor, &victim, weapon_phrase);
        }
    }

    let room = match sessions.player(actor) {
        Some(record) => record.room.clone(),
        None => return CommandOutcome::reply("You are nowhere."),
    };
    if let Some(sprite_id) = world.find_sprite_in_room(room.as_str(), target) {
        return attack_sprite(world, sessions, cfg, actor, &sprite_id, weapon_phrase);
    }
    if let Some(id) = world.find_object(actor, room.as_str(), target) {
        let name = &world.entity(id.as_str()).expect("target resolved").name;
        return CommandOutcome::reply(format!("You can't attack the {name}."));
    }
    CommandOutcome::reply(format!("I don't see a {target} here."))
}

/// Resolved weapon: id, display name, damage value. `None` means unarmed.
type Weapon = Option<(EntityId, String, i64)>;

/// Named weapons must be carried and flagged as weapons; unnamed picks the
/// first carried weapon, falling back to bare fists.
fn resolve_weapon(
    world: &World,
    actor: &str,
    weapon_phrase: Option<&str>,
) -> Result<Weapon, String> {
    match weapon_phrase {
        Some(phrase) => {
            let wanted = phrase.trim().to_lowercase();
            let carried = world.carried_by(actor);
            let Some(item) = carried.iter().find(|e| e.matches_name(&wanted)) else {
                return Err(format!("You don't have a {phrase}."));
            };
            if !item.is_weapon() {
                return Err(format!("You can't attack with the {}.", item.name));
            }
            Ok(Some((item.id.clone(), item.name.clone(), item.weapon_damage())))
        }
        None => Ok(world
            .carried_by(actor)
            .iter()
            .find(|e| e.is_weapon())
            .map(|e| (e.id.clone(), e.name.clone(), e.weapon_damage()))),
    }
}

fn weapon_text(weapon: &Weapon) -> String {
    match weapon {
        Some((_, name, _)) => format!("with the {name}"),
        None => "with your fists".to_string(),
    }
}

fn attack_sprite(
    world: &mut World,
    sessions: &mut SessionManager,
    cfg: &GameConfig,
    actor: &str,
    sprite_id: &EntityId,
    weapon_phrase: Option<&str>,
) -> CommandOutcome {
    // The sprite's action-matrix row gates combat like any other verb.
    {
        let sprite = world.entity(sprite_id.as_str()).expect("sprite resolved");
        if !sprite.accepts(&world::VerbId::new("attack")) {
            return CommandOutcome::reply(format!("You can't attack the {}.", sprite.name));
        }
    }

    let weapon = match resolve_weapon(world, actor, weapon_phrase) {
        Ok(w) => w,
        Err(message) => return CommandOutcome::reply(message),
    };
    let damage = cfg.combat.unarmed_damage + weapon.as_ref().map_or(0, |(_, _, d)| *d);
    let with = weapon_text(&weapon);

    let room = sessions.player(actor).expect("actor is playing").room.clone();
    let sprite = world.entity_mut(sprite_id.as_str()).expect("sprite resolved");
    let name = sprite.name.clone();
    let stats = sprite.sprite_mut().expect("attack target is a sprite");
    stats.health = (stats.health - damage as i32).max(0);

    if stats.health > 0 {
        let (health, max) = (stats.health, stats.max_health);
        return CommandOutcome::with_events(
            format!("You attack the {name} {with} for {damage} damage! ({health}/{max} HP remaining)"),
            vec![GameEvent::to_room_except(
                room,
                &[actor],
                format!("{actor} attacks the {name} {with}!"),
            )],
        );
    }

    // Dead sprites are deleted the same turn; loot lands where they stood.
    let loot: Vec<(EntityId, String)> = world
        .inside(sprite_id.as_str())
        .iter()
        .map(|e| (e.id.clone(), e.name.clone()))
        .collect();
    for (id, _) in &loot {
        world.move_to_room(id.as_str(), &room);
    }
    world.despawn(sprite_id.as_str());
    sessions.player_mut(actor).expect("actor is playing").kills += 1;

    let mut reply = format!(
        "You attack the {name} {with} for {damage} damage!\nThe {name} has been slain!"
    );
    let mut events = vec![GameEvent::to_room_except(
        room.clone(),
        &[actor],
        format!("{actor} has slain the {name} {with}!"),
    )];
    if !loot.is_empty() {
        let names: Vec<&str> = loot.iter().map(|(_, n)| n.as_str()).collect();
        reply.push_str(&format!("\nThe {name} dropped: {}", names.join(", ")));
        events.push(GameEvent::to_room_except(
            room,
            &[actor],
            format!("The {name} dropped: {}", names.join(", ")),
        ));
    }
    CommandOutcome::with_events(reply, events)
}

fn attack_player(
    world: &mut World,
    sessions: &mut SessionManager,
    cfg: &GameConfig,
    actor: &str,
    victim: &str,
    weapon_phrase: Option<&str>,
) -> CommandOutcome {
    if !cfg.combat.pvp_enabled {
        return CommandOutcome::reply("PvP combat is disabled on this server.");
    }
    let attacker_pvp = sessions.player(actor).map(|p| p.pvp_enabled).unwrap_or(false);
    if !attacker_pvp {
        return CommandOutcome::reply("You must enable PvP mode first. Type 'pvp' to enable.");
    }
    let Some(victim_record) = sessions.player(victim) else {
        return CommandOutcome::reply(format!("{victim} is not here."));
    };
    if !victim_record.pvp_enabled {
        return CommandOutcome::reply(format!("{victim} has PvP disabled. They are protected."));
    }
    let victim_room = victim_record.room.clone();
    let actor_room = sessions.player(actor).expect("actor is playing").room.clone();
    if victim_room != actor_room {
        return CommandOutcome::reply(format!("{victim} is not here."));
    }

    let weapon = match resolve_weapon(world, actor, weapon_phrase) {
        Ok(w) => w,
        Err(message) => return CommandOutcome::reply(message),
    };
    let weapon_damage = weapon.as_ref().map_or(0, |(_, _, d)| *d);
    let damage =
        cfg.combat.pvp_base_damage + (weapon_damage as f64 * cfg.combat.pvp_weapon_multiplier) as i64;
    let with = weapon_text(&weapon);

    let record = sessions.player_mut(victim).expect("victim checked above");
    record.health = (record.health - damage as i32).max(0);

    if record.health > 0 {
        let (health, max) = (record.health, record.max_health);
        let bar = health_bar(health, max);
        let events = vec![
            GameEvent::to_room_except(
                victim_room,
                &[actor, victim],
                format!("{actor} attacks {victim} {with} for {damage} damage!"),
            ),
            GameEvent::to_player(
                victim,
                format!("{actor} attacks you {with} for {damage} damage! Health: {health}/{max} {bar}"),
            ),
        ];
        return CommandOutcome::with_events(
            format!("You attack {victim} {with} for {damage} damage!\n{victim}: {bar} {health}/{max} HP"),
            events,
        );
    }

    // Killed: counters, loot drop where they fell, respawn with full health.
    let dropped: Vec<EntityId> = record.inventory.iter().cloned().collect();
    record.inventory.clear();
    record.deaths += 1;
    record.health = record.max_health;
    record.room = cfg.respawn_room.clone();

    let mut loot_names = Vec::new();
    for id in &dropped {
        world.move_to_room(id.as_str(), &victim_room);
        if let Some(e) = world.entity(id.as_str()) {
            loot_names.push(e.name.clone());
        }
    }
    sessions.player_mut(actor).expect("actor is playing").kills += 1;

    let mut events = vec![GameEvent::to_room_except(
        victim_room.clone(),
        &[actor],
        format!("{actor} has slain {victim} {with}!"),
    )];
    if !loot_names.is_empty() {
        events.push(GameEvent::to_room(
            victim_room.clone(),
            format!("{victim} dropped: {}", loot_names.join(", ")),
        ));
    }
    events.push(GameEvent::to_player(
        victim,
        format!(
            "You have been slain by {actor}!\nYou respawn at {} with full health.\nYour items were dropped where you fell.",
            cfg.respawn_room
        ),
    ));

    let mut reply = format!("You attack {victim} {with} for {damage} damage!\n{victim} has been slain!");
    if !loot_names.is_empty() {
        reply.push_str(&format!("\n{victim} dropped: {}", loot_names.join(", ")));
    }
    CommandOutcome::with_events(reply, events)
}
