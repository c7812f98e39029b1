//! Advances the simulation by one global turn: state aging, transformation
//! rules, spawn rolls, sprite AI, then player attrition. Evaluation order
//! is narrative order; a player reads cause before effect.

use rand::rngs::StdRng;
use rand::Rng;
use session::SessionManager;
use world::{Location, RoomId, World};

use crate::config::GameConfig;

/// Probability a pickup-capable sprite grabs a weapon sharing its room.
pub const SPRITE_PICKUP_CHANCE: f64 = 0.3;
/// Probability an unobserved sprite wanders through a random exit.
pub const SPRITE_MOVE_CHANCE: f64 = 0.2;
/// Below this health the attrition tick warns the player.
const WEAK_WARNING_THRESHOLD: i32 = 30;

/// What a turn event was. The coordinator broadcasts only the spawn and
/// attack kinds to every session; the rest reach their addressee or stay in
/// the turn report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEventKind {
    Transform,
    SpriteSpawn,
    ItemSpawn,
    SpriteAttack,
    SpritePickup,
    Attrition,
    PlayerDeath,
}

impl TurnEventKind {
    /// Allow-list for the all-sessions broadcast after a global turn.
    pub fn broadcast_to_all(self) -> bool {
        matches!(
            self,
            TurnEventKind::SpriteSpawn | TurnEventKind::ItemSpawn | TurnEventKind::SpriteAttack
        )
    }
}

/// One narrative line produced by the turn processor, in evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnEvent {
    pub kind: TurnEventKind,
    pub text: String,
    /// Directly-addressed player, if any.
    pub player: Option<String>,
}

impl TurnEvent {
    fn broadcast(kind: TurnEventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            player: None,
        }
    }

    fn direct(kind: TurnEventKind, player: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            player: Some(player.into()),
        }
    }
}

/// Run one global turn. `turn` is the already-advanced turn number.
pub fn process_turn(
    world: &mut World,
    sessions: &mut SessionManager,
    cfg: &GameConfig,
    rng: &mut StdRng,
    turn: u64,
) -> Vec<TurnEvent> {
    let mut events = Vec::new();

    age_states(world);
    apply_transformations(world, sessions, &mut events);
    roll_spawns(world, sessions, rng, &mut events);
    run_sprite_ai(world, sessions, cfg, rng, &mut events);
    apply_attrition(world, sessions, cfg, turn, &mut events);

    events
}

fn age_states(world: &mut World) {
    for entity in world.entities_mut() {
        entity.state_age += 1;
    }
}

/// The room an entity's transformation conditions are judged in: carried
/// entities share their carrier's room, contained entities their
/// container's.
fn effective_room(world: &World, sessions: &SessionManager, id: &str) -> Option<RoomId> {
    let mut current = id.to_string();
    // Containers cannot nest deeply; the bound guards against cycles.
    for _ in 0..8 {
        match &world.entity(&current)?.location {
            Location::Room(room) => return Some(room.clone()),
            Location::Carried(player) => return sessions.player(player).map(|p| p.room.clone()),
            Location::Inside(owner) => current = owner.as_str().to_string(),
            Location::Removed => return None,
        }
    }
    None
}

fn apply_transformations(
    world: &mut World,
    sessions: &SessionManager,
    events: &mut Vec<TurnEvent>,
) {
    let rules: Vec<_> = world.rules().to_vec();
    for rule in rules {
        let Some(entity) = world.entity(rule.entity.as_str()) else {
            // A rule naming a missing entity is skipped, never fatal.
            tracing::warn!(rule = %rule.id, entity = %rule.entity, "transformation target missing");
            continue;
        };

        if let Some(required) = &rule.require_state {
            if &entity.state != required {
                continue;
            }
        }

        let Some(room_id) = effective_room(world, sessions, rule.entity.as_str()) else {
            continue;
        };
        let Some(room) = world.room(room_id.as_str()) else {
            tracing::warn!(rule = %rule.id, room = %room_id, "transformation room missing");
            continue;
        };
        match &rule.require_room_flag {
            Some(flag) => {
                if !room.flag(flag) {
                    continue;
                }
            }
            // No flag required means: only outside cold rooms. The
            // melt-unless-cold special case world content depends on.
            None => {
                if room.is_cold() {
                    continue;
                }
            }
        }

        if entity.state_age < rule.min_turns {
            continue;
        }

        if let Some(new_state) = &rule.new_state {
            let entity = world.entity_mut(rule.entity.as_str()).expect("checked above");
            entity.state = new_state.clone();
            entity.state_age = 0;
        }
        if let Some(template) = &rule.replace_with {
            if !world.replace_from_template(rule.entity.as_str(), template.as_str()) {
                tracing::warn!(rule = %rule.id, template = %template, "replacement template missing");
            }
            let entity = world.entity_mut(rule.entity.as_str()).expect("checked above");
            entity.state_age = 0;
        }
        if !rule.message.is_empty() {
            events.push(TurnEvent::broadcast(TurnEventKind::Transform, rule.message.clone()));
        }
    }
}

fn roll_spawns(
    world: &mut World,
    sessions: &SessionManager,
    rng: &mut StdRng,
    events: &mut Vec<TurnEvent>,
) {
    // Sprites materialize away from players.
    let templates: Vec<(String, String, f64)> = world
        .templates()
        .map(|t| (t.id.clone(), t.name.clone(), t.spawn_chance))
        .collect();
    for (template_id, name, chance) in templates {
        if chance <= 0.0 || !rng.gen_bool(chance.min(1.0)) {
            continue;
        }
        let empty_rooms: Vec<RoomId> = world
            .room_ids()
            .into_iter()
            .filter(|r| sessions.players_in_room(r).is_empty())
            .collect();
        if empty_rooms.is_empty() {
            continue;
        }
        let room = empty_rooms[rng.gen_range(0..empty_rooms.len())].clone();
        if world.spawn_sprite(&template_id, &room).is_some() {
            events.push(TurnEvent::broadcast(
                TurnEventKind::SpriteSpawn,
                format!("A {name} has appeared somewhere in the dungeon..."),
            ));
        }
    }

    // Consumed items may come back anywhere.
    let candidates: Vec<(String, String, f64)> = world
        .entities()
        .filter(|e| {
            !e.is_sprite()
                && e.is_consumable()
                && e.location == Location::Removed
                && e.spawn_chance() > 0.0
        })
        .map(|e| (e.id.as_str().to_string(), e.name.clone(), e.spawn_chance()))
        .collect();
    for (id, name, chance) in candidates {
        if !rng.gen_bool(chance.min(1.0)) {
            continue;
        }
        let rooms = world.room_ids();
        if rooms.is_empty() {
            continue;
        }
        let room = rooms[rng.gen_range(0..rooms.len())].clone();
        world.move_to_room(&id, &room);
        events.push(TurnEvent::broadcast(
            TurnEventKind::ItemSpawn,
            format!("A {name} has materialized!"),
        ));
    }
}

fn run_sprite_ai(
    world: &mut World,
    sessions: &mut SessionManager,
    cfg: &GameConfig,
    rng: &mut StdRng,
    events: &mut Vec<TurnEvent>,
) {
    let sprite_ids: Vec<String> = world
        .entities()
        .filter(|e| e.sprite().is_some_and(|s| s.is_alive()))
        .map(|e| e.id.as_str().to_string())
        .collect();

    for id in sprite_ids {
        let Some(sprite) = world.entity(&id) else { continue };
        let Location::Room(room) = sprite.location.clone() else { continue };
        let stats = sprite.sprite().expect("filtered to sprites").clone();
        let name = sprite.name.clone();

        let players = sessions.players_in_room(&room);
        if let Some(victim) = players.first().cloned() {
            if stats.is_hostile() && rng.gen_bool(stats.aggression.clamp(0.0, 1.0)) {
                let record = sessions.player_mut(&victim).expect("player in room");
                record.health = (record.health - stats.damage).max(0);
                events.push(TurnEvent::broadcast(
                    TurnEventKind::SpriteAttack,
                    format!("The {name} attacks {victim} for {} damage!", stats.damage),
                ));
                if sessions.player(&victim).map(|p| p.health) == Some(0) {
                    kill_player(
                        world,
                        sessions,
                        cfg,
                        &victim,
                        format!("You have been slain by the {name}!"),
                        events,
                    );
                }
            }
            if stats.can_pickup && rng.gen_bool(SPRITE_PICKUP_CHANCE) {
                if let Some(weapon) = world.first_weapon_in_room(room.as_str()) {
                    let weapon_name = world.entity(weapon.as_str()).expect("weapon exists").name.clone();
                    world.put_inside(weapon.as_str(), &world::EntityId::new(id.as_str()));
                    events.push(TurnEvent::broadcast(
                        TurnEventKind::SpritePickup,
                        format!("The {name} picks up the {weapon_name}!"),
                    ));
                }
            }
        } else if rng.gen_bool(SPRITE_MOVE_CHANCE) {
            let exits: Vec<RoomId> = world
                .room(room.as_str())
                .map(|r| r.exits.values().cloned().collect())
                .unwrap_or_default();
            if !exits.is_empty() {
                let dest = exits[rng.gen_range(0..exits.len())].clone();
                world.move_to_room(&id, &dest);
            }
        }
    }
}

fn apply_attrition(
    world: &mut World,
    sessions: &mut SessionManager,
    cfg: &GameConfig,
    turn: u64,
    events: &mut Vec<TurnEvent>,
) {
    let names: Vec<String> = sessions.players().map(|p| p.name.clone()).collect();
    for name in &names {
        if let Some(record) = sessions.player_mut(name) {
            record.turns += 1;
        }
    }

    if cfg.attrition_interval == 0 || turn % cfg.attrition_interval != 0 {
        return;
    }

    for name in names {
        let health = {
            let Some(record) = sessions.player_mut(&name) else { continue };
            if !record.is_alive() {
                continue;
            }
            record.health = (record.health - cfg.attrition_damage).max(0);
            record.health
        };
        if health == 0 {
            kill_player(
                world,
                sessions,
                cfg,
                &name,
                "You have died from exhaustion!".to_string(),
                events,
            );
        } else if health < WEAK_WARNING_THRESHOLD {
            events.push(TurnEvent::direct(
                TurnEventKind::Attrition,
                name,
                "You're feeling weak from exhaustion...",
            ));
        }
    }
}

/// Death outside PvP: count it, drop the inventory where the player fell,
/// respawn them at the configured room with full health.
fn kill_player(
    world: &mut World,
    sessions: &mut SessionManager,
    cfg: &GameConfig,
    victim: &str,
    cause: String,
    events: &mut Vec<TurnEvent>,
) {
    let Some(record) = sessions.player_mut(victim) else { return };
    let death_room = record.room.clone();
    let dropped: Vec<world::EntityId> = record.inventory.iter().cloned().collect();
    record.inventory.clear();
    record.deaths += 1;
    record.health = record.max_health;
    record.room = cfg.respawn_room.clone();

    for id in &dropped {
        world.move_to_room(id.as_str(), &death_room);
    }

    events.push(TurnEvent::direct(
        TurnEventKind::PlayerDeath,
        victim,
        format!(
            "{cause}\nYou respawn at {} with full health.",
            cfg.respawn_room
        ),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_covers_spawn_and_attack_only() {
        assert!(TurnEventKind::SpriteSpawn.broadcast_to_all());
        assert!(TurnEventKind::ItemSpawn.broadcast_to_all());
        assert!(TurnEventKind::SpriteAttack.broadcast_to_all());
        assert!(!TurnEventKind::Transform.broadcast_to_all());
        assert!(!TurnEventKind::SpritePickup.broadcast_to_all());
        assert!(!TurnEventKind::Attrition.broadcast_to_all());
        assert!(!TurnEventKind::PlayerDeath.broadcast_to_all());
    }
}
