//! Loads world content from a directory of TOML files into the registries.
//!
//! Malformed content is a startup failure, never a mid-game surprise: every
//! cross-reference (exits, locations, verb sets, rule targets) is checked
//! here and the server refuses to boot on the first problem.

use std::collections::BTreeSet;
use std::path::Path;

use toml::{Table, Value};

use crate::entity::{Behavior, Entity, Location, SpriteTemplate};
use crate::room::{Direction, Room};
use crate::rules::TransformRule;
use crate::types::{prop, EntityId, PropertyValue, RoomId, VerbId};
use crate::verb::Verb;
use crate::world::World;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("{file}: {message}")]
    Invalid { file: String, message: String },
}

fn invalid(file: &str, message: impl Into<String>) -> ContentError {
    ContentError::Invalid {
        file: file.to_string(),
        message: message.into(),
    }
}

/// Load a world from `<dir>/{verbs,rooms,objects}.toml` plus optional
/// `sprites.toml` and `transformations.toml`.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<World, ContentError> {
    let dir = dir.as_ref();
    let read = |name: &str| -> Result<String, ContentError> {
        let path = dir.join(name);
        std::fs::read_to_string(&path).map_err(|source| ContentError::Io {
            path: path.display().to_string(),
            source,
        })
    };
    let read_opt = |name: &str| -> Option<String> { std::fs::read_to_string(dir.join(name)).ok() };

    load_from_strings(
        &read("verbs.toml")?,
        &read("rooms.toml")?,
        &read("objects.toml")?,
        read_opt("sprites.toml").as_deref(),
        read_opt("transformations.toml").as_deref(),
    )
}

/// String-based entry point used by tests and tooling.
pub fn load_from_strings(
    verbs: &str,
    rooms: &str,
    objects: &str,
    sprites: Option<&str>,
    transformations: Option<&str>,
) -> Result<World, ContentError> {
    let mut world = World::new();

    parse_verbs(&mut world, parse_table(verbs, "verbs.toml")?)?;
    parse_rooms(&mut world, parse_table(rooms, "rooms.toml")?)?;
    parse_objects(&mut world, parse_table(objects, "objects.toml")?)?;
    if let Some(src) = sprites {
        parse_sprites(&mut world, parse_table(src, "sprites.toml")?)?;
    }
    if let Some(src) = transformations {
        parse_transformations(&mut world, parse_table(src, "transformations.toml")?)?;
    }

    validate(&world)?;
    resolve_container_locations(&mut world);

    tracing::info!(
        rooms = world.rooms().count(),
        entities = world.entity_count(),
        verbs = world.verbs().count(),
        templates = world.templates().count(),
        rules = world.rules().len(),
        "world content loaded"
    );
    Ok(world)
}

fn parse_table(src: &str, file: &str) -> Result<Table, ContentError> {
    src.parse::<Table>().map_err(|source| ContentError::Parse {
        path: file.to_string(),
        source,
    })
}

fn section<'a>(file: &str, id: &str, value: &'a Value) -> Result<&'a Table, ContentError> {
    value
        .as_table()
        .ok_or_else(|| invalid(file, format!("[{id}] must be a table")))
}

fn get_str(table: &Table, key: &str) -> Option<String> {
    table.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn get_bool(file: &str, id: &str, table: &Table, key: &str, default: bool) -> Result<bool, ContentError> {
    match table.get(key) {
        None => Ok(default),
        Some(Value::Boolean(b)) => Ok(*b),
        Some(_) => Err(invalid(file, format!("[{id}] {key} must be a boolean"))),
    }
}

fn get_int(file: &str, id: &str, table: &Table, key: &str, default: i64) -> Result<i64, ContentError> {
    match table.get(key) {
        None => Ok(default),
        Some(Value::Integer(n)) => Ok(*n),
        Some(_) => Err(invalid(file, format!("[{id}] {key} must be an integer"))),
    }
}

fn get_float(file: &str, id: &str, table: &Table, key: &str, default: f64) -> Result<f64, ContentError> {
    match table.get(key) {
        None => Ok(default),
        Some(Value::Float(f)) => Ok(*f),
        Some(Value::Integer(n)) => Ok(*n as f64),
        Some(_) => Err(invalid(file, format!("[{id}] {key} must be a number"))),
    }
}

fn get_verb_set(file: &str, id: &str, table: &Table) -> Result<BTreeSet<VerbId>, ContentError> {
    match table.get("valid_verbs") {
        None => Ok(BTreeSet::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(VerbId::new)
                    .ok_or_else(|| invalid(file, format!("[{id}] valid_verbs entries must be strings")))
            })
            .collect(),
        Some(_) => Err(invalid(file, format!("[{id}] valid_verbs must be an array"))),
    }
}

fn value_to_prop(file: &str, id: &str, key: &str, value: &Value) -> Result<PropertyValue, ContentError> {
    match value {
        Value::Boolean(b) => Ok(PropertyValue::Bool(*b)),
        Value::Integer(n) => Ok(PropertyValue::Int(*n)),
        Value::Float(f) => Ok(PropertyValue::Float(*f)),
        Value::String(s) => Ok(PropertyValue::Text(s.clone())),
        _ => Err(invalid(
            file,
            format!("[{id}] property '{key}' must be a boolean, number, or string"),
        )),
    }
}

fn parse_verbs(world: &mut World, table: Table) -> Result<(), ContentError> {
    const FILE: &str = "verbs.toml";
    for (id, value) in &table {
        let section = section(FILE, id, value)?;
        let mut verb = Verb::new(id.as_str(), get_bool(FILE, id, section, "requires_target", true)?);
        if let Some(name) = get_str(section, "name") {
            verb.name = name;
        }
        if let Some(Value::Array(items)) = section.get("aliases") {
            for item in items {
                let alias = item
                    .as_str()
                    .ok_or_else(|| invalid(FILE, format!("[{id}] aliases entries must be strings")))?;
                verb.aliases.push(alias.to_string());
            }
        }
        if let Some(desc) = get_str(section, "description") {
            verb.description = desc;
        }
        world.add_verb(verb);
    }
    Ok(())
}

fn parse_rooms(world: &mut World, table: Table) -> Result<(), ContentError> {
    const FILE: &str = "rooms.toml";
    for (id, value) in &table {
        let section = section(FILE, id, value)?;
        let mut room = Room::new(
            id.as_str(),
            get_str(section, "name").unwrap_or_else(|| id.clone()),
            get_str(section, "description").unwrap_or_default(),
        );

        for (key, value) in section {
            if key == "name" || key == "description" {
                continue;
            }
            if let Some(dir) = Direction::parse(key) {
                let dest = value
                    .as_str()
                    .ok_or_else(|| invalid(FILE, format!("[{id}] exit '{key}' must be a room id")))?;
                room.exits.insert(dir, RoomId::new(dest));
            } else {
                room.props.set(key.clone(), value_to_prop(FILE, id, key, value)?);
            }
        }

        // Engine-known room flags must be booleans.
        for key in [prop::COLD, prop::START] {
            if section.contains_key(key) {
                get_bool(FILE, id, section, key, false)?;
            }
        }

        world.add_room(room);
    }
    Ok(())
}

const OBJECT_META_KEYS: [&str; 5] = ["name", "description", "location", "valid_verbs", "state"];

fn parse_objects(world: &mut World, table: Table) -> Result<(), ContentError> {
    const FILE: &str = "objects.toml";
    for (id, value) in &table {
        let section = section(FILE, id, value)?;
        let mut entity = Entity::object(
            id.as_str(),
            get_str(section, "name").unwrap_or_else(|| id.clone()),
            get_str(section, "description").unwrap_or_default(),
        );
        entity.verbs = get_verb_set(FILE, id, section)?;
        if let Some(state) = get_str(section, "state") {
            entity.state = state;
        }

        for (key, value) in section {
            if OBJECT_META_KEYS.contains(&key.as_str()) {
                continue;
            }
            entity.props.set(key.clone(), value_to_prop(FILE, id, key, value)?);
        }

        // Type-check the keys the engine reads.
        for key in [prop::TAKEABLE, prop::CONTAINER, prop::WEAPON, prop::CONSUMABLE] {
            if section.contains_key(key) {
                get_bool(FILE, id, section, key, false)?;
            }
        }
        for key in [prop::DAMAGE, prop::HEALTH_RESTORE] {
            if section.contains_key(key) {
                get_int(FILE, id, section, key, 0)?;
            }
        }
        if section.contains_key(prop::SPAWN_CHANCE) {
            let chance = get_float(FILE, id, section, prop::SPAWN_CHANCE, 0.0)?;
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(FILE, format!("[{id}] spawn_chance must be within 0..=1")));
            }
        }

        // Location strings resolve in validate(), once all ids are known.
        if let Some(loc) = get_str(section, "location") {
            if loc != "none" {
                entity.location = Location::Room(RoomId::new(loc));
            }
        }

        world.add_entity(entity);
    }
    Ok(())
}

fn parse_sprites(world: &mut World, table: Table) -> Result<(), ContentError> {
    const FILE: &str = "sprites.toml";
    for (id, value) in &table {
        let section = section(FILE, id, value)?;
        let aggression = get_float(FILE, id, section, "aggression", 0.5)?;
        let spawn_chance = get_float(FILE, id, section, "spawn_chance", 0.05)?;
        if !(0.0..=1.0).contains(&aggression) {
            return Err(invalid(FILE, format!("[{id}] aggression must be within 0..=1")));
        }
        if !(0.0..=1.0).contains(&spawn_chance) {
            return Err(invalid(FILE, format!("[{id}] spawn_chance must be within 0..=1")));
        }
        let behavior_str = get_str(section, "behavior").unwrap_or_else(|| "passive".to_string());
        let behavior = Behavior::parse(&behavior_str)
            .ok_or_else(|| invalid(FILE, format!("[{id}] behavior must be 'passive' or 'aggressive'")))?;

        world.add_template(SpriteTemplate {
            id: id.clone(),
            name: get_str(section, "name").unwrap_or_else(|| id.clone()),
            description: get_str(section, "description").unwrap_or_default(),
            health: get_int(FILE, id, section, "health", 50)? as i32,
            damage: get_int(FILE, id, section, "damage", 10)? as i32,
            aggression,
            behavior,
            can_pickup: get_bool(FILE, id, section, "can_pickup", false)?,
            spawn_chance,
            verbs: get_verb_set(FILE, id, section)?,
        });
    }
    Ok(())
}

fn parse_transformations(world: &mut World, table: Table) -> Result<(), ContentError> {
    const FILE: &str = "transformations.toml";
    for (id, value) in &table {
        let section = section(FILE, id, value)?;
        let entity = get_str(section, "entity")
            .ok_or_else(|| invalid(FILE, format!("[{id}] missing required key 'entity'")))?;

        let mut rule = TransformRule::new(id.as_str(), entity);
        rule.require_state = get_str(section, "state");
        rule.require_room_flag = get_str(section, "room_flag");
        rule.min_turns = get_int(FILE, id, section, "turns", 0)? as u64;
        rule.new_state = get_str(section, "new_state");
        rule.replace_with = get_str(section, "replace_with").map(EntityId::new);
        rule.message = get_str(section, "message").unwrap_or_default();
        world.add_rule(rule);
    }
    Ok(())
}

fn validate(world: &World) -> Result<(), ContentError> {
    for room in world.rooms() {
        for (dir, dest) in &room.exits {
            if world.room(dest.as_str()).is_none() {
                return Err(invalid(
                    "rooms.toml",
                    format!("[{}] exit {dir} points at unknown room '{dest}'", room.id),
                ));
            }
        }
    }

    for entity in world.entities() {
        if let Location::Room(loc) = &entity.location {
            let ok = world.room(loc.as_str()).is_some()
                || world.entity(loc.as_str()).is_some_and(|e| e.is_container());
            if !ok {
                return Err(invalid(
                    "objects.toml",
                    format!("[{}] location '{loc}' is neither a room nor a container", entity.id),
                ));
            }
        }
        for verb in &entity.verbs {
            if world.verb(verb.as_str()).is_none() {
                return Err(invalid(
                    "objects.toml",
                    format!("[{}] valid_verbs names unknown verb '{verb}'", entity.id),
                ));
            }
        }
    }

    for template in world.templates() {
        for verb in &template.verbs {
            if world.verb(verb.as_str()).is_none() {
                return Err(invalid(
                    "sprites.toml",
                    format!("[{}] valid_verbs names unknown verb '{verb}'", template.id),
                ));
            }
        }
    }

    for rule in world.rules() {
        if world.entity(rule.entity.as_str()).is_none() {
            return Err(invalid(
                "transformations.toml",
                format!("[{}] targets unknown entity '{}'", rule.id, rule.entity),
            ));
        }
        if let Some(tmpl) = &rule.replace_with {
            if world.entity(tmpl.as_str()).is_none() {
                return Err(invalid(
                    "transformations.toml",
                    format!("[{}] replace_with names unknown entity '{tmpl}'", rule.id),
                ));
            }
        }
    }

    if !world.rooms().any(|r| r.is_start()) {
        tracing::warn!("no room carries start = true; the first room will be used");
    }

    Ok(())
}

/// Second pass over parsed entities: `location = "<container id>"` entries
/// become `Location::Inside` once every id is known.
fn resolve_container_locations(world: &mut World) {
    let fixes: Vec<(EntityId, EntityId)> = world
        .entities()
        .filter_map(|e| match &e.location {
            Location::Room(loc) if world.room(loc.as_str()).is_none() => world
                .entity(loc.as_str())
                .filter(|c| c.is_container())
                .map(|c| (e.id.clone(), c.id.clone())),
            _ => None,
        })
        .collect();
    for (id, container) in fixes {
        world.put_inside(id.as_str(), &container);
    }
}
