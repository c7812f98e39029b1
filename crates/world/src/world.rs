use std::collections::{BTreeMap, BTreeSet};

use crate::entity::{Entity, Location, SpriteTemplate};
use crate::room::Room;
use crate::rules::TransformRule;
use crate::types::{EntityId, RoomId, VerbId};
use crate::verb::Verb;

/// In-memory registries for one shared game world.
///
/// Plain mutable store: no internal synchronization. The game thread is the
/// single owner; everything else talks to it over channels.
#[derive(Debug, Default)]
pub struct World {
    rooms: BTreeMap<RoomId, Room>,
    entities: BTreeMap<EntityId, Entity>,
    verbs: BTreeMap<VerbId, Verb>,
    templates: BTreeMap<String, SpriteTemplate>,
    rules: Vec<TransformRule>,
    spawn_serial: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms.insert(room.id.clone(), room);
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    pub fn add_verb(&mut self, verb: Verb) {
        self.verbs.insert(verb.id.clone(), verb);
    }

    pub fn add_template(&mut self, template: SpriteTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn add_rule(&mut self, rule: TransformRule) {
        self.rules.push(rule);
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    /// The room flagged as the starting point, or the first room if none is.
    pub fn start_room(&self) -> Option<RoomId> {
        self.rooms
            .values()
            .find(|r| r.is_start())
            .or_else(|| self.rooms.values().next())
            .map(|r| r.id.clone())
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entities_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.values_mut()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Insert or replace an entity wholesale (snapshot restore).
    pub fn upsert_entity(&mut self, entity: Entity) {
        self.entities.insert(entity.id.clone(), entity);
    }

    pub fn verb(&self, id: &str) -> Option<&Verb> {
        self.verbs.get(id)
    }

    pub fn verbs(&self) -> impl Iterator<Item = &Verb> {
        self.verbs.values()
    }

    /// Resolve a typed token against verb ids, then alias lists. First match
    /// in registration order wins.
    pub fn resolve_verb(&self, token: &str) -> Option<&Verb> {
        if let Some(verb) = self.verbs.get(token) {
            return Some(verb);
        }
        self.verbs.values().find(|v| v.matches(token))
    }

    pub fn templates(&self) -> impl Iterator<Item = &SpriteTemplate> {
        self.templates.values()
    }

    pub fn template(&self, id: &str) -> Option<&SpriteTemplate> {
        self.templates.get(id)
    }

    pub fn rules(&self) -> &[TransformRule] {
        &self.rules
    }

    pub fn spawn_serial(&self) -> u64 {
        self.spawn_serial
    }

    pub fn set_spawn_serial(&mut self, serial: u64) {
        self.spawn_serial = serial;
    }

    // ---- queries ----------------------------------------------------------

    pub fn objects_in_room(&self, room: &str) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| !e.is_sprite() && matches!(&e.location, Location::Room(r) if r.as_str() == room))
            .collect()
    }

    /// Living sprites in a room. Dead sprites are deleted outright, but the
    /// filter keeps the query honest either way.
    pub fn sprites_in_room(&self, room: &str) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| {
                matches!(&e.location, Location::Room(r) if r.as_str() == room)
                    && e.sprite().is_some_and(|s| s.is_alive())
            })
            .collect()
    }

    pub fn carried_by(&self, player: &str) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| matches!(&e.location, Location::Carried(p) if p == player))
            .collect()
    }

    /// Contents of a container, or a sprite's holdings.
    pub fn inside(&self, owner: &str) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| matches!(&e.location, Location::Inside(o) if o.as_str() == owner))
            .collect()
    }

    pub fn first_weapon_in_room(&self, room: &str) -> Option<EntityId> {
        self.objects_in_room(room)
            .into_iter()
            .find(|e| e.is_weapon())
            .map(|e| e.id.clone())
    }

    /// Locate a named object: the player's inventory first, then the room.
    pub fn find_object(&self, player: &str, room: &str, name: &str) -> Option<EntityId> {
        let wanted = name.trim().to_lowercase();
        self.carried_by(player)
            .into_iter()
            .find(|e| e.matches_name(&wanted))
            .or_else(|| {
                self.objects_in_room(room)
                    .into_iter()
                    .find(|e| e.matches_name(&wanted))
            })
            .map(|e| e.id.clone())
    }

    pub fn find_sprite_in_room(&self, room: &str, name: &str) -> Option<EntityId> {
        let wanted = name.trim().to_lowercase();
        self.sprites_in_room(room)
            .into_iter()
            .find(|e| e.matches_name(&wanted))
            .map(|e| e.id.clone())
    }

    // ---- mutations --------------------------------------------------------

    pub fn move_to_room(&mut self, id: &str, room: &RoomId) -> bool {
        match self.entities.get_mut(id) {
            Some(e) => {
                e.location = Location::Room(room.clone());
                true
            }
            None => false,
        }
    }

    pub fn give_to(&mut self, id: &str, player: &str) -> bool {
        match self.entities.get_mut(id) {
            Some(e) => {
                e.location = Location::Carried(player.to_string());
                true
            }
            None => false,
        }
    }

    pub fn put_inside(&mut self, id: &str, owner: &EntityId) -> bool {
        match self.entities.get_mut(id) {
            Some(e) => {
                e.location = Location::Inside(owner.clone());
                true
            }
            None => false,
        }
    }

    pub fn remove_from_play(&mut self, id: &str) -> bool {
        match self.entities.get_mut(id) {
            Some(e) => {
                e.location = Location::Removed;
                true
            }
            None => false,
        }
    }

    /// Spawn a sprite instance from a template. Instances get fresh ids so a
    /// respawned goblin is never confused with a dead one.
    pub fn spawn_sprite(&mut self, template_id: &str, room: &RoomId) -> Option<EntityId> {
        let template = self.templates.get(template_id)?;
        self.spawn_serial += 1;
        let id = EntityId::new(format!("{}_{}", template_id, self.spawn_serial));
        let sprite = template.instantiate(id.clone(), room.clone());
        self.entities.insert(id.clone(), sprite);
        Some(id)
    }

    /// Delete an entity outright. Dead sprites are despawned, not marked.
    pub fn despawn(&mut self, id: &str) -> Option<Entity> {
        self.entities.remove(id)
    }

    /// Morph an entity into another definition: same id and location, the
    /// template's name/description/props/verbs. State is left to the caller.
    pub fn replace_from_template(&mut self, id: &str, template: &str) -> bool {
        let Some(tmpl) = self.entities.get(template).cloned() else {
            return false;
        };
        match self.entities.get_mut(id) {
            Some(e) => {
                e.name = tmpl.name;
                e.description = tmpl.description;
                e.props = tmpl.props;
                e.verbs = tmpl.verbs;
                true
            }
            None => false,
        }
    }

    // ---- consistency ------------------------------------------------------

    /// Every location must refer to a live owner, and carried entities must
    /// agree with the inventory sets passed in. Returns violations; empty
    /// means consistent. Test and debug aid.
    pub fn location_violations(
        &self,
        inventories: &BTreeMap<String, BTreeSet<EntityId>>,
    ) -> Vec<String> {
        let mut violations = Vec::new();

        for entity in self.entities.values() {
            match &entity.location {
                Location::Room(r) => {
                    if !self.rooms.contains_key(r.as_str()) {
                        violations.push(format!("{} is in unknown room {}", entity.id, r));
                    }
                }
                Location::Carried(p) => match inventories.get(p) {
                    Some(inv) if inv.contains(&entity.id) => {}
                    Some(_) => {
                        violations.push(format!("{} carried by {} but not in their inventory", entity.id, p))
                    }
                    None => violations.push(format!("{} carried by unknown player {}", entity.id, p)),
                },
                Location::Inside(owner) => {
                    if !self.entities.contains_key(owner.as_str()) {
                        violations.push(format!("{} inside unknown entity {}", entity.id, owner));
                    }
                }
                Location::Removed => {}
            }
        }

        for (player, inv) in inventories {
            for id in inv {
                match self.entities.get(id.as_str()) {
                    Some(e) if e.location == Location::Carried(player.clone()) => {}
                    Some(_) => violations.push(format!(
                        "{} in {}'s inventory but located elsewhere",
                        id, player
                    )),
                    None => violations.push(format!("{} in {}'s inventory but does not exist", id, player)),
                }
            }
        }

        violations
    }
}
