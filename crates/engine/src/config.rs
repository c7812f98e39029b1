use world::RoomId;

/// Combat tuning. Player-vs-sprite damage is `unarmed_damage` plus the
/// weapon's damage value; PvP swaps in its own base and scales the weapon.
#[derive(Debug, Clone)]
pub struct CombatConfig {
    pub unarmed_damage: i64,
    pub pvp_enabled: bool,
    pub pvp_base_damage: i64,
    pub pvp_weapon_multiplier: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            unarmed_damage: 5,
            pvp_enabled: true,
            pvp_base_damage: 10,
            pvp_weapon_multiplier: 1.0,
        }
    }
}

/// Simulation settings the coordinator and turn processor run under.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// A global turn runs after this many player commands.
    pub turn_every_commands: u64,
    /// Players lose health every this many turns (0 disables attrition).
    pub attrition_interval: u64,
    pub attrition_damage: i32,
    pub starting_health: i32,
    /// Where slain players wake up.
    pub respawn_room: RoomId,
    /// Autosave every this many turns when persistence is enabled.
    pub snapshot_interval: u64,
    /// Style suffix appended to scene-description strings.
    pub scene_suffix: String,
    /// Fixed seed for deterministic simulations; None seeds from entropy.
    pub rng_seed: Option<u64>,
    pub combat: CombatConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_every_commands: 3,
            attrition_interval: 5,
            attrition_damage: 2,
            starting_health: 100,
            respawn_room: RoomId::new("entrance_hall"),
            snapshot_interval: 10,
            scene_suffix: "fantasy illustration, digital painting".to_string(),
            rng_seed: None,
            combat: CombatConfig::default(),
        }
    }
}
