use std::path::Path;

use engine::{CombatConfig, GameConfig};
use serde::Deserialize;
use world::RoomId;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetSection {
    pub listen_addr: String,
}

impl Default for NetSection {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:4000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameSection {
    pub turn_every_commands: u64,
    pub attrition_interval: u64,
    pub attrition_damage: i32,
    pub starting_health: i32,
    pub respawn_room: String,
    pub rng_seed: Option<u64>,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            turn_every_commands: 3,
            attrition_interval: 5,
            attrition_damage: 2,
            starting_health: 100,
            respawn_room: "entrance_hall".to_string(),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CombatSection {
    pub unarmed_damage: i64,
    pub pvp_enabled: bool,
    pub pvp_base_damage: i64,
    pub pvp_weapon_multiplier: f64,
}

impl Default for CombatSection {
    fn default() -> Self {
        Self {
            unarmed_damage: 5,
            pvp_enabled: true,
            pvp_base_damage: 10,
            pvp_weapon_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistSection {
    pub enabled: bool,
    pub snapshot_interval: u64,
    pub save_dir: String,
}

impl Default for PersistSection {
    fn default() -> Self {
        Self {
            enabled: false,
            snapshot_interval: 10,
            save_dir: "data/snapshots".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    pub dir: String,
    pub scene_suffix: String,
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            dir: "content".to_string(),
            scene_suffix: "fantasy illustration, digital painting".to_string(),
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub net: NetSection,
    pub game: GameSection,
    pub combat: CombatSection,
    pub persistence: PersistSection,
    pub content: ContentSection,
}

impl ServerConfig {
    /// Load configuration from an optional TOML file path, falling back to
    /// defaults when the path is absent.
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        Ok(config)
    }

    pub fn to_game_config(&self) -> GameConfig {
        GameConfig {
            turn_every_commands: self.game.turn_every_commands,
            attrition_interval: self.game.attrition_interval,
            attrition_damage: self.game.attrition_damage,
            starting_health: self.game.starting_health,
            respawn_room: RoomId::new(self.game.respawn_room.as_str()),
            snapshot_interval: self.persistence.snapshot_interval,
            scene_suffix: self.content.scene_suffix.clone(),
            rng_seed: self.game.rng_seed,
            combat: CombatConfig {
                unarmed_damage: self.combat.unarmed_damage,
                pvp_enabled: self.combat.pvp_enabled,
                pvp_base_damage: self.combat.pvp_base_damage,
                pvp_weapon_multiplier: self.combat.pvp_weapon_multiplier,
            },
        }
    }
}

/// Parse CLI arguments. Supports: --config <path>
pub fn parse_cli_args() -> ServerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(val) = args.get(i + 1) {
                    config_path = Some(val.as_str());
                    i += 2;
                } else {
                    eprintln!("--config requires a path argument");
                    std::process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {other}");
                std::process::exit(1);
            }
        }
    }

    match ServerConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_matches_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.net.listen_addr, "0.0.0.0:4000");
        assert_eq!(config.game.turn_every_commands, 3);
        assert_eq!(config.game.attrition_interval, 5);
        assert_eq!(config.game.attrition_damage, 2);
        assert_eq!(config.game.respawn_room, "entrance_hall");
        assert_eq!(config.combat.unarmed_damage, 5);
        assert_eq!(config.combat.pvp_base_damage, 10);
        assert!(!config.persistence.enabled);
        assert_eq!(config.content.dir, "content");
    }

    #[test]
    fn to_game_config_carries_sections_over() {
        let config = ServerConfig::default();
        let game = config.to_game_config();
        assert_eq!(game.turn_every_commands, 3);
        assert_eq!(game.respawn_room, RoomId::new("entrance_hall"));
        assert_eq!(game.combat.pvp_weapon_multiplier, 1.0);
        assert_eq!(game.snapshot_interval, 10);
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = ServerConfig::load(Some("/tmp/no_such_adventure_config.toml")).unwrap();
        assert_eq!(config.game.turn_every_commands, 3);
    }

    #[test]
    fn load_partial_toml() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
[game]
turn_every_commands = 5
rng_seed = 7

[combat]
pvp_enabled = false
"#
        )
        .unwrap();

        let config = ServerConfig::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.game.turn_every_commands, 5);
        assert_eq!(config.game.rng_seed, Some(7));
        assert!(!config.combat.pvp_enabled);
        // Unset fields keep defaults.
        assert_eq!(config.net.listen_addr, "0.0.0.0:4000");
        assert_eq!(config.game.attrition_interval, 5);
    }

    #[test]
    fn load_full_toml() {
        let mut f = NamedTempFile::new().unwrap();
        write!(
            f,
            r#"
[net]
listen_addr = "127.0.0.1:5000"

[game]
turn_every_commands = 4
attrition_interval = 10
attrition_damage = 1
starting_health = 80
respawn_room = "garden"

[combat]
unarmed_damage = 3
pvp_enabled = true
pvp_base_damage = 12
pvp_weapon_multiplier = 1.5

[persistence]
enabled = true
snapshot_interval = 20
save_dir = "saves"

[content]
dir = "worlds/default"
scene_suffix = "oil painting"
"#
        )
        .unwrap();

        let config = ServerConfig::load(Some(f.path().to_str().unwrap())).unwrap();
        assert_eq!(config.net.listen_addr, "127.0.0.1:5000");
        assert_eq!(config.game.starting_health, 80);
        assert_eq!(config.combat.pvp_weapon_multiplier, 1.5);
        assert!(config.persistence.enabled);
        assert_eq!(config.persistence.save_dir, "saves");
        assert_eq!(config.content.scene_suffix, "oil painting");
    }
}
