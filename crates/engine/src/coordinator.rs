//! Brokers every connected session's access to the one shared world.
//!
//! The coordinator is strictly single-threaded: the game thread owns it and
//! processes one network event at a time, so command resolution is never
//! interleaved. Sessions talk to it over channels; there is no shared
//! "active player" state anywhere.

use std::time::Instant;

use persistence::manager::SnapshotManager;
use persistence::snapshot;
use rand::rngs::StdRng;
use rand::SeedableRng;
use session::{PlayerRecord, SessionId, SessionManager, SessionOutput, SessionState};
use world::World;

use crate::command;
use crate::config::GameConfig;
use crate::events::{Audience, GameEvent};
use crate::scene;
use crate::turn::{self, TurnEvent};

const BANNER: &str = "Welcome to the dungeon.\nEnter your name: ";

/// Everything after the command word, original casing preserved.
fn rest_of(line: &str) -> &str {
    line.split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .unwrap_or("")
}

const HELP_TEXT: &str = "\
Commands:
  Movement:  north/n, south/s, east/e, west/w, up/u, down/d, go <dir>
  Actions:   look/l, examine <obj>, take <obj>, drop <obj>, inventory/i
             put <obj> in <container>, open <obj>, close <obj>, use <obj>
  Combat:    attack <target>, attack <target> with <weapon>, flee, health
  Items:     drink <potion>
  Social:    say <message>, tell <player> <message>, tell everyone <message>, who
  PvP:       pvp (toggle), stats
  Meta:      save, help, quit";

/// One record per connected player, one world, one writer.
pub struct Coordinator {
    world: World,
    sessions: SessionManager,
    cfg: GameConfig,
    rng: StdRng,
    turn: u64,
    commands: u64,
    snapshots: Option<SnapshotManager>,
}

impl Coordinator {
    pub fn new(world: World, cfg: GameConfig) -> Self {
        let rng = match cfg.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            world,
            sessions: SessionManager::new(),
            cfg,
            rng,
            turn: 0,
            commands: 0,
            snapshots: None,
        }
    }

    pub fn with_snapshots(mut self, manager: SnapshotManager) -> Self {
        self.snapshots = Some(manager);
        self
    }

    /// Adopt state restored from a snapshot: players park in the dormant
    /// pool until their names reconnect.
    pub fn adopt_restored(&mut self, players: Vec<PlayerRecord>, turn: u64) {
        for record in players {
            self.sessions.add_dormant(record);
        }
        self.turn = turn;
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionManager {
        &mut self.sessions
    }

    /// A new connection: prompt for a name.
    pub fn connect(&mut self, id: SessionId) -> Vec<SessionOutput> {
        self.sessions.connect(id);
        tracing::info!(session_id = id.0, "session connected");
        vec![SessionOutput::new(id, BANNER)]
    }

    /// A line of input from a session, in whatever state it is in.
    pub fn line(&mut self, id: SessionId, raw: &str) -> Vec<SessionOutput> {
        match self.sessions.state(id).cloned() {
            None => Vec::new(),
            Some(SessionState::AwaitingName) => self.join(id, raw),
            Some(SessionState::Playing(name)) => self.play(id, &name, raw),
        }
    }

    /// Session teardown. Any commands already queued for this session were
    /// handled before this event in channel order.
    pub fn disconnect(&mut self, id: SessionId) -> Vec<SessionOutput> {
        match self.sessions.disconnect(id) {
            Some(name) => {
                tracing::info!(session_id = id.0, player = %name, "player disconnected");
                self.route(vec![GameEvent::to_all(format!("{name} has left the game."))])
            }
            None => Vec::new(),
        }
    }

    /// Scene-description string for a player's current room, for external
    /// illustration tooling.
    pub fn scene_for(&self, player: &str) -> Option<String> {
        self.sessions.player(player)?;
        let look = command::render_look(&self.world, &self.sessions, player);
        Some(scene::scene_prompt(&look, &self.cfg.scene_suffix))
    }

    /// Snapshot on demand. Used by the `save` command and shutdown.
    pub fn save_snapshot(&self) -> Option<Result<std::path::PathBuf, persistence::PersistenceError>> {
        let manager = self.snapshots.as_ref()?;
        let players: Vec<&PlayerRecord> =
            self.sessions.players().chain(self.sessions.dormant_players()).collect();
        let snap = snapshot::capture(&self.world, players, self.turn);
        Some(manager.save_to_disk(&snap))
    }

    fn join(&mut self, id: SessionId, raw: &str) -> Vec<SessionOutput> {
        let Some(name) = raw.split_whitespace().next().map(str::to_string) else {
            return vec![SessionOutput::new(id, "Enter your name: ")];
        };
        if self.sessions.name_in_use(&name) {
            return vec![SessionOutput::new(
                id,
                format!("'{name}' is already connected. Enter your name: "),
            )];
        }
        let Some(start) = self.world.start_room() else {
            return vec![SessionOutput::with_disconnect(id, "The world has no rooms. Goodbye.")];
        };

        let record = PlayerRecord::new(&name, start, self.cfg.starting_health);
        self.sessions.bind_player(id, record);
        tracing::info!(session_id = id.0, player = %name, "player joined");

        let mut outs = self.route(vec![GameEvent::to_all_except(
            name.clone(),
            format!("{name} has joined the game."),
        )]);
        outs.push(SessionOutput::new(
            id,
            format!(
                "Welcome, {name}! Type 'help' for commands.\n\n{}",
                command::render_look(&self.world, &self.sessions, &name)
            ),
        ));
        outs
    }

    fn play(&mut self, id: SessionId, name: &str, raw: &str) -> Vec<SessionOutput> {
        let line = raw.trim();
        if line.is_empty() {
            return Vec::new();
        }
        let lower = line.to_lowercase();
        let first = lower.split_whitespace().next().unwrap_or_default();

        let mut outs = match first {
            "help" | "?" => vec![SessionOutput::new(id, HELP_TEXT)],
            "quit" | "exit" => {
                let mut outs = vec![SessionOutput::with_disconnect(id, "Goodbye!")];
                outs.extend(self.disconnect(id));
                return outs;
            }
            "say" => self.say(id, name, line),
            "tell" => self.tell(id, name, line),
            "who" => vec![SessionOutput::new(id, self.who())],
            "pvp" => self.toggle_pvp(id, name),
            "stats" => vec![SessionOutput::new(id, self.stats(name))],
            "save" => vec![SessionOutput::new(id, self.save_command())],
            _ => {
                let outcome = command::execute(
                    &mut self.world,
                    &mut self.sessions,
                    &self.cfg,
                    &mut self.rng,
                    name,
                    line,
                );
                let mut outs = vec![SessionOutput::new(id, outcome.reply)];
                outs.extend(self.route(outcome.events));
                outs
            }
        };

        self.commands += 1;
        if self.cfg.turn_every_commands > 0 && self.commands % self.cfg.turn_every_commands == 0 {
            outs.extend(self.run_turn());
        }
        outs
    }

    fn say(&mut self, id: SessionId, name: &str, line: &str) -> Vec<SessionOutput> {
        let message = rest_of(line);
        if message.is_empty() {
            return vec![SessionOutput::new(id, "Say what?")];
        }
        let room = match self.sessions.player(name) {
            Some(p) => p.room.clone(),
            None => return Vec::new(),
        };
        let mut outs = self.route(vec![GameEvent::to_room_except(
            room,
            &[name],
            format!("{name} says: \"{message}\""),
        )]);
        outs.push(SessionOutput::new(id, format!("You say: \"{message}\"")));
        outs
    }

    fn tell(&mut self, id: SessionId, name: &str, line: &str) -> Vec<SessionOutput> {
        const USAGE: &str = "Usage: tell <player> <message> or tell everyone <message>";
        let rest = rest_of(line);
        let Some((target, message)) = rest.split_once(' ') else {
            return vec![SessionOutput::new(id, USAGE)];
        };
        let message = message.trim();
        if message.is_empty() {
            return vec![SessionOutput::new(id, USAGE)];
        }

        if target.eq_ignore_ascii_case("everyone") {
            let mut outs = self.route(vec![GameEvent::to_all_except(
                name,
                format!("{name} tells everyone: \"{message}\""),
            )]);
            outs.push(SessionOutput::new(id, format!("You tell everyone: \"{message}\"")));
            return outs;
        }

        let Some(recipient) = self.sessions.resolve_player_name(target) else {
            return vec![SessionOutput::new(
                id,
                format!("Player '{target}' not found. Type 'who' to see connected players."),
            )];
        };
        if recipient == name {
            return vec![SessionOutput::new(id, "You can't tell yourself.")];
        }

        let mut outs = self.route(vec![GameEvent::to_player(
            recipient.clone(),
            format!("{name} tells you: \"{message}\""),
        )]);
        outs.push(SessionOutput::new(id, format!("You tell {recipient}: \"{message}\"")));
        outs
    }

    fn who(&self) -> String {
        let mut lines = vec![format!("Connected players ({}):", self.sessions.player_count())];
        for player in self.sessions.players() {
            let room_name = self
                .world
                .room(player.room.as_str())
                .map(|r| r.name.clone())
                .unwrap_or_else(|| player.room.to_string());
            lines.push(format!("  {} (in {})", player.name, room_name));
        }
        lines.join("\n")
    }

    fn toggle_pvp(&mut self, id: SessionId, name: &str) -> Vec<SessionOutput> {
        let Some(record) = self.sessions.player_mut(name) else {
            return Vec::new();
        };
        record.pvp_enabled = !record.pvp_enabled;
        let enabled = record.pvp_enabled;
        let room = record.room.clone();

        let broadcast = if enabled {
            format!("{name} has enabled PvP mode!")
        } else {
            format!("{name} has disabled PvP mode.")
        };
        let mut outs = self.route(vec![GameEvent::to_room_except(room, &[name], broadcast)]);
        outs.push(SessionOutput::new(
            id,
            if enabled {
                "PvP mode enabled. You can now attack and be attacked by other players."
            } else {
                "PvP mode disabled. You are safe from player attacks."
            },
        ));
        outs
    }

    fn stats(&self, name: &str) -> String {
        let Some(record) = self.sessions.player(name) else {
            return String::new();
        };
        let ratio = if record.deaths > 0 {
            record.kills as f64 / record.deaths as f64
        } else {
            record.kills as f64
        };
        format!(
            "Combat stats for {name}:\n  Kills: {}\n  Deaths: {}\n  K/D ratio: {ratio:.2}\n  Potions consumed: {}\n  PvP: {}",
            record.kills,
            record.deaths,
            record.potions_consumed,
            if record.pvp_enabled { "enabled" } else { "disabled" }
        )
    }

    fn save_command(&self) -> String {
        match self.save_snapshot() {
            None => "Saving is disabled on this server.".to_string(),
            Some(Ok(_)) => format!("Game saved (turn {}).", self.turn),
            Some(Err(e)) => {
                // Persistence failure is the player's answer, not a crash.
                tracing::error!(error = %e, "manual save failed");
                format!("Save failed: {e}")
            }
        }
    }

    fn run_turn(&mut self) -> Vec<SessionOutput> {
        let started = Instant::now();
        self.turn += 1;
        let events = turn::process_turn(
            &mut self.world,
            &mut self.sessions,
            &self.cfg,
            &mut self.rng,
            self.turn,
        );
        let outs = self.route_turn_events(&events);

        if let Some(manager) = &self.snapshots {
            if self.cfg.snapshot_interval > 0 && self.turn % self.cfg.snapshot_interval == 0 {
                let players: Vec<&PlayerRecord> =
                    self.sessions.players().chain(self.sessions.dormant_players()).collect();
                let snap = snapshot::capture(&self.world, players, self.turn);
                if let Err(e) = manager.save_to_disk(&snap) {
                    tracing::error!(error = %e, turn = self.turn, "autosave failed");
                }
            }
        }

        observability::TurnMetrics {
            turn: self.turn,
            duration_us: started.elapsed().as_micros(),
            events: events.len(),
            entities: self.world.entity_count(),
            players: self.sessions.player_count(),
        }
        .log();
        outs
    }

    /// Deliver turn events: directly-addressed lines go to their player;
    /// allow-listed kinds additionally go to every connected session.
    fn route_turn_events(&self, events: &[TurnEvent]) -> Vec<SessionOutput> {
        let mut outs = Vec::new();
        for event in events {
            if let Some(player) = &event.player {
                if let Some(sid) = self.sessions.session_for(player) {
                    outs.push(SessionOutput::new(sid, event.text.clone()));
                }
            }
            if event.kind.broadcast_to_all() {
                for sid in self.sessions.all_sessions() {
                    let Some(pname) = self.sessions.player_for(sid) else { continue };
                    if event.player.as_deref() == Some(pname) {
                        continue;
                    }
                    outs.push(SessionOutput::new(sid, event.text.clone()));
                }
            }
        }
        outs
    }

    fn route(&self, events: Vec<GameEvent>) -> Vec<SessionOutput> {
        let mut outs = Vec::new();
        for event in events {
            match &event.audience {
                Audience::Player(player) => {
                    if let Some(sid) = self.sessions.session_for(player) {
                        outs.push(SessionOutput::new(sid, event.text.clone()));
                    }
                }
                Audience::Room { room, exclude } => {
                    for name in self.sessions.players_in_room(room) {
                        if exclude.contains(&name) {
                            continue;
                        }
                        if let Some(sid) = self.sessions.session_for(&name) {
                            outs.push(SessionOutput::new(sid, event.text.clone()));
                        }
                    }
                }
                Audience::All { exclude } => {
                    for sid in self.sessions.all_sessions() {
                        let Some(pname) = self.sessions.player_for(sid) else { continue };
                        if exclude.as_deref() == Some(pname) {
                            continue;
                        }
                        outs.push(SessionOutput::new(sid, event.text.clone()));
                    }
                }
            }
        }
        outs
    }
}
