use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}

/// Per-global-turn accounting, logged by the game thread.
#[derive(Debug, Clone)]
pub struct TurnMetrics {
    pub turn: u64,
    pub duration_us: u128,
    pub events: usize,
    pub entities: usize,
    pub players: usize,
}

impl TurnMetrics {
    pub fn log(&self) {
        tracing::info!(
            turn = self.turn,
            duration_us = self.duration_us,
            events = self.events,
            entities = self.entities,
            players = self.players,
            "turn processed"
        );
    }
}
