use session::{SessionId, SessionOutput};
use tokio::sync::mpsc;

/// Messages from the network layer to the game thread.
#[derive(Debug)]
pub enum NetToGame {
    /// A new TCP connection was accepted.
    NewConnection { session_id: SessionId },
    /// Player typed a line of input.
    PlayerInput { session_id: SessionId, line: String },
    /// Player disconnected.
    Disconnected { session_id: SessionId },
}

/// Sender from network tasks to the game thread.
pub type PlayerTx = mpsc::UnboundedSender<NetToGame>;
/// Receiver in the game thread for player events.
pub type PlayerRx = mpsc::UnboundedReceiver<NetToGame>;

/// Sender from the game thread to the output router.
pub type OutputTx = mpsc::UnboundedSender<SessionOutput>;
pub type OutputRx = mpsc::UnboundedReceiver<SessionOutput>;

/// Per-session write channel (game thread -> output router -> session task).
pub type SessionWriteTx = mpsc::UnboundedSender<String>;
pub type SessionWriteRx = mpsc::UnboundedReceiver<String>;

/// Registration message for the output router.
#[derive(Debug)]
pub struct RegisterSession {
    pub session_id: SessionId,
    pub write_tx: SessionWriteTx,
}

pub type RegisterTx = mpsc::UnboundedSender<RegisterSession>;
pub type RegisterRx = mpsc::UnboundedReceiver<RegisterSession>;

pub type UnregisterTx = mpsc::UnboundedSender<SessionId>;
pub type UnregisterRx = mpsc::UnboundedReceiver<SessionId>;
