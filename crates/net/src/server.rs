use std::sync::atomic::{AtomicU64, Ordering};

use session::SessionId;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::channels::{NetToGame, PlayerTx, RegisterSession, RegisterTx, SessionWriteRx, UnregisterTx};
use crate::line::LineBuffer;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(0);

/// Accept connections and spawn per-session tasks until shutdown signals.
pub async fn run_tcp_server(
    addr: String,
    player_tx: PlayerTx,
    register_tx: RegisterTx,
    unregister_tx: UnregisterTx,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "TCP server listening");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer_addr) = accepted?;
                let session_id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
                tracing::info!(session_id = session_id.0, %peer_addr, "new connection");

                let player_tx = player_tx.clone();
                let register_tx = register_tx.clone();
                let unregister_tx = unregister_tx.clone();
                tokio::spawn(async move {
                    handle_session(stream, session_id, player_tx, register_tx, unregister_tx).await;
                });
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("TCP server shutting down");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_session(
    stream: tokio::net::TcpStream,
    session_id: SessionId,
    player_tx: PlayerTx,
    register_tx: RegisterTx,
    unregister_tx: UnregisterTx,
) {
    let (mut reader, mut writer) = stream.into_split();

    let (write_tx, mut write_rx): (_, SessionWriteRx) = tokio::sync::mpsc::unbounded_channel();
    let _ = register_tx.send(RegisterSession {
        session_id,
        write_tx,
    });
    let _ = player_tx.send(NetToGame::NewConnection { session_id });

    let writer_handle = tokio::spawn(async move {
        while let Some(text) = write_rx.recv().await {
            // Normalize bare \n to \r\n for line-mode clients.
            let text = text.replace("\r\n", "\n").replace('\n', "\r\n");
            let msg = format!("{text}\r\n");
            if writer.write_all(msg.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut line_buffer = LineBuffer::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                for line in line_buffer.feed(&buf[..n]) {
                    let _ = player_tx.send(NetToGame::PlayerInput { session_id, line });
                }
            }
            Err(_) => break,
        }
    }

    let _ = player_tx.send(NetToGame::Disconnected { session_id });
    let _ = unregister_tx.send(session_id);
    writer_handle.abort();
    tracing::info!(session_id = session_id.0, "session ended");
}
