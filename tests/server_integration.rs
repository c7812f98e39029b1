//! Full-stack test: TCP server, output router, and a game thread wired the
//! way the binary wires them.

mod common;

use std::time::Duration;

use engine::{Coordinator, GameConfig};
use net::channels::NetToGame;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

use common::{test_config, test_world};

async fn start_stack() -> (std::net::SocketAddr, watch::Sender<bool>) {
    let (player_tx, mut player_rx) = tokio::sync::mpsc::unbounded_channel();
    let (output_tx, output_rx) = tokio::sync::mpsc::unbounded_channel();
    let (register_tx, register_rx) = tokio::sync::mpsc::unbounded_channel();
    let (unregister_tx, unregister_rx) = tokio::sync::mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(net::output_router::run_output_router(
        output_rx,
        register_rx,
        unregister_rx,
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    tokio::spawn(net::server::run_tcp_server(
        addr.to_string(),
        player_tx,
        register_tx,
        unregister_tx,
        shutdown_rx,
    ));

    // Game loop exactly as the binary runs it, minus the content directory.
    std::thread::spawn(move || {
        let cfg = GameConfig {
            turn_every_commands: 1000,
            ..test_config()
        };
        let mut coordinator = Coordinator::new(test_world(), cfg);
        while let Some(event) = player_rx.blocking_recv() {
            let outputs = match event {
                NetToGame::NewConnection { session_id } => coordinator.connect(session_id),
                NetToGame::PlayerInput { session_id, line } => coordinator.line(session_id, &line),
                NetToGame::Disconnected { session_id } => coordinator.disconnect(session_id),
            };
            for output in outputs {
                let _ = output_tx.send(output);
            }
        }
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown_tx)
}

/// Read from the stream until the pattern shows up or two seconds pass.
async fn read_until(stream: &mut TcpStream, pattern: &str) -> String {
    let mut collected = String::new();
    let mut buf = [0u8; 4096];
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);

    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(200), stream.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => {
                collected.push_str(&String::from_utf8_lossy(&buf[..n]));
                if collected.contains(pattern) {
                    return collected;
                }
            }
            Ok(Err(_)) => break,
            Err(_) => {}
        }
    }
    panic!("pattern {pattern:?} not seen; got: {collected:?}");
}

#[tokio::test]
async fn two_players_connect_and_chat() {
    let (addr, _shutdown) = start_stack().await;

    let mut alice = TcpStream::connect(addr).await.unwrap();
    read_until(&mut alice, "Enter your name").await;
    alice.write_all(b"Alice\n").await.unwrap();
    read_until(&mut alice, "Welcome, Alice!").await;

    let mut bob = TcpStream::connect(addr).await.unwrap();
    read_until(&mut bob, "Enter your name").await;
    bob.write_all(b"Bob\n").await.unwrap();
    read_until(&mut bob, "Welcome, Bob!").await;

    // Alice sees the join announcement.
    read_until(&mut alice, "Bob has joined the game.").await;

    // Room-scoped speech crosses the wire.
    alice.write_all(b"say hello bob\n").await.unwrap();
    read_until(&mut bob, "Alice says: \"hello bob\"").await;
    read_until(&mut alice, "You say: \"hello bob\"").await;

    // Look shows the other player.
    bob.write_all(b"look\n").await.unwrap();
    read_until(&mut bob, "Players here:").await;
}

#[tokio::test]
async fn quit_closes_the_connection_and_announces() {
    let (addr, _shutdown) = start_stack().await;

    let mut alice = TcpStream::connect(addr).await.unwrap();
    read_until(&mut alice, "Enter your name").await;
    alice.write_all(b"Alice\n").await.unwrap();
    read_until(&mut alice, "Welcome, Alice!").await;

    let mut bob = TcpStream::connect(addr).await.unwrap();
    read_until(&mut bob, "Enter your name").await;
    bob.write_all(b"Bob\n").await.unwrap();
    read_until(&mut bob, "Welcome, Bob!").await;
    read_until(&mut alice, "Bob has joined the game.").await;

    alice.write_all(b"quit\n").await.unwrap();
    let tail = read_until(&mut alice, "Goodbye!").await;
    assert!(tail.contains("Goodbye!"));
    read_until(&mut bob, "Alice has left the game.").await;

    // The server closes Alice's write side; subsequent reads hit EOF.
    let mut buf = [0u8; 64];
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        match tokio::time::timeout(Duration::from_millis(200), alice.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(_)) => {}
            Ok(Err(_)) => break,
            Err(_) => {
                assert!(
                    tokio::time::Instant::now() < deadline,
                    "connection never closed after quit"
                );
            }
        }
    }
}

#[tokio::test]
async fn dead_connection_tears_down_the_session() {
    let (addr, _shutdown) = start_stack().await;

    let mut alice = TcpStream::connect(addr).await.unwrap();
    read_until(&mut alice, "Enter your name").await;
    alice.write_all(b"Alice\n").await.unwrap();
    read_until(&mut alice, "Welcome, Alice!").await;

    let mut bob = TcpStream::connect(addr).await.unwrap();
    read_until(&mut bob, "Enter your name").await;
    bob.write_all(b"Bob\n").await.unwrap();
    read_until(&mut bob, "Welcome, Bob!").await;

    drop(alice);
    read_until(&mut bob, "Alice has left the game.").await;
}
