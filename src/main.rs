mod config;
mod shutdown;

use std::time::Duration;

use engine::Coordinator;
use net::channels::{NetToGame, OutputTx, PlayerRx};
use persistence::manager::SnapshotManager;
use persistence::snapshot;

use crate::config::{parse_cli_args, ServerConfig};
use crate::shutdown::ShutdownRx;

#[tokio::main]
async fn main() {
    observability::init_logging();

    let config = parse_cli_args();
    tracing::info!("adventure server starting");

    let (shutdown_tx, shutdown_rx) = shutdown::shutdown_channel();

    let config_clone = config.clone();
    let server_future = async move {
        run_server(config_clone, shutdown_rx).await;
    };

    tokio::select! {
        _ = shutdown::wait_for_signal() => {
            tracing::info!("shutdown signal received, stopping server");
            shutdown_tx.trigger();
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        _ = server_future => {}
    }

    tracing::info!("server stopped");
}

async fn run_server(config: ServerConfig, shutdown_rx: ShutdownRx) {
    // Channels between the async network side and the game thread.
    let (player_tx, player_rx) = tokio::sync::mpsc::unbounded_channel();
    let (output_tx, output_rx) = tokio::sync::mpsc::unbounded_channel();
    let (register_tx, register_rx) = tokio::sync::mpsc::unbounded_channel();
    let (unregister_tx, unregister_rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(net::output_router::run_output_router(
        output_rx,
        register_rx,
        unregister_rx,
    ));

    let listen_addr = config.net.listen_addr.clone();
    let tcp_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = net::server::run_tcp_server(
            listen_addr,
            player_tx,
            register_tx,
            unregister_tx,
            tcp_shutdown.into_inner(),
        )
        .await
        {
            tracing::error!(error = %e, "TCP server error");
        }
    });

    tracing::info!(addr = %config.net.listen_addr, "server listening");

    // The game thread owns the world exclusively; it blocks on the input
    // channel, so it must not share the async runtime's workers.
    let game_shutdown = shutdown_rx;
    let game_handle = std::thread::spawn(move || {
        run_game_thread(player_rx, output_tx, config, game_shutdown);
    });

    let _ = tokio::task::spawn_blocking(move || game_handle.join()).await;
}

fn run_game_thread(
    mut player_rx: PlayerRx,
    output_tx: OutputTx,
    config: ServerConfig,
    shutdown_rx: ShutdownRx,
) {
    // Malformed world content refuses to boot; nothing should get as far as
    // a connection against a half-loaded world.
    let world = match world::load_dir(&config.content.dir) {
        Ok(world) => world,
        Err(e) => {
            tracing::error!(error = %e, dir = %config.content.dir, "failed to load world content");
            std::process::exit(1);
        }
    };

    let mut coordinator = Coordinator::new(world, config.to_game_config());

    if config.persistence.enabled {
        let manager = SnapshotManager::new(&config.persistence.save_dir);
        if manager.has_latest() {
            match manager
                .load_latest()
                .and_then(|snap| snapshot::restore(snap, coordinator.world_mut()))
            {
                Ok(restored) => coordinator.adopt_restored(restored.players, restored.turn),
                Err(e) => tracing::error!(error = %e, "snapshot restore failed, starting fresh"),
            }
        }
        coordinator = coordinator.with_snapshots(manager);
    }

    while let Some(event) = player_rx.blocking_recv() {
        let outputs = match event {
            NetToGame::NewConnection { session_id } => coordinator.connect(session_id),
            NetToGame::PlayerInput { session_id, line } => coordinator.line(session_id, &line),
            NetToGame::Disconnected { session_id } => coordinator.disconnect(session_id),
        };
        for output in outputs {
            let _ = output_tx.send(output);
        }
        if shutdown_rx.is_shutdown() {
            break;
        }
    }

    // Final best-effort snapshot on the way out.
    if let Some(Err(e)) = coordinator.save_snapshot() {
        tracing::error!(error = %e, "final snapshot failed");
    }
    tracing::info!(turn = coordinator.turn(), "game thread stopped");
}
