use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use kiosk_api::background::schedule_watch::{self, ScheduleWatch};
use kiosk_api::config::ServerConfig;
use kiosk_api::router::build_app_router;
use kiosk_api::state::AppState;
use kiosk_api::ws;
use kiosk_player::mpv::{MpvConfig, MpvProcess};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiosk_api=debug,kiosk_player=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        data_dir = %config.data_dir.display(),
        slots = config.layout.slot_count(),
        "Loaded server configuration",
    );

    for dir in [&config.media_dir, &config.thumbnail_dir, &config.ipc_dir()] {
        std::fs::create_dir_all(dir).unwrap_or_else(|e| panic!("Cannot create {}: {e}", dir.display()));
    }

    // --- Video player ---
    let player = Arc::new(MpvProcess::new(MpvConfig {
        binary: config.player_binary.clone(),
        ipc_dir: config.ipc_dir(),
        focus_command: config.focus_command.clone(),
    }));

    // --- App state ---
    let state = AppState::build(config.clone(), player)
        .await
        .expect("Failed to initialise application state");

    // --- Background tasks ---
    let cancel = CancellationToken::new();

    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&state.ws_manager), cancel.clone());
    let forwarder_handle = ws::start_forwarder(&state.event_bus, Arc::clone(&state.ws_manager), cancel.clone());

    let watch = ScheduleWatch::new(
        Arc::clone(&state.store),
        Arc::clone(&state.clock),
        Arc::clone(&state.event_bus),
    );
    let watch_handle = tokio::spawn(schedule_watch::run(
        watch,
        Duration::from_secs(config.schedule_poll_secs),
        cancel.clone(),
    ));
    tracing::info!("Background tasks started (heartbeat, event forwarder, schedule watcher)");

    let orchestrator = Arc::clone(&state.orchestrator);
    let ws_manager = Arc::clone(&state.ws_manager);

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(config.host.parse().expect("Invalid HOST address"), config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), watch_handle).await;
    tracing::info!("Schedule watcher stopped");

    orchestrator.shutdown().await;
    tracing::info!("Video player stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    let _ = tokio::time::timeout(Duration::from_secs(5), forwarder_handle).await;
    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
