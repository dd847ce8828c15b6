use std::collections::BTreeSet;
use std::sync::Arc;

use kiosk_events::EventBus;
use kiosk_player::{OrchestratorConfig, VideoOrchestrator, VideoProcess};

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::control::CommandChannel;
use crate::error::AppResult;
use crate::kiosk::KioskStatus;
use crate::library::MediaLibrary;
use crate::playlist::SettingsPlaylist;
use crate::store::SettingsStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub clock: Arc<Clock>,
    pub store: Arc<SettingsStore>,
    pub library: Arc<MediaLibrary>,
    pub playlist: Arc<SettingsPlaylist>,
    pub commands: Arc<CommandChannel>,
    pub orchestrator: Arc<VideoOrchestrator>,
    pub kiosk: Arc<KioskStatus>,
    /// WebSocket connection manager (display and controller clients).
    pub ws_manager: Arc<WsManager>,
    /// Centralized event bus for push events.
    pub event_bus: Arc<EventBus>,
}

impl AppState {
    /// Open the settings document and wire every service together.
    ///
    /// `process` is the video player backend; the binary passes the real
    /// one, tests pass a fake.
    pub async fn build(config: ServerConfig, process: Arc<dyn VideoProcess>) -> AppResult<Self> {
        let clock = Arc::new(Clock::system());
        let event_bus = Arc::new(EventBus::default());

        let store = Arc::new(
            SettingsStore::open(
                config.settings_file.clone(),
                config.layout,
                Arc::clone(&clock),
                Arc::clone(&event_bus),
            )
            .await?,
        );
        tracing::info!(path = %store.path().display(), "Settings loaded");

        let library = Arc::new(MediaLibrary::new(config.media_dir.clone()));
        prune_missing_items(&store, &library).await?;

        let playlist = Arc::new(SettingsPlaylist::new(
            Arc::clone(&store),
            Arc::clone(&library),
            Arc::clone(&clock),
        ));
        let orchestrator = VideoOrchestrator::new(
            process,
            Arc::clone(&playlist) as Arc<dyn kiosk_player::Playlist>,
            Arc::clone(&event_bus),
            OrchestratorConfig::new(config.thumbnail_dir.clone()),
        );
        let commands = Arc::new(CommandChannel::new(
            config.command_ttl_secs,
            Arc::clone(&event_bus),
        ));

        Ok(Self {
            config: Arc::new(config),
            clock,
            store,
            library,
            playlist,
            commands,
            orchestrator,
            kiosk: Arc::new(KioskStatus::new()),
            ws_manager: Arc::new(WsManager::new()),
            event_bus,
        })
    }
}

/// Forget per-item settings for images deleted while the server was down.
async fn prune_missing_items(store: &SettingsStore, library: &MediaLibrary) -> AppResult<()> {
    let images: BTreeSet<_> = library.image_ids().await?.into_iter().collect();
    let stale = store
        .read(|s| s.clone().retain_items(&images))
        .await;
    if stale > 0 {
        store.update(|s| Ok(s.retain_items(&images))).await?;
        tracing::info!(stale, "Dropped settings of missing items");
    }
    Ok(())
}
