//! Video playback state machine.
//!
//! ```text
//! Idle -> Starting -> Playing -> Stopping -> Idle
//! ```
//!
//! Every transition runs under one async mutex, so a start racing a stop
//! or a timer firing is strictly sequenced. At any instant there is at most
//! one player handle and at most one armed session timer; entering
//! `Starting` tears both down first.
//!
//! The session timer is a single task per session. It sleeps until the
//! auto-advance deadline and polls player liveness in the meantime; it is
//! cancelled through the session's [`CancellationToken`] and stamped with a
//! generation so a timer that fires after being superseded is ignored.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kiosk_core::types::ItemId;
use kiosk_events::{EventBus, EventKind};
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::PlayerError;
use crate::process::{PlayerHandle, VideoProcess};
use crate::thumbnail::{self, ThumbnailPolicy};

/// Source of the auto-advance interval and of the item shown after a
/// video ends.
#[async_trait]
pub trait Playlist: Send + Sync {
    /// Rotation interval of the current selection, in seconds.
    async fn interval_secs(&self) -> u64;

    /// Item that follows `video_id` in the current display order.
    ///
    /// Implementations reshuffle when `video_id` was the last item.
    async fn next_after(&self, video_id: &str) -> Option<ItemId>;
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Thumbnails are written as `<thumbnail_dir>/<video_id>.jpg`.
    pub thumbnail_dir: PathBuf,
    pub thumbnail: ThumbnailPolicy,
    /// How often the session timer checks that the player is still alive.
    pub liveness_poll: Duration,
}

impl OrchestratorConfig {
    pub fn new(thumbnail_dir: impl Into<PathBuf>) -> Self {
        Self {
            thumbnail_dir: thumbnail_dir.into(),
            thumbnail: ThumbnailPolicy::default(),
            liveness_poll: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    Idle,
    Starting,
    Playing,
    Stopping,
}

/// Snapshot served by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackStatus {
    pub playing: bool,
    pub video_id: Option<ItemId>,
    pub phase: PlaybackPhase,
    pub started_at: Option<DateTime<Utc>>,
    pub interval_secs: Option<u64>,
}

impl PlaybackStatus {
    fn idle() -> Self {
        Self {
            playing: false,
            video_id: None,
            phase: PlaybackPhase::Idle,
            started_at: None,
            interval_secs: None,
        }
    }
}

/// Result of ending a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopOutcome {
    pub video_id: ItemId,
    pub next_item: Option<ItemId>,
}

/// Why a session ended. Drives the log line and the choice of next item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndReason {
    Requested,
    Expired,
    Exited,
}

struct Session {
    video_id: ItemId,
    handle: Arc<dyn PlayerHandle>,
    cancel: CancellationToken,
    generation: u64,
}

#[derive(Default)]
struct Inner {
    session: Option<Session>,
    generation: u64,
}

/// Owner of the external player and the auto-advance timer.
///
/// Constructed once per process and shared as `Arc<VideoOrchestrator>`.
pub struct VideoOrchestrator {
    process: Arc<dyn VideoProcess>,
    playlist: Arc<dyn Playlist>,
    events: Arc<EventBus>,
    config: OrchestratorConfig,
    inner: Mutex<Inner>,
    status: watch::Sender<PlaybackStatus>,
}

impl VideoOrchestrator {
    pub fn new(
        process: Arc<dyn VideoProcess>,
        playlist: Arc<dyn Playlist>,
        events: Arc<EventBus>,
        config: OrchestratorConfig,
    ) -> Arc<Self> {
        let (status, _) = watch::channel(PlaybackStatus::idle());
        Arc::new(Self {
            process,
            playlist,
            events,
            config,
            inner: Mutex::new(Inner::default()),
            status,
        })
    }

    /// Current phase and video. Never waits on an in-flight transition.
    pub fn status(&self) -> PlaybackStatus {
        self.status.borrow().clone()
    }

    /// Number of armed session timers; 0 or 1.
    pub async fn pending_timers(&self) -> usize {
        let inner = self.inner.lock().await;
        inner
            .session
            .as_ref()
            .filter(|s| !s.cancel.is_cancelled())
            .map_or(0, |_| 1)
    }

    pub fn thumbnail_path(&self, video_id: &str) -> PathBuf {
        self.config.thumbnail_dir.join(format!("{video_id}.jpg"))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Start playing `video_id` from `source`, replacing any current session.
    ///
    /// On spawn failure the orchestrator is back in `Idle`, clients are told
    /// to resume the slideshow, and the error is returned; the same target
    /// is not retried.
    pub async fn start(self: &Arc<Self>, video_id: &str, source: &str) -> Result<PlaybackStatus, PlayerError> {
        let mut inner = self.inner.lock().await;

        if let Some(previous) = inner.session.take() {
            tracing::info!(previous = %previous.video_id, next = %video_id, "Replacing video session");
            self.teardown(previous).await;
        }

        self.set_status(PlaybackStatus {
            playing: false,
            video_id: Some(video_id.to_string()),
            phase: PlaybackPhase::Starting,
            started_at: None,
            interval_secs: None,
        });
        self.events.publish(EventKind::VideoLoading {
            video_id: video_id.to_string(),
        });

        let handle = match self.launch(video_id, source).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(video_id, error = %e, "Video failed to start");
                self.set_status(PlaybackStatus::idle());
                self.events.publish(EventKind::VideoStopped {
                    video_id: video_id.to_string(),
                    next_item: None,
                });
                return Err(e);
            }
        };

        if let Err(e) = handle.focus().await {
            tracing::warn!(video_id, error = %e, "Could not focus player window");
        }

        let interval_secs = self.playlist.interval_secs().await.max(1);
        inner.generation += 1;
        let generation = inner.generation;
        let cancel = CancellationToken::new();

        self.arm_timer(generation, Arc::clone(&handle), cancel.clone(), interval_secs);
        self.maybe_capture_thumbnail(video_id, Arc::clone(&handle), cancel.child_token())
            .await;

        inner.session = Some(Session {
            video_id: video_id.to_string(),
            handle,
            cancel,
            generation,
        });

        let status = PlaybackStatus {
            playing: true,
            video_id: Some(video_id.to_string()),
            phase: PlaybackPhase::Playing,
            started_at: Some(Utc::now()),
            interval_secs: Some(interval_secs),
        };
        self.set_status(status.clone());
        self.events.publish(EventKind::VideoStarted {
            video_id: video_id.to_string(),
            interval_secs,
        });
        tracing::info!(video_id, interval_secs, generation, "Video playing");

        Ok(status)
    }

    /// End the current session, if any.
    ///
    /// `jump_target` becomes the next item; otherwise the item after the
    /// video in the display order is used.
    pub async fn stop(&self, jump_target: Option<ItemId>) -> Option<StopOutcome> {
        let mut inner = self.inner.lock().await;
        let session = inner.session.take()?;
        Some(self.finish(session, EndReason::Requested, jump_target).await)
    }

    /// Stop without computing a next item or notifying clients. Used on
    /// process shutdown.
    pub async fn shutdown(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(session) = inner.session.take() {
            tracing::info!(video_id = %session.video_id, "Stopping video for shutdown");
            self.teardown(session).await;
        }
        self.set_status(PlaybackStatus::idle());
    }

    async fn launch(&self, video_id: &str, source: &str) -> Result<Arc<dyn PlayerHandle>, PlayerError> {
        let handle = self.process.spawn(video_id, source).await?;
        if let Err(e) = handle.wait_ready().await {
            let _ = handle.terminate().await;
            return Err(e);
        }
        Ok(handle)
    }

    /// Cancel the timer and kill the player. The caller has already taken
    /// the session out of `Inner`.
    async fn teardown(&self, session: Session) {
        session.cancel.cancel();
        if let Err(e) = session.handle.terminate().await {
            tracing::warn!(video_id = %session.video_id, error = %e, "Failed to terminate player");
        }
    }

    async fn finish(&self, session: Session, reason: EndReason, jump_target: Option<ItemId>) -> StopOutcome {
        let video_id = session.video_id.clone();
        self.set_status(PlaybackStatus {
            playing: false,
            video_id: Some(video_id.clone()),
            phase: PlaybackPhase::Stopping,
            started_at: None,
            interval_secs: None,
        });
        self.teardown(session).await;

        let next_item = match jump_target {
            Some(target) => Some(target),
            None => self.playlist.next_after(&video_id).await,
        };

        match reason {
            EndReason::Requested => tracing::info!(%video_id, next = ?next_item, "Video stopped"),
            EndReason::Expired => tracing::info!(%video_id, next = ?next_item, "Video interval elapsed"),
            EndReason::Exited => tracing::warn!(%video_id, next = ?next_item, "Player exited on its own"),
        }

        self.set_status(PlaybackStatus::idle());
        self.events.publish(EventKind::VideoStopped {
            video_id: video_id.clone(),
            next_item: next_item.clone(),
        });

        StopOutcome { video_id, next_item }
    }

    /// Called from the session timer. Ignored unless `generation` still
    /// owns the session.
    async fn on_timer(&self, generation: u64, reason: EndReason) {
        let mut inner = self.inner.lock().await;
        let current = inner.session.as_ref().map(|s| s.generation);
        if current != Some(generation) {
            tracing::debug!(generation, ?current, "Ignoring stale session timer");
            return;
        }
        if let Some(session) = inner.session.take() {
            self.finish(session, reason, None).await;
        }
    }

    fn arm_timer(
        self: &Arc<Self>,
        generation: u64,
        handle: Arc<dyn PlayerHandle>,
        cancel: CancellationToken,
        interval_secs: u64,
    ) {
        let orchestrator = Arc::clone(self);
        let poll = self.config.liveness_poll;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(interval_secs);

        tokio::spawn(async move {
            let mut liveness = tokio::time::interval_at(tokio::time::Instant::now() + poll, poll);
            let reason = loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep_until(deadline) => break EndReason::Expired,
                    _ = liveness.tick() => {
                        if !handle.is_alive().await {
                            break EndReason::Exited;
                        }
                    }
                }
            };
            orchestrator.on_timer(generation, reason).await;
        });
    }

    async fn maybe_capture_thumbnail(&self, video_id: &str, handle: Arc<dyn PlayerHandle>, cancel: CancellationToken) {
        let dest = self.thumbnail_path(video_id);
        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            return;
        }
        if let Err(e) = tokio::fs::create_dir_all(&self.config.thumbnail_dir).await {
            tracing::warn!(error = %e, "Cannot create thumbnail directory");
            return;
        }

        let policy = self.config.thumbnail.clone();
        let events = Arc::clone(&self.events);
        let video_id = video_id.to_string();

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(%video_id, "Thumbnail capture cancelled");
                    let _ = tokio::fs::remove_file(thumbnail::staging_path(&dest)).await;
                    return;
                }
                result = thumbnail::capture(handle.as_ref(), &dest, &policy) => result,
            };
            match result {
                Ok(capture) => {
                    tracing::info!(
                        %video_id,
                        attempts = capture.attempts,
                        luminance = capture.luminance,
                        "Thumbnail captured"
                    );
                    events.publish(EventKind::ThumbnailReady {
                        video_id,
                        path: capture.path.to_string_lossy().into_owned(),
                    });
                }
                Err(e) => {
                    tracing::warn!(%video_id, error = %e, "Thumbnail capture abandoned");
                    let _ = tokio::fs::remove_file(thumbnail::staging_path(&dest)).await;
                }
            }
        });
    }

    fn set_status(&self, status: PlaybackStatus) {
        self.status.send_replace(status);
    }
}
