//! Video player capability.
//!
//! The orchestrator never touches a child process directly. It asks a
//! [`VideoProcess`] for a [`PlayerHandle`] and drives the handle; tests swap
//! in `testing::FakeVideoProcess`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PlayerError;

/// Launches player instances.
#[async_trait]
pub trait VideoProcess: Send + Sync {
    /// Start a player bound to `source` (URL or file path).
    ///
    /// Returns once the process exists; [`PlayerHandle::wait_ready`]
    /// confirms it is actually running.
    async fn spawn(&self, video_id: &str, source: &str) -> Result<Arc<dyn PlayerHandle>, PlayerError>;
}

/// One running player instance.
///
/// All methods take `&self` so a thumbnail capture can share the handle
/// with the session that owns it.
#[async_trait]
pub trait PlayerHandle: Send + Sync {
    /// Resolve once the player is producing output, or fail if it exited.
    async fn wait_ready(&self) -> Result<(), PlayerError>;

    /// Bring the player's window to the foreground.
    async fn focus(&self) -> Result<(), PlayerError>;

    /// Write the current frame to `dest`.
    async fn screenshot(&self, dest: &Path) -> Result<(), PlayerError>;

    async fn is_alive(&self) -> bool;

    /// Stop the player. Idempotent.
    async fn terminate(&self) -> Result<(), PlayerError>;
}
