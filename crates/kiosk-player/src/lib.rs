//! External video player management.
//!
//! - [`process`]: the [`VideoProcess`] / [`PlayerHandle`] capability the
//!   orchestrator drives.
//! - [`mpv`]: the production implementation backed by an `mpv` child
//!   process and its JSON IPC socket.
//! - [`thumbnail`]: still-frame capture with a darkness retry.
//! - [`orchestrator`]: the playback state machine, auto-advance timer and
//!   the single-session guarantee.

pub mod error;
#[cfg(unix)]
pub mod mpv;
pub mod orchestrator;
pub mod process;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod thumbnail;

pub use error::PlayerError;
pub use orchestrator::{
    OrchestratorConfig, PlaybackPhase, PlaybackStatus, Playlist, StopOutcome, VideoOrchestrator,
};
pub use process::{PlayerHandle, VideoProcess};
pub use thumbnail::ThumbnailPolicy;
