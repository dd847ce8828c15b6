/// Failures of the external player and of thumbnail capture.
///
/// None of these reach display clients; the orchestrator logs them and
/// falls back to the slideshow.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Failed to start player: {0}")]
    Spawn(String),

    #[error("Player is not running")]
    NotRunning,

    #[error("Player IPC error: {0}")]
    Ipc(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
