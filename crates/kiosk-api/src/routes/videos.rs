use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::videos;
use crate::state::AppState;

/// Video routes mounted at `/videos`.
///
/// ```text
/// GET    /        -> list_videos
/// POST   /        -> register_video
/// POST   /play    -> play_video
/// POST   /stop    -> stop_video
/// GET    /status  -> video_status
/// DELETE /{id}    -> delete_video
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(videos::list_videos).post(videos::register_video))
        .route("/play", post(videos::play_video))
        .route("/stop", post(videos::stop_video))
        .route("/status", get(videos::video_status))
        .route("/{id}", delete(videos::delete_video))
}
