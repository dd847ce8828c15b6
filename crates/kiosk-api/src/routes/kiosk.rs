use axum::routing::{get, post};
use axum::Router;

use crate::handlers::kiosk;
use crate::state::AppState;

/// Display status routes mounted at `/kiosk`.
///
/// ```text
/// GET  /current-image  -> get_current_image
/// POST /current-image  -> set_current_image
/// ```
pub fn kiosk_router() -> Router<AppState> {
    Router::new().route(
        "/current-image",
        get(kiosk::get_current_image).post(kiosk::set_current_image),
    )
}

/// Display debug log routes mounted at `/debug`.
///
/// ```text
/// POST /log       -> post_log
/// GET  /messages  -> get_messages
/// POST /clear     -> clear_messages
/// ```
pub fn debug_router() -> Router<AppState> {
    Router::new()
        .route("/log", post(kiosk::post_log))
        .route("/messages", get(kiosk::get_messages))
        .route("/clear", post(kiosk::clear_messages))
}
