use axum::routing::{get, post};
use axum::Router;

use crate::handlers::control;
use crate::state::AppState;

/// Remote-control routes mounted at `/control`.
///
/// ```text
/// POST /send  -> send_command
/// GET  /poll  -> poll_command
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send", post(control::send_command))
        .route("/poll", get(control::poll_command))
}
