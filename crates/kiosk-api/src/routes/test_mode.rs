use axum::routing::{get, post};
use axum::Router;

use crate::handlers::test_mode;
use crate::state::AppState;

/// Clock test-mode routes mounted at `/test`.
///
/// ```text
/// GET  /status   -> test_status
/// POST /enable   -> enable_test_mode
/// POST /disable  -> disable_test_mode
/// POST /time     -> set_mock_time
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(test_mode::test_status))
        .route("/enable", post(test_mode::enable_test_mode))
        .route("/disable", post(test_mode::disable_test_mode))
        .route("/time", post(test_mode::set_mock_time))
}
