use axum::routing::{get, post};
use axum::Router;

use crate::handlers::day;
use crate::state::AppState;

/// Day schedule routes mounted at `/day`.
///
/// ```text
/// GET  /status               -> day_status
/// POST /enable               -> enable_day_scheduling
/// POST /disable              -> disable_day_scheduling
/// POST /time-periods/{slot}  -> set_time_period
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(day::day_status))
        .route("/enable", post(day::enable_day_scheduling))
        .route("/disable", post(day::disable_day_scheduling))
        .route("/time-periods/{slot}", post(day::set_time_period))
}
