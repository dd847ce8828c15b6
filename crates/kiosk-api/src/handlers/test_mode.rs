//! Handlers for pinning the clock, so the day schedule can be checked
//! without waiting for the real time of day.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::TestMode;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetMockTime {
    /// UNIX seconds.
    pub timestamp: f64,
}

#[derive(Debug, Serialize)]
pub struct TestModeStatus {
    pub test_mode: TestMode,
    pub now: DateTime<Utc>,
    pub local_time: NaiveTime,
    pub current_time_period: u32,
}

/// GET /api/test/status
pub async fn test_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse { data: status(&state) })
}

/// POST /api/test/enable
pub async fn enable_test_mode(State(state): State<AppState>) -> impl IntoResponse {
    state.clock.enable_test_mode();
    tracing::info!("Test mode enabled");
    Json(DataResponse { data: status(&state) })
}

/// POST /api/test/disable
pub async fn disable_test_mode(State(state): State<AppState>) -> impl IntoResponse {
    state.clock.disable_test_mode();
    tracing::info!("Test mode disabled");
    Json(DataResponse { data: status(&state) })
}

/// POST /api/test/time
///
/// Pins the clock and enables test mode.
pub async fn set_mock_time(
    State(state): State<AppState>,
    Json(input): Json<SetMockTime>,
) -> AppResult<impl IntoResponse> {
    let at = state.clock.set_mock_time(input.timestamp)?;
    tracing::info!(%at, "Mock time set");
    Ok(Json(DataResponse { data: status(&state) }))
}

fn status(state: &AppState) -> TestModeStatus {
    let local_time = state.clock.local_time();
    TestModeStatus {
        test_mode: state.clock.test_mode(),
        now: state.clock.now(),
        local_time,
        current_time_period: state.store.layout().slot_at(local_time),
    }
}
