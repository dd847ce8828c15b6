//! Handlers for what the display reports: the current item and debug log.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::kiosk::LogLevel;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SetCurrentImage {
    #[validate(length(min = 1, max = 255))]
    pub image_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogMessage {
    #[serde(default)]
    pub level: LogLevel,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

/// GET /api/kiosk/current-image
pub async fn get_current_image(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.kiosk.current_item(),
    })
}

/// POST /api/kiosk/current-image
pub async fn set_current_image(
    State(state): State<AppState>,
    Json(input): Json<SetCurrentImage>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let current = state.kiosk.set_current_item(input.image_name, state.clock.now());
    Ok(Json(DataResponse { data: current }))
}

/// POST /api/debug/log
pub async fn post_log(State(state): State<AppState>, Json(input): Json<LogMessage>) -> AppResult<impl IntoResponse> {
    input.validate()?;
    state.kiosk.log(input.level, input.message, state.clock.now());
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/debug/messages
pub async fn get_messages(State(state): State<AppState>) -> impl IntoResponse {
    Json(DataResponse {
        data: state.kiosk.messages(),
    })
}

/// POST /api/debug/clear
pub async fn clear_messages(State(state): State<AppState>) -> impl IntoResponse {
    state.kiosk.clear_log();
    StatusCode::NO_CONTENT
}
