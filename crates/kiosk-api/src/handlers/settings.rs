use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.store.snapshot().await,
    }))
}

/// POST /api/settings
///
/// Accepts any subset of the document's top-level keys.
pub async fn save_settings(
    State(state): State<AppState>,
    Json(patch): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse> {
    let settings = state.store.merge(patch).await?;
    tracing::info!("Settings saved");
    Ok(Json(DataResponse { data: settings }))
}
