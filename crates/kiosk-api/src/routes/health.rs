use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;
use crate::ws::ClientRole;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether a video is on screen.
    pub playing: bool,
    pub ws_connections: usize,
    pub display_clients: usize,
}

/// GET /health -- liveness plus a glance at the display side.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        playing: state.orchestrator.status().playing,
        ws_connections: state.ws_manager.connection_count().await,
        display_clients: state.ws_manager.count_by_role(ClientRole::Display).await,
    })
}

/// Mount health check routes (root level, not under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
