//! Handlers for atmospheres (named groups of themes).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kiosk_core::settings::Atmosphere;
use kiosk_core::types::{AtmosphereId, ThemeId};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::themes::SetInterval;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AtmosphereList {
    pub atmospheres: Vec<Atmosphere>,
    pub active_atmosphere: Option<AtmosphereId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAtmosphere {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetAtmosphereThemes {
    #[validate(length(max = 100))]
    pub themes: Vec<ThemeId>,
}

/// `null` clears the active atmosphere.
#[derive(Debug, Deserialize)]
pub struct SetActiveAtmosphere {
    pub atmosphere: Option<AtmosphereId>,
}

#[derive(Debug, Serialize)]
pub struct ActiveAtmosphere {
    pub active_atmosphere: Option<AtmosphereId>,
    pub interval: u64,
    pub shuffle_seed: f64,
}

/// GET /api/atmospheres
pub async fn list_atmospheres(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let list = state
        .store
        .read(|s| AtmosphereList {
            atmospheres: s.atmospheres.values().cloned().collect(),
            active_atmosphere: s.active_atmosphere.clone(),
        })
        .await;
    Ok(Json(DataResponse { data: list }))
}

/// POST /api/atmospheres
pub async fn create_atmosphere(
    State(state): State<AppState>,
    Json(input): Json<CreateAtmosphere>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let now = state.clock.unix_secs();

    let atmosphere = state
        .store
        .update(|s| s.create_atmosphere(&input.name, now).cloned())
        .await?;
    tracing::info!(atmosphere = %atmosphere.name, "Atmosphere created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: atmosphere })))
}

/// DELETE /api/atmospheres/{name}
///
/// Also removes the atmosphere from every day slot.
pub async fn delete_atmosphere(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let was_active = state
        .store
        .update(|s| {
            let was_active = s.active_atmosphere.as_deref() == Some(name.as_str());
            s.delete_atmosphere(&name)?;
            Ok(was_active)
        })
        .await?;
    if was_active {
        state.orchestrator.stop(None).await;
    }

    tracing::info!(atmosphere = %name, was_active, "Atmosphere deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/atmospheres/{name}/interval
pub async fn set_atmosphere_interval(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<SetInterval>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let atmosphere = state
        .store
        .update(|s| s.set_atmosphere_interval(&name, input.interval).cloned())
        .await?;
    Ok(Json(DataResponse { data: atmosphere }))
}

/// POST /api/atmospheres/{name}/themes
pub async fn set_atmosphere_themes(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<SetAtmosphereThemes>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let atmosphere = state
        .store
        .update(|s| s.set_atmosphere_themes(&name, input.themes).cloned())
        .await?;
    Ok(Json(DataResponse { data: atmosphere }))
}

/// POST /api/atmospheres/active
pub async fn set_active_atmosphere(
    State(state): State<AppState>,
    Json(input): Json<SetActiveAtmosphere>,
) -> AppResult<impl IntoResponse> {
    let (interval, shuffle_seed) = state
        .store
        .update(|s| {
            let interval = s.set_active_atmosphere(input.atmosphere.as_deref())?;
            Ok((interval, s.shuffle_seed))
        })
        .await?;
    state.orchestrator.stop(None).await;

    tracing::info!(atmosphere = ?input.atmosphere, interval, "Active atmosphere changed");
    Ok(Json(DataResponse {
        data: ActiveAtmosphere {
            active_atmosphere: input.atmosphere,
            interval,
            shuffle_seed,
        },
    }))
}
