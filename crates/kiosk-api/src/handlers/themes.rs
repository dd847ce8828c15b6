//! Handlers for themes.
//!
//! Switching the active theme reshuffles the display order and ends any
//! playing video so the new selection takes over immediately.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kiosk_core::catalog::is_protected_theme;
use kiosk_core::settings::Theme;
use kiosk_core::types::{ThemeId, ALL_IMAGES_THEME};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ThemeView {
    #[serde(flatten)]
    pub theme: Theme,
    pub item_count: usize,
    pub protected: bool,
}

#[derive(Debug, Serialize)]
pub struct ThemeList {
    pub themes: Vec<ThemeView>,
    pub active_theme: Option<ThemeId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTheme {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetInterval {
    /// Seconds, at most a week.
    #[validate(range(min = 1, max = 604_800))]
    pub interval: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveTheme {
    pub theme: ThemeId,
}

#[derive(Debug, Serialize)]
pub struct ActiveTheme {
    pub active_theme: ThemeId,
    pub interval: u64,
    pub shuffle_seed: f64,
}

/// GET /api/themes
pub async fn list_themes(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let current = state.playlist.current().await?;

    let themes = current
        .settings
        .themes
        .values()
        .map(|theme| {
            let item_count = if theme.name == ALL_IMAGES_THEME {
                current.items.len()
            } else {
                current.items.iter().filter(|i| i.themes.contains(&theme.name)).count()
            };
            ThemeView {
                theme: theme.clone(),
                item_count,
                protected: is_protected_theme(&theme.name),
            }
        })
        .collect();

    Ok(Json(DataResponse {
        data: ThemeList {
            themes,
            active_theme: current.settings.active_theme.clone(),
        },
    }))
}

/// POST /api/themes
pub async fn create_theme(
    State(state): State<AppState>,
    Json(input): Json<CreateTheme>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let now = state.clock.unix_secs();

    let theme = state
        .store
        .update(|s| s.create_theme(&input.name, now).cloned())
        .await?;
    tracing::info!(theme = %theme.name, "Theme created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: theme })))
}

/// DELETE /api/themes/{name}
pub async fn delete_theme(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<impl IntoResponse> {
    let was_active = state
        .store
        .update(|s| {
            let was_active = s.active_theme.as_deref() == Some(name.as_str());
            s.delete_theme(&name)?;
            Ok(was_active)
        })
        .await?;
    if was_active {
        state.orchestrator.stop(None).await;
    }

    tracing::info!(theme = %name, was_active, "Theme deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/themes/{name}/interval
pub async fn set_theme_interval(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(input): Json<SetInterval>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let theme = state
        .store
        .update(|s| s.set_theme_interval(&name, input.interval).cloned())
        .await?;
    Ok(Json(DataResponse { data: theme }))
}

/// POST /api/themes/active
pub async fn set_active_theme(
    State(state): State<AppState>,
    Json(input): Json<SetActiveTheme>,
) -> AppResult<impl IntoResponse> {
    let (interval, shuffle_seed) = state
        .store
        .update(|s| {
            let interval = s.set_active_theme(&input.theme)?;
            Ok((interval, s.shuffle_seed))
        })
        .await?;
    state.orchestrator.stop(None).await;

    tracing::info!(theme = %input.theme, interval, "Active theme changed");
    Ok(Json(DataResponse {
        data: ActiveTheme {
            active_theme: input.theme,
            interval,
            shuffle_seed,
        },
    }))
}
