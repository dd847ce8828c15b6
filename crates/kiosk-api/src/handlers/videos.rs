//! Handlers for registered videos and the player.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kiosk_core::error::CoreError;
use kiosk_core::types::{ItemId, ThemeId};
use kiosk_events::EventKind;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::items::remove_thumbnail;
use crate::response::DataResponse;
use crate::state::AppState;

/// URL prefix thumbnails are served under.
pub const THUMBNAIL_URL_PREFIX: &str = "/thumbnails";

#[derive(Debug, Serialize)]
pub struct VideoView {
    pub id: ItemId,
    pub url: String,
    pub title: Option<String>,
    pub added: f64,
    pub enabled: bool,
    pub themes: Vec<ThemeId>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterVideo {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    #[validate(length(max = 200))]
    pub title: Option<String>,
}

/// Either a registered id or a URL, which is registered on the fly.
#[derive(Debug, Deserialize)]
pub struct PlayVideo {
    pub video_id: Option<ItemId>,
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StopVideo {
    #[serde(default)]
    pub jump_target: Option<ItemId>,
}

#[derive(Debug, Serialize)]
pub struct StopResult {
    pub stopped: bool,
    pub video_id: Option<ItemId>,
    pub next_item: Option<ItemId>,
}

/// GET /api/videos
pub async fn list_videos(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let settings = state.store.snapshot().await;
    let mut videos = Vec::with_capacity(settings.videos.len());
    for (id, entry) in &settings.videos {
        videos.push(VideoView {
            id: id.clone(),
            url: entry.url.clone(),
            title: entry.title.clone(),
            added: entry.added,
            enabled: settings.is_enabled(id),
            themes: settings.themes_of(id).into_iter().collect(),
            thumbnail_url: thumbnail_url(&state, id).await,
        });
    }
    Ok(Json(DataResponse { data: videos }))
}

/// POST /api/videos
///
/// Registering the same URL twice returns the existing id.
pub async fn register_video(
    State(state): State<AppState>,
    Json(input): Json<RegisterVideo>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let now = state.clock.unix_secs();

    let id = state
        .store
        .update(|s| s.register_video(&input.url, input.title, now))
        .await?;
    state.event_bus.publish(EventKind::ItemListChanged);
    tracing::info!(video_id = %id, url = %input.url, "Video registered");

    let view = video_view(&state, &id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// DELETE /api/videos/{id}
pub async fn delete_video(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let registered = state.store.read(|s| s.videos.contains_key(&id)).await;
    if !registered {
        return Err(CoreError::not_found("Video", id).into());
    }

    if state.orchestrator.status().video_id.as_deref() == Some(id.as_str()) {
        state.orchestrator.stop(None).await;
    }
    state
        .store
        .update(|s| {
            s.remove_item(&id);
            Ok(())
        })
        .await?;
    remove_thumbnail(&state, &id).await;
    state.event_bus.publish(EventKind::ItemListChanged);

    tracing::info!(video_id = %id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/videos/play
///
/// Replaces whatever is playing. Player failures surface as 503.
pub async fn play_video(
    State(state): State<AppState>,
    Json(input): Json<PlayVideo>,
) -> AppResult<impl IntoResponse> {
    let (video_id, source) = match (input.video_id, input.url) {
        (Some(id), _) => {
            let source = state
                .store
                .read(|s| s.videos.get(&id).map(|v| v.url.clone()))
                .await
                .ok_or_else(|| CoreError::not_found("Video", id.clone()))?;
            (id, source)
        }
        (None, Some(url)) => {
            let now = state.clock.unix_secs();
            let id = state.store.update(|s| s.register_video(&url, None, now)).await?;
            let source = state
                .store
                .read(|s| s.videos.get(&id).map(|v| v.url.clone()))
                .await
                .unwrap_or(url);
            (id, source)
        }
        (None, None) => return Err(AppError::BadRequest("Either video_id or url is required".into())),
    };

    let status = state.orchestrator.start(&video_id, &source).await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/videos/stop
pub async fn stop_video(
    State(state): State<AppState>,
    Json(input): Json<StopVideo>,
) -> AppResult<impl IntoResponse> {
    let outcome = state.orchestrator.stop(input.jump_target).await;
    let result = match outcome {
        Some(outcome) => StopResult {
            stopped: true,
            video_id: Some(outcome.video_id),
            next_item: outcome.next_item,
        },
        None => StopResult {
            stopped: false,
            video_id: None,
            next_item: None,
        },
    };
    Ok(Json(DataResponse { data: result }))
}

/// GET /api/videos/status
///
/// Display protocol: bare `{playing, video_id, ...}`.
pub async fn video_status(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.status())
}

async fn video_view(state: &AppState, id: &str) -> AppResult<VideoView> {
    let view = state
        .store
        .read(|s| {
            s.videos.get(id).map(|entry| VideoView {
                id: id.to_string(),
                url: entry.url.clone(),
                title: entry.title.clone(),
                added: entry.added,
                enabled: s.is_enabled(id),
                themes: s.themes_of(id).into_iter().collect(),
                thumbnail_url: None,
            })
        })
        .await
        .ok_or_else(|| CoreError::not_found("Video", id))?;
    Ok(VideoView {
        thumbnail_url: thumbnail_url(state, id).await,
        ..view
    })
}

async fn thumbnail_url(state: &AppState, id: &str) -> Option<String> {
    let path = state.orchestrator.thumbnail_path(id);
    tokio::fs::try_exists(&path)
        .await
        .unwrap_or(false)
        .then(|| format!("{THUMBNAIL_URL_PREFIX}/{id}.jpg"))
}
