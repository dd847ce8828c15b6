//! Handlers for the item catalog.
//!
//! `GET /api/items` is part of the display protocol and returns a bare
//! list. The mutating endpoints answer with the `{ "data": ... }` envelope.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use kiosk_core::command::Command;
use kiosk_core::error::CoreError;
use kiosk_core::types::{CropRect, ItemId, MediaItem, MediaKind, ThemeId};
use kiosk_events::EventKind;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::library::item_url;
use crate::query::EnabledOnlyParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// One entry of the item listing.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub id: ItemId,
    pub kind: MediaKind,
    pub url: String,
    pub enabled: bool,
    pub themes: Vec<ThemeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRect>,
}

impl From<&MediaItem> for ItemView {
    fn from(item: &MediaItem) -> Self {
        Self {
            id: item.id.clone(),
            kind: item.kind,
            url: item_url(item),
            enabled: item.enabled,
            themes: item.themes.iter().cloned().collect(),
            crop: item.crop,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetItemThemes {
    #[validate(length(max = 100))]
    pub themes: Vec<ThemeId>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetCrop {
    #[validate(range(min = 0.0, max = 1.0))]
    pub x: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub y: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub width: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub height: f64,
}

#[derive(Debug, Serialize)]
pub struct ItemState {
    pub id: ItemId,
    pub enabled: bool,
    pub themes: Vec<ThemeId>,
    pub crop: Option<CropRect>,
}

/// GET /api/items?enabled_only=
///
/// With `enabled_only=true`: the eligible items in display order. Without:
/// every item, sorted by id.
pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<EnabledOnlyParams>,
) -> AppResult<impl IntoResponse> {
    let current = state.playlist.current().await?;

    let views: Vec<ItemView> = if params.enabled_only {
        let by_id: HashMap<&str, &MediaItem> = current.items.iter().map(|i| (i.id.as_str(), i)).collect();
        current
            .order
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .map(ItemView::from)
            .collect()
    } else {
        current.items.iter().map(ItemView::from).collect()
    };

    Ok(Json(views))
}

/// POST /api/items/{id}/toggle
pub async fn toggle_item(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    require_item(&state, &id).await?;

    let item = state
        .store
        .update(|s| {
            let enabled = !s.is_enabled(&id);
            s.set_item_enabled(&id, enabled);
            Ok(item_state(s, &id))
        })
        .await?;
    state.event_bus.publish(EventKind::ItemListChanged);

    tracing::info!(id = %id, enabled = item.enabled, "Item toggled");
    Ok(Json(DataResponse { data: item }))
}

/// POST /api/items/{id}/themes
///
/// Replaces the item's theme set. Every theme must exist.
pub async fn set_item_themes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SetItemThemes>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    require_item(&state, &id).await?;

    let item = state
        .store
        .update(|s| {
            if let Some(unknown) = input.themes.iter().find(|t| !s.themes.contains_key(*t)) {
                return Err(CoreError::not_found("Theme", unknown.clone()));
            }
            s.set_item_themes(&id, input.themes);
            Ok(item_state(s, &id))
        })
        .await?;
    state.event_bus.publish(EventKind::ItemListChanged);

    Ok(Json(DataResponse { data: item }))
}

/// POST /api/items/{id}/crop
pub async fn set_item_crop(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<SetCrop>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    let crop = CropRect {
        x: input.x,
        y: input.y,
        width: input.width,
        height: input.height,
    };
    apply_crop(&state, id, Some(crop)).await
}

/// DELETE /api/items/{id}/crop
pub async fn clear_item_crop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    apply_crop(&state, id, None).await
}

/// DELETE /api/items/{id}
///
/// Removes the file (images) or the registration (videos) and every
/// per-item setting. Deleting the item on screen reshuffles so the
/// slideshow does not restart on it.
pub async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<impl IntoResponse> {
    let is_video = state.store.read(|s| s.videos.contains_key(&id)).await;

    if is_video {
        if state.orchestrator.status().video_id.as_deref() == Some(id.as_str()) {
            state.orchestrator.stop(None).await;
        }
        remove_thumbnail(&state, &id).await;
    } else if !state.library.remove_image(&id).await? {
        return Err(CoreError::not_found("Item", id).into());
    }

    state
        .store
        .update(|s| {
            s.remove_item(&id);
            Ok(())
        })
        .await?;

    if state.kiosk.is_current(&id) {
        state.playlist.reshuffle_avoiding(Some(&id)).await?;
    }
    state.event_bus.publish(EventKind::ItemListChanged);

    tracing::info!(id = %id, is_video, "Item deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn apply_crop(state: &AppState, id: String, crop: Option<CropRect>) -> AppResult<Json<DataResponse<ItemState>>> {
    require_item(state, &id).await?;

    let item = state
        .store
        .update(|s| {
            s.set_item_crop(&id, crop)?;
            Ok(item_state(s, &id))
        })
        .await?;
    state.commands.broadcast(Command::RefreshCrop { target: id });

    Ok(Json(DataResponse { data: item }))
}

/// 404 unless `id` is a listed image or a registered video.
pub(crate) async fn require_item(state: &AppState, id: &str) -> AppResult<()> {
    let registered = state.store.read(|s| s.videos.contains_key(id)).await;
    if registered || state.library.has_image(id).await {
        Ok(())
    } else {
        Err(CoreError::not_found("Item", id).into())
    }
}

pub(crate) async fn remove_thumbnail(state: &AppState, video_id: &str) {
    let path = state.orchestrator.thumbnail_path(video_id);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(video_id, error = %e, "Could not remove thumbnail");
        }
    }
}

fn item_state(settings: &kiosk_core::settings::Settings, id: &str) -> ItemState {
    ItemState {
        id: id.to_string(),
        enabled: settings.is_enabled(id),
        themes: settings.themes_of(id).into_iter().collect(),
        crop: settings.item_crops.get(id).copied(),
    }
}
