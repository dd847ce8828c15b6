//! Media files on disk.
//!
//! Images are whatever files with an image extension sit directly in the
//! media directory; their file name is their item id. Videos live only in
//! the settings document.

use std::path::{Path, PathBuf};

use kiosk_core::error::CoreError;
use kiosk_core::settings::Settings;
use kiosk_core::types::{has_image_extension, is_safe_item_id, MediaItem, MediaKind};

use crate::error::{AppError, AppResult};

/// URL prefix the image files are served under.
pub const IMAGE_URL_PREFIX: &str = "/images";

pub struct MediaLibrary {
    media_dir: PathBuf,
}

impl MediaLibrary {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            media_dir: media_dir.into(),
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Image ids in the media directory, sorted.
    ///
    /// A missing directory is an empty library.
    pub async fn image_ids(&self) -> AppResult<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.media_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_file && has_image_extension(&name) && is_safe_item_id(&name) {
                ids.push(name);
            }
        }
        ids.sort();
        Ok(ids)
    }

    pub async fn has_image(&self, id: &str) -> bool {
        match self.image_path(id) {
            Ok(path) => tokio::fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Delete an image file. Returns `false` when it was not there.
    pub async fn remove_image(&self, id: &str) -> AppResult<bool> {
        let path = self.image_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(id, "Image deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(e)),
        }
    }

    /// Every image and video, with its per-item settings applied.
    pub async fn items(&self, settings: &Settings) -> AppResult<Vec<MediaItem>> {
        let image_ids = self.image_ids().await?;
        Ok(self.assemble(&image_ids, settings))
    }

    /// Combine a directory listing with the registered videos, sorted by id.
    pub fn assemble(&self, image_ids: &[String], settings: &Settings) -> Vec<MediaItem> {
        let mut items: Vec<MediaItem> = image_ids
            .iter()
            .map(|id| settings.media_item(id, MediaKind::Image, self.media_dir.join(id).to_string_lossy()))
            .collect();
        items.extend(settings.video_items());
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    fn image_path(&self, id: &str) -> Result<PathBuf, CoreError> {
        if !is_safe_item_id(id) || !has_image_extension(id) {
            return Err(CoreError::Validation(format!("Invalid image name: {id}")));
        }
        Ok(self.media_dir.join(id))
    }
}

/// Where a display client fetches an item from.
pub fn item_url(item: &MediaItem) -> String {
    match item.kind {
        MediaKind::Image => format!("{IMAGE_URL_PREFIX}/{}", item.id),
        MediaKind::Video => item.source_location.clone(),
    }
}

fn io_error(e: std::io::Error) -> AppError {
    AppError::InternalError(format!("Media I/O failed: {e}"))
}
