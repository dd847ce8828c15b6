//! Persisted settings document.
//!
//! The whole document lives in memory behind an async lock and is written
//! back to disk after every successful mutation. Writes go to a sibling
//! temp file which is then renamed over the original, so a crash never
//! leaves a half-written document behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiosk_core::day_schedule::ScheduleLayout;
use kiosk_core::error::CoreError;
use kiosk_core::settings::Settings;
use kiosk_events::{EventBus, EventKind};
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::error::{AppError, AppResult};

pub struct SettingsStore {
    path: PathBuf,
    layout: ScheduleLayout,
    clock: Arc<Clock>,
    events: Arc<EventBus>,
    settings: RwLock<Settings>,
}

impl SettingsStore {
    /// Load the document at `path`, backfilling missing keys.
    ///
    /// A missing file starts from defaults. An unreadable one is moved
    /// aside to `<file>.corrupt` and replaced by defaults. Either way the
    /// normalized document is written back when it differs from disk.
    pub async fn open(
        path: impl Into<PathBuf>,
        layout: ScheduleLayout,
        clock: Arc<Clock>,
        events: Arc<EventBus>,
    ) -> AppResult<Self> {
        let path = path.into();
        let now = clock.unix_secs();

        let (mut settings, mut dirty) = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Settings>(&bytes) {
                Ok(settings) => (settings, false),
                Err(e) => {
                    let aside = path.with_extension("json.corrupt");
                    tracing::error!(
                        path = %path.display(),
                        aside = %aside.display(),
                        error = %e,
                        "Settings file is not valid JSON, starting from defaults",
                    );
                    tokio::fs::rename(&path, &aside).await.map_err(io_error)?;
                    (Settings::initial(&layout, now), true)
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No settings file, creating one");
                (Settings::initial(&layout, now), true)
            }
            Err(e) => return Err(io_error(e)),
        };

        dirty |= settings.normalize(&layout, now);
        if dirty {
            write_atomic(&path, &settings).await?;
        }

        Ok(Self {
            path,
            layout,
            clock,
            events,
            settings: RwLock::new(settings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &ScheduleLayout {
        &self.layout
    }

    /// A copy of the current document.
    pub async fn snapshot(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Run `f` against the current document without copying it.
    pub async fn read<R>(&self, f: impl FnOnce(&Settings) -> R) -> R {
        f(&*self.settings.read().await)
    }

    /// Apply a mutation, persist it, and announce the change.
    ///
    /// `f` works on a copy; the in-memory document is only replaced once
    /// the copy has been written to disk, so a rejected or failed update
    /// leaves nothing behind.
    pub async fn update<R>(&self, f: impl FnOnce(&mut Settings) -> Result<R, CoreError>) -> AppResult<R> {
        let mut guard = self.settings.write().await;
        let mut draft = guard.clone();
        let result = f(&mut draft)?;
        write_atomic(&self.path, &draft).await?;
        *guard = draft;
        drop(guard);

        self.events.publish(EventKind::ConfigurationChanged);
        Ok(result)
    }

    /// Merge a partial JSON object into the document.
    ///
    /// Top-level keys in `patch` overwrite the stored ones; the merged
    /// document is normalized before it is saved.
    pub async fn merge(&self, patch: serde_json::Value) -> AppResult<Settings> {
        let serde_json::Value::Object(patch) = patch else {
            return Err(AppError::BadRequest("Settings must be a JSON object".into()));
        };
        let layout = self.layout;
        let now = self.clock.unix_secs();

        self.update(move |settings| {
            let mut doc = serde_json::to_value(&*settings).map_err(|e| CoreError::Internal(e.to_string()))?;
            if let serde_json::Value::Object(fields) = &mut doc {
                fields.extend(patch);
            }
            let mut merged: Settings =
                serde_json::from_value(doc).map_err(|e| CoreError::Validation(format!("Invalid settings: {e}")))?;
            merged.normalize(&layout, now);
            *settings = merged;
            Ok(settings.clone())
        })
        .await
    }
}

async fn write_atomic(path: &Path, settings: &Settings) -> AppResult<()> {
    let bytes = serde_json::to_vec_pretty(settings).map_err(|e| AppError::InternalError(e.to_string()))?;
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(io_error)?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &bytes).await.map_err(io_error)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_error)?;
    Ok(())
}

fn io_error(e: std::io::Error) -> AppError {
    AppError::InternalError(format!("Settings I/O failed: {e}"))
}
