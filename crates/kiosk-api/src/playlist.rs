//! The live display order, as derived from the settings document.
//!
//! Backs the orchestrator's [`Playlist`] seam and the item listing, so a
//! video that ends hands over to exactly the item the listing shows next.

use std::sync::Arc;

use async_trait::async_trait;
use kiosk_core::selection::{self, Selection};
use kiosk_core::settings::Settings;
use kiosk_core::shuffle::{self, Reshuffle};
use kiosk_core::types::{ItemId, MediaItem};
use kiosk_player::Playlist;

use crate::clock::Clock;
use crate::error::AppResult;
use crate::library::MediaLibrary;
use crate::store::SettingsStore;

/// One consistent view of the catalog and what it resolves to right now.
#[derive(Debug, Clone)]
pub struct CurrentSelection {
    pub settings: Settings,
    /// Every item, enabled or not, sorted by id.
    pub items: Vec<MediaItem>,
    pub selection: Selection,
    /// Eligible items in display order.
    pub order: Vec<ItemId>,
}

pub struct SettingsPlaylist {
    store: Arc<SettingsStore>,
    library: Arc<MediaLibrary>,
    clock: Arc<Clock>,
}

impl SettingsPlaylist {
    pub fn new(store: Arc<SettingsStore>, library: Arc<MediaLibrary>, clock: Arc<Clock>) -> Self {
        Self { store, library, clock }
    }

    pub async fn current(&self) -> AppResult<CurrentSelection> {
        let settings = self.store.snapshot().await;
        let items = self.library.items(&settings).await?;
        let selection = selection::resolve(&items, &settings, self.store.layout(), self.clock.local_time());
        let order = selection.ordered(settings.shuffle_seed);
        Ok(CurrentSelection {
            settings,
            items,
            selection,
            order,
        })
    }

    /// Draw a new seed whose order does not start with `avoid`.
    ///
    /// The selection is resolved from the document being updated, so an
    /// edit that lands first is already reflected in the candidates.
    pub async fn reshuffle_avoiding(&self, avoid: Option<&str>) -> AppResult<Reshuffle> {
        let image_ids = self.library.image_ids().await?;
        let layout = *self.store.layout();
        let time = self.clock.local_time();
        let (reshuffle, eligible) = self
            .store
            .update(|settings| {
                let items = self.library.assemble(&image_ids, settings);
                let eligible = selection::resolve(&items, settings, &layout, time).eligible;
                let previous = settings.shuffle_seed;
                let reshuffle = shuffle::reshuffle_avoiding(&eligible, avoid, || loop {
                    let seed = shuffle::new_seed();
                    if seed != previous {
                        break seed;
                    }
                });
                settings.shuffle_seed = reshuffle.seed;
                Ok((reshuffle, eligible.len()))
            })
            .await?;

        if !reshuffle.avoided && eligible > 1 {
            tracing::warn!(
                avoid,
                attempts = reshuffle.attempts,
                "Reshuffle could not move item off the head of the order",
            );
        }
        Ok(reshuffle)
    }
}

#[async_trait]
impl Playlist for SettingsPlaylist {
    async fn interval_secs(&self) -> u64 {
        match self.current().await {
            Ok(current) => current.selection.interval_secs,
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to the global interval");
                self.store.read(|s| s.interval).await
            }
        }
    }

    async fn next_after(&self, video_id: &str) -> Option<ItemId> {
        let current = match self.current().await {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!(video_id, error = %e, "Cannot resolve the item after a video");
                return None;
            }
        };

        let next = shuffle::next_after(&current.order, video_id)?;
        if !next.wrapped {
            return Some(next.id);
        }

        // The video closed out the order: start a fresh one.
        match self.reshuffle_avoiding(Some(video_id)).await {
            Ok(reshuffle) => {
                tracing::info!(video_id, seed = reshuffle.seed, "End of order reached, reshuffled");
                reshuffle.order.into_iter().next()
            }
            Err(e) => {
                tracing::warn!(video_id, error = %e, "Reshuffle after video failed");
                Some(next.id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kiosk_core::day_schedule::ScheduleLayout;
    use kiosk_events::EventBus;

    use super::*;

    async fn playlist(dir: &std::path::Path, images: &[&str]) -> SettingsPlaylist {
        let media = dir.join("images");
        std::fs::create_dir_all(&media).unwrap();
        for name in images {
            std::fs::write(media.join(name), b"x").unwrap();
        }
        let clock = Arc::new(Clock::system());
        let store = SettingsStore::open(
            dir.join("settings.json"),
            ScheduleLayout::default(),
            Arc::clone(&clock),
            Arc::new(EventBus::default()),
        )
        .await
        .unwrap();
        SettingsPlaylist::new(Arc::new(store), Arc::new(MediaLibrary::new(media)), clock)
    }

    #[tokio::test]
    async fn next_follows_the_listed_order() {
        let dir = tempfile::tempdir().unwrap();
        let playlist = playlist(dir.path(), &["a.jpg", "b.jpg", "c.jpg"]).await;
        let order = playlist.current().await.unwrap().order;

        assert_eq!(playlist.next_after(&order[0]).await, Some(order[1].clone()));
    }

    #[tokio::test]
    async fn finishing_the_last_item_reshuffles() {
        let dir = tempfile::tempdir().unwrap();
        let playlist = playlist(dir.path(), &["a.jpg", "b.jpg", "c.jpg"]).await;
        let before = playlist.current().await.unwrap();
        let last = before.order.last().unwrap().clone();

        let next = playlist.next_after(&last).await.unwrap();

        let after = playlist.current().await.unwrap();
        assert_ne!(after.settings.shuffle_seed, before.settings.shuffle_seed);
        assert_eq!(after.order[0], next);
        assert_ne!(next, last);
    }

    #[tokio::test]
    async fn reshuffle_draws_from_the_committed_selection() {
        let dir = tempfile::tempdir().unwrap();
        let playlist = playlist(dir.path(), &["a.jpg", "b.jpg", "c.jpg", "d.jpg"]).await;
        playlist
            .store
            .update(|s| {
                s.create_theme("Warm", 0.0)?;
                s.set_item_themes("a.jpg", vec!["Warm".into()]);
                s.set_item_themes("b.jpg", vec!["Warm".into()]);
                s.set_active_theme("Warm").map(|_| ())
            })
            .await
            .unwrap();

        let reshuffle = playlist.reshuffle_avoiding(Some("a.jpg")).await.unwrap();

        assert_eq!(reshuffle.order.len(), 2);
        assert_eq!(reshuffle.order[0], "b.jpg");
        assert_eq!(playlist.current().await.unwrap().order, reshuffle.order);
    }

    #[tokio::test]
    async fn empty_selection_has_no_next() {
        let dir = tempfile::tempdir().unwrap();
        let playlist = playlist(dir.path(), &[]).await;
        assert_eq!(playlist.next_after("video_x").await, None);
        assert_eq!(playlist.interval_secs().await, kiosk_core::settings::DEFAULT_INTERVAL_SECS);
    }
}
