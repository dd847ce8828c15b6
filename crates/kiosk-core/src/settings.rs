//! The persisted settings document.
//!
//! One JSON document holds every theme, atmosphere, per-item map, day slot
//! and selection pointer. Every field carries a serde default so that a
//! document written by an older build (or edited by hand) loads with the
//! missing keys backfilled; [`Settings::normalize`] then repairs the
//! invariants in one place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::day_schedule::ScheduleLayout;
use crate::types::{
    AtmosphereId, CropRect, ItemId, MediaItem, MediaKind, ThemeId, ALL_ATMOSPHERE,
    ALL_IMAGES_THEME, DEFAULT_GROUP_INTERVAL_SECS,
};

/// Current document version written by [`Settings::normalize`].
pub const SETTINGS_VERSION: u32 = 2;

/// Global rotation interval used when no theme or atmosphere applies.
pub const DEFAULT_INTERVAL_SECS: u64 = 600;

/// How often display clients check for changes.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: ThemeId,
    /// Rotation interval in seconds while this theme is active.
    pub interval: u64,
    /// UNIX seconds.
    #[serde(default)]
    pub created: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atmosphere {
    pub name: AtmosphereId,
    pub interval: u64,
    #[serde(default)]
    pub created: f64,
    /// Ordered theme references. Empty means unfiltered.
    #[serde(default)]
    pub themes: Vec<ThemeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaySlot {
    #[serde(default)]
    pub start_hour: u32,
    #[serde(default)]
    pub atmospheres: Vec<AtmosphereId>,
}

/// A video registered by URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub added: f64,
}

/// The mutable pointers the selection resolver reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionState {
    pub active_theme: Option<ThemeId>,
    pub active_atmosphere: Option<AtmosphereId>,
    pub day_scheduling_enabled: bool,
    pub shuffle_seed: f64,
    pub interval_override: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub version: u32,
    /// Global interval override (seconds).
    pub interval: u64,
    pub check_interval: u64,
    pub dissolve_enabled: bool,
    pub themes: BTreeMap<ThemeId, Theme>,
    pub atmospheres: BTreeMap<AtmosphereId, Atmosphere>,
    #[serde(alias = "enabled_images")]
    pub enabled_items: BTreeMap<ItemId, bool>,
    #[serde(alias = "image_themes")]
    pub item_themes: BTreeMap<ItemId, Vec<ThemeId>>,
    #[serde(alias = "image_crops")]
    pub item_crops: BTreeMap<ItemId, CropRect>,
    pub videos: BTreeMap<ItemId, VideoEntry>,
    pub active_theme: Option<ThemeId>,
    pub active_atmosphere: Option<AtmosphereId>,
    #[serde(alias = "day_scheduling")]
    pub day_scheduling_enabled: bool,
    pub day_slots: BTreeMap<u32, DaySlot>,
    #[serde(alias = "shuffle_id")]
    pub shuffle_seed: f64,
    /// Version 1 kept atmosphere theme refs in a side map.
    #[serde(skip_serializing)]
    atmosphere_themes: BTreeMap<AtmosphereId, Vec<ThemeId>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 0,
            interval: DEFAULT_INTERVAL_SECS,
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            dissolve_enabled: true,
            themes: BTreeMap::new(),
            atmospheres: BTreeMap::new(),
            enabled_items: BTreeMap::new(),
            item_themes: BTreeMap::new(),
            item_crops: BTreeMap::new(),
            videos: BTreeMap::new(),
            active_theme: None,
            active_atmosphere: None,
            day_scheduling_enabled: false,
            day_slots: BTreeMap::new(),
            shuffle_seed: 0.0,
            atmosphere_themes: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// A fresh, normalized document.
    pub fn initial(layout: &ScheduleLayout, now_secs: f64) -> Self {
        let mut settings = Self::default();
        settings.normalize(layout, now_secs);
        settings
    }

    /// Repair every invariant the rest of the system relies on.
    ///
    /// Returns `true` when anything changed so the caller can persist the
    /// repaired document.
    pub fn normalize(&mut self, layout: &ScheduleLayout, now_secs: f64) -> bool {
        let before = self.clone();

        // v1 -> v2: fold the side map into the atmospheres themselves.
        for (name, refs) in std::mem::take(&mut self.atmosphere_themes) {
            if let Some(atmosphere) = self.atmospheres.get_mut(&name) {
                if atmosphere.themes.is_empty() {
                    atmosphere.themes = refs;
                }
            }
        }

        self.themes
            .entry(ALL_IMAGES_THEME.to_string())
            .or_insert_with(|| Theme {
                name: ALL_IMAGES_THEME.to_string(),
                interval: DEFAULT_GROUP_INTERVAL_SECS,
                created: now_secs,
            });
        self.atmospheres
            .entry(ALL_ATMOSPHERE.to_string())
            .or_insert_with(|| Atmosphere {
                name: ALL_ATMOSPHERE.to_string(),
                interval: DEFAULT_GROUP_INTERVAL_SECS,
                created: now_secs,
                themes: Vec::new(),
            });

        for (name, theme) in self.themes.iter_mut() {
            theme.name.clone_from(name);
            theme.interval = theme.interval.max(1);
        }
        for (name, atmosphere) in self.atmospheres.iter_mut() {
            atmosphere.name.clone_from(name);
            atmosphere.interval = atmosphere.interval.max(1);
            dedup_preserving_order(&mut atmosphere.themes);
        }
        self.interval = self.interval.max(1);
        self.check_interval = self.check_interval.max(1);

        for themes in self.item_themes.values_mut() {
            dedup_preserving_order(themes);
        }
        self.item_crops.retain(|_, crop| crop.is_valid());

        match &self.active_theme {
            Some(theme) if self.themes.contains_key(theme) => {}
            _ => self.active_theme = Some(ALL_IMAGES_THEME.to_string()),
        }
        if let Some(atmosphere) = &self.active_atmosphere {
            if !self.atmospheres.contains_key(atmosphere) {
                self.active_atmosphere = None;
            }
        }

        self.normalize_day_slots(layout);

        if !self.shuffle_seed.is_finite() {
            self.shuffle_seed = 0.0;
        }
        self.version = SETTINGS_VERSION;

        *self != before
    }

    fn normalize_day_slots(&mut self, layout: &ScheduleLayout) {
        self.day_slots.retain(|slot, _| layout.contains(*slot));
        for slot in layout.slot_ids() {
            let entry = self.day_slots.entry(slot).or_default();
            entry.start_hour = layout.start_hour_of(slot);
            dedup_preserving_order(&mut entry.atmospheres);
        }
        // The mirror source wins; copy it onto its peer.
        for slot in layout.slot_ids().filter(|s| layout.mirror_source(*s) == *s) {
            let refs = self
                .day_slots
                .get(&slot)
                .map(|s| s.atmospheres.clone())
                .unwrap_or_default();
            if let Some(peer) = self.day_slots.get_mut(&layout.mirror_peer(slot)) {
                peer.atmospheres = refs;
            }
        }
    }

    pub fn selection_state(&self) -> SelectionState {
        SelectionState {
            active_theme: self.active_theme.clone(),
            active_atmosphere: self.active_atmosphere.clone(),
            day_scheduling_enabled: self.day_scheduling_enabled,
            shuffle_seed: self.shuffle_seed,
            interval_override: self.interval,
        }
    }

    /// Items are enabled unless explicitly disabled.
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled_items.get(id).copied().unwrap_or(true)
    }

    pub fn themes_of(&self, id: &str) -> BTreeSet<ThemeId> {
        self.item_themes
            .get(id)
            .map(|themes| themes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Assemble the resolver's view of one item from the per-item maps.
    pub fn media_item(&self, id: &str, kind: MediaKind, source_location: impl Into<String>) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            kind,
            enabled: self.is_enabled(id),
            themes: self.themes_of(id),
            source_location: source_location.into(),
            crop: self.item_crops.get(id).copied(),
        }
    }

    /// Every registered video as a [`MediaItem`].
    pub fn video_items(&self) -> Vec<MediaItem> {
        self.videos
            .iter()
            .map(|(id, entry)| self.media_item(id, MediaKind::Video, entry.url.clone()))
            .collect()
    }
}

fn dedup_preserving_order(values: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    values.retain(|v| seen.insert(v.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_backfilled() {
        let layout = ScheduleLayout::default();
        let mut settings: Settings = serde_json::from_str("{}").unwrap();

        let changed = settings.normalize(&layout, 1_700_000_000.0);

        assert!(changed);
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.interval, DEFAULT_INTERVAL_SECS);
        assert!(settings.themes.contains_key(ALL_IMAGES_THEME));
        assert!(settings.atmospheres.contains_key(ALL_ATMOSPHERE));
        assert_eq!(settings.active_theme.as_deref(), Some(ALL_IMAGES_THEME));
        assert_eq!(settings.day_slots.len(), 12);
        assert_eq!(settings.day_slots[&10].start_hour, 0);
    }

    #[test]
    fn normalizing_twice_is_stable() {
        let layout = ScheduleLayout::default();
        let mut settings = Settings::initial(&layout, 0.0);
        assert!(!settings.normalize(&layout, 5.0));
    }

    #[test]
    fn legacy_keys_are_migrated() {
        let layout = ScheduleLayout::default();
        let legacy = r#"{
            "interval": 900,
            "enabled_images": {"a.jpg": false},
            "image_themes": {"a.jpg": ["Nature", "Nature"]},
            "atmospheres": {"Calm": {"name": "Calm", "interval": 120}},
            "atmosphere_themes": {"Calm": ["Nature"]},
            "active_theme": "Deleted",
            "active_atmosphere": "Gone",
            "shuffle_id": 0.25
        }"#;
        let mut settings: Settings = serde_json::from_str(legacy).unwrap();
        settings.normalize(&layout, 0.0);

        assert!(!settings.is_enabled("a.jpg"));
        assert_eq!(settings.item_themes["a.jpg"], vec!["Nature".to_string()]);
        assert_eq!(settings.atmospheres["Calm"].themes, vec!["Nature".to_string()]);
        assert_eq!(settings.active_theme.as_deref(), Some(ALL_IMAGES_THEME));
        assert_eq!(settings.active_atmosphere, None);
        assert_eq!(settings.shuffle_seed, 0.25);

        let json = serde_json::to_value(&settings).unwrap();
        assert!(json.get("atmosphere_themes").is_none());
    }

    #[test]
    fn mirror_source_overrides_peer_on_load() {
        let layout = ScheduleLayout::default();
        let doc = r#"{"day_slots": {"2": {"atmospheres": ["Day"]}, "8": {"atmospheres": ["Night"]}}}"#;
        let mut settings: Settings = serde_json::from_str(doc).unwrap();
        settings.normalize(&layout, 0.0);

        assert_eq!(settings.day_slots[&8].atmospheres, vec!["Day".to_string()]);
    }

    #[test]
    fn slots_outside_layout_are_dropped() {
        let layout = ScheduleLayout::new(8, 3, 6).unwrap();
        let doc = r#"{"day_slots": {"11": {"atmospheres": ["X"]}}}"#;
        let mut settings: Settings = serde_json::from_str(doc).unwrap();
        settings.normalize(&layout, 0.0);

        assert_eq!(settings.day_slots.len(), 8);
        assert!(!settings.day_slots.contains_key(&11));
    }

    #[test]
    fn items_default_to_enabled_with_no_themes() {
        let settings = Settings::default();
        let item = settings.media_item("new.png", MediaKind::Image, "/media/new.png");
        assert!(item.enabled);
        assert!(item.themes.is_empty());
        assert!(item.crop.is_none());
    }
}
