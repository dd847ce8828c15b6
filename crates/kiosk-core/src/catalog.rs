//! Editing operations on the settings document.
//!
//! Every method validates its input, mutates the document in place and
//! regenerates the shuffle seed when the change alters what the display
//! rotates through. Persisting the result is the caller's job.

use std::collections::BTreeSet;

use crate::day_schedule::ScheduleLayout;
use crate::error::CoreError;
use crate::settings::{Atmosphere, Settings, Theme, VideoEntry};
use crate::shuffle;
use crate::types::{
    video_id_for_url, AtmosphereId, CropRect, ItemId, ThemeId, ALL_ATMOSPHERE, ALL_IMAGES_THEME,
    DEFAULT_GROUP_INTERVAL_SECS, EXTRAS_THEME,
};

/// Maximum length of theme and atmosphere names.
pub const MAX_NAME_LEN: usize = 100;

/// Trim and validate a theme or atmosphere name.
pub fn validate_name(kind: &str, raw: &str) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::Validation(format!("{kind} name is required")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "{kind} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    if name.contains('/') {
        return Err(CoreError::Validation(format!("{kind} name must not contain '/'")));
    }
    Ok(name.to_string())
}

fn validate_interval(interval: i64) -> Result<u64, CoreError> {
    if interval < 1 {
        return Err(CoreError::Validation("Interval must be positive".into()));
    }
    Ok(interval as u64)
}

/// Themes that can never be deleted.
pub fn is_protected_theme(name: &str) -> bool {
    name == ALL_IMAGES_THEME || name == EXTRAS_THEME
}

impl Settings {
    /// Draw a fresh shuffle seed, guaranteed to differ from the current one.
    pub fn regenerate_seed(&mut self) -> f64 {
        let previous = self.shuffle_seed;
        let mut seed = shuffle::new_seed();
        while seed == previous {
            seed = shuffle::new_seed();
        }
        self.shuffle_seed = seed;
        seed
    }

    // -----------------------------------------------------------------------
    // Themes
    // -----------------------------------------------------------------------

    pub fn create_theme(&mut self, raw_name: &str, now_secs: f64) -> Result<&Theme, CoreError> {
        let name = validate_name("Theme", raw_name)?;
        if self.themes.contains_key(&name) {
            return Err(CoreError::Conflict("Theme already exists".into()));
        }
        let theme = Theme {
            name: name.clone(),
            interval: DEFAULT_GROUP_INTERVAL_SECS,
            created: now_secs,
        };
        Ok(self.themes.entry(name).or_insert(theme))
    }

    /// Delete a theme and cascade it out of items and atmospheres.
    pub fn delete_theme(&mut self, name: &str) -> Result<(), CoreError> {
        if is_protected_theme(name) {
            return Err(CoreError::Protected(format!("Cannot delete the \"{name}\" theme")));
        }
        if self.themes.remove(name).is_none() {
            return Err(CoreError::not_found("Theme", name));
        }
        for themes in self.item_themes.values_mut() {
            themes.retain(|t| t != name);
        }
        for atmosphere in self.atmospheres.values_mut() {
            atmosphere.themes.retain(|t| t != name);
        }
        if self.active_theme.as_deref() == Some(name) {
            self.active_theme = Some(ALL_IMAGES_THEME.to_string());
            self.regenerate_seed();
        }
        Ok(())
    }

    /// Change a theme's interval; the global interval follows when the
    /// theme is active.
    pub fn set_theme_interval(&mut self, name: &str, interval: i64) -> Result<&Theme, CoreError> {
        let interval = validate_interval(interval)?;
        let is_active = self.active_theme.as_deref() == Some(name);
        let theme = self
            .themes
            .get_mut(name)
            .ok_or_else(|| CoreError::not_found("Theme", name))?;
        theme.interval = interval;
        if is_active {
            self.interval = interval;
        }
        Ok(&self.themes[name])
    }

    /// Switch the active theme. Always reshuffles, even when re-selecting
    /// the current theme.
    pub fn set_active_theme(&mut self, name: &str) -> Result<u64, CoreError> {
        let theme = self
            .themes
            .get(name)
            .ok_or_else(|| CoreError::not_found("Theme", name))?;
        self.interval = theme.interval;
        self.active_theme = Some(name.to_string());
        self.regenerate_seed();
        Ok(self.interval)
    }

    // -----------------------------------------------------------------------
    // Atmospheres
    // -----------------------------------------------------------------------

    pub fn create_atmosphere(&mut self, raw_name: &str, now_secs: f64) -> Result<&Atmosphere, CoreError> {
        let name = validate_name("Atmosphere", raw_name)?;
        if self.atmospheres.contains_key(&name) {
            return Err(CoreError::Conflict("Atmosphere already exists".into()));
        }
        let atmosphere = Atmosphere {
            name: name.clone(),
            interval: DEFAULT_GROUP_INTERVAL_SECS,
            created: now_secs,
            themes: Vec::new(),
        };
        Ok(self.atmospheres.entry(name).or_insert(atmosphere))
    }

    /// Delete an atmosphere and cascade it out of the day slots.
    pub fn delete_atmosphere(&mut self, name: &str) -> Result<(), CoreError> {
        if name == ALL_ATMOSPHERE {
            return Err(CoreError::Protected(format!(
                "Cannot delete the \"{ALL_ATMOSPHERE}\" atmosphere"
            )));
        }
        if self.atmospheres.remove(name).is_none() {
            return Err(CoreError::not_found("Atmosphere", name));
        }
        let mut schedule_changed = false;
        for slot in self.day_slots.values_mut() {
            let before = slot.atmospheres.len();
            slot.atmospheres.retain(|a| a != name);
            schedule_changed |= slot.atmospheres.len() != before;
        }
        let was_active = self.active_atmosphere.as_deref() == Some(name);
        if was_active {
            self.active_atmosphere = None;
        }
        if was_active || (schedule_changed && self.day_scheduling_enabled) {
            self.regenerate_seed();
        }
        Ok(())
    }

    pub fn set_atmosphere_interval(&mut self, name: &str, interval: i64) -> Result<&Atmosphere, CoreError> {
        let interval = validate_interval(interval)?;
        let is_active = self.active_atmosphere.as_deref() == Some(name);
        let atmosphere = self
            .atmospheres
            .get_mut(name)
            .ok_or_else(|| CoreError::not_found("Atmosphere", name))?;
        atmosphere.interval = interval;
        if is_active {
            self.interval = interval;
        }
        Ok(&self.atmospheres[name])
    }

    /// Replace an atmosphere's ordered theme references.
    ///
    /// Unknown theme names are kept; the resolver treats them as vacuous.
    pub fn set_atmosphere_themes(&mut self, name: &str, themes: Vec<ThemeId>) -> Result<&Atmosphere, CoreError> {
        let atmosphere = self
            .atmospheres
            .get_mut(name)
            .ok_or_else(|| CoreError::not_found("Atmosphere", name))?;
        let mut seen = BTreeSet::new();
        atmosphere.themes = themes.into_iter().filter(|t| seen.insert(t.clone())).collect();
        Ok(&self.atmospheres[name])
    }

    /// Set or clear the active atmosphere. Always reshuffles.
    ///
    /// Clearing restores the active theme's interval.
    pub fn set_active_atmosphere(&mut self, name: Option<&str>) -> Result<u64, CoreError> {
        match name {
            Some(name) => {
                let atmosphere = self
                    .atmospheres
                    .get(name)
                    .ok_or_else(|| CoreError::not_found("Atmosphere", name))?;
                self.interval = atmosphere.interval;
                self.active_atmosphere = Some(name.to_string());
            }
            None => {
                self.active_atmosphere = None;
                if let Some(theme) = self.active_theme.as_ref().and_then(|t| self.themes.get(t)) {
                    self.interval = theme.interval;
                }
            }
        }
        self.regenerate_seed();
        Ok(self.interval)
    }

    // -----------------------------------------------------------------------
    // Day schedule
    // -----------------------------------------------------------------------

    pub fn set_day_scheduling(&mut self, enabled: bool) {
        self.day_scheduling_enabled = enabled;
        self.regenerate_seed();
    }

    /// Assign atmospheres to a slot, writing the same list to its mirror
    /// peer. Unknown atmosphere names are rejected.
    pub fn set_slot_atmospheres(
        &mut self,
        layout: &ScheduleLayout,
        slot: u32,
        atmospheres: Vec<AtmosphereId>,
    ) -> Result<(), CoreError> {
        if !layout.contains(slot) {
            return Err(CoreError::not_found("TimePeriod", slot.to_string()));
        }
        if let Some(unknown) = atmospheres.iter().find(|a| !self.atmospheres.contains_key(*a)) {
            return Err(CoreError::not_found("Atmosphere", unknown.clone()));
        }
        let mut seen = BTreeSet::new();
        let atmospheres: Vec<_> = atmospheres.into_iter().filter(|a| seen.insert(a.clone())).collect();

        for id in [slot, layout.mirror_peer(slot)] {
            let entry = self.day_slots.entry(id).or_default();
            entry.start_hour = layout.start_hour_of(id);
            entry.atmospheres = atmospheres.clone();
        }
        self.regenerate_seed();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Items
    // -----------------------------------------------------------------------

    pub fn set_item_enabled(&mut self, id: &str, enabled: bool) {
        self.enabled_items.insert(id.to_string(), enabled);
    }

    pub fn set_item_themes(&mut self, id: &str, themes: Vec<ThemeId>) {
        let mut seen = BTreeSet::new();
        let themes: Vec<_> = themes
            .into_iter()
            .filter(|t| t != ALL_IMAGES_THEME && seen.insert(t.clone()))
            .collect();
        self.item_themes.insert(id.to_string(), themes);
    }

    pub fn set_item_crop(&mut self, id: &str, crop: Option<CropRect>) -> Result<(), CoreError> {
        match crop {
            Some(crop) if !crop.is_valid() => {
                Err(CoreError::Validation("Crop rectangle must lie inside the image".into()))
            }
            Some(crop) => {
                self.item_crops.insert(id.to_string(), crop);
                Ok(())
            }
            None => {
                self.item_crops.remove(id);
                Ok(())
            }
        }
    }

    /// New items join the active theme unless it is the unfiltered one.
    pub fn assign_to_active_theme(&mut self, id: &str) {
        if let Some(theme) = self.active_theme.clone() {
            if theme != ALL_IMAGES_THEME && self.themes.contains_key(&theme) {
                self.item_themes.insert(id.to_string(), vec![theme]);
            }
        }
    }

    /// Remove every trace of an item from the per-item maps.
    pub fn remove_item(&mut self, id: &str) {
        self.enabled_items.remove(id);
        self.item_themes.remove(id);
        self.item_crops.remove(id);
        self.videos.remove(id);
    }

    /// Drop per-item settings whose item is gone. `images` holds the ids
    /// currently in the media directory; registered videos always stay.
    ///
    /// Returns the number of entries removed.
    pub fn retain_items(&mut self, images: &BTreeSet<ItemId>) -> usize {
        let videos: BTreeSet<ItemId> = self.videos.keys().cloned().collect();
        let keep = |id: &ItemId| images.contains(id) || videos.contains(id);
        let before = self.enabled_items.len() + self.item_themes.len() + self.item_crops.len();

        self.enabled_items.retain(|id, _| keep(id));
        self.item_themes.retain(|id, _| keep(id));
        self.item_crops.retain(|id, _| keep(id));

        before - (self.enabled_items.len() + self.item_themes.len() + self.item_crops.len())
    }

    /// Register a video by URL, returning its stable id.
    pub fn register_video(&mut self, url: &str, title: Option<String>, now_secs: f64) -> Result<ItemId, CoreError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/')) {
            return Err(CoreError::Validation(
                "Video URL must be an http(s) URL or an absolute path".into(),
            ));
        }
        let id = video_id_for_url(url);
        if !self.videos.contains_key(&id) {
            self.videos.insert(
                id.clone(),
                VideoEntry {
                    url: url.to_string(),
                    title,
                    added: now_secs,
                },
            );
            self.assign_to_active_theme(&id);
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn settings() -> Settings {
        Settings::initial(&ScheduleLayout::default(), 0.0)
    }

    #[test]
    fn theme_switch_reshuffles() {
        let mut s = settings();
        s.create_theme("T1", 0.0).unwrap();
        s.create_theme("T2", 0.0).unwrap();
        s.set_active_theme("T1").unwrap();
        let a = s.shuffle_seed;

        s.set_active_theme("T2").unwrap();

        assert_ne!(s.shuffle_seed, a);
    }

    #[test]
    fn reselecting_same_theme_still_reshuffles() {
        let mut s = settings();
        s.create_theme("T1", 0.0).unwrap();
        s.set_active_theme("T1").unwrap();
        let a = s.shuffle_seed;
        s.set_active_theme("T1").unwrap();
        assert_ne!(s.shuffle_seed, a);
    }

    #[test]
    fn duplicate_and_blank_names_are_rejected() {
        let mut s = settings();
        s.create_theme("Nature", 0.0).unwrap();
        assert_matches!(s.create_theme("Nature", 0.0), Err(CoreError::Conflict(_)));
        assert_matches!(s.create_theme("  ", 0.0), Err(CoreError::Validation(_)));
        assert_matches!(s.create_atmosphere("a/b", 0.0), Err(CoreError::Validation(_)));
    }

    #[test]
    fn protected_groups_cannot_be_deleted() {
        let mut s = settings();
        assert_matches!(s.delete_theme(ALL_IMAGES_THEME), Err(CoreError::Protected(_)));
        assert_matches!(s.delete_theme(EXTRAS_THEME), Err(CoreError::Protected(_)));
        assert_matches!(s.delete_atmosphere(ALL_ATMOSPHERE), Err(CoreError::Protected(_)));
    }

    #[test]
    fn deleting_theme_cascades_and_resets_active() {
        let mut s = settings();
        s.create_theme("Nature", 0.0).unwrap();
        s.create_atmosphere("Calm", 0.0).unwrap();
        s.set_atmosphere_themes("Calm", vec!["Nature".into()]).unwrap();
        s.set_item_themes("a.jpg", vec!["Nature".into(), "Other".into()]);
        s.set_active_theme("Nature").unwrap();

        s.delete_theme("Nature").unwrap();

        assert_eq!(s.item_themes["a.jpg"], vec!["Other".to_string()]);
        assert!(s.atmospheres["Calm"].themes.is_empty());
        assert_eq!(s.active_theme.as_deref(), Some(ALL_IMAGES_THEME));
        assert_matches!(s.delete_theme("Nature"), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn deleting_active_atmosphere_clears_pointer_and_slots() {
        let layout = ScheduleLayout::default();
        let mut s = settings();
        s.create_atmosphere("Calm", 0.0).unwrap();
        s.set_active_atmosphere(Some("Calm")).unwrap();
        s.set_slot_atmospheres(&layout, 3, vec!["Calm".into()]).unwrap();

        s.delete_atmosphere("Calm").unwrap();

        assert_eq!(s.active_atmosphere, None);
        assert!(s.day_slots[&3].atmospheres.is_empty());
        assert!(s.day_slots[&9].atmospheres.is_empty());
    }

    #[test]
    fn active_theme_interval_updates_global_interval() {
        let mut s = settings();
        s.create_theme("Nature", 0.0).unwrap();
        s.set_active_theme("Nature").unwrap();

        s.set_theme_interval("Nature", 45).unwrap();

        assert_eq!(s.interval, 45);
        assert_matches!(s.set_theme_interval("Nature", 0), Err(CoreError::Validation(_)));
    }

    #[test]
    fn clearing_atmosphere_restores_theme_interval() {
        let mut s = settings();
        s.create_theme("Nature", 0.0).unwrap();
        s.set_active_theme("Nature").unwrap();
        s.set_theme_interval("Nature", 30).unwrap();
        s.create_atmosphere("Calm", 0.0).unwrap();
        s.set_atmosphere_interval("Calm", 90).unwrap();

        assert_eq!(s.set_active_atmosphere(Some("Calm")).unwrap(), 90);
        let seed = s.shuffle_seed;
        assert_eq!(s.set_active_atmosphere(None).unwrap(), 30);
        assert_ne!(s.shuffle_seed, seed);
    }

    #[test]
    fn slot_edit_writes_mirror_peer_and_reshuffles() {
        let layout = ScheduleLayout::default();
        let mut s = settings();
        s.create_atmosphere("Morning", 0.0).unwrap();
        let seed = s.shuffle_seed;

        s.set_slot_atmospheres(&layout, 8, vec!["Morning".into()]).unwrap();

        assert_eq!(s.day_slots[&8].atmospheres, vec!["Morning".to_string()]);
        assert_eq!(s.day_slots[&2].atmospheres, vec!["Morning".to_string()]);
        assert_ne!(s.shuffle_seed, seed);
    }

    #[test]
    fn slot_edit_rejects_unknown_slot_and_atmosphere() {
        let layout = ScheduleLayout::default();
        let mut s = settings();
        assert_matches!(
            s.set_slot_atmospheres(&layout, 13, vec![]),
            Err(CoreError::NotFound { entity: "TimePeriod", .. })
        );
        assert_matches!(
            s.set_slot_atmospheres(&layout, 1, vec!["Nope".into()]),
            Err(CoreError::NotFound { entity: "Atmosphere", .. })
        );
    }

    #[test]
    fn day_scheduling_toggle_reshuffles() {
        let mut s = settings();
        let seed = s.shuffle_seed;
        s.set_day_scheduling(true);
        assert!(s.day_scheduling_enabled);
        assert_ne!(s.shuffle_seed, seed);
    }

    #[test]
    fn registering_video_is_idempotent_and_joins_active_theme() {
        let mut s = settings();
        s.create_theme("Clips", 0.0).unwrap();
        s.set_active_theme("Clips").unwrap();

        let id = s.register_video("https://example.com/a.mp4", None, 0.0).unwrap();
        let again = s.register_video("https://example.com/a.mp4", None, 0.0).unwrap();

        assert_eq!(id, again);
        assert_eq!(s.videos.len(), 1);
        assert_eq!(s.item_themes[&id], vec!["Clips".to_string()]);
        assert_matches!(s.register_video("ftp://x", None, 0.0), Err(CoreError::Validation(_)));
    }

    #[test]
    fn removing_item_cascades_from_every_map() {
        let mut s = settings();
        let id = s.register_video("https://example.com/a.mp4", None, 0.0).unwrap();
        s.set_item_enabled(&id, false);
        s.set_item_themes(&id, vec!["X".into()]);
        s.set_item_crop(&id, Some(CropRect { x: 0.0, y: 0.0, width: 0.5, height: 0.5 }))
            .unwrap();

        s.remove_item(&id);

        assert!(!s.videos.contains_key(&id));
        assert!(!s.enabled_items.contains_key(&id));
        assert!(!s.item_themes.contains_key(&id));
        assert!(!s.item_crops.contains_key(&id));
    }

    #[test]
    fn item_theme_sets_drop_the_unfiltered_theme() {
        let mut s = settings();
        s.set_item_themes("a.jpg", vec![ALL_IMAGES_THEME.into(), "X".into(), "X".into()]);
        assert_eq!(s.item_themes["a.jpg"], vec!["X".to_string()]);
    }

    #[test]
    fn retain_items_drops_vanished_images_only() {
        let mut s = settings();
        let video = s.register_video("https://example.com/a.mp4", None, 0.0).unwrap();
        s.set_item_enabled("gone.jpg", false);
        s.set_item_themes("gone.jpg", vec!["X".into()]);
        s.set_item_enabled("kept.jpg", false);
        s.set_item_enabled(&video, false);

        let removed = s.retain_items(&BTreeSet::from(["kept.jpg".to_string()]));

        assert_eq!(removed, 2);
        assert!(!s.enabled_items.contains_key("gone.jpg"));
        assert!(s.enabled_items.contains_key("kept.jpg"));
        assert!(s.enabled_items.contains_key(&video));
    }
}
