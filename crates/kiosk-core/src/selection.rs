//! Eligible item set and rotation interval.
//!
//! Precedence, first match wins:
//!
//! 1. day scheduling enabled: union of the current slot's atmospheres,
//! 2. an active atmosphere other than [`ALL_ATMOSPHERE`],
//! 3. an active theme other than [`ALL_IMAGES_THEME`],
//! 4. everything, at the global interval.
//!
//! Disabled items are always dropped. Dangling theme or atmosphere
//! references contribute nothing instead of failing.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::Serialize;

use crate::day_schedule::{self, ScheduleLayout};
use crate::settings::{Atmosphere, Settings};
use crate::shuffle;
use crate::types::{AtmosphereId, ItemId, MediaItem, ThemeId, ALL_ATMOSPHERE, ALL_IMAGES_THEME};

/// Which precedence rule produced a [`Selection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum SelectionSource {
    DaySchedule {
        slot: u32,
        atmospheres: Vec<AtmosphereId>,
    },
    Atmosphere {
        name: AtmosphereId,
    },
    Theme {
        name: ThemeId,
    },
    Unfiltered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub eligible: BTreeSet<ItemId>,
    pub interval_secs: u64,
    pub source: SelectionSource,
}

impl Selection {
    /// Eligible items in display order for `seed`.
    pub fn ordered(&self, seed: f64) -> Vec<ItemId> {
        shuffle::order(&self.eligible, seed)
    }
}

/// Theme filter derived from the active rule.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Filter {
    Unfiltered,
    Themes(BTreeSet<ThemeId>),
}

impl Filter {
    fn admits(&self, item: &MediaItem) -> bool {
        match self {
            Filter::Unfiltered => true,
            Filter::Themes(themes) => !item.themes.is_disjoint(themes),
        }
    }

    fn union(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::Unfiltered, _) | (_, Filter::Unfiltered) => Filter::Unfiltered,
            (Filter::Themes(mut a), Filter::Themes(b)) => {
                a.extend(b);
                Filter::Themes(a)
            }
        }
    }
}

fn atmosphere_filter(atmosphere: &Atmosphere) -> Filter {
    if atmosphere.name == ALL_ATMOSPHERE
        || atmosphere.themes.is_empty()
        || atmosphere.themes.iter().any(|t| t == ALL_IMAGES_THEME)
    {
        Filter::Unfiltered
    } else {
        Filter::Themes(atmosphere.themes.iter().cloned().collect())
    }
}

/// Resolve the eligible set and interval for the current selection state.
pub fn resolve(items: &[MediaItem], settings: &Settings, layout: &ScheduleLayout, time: NaiveTime) -> Selection {
    let (filter, interval_secs, source) = if settings.day_scheduling_enabled {
        let scheduled = day_schedule::current_slot(settings, layout, time);
        let known: Vec<&Atmosphere> = scheduled
            .atmospheres
            .iter()
            .filter_map(|name| settings.atmospheres.get(name))
            .collect();
        let filter = known
            .iter()
            .map(|a| atmosphere_filter(a))
            .reduce(Filter::union)
            .unwrap_or_else(|| Filter::Themes(BTreeSet::new()));
        let interval = known.first().map(|a| a.interval).unwrap_or(settings.interval);
        (
            filter,
            interval,
            SelectionSource::DaySchedule {
                slot: scheduled.slot,
                atmospheres: scheduled.atmospheres,
            },
        )
    } else if let Some(name) = settings
        .active_atmosphere
        .as_ref()
        .filter(|name| name.as_str() != ALL_ATMOSPHERE)
    {
        let (filter, interval) = match settings.atmospheres.get(name) {
            Some(atmosphere) => (atmosphere_filter(atmosphere), atmosphere.interval),
            None => (Filter::Themes(BTreeSet::new()), settings.interval),
        };
        (filter, interval, SelectionSource::Atmosphere { name: name.clone() })
    } else if let Some(name) = settings
        .active_theme
        .as_ref()
        .filter(|name| name.as_str() != ALL_IMAGES_THEME)
    {
        let interval = settings
            .themes
            .get(name)
            .map(|t| t.interval)
            .unwrap_or(settings.interval);
        (
            Filter::Themes(BTreeSet::from([name.clone()])),
            interval,
            SelectionSource::Theme { name: name.clone() },
        )
    } else {
        (Filter::Unfiltered, settings.interval, SelectionSource::Unfiltered)
    };

    let eligible = items
        .iter()
        .filter(|item| item.enabled && filter.admits(item))
        .map(|item| item.id.clone())
        .collect();

    Selection {
        eligible,
        interval_secs,
        source,
    }
}
