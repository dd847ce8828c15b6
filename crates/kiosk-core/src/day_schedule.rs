//! Wall-clock to schedule slot mapping.
//!
//! The day is cut into `slot_count` equal slots of `slot_hours` hours,
//! starting at `start_hour` and wrapping at midnight. Slot ids are 1-based.
//! The back half of the day mirrors the front half: slot `k + half` reads
//! its atmospheres from slot `k`.

use std::ops::RangeInclusive;

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

use crate::error::CoreError;
use crate::settings::Settings;
use crate::types::{AtmosphereId, ALL_ATMOSPHERE};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Slot geometry. Validated so the slots exactly tile 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleLayout {
    slot_count: u32,
    slot_hours: u32,
    start_hour: u32,
}

impl ScheduleLayout {
    /// Build a layout, rejecting geometries that do not tile the day or
    /// cannot be mirrored.
    pub fn new(slot_count: u32, slot_hours: u32, start_hour: u32) -> Result<Self, CoreError> {
        if slot_count < 2 || slot_count % 2 != 0 {
            return Err(CoreError::Validation(format!(
                "Day slot count must be an even number >= 2, got {slot_count}"
            )));
        }
        if slot_count * slot_hours != 24 {
            return Err(CoreError::Validation(format!(
                "{slot_count} slots of {slot_hours}h do not cover 24 hours"
            )));
        }
        if start_hour >= 24 {
            return Err(CoreError::Validation(format!(
                "Day start hour must be within 0..24, got {start_hour}"
            )));
        }
        Ok(Self {
            slot_count,
            slot_hours,
            start_hour,
        })
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    pub fn slot_hours(&self) -> u32 {
        self.slot_hours
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn slot_ids(&self) -> RangeInclusive<u32> {
        1..=self.slot_count
    }

    pub fn contains(&self, slot: u32) -> bool {
        self.slot_ids().contains(&slot)
    }

    fn half(&self) -> u32 {
        self.slot_count / 2
    }

    /// Hour of day at which `slot` begins.
    pub fn start_hour_of(&self, slot: u32) -> u32 {
        (self.start_hour + (slot - 1) * self.slot_hours) % 24
    }

    /// Slot containing `time`, using half-open `[start, start + width)`
    /// membership.
    pub fn slot_at(&self, time: NaiveTime) -> u32 {
        let minute_of_day = time.hour() * 60 + time.minute();
        let offset = (minute_of_day + MINUTES_PER_DAY - self.start_hour * 60) % MINUTES_PER_DAY;
        offset / (self.slot_hours * 60) + 1
    }

    /// Slot whose configuration `slot` reads from.
    pub fn mirror_source(&self, slot: u32) -> u32 {
        if slot > self.half() {
            slot - self.half()
        } else {
            slot
        }
    }

    /// The other half of `slot`'s mirror pair.
    pub fn mirror_peer(&self, slot: u32) -> u32 {
        if slot > self.half() {
            slot - self.half()
        } else {
            slot + self.half()
        }
    }
}

impl Default for ScheduleLayout {
    /// Twelve 2-hour slots starting at 06:00.
    fn default() -> Self {
        Self {
            slot_count: 12,
            slot_hours: 2,
            start_hour: 6,
        }
    }
}

/// Outcome of a scheduler lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledSlot {
    pub slot: u32,
    /// Slot whose atmospheres were read (differs from `slot` in the back half).
    pub source_slot: u32,
    /// Never empty.
    pub atmospheres: Vec<AtmosphereId>,
    /// True when the slot had nothing assigned and the "show everything"
    /// atmosphere was substituted.
    pub fell_back: bool,
}

/// Atmospheres configured for `slot`, read through its mirror source.
///
/// Falls back to [`ALL_ATMOSPHERE`] when nothing is assigned, so the
/// schedule can never blank the display.
pub fn slot_atmospheres(settings: &Settings, layout: &ScheduleLayout, slot: u32) -> ScheduledSlot {
    let source_slot = layout.mirror_source(slot);
    let assigned = settings
        .day_slots
        .get(&source_slot)
        .map(|s| s.atmospheres.clone())
        .unwrap_or_default();

    let fell_back = assigned.is_empty();
    let atmospheres = if fell_back {
        vec![ALL_ATMOSPHERE.to_string()]
    } else {
        assigned
    };

    ScheduledSlot {
        slot,
        source_slot,
        atmospheres,
        fell_back,
    }
}

/// Resolve the slot active at `time` and its atmospheres.
pub fn current_slot(settings: &Settings, layout: &ScheduleLayout, time: NaiveTime) -> ScheduledSlot {
    slot_atmospheres(settings, layout, layout.slot_at(time))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::settings::DaySlot;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // -----------------------------------------------------------------------
    // Layout validation
    // -----------------------------------------------------------------------

    #[test]
    fn rejects_layouts_that_do_not_tile_the_day() {
        assert_matches!(ScheduleLayout::new(12, 3, 6), Err(CoreError::Validation(_)));
        assert_matches!(ScheduleLayout::new(7, 2, 6), Err(CoreError::Validation(_)));
        assert_matches!(ScheduleLayout::new(12, 2, 24), Err(CoreError::Validation(_)));
    }

    #[test]
    fn accepts_eight_three_hour_slots() {
        let layout = ScheduleLayout::new(8, 3, 6).unwrap();
        assert_eq!(layout.slot_at(at(6, 0)), 1);
        assert_eq!(layout.slot_at(at(8, 59)), 1);
        assert_eq!(layout.slot_at(at(9, 0)), 2);
        assert_eq!(layout.slot_at(at(3, 0)), 8);
        assert_eq!(layout.mirror_source(5), 1);
        assert_eq!(layout.mirror_peer(4), 8);
    }

    // -----------------------------------------------------------------------
    // Slot membership (default 12 x 2h from 06:00)
    // -----------------------------------------------------------------------

    #[test]
    fn maps_hours_to_slots_with_half_open_boundaries() {
        let layout = ScheduleLayout::default();
        let cases = [
            (at(6, 0), 1),
            (at(7, 30), 1),
            (at(7, 59), 1),
            (at(8, 0), 2),
            (at(9, 30), 2),
            (at(10, 0), 3),
            (at(12, 0), 4),
            (at(14, 0), 5),
            (at(17, 30), 6),
            (at(18, 0), 7),
            (at(20, 0), 8),
            (at(23, 55), 9),
            (at(0, 5), 10),
            (at(2, 0), 11),
            (at(4, 0), 12),
            (at(5, 59), 12),
        ];
        for (time, expected) in cases {
            assert_eq!(layout.slot_at(time), expected, "time {time}");
        }
    }

    #[test]
    fn start_hours_wrap_past_midnight() {
        let layout = ScheduleLayout::default();
        assert_eq!(layout.start_hour_of(1), 6);
        assert_eq!(layout.start_hour_of(9), 22);
        assert_eq!(layout.start_hour_of(10), 0);
        assert_eq!(layout.start_hour_of(12), 4);
    }

    #[test]
    fn mirror_pairs_are_twelve_hours_apart() {
        let layout = ScheduleLayout::default();
        for slot in 1..=6 {
            assert_eq!(layout.mirror_peer(slot), slot + 6);
            assert_eq!(layout.mirror_peer(slot + 6), slot);
            assert_eq!(layout.mirror_source(slot + 6), slot);
            assert_eq!(layout.mirror_source(slot), slot);
        }
    }

    // -----------------------------------------------------------------------
    // Atmosphere resolution
    // -----------------------------------------------------------------------

    #[test]
    fn back_half_reads_from_mirror_source() {
        let layout = ScheduleLayout::default();
        let mut settings = Settings::default();
        settings.day_slots.insert(
            1,
            DaySlot {
                start_hour: 6,
                atmospheres: vec!["Morning".into()],
            },
        );
        settings.day_slots.insert(
            7,
            DaySlot {
                start_hour: 18,
                atmospheres: vec!["Stale".into()],
            },
        );

        let resolved = current_slot(&settings, &layout, at(19, 0));
        assert_eq!(resolved.slot, 7);
        assert_eq!(resolved.source_slot, 1);
        assert_eq!(resolved.atmospheres, vec!["Morning".to_string()]);
        assert!(!resolved.fell_back);
    }

    #[test]
    fn empty_slot_falls_back_to_show_everything() {
        let layout = ScheduleLayout::default();
        let settings = Settings::default();

        let resolved = current_slot(&settings, &layout, at(10, 0));
        assert_eq!(resolved.atmospheres, vec![ALL_ATMOSPHERE.to_string()]);
        assert!(resolved.fell_back);
    }
}
