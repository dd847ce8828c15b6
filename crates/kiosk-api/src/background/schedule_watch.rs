//! Day-schedule slot change notifications.
//!
//! Polls the clock on a fixed period and tells the display clients when
//! the time of day has crossed into another slot, so they re-fetch the
//! item list. The settings document is only read.

use std::sync::Arc;
use std::time::Duration;

use kiosk_events::{EventBus, EventKind};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::store::SettingsStore;

/// Slot-change detector, separated from the loop so it can be driven
/// directly.
pub struct ScheduleWatch {
    store: Arc<SettingsStore>,
    clock: Arc<Clock>,
    events: Arc<EventBus>,
    last_slot: Option<u32>,
}

impl ScheduleWatch {
    pub fn new(store: Arc<SettingsStore>, clock: Arc<Clock>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            clock,
            events,
            last_slot: None,
        }
    }

    /// Compare the current slot with the previous check.
    ///
    /// Returns the new slot when a change was announced. The first check
    /// only records the slot; so does any check while day scheduling is
    /// off.
    pub async fn check(&mut self) -> Option<u32> {
        let slot = self.store.layout().slot_at(self.clock.local_time());
        let previous = self.last_slot.replace(slot);
        let enabled = self.store.read(|s| s.day_scheduling_enabled).await;

        match previous {
            Some(previous) if previous != slot && enabled => {
                tracing::info!(previous, slot, "Day schedule moved to a new time period");
                self.events.publish(EventKind::TimePeriodChanged { slot });
                Some(slot)
            }
            _ => None,
        }
    }
}

/// Run the watcher until `cancel` is triggered.
pub async fn run(mut watch: ScheduleWatch, period: Duration, cancel: CancellationToken) {
    tracing::info!(period_secs = period.as_secs(), "Schedule watcher started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Schedule watcher stopping");
                break;
            }
            _ = interval.tick() => {
                watch.check().await;
            }
        }
    }
}
