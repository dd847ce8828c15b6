//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the HTTP layer, the
//! video orchestrator and the schedule watcher. A forwarder task in the API
//! crate relays every event to the WebSocket clients.

use chrono::{DateTime, Utc};
use kiosk_core::command::Command;
use kiosk_core::types::ItemId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// KioskEvent
// ---------------------------------------------------------------------------

/// What happened. Serialized inline into [`KioskEvent`] under `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// The settings document was saved.
    ConfigurationChanged,
    /// Items were added, removed, enabled or re-themed.
    ItemListChanged,
    /// A remote command pushed to every live client.
    RemoteCommand {
        #[serde(flatten)]
        command: Command,
    },
    /// Show the interstitial while the player starts.
    VideoLoading { video_id: ItemId },
    VideoStarted { video_id: ItemId, interval_secs: u64 },
    /// Return to the slideshow, optionally at `next_item`.
    VideoStopped {
        video_id: ItemId,
        next_item: Option<ItemId>,
    },
    ThumbnailReady { video_id: ItemId, path: String },
    /// The day-schedule slot in effect changed.
    TimePeriodChanged { slot: u32 },
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfigurationChanged => "configuration_changed",
            Self::ItemListChanged => "item_list_changed",
            Self::RemoteCommand { .. } => "remote_command",
            Self::VideoLoading { .. } => "video_loading",
            Self::VideoStarted { .. } => "video_started",
            Self::VideoStopped { .. } => "video_stopped",
            Self::ThumbnailReady { .. } => "thumbnail_ready",
            Self::TimePeriodChanged { .. } => "time_period_changed",
        }
    }
}

/// A push event with its creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KioskEvent {
    #[serde(flatten)]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl KioskEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    /// JSON text sent over the WebSocket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!(error = %e, event = self.kind.name(), "Failed to serialize event");
            String::from("{}")
        })
    }
}

impl From<EventKind> for KioskEvent {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use kiosk_events::{EventBus, EventKind};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(EventKind::ItemListChanged);
/// ```
pub struct EventBus {
    sender: broadcast::Sender<KioskEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer is full.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to all current subscribers. Dropped when nobody listens.
    pub fn publish(&self, event: impl Into<KioskEvent>) {
        let event = event.into();
        tracing::debug!(event = event.kind.name(), "Publishing event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KioskEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(EventKind::VideoStarted {
            video_id: "video_ab".into(),
            interval_secs: 30,
        });

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(
            received.kind,
            EventKind::VideoStarted {
                video_id: "video_ab".into(),
                interval_secs: 30,
            }
        );
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(EventKind::ConfigurationChanged);

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");
        assert_eq!(e1.kind, EventKind::ConfigurationChanged);
        assert_eq!(e2.kind, EventKind::ConfigurationChanged);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(EventKind::ItemListChanged);
    }

    #[test]
    fn serializes_flat_with_type_tag() {
        let event = KioskEvent::new(EventKind::VideoStopped {
            video_id: "video_1".into(),
            next_item: Some("a.jpg".into()),
        });
        let value: serde_json::Value = serde_json::from_str(&event.to_json()).unwrap();
        assert_eq!(value["type"], "video_stopped");
        assert_eq!(value["video_id"], "video_1");
        assert_eq!(value["next_item"], "a.jpg");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn remote_command_carries_command_fields_inline() {
        let event = KioskEvent::new(EventKind::RemoteCommand {
            command: Command::Jump {
                target: "x.jpg".into(),
            },
        });
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "remote_command");
        assert_eq!(value["command"], json!("jump"));
        assert_eq!(value["image_name"], json!("x.jpg"));
    }
}
