//! Kiosk push event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`KioskEvent`]: the envelope pushed to every connected display and
//!   controller.

pub mod bus;

pub use bus::{EventBus, EventKind, KioskEvent};
