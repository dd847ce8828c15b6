//! Kiosk presentation domain.
//!
//! Everything in this crate is synchronous and free of I/O so the same
//! rules can be exercised by the HTTP layer, the video orchestrator and
//! unit tests alike:
//!
//! - [`settings`]: the persisted settings document and its load-time
//!   normalization.
//! - [`catalog`]: theme, atmosphere, item and day-slot editing.
//! - [`day_schedule`]: wall-clock to schedule slot mapping.
//! - [`selection`]: eligible item set and rotation interval.
//! - [`shuffle`]: seeded display order and reshuffle search.
//! - [`command`] / [`mailbox`]: remote command vocabulary and the
//!   single-slot pull mailbox.

pub mod catalog;
pub mod command;
pub mod day_schedule;
pub mod error;
pub mod mailbox;
pub mod selection;
pub mod settings;
pub mod shuffle;
pub mod types;
