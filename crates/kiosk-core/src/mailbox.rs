//! Single-slot pull mailbox.
//!
//! Holds at most one command. A newer command overwrites the pending one.
//! Reads clear the slot whether or not the command was still fresh, so a
//! command is delivered at most once and never after its TTL.

use chrono::Duration;
use serde::Serialize;

use crate::command::Command;
use crate::types::Timestamp;

/// Lifetime of a mailbox command, in seconds.
pub const DEFAULT_COMMAND_TTL_SECS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingCommand {
    #[serde(flatten)]
    pub command: Command,
    pub issued_at: Timestamp,
}

#[derive(Debug)]
pub struct Mailbox {
    slot: Option<PendingCommand>,
    ttl: Duration,
}

impl Mailbox {
    pub fn new(ttl: Duration) -> Self {
        Self { slot: None, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Replace whatever is pending with `command`, stamped at `now`.
    pub fn enqueue(&mut self, command: Command, now: Timestamp) -> &PendingCommand {
        self.slot.insert(PendingCommand {
            command,
            issued_at: now,
        })
    }

    /// Take the pending command if it is younger than the TTL.
    ///
    /// The slot is empty afterwards in every case.
    pub fn poll(&mut self, now: Timestamp) -> Option<PendingCommand> {
        self.slot
            .take()
            .filter(|pending| now - pending.issued_at < self.ttl)
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COMMAND_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn delivers_within_ttl_and_clears() {
        let mut mailbox = Mailbox::default();
        mailbox.enqueue(Command::Next, t0());

        let got = mailbox.poll(t0() + Duration::milliseconds(4_999)).unwrap();
        assert_eq!(got.command, Command::Next);
        assert_eq!(got.issued_at, t0());
        assert!(mailbox.poll(t0() + Duration::seconds(1)).is_none());
    }

    #[test]
    fn expires_at_ttl_boundary_and_clears() {
        let mut mailbox = Mailbox::default();
        mailbox.enqueue(Command::Pause, t0());

        assert!(mailbox.poll(t0() + Duration::seconds(5)).is_none());
        assert!(mailbox.poll(t0()).is_none());
    }

    #[test]
    fn newer_command_overwrites_pending() {
        let mut mailbox = Mailbox::default();
        mailbox.enqueue(Command::Next, t0());
        mailbox.enqueue(
            Command::Jump { target: "b.jpg".into() },
            t0() + Duration::seconds(3),
        );

        let got = mailbox.poll(t0() + Duration::seconds(7)).unwrap();
        assert_eq!(got.command, Command::Jump { target: "b.jpg".into() });
    }

    #[test]
    fn empty_mailbox_polls_none() {
        let mut mailbox = Mailbox::new(Duration::seconds(1));
        assert!(mailbox.poll(t0()).is_none());
        assert_eq!(mailbox.ttl(), Duration::seconds(1));
    }

    #[test]
    fn pending_command_serializes_flat() {
        let mut mailbox = Mailbox::default();
        let pending = mailbox.enqueue(Command::Jump { target: "a".into() }, t0()).clone();
        let value = serde_json::to_value(&pending).unwrap();
        assert_eq!(value["command"], "jump");
        assert_eq!(value["image_name"], "a");
        assert!(value["issued_at"].is_string());
    }
}
