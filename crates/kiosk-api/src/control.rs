//! Remote-control delivery.
//!
//! A command reaches the display two ways: it is parked in the pull
//! mailbox for clients that poll, and it is pushed over the event bus to
//! clients holding a WebSocket.
//!
//! The mailbox TTL runs on real time. Pinning the clock in test mode only
//! moves the day schedule; pending commands still expire.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use kiosk_core::command::Command;
use kiosk_core::mailbox::{Mailbox, PendingCommand};
use kiosk_events::{EventBus, EventKind};

pub struct CommandChannel {
    mailbox: Mutex<Mailbox>,
    events: Arc<EventBus>,
}

impl CommandChannel {
    pub fn new(ttl_secs: i64, events: Arc<EventBus>) -> Self {
        Self {
            mailbox: Mutex::new(Mailbox::new(Duration::seconds(ttl_secs))),
            events,
        }
    }

    /// Park `command` in the mailbox and push it to live clients.
    pub fn send(&self, command: Command) -> PendingCommand {
        let pending = self.enqueue(command.clone());
        self.broadcast(command);
        pending
    }

    /// Park `command`, replacing anything not yet collected.
    pub fn enqueue(&self, command: Command) -> PendingCommand {
        let now = Utc::now();
        let mut mailbox = self.mailbox.lock().unwrap_or_else(|e| e.into_inner());
        let pending = mailbox.enqueue(command, now).clone();
        tracing::debug!(command = pending.command.kind(), "Command enqueued");
        pending
    }

    /// Push `command` without touching the mailbox.
    pub fn broadcast(&self, command: Command) {
        self.events.publish(EventKind::RemoteCommand { command });
    }

    /// Collect the pending command if it has not expired.
    pub fn poll(&self) -> Option<PendingCommand> {
        let now = Utc::now();
        self.mailbox.lock().unwrap_or_else(|e| e.into_inner()).poll(now)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;

    fn channel(ttl_secs: i64) -> (CommandChannel, Arc<EventBus>) {
        let events = Arc::new(EventBus::default());
        let channel = CommandChannel::new(ttl_secs, Arc::clone(&events));
        (channel, events)
    }

    #[test]
    fn send_parks_and_pushes() {
        let (channel, events) = channel(5);
        let mut rx = events.subscribe();

        channel.send(Command::Next);

        assert_eq!(
            rx.try_recv().unwrap().kind,
            EventKind::RemoteCommand { command: Command::Next }
        );
        assert_eq!(channel.poll().map(|p| p.command), Some(Command::Next));
        assert_eq!(channel.poll(), None);
    }

    #[test]
    fn expired_command_is_dropped() {
        let (channel, _) = channel(1);
        channel.enqueue(Command::Pause);

        std::thread::sleep(StdDuration::from_millis(1_100));

        assert_eq!(channel.poll(), None);
    }

    #[test]
    fn broadcast_skips_mailbox() {
        let (channel, _) = channel(5);
        channel.broadcast(Command::RefreshCrop {
            target: "a.jpg".into(),
        });
        assert_eq!(channel.poll(), None);
    }
}
