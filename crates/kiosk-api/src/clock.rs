//! Wall clock with a test-mode override.
//!
//! Time-of-day computations (day schedule, settings timestamps) go through
//! [`Clock`] so the schedule can be exercised by pinning a mock timestamp
//! instead of waiting for the real hour. The command mailbox does not.

use std::sync::RwLock;

use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use kiosk_core::error::CoreError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TestMode {
    pub enabled: bool,
    /// UNIX seconds. Only honoured while `enabled`.
    pub mock_time: Option<f64>,
}

#[derive(Debug, Default)]
pub struct Clock {
    mode: RwLock<TestMode>,
}

impl Clock {
    pub fn system() -> Self {
        Self::default()
    }

    pub fn test_mode(&self) -> TestMode {
        *self.mode.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mode = self.test_mode();
        match (mode.enabled, mode.mock_time) {
            (true, Some(secs)) => from_unix(secs).unwrap_or_else(Utc::now),
            _ => Utc::now(),
        }
    }

    /// Current time as UNIX seconds, for settings timestamps.
    pub fn unix_secs(&self) -> f64 {
        let now = self.now();
        now.timestamp() as f64 + f64::from(now.timestamp_subsec_millis()) / 1000.0
    }

    /// Local time of day, which the day schedule keys on.
    pub fn local_time(&self) -> NaiveTime {
        self.now().with_timezone(&Local).time()
    }

    pub fn enable_test_mode(&self) -> TestMode {
        let mut mode = self.mode.write().unwrap_or_else(|e| e.into_inner());
        mode.enabled = true;
        *mode
    }

    /// Leave test mode and forget the mock time.
    pub fn disable_test_mode(&self) -> TestMode {
        let mut mode = self.mode.write().unwrap_or_else(|e| e.into_inner());
        *mode = TestMode::default();
        *mode
    }

    /// Pin the clock to `secs`. Enables test mode.
    pub fn set_mock_time(&self, secs: f64) -> Result<DateTime<Utc>, CoreError> {
        let at = from_unix(secs)
            .ok_or_else(|| CoreError::Validation(format!("Timestamp {secs} is out of range")))?;
        let mut mode = self.mode.write().unwrap_or_else(|e| e.into_inner());
        mode.enabled = true;
        mode.mock_time = Some(secs);
        Ok(at)
    }
}

fn from_unix(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9) as u32;
    Utc.timestamp_opt(whole as i64, nanos).single()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn mock_time_only_applies_in_test_mode() {
        let clock = Clock::system();
        clock.set_mock_time(1_700_000_000.0).unwrap();
        assert_eq!(clock.now().timestamp(), 1_700_000_000);
        assert!(clock.test_mode().enabled);

        clock.disable_test_mode();
        assert_ne!(clock.now().timestamp(), 1_700_000_000);
        assert_eq!(clock.test_mode(), TestMode::default());
    }

    #[test]
    fn local_time_follows_mock() {
        let clock = Clock::system();
        let local = Local.with_ymd_and_hms(2024, 5, 1, 13, 30, 0).unwrap();
        clock.set_mock_time(local.timestamp() as f64).unwrap();
        assert_eq!(clock.local_time(), NaiveTime::from_hms_opt(13, 30, 0).unwrap());
    }

    #[test]
    fn rejects_non_finite_timestamp() {
        let clock = Clock::system();
        assert_matches!(clock.set_mock_time(f64::NAN), Err(CoreError::Validation(_)));
        assert!(!clock.test_mode().enabled);
    }
}
