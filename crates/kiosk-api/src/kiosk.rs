//! What the display reports back: the item on screen and a short debug log.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entries kept in the debug log.
pub const DEBUG_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentItem {
    pub image_name: String,
    pub reported_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct KioskStatus {
    current: RwLock<Option<CurrentItem>>,
    log: RwLock<VecDeque<DebugEntry>>,
}

impl KioskStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_item(&self) -> Option<CurrentItem> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn set_current_item(&self, image_name: impl Into<String>, now: DateTime<Utc>) -> CurrentItem {
        let item = CurrentItem {
            image_name: image_name.into(),
            reported_at: now,
        };
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(item.clone());
        item
    }

    /// Whether `id` is the item the display last reported.
    pub fn is_current(&self, id: &str) -> bool {
        self.current_item().is_some_and(|c| c.image_name == id)
    }

    /// Append to the debug log, dropping the oldest entry when full.
    pub fn log(&self, level: LogLevel, message: impl Into<String>, now: DateTime<Utc>) {
        let message = message.into();
        match level {
            LogLevel::Error => tracing::warn!(%message, "Display reported an error"),
            _ => tracing::debug!(?level, %message, "Display log"),
        }
        let mut log = self.log.write().unwrap_or_else(|e| e.into_inner());
        if log.len() == DEBUG_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(DebugEntry {
            level,
            message,
            timestamp: now,
        });
    }

    /// Oldest first.
    pub fn messages(&self) -> Vec<DebugEntry> {
        self.log.read().unwrap_or_else(|e| e.into_inner()).iter().cloned().collect()
    }

    pub fn clear_log(&self) {
        self.log.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
