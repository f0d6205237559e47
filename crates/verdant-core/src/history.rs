//! bounded most-recent-first log of operation descriptions

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::Serialize;

/// one logged action and the local wall-clock time it happened
#[derive(Clone, Debug, Serialize)]
pub struct HistoryEntry {
    pub action: String,
    pub at: DateTime<Local>,
}

impl std::fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.action, self.at.format("%H:%M:%S"))
    }
}

/// append-only operation log, newest first, evicting past the cap
#[derive(Clone, Debug, Serialize)]
pub struct OperationHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl OperationHistory {
    pub const DEFAULT_CAPACITY: usize = 10;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// log an action, evicting the oldest entry past the cap
    pub fn record(&mut self, action: impl Into<String>) {
        self.entries.push_front(HistoryEntry {
            action: action.into(),
            at: Local::now(),
        });
        self.entries.truncate(self.capacity);
    }

    /// entries newest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for OperationHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
