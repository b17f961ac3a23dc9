//! Alert History: bounded log of alarm and connection events
//!
//! Backs the "Alert History" screen. Entries are appended newest-last; once
//! the configured capacity is reached the oldest entry is evicted.
//!
//! # Example
//!
//! ```
//! use homewatch_core_sensors::history::{AlertHistory, HistoryKind};
//! use homewatch_core_sensors::SensorId;
//!
//! let mut history = AlertHistory::new(2);
//! history.record(HistoryKind::AlarmRaised, Some(SensorId::Smoke), "Smoke Detector alarm");
//! history.record(HistoryKind::Dismissed, None, "Alarm dismissed");
//! history.record(HistoryKind::ConnectionLost, None, "Server connection lost");
//!
//! assert_eq!(history.len(), 2);
//! assert_eq!(history.total_dropped(), 1);
//! ```

use crate::sensor::SensorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Kind of event recorded in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    /// A sensor entered `ALERT`
    AlarmRaised,

    /// A sensor left `ALERT`
    AlarmCleared,

    /// The user dismissed the active alarm
    Dismissed,

    /// The remote reset command failed after a dismiss
    ResetFailed,

    /// The status source stopped answering
    ConnectionLost,

    /// The status source answered again
    ConnectionRestored,
}

impl fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryKind::AlarmRaised => write!(f, "alarm raised"),
            HistoryKind::AlarmCleared => write!(f, "alarm cleared"),
            HistoryKind::Dismissed => write!(f, "dismissed"),
            HistoryKind::ResetFailed => write!(f, "reset failed"),
            HistoryKind::ConnectionLost => write!(f, "connection lost"),
            HistoryKind::ConnectionRestored => write!(f, "connection restored"),
        }
    }
}

/// A single history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: HistoryKind,

    /// Sensor the entry is about; `None` for system events
    pub sensor: Option<SensorId>,

    pub message: String,
}

/// Bounded, newest-last event log
#[derive(Debug, Clone)]
pub struct AlertHistory {
    entries: VecDeque<HistoryEntry>,
    max_capacity: usize,
    total_recorded: u64,
    total_dropped: u64,
}

impl AlertHistory {
    /// Create a history holding at most `max_capacity` entries
    pub fn new(max_capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_capacity.min(1024)),
            max_capacity,
            total_recorded: 0,
            total_dropped: 0,
        }
    }

    /// Record an event stamped with the current time
    pub fn record(&mut self, kind: HistoryKind, sensor: Option<SensorId>, message: impl Into<String>) {
        self.push(HistoryEntry {
            timestamp: Utc::now(),
            kind,
            sensor,
            message: message.into(),
        });
    }

    /// Append an entry, evicting the oldest one when full
    pub fn push(&mut self, entry: HistoryEntry) {
        self.total_recorded += 1;

        if self.max_capacity == 0 {
            self.total_dropped += 1;
            return;
        }

        if self.entries.len() >= self.max_capacity {
            self.entries.pop_front();
            self.total_dropped += 1;
        }

        self.entries.push_back(entry);
    }

    /// All retained entries, oldest first
    pub fn entries(&self) -> &VecDeque<HistoryEntry> {
        &self.entries
    }

    /// The `n` most recent entries, newest first
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.iter().rev().take(n).cloned().collect()
    }

    /// Most recent entry of a given kind
    pub fn last_of(&self, kind: HistoryKind) -> Option<&HistoryEntry> {
        self.entries.iter().rev().find(|e| e.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_recorded(&self) -> u64 {
        self.total_recorded
    }

    pub fn total_dropped(&self) -> u64 {
        self.total_dropped
    }
}

impl Default for AlertHistory {
    fn default() -> Self {
        Self::new(100)
    }
}
