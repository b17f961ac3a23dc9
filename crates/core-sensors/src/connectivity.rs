//! Connectivity tracking
//!
//! Connectivity is a display concern only: losing the source never touches
//! sensor data. The tracker remembers when the last poll succeeded so the UI
//! can label data as possibly stale, and reports edges so they can be logged
//! once instead of on every failed tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of the most recent poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectivityState {
    /// Last poll succeeded
    Connected,

    /// Last poll failed or timed out, or no poll has completed yet
    #[default]
    Disconnected,
}

impl ConnectivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectivityState::Connected => "connected",
            ConnectivityState::Disconnected => "disconnected",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectivityState::Connected)
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connectivity edge worth recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityEdge {
    /// First failure after a success (or at startup)
    Lost { reason: String },

    /// First success after one or more failures
    Restored { failed_polls: u32 },
}

/// Tracks connectivity across polls
#[derive(Debug, Clone, Default)]
pub struct ConnectivityTracker {
    state: ConnectivityState,
    last_success: Option<DateTime<Utc>>,
    last_error: Option<String>,
    consecutive_failures: u32,
}

impl ConnectivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Local time of the last successful poll ("Never" when `None`)
    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// Reason of the most recent failure, cleared on success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Record a successful poll
    pub fn record_success(&mut self, now: DateTime<Utc>) -> Option<ConnectivityEdge> {
        let edge = (self.consecutive_failures > 0).then_some(ConnectivityEdge::Restored {
            failed_polls: self.consecutive_failures,
        });

        self.state = ConnectivityState::Connected;
        self.last_success = Some(now);
        self.last_error = None;
        self.consecutive_failures = 0;

        edge
    }

    /// Record a failed poll
    pub fn record_failure(&mut self, reason: impl Into<String>) -> Option<ConnectivityEdge> {
        let reason = reason.into();
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.state = ConnectivityState::Disconnected;
        self.last_error = Some(reason.clone());

        (self.consecutive_failures == 1).then_some(ConnectivityEdge::Lost { reason })
    }
}
