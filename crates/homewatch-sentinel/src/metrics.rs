//! Sentinel Metrics
//!
//! Running counters for the alert engine, accumulated across poll passes
//! and dismissals for the lifetime of an engine.

use homewatch_core_sensors::Transition;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Statistics accumulated by the alert engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollStats {
    /// Passes whose result was reconciled
    pub passes_applied: u64,

    /// Passes that ended in a transport error
    pub passes_failed: u64,

    /// Passes that completed under a stale epoch and were thrown away
    pub passes_discarded: u64,

    /// Manual refreshes declined because a pass was already running
    pub passes_skipped: u64,

    pub alarms_raised: u64,
    pub alarms_cleared: u64,
    pub alarms_changed: u64,

    /// Dismiss requests handled
    pub dismissals: u64,

    /// Dismissals whose backend reset failed
    pub reset_failures: u64,

    /// Wall time of the most recent pass that reached the engine state
    pub last_pass_duration: Option<Duration>,
}

impl PollStats {
    /// Create a new empty stats object
    pub fn new() -> Self {
        Self::default()
    }

    /// Passes that finished a fetch, whatever happened to the result
    pub fn total_passes(&self) -> u64 {
        self.passes_applied + self.passes_failed + self.passes_discarded
    }

    /// Fraction of fetches that succeeded (0.0 - 1.0)
    pub fn success_ratio(&self) -> f64 {
        let fetched = self.passes_applied + self.passes_failed;
        if fetched == 0 {
            1.0
        } else {
            self.passes_applied as f64 / fetched as f64
        }
    }

    pub fn record_transition(&mut self, transition: Transition) {
        self.passes_applied += 1;
        match transition {
            Transition::AlarmRaised => self.alarms_raised += 1,
            Transition::AlarmCleared => self.alarms_cleared += 1,
            Transition::AlarmChanged => self.alarms_changed += 1,
            Transition::None => {}
        }
    }

    pub fn record_failure(&mut self) {
        self.passes_failed += 1;
    }

    pub fn record_discarded(&mut self) {
        self.passes_discarded += 1;
    }

    pub fn record_skipped(&mut self) {
        self.passes_skipped += 1;
    }

    pub fn record_dismissal(&mut self) {
        self.dismissals += 1;
    }

    pub fn record_reset_failure(&mut self) {
        self.reset_failures += 1;
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Polls: {} total | {} ok ({:.1}%) | {} failed | {} discarded | {} skipped | Alarms: {} raised, {} cleared, {} changed | Dismissed: {} ({} reset failures)",
            self.total_passes(),
            self.passes_applied,
            self.success_ratio() * 100.0,
            self.passes_failed,
            self.passes_discarded,
            self.passes_skipped,
            self.alarms_raised,
            self.alarms_cleared,
            self.alarms_changed,
            self.dismissals,
            self.reset_failures
        )
    }
}
