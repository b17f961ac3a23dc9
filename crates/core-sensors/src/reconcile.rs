//! Reconciliation: edge detection between consecutive alarm sets
//!
//! # Transition Table
//!
//! ```text
//!  previous      new           membership      transition
//!  ─────────     ─────────     ───────────     ─────────────
//!  empty         empty         -               None
//!  empty         non-empty     -               AlarmRaised    → engage()
//!  non-empty     empty         -               AlarmCleared   → disengage()
//!  non-empty     non-empty     same            None
//!  non-empty     non-empty     different       AlarmChanged   (actuator untouched)
//! ```
//!
//! The classification depends only on its two inputs. Calling it with the
//! same ordered pair always yields the same answer.

use crate::snapshot::{AlarmSet, SensorSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge transition produced by one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Nothing the actuator cares about changed
    None,

    /// Alarm set went from empty to non-empty
    AlarmRaised,

    /// Alarm set went from non-empty to empty
    AlarmCleared,

    /// Alarm set stayed non-empty but its membership changed
    AlarmChanged,
}

/// What the actuator should do in response to a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuation {
    Engage,
    Disengage,
    /// Leave the actuator as it is
    Hold,
}

impl Transition {
    /// Actuator call implied by this transition
    pub fn actuation(&self) -> Actuation {
        match self {
            Transition::AlarmRaised => Actuation::Engage,
            Transition::AlarmCleared => Actuation::Disengage,
            Transition::None | Transition::AlarmChanged => Actuation::Hold,
        }
    }

    /// String representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::None => "none",
            Transition::AlarmRaised => "alarm_raised",
            Transition::AlarmCleared => "alarm_cleared",
            Transition::AlarmChanged => "alarm_changed",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the transition from `previous` to the alarm set of `snapshot`
pub fn reconcile(previous: &AlarmSet, snapshot: &SensorSnapshot) -> (AlarmSet, Transition) {
    let updated = snapshot.alarm_set();

    let transition = match (previous.is_empty(), updated.is_empty()) {
        (true, true) => Transition::None,
        (true, false) => Transition::AlarmRaised,
        (false, true) => Transition::AlarmCleared,
        (false, false) if *previous == updated => Transition::None,
        (false, false) => Transition::AlarmChanged,
    };

    (updated, transition)
}
