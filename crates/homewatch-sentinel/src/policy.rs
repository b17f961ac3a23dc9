//! Sentinel Policy
//!
//! Defines the polling cadence and the behaviour choices the engine leaves
//! open: what a dismiss clears locally and what happens to a running alarm
//! when the scheduler is torn down.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which sensors a dismiss marks `OK` locally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissScope {
    /// Only sensors currently in `ALERT`
    #[default]
    Alarming,

    /// Every known sensor, mirroring the backend's reset
    All,
}

/// What deactivating the scheduler does to an engaged actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeardownPolicy {
    /// Stop the vibration and end the episode. Sensor statuses are kept as
    /// last known; an alarm still present on the next activation is raised
    /// again.
    #[default]
    Disengage,

    /// Leave everything as it is
    Retain,
}

/// Sentinel operational policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelPolicy {
    /// Interval between polls in milliseconds
    ///
    /// **Default:** 2500
    pub poll_interval_ms: u64,

    /// **Default:** [`DismissScope::Alarming`]
    pub dismiss_scope: DismissScope,

    /// **Default:** [`TeardownPolicy::Disengage`]
    pub teardown: TeardownPolicy,

    /// Maximum number of retained history entries
    ///
    /// **Default:** 100
    pub history_capacity: usize,
}

impl Default for SentinelPolicy {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2500,
            dismiss_scope: DismissScope::default(),
            teardown: TeardownPolicy::default(),
            history_capacity: 100,
        }
    }
}

impl SentinelPolicy {
    /// Create a policy with a custom poll interval
    ///
    /// Other parameters will use defaults.
    pub fn with_interval(poll_interval: Duration) -> Self {
        Self {
            poll_interval_ms: poll_interval.as_millis() as u64,
            ..Default::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate the policy configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }

        if self.history_capacity == 0 {
            return Err("history_capacity must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = SentinelPolicy::default();

        assert_eq!(policy.poll_interval(), Duration::from_millis(2500));
        assert_eq!(policy.dismiss_scope, DismissScope::Alarming);
        assert_eq!(policy.teardown, TeardownPolicy::Disengage);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_with_interval() {
        let policy = SentinelPolicy::with_interval(Duration::from_secs(5));
        assert_eq!(policy.poll_interval_ms, 5000);
        assert_eq!(policy.history_capacity, 100);
    }

    #[test]
    fn test_validation_failures() {
        let mut policy = SentinelPolicy::default();

        policy.poll_interval_ms = 0;
        assert!(policy.validate().is_err());
        policy.poll_interval_ms = 2500;

        policy.history_capacity = 0;
        assert!(policy.validate().is_err());
    }
}
