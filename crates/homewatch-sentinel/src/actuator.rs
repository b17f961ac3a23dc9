//! Alert Actuator
//!
//! Owns the vibration lifecycle. The engine calls [`AlertActuator::engage`]
//! and [`AlertActuator::disengage`] on alarm transitions; the actuator turns
//! those into at most one running pattern on the [`Haptics`] collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Timings of a repeating vibration pattern, in milliseconds
///
/// Alternates off/on durations starting with an initial delay, like the
/// platform vibration APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VibrationPattern(Vec<u64>);

impl VibrationPattern {
    pub fn new(timings_ms: Vec<u64>) -> Self {
        Self(timings_ms)
    }

    pub fn timings_ms(&self) -> &[u64] {
        &self.0
    }

    /// Length of one cycle of the pattern
    pub fn cycle_ms(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("vibration pattern must have at least one timing".to_string());
        }
        if self.cycle_ms() == 0 {
            return Err("vibration pattern must not be all zeros".to_string());
        }
        Ok(())
    }
}

impl Default for VibrationPattern {
    fn default() -> Self {
        Self(vec![0, 250, 250, 250])
    }
}

impl fmt::Display for VibrationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|t| t.to_string()).collect();
        write!(f, "[{}] ms", parts.join(", "))
    }
}

/// Haptic output device
///
/// `start` begins repeating `pattern` until `stop` is called.
pub trait Haptics: Send + Sync {
    fn start(&self, pattern: &VibrationPattern);
    fn stop(&self);
}

/// Collaborator used when vibration is switched off
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentHaptics;

impl Haptics for SilentHaptics {
    fn start(&self, pattern: &VibrationPattern) {
        debug!("Vibration disabled, not starting pattern {}", pattern);
    }

    fn stop(&self) {}
}

/// Scoped owner of the vibration
///
/// Dropping an engaged actuator stops the pattern.
pub struct AlertActuator {
    haptics: Arc<dyn Haptics>,
    pattern: VibrationPattern,
    engaged: bool,
    engagements: u64,
    disengagements: u64,
}

impl AlertActuator {
    pub fn new(haptics: Arc<dyn Haptics>, pattern: VibrationPattern) -> Self {
        Self {
            haptics,
            pattern,
            engaged: false,
            engagements: 0,
            disengagements: 0,
        }
    }

    /// An actuator that tracks state but never vibrates
    pub fn silent() -> Self {
        Self::new(Arc::new(SilentHaptics), VibrationPattern::default())
    }

    /// Start the pattern. Returns `false` if it was already running.
    pub fn engage(&mut self) -> bool {
        if self.engaged {
            return false;
        }

        info!("📳 Vibration engaged: {}", self.pattern);
        self.haptics.start(&self.pattern);
        self.engaged = true;
        self.engagements += 1;
        true
    }

    /// Stop the pattern. Returns `false` if nothing was running.
    pub fn disengage(&mut self) -> bool {
        if !self.engaged {
            return false;
        }

        info!("🔕 Vibration disengaged");
        self.haptics.stop();
        self.engaged = false;
        self.disengagements += 1;
        true
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn pattern(&self) -> &VibrationPattern {
        &self.pattern
    }

    /// Number of times the pattern was started
    pub fn engagements(&self) -> u64 {
        self.engagements
    }

    /// Number of times the pattern was stopped
    pub fn disengagements(&self) -> u64 {
        self.disengagements
    }
}

impl fmt::Debug for AlertActuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertActuator")
            .field("pattern", &self.pattern)
            .field("engaged", &self.engaged)
            .field("engagements", &self.engagements)
            .field("disengagements", &self.disengagements)
            .finish()
    }
}

impl Drop for AlertActuator {
    fn drop(&mut self) {
        self.disengage();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<&'static str>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Haptics for Recorder {
        fn start(&self, _pattern: &VibrationPattern) {
            self.calls.lock().unwrap().push("start");
        }

        fn stop(&self) {
            self.calls.lock().unwrap().push("stop");
        }
    }

    #[test]
    fn test_engage_is_idempotent() {
        let recorder = Arc::new(Recorder::default());
        let mut actuator = AlertActuator::new(recorder.clone(), VibrationPattern::default());

        assert!(actuator.engage());
        assert!(!actuator.engage());
        assert!(actuator.is_engaged());
        assert_eq!(recorder.calls(), vec!["start"]);
        assert_eq!(actuator.engagements(), 1);
    }

    #[test]
    fn test_disengage_when_idle_is_noop() {
        let recorder = Arc::new(Recorder::default());
        let mut actuator = AlertActuator::new(recorder.clone(), VibrationPattern::default());

        assert!(!actuator.disengage());
        assert!(recorder.calls().is_empty());

        actuator.engage();
        assert!(actuator.disengage());
        assert!(!actuator.disengage());
        assert_eq!(recorder.calls(), vec!["start", "stop"]);
    }

    #[test]
    fn test_drop_releases_vibration() {
        let recorder = Arc::new(Recorder::default());
        {
            let mut actuator = AlertActuator::new(recorder.clone(), VibrationPattern::default());
            actuator.engage();
        }
        assert_eq!(recorder.calls(), vec!["start", "stop"]);

        // Dropping an idle actuator makes no call
        drop(AlertActuator::new(recorder.clone(), VibrationPattern::default()));
        assert_eq!(recorder.calls().len(), 2);
    }

    #[test]
    fn test_pattern_defaults_and_validation() {
        let pattern = VibrationPattern::default();
        assert_eq!(pattern.timings_ms(), &[0, 250, 250, 250]);
        assert_eq!(pattern.cycle_ms(), 750);
        assert!(pattern.validate().is_ok());
        assert_eq!(pattern.to_string(), "[0, 250, 250, 250] ms");

        assert!(VibrationPattern::new(vec![]).validate().is_err());
        assert!(VibrationPattern::new(vec![0, 0]).validate().is_err());
    }

    #[test]
    fn test_silent_actuator_tracks_state() {
        let mut actuator = AlertActuator::silent();
        assert!(actuator.engage());
        assert!(actuator.is_engaged());
        assert!(actuator.disengage());
    }
}
