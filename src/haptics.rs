/*!
 * Terminal stand-in for a vibration motor
 */

use homewatch_sentinel::{AlertActuator, Haptics, SilentHaptics, VibrationPattern};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use crate::config::VibrationConfig;

/// Rings the terminal bell when a pattern starts and logs start/stop
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalHaptics;

impl Haptics for TerminalHaptics {
    fn start(&self, pattern: &VibrationPattern) {
        info!(cycle_ms = pattern.cycle_ms(), "Vibration pattern started: {}", pattern);
        let mut stdout = std::io::stdout();
        // BEL; failures to write are irrelevant for a notification
        let _ = stdout.write_all(b"\x07");
        let _ = stdout.flush();
    }

    fn stop(&self) {
        info!("Vibration pattern stopped");
    }
}

/// Build the actuator described by the vibration settings
pub fn build_actuator(config: &VibrationConfig) -> AlertActuator {
    let haptics: Arc<dyn Haptics> = if config.enabled {
        Arc::new(TerminalHaptics)
    } else {
        Arc::new(SilentHaptics)
    };
    AlertActuator::new(haptics, config.pattern_ms.clone())
}
