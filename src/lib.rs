/*!
 * Homewatch - smart home sensor alerts from the terminal
 *
 * Polls a home sensor status source (smoke, gas, doorbell), keeps the last
 * known state of every sensor, and turns alarm transitions into a single
 * continuous alert that the user can dismiss.
 *
 * The engine lives in the `homewatch-sentinel` crate; this crate adds the
 * configuration file, logging setup, terminal styling and the `homewatch`
 * binary.
 */

pub mod cli_style;
pub mod config;
pub mod error;
pub mod haptics;
pub mod logging;
pub mod watcher;

// Re-export commonly used types
pub use config::{LogLevel, VibrationConfig, WatchConfig};
pub use error::{HomewatchError, Result};
pub use haptics::TerminalHaptics;
pub use watcher::Watcher;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
