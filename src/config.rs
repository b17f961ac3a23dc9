/*!
 * Configuration types for Homewatch
 */

use homewatch_connect::HttpTransportConfig;
use homewatch_sentinel::{DismissScope, SentinelPolicy, TeardownPolicy, VibrationPattern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HomewatchError, Result};

/// Main configuration for the watcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Base URL of the status source
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Milliseconds between polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound for one exchange with the status source
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// What stopping the watcher does to a running vibration
    #[serde(default)]
    pub teardown: TeardownPolicy,

    /// Which sensors a dismiss marks OK locally
    #[serde(default)]
    pub dismiss_scope: DismissScope,

    /// Number of alert history entries kept in memory
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// Alarm sound & vibration
    #[serde(default)]
    pub vibration: VibrationConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            teardown: TeardownPolicy::default(),
            dismiss_scope: DismissScope::default(),
            history_capacity: default_history_capacity(),
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
            vibration: VibrationConfig::default(),
        }
    }
}

/// Vibration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibrationConfig {
    /// When off, alarms are tracked but nothing vibrates
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Repeating off/on timings in milliseconds
    #[serde(default)]
    pub pattern_ms: VibrationPattern,
}

impl Default for VibrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pattern_ms: VibrationPattern::default(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2500
}

fn default_request_timeout_ms() -> u64 {
    2000
}

fn default_history_capacity() -> usize {
    100
}

impl WatchConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: WatchConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Per-user config location, e.g. `~/.config/homewatch/homewatch.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("homewatch").join("homewatch.toml"))
    }

    /// Load from `path`, else from the default location if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(default) if default.exists() => Self::from_file(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Check the configuration before anything is started
    pub fn validate(&self) -> Result<()> {
        self.sentinel_policy()
            .validate()
            .map_err(HomewatchError::Config)?;
        self.transport_config()
            .validate()
            .map_err(HomewatchError::Config)?;
        self.vibration
            .pattern_ms
            .validate()
            .map_err(HomewatchError::Config)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sentinel_policy(&self) -> SentinelPolicy {
        SentinelPolicy {
            poll_interval_ms: self.poll_interval_ms,
            dismiss_scope: self.dismiss_scope,
            teardown: self.teardown,
            history_capacity: self.history_capacity,
        }
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig::new(self.base_url.clone(), self.request_timeout())
    }
}
