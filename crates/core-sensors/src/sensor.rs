//! Sensor identifiers and statuses
//!
//! The remote source reports sensors by wire key (`smoke_sensor`,
//! `gas_sensor`, `doorbell_sensor`). Known keys map onto the closed set of
//! [`SensorId`] variants; anything else is carried through as
//! [`SensorId::Other`] so a source that grows a new sensor still shows up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a single sensor
///
/// Ordering is stable (smoke, gas, doorbell, then other ids by key) so
/// snapshots render in the same order on every pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SensorId {
    Smoke,
    Gas,
    Doorbell,
    /// Sensor reported by the source that is not part of the known set
    Other(String),
}

impl SensorId {
    /// The three sensors every engine starts out knowing about
    pub const KNOWN: [SensorId; 3] = [SensorId::Smoke, SensorId::Gas, SensorId::Doorbell];

    /// Map a key from the status payload onto a sensor id
    ///
    /// Accepts both the `_sensor` suffixed form used by the backend and the
    /// bare name, case-insensitively. Unrecognised keys are kept verbatim.
    pub fn from_wire(key: &str) -> Self {
        let normalized = key.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "smoke_sensor" | "smoke" => SensorId::Smoke,
            "gas_sensor" | "gas" => SensorId::Gas,
            "doorbell_sensor" | "doorbell" => SensorId::Doorbell,
            _ => SensorId::Other(key.trim().to_string()),
        }
    }

    /// Key used when talking to the backend (`/trigger` payloads)
    pub fn wire_key(&self) -> &str {
        match self {
            SensorId::Smoke => "smoke_sensor",
            SensorId::Gas => "gas_sensor",
            SensorId::Doorbell => "doorbell_sensor",
            SensorId::Other(key) => key,
        }
    }

    /// Short identifier
    pub fn as_str(&self) -> &str {
        match self {
            SensorId::Smoke => "smoke",
            SensorId::Gas => "gas",
            SensorId::Doorbell => "doorbell",
            SensorId::Other(key) => key,
        }
    }

    /// Human-facing name
    pub fn display_name(&self) -> &str {
        match self {
            SensorId::Smoke => "Smoke Detector",
            SensorId::Gas => "Gas Detector",
            SensorId::Doorbell => "Doorbell",
            SensorId::Other(key) => key,
        }
    }

    /// Whether this is one of the built-in sensors
    pub fn is_known(&self) -> bool {
        !matches!(self, SensorId::Other(_))
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for SensorId {
    fn from(key: String) -> Self {
        SensorId::from_wire(&key)
    }
}

impl From<&str> for SensorId {
    fn from(key: &str) -> Self {
        SensorId::from_wire(key)
    }
}

impl From<SensorId> for String {
    fn from(id: SensorId) -> Self {
        id.wire_key().to_string()
    }
}

/// Status of a single sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorStatus {
    /// Sensor reports normal conditions
    Ok,

    /// Sensor is in alarm
    Alert,

    /// No successful poll has reported this sensor yet
    #[default]
    Unknown,
}

impl SensorStatus {
    /// String representation, as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorStatus::Ok => "OK",
            SensorStatus::Alert => "ALERT",
            SensorStatus::Unknown => "UNKNOWN",
        }
    }

    /// Check if this status counts towards the alarm set
    pub fn is_alert(&self) -> bool {
        matches!(self, SensorStatus::Alert)
    }
}

impl fmt::Display for SensorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string that is neither `OK` nor `ALERT`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognised sensor status: {0:?}")]
pub struct StatusParseError(pub String);

impl FromStr for SensorStatus {
    type Err = StatusParseError;

    /// Parse a status reported by the source
    ///
    /// `UNKNOWN` is an engine-local state and is never accepted from the wire.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("ok") {
            Ok(SensorStatus::Ok)
        } else if trimmed.eq_ignore_ascii_case("alert") {
            Ok(SensorStatus::Alert)
        } else {
            Err(StatusParseError(s.to_string()))
        }
    }
}
