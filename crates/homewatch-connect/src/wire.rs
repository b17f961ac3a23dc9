//! Status payload decoding
//!
//! The source answers `GET /status` with a flat JSON object:
//!
//! ```json
//! {
//!   "smoke_sensor": "OK",
//!   "gas_sensor": "ALERT",
//!   "doorbell_sensor": "OK",
//!   "last_updated": "2025-12-27 14:20:05"
//! }
//! ```
//!
//! Only a body that is not a JSON object fails the whole exchange. Individual
//! entries that cannot be read are treated as absent so the registry keeps
//! its previous value for them.

use crate::error::TransportError;
use homewatch_core_sensors::{SensorId, SensorSnapshot, SensorStatus};
use serde_json::{Map, Value};
use tracing::debug;

/// Key the backend uses to stamp its own state
pub const LAST_UPDATED_KEY: &str = "last_updated";

/// Decoded answer from the status source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusReport {
    /// Sensors the source reported with a readable status
    pub sensors: SensorSnapshot,

    /// Source-side `last_updated` stamp, verbatim
    pub source_updated: Option<String>,

    /// Keys that were present but unreadable
    pub skipped: Vec<String>,
}

/// Decode a `/status` body
pub fn parse_status_body(body: &str) -> Result<StatusReport, TransportError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| TransportError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    match value {
        Value::Object(map) => Ok(parse_status_map(map)),
        other => Err(TransportError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn parse_status_map(map: Map<String, Value>) -> StatusReport {
    let mut report = StatusReport::default();

    for (key, value) in map {
        if key == LAST_UPDATED_KEY {
            report.source_updated = value.as_str().map(str::to_string);
            continue;
        }

        let status = value.as_str().and_then(|s| s.parse::<SensorStatus>().ok());
        match status {
            Some(status) => {
                report.sensors.insert(SensorId::from_wire(&key), status);
            }
            None => {
                debug!(key = %key, value = %value, "Skipping unreadable status entry");
                report.skipped.push(key);
            }
        }
    }

    report
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
