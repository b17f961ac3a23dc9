//! Sensor Registry: the engine's current belief about every sensor
//!
//! The registry has exactly one mutation path, [`SensorRegistry::apply_snapshot`].
//! A raw snapshot only ever *adds* information:
//!
//! - sensors present in the raw snapshot take the incoming status
//! - sensors unknown to the registry are added
//! - sensors absent from the raw snapshot keep their previous status
//!
//! A partial response is therefore never mistaken for "all clear".

use crate::sensor::{SensorId, SensorStatus};
use crate::snapshot::SensorSnapshot;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

/// Authoritative in-memory mapping of sensor id to status
#[derive(Debug, Clone, Default)]
pub struct SensorRegistry {
    statuses: SensorSnapshot,

    /// When each sensor last entered `ALERT`
    last_alert: BTreeMap<SensorId, DateTime<Utc>>,
}

impl SensorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in sensors, all `UNKNOWN`
    pub fn with_known_sensors() -> Self {
        let statuses = SensorId::KNOWN
            .iter()
            .cloned()
            .map(|id| (id, SensorStatus::Unknown))
            .collect();

        Self {
            statuses,
            last_alert: BTreeMap::new(),
        }
    }

    /// Merge a raw snapshot into the registry
    ///
    /// Returns the number of sensors whose status actually changed.
    pub fn apply_snapshot(&mut self, raw: &SensorSnapshot) -> usize {
        self.apply_snapshot_at(raw, Utc::now())
    }

    /// Same as [`apply_snapshot`](Self::apply_snapshot) with an explicit clock
    pub fn apply_snapshot_at(&mut self, raw: &SensorSnapshot, now: DateTime<Utc>) -> usize {
        let mut changed = 0;

        for (id, incoming) in raw.iter() {
            let previous = self.statuses.insert(id.clone(), incoming);

            if previous != Some(incoming) {
                changed += 1;
                debug!(
                    sensor = %id,
                    from = previous.map(|s| s.as_str()).unwrap_or("absent"),
                    to = incoming.as_str(),
                    "Sensor status changed"
                );
            }

            if incoming.is_alert() && previous != Some(SensorStatus::Alert) {
                self.last_alert.insert(id.clone(), now);
            }
        }

        changed
    }

    /// Owned copy of the current state
    pub fn current_snapshot(&self) -> SensorSnapshot {
        self.statuses.clone()
    }

    /// Current status of a single sensor
    pub fn status(&self, id: &SensorId) -> Option<SensorStatus> {
        self.statuses.get(id)
    }

    /// When the sensor last entered `ALERT`, if ever
    pub fn last_alert(&self, id: &SensorId) -> Option<DateTime<Utc>> {
        self.last_alert.get(id).copied()
    }

    /// Snapshot of all last-alert times
    pub fn last_alerts(&self) -> BTreeMap<SensorId, DateTime<Utc>> {
        self.last_alert.clone()
    }

    /// Number of sensors tracked
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}
