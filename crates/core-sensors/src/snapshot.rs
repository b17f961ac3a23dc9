//! Snapshots and alarm sets
//!
//! A [`SensorSnapshot`] is the full status mapping at one point in time. The
//! [`AlarmSet`] is always derived from a snapshot; the engine keeps the last
//! reconciled set only to compare the next snapshot against it.

use crate::sensor::{SensorId, SensorStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from sensor to status at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorSnapshot {
    statuses: BTreeMap<SensorId, SensorStatus>,
}

impl SensorSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a sensor's status, returning the previous one
    pub fn insert(&mut self, id: SensorId, status: SensorStatus) -> Option<SensorStatus> {
        self.statuses.insert(id, status)
    }

    /// Status of a sensor, if present
    pub fn get(&self, id: &SensorId) -> Option<SensorStatus> {
        self.statuses.get(id).copied()
    }

    /// Check if the snapshot carries a value for this sensor
    pub fn contains(&self, id: &SensorId) -> bool {
        self.statuses.contains_key(id)
    }

    /// Iterate over sensors in display order
    pub fn iter(&self) -> impl Iterator<Item = (&SensorId, SensorStatus)> {
        self.statuses.iter().map(|(id, status)| (id, *status))
    }

    /// Sensor ids in display order
    pub fn sensors(&self) -> impl Iterator<Item = &SensorId> {
        self.statuses.keys()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Derive the set of sensors currently in `ALERT`
    pub fn alarm_set(&self) -> AlarmSet {
        self.iter()
            .filter(|(_, status)| status.is_alert())
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl FromIterator<(SensorId, SensorStatus)> for SensorSnapshot {
    fn from_iter<I: IntoIterator<Item = (SensorId, SensorStatus)>>(iter: I) -> Self {
        Self {
            statuses: iter.into_iter().collect(),
        }
    }
}

/// The subset of sensors whose status is `ALERT`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmSet {
    sensors: BTreeSet<SensorId>,
}

impl AlarmSet {
    /// Create an empty alarm set
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn contains(&self, id: &SensorId) -> bool {
        self.sensors.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SensorId> {
        self.sensors.iter()
    }

    /// Sensors in `self` that were not alarming in `previous`
    pub fn newly_alerting<'a>(&'a self, previous: &'a AlarmSet) -> impl Iterator<Item = &'a SensorId> {
        self.sensors.difference(&previous.sensors)
    }

    /// Sensors alarming in `previous` that are no longer in `self`
    pub fn newly_cleared<'a>(&'a self, previous: &'a AlarmSet) -> impl Iterator<Item = &'a SensorId> {
        previous.sensors.difference(&self.sensors)
    }

    /// Comma-separated sensor names, for log lines
    pub fn describe(&self) -> String {
        if self.sensors.is_empty() {
            return "none".to_string();
        }
        self.sensors
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<SensorId> for AlarmSet {
    fn from_iter<I: IntoIterator<Item = SensorId>>(iter: I) -> Self {
        Self {
            sensors: iter.into_iter().collect(),
        }
    }
}
