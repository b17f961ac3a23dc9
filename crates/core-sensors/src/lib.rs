//! Homewatch Core Sensors: Pure-logic sensor model
//!
//! # Overview
//!
//! This crate holds everything about sensor state that can be decided without
//! a network, a clock-driven loop, or a vibration motor:
//!
//! - **Sensor**: identifiers and the `OK` / `ALERT` / `UNKNOWN` status
//! - **Snapshot**: a full per-sensor status mapping at a point in time
//! - **Registry**: the authoritative, single-writer store of current beliefs
//! - **Reconcile**: edge detection between two consecutive alarm sets
//! - **Connectivity**: `CONNECTED` / `DISCONNECTED` tracking with edges
//! - **History**: a bounded log of alarm and connection events
//!
//! # Pipeline
//!
//! ```text
//!   raw snapshot (from the transport)
//!          │
//!          ▼
//! ┌─────────────────────┐
//! │   SensorRegistry    │  ← absent sensors keep their previous status
//! │   apply_snapshot()  │
//! └─────────┬───────────┘
//!           │ current_snapshot()
//!           ▼
//! ┌─────────────────────┐
//! │     reconcile()     │  ← previous AlarmSet vs. new snapshot
//! └─────────┬───────────┘
//!           │
//!           ▼
//!   (AlarmSet, Transition) ──► actuator reacts to Raised / Cleared only
//! ```
//!
//! # Example
//!
//! ```
//! use homewatch_core_sensors::{
//!     reconcile, AlarmSet, SensorId, SensorRegistry, SensorSnapshot, SensorStatus, Transition,
//! };
//!
//! let mut registry = SensorRegistry::with_known_sensors();
//!
//! let mut raw = SensorSnapshot::new();
//! raw.insert(SensorId::Smoke, SensorStatus::Alert);
//! raw.insert(SensorId::Gas, SensorStatus::Ok);
//! registry.apply_snapshot(&raw);
//!
//! let (alarms, transition) = reconcile(&AlarmSet::new(), &registry.current_snapshot());
//! assert_eq!(transition, Transition::AlarmRaised);
//! assert!(alarms.contains(&SensorId::Smoke));
//! ```

pub mod connectivity;
pub mod history;
pub mod reconcile;
pub mod registry;
pub mod sensor;
pub mod snapshot;

pub use connectivity::{ConnectivityEdge, ConnectivityState, ConnectivityTracker};
pub use history::{AlertHistory, HistoryEntry, HistoryKind};
pub use reconcile::{reconcile, Actuation, Transition};
pub use registry::SensorRegistry;
pub use sensor::{SensorId, SensorStatus, StatusParseError};
pub use snapshot::{AlarmSet, SensorSnapshot};
