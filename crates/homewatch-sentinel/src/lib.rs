//! Homewatch Sentinel: the alert engine
//!
//! Polls the status source, keeps the last known status of every sensor,
//! and drives the vibration from alarm transitions rather than from raw
//! status values, so a persisting alarm vibrates once and keeps going
//! instead of restarting on every poll.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Observe    │──> StatusTransport::fetch_status
//! └──────┬──────┘
//!        │
//!        v
//! ┌─────────────┐
//! │  Orient     │──> SensorRegistry::apply_snapshot
//! └──────┬──────┘
//!        │
//!        v
//! ┌─────────────┐
//! │  Decide     │──> reconcile(previous alarms, snapshot)
//! └──────┬──────┘
//!        │
//!        v
//! ┌─────────────┐
//! │  Act        │──> AlertActuator engage / disengage
//! └──────┬──────┘
//!        │
//!        └────> PollScheduler waits for the next tick
//! ```
//!
//! The [`DismissController`] cuts across the loop: it clears locally, stops
//! the vibration and invalidates any pass in flight before asking the
//! backend to reset.
//!
//! # Example
//!
//! ```no_run
//! use homewatch_connect::{HttpTransport, HttpTransportConfig, StatusTransport};
//! use homewatch_sentinel::{
//!     AlertActuator, AlertEngine, DismissController, PollScheduler, SentinelPolicy,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let policy = SentinelPolicy::default();
//! let transport: Arc<dyn StatusTransport> =
//!     Arc::new(HttpTransport::new(HttpTransportConfig::default())?);
//! let engine = Arc::new(AlertEngine::new(AlertActuator::silent(), policy.history_capacity));
//!
//! let mut scheduler = PollScheduler::new(engine.clone(), transport.clone(), &policy)?;
//! let dismiss = DismissController::new(engine.clone(), transport, policy.dismiss_scope);
//!
//! scheduler.activate();
//! let mut view = engine.subscribe();
//! while view.changed().await.is_ok() {
//!     if view.borrow().alarm_active() {
//!         dismiss.dismiss().await;
//!         break;
//!     }
//! }
//! scheduler.deactivate().await;
//! # Ok(())
//! # }
//! ```

pub mod actuator;
pub mod dismiss;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod scheduler;

pub use actuator::{AlertActuator, Haptics, SilentHaptics, VibrationPattern};
pub use dismiss::{DismissController, DismissOutcome};
pub use engine::{AlertEngine, EngineView, PassOutcome, ResetWindow};
pub use error::SentinelError;
pub use metrics::PollStats;
pub use policy::{DismissScope, SentinelPolicy, TeardownPolicy};
pub use scheduler::PollScheduler;
