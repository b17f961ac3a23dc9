//! Alert Engine: the poll pass
//!
//! A pass runs the loop once:
//! - **Observe:** fetch the status report from the transport
//! - **Orient:** merge it into the sensor registry
//! - **Decide:** reconcile against the previous alarm set
//! - **Act:** engage or disengage the actuator on the resulting transition
//!
//! Engine state sits behind one async mutex that is never held across the
//! network exchange. Whole passes are serialized by a second "pass gate"
//! mutex. Every pass remembers the epoch it started in; dismissals and
//! teardown bump the epoch, and a pass that finishes in a different epoch
//! is thrown away without touching anything. While a backend reset is in
//! flight every finishing pass is thrown away as well, and the epoch moves
//! again once the reset returns.

use crate::actuator::AlertActuator;
use crate::metrics::PollStats;
use crate::policy::{DismissScope, TeardownPolicy};
use chrono::{DateTime, Utc};
use homewatch_connect::{StatusReport, StatusTransport, TransportError};
use homewatch_core_sensors::{
    reconcile, Actuation, AlarmSet, AlertHistory, ConnectivityEdge, ConnectivityState,
    ConnectivityTracker, HistoryEntry, HistoryKind, SensorId, SensorRegistry, SensorSnapshot,
    SensorStatus, Transition,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Read-only picture of the engine for the UI
///
/// Published on a `watch` channel after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineView {
    /// Last known status of every sensor
    pub snapshot: SensorSnapshot,

    /// Sensors currently `ALERT` in `snapshot`
    pub alarms: AlarmSet,

    pub connectivity: ConnectivityState,

    /// Whether the vibration is running
    pub engaged: bool,

    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,

    /// `last_updated` stamp from the most recent report carrying one
    pub source_updated: Option<String>,

    /// When each sensor last entered `ALERT`
    pub last_alerts: BTreeMap<SensorId, DateTime<Utc>>,
}

impl EngineView {
    pub fn alarm_active(&self) -> bool {
        !self.alarms.is_empty()
    }
}

/// Result of one poll pass
#[derive(Debug)]
pub enum PassOutcome {
    /// The report was merged and reconciled
    Applied {
        transition: Transition,
        alarms: AlarmSet,
    },

    /// The transport failed; nothing but connectivity changed
    Failed(TransportError),

    /// A dismiss, backend reset or teardown overlapped the fetch
    Discarded,

    /// Another pass was already running
    Skipped,
}

impl PassOutcome {
    pub fn transition(&self) -> Option<Transition> {
        match self {
            PassOutcome::Applied { transition, .. } => Some(*transition),
            _ => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, PassOutcome::Applied { .. })
    }
}

struct EngineState {
    registry: SensorRegistry,

    /// Alarm set as of the last reconciliation
    reconciled: AlarmSet,

    connectivity: ConnectivityTracker,
    source_updated: Option<String>,
    actuator: AlertActuator,
    history: AlertHistory,
    stats: PollStats,
    epoch: u64,
}

impl EngineState {
    fn view(&self) -> EngineView {
        let snapshot = self.registry.current_snapshot();
        EngineView {
            alarms: snapshot.alarm_set(),
            snapshot,
            connectivity: self.connectivity.state(),
            engaged: self.actuator.is_engaged(),
            last_success: self.connectivity.last_success(),
            last_error: self.connectivity.last_error().map(str::to_string),
            source_updated: self.source_updated.clone(),
            last_alerts: self.registry.last_alerts(),
        }
    }

    fn apply_report(&mut self, report: StatusReport) -> PassOutcome {
        let now = Utc::now();

        if let Some(ConnectivityEdge::Restored { failed_polls }) =
            self.connectivity.record_success(now)
        {
            info!("🔌 Connection restored after {} failed poll(s)", failed_polls);
            self.history.record(
                HistoryKind::ConnectionRestored,
                None,
                format!("Connection restored after {} failed poll(s)", failed_polls),
            );
        }

        if report.source_updated.is_some() {
            self.source_updated = report.source_updated;
        }

        self.registry.apply_snapshot_at(&report.sensors, now);
        let snapshot = self.registry.current_snapshot();
        let (updated, transition) = reconcile(&self.reconciled, &snapshot);

        for id in updated.newly_alerting(&self.reconciled) {
            self.history.record(
                HistoryKind::AlarmRaised,
                Some(id.clone()),
                format!("{} reported ALERT", id.display_name()),
            );
        }
        for id in updated.newly_cleared(&self.reconciled) {
            self.history.record(
                HistoryKind::AlarmCleared,
                Some(id.clone()),
                format!("{} back to OK", id.display_name()),
            );
        }

        match transition {
            Transition::AlarmRaised => warn!("🚨 Alarm raised: {}", updated.describe()),
            Transition::AlarmChanged => warn!("⚠️  Alarm set changed: {}", updated.describe()),
            Transition::AlarmCleared => info!("✅ All sensors clear"),
            Transition::None => debug!(alarms = %updated.describe(), "No alarm transition"),
        }

        match transition.actuation() {
            Actuation::Engage => {
                self.actuator.engage();
            }
            Actuation::Disengage => {
                self.actuator.disengage();
            }
            Actuation::Hold => {}
        }

        self.reconciled = updated.clone();
        self.stats.record_transition(transition);

        PassOutcome::Applied {
            transition,
            alarms: updated,
        }
    }

    fn apply_failure(&mut self, error: &TransportError) {
        match self.connectivity.record_failure(error.to_string()) {
            Some(ConnectivityEdge::Lost { reason }) => {
                warn!("📡 Connection lost: {}", reason);
                self.history
                    .record(HistoryKind::ConnectionLost, None, reason);
            }
            _ => debug!(
                failures = self.connectivity.consecutive_failures(),
                "Status source still unreachable: {}", error
            ),
        }
        self.stats.record_failure();
    }

    fn end_session(&mut self, teardown: TeardownPolicy) {
        self.epoch += 1;

        match teardown {
            TeardownPolicy::Disengage => {
                if self.actuator.disengage() {
                    info!("Vibration released on teardown");
                }
                self.reconciled = AlarmSet::new();
            }
            TeardownPolicy::Retain => {
                if self.actuator.is_engaged() {
                    debug!("Vibration left running on teardown");
                }
            }
        }
    }
}

/// Owner of the sensor registry, alarm set and actuator
///
/// Shared as `Arc<AlertEngine>` between the scheduler, the dismiss
/// controller and any manual refresh.
pub struct AlertEngine {
    state: Mutex<EngineState>,
    pass_gate: Mutex<()>,
    resets_in_flight: AtomicUsize,
    view_tx: watch::Sender<EngineView>,
}

/// A backend reset in flight; passes finishing meanwhile are discarded
///
/// Released on drop, so a dismiss that is cancelled mid-reset does not
/// leave the engine discarding forever.
pub struct ResetWindow<'a> {
    engine: &'a AlertEngine,
}

impl Drop for ResetWindow<'_> {
    fn drop(&mut self) {
        self.engine.resets_in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AlertEngine {
    /// Create an engine that knows the built-in sensors as `UNKNOWN`
    pub fn new(actuator: AlertActuator, history_capacity: usize) -> Self {
        let state = EngineState {
            registry: SensorRegistry::with_known_sensors(),
            reconciled: AlarmSet::new(),
            connectivity: ConnectivityTracker::new(),
            source_updated: None,
            actuator,
            history: AlertHistory::new(history_capacity),
            stats: PollStats::new(),
            epoch: 0,
        };
        let (view_tx, _) = watch::channel(state.view());

        Self {
            state: Mutex::new(state),
            pass_gate: Mutex::new(()),
            resets_in_flight: AtomicUsize::new(0),
            view_tx,
        }
    }

    /// Subscribe to view updates
    pub fn subscribe(&self) -> watch::Receiver<EngineView> {
        self.view_tx.subscribe()
    }

    /// Latest published view
    pub fn view(&self) -> EngineView {
        self.view_tx.borrow().clone()
    }

    /// Up to `n` history entries, newest first
    pub async fn history(&self, n: usize) -> Vec<HistoryEntry> {
        self.state.lock().await.history.recent(n)
    }

    pub async fn stats(&self) -> PollStats {
        self.state.lock().await.stats.clone()
    }

    /// Run one pass, waiting for any pass already in flight
    pub async fn run_pass(&self, transport: &dyn StatusTransport) -> PassOutcome {
        let _gate = self.pass_gate.lock().await;
        self.pass(transport).await
    }

    /// Run one pass unless another is already in flight
    pub async fn try_run_pass(&self, transport: &dyn StatusTransport) -> PassOutcome {
        let Ok(_gate) = self.pass_gate.try_lock() else {
            debug!("Poll already in flight, skipping refresh");
            self.state.lock().await.stats.record_skipped();
            return PassOutcome::Skipped;
        };
        self.pass(transport).await
    }

    async fn pass(&self, transport: &dyn StatusTransport) -> PassOutcome {
        let epoch = self.state.lock().await.epoch;
        let started = Instant::now();

        let result = transport.fetch_status().await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!(
                started_in = epoch,
                current = state.epoch,
                "Discarding poll result from a previous epoch"
            );
            state.stats.record_discarded();
            return PassOutcome::Discarded;
        }
        if self.resets_in_flight.load(Ordering::SeqCst) > 0 {
            debug!("Discarding poll result that raced a backend reset");
            state.stats.record_discarded();
            return PassOutcome::Discarded;
        }

        let outcome = match result {
            Ok(report) => state.apply_report(report),
            Err(e) => {
                state.apply_failure(&e);
                PassOutcome::Failed(e)
            }
        };
        state.stats.last_pass_duration = Some(started.elapsed());
        self.publish(&state);

        outcome
    }

    /// Clear alarms locally and release the vibration
    ///
    /// Marks sensors `OK` according to `scope`, empties the reconciled alarm
    /// set and invalidates any pass in flight. Returns whether the actuator
    /// was running.
    pub async fn dismiss_locally(&self, scope: DismissScope) -> bool {
        let mut state = self.state.lock().await;
        state.epoch += 1;

        let cleared: SensorSnapshot = state
            .registry
            .current_snapshot()
            .iter()
            .filter(|(_, status)| match scope {
                DismissScope::Alarming => status.is_alert(),
                DismissScope::All => true,
            })
            .map(|(id, _)| (id.clone(), SensorStatus::Ok))
            .collect();
        state.registry.apply_snapshot(&cleared);

        let previous = std::mem::take(&mut state.reconciled);
        let disengaged = state.actuator.disengage();

        let message = if previous.is_empty() {
            "Dismissed with no active alarm".to_string()
        } else {
            format!("Dismissed alarm: {}", previous.describe())
        };
        info!("🛑 {}", message);
        state.history.record(HistoryKind::Dismissed, None, message);
        state.stats.record_dismissal();

        self.publish(&state);
        disengaged
    }

    /// Open a [`ResetWindow`] for the duration of a backend reset
    pub fn reset_window(&self) -> ResetWindow<'_> {
        self.resets_in_flight.fetch_add(1, Ordering::SeqCst);
        ResetWindow { engine: self }
    }

    /// Record the outcome of the backend reset that follows a dismiss
    ///
    /// Passes that started while the reset was in flight saw the source
    /// before it reset, so the epoch moves on either way.
    pub async fn record_reset_result(&self, result: &Result<(), TransportError>) {
        let mut state = self.state.lock().await;
        state.epoch += 1;
        if let Err(e) = result {
            state
                .history
                .record(HistoryKind::ResetFailed, None, e.to_string());
            state.stats.record_reset_failure();
        }
    }

    /// Invalidate in-flight passes and apply `teardown`
    pub async fn end_session(&self, teardown: TeardownPolicy) {
        let mut state = self.state.lock().await;
        state.end_session(teardown);
        self.publish(&state);
    }

    /// Non-blocking [`end_session`](Self::end_session) for drop paths
    ///
    /// Returns `false` if the state was busy and nothing was done.
    pub fn try_end_session(&self, teardown: TeardownPolicy) -> bool {
        match self.state.try_lock() {
            Ok(mut state) => {
                state.end_session(teardown);
                self.publish(&state);
                true
            }
            Err(_) => {
                debug!("Engine busy during teardown");
                false
            }
        }
    }

    /// End the session from a synchronous context
    ///
    /// Applies `teardown` immediately if the state is free, otherwise hands
    /// it to a task on the current tokio runtime. Returns `false` only when
    /// the state was busy and no runtime was available.
    pub fn end_session_detached(self: &Arc<Self>, teardown: TeardownPolicy) -> bool {
        if self.try_end_session(teardown) {
            return true;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let engine = Arc::clone(self);
                handle.spawn(async move { engine.end_session(teardown).await });
                debug!("Teardown deferred to a background task");
                true
            }
            Err(_) => {
                warn!("Engine busy and no runtime, {:?} not applied", teardown);
                false
            }
        }
    }

    fn publish(&self, state: &EngineState) {
        self.view_tx.send_replace(state.view());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct Fixed(StdMutex<Vec<Result<StatusReport, TransportError>>>);

    impl Fixed {
        fn new(results: Vec<Result<StatusReport, TransportError>>) -> Self {
            let mut results = results;
            results.reverse();
            Self(StdMutex::new(results))
        }
    }

    #[async_trait]
    impl StatusTransport for Fixed {
        async fn fetch_status(&self) -> Result<StatusReport, TransportError> {
            self.0
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(TransportError::Request("script exhausted".into())))
        }

        async fn send_reset(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn endpoint(&self) -> String {
            "fixed".to_string()
        }
    }

    fn report(entries: &[(SensorId, SensorStatus)]) -> StatusReport {
        StatusReport {
            sensors: entries.iter().cloned().collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_initial_view_lists_known_sensors_as_unknown() {
        let engine = AlertEngine::new(AlertActuator::silent(), 10);
        let view = engine.view();

        assert_eq!(view.snapshot.len(), 3);
        assert_eq!(view.snapshot.get(&SensorId::Gas), Some(SensorStatus::Unknown));
        assert_eq!(view.connectivity, ConnectivityState::Disconnected);
        assert!(!view.alarm_active());
        assert!(!view.engaged);
    }

    #[tokio::test]
    async fn test_pass_publishes_view() {
        let engine = AlertEngine::new(AlertActuator::silent(), 10);
        let mut rx = engine.subscribe();
        let transport = Fixed::new(vec![Ok(StatusReport {
            source_updated: Some("2025-12-27 14:20:05".into()),
            ..report(&[(SensorId::Smoke, SensorStatus::Alert)])
        })]);

        let outcome = engine.run_pass(&transport).await;
        assert_eq!(outcome.transition(), Some(Transition::AlarmRaised));

        assert!(rx.has_changed().unwrap());
        let view = rx.borrow_and_update().clone();
        assert!(view.engaged);
        assert_eq!(view.connectivity, ConnectivityState::Connected);
        assert!(view.alarms.contains(&SensorId::Smoke));
        assert_eq!(view.source_updated.as_deref(), Some("2025-12-27 14:20:05"));
        assert!(view.last_alerts.contains_key(&SensorId::Smoke));
    }

    #[tokio::test]
    async fn test_dismiss_scope_alarming_keeps_other_sensors() {
        let engine = AlertEngine::new(AlertActuator::silent(), 10);
        let transport = Fixed::new(vec![Ok(report(&[
            (SensorId::Smoke, SensorStatus::Alert),
            (SensorId::Gas, SensorStatus::Ok),
        ]))]);
        engine.run_pass(&transport).await;

        assert!(engine.dismiss_locally(DismissScope::Alarming).await);

        let view = engine.view();
        assert_eq!(view.snapshot.get(&SensorId::Smoke), Some(SensorStatus::Ok));
        assert_eq!(
            view.snapshot.get(&SensorId::Doorbell),
            Some(SensorStatus::Unknown)
        );
        assert!(!view.engaged);
    }

    #[tokio::test]
    async fn test_dismiss_scope_all_marks_every_sensor_ok() {
        let engine = AlertEngine::new(AlertActuator::silent(), 10);
        assert!(!engine.dismiss_locally(DismissScope::All).await);

        let view = engine.view();
        assert!(view.snapshot.iter().all(|(_, s)| s == SensorStatus::Ok));

        let history = engine.history(5).await;
        assert_eq!(history[0].kind, HistoryKind::Dismissed);
    }

    #[tokio::test]
    async fn test_history_records_connection_edges() {
        let engine = AlertEngine::new(AlertActuator::silent(), 10);
        let transport = Fixed::new(vec![
            Err(TransportError::Request("boom".into())),
            Err(TransportError::Request("boom".into())),
            Ok(report(&[(SensorId::Gas, SensorStatus::Ok)])),
        ]);

        for _ in 0..3 {
            engine.run_pass(&transport).await;
        }

        let kinds: Vec<_> = engine
            .history(10)
            .await
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![HistoryKind::ConnectionRestored, HistoryKind::ConnectionLost]
        );

        let stats = engine.stats().await;
        assert_eq!(stats.passes_failed, 2);
        assert_eq!(stats.passes_applied, 1);
    }

    #[tokio::test]
    async fn test_reset_window_discards_until_dropped() {
        let engine = AlertEngine::new(AlertActuator::silent(), 10);
        let transport = Fixed::new(vec![
            Ok(report(&[(SensorId::Smoke, SensorStatus::Alert)])),
            Ok(report(&[(SensorId::Smoke, SensorStatus::Alert)])),
        ]);

        let window = engine.reset_window();
        assert!(matches!(
            engine.run_pass(&transport).await,
            PassOutcome::Discarded
        ));
        assert!(!engine.view().engaged);
        drop(window);

        assert_eq!(
            engine.run_pass(&transport).await.transition(),
            Some(Transition::AlarmRaised)
        );
    }

    #[tokio::test]
    async fn test_failed_reset_is_recorded() {
        let engine = AlertEngine::new(AlertActuator::silent(), 10);
        engine
            .record_reset_result(&Err(TransportError::Request("boom".into())))
            .await;
        engine.record_reset_result(&Ok(())).await;

        assert_eq!(engine.stats().await.reset_failures, 1);
        assert_eq!(engine.history(5).await[0].kind, HistoryKind::ResetFailed);
    }

    #[tokio::test]
    async fn test_busy_teardown_is_deferred() {
        let engine = Arc::new(AlertEngine::new(AlertActuator::silent(), 10));
        let transport = Fixed::new(vec![Ok(report(&[(SensorId::Gas, SensorStatus::Alert)]))]);
        engine.run_pass(&transport).await;

        let busy = engine.state.lock().await;
        assert!(!engine.try_end_session(TeardownPolicy::Disengage));
        assert!(engine.end_session_detached(TeardownPolicy::Disengage));
        assert!(engine.view().engaged);
        drop(busy);

        let mut view = engine.subscribe();
        view.wait_for(|v| !v.engaged).await.unwrap();
    }

    #[test]
    fn test_busy_teardown_without_runtime_is_skipped() {
        let engine = Arc::new(AlertEngine::new(AlertActuator::silent(), 10));
        let busy = engine.state.try_lock().unwrap();
        assert!(!engine.end_session_detached(TeardownPolicy::Disengage));
        drop(busy);
    }

    #[tokio::test]
    async fn test_try_end_session_disengages() {
        let engine = AlertEngine::new(AlertActuator::silent(), 10);
        let transport = Fixed::new(vec![Ok(report(&[(SensorId::Gas, SensorStatus::Alert)]))]);
        engine.run_pass(&transport).await;
        assert!(engine.view().engaged);

        assert!(engine.try_end_session(TeardownPolicy::Disengage));

        let view = engine.view();
        assert!(!view.engaged);
        // Last known statuses survive teardown
        assert!(view.alarm_active());
    }
}
