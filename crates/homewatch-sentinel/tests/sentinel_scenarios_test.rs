//! End-to-end engine scenarios against a scripted status source
//!
//! The fake transport plays back a queue of responses; a recording haptics
//! collaborator counts how often the vibration was started and stopped.

use async_trait::async_trait;
use homewatch_connect::{StatusReport, StatusTransport, TransportError};
use homewatch_core_sensors::{
    AlarmSet, ConnectivityState, HistoryKind, SensorId, SensorStatus, Transition,
};
use homewatch_sentinel::{
    AlertActuator, AlertEngine, DismissController, DismissScope, Haptics, PassOutcome,
    PollScheduler, SentinelPolicy, TeardownPolicy, VibrationPattern,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use SensorStatus::{Alert, Ok as Clear};

enum Step {
    Report(Vec<(SensorId, SensorStatus)>),
    Fail,
    /// Signal `started`, then hold the response until `release` fires
    Gated {
        sensors: Vec<(SensorId, SensorStatus)>,
        started: Arc<Notify>,
        release: Arc<Notify>,
    },
}

#[derive(Default)]
struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    fetches: AtomicUsize,
    resets: AtomicUsize,
    fail_reset: AtomicBool,
    /// `(started, release)` for the next reset to hold on
    reset_gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl ScriptedTransport {
    fn push(&self, step: Step) {
        self.steps.lock().unwrap().push_back(step);
    }

    fn report(&self, smoke: SensorStatus, gas: SensorStatus, doorbell: SensorStatus) {
        self.push(Step::Report(statuses(smoke, gas, doorbell)));
    }

    /// Hold the next reset until the returned `release` fires
    fn gate_reset(&self) -> (Arc<Notify>, Arc<Notify>) {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.reset_gate.lock().unwrap() = Some((started.clone(), release.clone()));
        (started, release)
    }
}

fn statuses(
    smoke: SensorStatus,
    gas: SensorStatus,
    doorbell: SensorStatus,
) -> Vec<(SensorId, SensorStatus)> {
    vec![
        (SensorId::Smoke, smoke),
        (SensorId::Gas, gas),
        (SensorId::Doorbell, doorbell),
    ]
}

fn to_report(sensors: Vec<(SensorId, SensorStatus)>) -> StatusReport {
    StatusReport {
        sensors: sensors.into_iter().collect(),
        ..Default::default()
    }
}

#[async_trait]
impl StatusTransport for ScriptedTransport {
    async fn fetch_status(&self) -> Result<StatusReport, TransportError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Report(sensors)) => Ok(to_report(sensors)),
            Some(Step::Fail) => Err(TransportError::Unreachable {
                url: "http://fake/status".into(),
                reason: "connection refused".into(),
            }),
            Some(Step::Gated {
                sensors,
                started,
                release,
            }) => {
                started.notify_one();
                release.notified().await;
                Ok(to_report(sensors))
            }
            None => Err(TransportError::Request("script exhausted".into())),
        }
    }

    async fn send_reset(&self) -> Result<(), TransportError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        let gate = self.reset_gate.lock().unwrap().take();
        if let Some((started, release)) = gate {
            started.notify_one();
            release.notified().await;
        }
        if self.fail_reset.load(Ordering::SeqCst) {
            Err(TransportError::HttpStatus {
                url: "http://fake/reset".into(),
                status: 500,
            })
        } else {
            Ok(())
        }
    }

    fn endpoint(&self) -> String {
        "http://fake".to_string()
    }
}

#[derive(Default)]
struct RecordingHaptics {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl RecordingHaptics {
    fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Haptics for RecordingHaptics {
    fn start(&self, _pattern: &VibrationPattern) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

struct Rig {
    engine: Arc<AlertEngine>,
    transport: Arc<ScriptedTransport>,
    haptics: Arc<RecordingHaptics>,
    dismiss: DismissController,
}

impl Rig {
    fn new() -> Self {
        Self::with_scope(DismissScope::Alarming)
    }

    fn with_scope(scope: DismissScope) -> Self {
        let haptics = Arc::new(RecordingHaptics::default());
        let actuator = AlertActuator::new(haptics.clone(), VibrationPattern::default());
        let engine = Arc::new(AlertEngine::new(actuator, 50));
        let transport = Arc::new(ScriptedTransport::default());
        let dismiss = DismissController::new(engine.clone(), transport.clone(), scope);

        Self {
            engine,
            transport,
            haptics,
            dismiss,
        }
    }

    async fn poll(&self) -> PassOutcome {
        self.engine.run_pass(self.transport.as_ref()).await
    }

    fn scheduler(&self, policy: &SentinelPolicy) -> PollScheduler {
        PollScheduler::new(self.engine.clone(), self.transport.clone(), policy).unwrap()
    }
}

fn alarms(ids: &[SensorId]) -> AlarmSet {
    ids.iter().cloned().collect()
}

#[tokio::test]
async fn quiet_to_single_alert_raises_once_and_engages_once() {
    let rig = Rig::new();
    rig.transport.report(Clear, Clear, Clear);
    rig.transport.report(Alert, Clear, Clear);

    assert_eq!(rig.poll().await.transition(), Some(Transition::None));

    match rig.poll().await {
        PassOutcome::Applied { transition, alarms: set } => {
            assert_eq!(transition, Transition::AlarmRaised);
            assert_eq!(set, alarms(&[SensorId::Smoke]));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(rig.haptics.starts(), 1);
    assert!(rig.engine.view().engaged);
}

#[tokio::test]
async fn persisting_alarm_engages_at_most_once() {
    let rig = Rig::new();
    for _ in 0..6 {
        rig.transport.report(Clear, Alert, Clear);
    }

    let mut raised = 0;
    for _ in 0..6 {
        if rig.poll().await.transition() == Some(Transition::AlarmRaised) {
            raised += 1;
        }
    }

    assert_eq!(raised, 1);
    assert_eq!(rig.haptics.starts(), 1);
    assert_eq!(rig.haptics.stops(), 0);
}

#[tokio::test]
async fn clearing_disengages_exactly_once() {
    let rig = Rig::new();
    rig.transport.report(Alert, Clear, Clear);
    rig.transport.report(Clear, Clear, Clear);
    rig.transport.report(Clear, Clear, Clear);

    rig.poll().await;
    assert_eq!(rig.poll().await.transition(), Some(Transition::AlarmCleared));
    assert_eq!(rig.haptics.stops(), 1);

    assert_eq!(rig.poll().await.transition(), Some(Transition::None));
    assert_eq!(rig.haptics.starts(), 1);
    assert_eq!(rig.haptics.stops(), 1);
}

#[tokio::test]
async fn failed_poll_keeps_snapshot_and_vibration() {
    let rig = Rig::new();
    rig.transport.report(Alert, Clear, Clear);
    rig.transport.push(Step::Fail);
    rig.transport.push(Step::Fail);

    rig.poll().await;
    let before = rig.engine.view();

    assert!(matches!(rig.poll().await, PassOutcome::Failed(_)));
    assert!(matches!(rig.poll().await, PassOutcome::Failed(_)));

    let after = rig.engine.view();
    assert_eq!(after.snapshot, before.snapshot);
    assert_eq!(after.connectivity, ConnectivityState::Disconnected);
    assert!(after.last_error.is_some());
    // Stale but safe: losing the source never silences an alarm
    assert!(after.engaged);
    assert_eq!(rig.haptics.starts(), 1);
    assert_eq!(rig.haptics.stops(), 0);

    let lost: Vec<_> = rig
        .engine
        .history(10)
        .await
        .into_iter()
        .filter(|e| e.kind == HistoryKind::ConnectionLost)
        .collect();
    assert_eq!(lost.len(), 1);
}

#[tokio::test]
async fn new_sensor_joining_is_alarm_changed_without_second_engage() {
    let rig = Rig::new();
    rig.transport.report(Alert, Clear, Clear);
    rig.transport.report(Alert, Alert, Clear);

    rig.poll().await;
    match rig.poll().await {
        PassOutcome::Applied { transition, alarms: set } => {
            assert_eq!(transition, Transition::AlarmChanged);
            assert_eq!(set, alarms(&[SensorId::Smoke, SensorId::Gas]));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert!(rig.engine.view().engaged);
    assert_eq!(rig.haptics.starts(), 1);
}

#[tokio::test]
async fn dismiss_with_failed_reset_clears_locally_and_rearms() {
    let rig = Rig::new();
    rig.transport.fail_reset.store(true, Ordering::SeqCst);
    rig.transport.report(Alert, Alert, Clear);
    rig.transport.report(Alert, Clear, Clear);

    rig.poll().await;
    assert_eq!(rig.engine.view().alarms, alarms(&[SensorId::Smoke, SensorId::Gas]));

    let outcome = rig.dismiss.dismiss().await;
    assert!(outcome.disengaged);
    assert!(!outcome.reset_confirmed);
    assert!(outcome.reset_error.is_some());

    let view = rig.engine.view();
    assert!(view.alarms.is_empty());
    assert!(!view.engaged);
    assert_eq!(rig.haptics.stops(), 1);

    // The source still reports smoke: a fresh episode starts
    assert_eq!(rig.poll().await.transition(), Some(Transition::AlarmRaised));
    assert_eq!(rig.haptics.starts(), 2);

    let stats = rig.engine.stats().await;
    assert_eq!(stats.dismissals, 1);
    assert_eq!(stats.reset_failures, 1);

    let kinds: Vec<_> = rig
        .engine
        .history(10)
        .await
        .into_iter()
        .map(|e| e.kind)
        .collect();
    assert!(kinds.contains(&HistoryKind::Dismissed));
    assert!(kinds.contains(&HistoryKind::ResetFailed));
}

#[tokio::test]
async fn dismiss_with_confirmed_reset() {
    let rig = Rig::with_scope(DismissScope::All);
    rig.transport.report(Clear, Clear, Alert);
    rig.poll().await;

    let outcome = rig.dismiss.dismiss().await;
    assert!(outcome.disengaged);
    assert!(outcome.reset_confirmed);
    assert_eq!(outcome.reset_error, None);
    assert_eq!(rig.transport.resets.load(Ordering::SeqCst), 1);

    let view = rig.engine.view();
    assert!(view.snapshot.iter().all(|(_, status)| status == Clear));
}

#[tokio::test]
async fn dismiss_without_alarm_still_resets() {
    let rig = Rig::new();

    let outcome = rig.dismiss.dismiss().await;
    assert!(!outcome.disengaged);
    assert!(outcome.reset_confirmed);
    assert_eq!(rig.haptics.stops(), 0);
}

#[tokio::test]
async fn partial_report_keeps_absent_sensors() {
    let rig = Rig::new();
    rig.transport.report(Alert, Clear, Clear);
    rig.transport
        .push(Step::Report(vec![(SensorId::Gas, SensorStatus::Ok)]));

    rig.poll().await;
    assert_eq!(rig.poll().await.transition(), Some(Transition::None));

    let view = rig.engine.view();
    assert_eq!(view.snapshot.get(&SensorId::Smoke), Some(Alert));
    assert!(view.engaged);
}

#[tokio::test]
async fn dismiss_during_poll_discards_the_result() {
    let rig = Rig::new();
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    rig.transport.push(Step::Gated {
        sensors: statuses(Alert, Clear, Clear),
        started: started.clone(),
        release: release.clone(),
    });

    let engine = rig.engine.clone();
    let transport = rig.transport.clone();
    let pass = tokio::spawn(async move { engine.run_pass(transport.as_ref()).await });

    started.notified().await;
    rig.dismiss.dismiss().await;
    release.notify_one();

    let outcome = pass.await.unwrap();
    assert!(matches!(outcome, PassOutcome::Discarded));
    assert!(!rig.engine.view().engaged);
    assert_eq!(rig.haptics.starts(), 0);
    assert_eq!(rig.engine.stats().await.passes_discarded, 1);
}

#[tokio::test]
async fn poll_answered_before_reset_does_not_rearm() {
    let rig = Rig::new();
    rig.transport.report(Alert, Clear, Clear);
    assert_eq!(rig.poll().await.transition(), Some(Transition::AlarmRaised));

    let (reset_started, reset_release) = rig.transport.gate_reset();
    // Source has not processed the reset yet
    rig.transport.report(Alert, Clear, Clear);

    let dismiss = DismissController::new(
        rig.engine.clone(),
        rig.transport.clone(),
        DismissScope::Alarming,
    );
    let dismissing = tokio::spawn(async move { dismiss.dismiss().await });
    reset_started.notified().await;

    assert!(matches!(rig.poll().await, PassOutcome::Discarded));
    assert!(!rig.engine.view().engaged);

    reset_release.notify_one();
    let outcome = dismissing.await.unwrap();
    assert!(outcome.reset_confirmed);
    assert!(!rig.engine.view().engaged);
    assert!(!rig.engine.view().alarm_active());
    assert_eq!(rig.haptics.starts(), 1);
    assert_eq!(rig.engine.stats().await.passes_discarded, 1);

    rig.transport.report(Clear, Clear, Clear);
    assert_eq!(rig.poll().await.transition(), Some(Transition::None));
    assert_eq!(rig.haptics.starts(), 1);
}

#[tokio::test]
async fn poll_started_during_reset_is_discarded_after_it() {
    let rig = Rig::new();
    rig.transport.report(Clear, Alert, Clear);
    assert_eq!(rig.poll().await.transition(), Some(Transition::AlarmRaised));

    let (reset_started, reset_release) = rig.transport.gate_reset();
    let fetch_started = Arc::new(Notify::new());
    let fetch_release = Arc::new(Notify::new());
    rig.transport.push(Step::Gated {
        sensors: statuses(Clear, Alert, Clear),
        started: fetch_started.clone(),
        release: fetch_release.clone(),
    });

    let dismiss = DismissController::new(
        rig.engine.clone(),
        rig.transport.clone(),
        DismissScope::Alarming,
    );
    let dismissing = tokio::spawn(async move { dismiss.dismiss().await });
    reset_started.notified().await;

    let engine = rig.engine.clone();
    let transport = rig.transport.clone();
    let pass = tokio::spawn(async move { engine.run_pass(transport.as_ref()).await });
    fetch_started.notified().await;

    reset_release.notify_one();
    assert!(dismissing.await.unwrap().reset_confirmed);

    fetch_release.notify_one();
    assert!(matches!(pass.await.unwrap(), PassOutcome::Discarded));
    assert!(!rig.engine.view().engaged);
    assert_eq!(rig.haptics.starts(), 1);
}

#[tokio::test]
async fn refresh_while_pass_in_flight_is_skipped() {
    let rig = Rig::new();
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    rig.transport.push(Step::Gated {
        sensors: statuses(Clear, Clear, Clear),
        started: started.clone(),
        release: release.clone(),
    });

    let mut scheduler = rig.scheduler(&SentinelPolicy::with_interval(Duration::from_secs(60)));
    scheduler.activate();
    started.notified().await;

    assert!(matches!(scheduler.refresh().await, PassOutcome::Skipped));
    assert_eq!(rig.transport.fetches.load(Ordering::SeqCst), 1);

    release.notify_one();
    scheduler.deactivate().await;
    assert_eq!(rig.engine.stats().await.passes_skipped, 1);
}

#[tokio::test]
async fn completion_after_deactivate_is_ignored() {
    let rig = Rig::new();
    rig.transport.report(Clear, Clear, Clear);

    let mut scheduler = rig.scheduler(&SentinelPolicy::with_interval(Duration::from_secs(60)));
    let mut view = rig.engine.subscribe();
    scheduler.activate();
    view.changed().await.unwrap();

    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    rig.transport.push(Step::Gated {
        sensors: statuses(Alert, Clear, Clear),
        started: started.clone(),
        release: release.clone(),
    });

    let engine = rig.engine.clone();
    let transport = rig.transport.clone();
    let manual = tokio::spawn(async move { engine.try_run_pass(transport.as_ref()).await });

    started.notified().await;
    assert!(scheduler.deactivate().await);
    release.notify_one();

    assert!(matches!(manual.await.unwrap(), PassOutcome::Discarded));
    assert!(!rig.engine.view().engaged);
    assert_eq!(rig.haptics.starts(), 0);
}

#[tokio::test]
async fn teardown_disengage_releases_and_rearms_on_next_activation() {
    let rig = Rig::new();
    for _ in 0..2 {
        rig.transport.report(Alert, Clear, Clear);
    }
    let policy = SentinelPolicy::with_interval(Duration::from_secs(60));
    let mut scheduler = rig.scheduler(&policy);
    let mut view = rig.engine.subscribe();

    scheduler.activate();
    view.changed().await.unwrap();
    assert!(rig.engine.view().engaged);

    scheduler.deactivate().await;
    let after = rig.engine.view();
    assert!(!after.engaged);
    // Alarm state is left as last known
    assert_eq!(after.alarms, alarms(&[SensorId::Smoke]));
    assert_eq!(rig.haptics.stops(), 1);

    let _ = view.borrow_and_update();
    scheduler.activate();
    view.changed().await.unwrap();
    assert!(rig.engine.view().engaged);
    assert_eq!(rig.haptics.starts(), 2);
    scheduler.deactivate().await;
}

#[tokio::test]
async fn teardown_retain_keeps_vibration() {
    let rig = Rig::new();
    rig.transport.report(Clear, Alert, Clear);
    let policy = SentinelPolicy {
        teardown: TeardownPolicy::Retain,
        ..SentinelPolicy::with_interval(Duration::from_secs(60))
    };
    let mut scheduler = rig.scheduler(&policy);
    let mut view = rig.engine.subscribe();

    scheduler.activate();
    view.changed().await.unwrap();
    scheduler.deactivate().await;

    assert!(rig.engine.view().engaged);
    assert_eq!(rig.haptics.stops(), 0);
}

#[tokio::test]
async fn dropping_active_scheduler_applies_teardown() {
    let rig = Rig::new();
    rig.transport.report(Alert, Clear, Clear);
    let mut scheduler = rig.scheduler(&SentinelPolicy::with_interval(Duration::from_secs(60)));
    let mut view = rig.engine.subscribe();

    scheduler.activate();
    view.changed().await.unwrap();
    drop(scheduler);

    assert!(!rig.engine.view().engaged);
    assert_eq!(rig.haptics.stops(), 1);
}

#[tokio::test]
async fn dropping_engine_stops_vibration() {
    let haptics = Arc::new(RecordingHaptics::default());
    let transport = ScriptedTransport::default();
    transport.report(Clear, Clear, Alert);

    {
        let actuator = AlertActuator::new(haptics.clone(), VibrationPattern::default());
        let engine = AlertEngine::new(actuator, 10);
        engine.run_pass(&transport).await;
        assert_eq!(haptics.starts(), 1);
    }

    assert_eq!(haptics.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_source_never_overlaps_passes() {
    struct Slow {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl StatusTransport for Slow {
        async fn fetch_status(&self) -> Result<StatusReport, TransportError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.fetches.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(6000)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(to_report(statuses(Clear, Clear, Clear)))
        }

        async fn send_reset(&self) -> Result<(), TransportError> {
            Ok(())
        }

        fn endpoint(&self) -> String {
            "slow".to_string()
        }
    }

    let slow = Arc::new(Slow {
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
        fetches: AtomicUsize::new(0),
    });
    let engine = Arc::new(AlertEngine::new(AlertActuator::silent(), 10));
    let mut scheduler = PollScheduler::new(
        engine,
        slow.clone(),
        &SentinelPolicy::with_interval(Duration::from_millis(2500)),
    )
    .unwrap();

    scheduler.activate();
    tokio::time::sleep(Duration::from_secs(30)).await;
    scheduler.deactivate().await;

    assert_eq!(slow.max_in_flight.load(Ordering::SeqCst), 1);
    // Missed ticks are skipped rather than replayed back to back
    assert!(slow.fetches.load(Ordering::SeqCst) <= 6);
}
