//! Poll Scheduler
//!
//! Drives the engine on a fixed interval from a spawned task while active.

use crate::engine::{AlertEngine, PassOutcome};
use crate::error::SentinelError;
use crate::policy::{SentinelPolicy, TeardownPolicy};
use homewatch_connect::StatusTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

struct Session {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic poller bound to one engine and one transport
///
/// The first pass runs immediately on [`activate`](Self::activate), then
/// one per interval. Ticks missed while a pass is slow are skipped, so
/// passes never pile up.
///
/// Dropping an active scheduler stops the task and applies the teardown
/// policy; if the engine is busy at that moment the teardown runs on a
/// spawned task instead. Outside a runtime it is skipped, so prefer
/// [`deactivate`](Self::deactivate).
///
/// ```no_run
/// # use homewatch_sentinel::{AlertActuator, AlertEngine, PollScheduler, SentinelPolicy};
/// # use homewatch_connect::{HttpTransport, HttpTransportConfig};
/// # use std::sync::Arc;
/// # async fn example() -> anyhow::Result<()> {
/// let policy = SentinelPolicy::default();
/// let engine = Arc::new(AlertEngine::new(AlertActuator::silent(), policy.history_capacity));
/// let transport = Arc::new(HttpTransport::new(HttpTransportConfig::default())?);
///
/// let mut scheduler = PollScheduler::new(engine.clone(), transport, &policy)?;
/// scheduler.activate();
/// // ...
/// scheduler.deactivate().await;
/// # Ok(())
/// # }
/// ```
pub struct PollScheduler {
    engine: Arc<AlertEngine>,
    transport: Arc<dyn StatusTransport>,
    interval: Duration,
    teardown: TeardownPolicy,
    session: Option<Session>,
}

impl PollScheduler {
    pub fn new(
        engine: Arc<AlertEngine>,
        transport: Arc<dyn StatusTransport>,
        policy: &SentinelPolicy,
    ) -> Result<Self, SentinelError> {
        policy.validate().map_err(SentinelError::InvalidPolicy)?;

        Ok(Self {
            engine,
            transport,
            interval: policy.poll_interval(),
            teardown: policy.teardown,
            session: None,
        })
    }

    pub fn engine(&self) -> &Arc<AlertEngine> {
        &self.engine
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Start polling. Must be called from within a tokio runtime.
    ///
    /// Returns `false` if already active.
    pub fn activate(&mut self) -> bool {
        if self.session.is_some() {
            debug!("Scheduler already active");
            return false;
        }

        info!(
            "🛰️  Polling {} every {}ms",
            self.transport.endpoint(),
            self.interval.as_millis()
        );

        let token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            self.engine.clone(),
            self.transport.clone(),
            self.interval,
            token.clone(),
        ));
        self.session = Some(Session { token, handle });
        true
    }

    /// Stop polling and apply the teardown policy
    ///
    /// Waits for the poll task to exit. Any pass still in flight elsewhere
    /// is discarded. Returns `false` if the scheduler was not active.
    pub async fn deactivate(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };

        session.token.cancel();
        if let Err(e) = session.handle.await {
            if e.is_panic() {
                warn!("Poll task panicked: {}", e);
            }
        }

        self.engine.end_session(self.teardown).await;
        info!("Polling stopped");
        true
    }

    /// Run a pass now unless one is already in flight
    pub async fn refresh(&self) -> PassOutcome {
        self.engine.try_run_pass(self.transport.as_ref()).await
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.token.cancel();
            session.handle.abort();
            self.engine.end_session_detached(self.teardown);
        }
    }
}

async fn poll_loop(
    engine: Arc<AlertEngine>,
    transport: Arc<dyn StatusTransport>,
    period: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            outcome = engine.run_pass(transport.as_ref()) => {
                trace!(?outcome, "Scheduled pass finished");
            }
        }
    }

    debug!("Poll loop exited");
}
