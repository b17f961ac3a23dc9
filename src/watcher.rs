/*!
 * Watcher: one engine, its scheduler and its dismiss controller, wired
 * from a `WatchConfig`
 */

use homewatch_connect::{HttpTransport, StatusTransport};
use homewatch_core_sensors::HistoryEntry;
use homewatch_sentinel::{
    AlertActuator, AlertEngine, DismissController, DismissOutcome, EngineView, PassOutcome,
    PollScheduler, PollStats,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::config::WatchConfig;
use crate::error::Result;
use crate::haptics::build_actuator;

pub struct Watcher {
    engine: Arc<AlertEngine>,
    scheduler: PollScheduler,
    dismiss: DismissController,
    endpoint: String,
}

impl Watcher {
    /// Validate `config` and build a watcher against the HTTP status source
    pub fn from_config(config: &WatchConfig) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(config.transport_config())?);
        Self::with_transport(config, transport, build_actuator(&config.vibration))
    }

    /// Build a watcher around any transport and actuator
    pub fn with_transport(
        config: &WatchConfig,
        transport: Arc<dyn StatusTransport>,
        actuator: AlertActuator,
    ) -> Result<Self> {
        let policy = config.sentinel_policy();
        let engine = Arc::new(AlertEngine::new(actuator, policy.history_capacity));
        let scheduler = PollScheduler::new(engine.clone(), transport.clone(), &policy)?;
        let endpoint = transport.endpoint();
        let dismiss = DismissController::new(engine.clone(), transport, policy.dismiss_scope);

        debug!(endpoint = %endpoint, ?policy, "Watcher ready");

        Ok(Self {
            engine,
            scheduler,
            dismiss,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineView> {
        self.engine.subscribe()
    }

    pub fn view(&self) -> EngineView {
        self.engine.view()
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Start background polling; `false` if already running
    pub fn activate(&mut self) -> bool {
        self.scheduler.activate()
    }

    /// Stop background polling; `false` if it was not running
    pub async fn deactivate(&mut self) -> bool {
        self.scheduler.deactivate().await
    }

    /// Poll once now unless a poll is in flight
    pub async fn refresh(&self) -> PassOutcome {
        self.scheduler.refresh().await
    }

    pub async fn dismiss(&self) -> DismissOutcome {
        self.dismiss.dismiss().await
    }

    pub async fn history(&self, n: usize) -> Vec<HistoryEntry> {
        self.engine.history(n).await
    }

    pub async fn stats(&self) -> PollStats {
        self.engine.stats().await
    }
}
