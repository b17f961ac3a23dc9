//! Dismiss Controller
//!
//! Handles the user's "dismiss alarm" action: clear locally and stop the
//! vibration first, then ask the backend to reset.

use crate::engine::AlertEngine;
use crate::policy::DismissScope;
use homewatch_connect::StatusTransport;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// What a dismiss did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DismissOutcome {
    /// The vibration was running and has been stopped
    pub disengaged: bool,

    /// The backend acknowledged the reset
    pub reset_confirmed: bool,

    /// Why the reset failed, if it did
    pub reset_error: Option<String>,
}

pub struct DismissController {
    engine: Arc<AlertEngine>,
    transport: Arc<dyn StatusTransport>,
    scope: DismissScope,
}

impl DismissController {
    pub fn new(
        engine: Arc<AlertEngine>,
        transport: Arc<dyn StatusTransport>,
        scope: DismissScope,
    ) -> Self {
        Self {
            engine,
            transport,
            scope,
        }
    }

    pub fn scope(&self) -> DismissScope {
        self.scope
    }

    /// Dismiss the current alarm
    ///
    /// The local clear always happens, even when the reset fails. Polls
    /// that overlap the reset are discarded; the next successful poll after
    /// it is authoritative either way.
    pub async fn dismiss(&self) -> DismissOutcome {
        let _window = self.engine.reset_window();
        let disengaged = self.engine.dismiss_locally(self.scope).await;

        let result = self.transport.send_reset().await;
        match &result {
            Ok(()) => info!("Reset acknowledged by {}", self.transport.endpoint()),
            Err(e) => warn!("Reset failed, alarm cleared locally only: {}", e),
        }
        self.engine.record_reset_result(&result).await;

        DismissOutcome {
            disengaged,
            reset_confirmed: result.is_ok(),
            reset_error: result.err().map(|e| e.to_string()),
        }
    }
}
