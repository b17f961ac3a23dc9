//! The `StatusTransport` trait
//!
//! Abstracts the remote status source so the engine can run against:
//! - **HttpTransport**: the real backend over HTTP
//! - scripted fakes in tests

use crate::error::TransportError;
use crate::wire::StatusReport;
use async_trait::async_trait;
use std::sync::Arc;

/// One-shot exchanges with the status source
///
/// Implementations perform exactly one exchange per call, apply their own
/// bounded timeout, and never retry: retry policy belongs to the scheduler.
#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// Fetch the current per-sensor status
    async fn fetch_status(&self) -> Result<StatusReport, TransportError>;

    /// Ask the source to clear all alarms
    async fn send_reset(&self) -> Result<(), TransportError>;

    /// Where this transport points, for log lines
    fn endpoint(&self) -> String;
}

#[async_trait]
impl<T: StatusTransport + ?Sized> StatusTransport for Arc<T> {
    async fn fetch_status(&self) -> Result<StatusReport, TransportError> {
        (**self).fetch_status().await
    }

    async fn send_reset(&self) -> Result<(), TransportError> {
        (**self).send_reset().await
    }

    fn endpoint(&self) -> String {
        (**self).endpoint()
    }
}
