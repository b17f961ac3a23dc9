//! Error types for the homewatch-connect crate

use thiserror::Error;

/// Failure of a single exchange with the status source
///
/// Every variant is recoverable: the scheduler turns it into
/// `DISCONNECTED` and tries again on the next tick.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Status source unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Status source returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed status response: {0}")]
    MalformedResponse(String),

    #[error("Invalid base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Check if the exchange ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }

    /// Short machine-readable label for logs and history entries
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout { .. } => "timeout",
            TransportError::Unreachable { .. } => "unreachable",
            TransportError::HttpStatus { .. } => "http_status",
            TransportError::MalformedResponse(_) => "malformed_response",
            TransportError::InvalidUrl { .. } => "invalid_url",
            TransportError::Request(_) => "request",
        }
    }

    /// Classify a reqwest error raised while talking to `url`
    pub(crate) fn from_reqwest(url: &str, timeout_ms: u64, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout_ms,
            }
        } else if err.is_connect() {
            TransportError::Unreachable {
                url: url.to_string(),
                reason: err.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            TransportError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            TransportError::Request(err.to_string())
        }
    }
}
