//! Homewatch Connect: client-side connectivity to the status source
//!
//! This crate performs the network exchanges of Homewatch and nothing else.
//! Each call is a single request with a bounded timeout; every failure comes
//! back as a [`TransportError`] value, never as a panic.
//!
//! # Architecture
//!
//! - **StatusTransport**: trait the engine polls through (`fetch_status`, `send_reset`)
//! - **HttpTransport**: `reqwest` implementation against the backend's HTTP API
//! - **wire**: decoding of the `/status` payload into a [`StatusReport`]
//!
//! # Example
//!
//! ```rust,no_run
//! use homewatch_connect::{HttpTransport, HttpTransportConfig, StatusTransport};
//! use std::time::Duration;
//!
//! async fn example() -> anyhow::Result<()> {
//!     let transport = HttpTransport::new(HttpTransportConfig::new(
//!         "http://127.0.0.1:5000",
//!         Duration::from_secs(2),
//!     ))?;
//!
//!     let report = transport.fetch_status().await?;
//!     for (sensor, status) in report.sensors.iter() {
//!         println!("{}: {}", sensor.display_name(), status);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod transport;
pub mod wire;

pub use error::TransportError;
pub use http::{HttpTransport, HttpTransportConfig};
pub use transport::StatusTransport;
pub use wire::{parse_status_body, StatusReport};
