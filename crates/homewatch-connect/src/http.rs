//! HttpTransport: the status source over HTTP
//!
//! | Operation      | Request                         | Success        |
//! |----------------|---------------------------------|----------------|
//! | `fetch_status` | `GET  <base>/status`            | 2xx + object   |
//! | `send_reset`   | `POST <base>/reset`             | 2xx            |
//! | `trigger`      | `POST <base>/trigger` `{sensor, value}` | 2xx    |

use crate::error::TransportError;
use crate::transport::StatusTransport;
use crate::wire::{parse_status_body, StatusReport};
use async_trait::async_trait;
use homewatch_core_sensors::{SensorId, SensorStatus};
use reqwest::{Client, Response, Url};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL of the status source, e.g. `http://127.0.0.1:5000`
    pub base_url: String,

    /// Upper bound for a whole exchange, body included
    pub timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout: Duration::from_millis(2000),
        }
    }
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("timeout must be greater than 0".to_string());
        }
        resolve_base(&self.base_url).map(|_| ())
    }
}

#[derive(Serialize)]
struct TriggerRequest<'a> {
    sensor: &'a str,
    value: &'a str,
}

/// HTTP implementation of [`StatusTransport`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
    status_url: Url,
    reset_url: Url,
    trigger_url: Url,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport for the given configuration
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let base = resolve_base(&config.base_url).map_err(|reason| TransportError::InvalidUrl {
            url: config.base_url.clone(),
            reason,
        })?;

        let join = |path: &str| {
            base.join(path).map_err(|e| TransportError::InvalidUrl {
                url: config.base_url.clone(),
                reason: e.to_string(),
            })
        };
        let status_url = join("status")?;
        let reset_url = join("reset")?;
        let trigger_url = join("trigger")?;

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {}", e)))?;

        debug!(base = %base, timeout_ms = config.timeout.as_millis() as u64, "HTTP transport ready");

        Ok(Self {
            client,
            base,
            status_url,
            reset_url,
            trigger_url,
            timeout: config.timeout,
        })
    }

    /// Base URL this transport talks to
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Force a sensor to a status at the source
    ///
    /// Simulation helper for the backend's `/trigger` endpoint; the engine
    /// never calls it.
    pub async fn trigger(&self, sensor: &SensorId, status: SensorStatus) -> Result<(), TransportError> {
        if status == SensorStatus::Unknown {
            return Err(TransportError::Request(
                "only OK or ALERT can be sent to the source".to_string(),
            ));
        }

        let body = TriggerRequest {
            sensor: sensor.wire_key(),
            value: status.as_str(),
        };
        let url = self.trigger_url.clone();

        info!(sensor = %sensor, status = %status, "Sending trigger to status source");
        let response = self
            .exchange(&url, self.client.post(url.clone()).json(&body).send())
            .await?;
        ensure_success(&url, &response)
    }

    /// Run one request under the transport's timeout
    async fn exchange<F>(&self, url: &Url, request: F) -> Result<Response, TransportError>
    where
        F: Future<Output = Result<Response, reqwest::Error>>,
    {
        let timeout_ms = self.timeout.as_millis() as u64;
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(TransportError::from_reqwest(url.as_str(), timeout_ms, e)),
            Err(_) => Err(TransportError::Timeout {
                url: url.to_string(),
                timeout_ms,
            }),
        }
    }
}

#[async_trait]
impl StatusTransport for HttpTransport {
    async fn fetch_status(&self) -> Result<StatusReport, TransportError> {
        let url = &self.status_url;
        let timeout_ms = self.timeout.as_millis() as u64;

        let exchange = async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return Err(TransportError::from_reqwest(url.as_str(), timeout_ms, e)),
            Err(_) => {
                return Err(TransportError::Timeout {
                    url: url.to_string(),
                    timeout_ms,
                })
            }
        };

        if !status.is_success() {
            return Err(TransportError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        parse_status_body(&body)
    }

    async fn send_reset(&self) -> Result<(), TransportError> {
        let url = self.reset_url.clone();
        let response = self
            .exchange(&url, self.client.post(url.clone()).send())
            .await?;
        ensure_success(&url, &response)
    }

    fn endpoint(&self) -> String {
        self.base.to_string()
    }
}

fn ensure_success(url: &Url, response: &Response) -> Result<(), TransportError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(TransportError::HttpStatus {
            url: url.to_string(),
            status: response.status().as_u16(),
        })
    }
}

/// Parse a base URL so that relative joins append rather than replace
fn resolve_base(base_url: &str) -> Result<Url, String> {
    let mut url = Url::parse(base_url.trim()).map_err(|e| e.to_string())?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
