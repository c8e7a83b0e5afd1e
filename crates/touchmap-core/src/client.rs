//! HTTP client for the on-device automation server.
//!
//! This module provides [`DeviceClient`], the [`AutomationDriver`]
//! implementation that speaks the JSON protocol defined in
//! [`crate::protocol`] over HTTP.
//!
//! # Example
//!
//! ```no_run
//! use touchmap_core::client::DeviceClient;
//! use touchmap_core::driver::AutomationDriver;
//! use touchmap_core::protocol::MapOperation;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DeviceClient::new("localhost:37265")?;
//! let buttons = client.map("button", &MapOperation::Query).await?;
//! println!("{} buttons on screen", buttons.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, debug_span, trace, Instrument};

use crate::driver::{AutomationDriver, DriverError};
use crate::protocol::{
    Envelope, MapOperation, MapRequest, PlayRequest, PlaybackOptions, MAP_PATH, PLAY_PATH,
    REQUEST_CONTENT_TYPE, SCREENSHOT_PATH, VERSION_PATH,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Timeout applied to every request unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// DeviceClient
// ---------------------------------------------------------------------------

/// HTTP client bound to one device server endpoint.
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: String,
}

/// Turns `host:port` (or a full URL) into a base URL without trailing slash.
fn base_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim().trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

fn http_error(err: reqwest::Error) -> DriverError {
    DriverError::Http(err.to_string())
}

fn decode_envelope(body: &str) -> Result<Envelope, DriverError> {
    serde_json::from_str(body).map_err(|e| DriverError::JsonParse(format!("{e}: {body}")))
}

fn status_reason(status: StatusCode) -> String {
    format!("device sent http status code {}", status.as_u16())
}

impl DeviceClient {
    /// Create a client for `endpoint` (`host:port` or a URL) with the
    /// default request timeout.
    pub fn new(endpoint: &str) -> Result<Self, DriverError> {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(http_error)?;
        Ok(Self {
            http,
            base_url: base_url(endpoint),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST a JSON body and return the status and the response text.
    async fn post_json(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<(StatusCode, String), DriverError> {
        let payload = serde_json::to_vec(body).map_err(|e| DriverError::JsonParse(e.to_string()))?;
        let url = self.url(path);
        trace!(%url, request_bytes = payload.len(), "sending request");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, REQUEST_CONTENT_TYPE)
            .body(payload)
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        let text = response.text().await.map_err(http_error)?;
        debug!(%url, status = status.as_u16(), response = %text, "response from device");
        Ok((status, text))
    }
}

#[async_trait]
impl AutomationDriver for DeviceClient {
    async fn map(&self, query: &str, operation: &MapOperation) -> Result<Vec<Value>, DriverError> {
        let span = debug_span!("device_map", method = operation.method_name());
        async {
            debug!(query, "map request");
            let (status, text) = self.post_json(MAP_PATH, &MapRequest::new(query, operation)).await?;

            if status != StatusCode::OK {
                return Err(DriverError::MapOperationFailed {
                    reason: status_reason(status),
                    details: text,
                });
            }

            let envelope = decode_envelope(&text)?;
            if !envelope.is_success() {
                return Err(DriverError::MapOperationFailed {
                    reason: envelope.reason,
                    details: envelope.details,
                });
            }
            Ok(envelope.results)
        }
        .instrument(span)
        .await
    }

    async fn play(&self, events: &str, options: &PlaybackOptions) -> Result<Envelope, DriverError> {
        let span = debug_span!("device_play", query = options.query.as_deref().unwrap_or(""));
        async {
            let request = PlayRequest {
                events: events.to_string(),
                options: options.clone(),
            };
            let (status, text) = self.post_json(PLAY_PATH, &request).await?;

            if status != StatusCode::OK {
                return Err(DriverError::PlaybackFailed {
                    reason: status_reason(status),
                    details: text,
                });
            }

            let envelope = decode_envelope(&text)?;
            if !envelope.is_success() {
                return Err(DriverError::PlaybackFailed {
                    reason: envelope.reason,
                    details: envelope.details,
                });
            }
            Ok(envelope)
        }
        .instrument(span)
        .await
    }

    async fn version(&self) -> Result<Value, DriverError> {
        let response = self
            .http
            .get(self.url(VERSION_PATH))
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DriverError::ServerUnavailable(status_reason(status)));
        }

        let text = response.text().await.map_err(http_error)?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        let response = self
            .http
            .get(self.url(SCREENSHOT_PATH))
            .send()
            .await
            .map_err(http_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DriverError::Http(format!("screenshot: {}", status_reason(status))));
        }

        let bytes = response.bytes().await.map_err(http_error)?;
        trace!(bytes = bytes.len(), "screenshot received");
        Ok(bytes.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
