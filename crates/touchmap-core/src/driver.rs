//! Automation driver trait for talking to the on-device server.
//!
//! This module defines the [`AutomationDriver`] trait, the seam between the
//! gesture facade and the transport. [`crate::client::DeviceClient`] is the
//! HTTP implementation; tests substitute scripted drivers.
//!
//! The driver never retries. Callers that need to wait for the server to come
//! up (after launching the simulator, say) poll it with [`wait_for_device`].

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::protocol::{Envelope, MapOperation, PlaybackOptions};

/// Errors that can occur while talking to the device server.
#[derive(Error, Debug)]
pub enum DriverError {
    /// `/map` answered with a non-success outcome or HTTP status.
    #[error("Map operation failed: {reason}\n{details}")]
    MapOperationFailed { reason: String, details: String },

    /// `/play` answered with a non-success outcome or HTTP status.
    #[error("Playback failed: {reason}\n{details}")]
    PlaybackFailed { reason: String, details: String },

    /// `/version` did not answer with 200.
    #[error("Device server unavailable: {0}")]
    ServerUnavailable(String),

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The response body was not a valid envelope.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

/// Backend-agnostic access to the device server.
///
/// Each method performs exactly one request and returns once its response
/// has been received.
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Runs `operation` on every element matching `query` and returns the
    /// per-element results.
    async fn map(&self, query: &str, operation: &MapOperation) -> Result<Vec<Value>, DriverError>;

    /// Replays a base64-encoded event recording and returns the decoded
    /// response.
    async fn play(&self, events: &str, options: &PlaybackOptions) -> Result<Envelope, DriverError>;

    /// Fetches the server version, failing if the server is not ready.
    async fn version(&self) -> Result<Value, DriverError>;

    /// Captures the current screen as encoded image bytes.
    async fn screenshot(&self) -> Result<Vec<u8>, DriverError>;

    /// Returns `true` if the server answers the version probe.
    async fn is_available(&self) -> bool {
        self.version().await.is_ok()
    }
}

/// Polls [`AutomationDriver::version`] until the server answers or `timeout`
/// elapses.
///
/// # Errors
///
/// - [`DriverError::ServerUnavailable`] carrying the last failure once the
///   deadline passes
pub async fn wait_for_device(
    driver: &dyn AutomationDriver,
    timeout: Duration,
    interval: Duration,
) -> Result<Value, DriverError> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match driver.version().await {
            Ok(version) => {
                debug!(attempts, "device server is available");
                return Ok(version);
            }
            Err(e) => {
                if tokio::time::Instant::now() >= deadline {
                    return Err(DriverError::ServerUnavailable(format!(
                        "no answer after {} attempts in {}ms: {}",
                        attempts,
                        timeout.as_millis(),
                        e
                    )));
                }
                debug!(attempts, error = %e, "device server not ready");
            }
        }
        tokio::time::sleep(interval).await;
    }
}
