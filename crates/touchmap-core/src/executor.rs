//! Action execution against the device.
//!
//! This module provides the [`ActionExecutor`] type, which dispatches
//! [`ActionType`]s onto a [`Gestures`] facade. It keeps the execution logic
//! out of the CLI so scripts and single commands share one code path, and it
//! attaches the facade's failure screenshot to the result.
//!
//! # Example
//!
//! ```no_run
//! use touchmap_core::action::ActionType;
//! use touchmap_core::executor::ActionExecutor;
//! use touchmap_core::recording::RecordingStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut executor = ActionExecutor::with_endpoint(
//!         "localhost:37265",
//!         RecordingStore::new(vec!["recordings".into()]),
//!     )
//!     .unwrap();
//!
//!     let result = executor
//!         .execute(ActionType::Touch { query: "button marked:'Login'".to_string() })
//!         .await;
//!
//!     if result.success {
//!         println!("Touched!");
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use tracing::{debug, info_span, Instrument};

use crate::action::ActionType;
use crate::client::DeviceClient;
use crate::driver::{wait_for_device, DriverError};
use crate::gestures::{GestureError, Gestures};
use crate::recording::RecordingStore;

/// Interval between device server probes in [`ActionType::WaitForDevice`].
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Result of executing an action.
///
/// Contains success/failure status along with optional data returned
/// by the action (query results, screenshot, server version).
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    /// Human-readable description of the result.
    pub message: String,
    /// Screenshot (base64-encoded PNG), either requested or captured on failure.
    pub screenshot: Option<String>,
    /// Additional data returned by the action, as JSON.
    pub data: Option<String>,
}

impl ExecutionResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            screenshot: None,
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            screenshot: None,
            data: None,
        }
    }

    pub fn with_screenshot(mut self, screenshot: String) -> Self {
        self.screenshot = Some(screenshot);
        self
    }

    pub fn with_data(mut self, data: String) -> Self {
        self.data = Some(data);
        self
    }
}

fn outcome(result: Result<(), GestureError>, message: impl FnOnce() -> String) -> ExecutionResult {
    match result {
        Ok(()) => ExecutionResult::success(message()),
        Err(e) => ExecutionResult::failure(e.to_string()),
    }
}

fn results_outcome(result: Result<Vec<serde_json::Value>, GestureError>, query: &str) -> ExecutionResult {
    match result {
        Ok(values) => match serde_json::to_string(&values) {
            Ok(json) => ExecutionResult::success(format!(
                "{} result(s) for '{}'",
                values.len(),
                query
            ))
            .with_data(json),
            Err(e) => ExecutionResult::failure(format!("JSON serialization error: {}", e)),
        },
        Err(e) => ExecutionResult::failure(e.to_string()),
    }
}

/// Executes actions through a [`Gestures`] facade.
///
/// The executor is the single owner of the facade, so the tracked device
/// orientation carries over between consecutive actions.
pub struct ActionExecutor {
    gestures: Gestures,
    poll_interval: Duration,
}

impl ActionExecutor {
    pub fn new(gestures: Gestures) -> Self {
        Self {
            gestures,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Convenience constructor: an executor talking HTTP to `endpoint`.
    pub fn with_endpoint(endpoint: &str, recordings: RecordingStore) -> Result<Self, DriverError> {
        let client = DeviceClient::new(endpoint)?;
        Ok(Self::new(Gestures::new(Arc::new(client), recordings)))
    }

    /// Enables or disables capturing a screenshot whenever an action fails.
    /// On by default.
    pub fn set_capture_screenshots(&mut self, enabled: bool) {
        self.gestures.set_capture_on_failure(enabled);
    }

    /// Also writes failure screenshots to `dir`.
    pub fn set_screenshot_dir(&mut self, dir: Option<PathBuf>) {
        self.gestures.set_screenshot_dir(dir);
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    pub fn gestures(&self) -> &Gestures {
        &self.gestures
    }

    pub fn gestures_mut(&mut self) -> &mut Gestures {
        &mut self.gestures
    }

    /// Executes an action and returns the result.
    ///
    /// Handles every [`ActionType`] except the simulator actions
    /// (`StartSimulator`, `StopSimulator`), which should be handled by the
    /// caller since they manage a local process.
    pub async fn execute(&mut self, action: ActionType) -> ExecutionResult {
        let action_name = action.name();
        let span = info_span!("execute_action", action = action_name);
        async {
            let start = Instant::now();
            // Drop a capture left over from a failure outside `execute`.
            self.gestures.take_failure_screenshot();
            let mut result = self.execute_inner(action).await;
            if !result.success {
                if let Some(bytes) = self.gestures.take_failure_screenshot() {
                    result = result.with_screenshot(base64::engine::general_purpose::STANDARD.encode(&bytes));
                }
            }
            let elapsed = start.elapsed();
            debug!(elapsed_ms = elapsed.as_millis() as u64, success = result.success, "action complete");
            result
        }
        .instrument(span)
        .await
    }

    async fn execute_inner(&mut self, action: ActionType) -> ExecutionResult {
        let g = &mut self.gestures;
        match action {
            ActionType::Touch { ref query } => {
                outcome(g.touch(query).await, || format!("Touched '{}'", query))
            }

            ActionType::TouchPosition { x, y } => {
                if x < 0.0 || y < 0.0 {
                    return ExecutionResult::failure(format!(
                        "Coordinates must be non-negative (got x={}, y={})",
                        x, y
                    ));
                }
                outcome(g.touch_position(x, y).await, || format!("Touched at ({}, {})", x, y))
            }

            ActionType::Swipe { direction } => {
                outcome(g.swipe(direction).await, || format!("Swiped {}", direction))
            }

            ActionType::Rotate { direction } => {
                let result = g.rotate(direction).await;
                let orientation = g.current_orientation();
                outcome(result, || format!("Rotated {} to {}°", direction, orientation))
            }

            ActionType::RotateTo { degrees, direction } => {
                let result = g.rotate_to(degrees, direction).await;
                let orientation = g.current_orientation();
                outcome(result, || format!("Rotated {} to {}°", direction, orientation))
            }

            ActionType::Pinch { direction, ref query } => {
                outcome(g.pinch(direction, query.as_deref()).await, || match query {
                    Some(q) => format!("Pinched {} on '{}'", direction, q),
                    None => format!("Pinched {}", direction),
                })
            }

            ActionType::Scroll { ref query, direction } => {
                outcome(g.scroll(query, direction).await, || {
                    format!("Scrolled '{}' {}", query, direction)
                })
            }

            ActionType::SetText { ref query, ref value } => {
                outcome(g.set_text(query, value).await, || {
                    format!("Set text of '{}' to '{}'", query, value)
                })
            }

            ActionType::Query { ref query } => results_outcome(g.query(query).await, query),

            ActionType::QueryAll { ref query } => results_outcome(g.query_all(query).await, query),

            ActionType::ScreenShouldContain { ref label } => {
                outcome(g.screen_should_contain(label).await, || {
                    format!("Screen contains '{}'", label)
                })
            }

            ActionType::ScreenShouldContainText { ref text } => {
                outcome(g.screen_should_contain_text(text).await, || {
                    format!("Screen contains text '{}'", text)
                })
            }

            ActionType::ScreenShouldContainQuery { ref query } => {
                outcome(g.screen_should_contain_query(query).await, || {
                    format!("Screen contains '{}'", query)
                })
            }

            ActionType::ScreenShouldNotContain { ref label } => {
                outcome(g.screen_should_not_contain(label).await, || {
                    format!("Screen does not contain '{}'", label)
                })
            }

            ActionType::WebviewShouldContainText { ref text } => {
                outcome(g.webview_should_contain_text(text).await, || {
                    format!("Web view contains text '{}'", text)
                })
            }

            ActionType::WebviewShouldContainElement { ref selector } => {
                outcome(g.webview_should_contain_element(selector).await, || {
                    format!("Web view contains '{}'", selector)
                })
            }

            ActionType::Screenshot => match g.screenshot().await {
                Ok(bytes) => {
                    let b64 = base64::engine::general_purpose::STANDARD.encode(&bytes);
                    ExecutionResult::success("Screenshot captured")
                        .with_screenshot(b64.clone())
                        .with_data(b64)
                }
                Err(e) => ExecutionResult::failure(e.to_string()),
            },

            ActionType::WaitForDevice { timeout_ms } => {
                let timeout = Duration::from_millis(timeout_ms);
                match wait_for_device(g.driver().as_ref(), timeout, self.poll_interval).await {
                    Ok(version) => ExecutionResult::success("Device server is available")
                        .with_data(version.to_string()),
                    Err(e) => ExecutionResult::failure(e.to_string()),
                }
            }

            ActionType::LogComment { ref message } => {
                ExecutionResult::success(format!("Logged: {}", message))
            }

            ActionType::StartSimulator { .. } | ActionType::StopSimulator => {
                ExecutionResult::failure("Simulator actions must be handled by the caller")
            }
        }
    }
}
