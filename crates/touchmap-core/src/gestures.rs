//! High-level gesture, query and assertion vocabulary.
//!
//! [`Gestures`] is the public face of the crate: every action a test can
//! take is a method here, expressed in terms of two device primitives,
//! `map` (query + operation) and `play` (recorded gesture playback).
//!
//! The facade owns the only piece of state in the system, the current
//! device orientation, so that swipes can be compensated for rotation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use touchmap_core::client::DeviceClient;
//! use touchmap_core::gestures::Gestures;
//! use touchmap_core::orientation::{Orientation, RotationDirection};
//! use touchmap_core::recording::RecordingStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(DeviceClient::new("localhost:37265")?);
//! let mut gestures = Gestures::new(client, RecordingStore::new(vec!["recordings".into()]));
//!
//! gestures.touch("button marked:'Login'").await?;
//! gestures.set_text("textField", "ada@example.com").await?;
//! gestures.rotate(RotationDirection::Left).await?;
//! gestures.swipe(Orientation::Up).await?;
//! gestures.screen_should_contain_text("Welcome").await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::driver::{AutomationDriver, DriverError};
use crate::element::result_contains_text;
use crate::orientation::{
    reduce_degrees, rotation_recording, swipe_recording, Orientation, OrientationError,
    RotationDirection,
};
use crate::protocol::{Envelope, MapOperation, PlaybackOptions, ScrollDirection};
use crate::recording::{RecordingError, RecordingOptions, RecordingStore};

/// Query matching the document body of every web view.
const WEBVIEW_BODY_QUERY: &str = "webView css:'body'";

/// Errors surfaced by facade actions.
#[derive(Error, Debug)]
pub enum GestureError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Recording(#[from] RecordingError),

    #[error(transparent)]
    Orientation(#[from] OrientationError),

    /// The action needed at least one matching element and found none.
    #[error("No element found for query: {0}")]
    ElementNotFound(String),

    /// An expectation about the screen did not hold.
    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pinch gesture direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinchDirection {
    In,
    Out,
}

impl PinchDirection {
    pub fn recording_name(self) -> &'static str {
        match self {
            PinchDirection::In => "pinch_in",
            PinchDirection::Out => "pinch_out",
        }
    }
}

impl fmt::Display for PinchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PinchDirection::In => "in",
            PinchDirection::Out => "out",
        })
    }
}

impl FromStr for PinchDirection {
    type Err = OrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(PinchDirection::In),
            "out" => Ok(PinchDirection::Out),
            _ => Err(OrientationError::InvalidDirection {
                given: s.to_string(),
                expected: "in, out",
            }),
        }
    }
}

/// Escapes single quotes so `text` can sit inside a quoted query literal.
pub fn escape_quotes(text: &str) -> String {
    text.replace('\'', "\\'")
}

/// Query for views whose accessibility label or id is `label`.
pub fn marked_query(label: &str) -> String {
    format!("view marked:'{}'", escape_quotes(label))
}

/// Query for views whose text is exactly `text`.
pub fn text_query(text: &str) -> String {
    format!("view {{text == '{}'}}", escape_quotes(text))
}

/// Query for web view nodes matching a CSS selector.
pub fn css_query(selector: &str) -> String {
    format!("webView css:'{}'", escape_quotes(selector))
}

/// Gesture and query facade bound to one device.
///
/// When an action or assertion fails, the facade captures a screenshot
/// before returning the error (see [`set_capture_on_failure`]). The capture
/// is kept until [`take_failure_screenshot`] collects it.
///
/// [`set_capture_on_failure`]: Self::set_capture_on_failure
/// [`take_failure_screenshot`]: Self::take_failure_screenshot
pub struct Gestures {
    driver: Arc<dyn AutomationDriver>,
    recordings: RecordingStore,
    recording_options: RecordingOptions,
    /// Current orientation in degrees, always within `[0, 360)`.
    current_orientation: i32,
    capture_on_failure: bool,
    screenshot_dir: Option<PathBuf>,
    failure_screenshot: Mutex<Option<Vec<u8>>>,
}

impl Gestures {
    /// Creates a facade starting in the upright (0°) orientation, with
    /// failure screenshots enabled.
    pub fn new(driver: Arc<dyn AutomationDriver>, recordings: RecordingStore) -> Self {
        Self {
            driver,
            recordings,
            recording_options: RecordingOptions::default(),
            current_orientation: 0,
            capture_on_failure: true,
            screenshot_dir: None,
            failure_screenshot: Mutex::new(None),
        }
    }

    /// Selects the OS/device family recordings are resolved for.
    pub fn with_recording_options(mut self, options: RecordingOptions) -> Self {
        self.recording_options = options;
        self
    }

    /// Starts tracking from a known orientation instead of upright.
    pub fn with_orientation(mut self, degrees: i32) -> Self {
        self.current_orientation = reduce_degrees(degrees);
        self
    }

    /// Enables or disables the screenshot taken when an action fails.
    pub fn set_capture_on_failure(&mut self, enabled: bool) {
        self.capture_on_failure = enabled;
    }

    pub fn capture_on_failure(&self) -> bool {
        self.capture_on_failure
    }

    /// Also writes failure screenshots to `dir` as `ios-screenshot-N.png`.
    pub fn set_screenshot_dir(&mut self, dir: Option<PathBuf>) {
        self.screenshot_dir = dir;
    }

    /// Returns the screenshot captured by the last failed action, if any,
    /// and clears it.
    pub fn take_failure_screenshot(&self) -> Option<Vec<u8>> {
        self.failure_screenshot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }

    pub fn driver(&self) -> &Arc<dyn AutomationDriver> {
        &self.driver
    }

    pub fn recordings(&self) -> &RecordingStore {
        &self.recordings
    }

    /// Current orientation in degrees.
    pub fn current_orientation(&self) -> i32 {
        self.current_orientation
    }

    /// Captures the screen when `result` is an error, then hands `result`
    /// back unchanged. A capture that fails is logged and dropped.
    async fn on_failure<T>(&self, result: Result<T, GestureError>) -> Result<T, GestureError> {
        if let Err(ref error) = result {
            if self.capture_on_failure {
                debug!(%error, "action failed, capturing screenshot");
                match self.driver.screenshot().await {
                    Ok(bytes) => {
                        if let Some(ref dir) = self.screenshot_dir {
                            if let Err(e) = save_screenshot(&bytes, dir) {
                                warn!(error = %e, dir = %dir.display(), "could not save failure screenshot");
                            }
                        }
                        *self
                            .failure_screenshot
                            .lock()
                            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(bytes);
                    }
                    Err(e) => warn!(error = %e, "could not capture failure screenshot"),
                }
            }
        }
        result
    }

    // -----------------------------------------------------------------------
    // Primitives
    // -----------------------------------------------------------------------

    /// Loads the recording for `gesture` and plays it back.
    ///
    /// Primitives never capture failure screenshots.
    pub async fn playback(
        &self,
        gesture: &str,
        options: &PlaybackOptions,
    ) -> Result<Envelope, GestureError> {
        let recording = self.recordings.load(gesture, &self.recording_options)?;
        debug!(gesture, path = %recording.path.display(), "playing back recording");
        Ok(self.driver.play(&recording.events, options).await?)
    }

    /// Runs a map operation on every element matching `query`.
    pub async fn map(&self, query: &str, operation: &MapOperation) -> Result<Vec<Value>, GestureError> {
        Ok(self.driver.map(query, operation).await?)
    }

    async fn find(&self, query: &str) -> Result<bool, GestureError> {
        Ok(!self.map(query, &MapOperation::Query).await?.is_empty())
    }

    // -----------------------------------------------------------------------
    // Touch and gestures
    // -----------------------------------------------------------------------

    /// Touches the first element matching `query`.
    pub async fn touch(&self, query: &str) -> Result<(), GestureError> {
        let result = self.playback("touch", &PlaybackOptions::default().with_query(query)).await;
        self.on_failure(result.map(drop)).await
    }

    /// Touches an absolute screen position.
    pub async fn touch_position(&self, x: f64, y: f64) -> Result<(), GestureError> {
        let result = self.playback("touch", &PlaybackOptions::default().with_offset(x, y)).await;
        self.on_failure(result.map(drop)).await
    }

    /// Swipes in an on-screen direction, compensating for device rotation.
    pub async fn swipe(&self, direction: Orientation) -> Result<(), GestureError> {
        let result = async {
            let gesture = swipe_recording(self.current_orientation, direction)?;
            debug!(%direction, orientation = self.current_orientation, gesture = %gesture, "swipe");
            self.playback(&gesture, &PlaybackOptions::default()).await?;
            Ok::<_, GestureError>(())
        }
        .await;
        self.on_failure(result).await
    }

    /// Turns the device a quarter turn.
    pub async fn rotate(&mut self, direction: RotationDirection) -> Result<(), GestureError> {
        let target = self.current_orientation + direction.step();
        let result = self.turn(target, direction).await;
        self.on_failure(result).await
    }

    /// Turns the device to `target_degrees`, travelling in `direction`.
    ///
    /// The tracked orientation only changes once the playback succeeded.
    pub async fn rotate_to(
        &mut self,
        target_degrees: i32,
        direction: RotationDirection,
    ) -> Result<(), GestureError> {
        let result = self.turn(target_degrees, direction).await;
        self.on_failure(result).await
    }

    async fn turn(&mut self, target_degrees: i32, direction: RotationDirection) -> Result<(), GestureError> {
        // Off-axis targets fail here, before the device is touched.
        let gesture = rotation_recording(target_degrees, direction)?;
        self.playback(&gesture, &PlaybackOptions::default()).await?;
        self.current_orientation = reduce_degrees(target_degrees);
        info!(orientation = self.current_orientation, %direction, "rotated");
        Ok(())
    }

    /// Pinches in or out, on `query` if given or at the screen centre.
    pub async fn pinch(&self, direction: PinchDirection, query: Option<&str>) -> Result<(), GestureError> {
        let result = async {
            let options = match query {
                Some(q) => PlaybackOptions::default().with_query(q),
                None => PlaybackOptions::default(),
            };
            let envelope = self.playback(direction.recording_name(), &options).await?;
            match query {
                Some(q) if envelope.results.is_empty() => Err(GestureError::ElementNotFound(q.to_string())),
                _ => Ok(()),
            }
        }
        .await;
        self.on_failure(result).await
    }

    /// Scrolls every scroll view matching `query`.
    pub async fn scroll(&self, query: &str, direction: ScrollDirection) -> Result<(), GestureError> {
        let result = async {
            let results = self.map(query, &MapOperation::Scroll(direction)).await?;
            if results.is_empty() {
                return Err(GestureError::ElementNotFound(query.to_string()));
            }
            Ok(())
        }
        .await;
        self.on_failure(result).await
    }

    /// Replaces the text of every text input matching `query`.
    pub async fn set_text(&self, query: &str, value: &str) -> Result<(), GestureError> {
        let result = async {
            let results = self.map(query, &MapOperation::SetText(value.to_string())).await?;
            if results.is_empty() {
                return Err(GestureError::ElementNotFound(query.to_string()));
            }
            debug!(query, modified = results.len(), "text set");
            Ok(())
        }
        .await;
        self.on_failure(result).await
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn query(&self, query: &str) -> Result<Vec<Value>, GestureError> {
        let result = self.map(query, &MapOperation::Query).await;
        self.on_failure(result).await
    }

    /// Like [`query`](Self::query), including hidden views.
    pub async fn query_all(&self, query: &str) -> Result<Vec<Value>, GestureError> {
        let result = self.map(query, &MapOperation::QueryAll).await;
        self.on_failure(result).await
    }

    pub async fn element_exists(&self, query: &str) -> Result<bool, GestureError> {
        let result = self.find(query).await;
        self.on_failure(result).await
    }

    // -----------------------------------------------------------------------
    // Assertions
    // -----------------------------------------------------------------------

    async fn check(&self, found: Result<bool, GestureError>, message: impl FnOnce() -> String) -> Result<(), GestureError> {
        let result = match found {
            Ok(true) => Ok(()),
            Ok(false) => Err(GestureError::AssertionFailed(message())),
            Err(e) => Err(e),
        };
        self.on_failure(result).await
    }

    /// Fails unless a view is marked with `label`.
    pub async fn screen_should_contain(&self, label: &str) -> Result<(), GestureError> {
        let found = self.find(&marked_query(label)).await;
        self.check(found, || format!("screen does not contain a view marked '{label}'")).await
    }

    /// Fails unless a view shows exactly `text`.
    pub async fn screen_should_contain_text(&self, text: &str) -> Result<(), GestureError> {
        let found = self.find(&text_query(text)).await;
        self.check(found, || format!("screen does not contain text '{text}'")).await
    }

    /// Fails unless `query` matches at least one element.
    pub async fn screen_should_contain_query(&self, query: &str) -> Result<(), GestureError> {
        let found = self.find(query).await;
        self.check(found, || format!("screen does not contain an element matching '{query}'")).await
    }

    /// Fails if a view is marked with `label`.
    pub async fn screen_should_not_contain(&self, label: &str) -> Result<(), GestureError> {
        let absent = self.find(&marked_query(label)).await.map(|found| !found);
        self.check(absent, || format!("screen contains a view marked '{label}'")).await
    }

    /// Fails unless some web view body contains `text`.
    pub async fn webview_should_contain_text(&self, text: &str) -> Result<(), GestureError> {
        let found = self
            .map(WEBVIEW_BODY_QUERY, &MapOperation::Query)
            .await
            .map(|results| results.iter().any(|r| result_contains_text(r, text)));
        self.check(found, || format!("web view does not contain text '{text}'")).await
    }

    /// Fails unless some web view has a node matching `selector`.
    pub async fn webview_should_contain_element(&self, selector: &str) -> Result<(), GestureError> {
        let found = self.find(&css_query(selector)).await;
        self.check(found, || {
            format!("web view does not contain an element matching '{selector}'")
        })
        .await
    }

    // -----------------------------------------------------------------------
    // Device
    // -----------------------------------------------------------------------

    pub async fn is_device_available(&self) -> bool {
        self.driver.is_available().await
    }

    /// Current screen as encoded image bytes.
    pub async fn screenshot(&self) -> Result<Vec<u8>, GestureError> {
        Ok(self.driver.screenshot().await?)
    }

    /// Saves a screenshot as `ios-screenshot-N.png` in `dir`, using the
    /// first unused `N`.
    pub async fn capture_screenshot(&self, dir: &Path) -> Result<PathBuf, GestureError> {
        let bytes = self.screenshot().await?;
        Ok(save_screenshot(&bytes, dir)?)
    }
}

/// Writes image bytes as `ios-screenshot-N.png` in `dir`, using the first
/// unused `N`.
pub fn save_screenshot(bytes: &[u8], dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = next_screenshot_path(dir);
    std::fs::write(&path, bytes)?;
    info!(path = %path.display(), "screenshot saved");
    Ok(path)
}

fn next_screenshot_path(dir: &Path) -> PathBuf {
    (1..)
        .map(|n| dir.join(format!("ios-screenshot-{n}.png")))
        .find(|p| !p.exists())
        .unwrap_or_else(|| dir.join("ios-screenshot.png"))
}
