//! Shared test helpers for touchmap-core integration tests.
//!
//! This module provides a scripted in-memory driver that records every
//! request it receives, plus fixtures for recording directories.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;

use touchmap_core::driver::{AutomationDriver, DriverError};
use touchmap_core::gestures::Gestures;
use touchmap_core::protocol::{Envelope, MapOperation, PlaybackOptions};
use touchmap_core::recording::RecordingStore;

// ---------------------------------------------------------------------------
// Scripted driver
// ---------------------------------------------------------------------------

/// What the mock does for the next `map` or `play` call.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Succeed with these results.
    Results(Vec<Value>),
    /// Answer with a FAILURE envelope.
    Fail { reason: String, details: String },
    /// The server cannot be reached.
    Unreachable,
}

impl MockBehavior {
    pub fn one_match() -> Self {
        MockBehavior::Results(vec![json!({"class": "UIView"})])
    }

    pub fn no_match() -> Self {
        MockBehavior::Results(vec![])
    }

    pub fn fail(reason: &str, details: &str) -> Self {
        MockBehavior::Fail {
            reason: reason.to_string(),
            details: details.to_string(),
        }
    }
}

/// A request as seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Map { query: String, operation: MapOperation },
    Play { events: String, options: PlaybackOptions },
    Version,
    Screenshot,
}

/// In-memory [`AutomationDriver`].
///
/// `map` and `play` consume scripted behaviors in order; once the script is
/// exhausted they succeed with no results.
pub struct MockDriver {
    script: Mutex<VecDeque<MockBehavior>>,
    requests: Mutex<Vec<Recorded>>,
    screenshot: Option<Vec<u8>>,
    available: bool,
}

impl MockDriver {
    pub fn new(script: Vec<MockBehavior>) -> Arc<Self> {
        Self::with_screenshot(script, Some(b"\x89PNG fake".to_vec()))
    }

    /// Like [`new`](Self::new); `None` makes every screenshot fail.
    pub fn with_screenshot(script: Vec<MockBehavior>, screenshot: Option<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            screenshot,
            available: true,
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            screenshot: None,
            available: false,
        })
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Recording payloads sent to `/play`, in order.
    pub fn played(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Play { events, .. } => Some(events),
                _ => None,
            })
            .collect()
    }

    /// Queries sent to `/map`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Map { query, .. } => Some(query),
                _ => None,
            })
            .collect()
    }

    fn record(&self, request: Recorded) {
        self.requests.lock().unwrap().push(request);
    }

    fn next(&self) -> MockBehavior {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(MockBehavior::Results(vec![]))
    }
}

#[async_trait]
impl AutomationDriver for MockDriver {
    async fn map(&self, query: &str, operation: &MapOperation) -> Result<Vec<Value>, DriverError> {
        self.record(Recorded::Map {
            query: query.to_string(),
            operation: operation.clone(),
        });
        match self.next() {
            MockBehavior::Results(results) => Ok(results),
            MockBehavior::Fail { reason, details } => {
                Err(DriverError::MapOperationFailed { reason, details })
            }
            MockBehavior::Unreachable => Err(DriverError::Http("connection refused".into())),
        }
    }

    async fn play(&self, events: &str, options: &PlaybackOptions) -> Result<Envelope, DriverError> {
        self.record(Recorded::Play {
            events: events.to_string(),
            options: options.clone(),
        });
        match self.next() {
            MockBehavior::Results(results) => Ok(Envelope::success(results)),
            MockBehavior::Fail { reason, details } => {
                Err(DriverError::PlaybackFailed { reason, details })
            }
            MockBehavior::Unreachable => Err(DriverError::Http("connection refused".into())),
        }
    }

    async fn version(&self) -> Result<Value, DriverError> {
        self.record(Recorded::Version);
        if self.available {
            Ok(json!({"version": "0.9.168"}))
        } else {
            Err(DriverError::Http("connection refused".into()))
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>, DriverError> {
        self.record(Recorded::Screenshot);
        self.screenshot
            .clone()
            .ok_or_else(|| DriverError::Http("screenshot unavailable".into()))
    }
}

// ---------------------------------------------------------------------------
// Recording fixtures
// ---------------------------------------------------------------------------

/// Every gesture the facade can play back.
pub const ALL_GESTURES: &[&str] = &[
    "touch",
    "pinch_in",
    "pinch_out",
    "swipe_up",
    "swipe_down",
    "swipe_left",
    "swipe_right",
    "rotate_home_up",
    "rotate_home_down",
    "rotate_home_left",
    "rotate_home_right",
];

/// Writes `{gesture}_ios5_iphone.base64` files into `dir`. Each file's
/// payload is the gesture name, so tests can tell which one was played.
pub fn write_recordings(dir: &Path, gestures: &[&str]) {
    for gesture in gestures {
        std::fs::write(
            dir.join(format!("{gesture}_ios5_iphone.base64")),
            format!("{gesture}\n"),
        )
        .unwrap();
    }
}

/// A temporary recordings directory holding [`ALL_GESTURES`].
pub fn recordings_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_recordings(dir.path(), ALL_GESTURES);
    dir
}

/// A facade over `driver` reading recordings from `dir`.
pub fn gestures(driver: Arc<MockDriver>, dir: &TempDir) -> Gestures {
    Gestures::new(driver, RecordingStore::new(vec![dir.path().to_path_buf()]))
}
