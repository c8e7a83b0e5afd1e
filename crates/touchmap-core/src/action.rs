//! Action types and logging for automation operations.
//!
//! This module defines the actions a script can ask of the device, along with
//! the [`ActionLog`] type for recording executed actions.
//!
//! # Action Types
//!
//! Actions fall into several categories:
//!
//! - **Gestures**: [`ActionType::Touch`], [`ActionType::TouchPosition`], [`ActionType::Swipe`], [`ActionType::Pinch`], [`ActionType::Scroll`], [`ActionType::SetText`]
//! - **Rotation**: [`ActionType::Rotate`], [`ActionType::RotateTo`]
//! - **Queries**: [`ActionType::Query`], [`ActionType::QueryAll`], [`ActionType::Screenshot`]
//! - **Assertions**: [`ActionType::ScreenShouldContain`] and friends
//! - **Device and simulator**: [`ActionType::WaitForDevice`], [`ActionType::StartSimulator`], [`ActionType::StopSimulator`]
//! - **Logging**: [`ActionType::LogComment`]
//!
//! # Example
//!
//! ```
//! use touchmap_core::action::{ActionType, ActionResult, ActionLog};
//!
//! let action = ActionType::Touch {
//!     query: "button marked:'Login'".to_string(),
//! };
//!
//! let log = ActionLog::new(action, ActionResult::Success, None, None);
//! println!("Action {} at {}", log.id, log.timestamp);
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gestures::PinchDirection;
use crate::orientation::{Orientation, RotationDirection};
use crate::protocol::ScrollDirection;

/// The result of executing an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionResult {
    Success,

    /// The action failed with the given error message.
    Failure(String),
}

/// Actions that can be performed against the device.
///
/// Actions are serialized as JSON with a `type` tag discriminator, one per
/// line in scripts and action logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionType {
    /// Touch the first element matching a query.
    Touch { query: String },

    /// Touch an absolute screen position, in points.
    TouchPosition { x: f64, y: f64 },

    /// Swipe in an on-screen direction.
    Swipe { direction: Orientation },

    /// Turn the device a quarter turn.
    Rotate { direction: RotationDirection },

    /// Turn the device to an absolute orientation.
    RotateTo {
        /// Target orientation in degrees; any multiple of 90.
        degrees: i32,
        direction: RotationDirection,
    },

    /// Pinch in or out, on an element or at the screen centre.
    Pinch {
        direction: PinchDirection,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        query: Option<String>,
    },

    Scroll {
        query: String,
        direction: ScrollDirection,
    },

    /// Replace the text of every matching text input.
    SetText { query: String, value: String },

    Query { query: String },

    /// Query including hidden views.
    QueryAll { query: String },

    /// Assert a view is marked with `label`.
    ScreenShouldContain { label: String },

    /// Assert a view shows exactly `text`.
    ScreenShouldContainText { text: String },

    /// Assert `query` matches at least one element.
    ScreenShouldContainQuery { query: String },

    /// Assert no view is marked with `label`.
    ScreenShouldNotContain { label: String },

    WebviewShouldContainText { text: String },

    /// Assert a web view has a node matching a CSS selector.
    WebviewShouldContainElement { selector: String },

    /// Capture the screen. Returns base64-encoded PNG data.
    Screenshot,

    /// Poll the device server until it answers.
    WaitForDevice { timeout_ms: u64 },

    /// Launch the simulator with an app bundle.
    StartSimulator { app_path: PathBuf, sdk: String },

    StopSimulator,

    /// Log a comment (for documentation purposes).
    LogComment { message: String },
}

impl ActionType {
    /// Returns a short, static name for this action type suitable for use in
    /// tracing span metadata.
    pub fn name(&self) -> &'static str {
        match self {
            ActionType::Touch { .. } => "touch",
            ActionType::TouchPosition { .. } => "touch_position",
            ActionType::Swipe { .. } => "swipe",
            ActionType::Rotate { .. } => "rotate",
            ActionType::RotateTo { .. } => "rotate_to",
            ActionType::Pinch { .. } => "pinch",
            ActionType::Scroll { .. } => "scroll",
            ActionType::SetText { .. } => "set_text",
            ActionType::Query { .. } => "query",
            ActionType::QueryAll { .. } => "query_all",
            ActionType::ScreenShouldContain { .. } => "screen_should_contain",
            ActionType::ScreenShouldContainText { .. } => "screen_should_contain_text",
            ActionType::ScreenShouldContainQuery { .. } => "screen_should_contain_query",
            ActionType::ScreenShouldNotContain { .. } => "screen_should_not_contain",
            ActionType::WebviewShouldContainText { .. } => "webview_should_contain_text",
            ActionType::WebviewShouldContainElement { .. } => "webview_should_contain_element",
            ActionType::Screenshot => "screenshot",
            ActionType::WaitForDevice { .. } => "wait_for_device",
            ActionType::StartSimulator { .. } => "start_simulator",
            ActionType::StopSimulator => "stop_simulator",
            ActionType::LogComment { .. } => "log_comment",
        }
    }

    /// Returns `true` for actions that manage the simulator process rather
    /// than talk to the device server.
    pub fn is_simulator_action(&self) -> bool {
        matches!(self, ActionType::StartSimulator { .. } | ActionType::StopSimulator)
    }
}

/// A logged action with metadata.
///
/// Each executed action is logged with a unique identifier, timestamp, the
/// action details, result, and an optional screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub id: Uuid,

    /// When the action was executed.
    pub timestamp: DateTime<Utc>,

    pub action: ActionType,

    pub result: ActionResult,

    /// Screenshot captured when the action failed (base64-encoded PNG).
    pub screenshot: Option<Arc<String>>,

    /// How long the action took in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ActionLog {
    /// Creates a new action log entry with a fresh UUID and the current time.
    pub fn new(
        action: ActionType,
        result: ActionResult,
        screenshot: Option<Arc<String>>,
        duration_ms: Option<u64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            result,
            screenshot,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn actions_are_type_tagged() {
        let action = ActionType::Swipe { direction: Orientation::Left };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"type": "Swipe", "direction": "left"})
        );
    }

    #[test]
    fn parses_script_lines() {
        let rotate: ActionType =
            serde_json::from_str(r#"{"type":"RotateTo","degrees":-90,"direction":"left"}"#).unwrap();
        assert_eq!(
            rotate,
            ActionType::RotateTo { degrees: -90, direction: RotationDirection::Left }
        );

        let pinch: ActionType = serde_json::from_str(r#"{"type":"Pinch","direction":"out"}"#).unwrap();
        assert_eq!(pinch, ActionType::Pinch { direction: PinchDirection::Out, query: None });
    }

    #[test]
    fn simulator_actions() {
        assert!(ActionType::StopSimulator.is_simulator_action());
        assert!(!ActionType::Screenshot.is_simulator_action());
        assert_eq!(ActionType::StopSimulator.name(), "stop_simulator");
    }

    #[test]
    fn log_entries_serialize_without_empty_duration() {
        let log = ActionLog::new(ActionType::Screenshot, ActionResult::Success, None, None);
        let value = serde_json::to_value(&log).unwrap();
        assert!(value.get("duration_ms").is_none());
        assert_eq!(value["result"], "Success");
        let back: ActionLog = serde_json::from_value(value).unwrap();
        assert_eq!(back.id, log.id);
    }

    #[test]
    fn failure_log_keeps_shared_screenshot() {
        let shot = Arc::new("iVBORw==".to_string());
        let log = ActionLog::new(
            ActionType::Touch { query: "button".to_string() },
            ActionResult::Failure("No element found for query: button".to_string()),
            Some(shot.clone()),
            Some(120),
        );
        let json = serde_json::to_string(&log).unwrap();
        assert!(json.contains("\"screenshot\":\"iVBORw==\""));
        let back: ActionLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.screenshot, Some(shot));
    }
}
