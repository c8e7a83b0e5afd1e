//! JSON wire protocol spoken by the on-device automation server.
//!
//! Two request kinds carry all UI interaction:
//!
//! - **map**: run an element query and apply an operation to every match
//!   (`POST /map`)
//! - **play**: replay a recorded touch-event sequence, optionally aimed at a
//!   query or an offset (`POST /play`)
//!
//! Both answer with the same [`Envelope`]:
//!
//! ```text
//! {"outcome": "SUCCESS" | "FAILURE", "results": [...], "reason": "...", "details": "..."}
//! ```
//!
//! # Example
//!
//! ```
//! use touchmap_core::protocol::{MapOperation, MapRequest};
//!
//! let body = MapRequest::new("button marked:'Login'", &MapOperation::Query);
//! let json = serde_json::to_value(&body).unwrap();
//! assert_eq!(json["operation"]["method_name"], "query");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Host and port the device server listens on by default.
pub const DEFAULT_ENDPOINT: &str = "localhost:37265";

/// Content type the device server expects on JSON request bodies.
pub const REQUEST_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

pub const MAP_PATH: &str = "map";
pub const PLAY_PATH: &str = "play";
pub const VERSION_PATH: &str = "version";
pub const SCREENSHOT_PATH: &str = "screenshot";

// ---------------------------------------------------------------------------
// Map operations
// ---------------------------------------------------------------------------

/// Direction argument of the `scroll` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        }
    }
}

impl fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrollDirection {
    type Err = crate::orientation::OrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(ScrollDirection::Up),
            "down" => Ok(ScrollDirection::Down),
            "left" => Ok(ScrollDirection::Left),
            "right" => Ok(ScrollDirection::Right),
            _ => Err(crate::orientation::OrientationError::InvalidDirection {
                given: s.to_string(),
                expected: "up, down, left, right",
            }),
        }
    }
}

/// Operations the server can apply to the elements matched by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOperation {
    /// Return the first-level description of every match.
    Query,
    /// Like `Query`, but also includes hidden views.
    QueryAll,
    /// Scroll every matched scroll view.
    Scroll(ScrollDirection),
    /// Replace the text of every matched text input.
    SetText(String),
}

impl MapOperation {
    /// Remote method name.
    pub fn method_name(&self) -> &'static str {
        match self {
            MapOperation::Query => "query",
            MapOperation::QueryAll => "query_all",
            MapOperation::Scroll(_) => "scroll",
            MapOperation::SetText(_) => "setText",
        }
    }

    /// Positional arguments sent with the method.
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            MapOperation::Query | MapOperation::QueryAll => Vec::new(),
            MapOperation::Scroll(direction) => vec![Value::from(direction.as_str())],
            MapOperation::SetText(text) => vec![Value::from(text.as_str())],
        }
    }
}

/// The `operation` object of a map request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationBody {
    pub method_name: String,
    pub arguments: Vec<Value>,
}

impl From<&MapOperation> for OperationBody {
    fn from(op: &MapOperation) -> Self {
        Self {
            method_name: op.method_name().to_string(),
            arguments: op.arguments(),
        }
    }
}

/// Body of `POST /map`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRequest {
    pub query: String,
    pub operation: OperationBody,
}

impl MapRequest {
    pub fn new(query: impl Into<String>, operation: &MapOperation) -> Self {
        Self {
            query: query.into(),
            operation: operation.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Screen position a playback is shifted to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    pub x: f64,
    pub y: f64,
}

/// Optional modifiers of a playback. Unset fields are left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaybackOptions {
    /// Aim the recording at the first element matching this query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Aim the recording at an absolute screen position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Offset>,

    /// Replay the events backwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reverse: Option<bool>,

    /// Server-side prototype gesture to base the playback on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype: Option<String>,
}

impl PlaybackOptions {
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.offset = Some(Offset { x, y });
        self
    }

    pub fn with_reverse(mut self, reverse: bool) -> Self {
        self.reverse = Some(reverse);
        self
    }

    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }
}

/// Body of `POST /play`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRequest {
    pub events: String,
    #[serde(flatten)]
    pub options: PlaybackOptions,
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Outcome discriminator of an [`Envelope`].
///
/// Any value other than `SUCCESS` counts as a failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
    Success,
    Failure(String),
}

impl From<String> for Outcome {
    fn from(s: String) -> Self {
        if s == "SUCCESS" {
            Outcome::Success
        } else {
            Outcome::Failure(s)
        }
    }
}

impl From<Outcome> for String {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => "SUCCESS".to_string(),
            Outcome::Failure(s) => s,
        }
    }
}

/// Response to a map or play request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub outcome: Outcome,

    /// Per-element results; only meaningful on success.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub results: Vec<Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub details: String,
}

impl Envelope {
    pub fn success(results: Vec<Value>) -> Self {
        Self {
            outcome: Outcome::Success,
            results,
            reason: String::new(),
            details: String::new(),
        }
    }

    pub fn failure(reason: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure("FAILURE".to_string()),
            results: Vec::new(),
            reason: reason.into(),
            details: details.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
