//! Typed view over the element descriptions returned by queries.
//!
//! Query results are arbitrary JSON: a view query yields objects describing
//! each match, a property query yields plain values. [`UIElement`] picks out
//! the fields shared by view descriptions and keeps everything else in
//! [`UIElement::extra`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Description fields searched for text, in order.
const TEXT_FIELDS: [&str; 4] = ["textContent", "html", "text", "label"];

/// A UI element as described by the device server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UIElement {
    /// The view class (e.g., "UIButton", "UILabel").
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// The accessibility identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The accessibility label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Visible text, for text-bearing views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// The element's frame in screen points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<ElementFrame>,

    /// DOM text of a web view node.
    #[serde(rename = "textContent", default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Markup of a web view node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,

    /// Every other field of the description.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The frame (position and dimensions) of a UI element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementFrame {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl UIElement {
    /// Interprets one query result. Returns `None` for non-object results
    /// such as property values.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Returns `true` if any text-bearing field contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        // Same order as `TEXT_FIELDS`.
        [&self.text_content, &self.html, &self.text, &self.label]
            .into_iter()
            .flatten()
            .any(|s| s.contains(needle))
    }

    /// One-line summary: `[Class] id "label" =text @(x,y)`.
    pub fn format_pretty(&self) -> String {
        let mut parts = vec![format!("[{}]", self.class.as_deref().unwrap_or("Unknown"))];
        if let Some(ref id) = self.id {
            parts.push(id.clone());
        }
        if let Some(ref label) = self.label {
            parts.push(format!("\"{}\"", label));
        }
        if let Some(ref text) = self.text {
            parts.push(format!("={}", text));
        }
        if let Some(ref frame) = self.frame {
            parts.push(format!("@({:.0},{:.0})", frame.x, frame.y));
        }
        parts.join(" ")
    }
}

/// Returns `true` if a result value (element or plain property) contains
/// `needle`.
///
/// Objects are searched field by field, so a description whose other fields
/// do not fit [`UIElement`] still matches on its text.
pub fn result_contains_text(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s.contains(needle),
        Value::Object(fields) => TEXT_FIELDS
            .iter()
            .filter_map(|key| fields.get(*key).and_then(Value::as_str))
            .any(|s| s.contains(needle)),
        _ => false,
    }
}
