use std::io::{self, Read};
use std::path::Path;

use touchmap_core::action::{ActionLog, ActionResult, ActionType};
use touchmap_core::orientation::reduce_degrees;

/// Convert JSONL action logs to shell scripts that call `touchmap` CLI commands.
///
/// Every CLI invocation starts without knowing how the device is turned, so
/// the converter tracks successful rotations and passes the resulting
/// orientation to later commands with `--orientation`.
pub struct LogConverter;

impl LogConverter {
    pub fn convert_file(path: &Path) -> Result<String, io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::convert_str(&content)
    }

    pub fn convert_stdin() -> Result<String, io::Error> {
        let mut content = String::new();
        io::stdin().read_to_string(&mut content)?;
        Self::convert_str(&content)
    }

    fn convert_str(content: &str) -> Result<String, io::Error> {
        let mut lines = vec![
            "#!/usr/bin/env bash".to_string(),
            "set -euo pipefail".to_string(),
            String::new(),
        ];
        let mut orientation = 0;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let log: ActionLog = serde_json::from_str(line).map_err(|e| {
                io::Error::new(io::ErrorKind::InvalidData, format!("Invalid JSONL: {}", e))
            })?;

            if let Some(cmd) = Self::action_to_command(&log.action, orientation) {
                lines.push(cmd);
            }
            if log.result == ActionResult::Success {
                orientation = Self::orientation_after(&log.action, orientation);
            }
        }

        Ok(lines.join("\n") + "\n")
    }

    fn orientation_after(action: &ActionType, current: i32) -> i32 {
        match action {
            ActionType::Rotate { direction } => reduce_degrees(current + direction.step()),
            ActionType::RotateTo { degrees, .. } => reduce_degrees(*degrees),
            _ => current,
        }
    }

    fn action_to_command(action: &ActionType, orientation: i32) -> Option<String> {
        let args = match action {
            ActionType::Touch { query } => format!("touch {}", shell_escape(query)),
            ActionType::TouchPosition { x, y } => format!("touch-position {} {}", x, y),
            ActionType::Swipe { direction } => format!("swipe {}", direction),
            ActionType::Rotate { direction } => format!("rotate {}", direction),
            ActionType::RotateTo { degrees, direction } => {
                format!("rotate-to -- {} {}", degrees, direction)
            }
            ActionType::Pinch { direction, query } => match query {
                Some(q) => format!("pinch {} {}", direction, shell_escape(q)),
                None => format!("pinch {}", direction),
            },
            ActionType::Scroll { query, direction } => {
                format!("scroll {} {}", shell_escape(query), direction)
            }
            ActionType::SetText { query, value } => {
                format!("set-text {} {}", shell_escape(query), shell_escape(value))
            }
            ActionType::Query { query } => format!("query {}", shell_escape(query)),
            ActionType::QueryAll { query } => format!("query-all {}", shell_escape(query)),
            ActionType::ScreenShouldContain { label } => {
                format!("assert contains {}", shell_escape(label))
            }
            ActionType::ScreenShouldContainText { text } => {
                format!("assert contains-text {}", shell_escape(text))
            }
            ActionType::ScreenShouldContainQuery { query } => {
                format!("assert contains-query {}", shell_escape(query))
            }
            ActionType::ScreenShouldNotContain { label } => {
                format!("assert not-contains {}", shell_escape(label))
            }
            ActionType::WebviewShouldContainText { text } => {
                format!("assert webview-text {}", shell_escape(text))
            }
            ActionType::WebviewShouldContainElement { selector } => {
                format!("assert webview-element {}", shell_escape(selector))
            }
            ActionType::Screenshot => "screenshot".to_string(),
            ActionType::WaitForDevice { timeout_ms } => format!("wait-for-device -o {}", timeout_ms),
            ActionType::StartSimulator { app_path, sdk } => format!(
                "start-simulator {} --sdk {}",
                shell_escape(&app_path.to_string_lossy()),
                shell_escape(sdk)
            ),
            ActionType::StopSimulator => "stop-simulator".to_string(),
            ActionType::LogComment { message } => return Some(format!("# {}", message)),
        };

        if orientation != 0 && uses_orientation(action) {
            Some(format!("touchmap --orientation {} {}", orientation, args))
        } else {
            Some(format!("touchmap {}", args))
        }
    }
}

fn uses_orientation(action: &ActionType) -> bool {
    matches!(
        action,
        ActionType::Swipe { .. } | ActionType::Rotate { .. } | ActionType::RotateTo { .. }
    )
}

/// Shell-escape a string using single quotes. Internal single quotes become `'\''`.
fn shell_escape(s: &str) -> String {
    if !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == '/')
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', "'\\''"))
}
