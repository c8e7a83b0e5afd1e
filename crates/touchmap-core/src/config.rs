//! Persistent configuration for touchmap.
//!
//! Stores user settings in `~/.touchmap/config.json`: the device server
//! endpoint, where recordings live, which platform they were captured on, and
//! how the simulator is launched. Command-line flags override these values.
//!
//! # Example
//!
//! ```no_run
//! use touchmap_core::config::TouchmapConfig;
//!
//! // Load (returns defaults if file doesn't exist)
//! let config = TouchmapConfig::load();
//! println!("Device server: {}", config.endpoint);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::DEFAULT_REQUEST_TIMEOUT;
use crate::protocol::DEFAULT_ENDPOINT;
use crate::recording::{RecordingOptions, RecordingStore, DEFAULT_DEVICE, DEFAULT_OS};
use crate::simulator::SimulatorConfig;

const CONFIG_FILENAME: &str = "config.json";

/// Returns the touchmap state directory (`~/.touchmap`), creating it if
/// needed.
///
/// Falls back to `.touchmap` in the working directory when no home directory
/// is known.
pub fn touchmap_dir() -> PathBuf {
    let dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".touchmap");
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Path of the configuration file.
pub fn config_path() -> PathBuf {
    touchmap_dir().join(CONFIG_FILENAME)
}

/// Persistent touchmap configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchmapConfig {
    /// `host:port` of the on-device server.
    pub endpoint: String,

    /// Directories searched, in order, for gesture recordings.
    pub recordings_dirs: Vec<PathBuf>,

    /// OS version recordings were captured on.
    pub os: String,

    /// Device family recordings were captured on.
    pub device: String,

    pub request_timeout_secs: u64,

    /// Capture a screenshot when an action fails. On by default.
    pub capture_screenshot_on_failure: bool,

    /// Where failure screenshots are written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_dir: Option<PathBuf>,

    pub simulator: SimulatorConfig,
}

impl Default for TouchmapConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            recordings_dirs: vec![PathBuf::from("recordings")],
            os: DEFAULT_OS.to_string(),
            device: DEFAULT_DEVICE.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            capture_screenshot_on_failure: true,
            screenshot_dir: None,
            simulator: SimulatorConfig::default(),
        }
    }
}

impl TouchmapConfig {
    /// Load config from `~/.touchmap/config.json`.
    ///
    /// Returns [`Default`] if the file does not exist or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load config from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Save config to `~/.touchmap/config.json`.
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    pub fn recording_options(&self) -> RecordingOptions {
        RecordingOptions {
            os: self.os.clone(),
            device: self.device.clone(),
        }
    }

    pub fn recording_store(&self) -> RecordingStore {
        RecordingStore::new(self.recordings_dirs.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Failure screenshot directory, defaulting to `~/.touchmap/screenshots`.
    pub fn screenshot_dir(&self) -> PathBuf {
        self.screenshot_dir
            .clone()
            .unwrap_or_else(|| touchmap_dir().join("screenshots"))
    }
}
