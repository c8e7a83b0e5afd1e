//! Lookup of pre-recorded gesture files.
//!
//! Gestures such as touches, swipes and rotations are replayed from event
//! recordings captured on a specific OS version and device family. A
//! logical gesture name like `swipe_left` resolves to a file named
//! `swipe_left_ios5_iphone.base64` in one of the configured recording
//! directories.
//!
//! # Example
//!
//! ```no_run
//! use touchmap_core::recording::{RecordingOptions, RecordingStore};
//!
//! let store = RecordingStore::new(vec!["recordings".into()]);
//! let recording = store.load("touch", &RecordingOptions::default()).unwrap();
//! println!("{} ({} bytes)", recording.path.display(), recording.events.len());
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Extension of recordings stored as base64 text.
pub const RECORDING_EXTENSION: &str = "base64";

/// OS version recordings default to.
pub const DEFAULT_OS: &str = "ios5";

/// Device family recordings default to.
pub const DEFAULT_DEVICE: &str = "iphone";

#[derive(Error, Debug)]
pub enum RecordingError {
    /// No search directory contains the resolved file.
    #[error("Recording '{file}' not found (searched: {searched})")]
    NotFound { file: String, searched: String },

    #[error("IO error reading recording: {0}")]
    Io(#[from] std::io::Error),
}

/// OS version and device family a recording was captured on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingOptions {
    pub os: String,
    pub device: String,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            os: DEFAULT_OS.to_string(),
            device: DEFAULT_DEVICE.to_string(),
        }
    }
}

/// A loaded recording, ready to be sent as the `events` of a playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Where the recording was found.
    pub path: PathBuf,
    /// Base64-encoded event payload.
    pub events: String,
}

/// Read-only set of recording directories, searched in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    dirs: Vec<PathBuf>,
}

impl RecordingStore {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// File name for a gesture on the given platform.
    ///
    /// A name that already carries an extension is taken to be a complete
    /// recording file name and is returned unchanged.
    pub fn file_name(gesture: &str, options: &RecordingOptions) -> String {
        if Path::new(gesture).extension().is_some() {
            return gesture.to_string();
        }
        format!(
            "{}_{}_{}.{}",
            gesture, options.os, options.device, RECORDING_EXTENSION
        )
    }

    /// Finds the recording file for a gesture.
    ///
    /// # Errors
    ///
    /// - [`RecordingError::NotFound`] if no directory contains the file
    pub fn resolve(&self, gesture: &str, options: &RecordingOptions) -> Result<PathBuf, RecordingError> {
        let file = Self::file_name(gesture, options);
        let found = self
            .dirs
            .iter()
            .map(|dir| dir.join(&file))
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => Ok(path),
            None => Err(RecordingError::NotFound {
                searched: self
                    .dirs
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                file,
            }),
        }
    }

    /// Resolves and reads a recording.
    ///
    /// Files with the `.base64` extension already hold the encoded payload;
    /// anything else is read as raw bytes and encoded.
    pub fn load(&self, gesture: &str, options: &RecordingOptions) -> Result<Recording, RecordingError> {
        let path = self.resolve(gesture, options)?;
        let events = if path.extension().and_then(|e| e.to_str()) == Some(RECORDING_EXTENSION) {
            std::fs::read_to_string(&path)?.trim().to_string()
        } else {
            base64::engine::general_purpose::STANDARD.encode(std::fs::read(&path)?)
        };
        debug!(gesture, path = %path.display(), bytes = events.len(), "loaded recording");
        Ok(Recording { path, events })
    }

    /// Names of all recording files across the search directories.
    ///
    /// Missing directories are skipped.
    pub fn list(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for dir in &self.dirs {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                if entry.path().is_file() {
                    if let Some(name) = entry.file_name().to_str() {
                        names.insert(name.to_string());
                    }
                }
            }
        }
        names.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &[u8]) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn file_name_appends_platform_suffix() {
        let name = RecordingStore::file_name("touch", &RecordingOptions::default());
        assert_eq!(name, "touch_ios5_iphone.base64");

        let ipad = RecordingOptions { os: "ios6".into(), device: "ipad".into() };
        assert_eq!(RecordingStore::file_name("swipe_left", &ipad), "swipe_left_ios6_ipad.base64");
    }

    #[test]
    fn file_name_keeps_qualified_names() {
        let name = RecordingStore::file_name("custom_tap.base64", &RecordingOptions::default());
        assert_eq!(name, "custom_tap.base64");
    }

    #[test]
    fn resolve_searches_directories_in_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write(second.path(), "touch_ios5_iphone.base64", b"second");

        let store = RecordingStore::new(vec![first.path().into(), second.path().into()]);
        let path = store.resolve("touch", &RecordingOptions::default()).unwrap();
        assert_eq!(path, second.path().join("touch_ios5_iphone.base64"));

        write(first.path(), "touch_ios5_iphone.base64", b"first");
        let path = store.resolve("touch", &RecordingOptions::default()).unwrap();
        assert_eq!(path, first.path().join("touch_ios5_iphone.base64"));
    }

    #[test]
    fn resolve_missing_recording_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordingStore::new(vec![dir.path().into()]);

        match store.resolve("pinch_in", &RecordingOptions::default()) {
            Err(RecordingError::NotFound { file, searched }) => {
                assert_eq!(file, "pinch_in_ios5_iphone.base64");
                assert!(searched.contains(&dir.path().display().to_string()));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn load_trims_base64_text() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "touch_ios5_iphone.base64", b"YmFzZTY0\n");
        let store = RecordingStore::new(vec![dir.path().into()]);

        let recording = store.load("touch", &RecordingOptions::default()).unwrap();
        assert_eq!(recording.events, "YmFzZTY0");
    }

    #[test]
    fn load_encodes_binary_recordings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "raw.plist", b"bplist");
        let store = RecordingStore::new(vec![dir.path().into()]);

        let recording = store.load("raw.plist", &RecordingOptions::default()).unwrap();
        assert_eq!(recording.events, "YnBsaXN0");
    }

    #[test]
    fn list_merges_and_sorts() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write(a.path(), "touch_ios5_iphone.base64", b"");
        write(b.path(), "swipe_up_ios5_iphone.base64", b"");
        write(b.path(), "touch_ios5_iphone.base64", b"");

        let store = RecordingStore::new(vec![
            a.path().into(),
            b.path().into(),
            PathBuf::from("/nonexistent/recordings"),
        ]);
        assert_eq!(
            store.list(),
            vec!["swipe_up_ios5_iphone.base64", "touch_ios5_iphone.base64"]
        );
    }
}
