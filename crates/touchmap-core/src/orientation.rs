//! Orientation and direction arithmetic for gesture playback.
//!
//! The device server only knows how to replay pre-recorded gestures, so
//! rotating the simulator or swiping in a rotated interface comes down to
//! picking the right recording. This module does the degree arithmetic:
//!
//! - [`reduce_degrees`] normalizes any angle into `[0, 360)`
//! - [`rotation_recording`] picks the `rotate_home_*` recording for a target
//!   orientation reached by turning left or right
//! - [`swipe_recording`] picks the `swipe_*` recording that produces the
//!   requested on-screen swipe given the current device orientation
//!
//! Names and degrees follow the home-button convention: `down` (0°) is the
//! upright portrait orientation. Direction names are matched exactly, in
//! lowercase.
//!
//! # Example
//!
//! ```
//! use touchmap_core::orientation::{Orientation, RotationDirection, rotation_recording, swipe_recording};
//!
//! assert_eq!(rotation_recording(90, RotationDirection::Left).unwrap(), "rotate_home_down");
//! assert_eq!(swipe_recording(0, Orientation::Up).unwrap(), "swipe_up");
//! assert!(rotation_recording(45, RotationDirection::Left).is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a direction or angle is outside the fixed set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrientationError {
    /// The direction name is not one of the accepted values.
    #[error("Invalid direction '{given}', expected one of: {expected}")]
    InvalidDirection {
        /// The rejected input.
        given: String,
        /// Human-readable list of accepted values.
        expected: &'static str,
    },

    /// The angle does not land on a quarter turn after reduction.
    #[error("Invalid orientation {0}°, expected a multiple of 90")]
    InvalidOrientation(i32),
}

/// Normalizes an angle in degrees into `[0, 360)`.
pub fn reduce_degrees(degrees: i32) -> i32 {
    degrees.rem_euclid(360)
}

/// One of the four quarter-turn orientations, also used as a swipe direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Down,
    Right,
    Up,
    Left,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Down,
        Orientation::Right,
        Orientation::Up,
        Orientation::Left,
    ];

    /// The angle of this orientation in degrees.
    pub fn degrees(self) -> i32 {
        match self {
            Orientation::Down => 0,
            Orientation::Right => 90,
            Orientation::Up => 180,
            Orientation::Left => 270,
        }
    }

    /// Maps an angle back to its orientation after reducing it.
    pub fn from_degrees(degrees: i32) -> Result<Self, OrientationError> {
        match reduce_degrees(degrees) {
            0 => Ok(Orientation::Down),
            90 => Ok(Orientation::Right),
            180 => Ok(Orientation::Up),
            270 => Ok(Orientation::Left),
            _ => Err(OrientationError::InvalidOrientation(degrees)),
        }
    }

    /// Parses a direction name (`up`, `down`, `left`, `right`), exactly.
    pub fn from_name(name: &str) -> Result<Self, OrientationError> {
        name.parse()
    }

    pub fn name(self) -> &'static str {
        match self {
            Orientation::Down => "down",
            Orientation::Right => "right",
            Orientation::Up => "up",
            Orientation::Left => "left",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Orientation {
    type Err = OrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "down" => Ok(Orientation::Down),
            "right" => Ok(Orientation::Right),
            "up" => Ok(Orientation::Up),
            "left" => Ok(Orientation::Left),
            _ => Err(OrientationError::InvalidDirection {
                given: s.to_string(),
                expected: "up, down, left, right",
            }),
        }
    }
}

/// Which way the device is turned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationDirection {
    Left,
    Right,
}

impl RotationDirection {
    /// Offset added to the target orientation to find the recording name.
    fn recording_offset(self) -> i32 {
        match self {
            RotationDirection::Right => 90,
            RotationDirection::Left => 270,
        }
    }

    /// Change applied to the tracked orientation by a single quarter turn.
    pub fn step(self) -> i32 {
        match self {
            RotationDirection::Left => 90,
            RotationDirection::Right => -90,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RotationDirection::Left => "left",
            RotationDirection::Right => "right",
        }
    }
}

impl fmt::Display for RotationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RotationDirection {
    type Err = OrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(RotationDirection::Left),
            "right" => Ok(RotationDirection::Right),
            _ => Err(OrientationError::InvalidDirection {
                given: s.to_string(),
                expected: "left, right",
            }),
        }
    }
}

/// Recording name for rotating to `target_degrees` by turning `direction`.
///
/// The recordings are named after where the home button ends up, which is a
/// quarter or three-quarter turn away from the target depending on the
/// direction of travel.
///
/// # Errors
///
/// - [`OrientationError::InvalidOrientation`] if `target_degrees` is not a
///   quarter turn
pub fn rotation_recording(
    target_degrees: i32,
    direction: RotationDirection,
) -> Result<String, OrientationError> {
    let target = Orientation::from_degrees(target_degrees)?;
    let home = Orientation::from_degrees(target.degrees() + direction.recording_offset())?;
    Ok(format!("rotate_home_{}", home.name()))
}

/// Recording name for an on-screen swipe while the device sits at
/// `current_degrees`.
///
/// # Errors
///
/// - [`OrientationError::InvalidOrientation`] if `current_degrees` is not a
///   quarter turn
pub fn swipe_recording(current_degrees: i32, direction: Orientation) -> Result<String, OrientationError> {
    let current = Orientation::from_degrees(current_degrees)?;
    let effective = Orientation::from_degrees(360 - current.degrees() + direction.degrees())?;
    Ok(format!("swipe_{}", effective.name()))
}
