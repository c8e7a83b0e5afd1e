//! # touchmap-core
//!
//! Core library for driving an iOS app remotely through an HTTP server
//! embedded in the app under test.
//!
//! Every interaction is built from two device primitives: `map` runs an
//! operation (query, scroll, set text) on every view matching a query, and
//! `play` replays a pre-recorded touch-event stream such as a tap, swipe,
//! pinch or rotation. On top of these the crate tracks device orientation so
//! that swipes stay correct after the device has been turned.
//!
//! ## Modules
//!
//! - [`orientation`] - Orientation arithmetic and rotation/swipe recording names
//! - [`recording`] - Lookup of gesture recordings on disk
//! - [`protocol`] - Request and response bodies of the device server
//! - [`driver`] - The [`driver::AutomationDriver`] trait and device polling
//! - [`client`] - HTTP implementation of the driver
//! - [`element`] - Typed view over query results
//! - [`gestures`] - The gesture, query and assertion facade
//! - [`action`] - Action types and logging for scripted runs
//! - [`executor`] - Action execution with screenshot-on-failure
//! - [`simulator`] - Launching and quitting the iOS Simulator
//! - [`config`] - Persistent settings in `~/.touchmap`
//!
//! ## External Dependencies
//!
//! Launching the simulator requires **Xcode** and, preferably, the
//! **waxsim** helper tool on the `PATH`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use touchmap_core::client::DeviceClient;
//! use touchmap_core::gestures::Gestures;
//! use touchmap_core::recording::RecordingStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(DeviceClient::new("localhost:37265")?);
//! let gestures = Gestures::new(client, RecordingStore::new(vec!["recordings".into()]));
//!
//! gestures.touch("button marked:'Login'").await?;
//! gestures.screen_should_contain("Welcome").await?;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod client;
pub mod config;
pub mod driver;
pub mod element;
pub mod executor;
pub mod gestures;
pub mod orientation;
pub mod protocol;
pub mod recording;
pub mod simulator;
