//! Application state management for the story composer
//!
//! This crate runs screen-bound state machines on the tokio runtime: a single
//! serialized event queue per screen, snapshots published over `watch`
//! channels, and cancellation of all in-flight work when the screen goes away.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod camera_session;

pub use camera_session::{CameraSession, SessionError};
