//! Core application logic for the story composer
//!
//! This crate contains the framework-agnostic camera flow: the capture state
//! machine, the collaborator traits it drives, and the draggable caption.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod camera;
pub mod overlay;

pub use camera::{CaptureController, CaptureSnapshot, CaptureState, Effect, Message};
pub use overlay::OverlayDrag;
