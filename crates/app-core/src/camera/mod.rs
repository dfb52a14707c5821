//! Camera capture and story composition
//!
//! - [`state`] - screen state, image metadata and phases
//! - [`controller`] - the capture state machine
//! - [`collaborators`] - permission, capture, optimizer and upload traits
//! - [`preferences`] - initial camera configuration
//! - [`error`] - user-facing failures

pub mod collaborators;
pub mod controller;
pub mod error;
pub mod preferences;
pub mod state;

pub use collaborators::{
    CaptureProvider, CapturedImage, Collaborators, ImageOptimizer, PermissionProvider,
    PickOutcome, ProgressSender, StoryPost, StoryUploader,
};
pub use controller::{CaptureController, Effect, Message, Token};
pub use error::{CameraError, CollaboratorError};
pub use preferences::CameraPreferences;
pub use state::{
    CameraType, CapturePhase, CaptureSnapshot, CaptureState, FlashMode, ImageAsset, ImageSource,
    PermissionStatus, PostingState, SelectedImage, TextPosition, TimerMode,
};
