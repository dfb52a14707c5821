//! Camera flow errors

use thiserror::Error;

/// Failures surfaced to the user on the camera screen
///
/// None of these are fatal; each one resolves to a well-defined phase with
/// the message stored in `CaptureState::error`. A user cancelling the gallery
/// picker is not an error and is reported as
/// [`PickOutcome::Cancelled`](super::PickOutcome::Cancelled) instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CameraError {
    /// Camera permission was not granted
    #[error("Camera permission is required to take photos")]
    PermissionDenied,

    /// No usable camera on this device
    #[error("Camera is not available on this device")]
    CameraUnavailable,

    /// The camera failed to produce a photo
    #[error("Failed to capture photo: {0}")]
    CaptureFailed(String),

    /// The gallery picker failed
    #[error("Failed to pick image: {0}")]
    PickFailed(String),

    /// The optimizer failed; the unoptimized image is used instead
    #[error("Image optimization failed: {0}")]
    OptimizationFailed(String),

    /// The story upload failed; the image and caption are kept for a retry
    #[error("Failed to post story: {0}")]
    PostFailed(String),

    /// The permission collaborator failed
    #[error("Failed to check permissions: {0}")]
    PermissionCheckFailed(String),
}

/// Error returned by a collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    /// The platform rejected the request
    #[error("{0}")]
    Failed(String),

    /// The underlying device is missing
    #[error("device unavailable")]
    Unavailable,
}

impl CollaboratorError {
    /// Convenience constructor
    pub fn failed(message: impl Into<String>) -> Self {
        CollaboratorError::Failed(message.into())
    }
}

/// Result type for collaborator calls
pub type Result<T> = std::result::Result<T, CollaboratorError>;
