//! Capabilities the camera flow depends on but does not implement
//!
//! Each collaborator is an async trait object so the session runtime can hold
//! `Arc<dyn …>` and call it from spawned tasks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::error::Result;
use super::state::{ImageAsset, PermissionStatus, TextPosition};

/// Platform permission prompts
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Current status without prompting
    async fn status(&self) -> Result<PermissionStatus>;

    /// Prompt the user and return the resulting status
    async fn request(&self) -> Result<PermissionStatus>;
}

/// An image produced by the camera or the picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedImage {
    /// Local URI of the image file
    pub uri: String,
    /// Metadata as reported by the device
    pub asset: ImageAsset,
}

/// Result of opening the gallery picker
#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    /// The user chose an image
    Picked(CapturedImage),
    /// The user dismissed the picker
    Cancelled,
}

/// Camera shutter and media library picker
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Take a photo with the live camera
    async fn capture(&self) -> Result<CapturedImage>;

    /// Let the user pick an image from the media library
    async fn pick_from_gallery(&self) -> Result<PickOutcome>;
}

/// Image optimization
#[async_trait]
pub trait ImageOptimizer: Send + Sync {
    /// Optimize the image at `uri` and describe the result
    async fn optimize(&self, uri: &str) -> Result<ImageAsset>;
}

/// Story contents handed to the uploader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPost {
    /// Local URI of the image
    pub uri: String,
    /// Caption drawn over the image (may be empty)
    pub overlay_text: String,
    /// Caption position
    pub text_position: TextPosition,
}

/// Channel the uploader reports percent-complete values on
pub type ProgressSender = mpsc::UnboundedSender<f32>;

/// Story upload
#[async_trait]
pub trait StoryUploader: Send + Sync {
    /// Upload a story, sending progress in `[0, 100]` while it runs
    async fn post(&self, story: StoryPost, progress: ProgressSender) -> Result<()>;
}

/// The full set of collaborators for one camera session
#[derive(Clone)]
pub struct Collaborators {
    /// Permission prompts
    pub permissions: Arc<dyn PermissionProvider>,
    /// Camera and picker
    pub capture: Arc<dyn CaptureProvider>,
    /// Optimizer
    pub optimizer: Arc<dyn ImageOptimizer>,
    /// Story upload
    pub uploader: Arc<dyn StoryUploader>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
