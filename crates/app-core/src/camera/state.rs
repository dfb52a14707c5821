//! Camera screen state
//!
//! Plain data describing one camera screen session. Every field is mutated
//! by [`CaptureController`](super::CaptureController) only; presentation code
//! reads snapshots.

use serde::{Deserialize, Serialize};

/// Which physical camera is in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    /// Rear camera
    #[default]
    Back,
    /// Selfie camera
    Front,
}

impl CameraType {
    /// The other camera
    pub fn next(self) -> Self {
        match self {
            CameraType::Back => CameraType::Front,
            CameraType::Front => CameraType::Back,
        }
    }
}

/// Flash setting, cycled Off → On → Auto → Off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlashMode {
    /// Flash disabled
    #[default]
    Off,
    /// Flash always fires
    On,
    /// Flash fires in low light
    Auto,
}

impl FlashMode {
    /// All modes in cycling order
    pub const ALL: [FlashMode; 3] = [FlashMode::Off, FlashMode::On, FlashMode::Auto];

    /// Next mode in the cycle
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }

    /// Icon shown on the flash button
    pub fn icon(&self) -> &'static str {
        match self {
            FlashMode::Off => "flash-off",
            FlashMode::On => "flash",
            FlashMode::Auto => "flash-auto",
        }
    }
}

/// Self-timer setting, cycled Off → 3s → 10s → Off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimerMode {
    /// Capture immediately
    #[default]
    #[serde(rename = "off")]
    Off,
    /// Three second countdown
    #[serde(rename = "3s")]
    ThreeSeconds,
    /// Ten second countdown
    #[serde(rename = "10s")]
    TenSeconds,
}

impl TimerMode {
    /// All modes in cycling order
    pub const ALL: [TimerMode; 3] = [TimerMode::Off, TimerMode::ThreeSeconds, TimerMode::TenSeconds];

    /// Next mode in the cycle
    pub fn next(self) -> Self {
        match self {
            TimerMode::Off => TimerMode::ThreeSeconds,
            TimerMode::ThreeSeconds => TimerMode::TenSeconds,
            TimerMode::TenSeconds => TimerMode::Off,
        }
    }

    /// Countdown length in seconds (0 when off)
    pub fn seconds(&self) -> u32 {
        match self {
            TimerMode::Off => 0,
            TimerMode::ThreeSeconds => 3,
            TimerMode::TenSeconds => 10,
        }
    }

    /// Short label for the timer button
    pub fn label(&self) -> &'static str {
        match self {
            TimerMode::Off => "Off",
            TimerMode::ThreeSeconds => "3s",
            TimerMode::TenSeconds => "10s",
        }
    }
}

/// Where the selected image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// Taken with the camera
    Camera,
    /// Picked from the media library
    Gallery,
}

/// Metadata describing a captured or picked image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Encoded size in bytes, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Whether the optimizer produced this asset
    #[serde(default)]
    pub optimized: bool,
    /// Original size divided by optimized size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f32>,
}

impl ImageAsset {
    /// Create an unoptimized asset with known dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            file_size: None,
            optimized: false,
            compression_ratio: None,
        }
    }

    /// Set the file size
    pub fn with_file_size(mut self, size: u64) -> Self {
        self.file_size = Some(size);
        self
    }

    /// Compression ratio worth showing (only ratios above 1 mean a smaller file)
    pub fn displayed_compression_ratio(&self) -> Option<f32> {
        self.compression_ratio.filter(|ratio| *ratio > 1.0)
    }

    /// Whether both dimensions are known
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// An image attached to the session: metadata, location and origin together
///
/// The three parts are always set and cleared as one record, so there is no
/// state where a URI exists without its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedImage {
    /// Image metadata
    pub asset: ImageAsset,
    /// Local URI of the image file
    pub uri: String,
    /// Camera or gallery
    pub source: ImageSource,
}

/// Screen-space position of the overlay text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TextPosition {
    /// Horizontal offset
    pub x: f32,
    /// Vertical offset
    pub y: f32,
}

impl TextPosition {
    /// Create a position
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Permission status reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatus {
    /// Camera access granted
    pub camera: bool,
    /// Media library access granted
    pub media_library: bool,
}

/// Mutable state of one camera screen session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureState {
    /// Camera permission granted and a camera present
    pub camera_available: bool,
    /// Initial permission check running
    pub is_loading: bool,
    /// Permission prompt in flight
    pub is_requesting: bool,
    /// Error shown to the user, cleared by the next action
    pub error: Option<String>,
    /// Last permission status reported by the platform
    pub permissions: Option<PermissionStatus>,

    /// Active camera
    pub camera_type: CameraType,
    /// Flash setting
    pub flash_mode: FlashMode,
    /// Zoom factor in `[0, 1]`
    pub zoom: f32,
    /// Rule-of-thirds grid overlay
    pub show_grid: bool,
    /// Self-timer setting
    pub timer_mode: TimerMode,
    /// Countdown running
    pub is_timer_active: bool,
    /// Seconds left on the countdown
    pub timer_count: u32,

    /// Camera finished initializing
    pub is_camera_ready: bool,
    /// Capture in flight
    pub is_capturing: bool,
    /// Gallery picker open
    pub is_picking_image: bool,

    /// Image under review
    pub selected: Option<SelectedImage>,
    /// Run new images through the optimizer
    pub auto_optimize: bool,

    /// Committed overlay caption
    pub overlay_text: String,
    /// Caption being edited in the text modal
    pub overlay_draft: Option<String>,
    /// Text modal visible
    pub show_text_overlay: bool,
    /// Committed overlay position
    pub text_position: TextPosition,
}

impl Default for CaptureState {
    fn default() -> Self {
        Self {
            camera_available: false,
            is_loading: true,
            is_requesting: false,
            error: None,
            permissions: None,
            camera_type: CameraType::default(),
            flash_mode: FlashMode::default(),
            zoom: 0.0,
            show_grid: false,
            timer_mode: TimerMode::default(),
            is_timer_active: false,
            timer_count: 0,
            is_camera_ready: false,
            is_capturing: false,
            is_picking_image: false,
            selected: None,
            auto_optimize: true,
            overlay_text: String::new(),
            overlay_draft: None,
            show_text_overlay: false,
            text_position: TextPosition::default(),
        }
    }
}

impl CaptureState {
    /// Metadata of the selected image
    pub fn selected_image(&self) -> Option<&ImageAsset> {
        self.selected.as_ref().map(|s| &s.asset)
    }

    /// URI of the selected image
    pub fn captured_photo(&self) -> Option<&str> {
        self.selected.as_ref().map(|s| s.uri.as_str())
    }

    /// Origin of the selected image
    pub fn image_source(&self) -> Option<ImageSource> {
        self.selected.as_ref().map(|s| s.source)
    }

    /// Text shown in the edit modal: the draft while editing, else the caption
    pub fn editing_text(&self) -> &str {
        self.overlay_draft.as_deref().unwrap_or(&self.overlay_text)
    }

    /// Drop the selected image and everything layered on it
    pub(crate) fn clear_selection(&mut self) {
        self.selected = None;
        self.overlay_text.clear();
        self.overlay_draft = None;
        self.show_text_overlay = false;
        self.text_position = TextPosition::default();
    }
}

/// Progress of the current story upload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostingState {
    /// Upload in flight
    pub is_posting_story: bool,
    /// Percent complete, meaningful only while posting
    pub posting_progress: f32,
}

impl PostingState {
    /// Progress to display, `None` when no upload is running
    pub fn progress(&self) -> Option<f32> {
        self.is_posting_story.then_some(self.posting_progress)
    }
}

/// Phase of the capture state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum CapturePhase {
    /// Checking permissions on mount
    #[default]
    Loading,
    /// Camera permission missing or no camera
    PermissionDenied,
    /// Live viewfinder
    Live,
    /// Self-timer counting down
    TimerCountdown,
    /// Waiting for the camera (and optimizer)
    Capturing,
    /// Image selected, preview shown
    Reviewing,
    /// Text modal open over the preview
    EditingOverlayText,
    /// Story upload in flight
    Posting,
    /// Screen unmounted
    Closed,
}

/// Everything a presentation layer needs to render the camera screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSnapshot {
    /// State machine phase
    pub phase: CapturePhase,
    /// Screen state
    pub state: CaptureState,
    /// Upload progress
    pub posting: PostingState,
}
