//! Camera screen view model
//!
//! Turns a [`CaptureSnapshot`] into the props the frontend renders. Nothing
//! here mutates capture state; user input goes back to the session as
//! [`Message`]s.

use app_core::camera::{CapturePhase, CaptureSnapshot, CaptureState, ImageAsset, ImageSource, Message, TextPosition};
use app_core::overlay::OverlayDrag;
use serde::Serialize;

/// Captions longer than this are truncated in the status card
pub const CAPTION_PREVIEW_CHARS: usize = 40;

/// Distance the preview controls slide down when hidden
pub const CONTROLS_HIDDEN_OFFSET: f32 = 200.0;

/// Top-level render state of the camera tab
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum CameraScreen {
    /// Spinner while permissions are checked
    Loading {
        /// Spinner caption
        message: String,
    },
    /// Permission request screen
    Permission(PermissionView),
    /// Live viewfinder
    Camera(ViewfinderView),
    /// Review of the selected image
    Preview(PreviewView),
    /// Screen has been unmounted
    Closed,
}

impl CameraScreen {
    /// Compute the render state for a snapshot
    pub fn from_snapshot(snapshot: &CaptureSnapshot) -> Self {
        let state = &snapshot.state;
        match snapshot.phase {
            CapturePhase::Closed => CameraScreen::Closed,
            CapturePhase::Loading => CameraScreen::Loading {
                message: "Checking camera...".to_string(),
            },
            CapturePhase::Reviewing | CapturePhase::EditingOverlayText | CapturePhase::Posting => {
                match PreviewView::new(snapshot) {
                    Some(preview) => CameraScreen::Preview(preview),
                    None => CameraScreen::home(state),
                }
            }
            CapturePhase::PermissionDenied => CameraScreen::Permission(PermissionView::new(state)),
            CapturePhase::Live | CapturePhase::TimerCountdown | CapturePhase::Capturing => {
                CameraScreen::Camera(ViewfinderView::new(state))
            }
        }
    }

    fn home(state: &CaptureState) -> Self {
        if state.camera_available {
            CameraScreen::Camera(ViewfinderView::new(state))
        } else {
            CameraScreen::Permission(PermissionView::new(state))
        }
    }
}

// =============================================================================
// Permission
// =============================================================================

/// Permission request screen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionView {
    /// Headline
    pub title: String,
    /// Explanation or the last error
    pub message: String,
    /// Label of the grant button
    pub request_label: String,
    /// Grant button enabled
    pub can_request: bool,
    /// Gallery access granted, so picking still works
    pub can_pick_from_gallery: bool,
}

impl PermissionView {
    fn new(state: &CaptureState) -> Self {
        let message = state.error.clone().unwrap_or_else(|| {
            "Allow camera access to take photos and share stories.".to_string()
        });
        Self {
            title: "Camera Access Needed".to_string(),
            message,
            request_label: if state.is_requesting {
                "Requesting...".to_string()
            } else {
                "Grant Permission".to_string()
            },
            can_request: !state.is_requesting,
            can_pick_from_gallery: state
                .permissions
                .map(|p| p.media_library)
                .unwrap_or(false)
                && !state.is_picking_image,
        }
    }
}

// =============================================================================
// Viewfinder
// =============================================================================

/// Live camera controls
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewfinderView {
    /// Flash button icon
    pub flash_icon: &'static str,
    /// Timer button label
    pub timer_label: &'static str,
    /// Big number over the viewfinder while counting down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u32>,
    /// Rule-of-thirds grid
    pub show_grid: bool,
    /// Zoom as a whole percentage
    pub zoom_percent: u32,
    /// Shutter enabled
    pub can_capture: bool,
    /// Shutter shows a spinner
    pub is_capturing: bool,
    /// Gallery button enabled
    pub can_pick: bool,
    /// Label of the optimization toggle
    pub optimize_label: &'static str,
    /// Inline error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ViewfinderView {
    fn new(state: &CaptureState) -> Self {
        let busy = state.is_capturing || state.is_picking_image;
        Self {
            flash_icon: state.flash_mode.icon(),
            timer_label: state.timer_mode.label(),
            countdown: state.is_timer_active.then_some(state.timer_count),
            show_grid: state.show_grid,
            zoom_percent: (state.zoom.clamp(0.0, 1.0) * 100.0).round() as u32,
            // Pressing again during the countdown cancels it
            can_capture: state.is_camera_ready && !busy,
            is_capturing: state.is_capturing,
            can_pick: !busy && !state.is_timer_active,
            optimize_label: if state.auto_optimize { "HD" } else { "RAW" },
            error: state.error.clone(),
        }
    }
}

// =============================================================================
// Preview
// =============================================================================

/// One metadata chip under the preview
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum MetadataBadge {
    /// Human readable file size
    FileSize(String),
    /// `WxH`
    Dimensions(String),
    /// Optimizer ran
    Optimized,
    /// Compression ratio above 1
    Compression(String),
}

impl MetadataBadge {
    /// Badges for an asset, in display order
    pub fn for_asset(asset: &ImageAsset) -> Vec<MetadataBadge> {
        let mut badges = Vec::new();
        if let Some(size) = asset.file_size.filter(|size| *size > 0) {
            badges.push(MetadataBadge::FileSize(format_file_size(size)));
        }
        if asset.has_dimensions() {
            badges.push(MetadataBadge::Dimensions(format!("{}x{}", asset.width, asset.height)));
        }
        if asset.optimized {
            badges.push(MetadataBadge::Optimized);
        }
        if let Some(ratio) = asset.displayed_compression_ratio() {
            badges.push(MetadataBadge::Compression(format!("{ratio:.1}x smaller")));
        }
        badges
    }

    /// Text on the chip
    pub fn label(&self) -> String {
        match self {
            MetadataBadge::FileSize(size) => size.clone(),
            MetadataBadge::Dimensions(dims) => dims.clone(),
            MetadataBadge::Optimized => "Optimized".to_string(),
            MetadataBadge::Compression(text) => text.clone(),
        }
    }
}

/// Caption summary in the status card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionPreview {
    /// Full caption drawn over the image
    pub text: String,
    /// Truncated caption for the status card
    pub excerpt: String,
    /// Committed position
    pub position: TextPosition,
}

/// Share button
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostButton {
    /// Button text
    pub label: String,
    /// Disabled while an upload runs
    pub enabled: bool,
}

impl PostButton {
    fn new(snapshot: &CaptureSnapshot) -> Self {
        match snapshot.posting.progress() {
            Some(progress) => Self {
                label: format!("{}%", progress.round() as i64),
                enabled: false,
            },
            None => Self {
                label: "Share Story".to_string(),
                enabled: true,
            },
        }
    }
}

/// Text edit modal
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextModalView {
    /// Current draft
    pub text: String,
    /// Editing an existing caption
    pub is_editing: bool,
}

/// Image review screen
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewView {
    /// Image to show
    pub image_uri: String,
    /// Header title
    pub title: &'static str,
    /// Status line in the bottom card
    pub status: String,
    /// Metadata chips
    pub badges: Vec<MetadataBadge>,
    /// Caption, when one is committed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<CaptionPreview>,
    /// Add/Edit text button label
    pub text_button_label: &'static str,
    /// Share button
    pub post_button: PostButton,
    /// Text modal, when open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_modal: Option<TextModalView>,
    /// Inline error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreviewView {
    fn new(snapshot: &CaptureSnapshot) -> Option<Self> {
        let state = &snapshot.state;
        let selected = state.selected.as_ref()?;

        let mut status = "Ready to share!".to_string();
        if selected.asset.optimized {
            status.push_str(" • Optimized for best quality");
        }

        let caption = (!state.overlay_text.is_empty()).then(|| CaptionPreview {
            text: state.overlay_text.clone(),
            excerpt: truncate_caption(&state.overlay_text),
            position: state.text_position,
        });

        let text_modal = state.show_text_overlay.then(|| TextModalView {
            text: state.editing_text().to_string(),
            is_editing: !state.overlay_text.is_empty(),
        });

        Some(Self {
            image_uri: selected.uri.clone(),
            title: match selected.source {
                ImageSource::Camera => "Photo Ready",
                ImageSource::Gallery => "From Gallery",
            },
            status,
            badges: MetadataBadge::for_asset(&selected.asset),
            text_button_label: if caption.is_some() { "Edit Text" } else { "Add Text" },
            caption,
            post_button: PostButton::new(snapshot),
            text_modal,
            error: state.error.clone(),
        })
    }
}

/// Show/hide state of the bottom preview card
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewControls {
    visible: bool,
}

impl Default for PreviewControls {
    fn default() -> Self {
        Self { visible: true }
    }
}

impl PreviewControls {
    /// Tap on the photo
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Whether the card is shown
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Spring target for the card's vertical translation
    pub fn translate_y(&self) -> f32 {
        if self.visible {
            0.0
        } else {
            CONTROLS_HIDDEN_OFFSET
        }
    }

    /// Hint shown over the photo, if any
    pub fn hint(&self, has_caption: bool) -> Option<&'static str> {
        match (self.visible, has_caption) {
            (false, _) => Some("Tap to show controls"),
            (true, true) => Some("Drag text to move it around"),
            (true, false) => None,
        }
    }
}

/// Caption drag wired to the session
///
/// Wraps [`OverlayDrag`] and produces the single
/// [`Message::UpdateTextPosition`] to send when a gesture is released.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptionGesture {
    drag: OverlayDrag,
}

impl CaptionGesture {
    /// Follow the committed position from the latest snapshot
    pub fn sync(&mut self, state: &CaptureState) {
        self.drag.sync(state.text_position);
    }

    /// Pan began
    pub fn start(&mut self) {
        self.drag.on_drag_start();
    }

    /// Pan moved by the cumulative translation
    pub fn update(&mut self, dx: f32, dy: f32) {
        self.drag.on_drag_update(dx, dy);
    }

    /// Pan released; the message to send, if a gesture was active
    pub fn end(&mut self) -> Option<Message> {
        self.drag.release().map(Message::UpdateTextPosition)
    }

    /// Pan interrupted
    pub fn cancel(&mut self) {
        self.drag.on_drag_cancel();
    }

    /// Position to draw this frame
    pub fn position(&self) -> TextPosition {
        self.drag.live_position()
    }

    /// Whether the caption is being dragged (taps are ignored meanwhile)
    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }
}

/// First 40 characters of a caption, with an ellipsis when cut
pub fn truncate_caption(text: &str) -> String {
    let mut chars = text.chars();
    let excerpt: String = chars.by_ref().take(CAPTION_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{excerpt}...")
    } else {
        excerpt
    }
}

/// Format a byte count as `"1.5 MB"` style text
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{value:.2}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::camera::{PermissionStatus, PostingState, SelectedImage};

    fn snapshot(phase: CapturePhase, state: CaptureState) -> CaptureSnapshot {
        CaptureSnapshot {
            phase,
            state,
            posting: PostingState::default(),
        }
    }

    fn reviewing(source: ImageSource, asset: ImageAsset) -> CaptureSnapshot {
        let mut state = CaptureState {
            is_loading: false,
            camera_available: true,
            is_camera_ready: true,
            ..CaptureState::default()
        };
        state.selected = Some(SelectedImage {
            asset,
            uri: "file:///tmp/story.jpg".to_string(),
            source,
        });
        snapshot(CapturePhase::Reviewing, state)
    }

    fn preview(snapshot: &CaptureSnapshot) -> PreviewView {
        match CameraScreen::from_snapshot(snapshot) {
            CameraScreen::Preview(view) => view,
            other => panic!("expected preview, got {other:?}"),
        }
    }

    #[test]
    fn test_loading_screen() {
        let screen = CameraScreen::from_snapshot(&snapshot(CapturePhase::Loading, CaptureState::default()));
        assert_eq!(
            screen,
            CameraScreen::Loading {
                message: "Checking camera...".to_string()
            }
        );
    }

    #[test]
    fn test_permission_screen_shows_error_and_gallery() {
        let state = CaptureState {
            is_loading: false,
            error: Some("Camera permission is required to take photos".to_string()),
            permissions: Some(PermissionStatus {
                camera: false,
                media_library: true,
            }),
            ..CaptureState::default()
        };
        match CameraScreen::from_snapshot(&snapshot(CapturePhase::PermissionDenied, state)) {
            CameraScreen::Permission(view) => {
                assert_eq!(view.message, "Camera permission is required to take photos");
                assert!(view.can_pick_from_gallery);
                assert!(view.can_request);
                assert_eq!(view.request_label, "Grant Permission");
            }
            other => panic!("expected permission screen, got {other:?}"),
        }
    }

    #[test]
    fn test_viewfinder_countdown() {
        let state = CaptureState {
            is_loading: false,
            camera_available: true,
            is_camera_ready: true,
            is_timer_active: true,
            timer_count: 3,
            zoom: 0.25,
            ..CaptureState::default()
        };
        match CameraScreen::from_snapshot(&snapshot(CapturePhase::TimerCountdown, state)) {
            CameraScreen::Camera(view) => {
                assert_eq!(view.countdown, Some(3));
                assert_eq!(view.zoom_percent, 25);
                assert!(view.can_capture);
                assert!(!view.can_pick);
                assert_eq!(view.optimize_label, "HD");
            }
            other => panic!("expected viewfinder, got {other:?}"),
        }
    }

    #[test]
    fn test_preview_header_depends_on_source() {
        let camera = preview(&reviewing(ImageSource::Camera, ImageAsset::new(1080, 1920)));
        assert_eq!(camera.title, "Photo Ready");
        assert_eq!(camera.status, "Ready to share!");

        let gallery = preview(&reviewing(ImageSource::Gallery, ImageAsset::new(1080, 1920)));
        assert_eq!(gallery.title, "From Gallery");
    }

    #[test]
    fn test_metadata_badges() {
        let asset = ImageAsset {
            width: 1080,
            height: 1920,
            file_size: Some(1_572_864),
            optimized: true,
            compression_ratio: Some(2.46),
        };
        let view = preview(&reviewing(ImageSource::Camera, asset));

        let labels: Vec<_> = view.badges.iter().map(MetadataBadge::label).collect();
        assert_eq!(labels, ["1.5 MB", "1080x1920", "Optimized", "2.5x smaller"]);
        assert!(view.status.ends_with("Optimized for best quality"));
    }

    #[test]
    fn test_ratio_of_one_is_hidden() {
        let mut asset = ImageAsset::new(0, 0);
        asset.compression_ratio = Some(1.0);
        assert!(MetadataBadge::for_asset(&asset).is_empty());
    }

    #[test]
    fn test_caption_and_buttons() {
        let mut snap = reviewing(ImageSource::Camera, ImageAsset::new(100, 100));
        let view = preview(&snap);
        assert!(view.caption.is_none());
        assert_eq!(view.text_button_label, "Add Text");
        assert_eq!(view.post_button.label, "Share Story");
        assert!(view.post_button.enabled);

        snap.state.overlay_text = "a".repeat(45);
        snap.phase = CapturePhase::Posting;
        snap.posting = PostingState {
            is_posting_story: true,
            posting_progress: 42.6,
        };
        let view = preview(&snap);
        let caption = view.caption.unwrap();
        assert_eq!(caption.excerpt, format!("{}...", "a".repeat(40)));
        assert_eq!(view.text_button_label, "Edit Text");
        assert_eq!(view.post_button.label, "43%");
        assert!(!view.post_button.enabled);
    }

    #[test]
    fn test_text_modal_shows_draft() {
        let mut snap = reviewing(ImageSource::Gallery, ImageAsset::new(100, 100));
        snap.phase = CapturePhase::EditingOverlayText;
        snap.state.show_text_overlay = true;
        snap.state.overlay_draft = Some("hel".to_string());

        let modal = preview(&snap).text_modal.unwrap();
        assert_eq!(modal.text, "hel");
        assert!(!modal.is_editing);
    }

    #[test]
    fn test_truncate_caption_counts_chars() {
        assert_eq!(truncate_caption("short"), "short");
        assert_eq!(truncate_caption(&"x".repeat(40)), "x".repeat(40));
        let emoji = "🎉".repeat(41);
        assert_eq!(truncate_caption(&emoji), format!("{}...", "🎉".repeat(40)));
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
    }

    #[test]
    fn test_preview_controls_toggle() {
        let mut controls = PreviewControls::default();
        assert!(controls.is_visible());
        assert_eq!(controls.translate_y(), 0.0);
        assert_eq!(controls.hint(true), Some("Drag text to move it around"));
        assert_eq!(controls.hint(false), None);

        controls.toggle();
        assert_eq!(controls.translate_y(), CONTROLS_HIDDEN_OFFSET);
        assert_eq!(controls.hint(true), Some("Tap to show controls"));
    }

    #[test]
    fn test_caption_gesture_sends_one_message() {
        let mut state = CaptureState::default();
        state.text_position = TextPosition::new(10.0, 20.0);

        let mut gesture = CaptionGesture::default();
        gesture.sync(&state);
        gesture.start();
        gesture.update(5.0, 5.0);
        gesture.update(30.0, -10.0);
        assert!(gesture.is_dragging());
        assert_eq!(gesture.position(), TextPosition::new(40.0, 10.0));

        assert_eq!(
            gesture.end(),
            Some(Message::UpdateTextPosition(TextPosition::new(40.0, 10.0)))
        );
        assert_eq!(gesture.end(), None);
    }
}
