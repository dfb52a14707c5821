//! Capture state controller
//!
//! [`CaptureController`] owns the camera screen state and implements the
//! capture → review → edit → post state machine. It never performs I/O:
//! [`CaptureController::handle`] applies one [`Message`] and returns the
//! [`Effect`]s the caller must run. Collaborator results come back as
//! messages carrying the [`Token`] of the request that produced them, and a
//! result whose token is no longer current is discarded.

use tracing::{debug, info, warn};

use super::collaborators::{CapturedImage, PickOutcome, StoryPost};
use super::error::{CameraError, CollaboratorError};
use super::preferences::CameraPreferences;
use super::state::{
    CapturePhase, CaptureSnapshot, CaptureState, ImageAsset, ImageSource, PermissionStatus,
    PostingState, SelectedImage, TextPosition,
};

/// Identifies one in-flight request
pub type Token = u64;

/// Input to the controller: user actions and collaborator results
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Prompt for camera and media library access
    RequestPermissions,
    /// Re-read permission status without prompting
    RefreshPermissions,
    /// Cycle the flash mode
    ToggleFlashMode,
    /// Switch between front and back camera
    ToggleCameraType,
    /// Show or hide the grid
    ToggleGrid,
    /// Cycle the self-timer
    ToggleTimer,
    /// Change zoom by a delta
    AdjustZoom(f32),
    /// Zoom in by the configured step
    ZoomIn,
    /// Zoom out by the configured step
    ZoomOut,
    /// The camera finished initializing
    CameraReady,
    /// Shutter pressed (starts the countdown when a timer is set)
    Capture,
    /// Stop a running countdown
    CancelTimer,
    /// Open the gallery picker
    PickFromGallery,
    /// Back from the preview, dropping the image
    ResetImage,
    /// Flip automatic optimization
    ToggleOptimization,
    /// Open the text modal to add or edit the caption
    BeginTextEdit,
    /// Text modal input changed
    SetOverlayText(String),
    /// Text modal confirmed
    ConfirmText,
    /// Text modal dismissed
    CancelText,
    /// Remove the caption
    ClearText,
    /// Commit a dragged caption position
    UpdateTextPosition(TextPosition),
    /// Share the story
    PostStory,
    /// Screen unmounted
    Unmount,

    /// Result of the permission status check
    PermissionsChecked(Result<PermissionStatus, CollaboratorError>),
    /// Result of the permission prompt
    PermissionsRequested(Result<PermissionStatus, CollaboratorError>),
    /// One second of countdown elapsed
    TimerTick {
        /// Countdown the tick belongs to
        token: Token,
    },
    /// Camera returned
    CaptureFinished {
        /// Request token
        token: Token,
        /// Captured image or failure
        result: Result<CapturedImage, CollaboratorError>,
    },
    /// Gallery picker returned
    PickFinished {
        /// Request token
        token: Token,
        /// Picked image, cancellation or failure
        result: Result<PickOutcome, CollaboratorError>,
    },
    /// Optimizer returned
    OptimizeFinished {
        /// Request token
        token: Token,
        /// Optimized metadata or failure
        result: Result<ImageAsset, CollaboratorError>,
    },
    /// Upload progress
    PostProgress {
        /// Upload token
        token: Token,
        /// Percent complete
        progress: f32,
    },
    /// Upload finished
    PostFinished {
        /// Upload token
        token: Token,
        /// Success or failure
        result: Result<(), CollaboratorError>,
    },
}

impl Message {
    /// Whether the message comes from the user rather than a collaborator
    pub fn is_user_action(&self) -> bool {
        !matches!(
            self,
            Message::PermissionsChecked(_)
                | Message::PermissionsRequested(_)
                | Message::TimerTick { .. }
                | Message::CaptureFinished { .. }
                | Message::PickFinished { .. }
                | Message::OptimizeFinished { .. }
                | Message::PostProgress { .. }
                | Message::PostFinished { .. }
                | Message::Unmount
        )
    }
}

/// Side effect requested by the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call `PermissionProvider::status`
    CheckPermissions,
    /// Call `PermissionProvider::request`
    RequestPermissions,
    /// Send `ticks` one-second [`Message::TimerTick`]s
    StartTimer {
        /// Countdown token
        token: Token,
        /// Number of ticks to deliver
        ticks: u32,
    },
    /// Stop the running countdown
    CancelTimer,
    /// Call `CaptureProvider::capture`
    Capture {
        /// Request token
        token: Token,
    },
    /// Call `CaptureProvider::pick_from_gallery`
    PickFromGallery {
        /// Request token
        token: Token,
    },
    /// Call `ImageOptimizer::optimize`
    Optimize {
        /// Request token
        token: Token,
        /// Image to optimize
        uri: String,
    },
    /// Call `StoryUploader::post`
    Post {
        /// Upload token
        token: Token,
        /// Story contents
        story: StoryPost,
    },
    /// Abort everything in flight
    CancelAll,
}

/// Image waiting for the optimizer
#[derive(Debug, Clone)]
struct PendingImage {
    image: CapturedImage,
    source: ImageSource,
}

/// The camera screen state machine
#[derive(Debug, Clone)]
pub struct CaptureController {
    state: CaptureState,
    phase: CapturePhase,
    posting: PostingState,
    preferences: CameraPreferences,

    next_token: Token,
    timer_token: Option<Token>,
    /// Capture or pick (including its optimization step)
    image_token: Option<Token>,
    post_token: Option<Token>,
    pending: Option<PendingImage>,
}

impl Default for CaptureController {
    fn default() -> Self {
        Self::new(CameraPreferences::default())
    }
}

impl CaptureController {
    /// Create a controller in the `Loading` phase
    pub fn new(preferences: CameraPreferences) -> Self {
        let state = CaptureState {
            camera_type: preferences.camera_type,
            flash_mode: preferences.flash_mode,
            timer_mode: preferences.timer_mode,
            show_grid: preferences.show_grid,
            auto_optimize: preferences.auto_optimize,
            ..CaptureState::default()
        };

        Self {
            state,
            phase: CapturePhase::Loading,
            posting: PostingState::default(),
            preferences,
            next_token: 1,
            timer_token: None,
            image_token: None,
            post_token: None,
            pending: None,
        }
    }

    /// Effects to run when the screen mounts
    pub fn mount(&mut self) -> Vec<Effect> {
        debug!("Camera screen mounted, checking permissions");
        self.state.is_loading = true;
        vec![Effect::CheckPermissions]
    }

    /// Current screen state
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Current phase
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Current upload state
    pub fn posting(&self) -> PostingState {
        self.posting
    }

    /// Preferences the controller was created with
    pub fn preferences(&self) -> &CameraPreferences {
        &self.preferences
    }

    /// Owned copy of everything a renderer needs
    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            phase: self.phase,
            state: self.state.clone(),
            posting: self.posting,
        }
    }

    /// Apply a message and return the effects to run
    pub fn handle(&mut self, message: Message) -> Vec<Effect> {
        if self.phase == CapturePhase::Closed {
            debug!("Ignoring {:?} after unmount", message);
            return Vec::new();
        }

        if message.is_user_action() {
            self.state.error = None;
        }

        match message {
            Message::RequestPermissions => self.request_permissions(),
            Message::RefreshPermissions => self.refresh_permissions(),
            Message::ToggleFlashMode => {
                self.state.flash_mode = self.state.flash_mode.next();
                Vec::new()
            }
            Message::ToggleCameraType => {
                self.state.camera_type = self.state.camera_type.next();
                Vec::new()
            }
            Message::ToggleGrid => {
                self.state.show_grid = !self.state.show_grid;
                Vec::new()
            }
            Message::ToggleTimer => {
                self.state.timer_mode = self.state.timer_mode.next();
                Vec::new()
            }
            Message::AdjustZoom(delta) => {
                self.adjust_zoom(delta);
                Vec::new()
            }
            Message::ZoomIn => {
                self.adjust_zoom(self.preferences.effective_zoom_step());
                Vec::new()
            }
            Message::ZoomOut => {
                self.adjust_zoom(-self.preferences.effective_zoom_step());
                Vec::new()
            }
            Message::CameraReady => {
                self.state.is_camera_ready = true;
                Vec::new()
            }
            Message::Capture => self.start_timer_capture(),
            Message::CancelTimer => self.cancel_countdown(),
            Message::PickFromGallery => self.pick_image_from_gallery(),
            Message::ResetImage => self.reset_image(),
            Message::ToggleOptimization => {
                self.state.auto_optimize = !self.state.auto_optimize;
                Vec::new()
            }
            Message::BeginTextEdit => {
                self.begin_text_edit();
                Vec::new()
            }
            Message::SetOverlayText(text) => {
                if self.phase == CapturePhase::EditingOverlayText {
                    self.state.overlay_draft = Some(text);
                }
                Vec::new()
            }
            Message::ConfirmText => {
                self.finish_text_edit(true);
                Vec::new()
            }
            Message::CancelText => {
                self.finish_text_edit(false);
                Vec::new()
            }
            Message::ClearText => {
                if self.phase == CapturePhase::Reviewing {
                    self.state.overlay_text.clear();
                    self.state.text_position = TextPosition::default();
                }
                Vec::new()
            }
            Message::UpdateTextPosition(position) => {
                self.update_text_position(position);
                Vec::new()
            }
            Message::PostStory => self.handle_post_story(),
            Message::Unmount => self.unmount(),

            Message::PermissionsChecked(result) => self.on_permissions(result, false),
            Message::PermissionsRequested(result) => self.on_permissions(result, true),
            Message::TimerTick { token } => self.on_timer_tick(token),
            Message::CaptureFinished { token, result } => self.on_capture_finished(token, result),
            Message::PickFinished { token, result } => self.on_pick_finished(token, result),
            Message::OptimizeFinished { token, result } => {
                self.on_optimize_finished(token, result);
                Vec::new()
            }
            Message::PostProgress { token, progress } => {
                if self.post_token == Some(token) && self.posting.is_posting_story {
                    self.posting.posting_progress = progress.clamp(0.0, 100.0);
                }
                Vec::new()
            }
            Message::PostFinished { token, result } => {
                self.on_post_finished(token, result);
                Vec::new()
            }
        }
    }

    fn issue_token(&mut self) -> Token {
        let token = self.next_token;
        self.next_token += 1;
        token
    }

    /// Phase to return to when no image is selected
    fn home_phase(&self) -> CapturePhase {
        if self.state.camera_available {
            CapturePhase::Live
        } else {
            CapturePhase::PermissionDenied
        }
    }

    // ----- permissions -----

    fn request_permissions(&mut self) -> Vec<Effect> {
        if self.state.is_requesting {
            debug!("Permission request already in flight");
            return Vec::new();
        }
        self.state.is_requesting = true;
        vec![Effect::RequestPermissions]
    }

    fn refresh_permissions(&mut self) -> Vec<Effect> {
        if self.state.is_requesting {
            debug!("Permission request in flight, skipping refresh");
            return Vec::new();
        }
        self.state.is_loading = true;
        vec![Effect::CheckPermissions]
    }

    fn on_permissions(
        &mut self,
        result: Result<PermissionStatus, CollaboratorError>,
        prompted: bool,
    ) -> Vec<Effect> {
        if prompted {
            self.state.is_requesting = false;
        }
        self.state.is_loading = false;

        match result {
            Ok(status) => {
                info!(
                    camera = status.camera,
                    media_library = status.media_library,
                    "Camera permissions resolved"
                );
                self.state.permissions = Some(status);
                self.state.camera_available = status.camera;
                if prompted && !status.camera {
                    self.state.error = Some(CameraError::PermissionDenied.to_string());
                }
            }
            Err(CollaboratorError::Unavailable) => {
                warn!("No camera available");
                self.state.camera_available = false;
                self.state.error = Some(CameraError::CameraUnavailable.to_string());
            }
            Err(e) => {
                warn!("Permission check failed: {}", e);
                self.state.error = Some(CameraError::PermissionCheckFailed(e.to_string()).to_string());
            }
        }

        match self.phase {
            CapturePhase::Loading | CapturePhase::PermissionDenied | CapturePhase::Live => {
                self.phase = self.home_phase();
                Vec::new()
            }
            // Camera went away mid-countdown: the shot must not fire
            CapturePhase::TimerCountdown if !self.state.camera_available => {
                debug!("Camera lost during countdown");
                self.clear_countdown();
                self.phase = self.home_phase();
                vec![Effect::CancelTimer]
            }
            _ => Vec::new(),
        }
    }

    // ----- camera configuration -----

    fn adjust_zoom(&mut self, delta: f32) {
        if !delta.is_finite() {
            debug!("Ignoring non-finite zoom delta");
            return;
        }
        self.state.zoom = (self.state.zoom + delta).clamp(0.0, 1.0);
    }

    // ----- capture -----

    fn start_timer_capture(&mut self) -> Vec<Effect> {
        match self.phase {
            CapturePhase::TimerCountdown => return self.cancel_countdown(),
            CapturePhase::Live => {}
            other => {
                debug!("Capture ignored in {:?}", other);
                return Vec::new();
            }
        }

        if !self.state.is_camera_ready {
            warn!("Capture requested before the camera was ready");
            return Vec::new();
        }
        if self.state.is_capturing || self.state.is_picking_image {
            debug!("Capture already in flight");
            return Vec::new();
        }

        let seconds = self.state.timer_mode.seconds();
        if seconds == 0 {
            return self.begin_capture();
        }

        let token = self.issue_token();
        self.timer_token = Some(token);
        self.state.is_timer_active = true;
        self.state.timer_count = seconds;
        self.phase = CapturePhase::TimerCountdown;
        debug!(seconds, "Timer countdown started");
        vec![Effect::StartTimer {
            token,
            ticks: seconds,
        }]
    }

    fn cancel_countdown(&mut self) -> Vec<Effect> {
        if self.phase != CapturePhase::TimerCountdown {
            return Vec::new();
        }
        debug!(remaining = self.state.timer_count, "Timer countdown cancelled");
        self.clear_countdown();
        self.phase = self.home_phase();
        vec![Effect::CancelTimer]
    }

    fn clear_countdown(&mut self) {
        self.timer_token = None;
        self.state.is_timer_active = false;
        self.state.timer_count = 0;
    }

    fn on_timer_tick(&mut self, token: Token) -> Vec<Effect> {
        if self.timer_token != Some(token) || self.phase != CapturePhase::TimerCountdown {
            debug!(token, "Discarding stale timer tick");
            return Vec::new();
        }

        self.state.timer_count = self.state.timer_count.saturating_sub(1);
        if self.state.timer_count > 0 {
            return Vec::new();
        }

        self.clear_countdown();
        self.begin_capture()
    }

    fn begin_capture(&mut self) -> Vec<Effect> {
        let token = self.issue_token();
        self.image_token = Some(token);
        self.state.is_capturing = true;
        self.phase = CapturePhase::Capturing;
        vec![Effect::Capture { token }]
    }

    fn on_capture_finished(
        &mut self,
        token: Token,
        result: Result<CapturedImage, CollaboratorError>,
    ) -> Vec<Effect> {
        if self.image_token != Some(token) {
            debug!(token, "Discarding stale capture result");
            return Vec::new();
        }

        match result {
            Ok(image) => self.accept_image(image, ImageSource::Camera),
            Err(e) => {
                warn!("Capture failed: {}", e);
                self.image_token = None;
                self.state.is_capturing = false;
                self.state.error = Some(CameraError::CaptureFailed(e.to_string()).to_string());
                self.phase = self.home_phase();
                Vec::new()
            }
        }
    }

    // ----- gallery -----

    fn pick_image_from_gallery(&mut self) -> Vec<Effect> {
        if !matches!(
            self.phase,
            CapturePhase::Live | CapturePhase::Reviewing | CapturePhase::PermissionDenied
        ) {
            debug!("Gallery pick ignored in {:?}", self.phase);
            return Vec::new();
        }
        if self.state.is_picking_image {
            debug!("Gallery picker already open");
            return Vec::new();
        }

        let token = self.issue_token();
        self.image_token = Some(token);
        self.state.is_picking_image = true;
        vec![Effect::PickFromGallery { token }]
    }

    fn on_pick_finished(
        &mut self,
        token: Token,
        result: Result<PickOutcome, CollaboratorError>,
    ) -> Vec<Effect> {
        if self.image_token != Some(token) {
            debug!(token, "Discarding stale pick result");
            return Vec::new();
        }

        match result {
            Ok(PickOutcome::Picked(image)) => self.accept_image(image, ImageSource::Gallery),
            Ok(PickOutcome::Cancelled) => {
                debug!("Gallery pick cancelled");
                self.image_token = None;
                self.state.is_picking_image = false;
                Vec::new()
            }
            Err(e) => {
                warn!("Gallery pick failed: {}", e);
                self.image_token = None;
                self.state.is_picking_image = false;
                self.state.error = Some(CameraError::PickFailed(e.to_string()).to_string());
                Vec::new()
            }
        }
    }

    // ----- optimization -----

    /// Attach a new image, routing it through the optimizer first when enabled
    fn accept_image(&mut self, image: CapturedImage, source: ImageSource) -> Vec<Effect> {
        if !self.state.auto_optimize {
            self.attach(image.asset, image.uri, source);
            return Vec::new();
        }

        let Some(token) = self.image_token else {
            return Vec::new();
        };
        let uri = image.uri.clone();
        self.pending = Some(PendingImage { image, source });
        vec![Effect::Optimize { token, uri }]
    }

    fn on_optimize_finished(&mut self, token: Token, result: Result<ImageAsset, CollaboratorError>) {
        if self.image_token != Some(token) {
            debug!(token, "Discarding stale optimization result");
            return;
        }
        let Some(PendingImage { image, source }) = self.pending.take() else {
            return;
        };

        match result {
            Ok(asset) => self.attach(asset, image.uri, source),
            Err(e) => {
                warn!("Optimization failed, using original image: {}", e);
                self.attach(image.asset, image.uri, source);
                self.state.error = Some(CameraError::OptimizationFailed(e.to_string()).to_string());
            }
        }
    }

    fn attach(&mut self, asset: ImageAsset, uri: String, source: ImageSource) {
        if matches!(self.phase, CapturePhase::Posting | CapturePhase::EditingOverlayText) {
            warn!(?source, "Discarding image that arrived in {:?}", self.phase);
            self.image_token = None;
            self.pending = None;
            self.state.is_capturing = false;
            self.state.is_picking_image = false;
            return;
        }
        info!(?source, width = asset.width, height = asset.height, "Image selected");
        self.state.selected = Some(SelectedImage { asset, uri, source });
        self.image_token = None;
        self.pending = None;
        self.state.is_capturing = false;
        self.state.is_picking_image = false;
        self.phase = CapturePhase::Reviewing;
    }

    // ----- review -----

    fn reset_image(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        match self.phase {
            CapturePhase::TimerCountdown => return self.cancel_countdown(),
            CapturePhase::Reviewing | CapturePhase::Capturing => {}
            CapturePhase::Live | CapturePhase::PermissionDenied if self.state.is_picking_image => {}
            other => {
                debug!("Back ignored in {:?}", other);
                return effects;
            }
        }

        if self.timer_token.is_some() {
            self.clear_countdown();
            effects.push(Effect::CancelTimer);
        }
        self.image_token = None;
        self.pending = None;
        self.state.is_capturing = false;
        self.state.is_picking_image = false;
        self.state.clear_selection();
        self.phase = self.home_phase();
        effects
    }

    fn begin_text_edit(&mut self) {
        if self.phase != CapturePhase::Reviewing || self.state.is_picking_image {
            debug!("Text edit ignored in {:?}", self.phase);
            return;
        }
        self.state.overlay_draft = Some(self.state.overlay_text.clone());
        self.state.show_text_overlay = true;
        self.phase = CapturePhase::EditingOverlayText;
    }

    fn finish_text_edit(&mut self, commit: bool) {
        if self.phase != CapturePhase::EditingOverlayText {
            return;
        }
        let draft = self.state.overlay_draft.take();
        if commit {
            if let Some(text) = draft {
                self.state.overlay_text = text.trim().to_string();
            }
        }
        self.state.show_text_overlay = false;
        self.phase = CapturePhase::Reviewing;
    }

    fn update_text_position(&mut self, position: TextPosition) {
        if self.phase != CapturePhase::Reviewing {
            debug!("Text position update ignored in {:?}", self.phase);
            return;
        }
        if !position.x.is_finite() || !position.y.is_finite() {
            return;
        }
        self.state.text_position = position;
    }

    // ----- posting -----

    fn handle_post_story(&mut self) -> Vec<Effect> {
        if self.posting.is_posting_story {
            debug!("Story post already in flight");
            return Vec::new();
        }
        if self.state.is_picking_image || self.pending.is_some() {
            debug!("Post ignored while a new image is on its way");
            return Vec::new();
        }
        if self.phase != CapturePhase::Reviewing {
            debug!("Post ignored in {:?}", self.phase);
            return Vec::new();
        }
        let Some(selected) = self.state.selected.as_ref() else {
            return Vec::new();
        };

        let story = StoryPost {
            uri: selected.uri.clone(),
            overlay_text: self.state.overlay_text.clone(),
            text_position: self.state.text_position,
        };
        let token = self.issue_token();
        self.post_token = Some(token);
        self.posting = PostingState {
            is_posting_story: true,
            posting_progress: 0.0,
        };
        self.phase = CapturePhase::Posting;
        info!("Posting story");
        vec![Effect::Post { token, story }]
    }

    fn on_post_finished(&mut self, token: Token, result: Result<(), CollaboratorError>) {
        if self.post_token != Some(token) {
            debug!(token, "Discarding stale post result");
            return;
        }
        self.post_token = None;
        self.posting = PostingState::default();

        match result {
            Ok(()) => {
                info!("Story posted");
                self.state.clear_selection();
                self.phase = self.home_phase();
            }
            Err(e) => {
                warn!("Story post failed: {}", e);
                self.state.error = Some(CameraError::PostFailed(e.to_string()).to_string());
                self.phase = CapturePhase::Reviewing;
            }
        }
    }

    // ----- teardown -----

    fn unmount(&mut self) -> Vec<Effect> {
        debug!("Camera screen unmounted");
        self.timer_token = None;
        self.image_token = None;
        self.post_token = None;
        self.pending = None;
        self.state.is_timer_active = false;
        self.posting = PostingState::default();
        self.phase = CapturePhase::Closed;
        vec![Effect::CancelAll]
    }
}
