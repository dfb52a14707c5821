//! Camera screen session runtime
//!
//! Drives a [`CaptureController`] from a single event queue. Every user action
//! and every collaborator result is a [`Message`] on one channel, so state
//! transitions are applied one at a time in arrival order. Effects returned by
//! the controller run on spawned tasks that report back through the same
//! queue.

use std::time::Duration;

use app_core::camera::{
    CapturePhase, CaptureController, CaptureSnapshot, Collaborators, Effect, Message,
    TextPosition, Token,
};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Interval between countdown ticks
pub const TIMER_TICK: Duration = Duration::from_secs(1);

/// Session errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The session has been unmounted
    #[error("Camera session is closed")]
    Closed,
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Handles for work running on behalf of the controller, one slot per kind
#[derive(Default)]
struct SessionTasks {
    permissions: Option<JoinHandle<()>>,
    timer: Option<JoinHandle<()>>,
    image: Option<JoinHandle<()>>,
    post: Option<JoinHandle<()>>,
}

impl SessionTasks {
    fn replace(slot: &mut Option<JoinHandle<()>>, handle: JoinHandle<()>) {
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    fn cancel(slot: &mut Option<JoinHandle<()>>) {
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }

    /// Abort everything, keeping the handles so shutdown can await them
    fn cancel_all(&self) {
        let slots = [&self.permissions, &self.timer, &self.image, &self.post];
        for handle in slots.into_iter().flatten() {
            handle.abort();
        }
    }

    /// Abort everything and wait until each task has actually stopped
    async fn shutdown(&mut self) {
        let handles = [
            self.permissions.take(),
            self.timer.take(),
            self.image.take(),
            self.post.take(),
        ];
        for handle in handles.into_iter().flatten() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Start the work an effect describes
    fn run(&mut self, effect: Effect, collaborators: &Collaborators, tx: &mpsc::UnboundedSender<Message>) {
        match effect {
            Effect::CheckPermissions => {
                let permissions = collaborators.permissions.clone();
                let tx = tx.clone();
                Self::replace(
                    &mut self.permissions,
                    tokio::spawn(async move {
                        let result = permissions.status().await;
                        let _ = tx.send(Message::PermissionsChecked(result));
                    }),
                );
            }
            Effect::RequestPermissions => {
                let permissions = collaborators.permissions.clone();
                let tx = tx.clone();
                Self::replace(
                    &mut self.permissions,
                    tokio::spawn(async move {
                        let result = permissions.request().await;
                        let _ = tx.send(Message::PermissionsRequested(result));
                    }),
                );
            }
            Effect::StartTimer { token, ticks } => {
                Self::replace(&mut self.timer, spawn_countdown(token, ticks, tx.clone()));
            }
            Effect::CancelTimer => Self::cancel(&mut self.timer),
            Effect::Capture { token } => {
                let capture = collaborators.capture.clone();
                let tx = tx.clone();
                Self::replace(
                    &mut self.image,
                    tokio::spawn(async move {
                        let result = capture.capture().await;
                        let _ = tx.send(Message::CaptureFinished { token, result });
                    }),
                );
            }
            Effect::PickFromGallery { token } => {
                let capture = collaborators.capture.clone();
                let tx = tx.clone();
                Self::replace(
                    &mut self.image,
                    tokio::spawn(async move {
                        let result = capture.pick_from_gallery().await;
                        let _ = tx.send(Message::PickFinished { token, result });
                    }),
                );
            }
            Effect::Optimize { token, uri } => {
                let optimizer = collaborators.optimizer.clone();
                let tx = tx.clone();
                Self::replace(
                    &mut self.image,
                    tokio::spawn(async move {
                        let result = optimizer.optimize(&uri).await;
                        let _ = tx.send(Message::OptimizeFinished { token, result });
                    }),
                );
            }
            Effect::Post { token, story } => {
                let uploader = collaborators.uploader.clone();
                let tx = tx.clone();
                Self::replace(
                    &mut self.post,
                    tokio::spawn(async move {
                        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
                        let upload = uploader.post(story, progress_tx);
                        tokio::pin!(upload);

                        let result = loop {
                            tokio::select! {
                                result = &mut upload => break result,
                                Some(progress) = progress_rx.recv() => {
                                    let _ = tx.send(Message::PostProgress { token, progress });
                                }
                            }
                        };
                        while let Ok(progress) = progress_rx.try_recv() {
                            let _ = tx.send(Message::PostProgress { token, progress });
                        }
                        let _ = tx.send(Message::PostFinished { token, result });
                    }),
                );
            }
            Effect::CancelAll => self.cancel_all(),
        }
    }
}

/// Deliver `ticks` timer ticks, one per [`TIMER_TICK`]
fn spawn_countdown(token: Token, ticks: u32, tx: mpsc::UnboundedSender<Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TIMER_TICK);
        // The first tick completes immediately
        interval.tick().await;
        for _ in 0..ticks {
            interval.tick().await;
            if tx.send(Message::TimerTick { token }).is_err() {
                break;
            }
        }
    })
}

async fn run_session(
    mut controller: CaptureController,
    collaborators: Collaborators,
    tx: mpsc::UnboundedSender<Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    snapshots: watch::Sender<CaptureSnapshot>,
) {
    let mut tasks = SessionTasks::default();

    for effect in controller.mount() {
        tasks.run(effect, &collaborators, &tx);
    }
    snapshots.send_replace(controller.snapshot());

    while let Some(message) = rx.recv().await {
        let effects = controller.handle(message);
        snapshots.send_replace(controller.snapshot());

        for effect in effects {
            tasks.run(effect, &collaborators, &tx);
        }

        if controller.phase() == CapturePhase::Closed {
            break;
        }
    }

    tasks.shutdown().await;
    debug!("Camera session stopped");
}

/// A running camera screen session
///
/// Created when the camera screen mounts. Dropping the session unmounts the
/// screen: the countdown, collaborator calls and any upload are cancelled and
/// no further snapshots are published.
///
/// # Example
///
/// ```no_run
/// use app_core::camera::{CaptureController, Collaborators};
/// use app_state::camera_session::CameraSession;
///
/// # async fn demo(collaborators: Collaborators) {
/// let session = CameraSession::spawn(CaptureController::default(), collaborators);
/// let mut snapshots = session.subscribe();
///
/// session.toggle_flash_mode().unwrap();
/// snapshots.changed().await.unwrap();
/// # }
/// ```
pub struct CameraSession {
    commands: mpsc::UnboundedSender<Message>,
    snapshots: watch::Receiver<CaptureSnapshot>,
    handle: Option<JoinHandle<()>>,
}

impl CameraSession {
    /// Mount the screen and start processing messages
    pub fn spawn(controller: CaptureController, collaborators: Collaborators) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());

        let handle = tokio::spawn(run_session(controller, collaborators, tx.clone(), rx, snapshot_tx));

        Self {
            commands: tx,
            snapshots: snapshot_rx,
            handle: Some(handle),
        }
    }

    /// Queue a message for the controller
    pub fn send(&self, message: Message) -> Result<()> {
        self.commands.send(message).map_err(|_| SessionError::Closed)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> CaptureSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to snapshot changes
    pub fn subscribe(&self) -> watch::Receiver<CaptureSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot satisfies `predicate`
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&CaptureSnapshot) -> bool,
    ) -> Result<CaptureSnapshot> {
        let mut rx = self.subscribe();
        let snapshot = rx
            .wait_for(|snapshot| predicate(snapshot))
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(snapshot.clone())
    }

    /// Unmount and wait for all in-flight work to stop
    pub async fn unmount(mut self) {
        let _ = self.commands.send(Message::Unmount);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    /// Prompt for camera and media library access
    pub fn request_permissions(&self) -> Result<()> {
        self.send(Message::RequestPermissions)
    }

    /// Re-read permission status
    pub fn refresh_permissions(&self) -> Result<()> {
        self.send(Message::RefreshPermissions)
    }

    /// Cycle the flash mode
    pub fn toggle_flash_mode(&self) -> Result<()> {
        self.send(Message::ToggleFlashMode)
    }

    /// Switch cameras
    pub fn toggle_camera_type(&self) -> Result<()> {
        self.send(Message::ToggleCameraType)
    }

    /// Show or hide the grid
    pub fn toggle_grid(&self) -> Result<()> {
        self.send(Message::ToggleGrid)
    }

    /// Cycle the self-timer
    pub fn toggle_timer(&self) -> Result<()> {
        self.send(Message::ToggleTimer)
    }

    /// Change zoom by `delta`
    pub fn adjust_zoom(&self, delta: f32) -> Result<()> {
        self.send(Message::AdjustZoom(delta))
    }

    /// The camera finished initializing
    pub fn on_camera_ready(&self) -> Result<()> {
        self.send(Message::CameraReady)
    }

    /// Shutter pressed
    pub fn start_timer_capture(&self) -> Result<()> {
        self.send(Message::Capture)
    }

    /// Open the gallery picker
    pub fn pick_image_from_gallery(&self) -> Result<()> {
        self.send(Message::PickFromGallery)
    }

    /// Back from the preview
    pub fn reset_image(&self) -> Result<()> {
        self.send(Message::ResetImage)
    }

    /// Flip automatic optimization
    pub fn toggle_optimization(&self) -> Result<()> {
        self.send(Message::ToggleOptimization)
    }

    /// Open the text modal
    pub fn begin_text_edit(&self) -> Result<()> {
        self.send(Message::BeginTextEdit)
    }

    /// Replace the draft caption
    pub fn set_overlay_text(&self, text: impl Into<String>) -> Result<()> {
        self.send(Message::SetOverlayText(text.into()))
    }

    /// Commit the draft caption
    pub fn confirm_text(&self) -> Result<()> {
        self.send(Message::ConfirmText)
    }

    /// Close the text modal, discarding the draft
    pub fn cancel_text(&self) -> Result<()> {
        self.send(Message::CancelText)
    }

    /// Remove the caption
    pub fn clear_text_overlay(&self) -> Result<()> {
        self.send(Message::ClearText)
    }

    /// Commit a caption position from a finished drag
    pub fn update_text_position(&self, position: TextPosition) -> Result<()> {
        self.send(Message::UpdateTextPosition(position))
    }

    /// Share the story
    pub fn handle_post_story(&self) -> Result<()> {
        self.send(Message::PostStory)
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        let _ = self.commands.send(Message::Unmount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::camera::{
        CameraPreferences, CaptureProvider, CapturedImage, CollaboratorError, ImageAsset,
        ImageOptimizer, PermissionProvider, PermissionStatus, PickOutcome, ProgressSender,
        StoryPost, StoryUploader,
    };
    use async_trait::async_trait;
    use mockall::mock;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    mock! {
        Uploader {}

        #[async_trait]
        impl StoryUploader for Uploader {
            async fn post(&self, story: StoryPost, progress: ProgressSender) -> app_core::camera::error::Result<()>;
        }
    }

    struct Granted;

    #[async_trait]
    impl PermissionProvider for Granted {
        async fn status(&self) -> app_core::camera::error::Result<PermissionStatus> {
            Ok(PermissionStatus {
                camera: true,
                media_library: true,
            })
        }

        async fn request(&self) -> app_core::camera::error::Result<PermissionStatus> {
            self.status().await
        }
    }

    /// Camera that counts shots and takes `delay` to return each one
    #[derive(Default)]
    struct Camera {
        shots: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl CaptureProvider for Camera {
        async fn capture(&self) -> app_core::camera::error::Result<CapturedImage> {
            self.shots.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(CapturedImage {
                uri: "file:///shot.jpg".to_string(),
                asset: ImageAsset::new(1080, 1920),
            })
        }

        async fn pick_from_gallery(&self) -> app_core::camera::error::Result<PickOutcome> {
            Ok(PickOutcome::Cancelled)
        }
    }

    struct Passthrough;

    #[async_trait]
    impl ImageOptimizer for Passthrough {
        async fn optimize(&self, _uri: &str) -> app_core::camera::error::Result<ImageAsset> {
            Err(CollaboratorError::failed("not used"))
        }
    }

    /// Upload that reports progress and then never finishes
    struct StalledUpload {
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl StoryUploader for StalledUpload {
        async fn post(&self, _story: StoryPost, progress: ProgressSender) -> app_core::camera::error::Result<()> {
            let _guard = DropFlag(self.dropped.clone());
            let _ = progress.send(25.0);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn collaborators(camera: Arc<Camera>, uploader: Arc<dyn StoryUploader>) -> Collaborators {
        Collaborators {
            permissions: Arc::new(Granted),
            capture: camera,
            optimizer: Arc::new(Passthrough),
            uploader,
        }
    }

    fn controller() -> CaptureController {
        CaptureController::new(CameraPreferences {
            auto_optimize: false,
            ..Default::default()
        })
    }

    async fn live_session(camera: Arc<Camera>, uploader: Arc<dyn StoryUploader>) -> CameraSession {
        let session = CameraSession::spawn(controller(), collaborators(camera, uploader));
        session.wait_for(|s| s.phase == CapturePhase::Live).await.unwrap();
        session.on_camera_ready().unwrap();
        session.wait_for(|s| s.state.is_camera_ready).await.unwrap();
        session
    }

    fn idle_uploader() -> Arc<dyn StoryUploader> {
        Arc::new(MockUploader::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_capture_fires_after_countdown() {
        let camera = Arc::new(Camera::default());
        let session = live_session(camera.clone(), idle_uploader()).await;

        session.toggle_timer().unwrap();
        session.start_timer_capture().unwrap();
        let snapshot = session
            .wait_for(|s| s.phase == CapturePhase::TimerCountdown)
            .await
            .unwrap();
        assert!(snapshot.state.is_timer_active);
        assert!(snapshot.state.timer_count > 0);

        let snapshot = session
            .wait_for(|s| s.phase == CapturePhase::Reviewing)
            .await
            .unwrap();
        assert_eq!(camera.shots.load(Ordering::SeqCst), 1);
        assert_eq!(snapshot.state.captured_photo(), Some("file:///shot.jpg"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_countdown_fires_no_capture() {
        let camera = Arc::new(Camera::default());
        let session = live_session(camera.clone(), idle_uploader()).await;

        session.toggle_timer().unwrap();
        session.start_timer_capture().unwrap();
        session
            .wait_for(|s| s.state.timer_count == 1)
            .await
            .unwrap();

        session.send(Message::CancelTimer).unwrap();
        let snapshot = session.wait_for(|s| s.phase == CapturePhase::Live).await.unwrap();
        assert!(!snapshot.state.is_timer_active);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(camera.shots.load(Ordering::SeqCst), 0);
        assert_eq!(session.snapshot().phase, CapturePhase::Live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_capture_after_back_is_discarded() {
        let camera = Arc::new(Camera {
            shots: AtomicUsize::new(0),
            delay: Duration::from_secs(1),
        });
        let session = live_session(camera.clone(), idle_uploader()).await;

        session.start_timer_capture().unwrap();
        session.wait_for(|s| s.phase == CapturePhase::Capturing).await.unwrap();
        session.reset_image().unwrap();
        session.wait_for(|s| s.phase == CapturePhase::Live).await.unwrap();

        // Let the camera return its (now stale) photo
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(camera.shots.load(Ordering::SeqCst), 1);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.phase, CapturePhase::Live);
        assert!(snapshot.state.selected.is_none());
        assert!(!snapshot.state.is_capturing);
    }

    #[tokio::test]
    async fn test_double_post_calls_uploader_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let mut uploader = MockUploader::new();
        uploader.expect_post().returning(move |_, progress| {
            counted.fetch_add(1, Ordering::SeqCst);
            let _ = progress.send(50.0);
            Ok(())
        });

        let camera = Arc::new(Camera::default());
        let session = live_session(camera, Arc::new(uploader)).await;
        session.start_timer_capture().unwrap();
        session.wait_for(|s| s.phase == CapturePhase::Reviewing).await.unwrap();

        session.handle_post_story().unwrap();
        session.handle_post_story().unwrap();

        let snapshot = session
            .wait_for(|s| s.phase == CapturePhase::Live && !s.posting.is_posting_story)
            .await
            .unwrap();
        assert!(snapshot.state.selected.is_none());
        session.unmount().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unmount_stops_upload() {
        let dropped = Arc::new(AtomicBool::new(false));
        let uploader = Arc::new(StalledUpload {
            dropped: dropped.clone(),
        });

        let camera = Arc::new(Camera::default());
        let session = live_session(camera, uploader).await;
        session.start_timer_capture().unwrap();
        session.wait_for(|s| s.phase == CapturePhase::Reviewing).await.unwrap();

        session.handle_post_story().unwrap();
        let snapshot = session
            .wait_for(|s| s.posting.posting_progress == 25.0)
            .await
            .unwrap();
        assert_eq!(snapshot.phase, CapturePhase::Posting);

        let mut rx = session.subscribe();
        session.unmount().await;

        assert!(dropped.load(Ordering::SeqCst));
        assert_eq!(rx.borrow_and_update().phase, CapturePhase::Closed);
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn test_send_after_unmount_fails() {
        let camera = Arc::new(Camera::default());
        let session = live_session(camera, idle_uploader()).await;
        let commands = session.commands.clone();
        session.unmount().await;
        assert!(commands.send(Message::ToggleGrid).is_err());
    }
}
