//! Camera flow integration tests
//!
//! End-to-end runs of the camera session with the real image optimizer and
//! in-memory platform collaborators.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app_core::camera::{
    CameraPreferences, CaptureController, CaptureProvider, CapturePhase, CaptureSnapshot,
    CapturedImage, Collaborators, ImageAsset, PermissionProvider, PermissionStatus, PickOutcome,
    ProgressSender, StoryPost, StoryUploader, TextPosition,
};
use app_core::camera::error::Result as CollaboratorResult;
use app_state::CameraSession;
use app_ui::navigation::{NavigationState, NavigationTab, Presentation, Route};
use app_ui::screens::camera::{CameraScreen, CaptionGesture, MetadataBadge};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use media_processing::StoryOptimizer;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

/// Camera access denied until the user is prompted
#[derive(Default)]
struct PromptedPermissions {
    granted: AtomicBool,
}

#[async_trait]
impl PermissionProvider for PromptedPermissions {
    async fn status(&self) -> CollaboratorResult<PermissionStatus> {
        Ok(PermissionStatus {
            camera: self.granted.load(Ordering::SeqCst),
            media_library: true,
        })
    }

    async fn request(&self) -> CollaboratorResult<PermissionStatus> {
        self.granted.store(true, Ordering::SeqCst);
        self.status().await
    }
}

/// Camera that "captures" a file already on disk
struct FileCamera {
    image: CapturedImage,
}

#[async_trait]
impl CaptureProvider for FileCamera {
    async fn capture(&self) -> CollaboratorResult<CapturedImage> {
        Ok(self.image.clone())
    }

    async fn pick_from_gallery(&self) -> CollaboratorResult<PickOutcome> {
        Ok(PickOutcome::Cancelled)
    }
}

/// Uploader that records every story it receives
#[derive(Default)]
struct RecordingUploader {
    posts: Mutex<Vec<StoryPost>>,
}

#[async_trait]
impl StoryUploader for RecordingUploader {
    async fn post(&self, story: StoryPost, progress: ProgressSender) -> CollaboratorResult<()> {
        let _ = progress.send(50.0);
        let _ = progress.send(100.0);
        self.posts.lock().unwrap().push(story);
        Ok(())
    }
}

/// Maximum quality JPEG so the optimizer always shrinks it
fn write_jpeg(path: &Path, width: u32, height: u32) -> u64 {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    });
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, 100))
        .unwrap();
    std::fs::write(path, &bytes).unwrap();
    bytes.len() as u64
}

async fn wait_for(
    session: &CameraSession,
    predicate: impl FnMut(&CaptureSnapshot) -> bool,
) -> CaptureSnapshot {
    tokio::time::timeout(WAIT, session.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("session closed")
}

fn session_with(
    permissions: Arc<dyn PermissionProvider>,
    camera: Arc<dyn CaptureProvider>,
    uploader: Arc<dyn StoryUploader>,
) -> CameraSession {
    story_composer::init_tracing();
    let collaborators = Collaborators {
        permissions,
        capture: camera,
        optimizer: Arc::new(StoryOptimizer::new()),
        uploader,
    };
    CameraSession::spawn(CaptureController::new(CameraPreferences::default()), collaborators)
}

/// Denied on mount, granted after the prompt
#[tokio::test]
async fn test_permission_prompt_unlocks_camera() {
    let camera = Arc::new(FileCamera {
        image: CapturedImage {
            uri: "file:///unused.jpg".to_string(),
            asset: ImageAsset::new(1, 1),
        },
    });
    let session = session_with(
        Arc::new(PromptedPermissions::default()),
        camera,
        Arc::new(RecordingUploader::default()),
    );

    let denied = wait_for(&session, |s| s.phase == CapturePhase::PermissionDenied).await;
    assert!(!denied.state.is_loading);
    match CameraScreen::from_snapshot(&denied) {
        CameraScreen::Permission(view) => assert!(view.can_pick_from_gallery),
        other => panic!("expected permission screen, got {other:?}"),
    }

    session.request_permissions().unwrap();
    let live = wait_for(&session, |s| s.phase == CapturePhase::Live).await;
    assert!(live.state.camera_available);
    assert!(!live.state.is_requesting);
    assert!(live.state.error.is_none());
    assert!(matches!(CameraScreen::from_snapshot(&live), CameraScreen::Camera(_)));

    session.unmount().await;
}

/// Capture, optimize on disk, caption, drag, post
#[tokio::test]
async fn test_capture_optimize_caption_and_post() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("capture.jpg");
    let original_size = write_jpeg(&path, 640, 480);

    let camera = Arc::new(FileCamera {
        image: CapturedImage {
            uri: format!("file://{}", path.display()),
            asset: ImageAsset::new(640, 480).with_file_size(original_size),
        },
    });
    let permissions = Arc::new(PromptedPermissions::default());
    permissions.granted.store(true, Ordering::SeqCst);
    let uploader = Arc::new(RecordingUploader::default());

    let session = session_with(permissions, camera, uploader.clone());
    wait_for(&session, |s| s.phase == CapturePhase::Live).await;

    session.on_camera_ready().unwrap();
    session.start_timer_capture().unwrap();

    let review = wait_for(&session, |s| s.phase == CapturePhase::Reviewing).await;
    let asset = review.state.selected_image().cloned().unwrap();
    assert!(asset.optimized);
    assert!(asset.file_size.unwrap() < original_size);
    assert!(std::fs::metadata(&path).unwrap().len() < original_size);

    let preview = match CameraScreen::from_snapshot(&review) {
        CameraScreen::Preview(view) => view,
        other => panic!("expected preview, got {other:?}"),
    };
    assert_eq!(preview.title, "Photo Ready");
    assert!(preview.badges.contains(&MetadataBadge::Optimized));
    assert!(preview.badges.contains(&MetadataBadge::Dimensions("640x480".to_string())));

    // Caption
    session.begin_text_edit().unwrap();
    session.set_overlay_text("  Sunset  ").unwrap();
    session.confirm_text().unwrap();
    let captioned = wait_for(&session, |s| {
        s.phase == CapturePhase::Reviewing && s.state.overlay_text == "Sunset"
    })
    .await;
    assert!(!captioned.state.show_text_overlay);

    // Drag commits a single position on release
    let mut gesture = CaptionGesture::default();
    gesture.sync(&captioned.state);
    gesture.start();
    gesture.update(10.0, 10.0);
    gesture.update(30.0, 40.0);
    session.send(gesture.end().unwrap()).unwrap();
    wait_for(&session, |s| s.state.text_position == TextPosition::new(30.0, 40.0)).await;

    session.handle_post_story().unwrap();
    let done = wait_for(&session, |s| {
        s.phase == CapturePhase::Live && !s.posting.is_posting_story
    })
    .await;
    assert!(done.state.selected.is_none());
    assert!(done.state.overlay_text.is_empty());
    assert_eq!(done.state.text_position, TextPosition::default());

    let posts = uploader.posts.lock().unwrap().clone();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].overlay_text, "Sunset");
    assert_eq!(posts[0].text_position, TextPosition::new(30.0, 40.0));
    assert!(posts[0].uri.ends_with("capture.jpg"));

    session.unmount().await;
}

/// Leaving the camera tab for a story viewer
#[test]
fn test_camera_tab_to_story_viewer() {
    let mut nav = NavigationState::new();
    nav.switch_tab(NavigationTab::Camera);

    let viewer = Route::StoryViewer {
        user_id: "me".to_string(),
        start_index: Some(0),
    };
    assert_eq!(viewer.presentation(), Presentation::FullScreenModal);
    nav.navigate(viewer);
    assert!(!nav.swipe_back());
    assert!(nav.go_back());
    assert_eq!(nav.active_tab, NavigationTab::Camera);
}
