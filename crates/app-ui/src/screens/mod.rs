//! Screen view models

pub mod camera;

pub use camera::{
    CameraScreen, CaptionGesture, CaptionPreview, MetadataBadge, PermissionView, PostButton,
    PreviewControls, PreviewView, TextModalView, ViewfinderView,
};
