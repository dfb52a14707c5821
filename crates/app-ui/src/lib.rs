//! User interface layer for the story composer
//!
//! The frontend renders plain serializable props; this crate computes them.
//!
//! # Modules
//!
//! - [`navigation`] - Main-stack route table, tabs and navigation state
//! - [`screens`] - Screen view models
//!
//! # Example
//!
//! ```rust
//! use app_ui::navigation::{NavigationState, Presentation, Route};
//!
//! let mut nav = NavigationState::new();
//! let viewer = Route::DocumentViewer { document_id: "doc-1".to_string() };
//! assert_eq!(viewer.presentation(), Presentation::FullScreenModal);
//!
//! nav.navigate(viewer);
//! assert!(!nav.swipe_back());
//! assert!(nav.go_back());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod navigation;
pub mod screens;

pub use navigation::{
    HeaderOptions, NavigationStack, NavigationState, NavigationTab, Presentation, Route,
    StackEntry,
};
pub use screens::camera::{format_file_size, truncate_caption, CameraScreen, PreviewControls};
