//! Story composer
//!
//! Camera capture and story composition for the mobile client:
//!
//! - [`app_core`] - capture state machine, collaborator traits, overlay drag
//! - [`app_state`] - [`CameraSession`] actor driving the state machine
//! - [`media_processing`] - on-device image optimizer
//! - [`app_ui`] - route table and camera screen view model

pub use app_core;
pub use app_state;
pub use app_ui;
pub use media_processing;

pub use app_core::camera::{CameraPreferences, Collaborators};
pub use app_state::CameraSession;
pub use media_processing::StoryOptimizer;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,app_core=debug,app_state=debug";

/// Install the global tracing subscriber
///
/// Honors `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`]. Calling this
/// more than once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("Tracing initialized");
    }
}
