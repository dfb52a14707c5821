//! Camera preferences
//!
//! Initial camera configuration applied when a screen session mounts.
//! Stored as JSON alongside the rest of the user's settings.

use serde::{Deserialize, Serialize};

use super::state::{CameraType, FlashMode, TimerMode};

/// Default zoom change per pinch step
pub const DEFAULT_ZOOM_STEP: f32 = 0.1;

/// Camera preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPreferences {
    /// Camera selected on mount
    #[serde(default)]
    pub camera_type: CameraType,

    /// Flash mode on mount
    #[serde(default)]
    pub flash_mode: FlashMode,

    /// Self-timer on mount
    #[serde(default)]
    pub timer_mode: TimerMode,

    /// Show the grid overlay on mount
    #[serde(default)]
    pub show_grid: bool,

    /// Optimize new images before review
    #[serde(default = "default_true")]
    pub auto_optimize: bool,

    /// Zoom change applied by the zoom buttons
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f32,
}

impl Default for CameraPreferences {
    fn default() -> Self {
        Self {
            camera_type: CameraType::default(),
            flash_mode: FlashMode::default(),
            timer_mode: TimerMode::default(),
            show_grid: false,
            auto_optimize: true,
            zoom_step: DEFAULT_ZOOM_STEP,
        }
    }
}

impl CameraPreferences {
    /// Zoom step clamped to a usable range
    pub fn effective_zoom_step(&self) -> f32 {
        if self.zoom_step.is_finite() {
            self.zoom_step.clamp(0.01, 1.0)
        } else {
            DEFAULT_ZOOM_STEP
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_zoom_step() -> f32 {
    DEFAULT_ZOOM_STEP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let prefs = CameraPreferences::default();
        assert!(prefs.auto_optimize);
        assert!(!prefs.show_grid);
        assert_eq!(prefs.timer_mode, TimerMode::Off);
        assert_eq!(prefs.effective_zoom_step(), DEFAULT_ZOOM_STEP);
    }

    #[test]
    fn test_deserialize_partial() {
        let prefs: CameraPreferences =
            serde_json::from_str(r#"{"timerMode":"10s","showGrid":true}"#).unwrap();
        assert_eq!(prefs.timer_mode, TimerMode::TenSeconds);
        assert!(prefs.show_grid);
        assert!(prefs.auto_optimize);
        assert_eq!(prefs.camera_type, CameraType::Back);
    }

    #[test]
    fn test_zoom_step_clamped() {
        let prefs = CameraPreferences {
            zoom_step: 5.0,
            ..Default::default()
        };
        assert_eq!(prefs.effective_zoom_step(), 1.0);

        let prefs = CameraPreferences {
            zoom_step: f32::NAN,
            ..Default::default()
        };
        assert_eq!(prefs.effective_zoom_step(), DEFAULT_ZOOM_STEP);
    }
}
