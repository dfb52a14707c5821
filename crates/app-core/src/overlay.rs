//! Draggable text overlay
//!
//! Tracks the caption position while a pan gesture is in progress. The live
//! position is a render-time value only; the controller sees a single
//! position when the gesture ends.

use serde::{Deserialize, Serialize};

use crate::camera::TextPosition;

/// Drag state for the caption over the preview image
///
/// # Example
///
/// ```
/// use app_core::camera::TextPosition;
/// use app_core::overlay::OverlayDrag;
///
/// let mut drag = OverlayDrag::new(TextPosition::new(10.0, 10.0));
/// drag.on_drag_start();
/// drag.on_drag_update(5.0, -2.0);
/// assert_eq!(drag.live_position(), TextPosition::new(15.0, 8.0));
///
/// let committed = drag.on_drag_end(15.0, 8.0);
/// assert_eq!(committed, Some(TextPosition::new(15.0, 8.0)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct OverlayDrag {
    /// Committed position the current gesture started from
    origin: TextPosition,
    /// Position rendered this frame
    live: TextPosition,
    /// Gesture in progress
    dragging: bool,
}

impl OverlayDrag {
    /// Create drag state resting at the committed position
    pub fn new(committed: TextPosition) -> Self {
        Self {
            origin: committed,
            live: committed,
            dragging: false,
        }
    }

    /// Re-sync with the committed position (e.g. after the caption was removed)
    ///
    /// Ignored mid-gesture so an external update never yanks the text away
    /// from the finger.
    pub fn sync(&mut self, committed: TextPosition) {
        if !self.dragging {
            self.origin = committed;
            self.live = committed;
        }
    }

    /// Gesture began
    pub fn on_drag_start(&mut self) {
        self.origin = self.live;
        self.dragging = true;
    }

    /// Gesture moved; `dx`/`dy` are the cumulative translation since start
    pub fn on_drag_update(&mut self, dx: f32, dy: f32) {
        if !self.dragging || !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.live = TextPosition::new(self.origin.x + dx, self.origin.y + dy);
    }

    /// Gesture released at the given position
    ///
    /// Returns the position to commit to the controller, or `None` when no
    /// gesture was in progress.
    pub fn on_drag_end(&mut self, final_x: f32, final_y: f32) -> Option<TextPosition> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        if !final_x.is_finite() || !final_y.is_finite() {
            self.live = self.origin;
            return None;
        }
        let position = TextPosition::new(final_x, final_y);
        self.origin = position;
        self.live = position;
        Some(position)
    }

    /// Release at the current live position
    pub fn release(&mut self) -> Option<TextPosition> {
        let live = self.live;
        self.on_drag_end(live.x, live.y)
    }

    /// Gesture interrupted before release; nothing is committed
    pub fn on_drag_cancel(&mut self) {
        self.dragging = false;
        self.live = self.origin;
    }

    /// Position to render
    pub fn live_position(&self) -> TextPosition {
        self.live
    }

    /// Whether a gesture is in progress (used for visual emphasis)
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}
