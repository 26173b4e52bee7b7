//! Capture area of the offscreen target

use crate::core::OffscreenConfig;
use crate::render::{Canvas, Rect};

/// Rectangle of the canvas an offscreen render reads back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageViewport {
    /// Lower-left corner in canvas pixels
    pub position: [i32; 2],
    /// Capture size in pixels, zero means the canvas size
    pub capture_size: [u32; 2],
    /// Capture the whole canvas viewport, ignoring position and size
    pub whole: bool,
    /// Keep the alpha channel of captured pixels
    pub alpha: bool,
}

impl ImageViewport {
    /// Capture settings from configuration
    pub fn from_config(config: &OffscreenConfig) -> Self {
        Self {
            position: [0, 0],
            capture_size: [config.capture_width, config.capture_height],
            whole: config.whole_viewport,
            alpha: config.capture_alpha,
        }
    }

    /// Capture rectangle clamped to the canvas
    pub fn capture_rect(&self, canvas: &dyn Canvas) -> Rect {
        if self.whole {
            return canvas.viewport_area();
        }
        let (canvas_width, canvas_height) = (canvas.width(), canvas.height());
        let clamp_axis = |position: i32, size: u32, limit: u32| -> (i32, u32) {
            let size = if size == 0 { limit } else { size.min(limit) };
            let max_position = (limit - size) as i32;
            (position.clamp(0, max_position), size)
        };
        let (left, width) = clamp_axis(self.position[0], self.capture_size[0], canvas_width);
        let (bottom, height) = clamp_axis(self.position[1], self.capture_size[1], canvas_height);
        Rect::new(left, bottom, width, height)
    }
}
