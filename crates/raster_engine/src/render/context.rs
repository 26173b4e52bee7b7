//! Explicit render context threaded through every entry point

use super::{Canvas, Rasterizer};

/// Canvas, rasterizer and frame clock for one render call
pub struct RenderContext<'a> {
    /// Framebuffer owner
    pub canvas: &'a mut dyn Canvas,
    /// Draw submission
    pub rasterizer: &'a mut dyn Rasterizer,
    /// Engine clock time in seconds
    pub clock_time: f64,
}

impl<'a> RenderContext<'a> {
    /// Bundle the collaborators of one frame
    pub fn new(canvas: &'a mut dyn Canvas, rasterizer: &'a mut dyn Rasterizer, clock_time: f64) -> Self {
        Self {
            canvas,
            rasterizer,
            clock_time,
        }
    }
}
