//! Narrow interfaces to the GPU side
//!
//! The core never talks to a graphics API directly. A [`Rasterizer`]
//! receives matrices, shading state and draw batches; a [`Canvas`] owns the
//! framebuffers and pixel dimensions.

use bitflags::bitflags;

use super::{BlendMode, DrawBatch, FrameFrustum, ShadingState};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Pixel rectangle, origin at the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge in pixels
    pub left: i32,
    /// Bottom edge in pixels
    pub bottom: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Rect {
    /// Create a rectangle
    pub fn new(left: i32, bottom: i32, width: u32, height: u32) -> Self {
        Self { left, bottom, width, height }
    }

    /// Number of pixels covered
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

bitflags! {
    /// Buffers cleared by [`Rasterizer::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        /// Color attachment
        const COLOR = 1 << 0;
        /// Depth attachment
        const DEPTH = 1 << 1;
        /// Stencil attachment
        const STENCIL = 1 << 2;
    }
}

/// Draw submission interface
pub trait Rasterizer {
    /// Start a frame at the given clock time
    fn begin_frame(&mut self, time: f64);

    /// Set the viewport rectangle
    fn set_viewport(&mut self, rect: Rect);

    /// Set the scissor rectangle
    fn set_scissor(&mut self, rect: Rect);

    /// Clear buffers of the bound framebuffer
    fn clear(&mut self, flags: ClearFlags);

    /// Perspective projection for an off-axis frustum
    ///
    /// Shared by primary cameras and mirror cameras.
    fn frustum_matrix(&self, frustum: &FrameFrustum) -> Mat4 {
        Mat4::frustum(frustum.x1, frustum.x2, frustum.y1, frustum.y2, frustum.near, frustum.far)
    }

    /// Orthographic projection for a frame frustum
    fn ortho_matrix(&self, frustum: &FrameFrustum) -> Mat4 {
        Mat4::ortho(frustum.x1, frustum.x2, frustum.y1, frustum.y2, frustum.near, frustum.far)
    }

    /// Load view and projection for the following draws
    fn set_matrix(&mut self, view: &Mat4, projection: &Mat4, camera_position: Vec3, camera_scale: Vec3);

    /// Bind the shading group of one bucket
    fn bind_shading_state(&mut self, state: &ShadingState<'_>);

    /// Set framebuffer blending
    fn set_alpha_blend(&mut self, blend: BlendMode);

    /// Unbind every texture unit
    fn deactivate_textures(&mut self);

    /// Issue one draw call
    fn draw(&mut self, batch: &DrawBatch);
}

/// Framebuffer owner
pub trait Canvas {
    /// Width in pixels
    fn width(&self) -> u32;

    /// Height in pixels
    fn height(&self) -> u32;

    /// Area the main view renders into
    fn viewport_area(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    /// Redirect rendering into the offscreen target
    fn bind_offscreen(&mut self);

    /// Go back to the main framebuffer
    fn restore_framebuffer(&mut self);

    /// Read RGBA8 pixels of the bound framebuffer, bottom row first
    fn read_pixels(&mut self, rect: Rect) -> Option<Vec<u8>>;

    /// Finish the frame on this canvas
    fn end_frame(&mut self);
}
