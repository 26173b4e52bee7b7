//! Render-to-texture and planar mirrors
//!
//! ## Architecture
//!
//! ```text
//! MirrorSurface (fitted once from mesh polygons)
//!      ↓ + mirror world transform + observer position
//! MirrorFrustum (per frame, reflected camera + off-axis bounds)
//!      ↓
//! ImageRender → Scene::calculate_visible_meshes → Scene::render_buckets
//!      ↓
//! ImageViewport (capture rectangle) → RgbaImage
//! ```

mod image_render;
mod mirror;
mod viewport;

pub use image_render::{ImageRender, Observer};
pub use mirror::{MirrorFrustum, MirrorSurface, MIRROR_EPSILON};
pub use viewport::ImageViewport;
