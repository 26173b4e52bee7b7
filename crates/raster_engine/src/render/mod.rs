//! Material bucketing and draw submission
//!
//! ## Frame flow
//!
//! ```text
//! CullingNodeList (visible instances)
//!      ↓ one DrawBatch per mesh slot
//! BucketManager::find_bucket(material)
//!      ↓ all batches assigned before anything is drawn
//! BucketManager::render → Material::activate once per bucket → Rasterizer::draw
//! ```
//!
//! The GPU side is reached only through the [`Rasterizer`] and [`Canvas`]
//! traits, so the whole pipeline runs against test doubles as well.

pub mod material;
pub mod bucket;
pub mod bucket_manager;
pub mod rasterizer;
pub mod frame_frustum;
pub mod camera;
pub mod context;

pub use material::{
    BlendMode, Material, MaterialFlags, MaterialId, MaterialRef, MaterialUniforms,
    ShadingMaterial, ShadingState, TextureHandle,
};
pub use bucket::{BucketRef, BucketType, DrawBatch, MaterialBucket, MeshHandle};
pub use bucket_manager::{BucketManager, RenderStats};
pub use rasterizer::{Canvas, ClearFlags, Rasterizer, Rect};
pub use frame_frustum::{FrameFrustum, SensorFit};
pub use camera::Camera;
pub use context::RenderContext;
