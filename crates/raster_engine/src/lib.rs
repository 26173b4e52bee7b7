//! # Raster Engine
//!
//! Rendering core of a real-time rasterizer: shared bounding volumes with
//! frustum culling, material buckets that bind shading state once per
//! material, and render-to-texture with planar mirrors.
//!
//! ## Features
//!
//! - **Bounding volumes**: Arena of reference-counted boxes shared by object instances
//! - **Culling**: Per-instance culling nodes tested against camera frustums
//! - **Material buckets**: Solid pass in insertion order, alpha pass back-to-front
//! - **Mirrors**: Reflected camera and off-axis frustum from a mirror mesh
//! - **Backend agnostic**: GPU work goes through the `Rasterizer` and `Canvas` traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use raster_engine::prelude::*;
//! use std::rc::Rc;
//!
//! fn frame(canvas: &mut dyn Canvas, rasterizer: &mut dyn Rasterizer) -> Result<(), RasterError> {
//!     let mut scene = Scene::new("level");
//!     let main = scene.add_camera(Camera::new("main"));
//!     let reflection = scene.add_camera(Camera::new("reflection"));
//!     let mirror = scene.add_object(
//!         RenderObject::builder("mirror")
//!             .geometry(Rc::new(MeshGeometry::quad_xz(1.0, 1.0, None)))
//!             .build(),
//!     );
//!
//!     let mut render = ImageRender::new_mirror(
//!         &scene, reflection, mirror, Observer::Camera(main), None, &OffscreenConfig::default(),
//!     )?;
//!     let mut ctx = RenderContext::new(canvas, rasterizer, 0.0);
//!     render.calc_viewport(&mut scene, &mut ctx)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod foundation;
pub mod config;
pub mod bounds;
pub mod culling;
pub mod render;
pub mod scene;
pub mod offscreen;

mod error;

#[cfg(test)]
mod test_support;

pub use error::{RasterError, RasterResult};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        RasterError, RasterResult,
        bounds::{Aabb, BoundingVolume, BoundingVolumeManager, VolumeHandle, VolumeUser},
        config::Config,
        core::{BucketConfig, EngineConfig, OffscreenConfig, RasterConfig},
        culling::{CullingNode, CullingNodeList, Frustum},
        foundation::math::{Mat3, Mat4, Transform, Vec3},
        offscreen::{ImageRender, ImageViewport, MirrorFrustum, MirrorSurface, Observer},
        render::{
            BlendMode, BucketManager, Camera, Canvas, ClearFlags, DrawBatch, Material, MaterialId, MaterialRef,
            MeshHandle, Rasterizer, Rect, RenderContext, RenderStats, ShadingMaterial, ShadingState,
        },
        scene::{CameraId, MeshGeometry, ObjectId, RenderObject, Scene, SceneNode},
    };
}
