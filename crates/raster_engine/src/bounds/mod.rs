//! Bounding volumes shared between object instances
//!
//! ## Architecture
//!
//! ```text
//! BoundingVolumeManager (arena, owns every volume)
//!      ↓ VolumeHandle
//! VolumeUser (per object instance, acquire on create / release on drop)
//!      ↓
//! CullingNode (frame-local visibility flag)
//! ```
//!
//! A volume is "active" while at least one instance uses it; only active
//! volumes are visited by the update pass.

mod aabb;
mod bounding_volume;
mod manager;
mod user;

pub use aabb::Aabb;
pub use bounding_volume::{BoundingVolume, BoxUpdate, ShapeKind, ShapeSource};
pub use manager::{BoundingVolumeManager, SharedVolumeManager, VolumeHandle};
pub use user::VolumeUser;
