//! Per-instance culling state

use super::Frustum;
use crate::bounds::{Aabb, BoundingVolumeManager, VolumeHandle};
use crate::foundation::math::Transform;
use crate::scene::ObjectId;

/// Visibility wrapper for one object instance
///
/// The volume handle is weak: many nodes may share one volume and the
/// manager owns it. `culled` is only meaningful for the frame that last
/// ran [`CullingNode::test`].
#[derive(Debug, Clone)]
pub struct CullingNode {
    object: ObjectId,
    volume: Option<VolumeHandle>,
    culled: bool,
}

impl CullingNode {
    /// Node for an object without bounds yet (never culled)
    pub fn new(object: ObjectId) -> Self {
        Self {
            object,
            volume: None,
            culled: false,
        }
    }

    /// Attach the shared bounding volume
    pub fn set_volume(&mut self, volume: Option<VolumeHandle>) {
        self.volume = volume;
    }

    /// The shared bounding volume, if any
    pub fn volume(&self) -> Option<VolumeHandle> {
        self.volume
    }

    /// The object this node belongs to
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Result of the last visibility test
    pub fn culled(&self) -> bool {
        self.culled
    }

    /// Force the culled flag (e.g. hidden objects or culling disabled)
    pub fn set_culled(&mut self, culled: bool) {
        self.culled = culled;
    }

    /// World-space box of this instance
    pub fn world_aabb(&self, volumes: &BoundingVolumeManager, transform: &Transform) -> Option<Aabb> {
        let volume = volumes.get(self.volume?)?;
        Some(volume.aabb().transformed(transform))
    }

    /// Test against a frustum and store the result
    ///
    /// Nodes without a live volume are treated as visible. Returns `true`
    /// when the node is visible.
    pub fn test(&mut self, volumes: &BoundingVolumeManager, transform: &Transform, frustum: &Frustum) -> bool {
        self.culled = match self.world_aabb(volumes, transform) {
            Some(aabb) => !frustum.intersects_aabb(&aabb),
            None => false,
        };
        !self.culled
    }
}

/// Visible nodes collected by one scene traversal
pub type CullingNodeList = Vec<CullingNode>;
