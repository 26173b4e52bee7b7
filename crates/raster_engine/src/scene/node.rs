//! Scene-graph node interface
//!
//! Transform propagation belongs to the scene-graph library; the core only
//! reads world transforms and writes local ones.

use crate::foundation::math::{Mat3, Transform, Vec3};

/// Transform queries and setters the core needs from a scene-graph node
pub trait SceneNode: std::fmt::Debug {
    /// World-space position
    fn world_position(&self) -> Vec3;

    /// World-space orientation (columns are the local axes)
    fn world_orientation(&self) -> Mat3;

    /// World-space scale factors
    fn world_scaling(&self) -> Vec3;

    /// Set position relative to the parent
    fn set_local_position(&mut self, position: Vec3);

    /// Set orientation relative to the parent
    fn set_local_orientation(&mut self, orientation: Mat3);

    /// Recompute world data from local data
    fn update_world_data(&mut self);

    /// World transform assembled from the three queries
    fn world_transform(&self) -> Transform {
        Transform {
            position: self.world_position(),
            orientation: self.world_orientation(),
            scale: self.world_scaling(),
        }
    }
}

/// Minimal node: a local transform under a fixed parent transform
///
/// Enough for cameras and free-standing objects; nodes of a real
/// hierarchy come from the scene-graph library.
#[derive(Debug, Clone, Default)]
pub struct SpatialNode {
    local: Transform,
    parent: Transform,
    world: Transform,
}

impl SpatialNode {
    /// Root node with the given transform
    pub fn new(local: Transform) -> Self {
        let mut node = Self {
            local,
            parent: Transform::identity(),
            world: Transform::identity(),
        };
        node.update_world_data();
        node
    }

    /// Root node at a position
    pub fn at(position: Vec3) -> Self {
        Self::new(Transform::from_position(position))
    }

    /// Set the parent world transform (takes effect on the next update)
    pub fn set_parent_transform(&mut self, parent: Transform) {
        self.parent = parent;
    }

    /// Set local scale (takes effect on the next update)
    pub fn set_local_scaling(&mut self, scale: Vec3) {
        self.local.scale = scale;
    }

    /// Local transform
    pub fn local(&self) -> &Transform {
        &self.local
    }
}

impl SceneNode for SpatialNode {
    fn world_position(&self) -> Vec3 {
        self.world.position
    }

    fn world_orientation(&self) -> Mat3 {
        self.world.orientation
    }

    fn world_scaling(&self) -> Vec3 {
        self.world.scale
    }

    fn set_local_position(&mut self, position: Vec3) {
        self.local.position = position;
    }

    fn set_local_orientation(&mut self, orientation: Mat3) {
        self.local.orientation = orientation;
    }

    fn update_world_data(&mut self) {
        self.world = self.parent.combine(&self.local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_local_changes_apply_on_update() {
        let mut node = SpatialNode::at(Vec3::new(1.0, 2.0, 3.0));
        node.set_local_position(Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(node.world_position(), Vec3::new(1.0, 2.0, 3.0));

        node.update_world_data();
        assert_eq!(node.world_position(), Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_parent_transform_composes() {
        let mut node = SpatialNode::at(Vec3::new(1.0, 0.0, 0.0));
        node.set_parent_transform(
            Transform::from_position(Vec3::new(0.0, 10.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 2.0)),
        );
        node.update_world_data();

        assert_relative_eq!(node.world_position(), Vec3::new(2.0, 10.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(node.world_scaling(), Vec3::new(2.0, 2.0, 2.0), epsilon = 1e-6);
    }
}
