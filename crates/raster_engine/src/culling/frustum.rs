//! Frustum planes for visibility tests

use crate::bounds::Aabb;
use crate::foundation::math::{Mat4, Vec3, Vec4};

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized, pointing into the frustum)
    pub normal: Vec3,
    /// Distance term of `normal · p + distance = 0`
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal: normal.normalize(), distance }
    }

    /// Plane from a raw `(a, b, c, d)` row, normalized by the normal length
    fn from_row(row: Vec4) -> Self {
        let normal = row.xyz();
        let length = normal.norm();
        if length <= f32::EPSILON {
            return Self { normal: Vec3::zeros(), distance: 0.0 };
        }
        Self {
            normal: normal / length,
            distance: row.w / length,
        }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Six planes defining the frustum (left, right, bottom, top, near, far)
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract frustum planes from a view-projection matrix
    ///
    /// Gribb-Hartmann extraction for OpenGL clip space (`-w <= z <= w`).
    /// Planes are expressed in the space the matrix maps from.
    pub fn from_matrix(vp_matrix: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { vp_matrix.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                Plane::from_row(r3 + r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Check if an AABB is inside or intersects the frustum
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // corner furthest along the plane normal
            let mut p = aabb.min;
            if plane.normal.x >= 0.0 { p.x = aabb.max.x; }
            if plane.normal.y >= 0.0 { p.y = aabb.max.y; }
            if plane.normal.z >= 0.0 { p.z = aabb.max.z; }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Mat4Ext;

    fn unit_frustum() -> Frustum {
        // camera at origin looking down -Z, 90 degree fov, near 1 far 10
        Frustum::from_matrix(&Mat4::frustum(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0))
    }

    #[test]
    fn test_box_in_front_is_visible() {
        let frustum = unit_frustum();
        let aabb = Aabb::from_center_extents(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.5, 0.5, 0.5));
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_box_behind_or_beyond_far_is_culled() {
        let frustum = unit_frustum();
        let behind = Aabb::from_center_extents(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.5, 0.5, 0.5));
        let beyond = Aabb::from_center_extents(Vec3::new(0.0, 0.0, -20.0), Vec3::new(0.5, 0.5, 0.5));
        assert!(!frustum.intersects_aabb(&behind));
        assert!(!frustum.intersects_aabb(&beyond));
    }

    #[test]
    fn test_box_outside_side_plane_is_culled_but_straddling_is_not() {
        let frustum = unit_frustum();
        let outside = Aabb::from_center_extents(Vec3::new(8.0, 0.0, -5.0), Vec3::new(0.5, 0.5, 0.5));
        let straddling = Aabb::from_center_extents(Vec3::new(5.0, 0.0, -5.0), Vec3::new(0.5, 0.5, 0.5));
        assert!(!frustum.intersects_aabb(&outside));
        assert!(frustum.intersects_aabb(&straddling));
    }

    #[test]
    fn test_planes_are_normalized() {
        for plane in &unit_frustum().planes {
            assert!((plane.normal.norm() - 1.0).abs() < 1e-5);
        }
    }
}
