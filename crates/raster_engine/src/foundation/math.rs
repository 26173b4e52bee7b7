//! Math utilities and types
//!
//! Provides the math types used by culling, bucketing and mirror frustum
//! derivation. Everything is `f32`, column vectors, right-handed, Y-up.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type (orientations)
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, orientation, and scale
///
/// Orientation is stored as a 3x3 matrix because scene nodes hand out
/// orientation matrices directly and the mirror camera basis is built
/// column by column.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Orientation matrix (columns are the local axes in world space)
    pub orientation: Mat3,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            orientation: Mat3::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            orientation: rotation.to_rotation_matrix().into_inner(),
            ..Default::default()
        }
    }

    /// Replace the scale factors
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Convert to a transformation matrix (translate * orient * scale)
    pub fn to_matrix(&self) -> Mat4 {
        let linear = self.orientation * Mat3::from_diagonal(&self.scale);
        let mut matrix = linear.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&self.position);
        matrix
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.position + self.orientation * point.component_mul(&self.scale)
    }

    /// Combine this transform (parent) with a child transform
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.orientation * self.scale.component_mul(&other.position),
            orientation: self.orientation * other.orientation,
            scale: self.scale.component_mul(&other.scale),
        }
    }

    /// World-to-local matrix ignoring scale
    ///
    /// This is the view matrix of a camera placed with this transform.
    pub fn rigid_inverse_matrix(&self) -> Mat4 {
        let rotation_t = self.orientation.transpose();
        let translation = -(rotation_t * self.position);
        let mut matrix = rotation_t.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        matrix
    }
}

/// Extension trait for Mat4 with projection helpers
pub trait Mat4Ext {
    /// Off-axis perspective projection (OpenGL `glFrustum` convention)
    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Orthographic projection (OpenGL `glOrtho` convention)
    fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;

        let mut result = Mat4::zeros();
        result[(0, 0)] = 2.0 * near / width;
        result[(0, 2)] = (right + left) / width;
        result[(1, 1)] = 2.0 * near / height;
        result[(1, 2)] = (top + bottom) / height;
        result[(2, 2)] = -(far + near) / depth;
        result[(2, 3)] = -2.0 * far * near / depth;
        result[(3, 2)] = -1.0;
        result
    }

    fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        let width = right - left;
        let height = top - bottom;
        let depth = far - near;

        let mut result = Mat4::identity();
        result[(0, 0)] = 2.0 / width;
        result[(0, 3)] = -(right + left) / width;
        result[(1, 1)] = 2.0 / height;
        result[(1, 3)] = -(top + bottom) / height;
        result[(2, 2)] = -2.0 / depth;
        result[(2, 3)] = -(far + near) / depth;
        result
    }
}
