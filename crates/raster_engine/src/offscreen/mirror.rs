//! # Mirror
//!
//! Planar mirror description and the reflected camera derived from it.
//!
//! A mirror is a rectangle in the mirror object's local space: centre,
//! right/up/normal axes and half extents. Each frame the observer is
//! reflected through the mirror plane and an off-axis frustum is fitted to
//! the rectangle as seen from the reflected position.
//!
//! ## Coordinate System
//! The mirror normal (Z) points away from the side the observer must be on,
//! so the reflected camera looking down its -Z sees through the mirror.

use crate::error::{RasterError, RasterResult};
use crate::foundation::math::{Mat3, Transform, Vec3};
use crate::render::{FrameFrustum, MaterialId};
use crate::scene::MeshGeometry;

/// Minimum observer distance and mirror half extent
pub const MIRROR_EPSILON: f32 = 0.01;

/// Mirror rectangle in the mirror object's local space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorSurface {
    /// Rectangle centre
    pub position: Vec3,
    /// Right axis (unit)
    pub x_axis: Vec3,
    /// Up axis (unit)
    pub y_axis: Vec3,
    /// Normal axis (unit), `x_axis = y_axis × z_axis`
    pub z_axis: Vec3,
    /// Half size along `x_axis`
    pub half_width: f32,
    /// Half size along `y_axis`
    pub half_height: f32,
}

impl MirrorSurface {
    /// Surface from explicit axes and extents
    pub fn new(position: Vec3, x_axis: Vec3, y_axis: Vec3, z_axis: Vec3, half_width: f32, half_height: f32) -> Self {
        Self {
            position,
            x_axis,
            y_axis,
            z_axis,
            half_width,
            half_height,
        }
    }

    /// Fit a mirror rectangle to mesh polygons
    ///
    /// Only polygons with `material` are used when a material is given. The
    /// normal is the negated mean polygon normal, the up axis is local +Z
    /// projected onto the plane.
    pub fn from_geometry(geometry: &MeshGeometry, material: Option<MaterialId>) -> RasterResult<Self> {
        let mut used = vec![false; geometry.vertices.len()];
        let mut normal_sum = Vec3::zeros();
        for polygon in &geometry.polygons {
            if material.is_some() && polygon.material != material {
                continue;
            }
            normal_sum += polygon.normal(&geometry.vertices).ok_or(RasterError::MirrorInvalid)?;
            for &index in &polygon.indices {
                used[index] = true;
            }
        }

        let vertices: Vec<Vec3> = geometry
            .vertices
            .iter()
            .zip(&used)
            .filter_map(|(v, used)| used.then_some(*v))
            .collect();
        if vertices.is_empty() {
            return Err(RasterError::MirrorSizeInvalid);
        }
        let position = vertices.iter().sum::<Vec3>() / vertices.len() as f32;

        if normal_sum.norm() <= f32::EPSILON {
            return Err(RasterError::MirrorNormalInvalid);
        }
        let z_axis = -normal_sum.normalize();

        let up = Vec3::z() - z_axis * z_axis.z;
        if up.norm() <= 1e-4 {
            return Err(RasterError::MirrorHorizontal);
        }
        let y_axis = up.normalize();
        let x_axis = y_axis.cross(&z_axis);

        let (half_width, half_height) = vertices.iter().fold((0.0f32, 0.0f32), |(w, h), v| {
            let d = v - position;
            (w.max(d.dot(&x_axis).abs()), h.max(d.dot(&y_axis).abs()))
        });
        if half_width == 0.0 && half_height == 0.0 {
            return Err(RasterError::MirrorSizeInvalid);
        }
        if half_width <= MIRROR_EPSILON || half_height <= MIRROR_EPSILON {
            return Err(RasterError::MirrorTooSmall);
        }

        Ok(Self::new(position, x_axis, y_axis, z_axis, half_width, half_height))
    }
}

/// Scale factor of the world axis closest to a local direction
fn dominant_scale(axis: &Vec3, scale: &Vec3) -> f32 {
    let (x, y, z) = (axis.x.abs(), axis.y.abs(), axis.z.abs());
    if x > y {
        if x > z {
            scale.x
        } else {
            scale.z
        }
    } else if y > z {
        scale.y
    } else {
        scale.z
    }
}

/// Reflected camera and its off-axis frustum for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MirrorFrustum {
    /// Left clip plane at the near distance
    pub left: f32,
    /// Right clip plane at the near distance
    pub right: f32,
    /// Bottom clip plane at the near distance
    pub bottom: f32,
    /// Top clip plane at the near distance
    pub top: f32,
    /// Distance from the camera to the mirror plane
    pub near: f32,
    /// `near` plus the clip distance
    pub far: f32,
    /// Reflected camera position in world space
    pub camera_position: Vec3,
    /// Reflected camera orientation, columns are the mirror axes in world space
    pub camera_orientation: Mat3,
}

impl MirrorFrustum {
    /// Reflect the observer through a mirror
    ///
    /// Returns `None` when the observer is not strictly more than
    /// [`MIRROR_EPSILON`] in front of the mirror plane.
    pub fn derive(surface: &MirrorSurface, mirror: &Transform, observer: Vec3, clip_distance: f32) -> Option<Self> {
        let world_position = mirror.position + mirror.scale.component_mul(&(mirror.orientation * surface.position));
        let world_x = mirror.orientation * surface.x_axis;
        let world_y = mirror.orientation * surface.y_axis;
        let world_z = mirror.orientation * surface.z_axis;

        let distance = world_position.dot(&world_z) - observer.dot(&world_z);
        if distance <= MIRROR_EPSILON {
            return None;
        }

        let camera_position = observer + (2.0 * distance) * world_z;
        let camera_orientation = Mat3::from_columns(&[world_x, world_y, world_z]);

        let offset = camera_orientation.transpose() * (world_position - camera_position);
        let width = dominant_scale(&surface.x_axis, &mirror.scale) * surface.half_width;
        let height = dominant_scale(&surface.y_axis, &mirror.scale) * surface.half_height;

        let near = -offset.z;
        Some(Self {
            left: offset.x - width,
            right: offset.x + width,
            bottom: offset.y - height,
            top: offset.y + height,
            near,
            far: near + clip_distance,
            camera_position,
            camera_orientation,
        })
    }

    /// Frustum bounds in the form projection builders take
    pub fn to_frame_frustum(&self) -> FrameFrustum {
        FrameFrustum::new(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }

    /// Unscaled world transform of the reflected camera
    pub fn camera_transform(&self) -> Transform {
        Transform {
            position: self.camera_position,
            orientation: self.camera_orientation,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Polygon;
    use approx::assert_relative_eq;

    fn facing_z() -> MirrorSurface {
        MirrorSurface::new(Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::z(), 1.0, 1.0)
    }

    #[test]
    fn test_reflection_of_centered_observer() {
        let frustum = MirrorFrustum::derive(&facing_z(), &Transform::identity(), Vec3::new(0.0, 0.0, -5.0), 100.0)
            .expect("observer is in front");

        assert_relative_eq!(frustum.camera_position, Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-6);
        assert_relative_eq!(frustum.camera_orientation, Mat3::identity(), epsilon = 1e-6);
        assert_relative_eq!(frustum.near, 5.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.far, 105.0, epsilon = 1e-5);
        assert_relative_eq!(frustum.left, -1.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.right, 1.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.bottom, -1.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.top, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_off_center_observer_gives_asymmetric_frustum() {
        let frustum =
            MirrorFrustum::derive(&facing_z(), &Transform::identity(), Vec3::new(3.0, -1.0, -2.0), 10.0).unwrap();

        assert_relative_eq!(frustum.camera_position, Vec3::new(3.0, -1.0, 2.0), epsilon = 1e-6);
        assert_relative_eq!(frustum.left, -4.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.right, -2.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.bottom, 0.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.top, 2.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.near, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_observer_at_threshold_is_rejected() {
        let surface = facing_z();
        let mirror = Transform::identity();
        assert!(MirrorFrustum::derive(&surface, &mirror, Vec3::new(0.0, 0.0, -MIRROR_EPSILON), 100.0).is_none());
        assert!(MirrorFrustum::derive(&surface, &mirror, Vec3::new(0.0, 0.0, -0.02), 100.0).is_some());
    }

    #[test]
    fn test_observer_behind_or_on_plane_is_rejected() {
        let surface = facing_z();
        let mirror = Transform::identity();
        assert!(MirrorFrustum::derive(&surface, &mirror, Vec3::new(0.0, 0.0, 5.0), 100.0).is_none());
        assert!(MirrorFrustum::derive(&surface, &mirror, Vec3::new(4.0, 2.0, 0.0), 100.0).is_none());
    }

    #[test]
    fn test_derivation_is_repeatable() {
        let surface = MirrorSurface::new(
            Vec3::new(0.3, 0.1, 0.0),
            Vec3::x(),
            Vec3::y(),
            Vec3::z(),
            0.7,
            1.3,
        );
        let mirror = Transform::from_position(Vec3::new(1.5, -2.0, 0.25)).with_scale(Vec3::new(1.1, 0.9, 2.0));
        let observer = Vec3::new(0.4, 0.8, -3.3);

        let first = MirrorFrustum::derive(&surface, &mirror, observer, 50.0).unwrap();
        let second = MirrorFrustum::derive(&surface, &mirror, observer, 50.0).unwrap();
        assert_eq!(first.left.to_bits(), second.left.to_bits());
        assert_eq!(first.right.to_bits(), second.right.to_bits());
        assert_eq!(first.bottom.to_bits(), second.bottom.to_bits());
        assert_eq!(first.top.to_bits(), second.top.to_bits());
        assert_eq!(first.near.to_bits(), second.near.to_bits());
        assert_eq!(first.far.to_bits(), second.far.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn test_scale_follows_dominant_axis() {
        // upright mirror in the XZ plane, observer on +Y
        let surface = MirrorSurface::new(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::x(),
            Vec3::z(),
            Vec3::new(0.0, -1.0, 0.0),
            1.0,
            0.5,
        );
        let mirror = Transform::from_position(Vec3::new(10.0, 0.0, 0.0)).with_scale(Vec3::new(2.0, 3.0, 4.0));
        let frustum = MirrorFrustum::derive(&surface, &mirror, Vec3::new(12.0, 5.0, 0.0), 100.0).unwrap();

        assert_relative_eq!(frustum.camera_position, Vec3::new(12.0, -5.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(frustum.near, 5.0, epsilon = 1e-6);
        // width scaled by x (2.0), height by z (4.0)
        assert_relative_eq!(frustum.left, -2.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.right, 2.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.bottom, -2.0, epsilon = 1e-6);
        assert_relative_eq!(frustum.top, 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rotated_mirror_axes_follow_orientation() {
        let rotation = Mat3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let mirror = Transform {
            position: Vec3::zeros(),
            orientation: rotation,
            scale: Vec3::new(1.0, 1.0, 1.0),
        };
        let frustum = MirrorFrustum::derive(&facing_z(), &mirror, Vec3::new(0.0, 0.0, -1.0), 10.0).unwrap();
        assert_relative_eq!(frustum.camera_orientation, rotation, epsilon = 1e-6);
        assert_relative_eq!(frustum.camera_transform().to_matrix().fixed_view::<3, 3>(0, 0).into_owned(), rotation, epsilon = 1e-6);
    }

    #[test]
    fn test_surface_from_quad() {
        let quad = MeshGeometry::quad_xz(2.0, 1.0, None);
        let surface = MirrorSurface::from_geometry(&quad, None).unwrap();

        assert_relative_eq!(surface.position, Vec3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(surface.z_axis, Vec3::y(), epsilon = 1e-6);
        assert_relative_eq!(surface.y_axis, Vec3::z(), epsilon = 1e-6);
        assert_relative_eq!(surface.x_axis, -Vec3::x(), epsilon = 1e-6);
        assert_relative_eq!(surface.half_width, 2.0, epsilon = 1e-6);
        assert_relative_eq!(surface.half_height, 1.0, epsilon = 1e-6);

        // observer on the side the polygon faces
        let frustum = MirrorFrustum::derive(&surface, &Transform::identity(), Vec3::new(0.0, -3.0, 0.0), 10.0);
        assert!(frustum.is_some());
    }

    #[test]
    fn test_surface_material_filter() {
        let mut mesh = MeshGeometry::quad_xz(1.0, 1.0, Some(MaterialId(7)));
        mesh.vertices.push(Vec3::new(50.0, 0.0, 0.0));
        mesh.vertices.push(Vec3::new(60.0, 0.0, 0.0));
        mesh.vertices.push(Vec3::new(60.0, 0.0, 10.0));
        mesh.polygons.push(Polygon::with_material(vec![4, 5, 6], MaterialId(8)));

        let surface = MirrorSurface::from_geometry(&mesh, Some(MaterialId(7))).unwrap();
        assert_relative_eq!(surface.position, Vec3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(surface.half_width, 1.0, epsilon = 1e-6);

        assert!(matches!(
            MirrorSurface::from_geometry(&mesh, Some(MaterialId(9))),
            Err(RasterError::MirrorSizeInvalid)
        ));
    }

    #[test]
    fn test_surface_errors() {
        assert!(matches!(
            MirrorSurface::from_geometry(&MeshGeometry::default(), None),
            Err(RasterError::MirrorSizeInvalid)
        ));

        let collinear = MeshGeometry::new(
            vec![Vec3::zeros(), Vec3::x(), Vec3::new(2.0, 0.0, 0.0)],
            vec![Polygon::new(vec![0, 1, 2])],
        );
        assert!(matches!(
            MirrorSurface::from_geometry(&collinear, None),
            Err(RasterError::MirrorNormalInvalid)
        ));

        let horizontal = MeshGeometry::new(
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            vec![Polygon::new(vec![0, 1, 2, 3])],
        );
        assert!(matches!(
            MirrorSurface::from_geometry(&horizontal, None),
            Err(RasterError::MirrorHorizontal)
        ));

        let sliver = MeshGeometry::quad_xz(1.0, 0.005, None);
        assert!(matches!(
            MirrorSurface::from_geometry(&sliver, None),
            Err(RasterError::MirrorTooSmall)
        ));

        let broken = MeshGeometry::new(vec![Vec3::zeros()], vec![Polygon::new(vec![0, 1, 2])]);
        assert!(matches!(
            MirrorSurface::from_geometry(&broken, None),
            Err(RasterError::MirrorInvalid)
        ));
    }
}
