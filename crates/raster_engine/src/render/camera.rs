//! # Camera
//!
//! A camera is a scene node plus projection settings. Its projection matrix
//! is cached: primary rendering builds it from lens and sensor data, mirror
//! rendering overwrites it with an off-axis frustum every frame.
//!
//! ## Coordinate System
//! Right-handed, Y-up view space with the camera looking down -Z, the
//! convention `Mat4Ext::frustum` expects.

use super::frame_frustum::{compute_default_frustum, compute_default_ortho, FrameFrustum, SensorFit};
use super::Rasterizer;
use crate::culling::Frustum;
use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::scene::{SceneNode, SpatialNode};

/// Camera with cached projection and modelview matrices
#[derive(Debug)]
pub struct Camera {
    name: String,
    node: Box<dyn SceneNode>,

    /// Focal length in millimetres
    pub lens: f32,
    /// Sensor width in millimetres
    pub sensor_x: f32,
    /// Sensor height in millimetres
    pub sensor_y: f32,
    /// Sensor dimension driving the field of view
    pub sensor_fit: SensorFit,
    /// Horizontal lens shift in frame widths
    pub shift_x: f32,
    /// Vertical lens shift in frame widths
    pub shift_y: f32,
    /// Near clip distance
    pub near: f32,
    /// Far clip distance
    pub far: f32,
    /// Perspective (true) or orthographic projection
    pub perspective: bool,
    /// Orthographic view size in scene units
    pub ortho_scale: f32,

    projection: Option<Mat4>,
    modelview: Mat4,
    has_viewport: bool,
}

impl Camera {
    /// Perspective camera at the world origin looking down -Z
    ///
    /// Defaults: 35mm lens on a 32x18mm sensor, clipping from 0.1 to 100.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node: Box::new(SpatialNode::default()),
            lens: 35.0,
            sensor_x: 32.0,
            sensor_y: 18.0,
            sensor_fit: SensorFit::Auto,
            shift_x: 0.0,
            shift_y: 0.0,
            near: 0.1,
            far: 100.0,
            perspective: true,
            ortho_scale: 7.0,
            projection: None,
            modelview: Mat4::identity(),
            has_viewport: false,
        }
    }

    /// Place the camera with a transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.node = Box::new(SpatialNode::new(transform));
        self
    }

    /// Use a node from the scene-graph library
    pub fn with_node(mut self, node: Box<dyn SceneNode>) -> Self {
        self.node = node;
        self
    }

    /// Switch to orthographic projection
    pub fn with_ortho(mut self, scale: f32) -> Self {
        self.perspective = false;
        self.ortho_scale = scale;
        self
    }

    /// Camera name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scene node carrying the camera transform
    pub fn node(&self) -> &dyn SceneNode {
        self.node.as_ref()
    }

    /// Mutable scene node
    pub fn node_mut(&mut self) -> &mut dyn SceneNode {
        self.node.as_mut()
    }

    /// World position of the camera
    pub fn world_position(&self) -> Vec3 {
        self.node.world_position()
    }

    /// View matrix (world → camera), scale ignored
    pub fn world_to_camera(&self) -> Mat4 {
        self.node.world_transform().rigid_inverse_matrix()
    }

    /// Cached projection, identity when none was set
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection.unwrap_or_else(Mat4::identity)
    }

    /// Store a projection matrix
    pub fn set_projection_matrix(&mut self, projection: Mat4) {
        self.projection = Some(projection);
    }

    /// True once a projection matrix was stored
    pub fn has_valid_projection_matrix(&self) -> bool {
        self.projection.is_some()
    }

    /// Force the projection to be rebuilt from lens settings
    pub fn invalidate_projection_matrix(&mut self) {
        self.projection = None;
    }

    /// Last modelview matrix used for rendering
    pub fn modelview_matrix(&self) -> Mat4 {
        self.modelview
    }

    /// Remember the modelview matrix used for rendering
    pub fn set_modelview_matrix(&mut self, modelview: Mat4) {
        self.modelview = modelview;
    }

    /// True when the camera renders into its own viewport of the main canvas
    pub fn has_viewport(&self) -> bool {
        self.has_viewport
    }

    /// Enable or disable the camera's own viewport
    pub fn set_viewport_enabled(&mut self, enabled: bool) {
        self.has_viewport = enabled;
    }

    /// Frame frustum from lens or ortho settings
    ///
    /// Perspective framing always fits automatically; `sensor_fit` only
    /// applies to orthographic cameras.
    pub fn frame_frustum(&self, aspect_ratio: f32) -> FrameFrustum {
        if self.perspective {
            compute_default_frustum(
                self.near,
                self.far,
                self.lens,
                self.sensor_x,
                self.sensor_y,
                SensorFit::Auto,
                self.shift_x,
                self.shift_y,
                aspect_ratio,
            )
        } else {
            compute_default_ortho(
                self.near,
                self.far,
                self.ortho_scale,
                aspect_ratio,
                self.sensor_fit,
                self.shift_x,
                self.shift_y,
            )
        }
    }

    /// Build the projection from lens settings unless one is cached
    pub fn ensure_projection(&mut self, rasterizer: &dyn Rasterizer, aspect_ratio: f32) {
        if self.has_valid_projection_matrix() {
            return;
        }
        let frustum = self.frame_frustum(aspect_ratio);
        let projection = if self.perspective {
            rasterizer.frustum_matrix(&frustum)
        } else {
            rasterizer.ortho_matrix(&frustum)
        };
        log::trace!("Camera '{}' projection rebuilt: {:?}", self.name, frustum);
        self.projection = Some(projection);
    }

    /// World-space culling frustum of the current projection and transform
    pub fn culling_frustum(&self) -> Frustum {
        Frustum::from_matrix(&(self.projection_matrix() * self.world_to_camera()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Aabb;
    use crate::test_support::RecordingRasterizer;

    #[test]
    fn test_projection_is_built_once() {
        let mut camera = Camera::new("cam");
        let rasterizer = RecordingRasterizer::default();
        assert!(!camera.has_valid_projection_matrix());

        camera.ensure_projection(&rasterizer, 16.0 / 9.0);
        let first = camera.projection_matrix();
        assert!(camera.has_valid_projection_matrix());

        camera.lens = 50.0;
        camera.ensure_projection(&rasterizer, 16.0 / 9.0);
        assert_eq!(camera.projection_matrix(), first);

        camera.invalidate_projection_matrix();
        camera.ensure_projection(&rasterizer, 16.0 / 9.0);
        assert_ne!(camera.projection_matrix(), first);
    }

    #[test]
    fn test_culling_frustum_follows_transform() {
        let mut camera = Camera::new("cam").with_transform(Transform::from_position(Vec3::new(0.0, 0.0, 10.0)));
        camera.ensure_projection(&RecordingRasterizer::default(), 1.0);
        let frustum = camera.culling_frustum();

        let ahead = Aabb::from_center_extents(Vec3::zeros(), Vec3::new(0.5, 0.5, 0.5));
        let behind = Aabb::from_center_extents(Vec3::new(0.0, 0.0, 20.0), Vec3::new(0.5, 0.5, 0.5));
        assert!(frustum.intersects_aabb(&ahead));
        assert!(!frustum.intersects_aabb(&behind));
    }

    #[test]
    fn test_ortho_camera_uses_ortho_matrix() {
        let mut camera = Camera::new("ortho").with_ortho(4.0);
        camera.ensure_projection(&RecordingRasterizer::default(), 1.0);
        let projection = camera.projection_matrix();
        // orthographic: no perspective divide
        assert_eq!(projection[(3, 2)], 0.0);
        assert_eq!(projection[(3, 3)], 1.0);
        assert!((projection[(0, 0)] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sensor_fit_only_affects_ortho_framing() {
        let auto = Camera::new("auto");
        let mut vertical = Camera::new("vertical");
        vertical.sensor_fit = SensorFit::Vertical;
        assert_eq!(vertical.frame_frustum(2.0), auto.frame_frustum(2.0));

        let auto = auto.with_ortho(4.0);
        let vertical = vertical.with_ortho(4.0);
        let fitted = vertical.frame_frustum(2.0);
        assert_ne!(fitted, auto.frame_frustum(2.0));
        assert!((fitted.y2 - 2.0).abs() < 1e-6);
        assert!((fitted.x2 - 4.0).abs() < 1e-6);
    }
}
