//! # Render to Texture
//!
//! [`ImageRender`] renders a scene from a secondary camera into the offscreen
//! target and reads the result back into an image. In mirror mode the camera
//! is re-placed every frame as the reflection of an observer.
//!
//! ## Frame protocol
//!
//! ```text
//! render()        → scene drawn offscreen, done = true, image not yet available
//! calc_viewport() → render if needed, read pixels, restore the main viewport
//! refresh()       → render unless a finished frame is pending, then unbind
//! ```
//!
//! A render is all-or-nothing: every rejection happens before the offscreen
//! target is bound, so a skipped frame leaves the previous image untouched.

use image::RgbaImage;

use super::{ImageViewport, MirrorFrustum, MirrorSurface};
use crate::core::OffscreenConfig;
use crate::error::{RasterError, RasterResult};
use crate::foundation::math::Vec3;
use crate::render::{Camera, Canvas, ClearFlags, MaterialId, RenderContext, RenderStats};
use crate::scene::{CameraId, ObjectId, Scene};

/// Whose eye a mirror reflects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Observer {
    /// The scene's active camera at render time
    #[default]
    ActiveCamera,
    /// An object of the scene
    Object(ObjectId),
    /// A camera of the scene
    Camera(CameraId),
}

#[derive(Debug, Clone, Copy)]
struct MirrorTarget {
    object: ObjectId,
    surface: MirrorSurface,
}

/// Offscreen render driver for one camera
#[derive(Debug)]
pub struct ImageRender {
    camera: CameraId,
    mirror: Option<MirrorTarget>,
    observer: Observer,
    clip: f32,
    layer: u32,
    enabled: bool,
    done: bool,
    avail: bool,
    viewport: ImageViewport,
    image: Option<RgbaImage>,
    last_stats: RenderStats,
}

impl ImageRender {
    /// Render-to-texture from a scene camera
    ///
    /// The camera must not be the active camera when rendering, otherwise
    /// every frame is skipped.
    pub fn new(scene: &Scene, camera: CameraId, config: &OffscreenConfig) -> RasterResult<Self> {
        if scene.camera(camera).is_none() {
            return Err(RasterError::CameraInvalid);
        }
        let mut render = Self {
            camera,
            mirror: None,
            observer: Observer::ActiveCamera,
            clip: config.clip_distance,
            layer: 0,
            enabled: true,
            done: false,
            avail: false,
            viewport: ImageViewport::from_config(config),
            image: None,
            last_stats: RenderStats::default(),
        };
        render.set_clip(config.clip_distance)?;
        Ok(render)
    }

    /// Mirror reflecting `observer` in the polygons of `mirror`
    ///
    /// `material` restricts the mirror surface to polygons of that material.
    pub fn new_mirror(
        scene: &Scene,
        camera: CameraId,
        mirror: ObjectId,
        observer: Observer,
        material: Option<MaterialId>,
        config: &OffscreenConfig,
    ) -> RasterResult<Self> {
        let mut render = Self::new(scene, camera, config)?;
        render.set_observer(scene, observer)?;
        render.set_mirror(scene, mirror, material)?;
        Ok(render)
    }

    /// Camera the scene is rendered from
    pub fn camera(&self) -> CameraId {
        self.camera
    }

    /// Switch to mirror mode with the polygons of `mirror`
    pub fn set_mirror(&mut self, scene: &Scene, mirror: ObjectId, material: Option<MaterialId>) -> RasterResult<()> {
        let geometry = scene
            .object(mirror)
            .and_then(|object| object.geometry())
            .ok_or(RasterError::MirrorInvalid)?;
        let surface = MirrorSurface::from_geometry(geometry, material)?;
        log::debug!(
            "Mirror set up: half size {}x{}, normal {:?}",
            surface.half_width,
            surface.half_height,
            surface.z_axis
        );
        self.mirror = Some(MirrorTarget { object: mirror, surface });
        Ok(())
    }

    /// Use an explicit mirror surface on `mirror`
    pub fn set_mirror_surface(&mut self, scene: &Scene, mirror: ObjectId, surface: MirrorSurface) -> RasterResult<()> {
        if scene.object(mirror).is_none() {
            return Err(RasterError::MirrorInvalid);
        }
        self.mirror = Some(MirrorTarget { object: mirror, surface });
        Ok(())
    }

    /// Leave mirror mode; the camera keeps its last placement
    pub fn clear_mirror(&mut self) {
        self.mirror = None;
    }

    /// Mirror surface in the mirror object's local space
    pub fn mirror_surface(&self) -> Option<&MirrorSurface> {
        self.mirror.as_ref().map(|target| &target.surface)
    }

    /// Whose eye the mirror reflects
    pub fn observer(&self) -> Observer {
        self.observer
    }

    /// Set the reflected observer
    ///
    /// The observer cannot be the render camera itself.
    pub fn set_observer(&mut self, scene: &Scene, observer: Observer) -> RasterResult<()> {
        let valid = match observer {
            Observer::ActiveCamera => true,
            Observer::Object(id) => scene.object(id).is_some(),
            Observer::Camera(id) => id != self.camera && scene.camera(id).is_some(),
        };
        if !valid {
            return Err(RasterError::ObserverInvalid);
        }
        self.observer = observer;
        Ok(())
    }

    /// Far distance of the mirror frustum beyond the mirror plane
    pub fn clip(&self) -> f32 {
        self.clip
    }

    /// Set the mirror clip distance
    pub fn set_clip(&mut self, clip: f32) -> RasterResult<()> {
        if clip.is_nan() || clip <= 0.0 {
            return Err(RasterError::ClipInvalid(clip));
        }
        self.clip = clip;
        Ok(())
    }

    /// Layer mask of rendered objects (0 renders every layer)
    pub fn set_layer(&mut self, layer: u32) {
        self.layer = layer;
    }

    /// Whether rendering is enabled
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable rendering
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// True when a frame was rendered but not read back yet
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// True when [`ImageRender::image`] holds the last rendered frame
    pub fn is_available(&self) -> bool {
        self.avail
    }

    /// Capture area settings
    pub fn viewport(&self) -> &ImageViewport {
        &self.viewport
    }

    /// Change the capture area
    pub fn set_viewport(&mut self, viewport: ImageViewport) {
        self.viewport = viewport;
    }

    /// Last captured image
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Bucket statistics of the last rendered frame
    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    fn observer_position(&self, scene: &Scene) -> Option<Vec3> {
        match self.observer {
            Observer::ActiveCamera => scene
                .active_camera()
                .and_then(|id| scene.camera(id))
                .map(Camera::world_position),
            Observer::Object(id) => scene.object(id).map(|object| object.node().world_position()),
            Observer::Camera(id) => scene.camera(id).map(Camera::world_position),
        }
    }

    fn mirror_frustum(&self, scene: &Scene, target: &MirrorTarget) -> Option<MirrorFrustum> {
        let mirror = scene.object(target.object)?.world_transform();
        let observer = self.observer_position(scene)?;
        MirrorFrustum::derive(&target.surface, &mirror, observer, self.clip)
    }

    /// Render the scene into the offscreen target
    ///
    /// Returns `false` without touching the canvas when rendering is
    /// disabled, the camera owns a viewport or is the active camera, or the
    /// observer is not in front of the mirror.
    pub fn render(&mut self, scene: &mut Scene, ctx: &mut RenderContext<'_>) -> bool {
        if !self.enabled {
            return false;
        }
        match scene.camera(self.camera) {
            Some(camera) if !camera.has_viewport() && scene.active_camera() != Some(self.camera) => {}
            _ => return false,
        }

        let mirror = match &self.mirror {
            Some(target) => match self.mirror_frustum(scene, target) {
                Some(frustum) => Some(frustum),
                None => {
                    log::trace!("Mirror frame skipped: observer not in front of the mirror");
                    return false;
                }
            },
            None => None,
        };

        let aspect_ratio = scene.frame_settings().aspect_ratio();
        let Some(camera) = scene.camera_mut(self.camera) else {
            return false;
        };
        if let Some(frustum) = &mirror {
            let node = camera.node_mut();
            node.set_local_position(frustum.camera_position);
            node.set_local_orientation(frustum.camera_orientation);
            node.update_world_data();
        }

        ctx.canvas.bind_offscreen();
        ctx.rasterizer.begin_frame(ctx.clock_time);
        let area = self.viewport.capture_rect(&*ctx.canvas);
        ctx.rasterizer.set_viewport(area);
        ctx.rasterizer.set_scissor(area);
        ctx.rasterizer.clear(ClearFlags::DEPTH);

        match &mirror {
            Some(frustum) => {
                let projection = ctx.rasterizer.frustum_matrix(&frustum.to_frame_frustum());
                camera.set_projection_matrix(projection);
            }
            None => camera.ensure_projection(&*ctx.rasterizer, aspect_ratio),
        }

        let view = camera.world_to_camera();
        ctx.rasterizer.set_matrix(
            &view,
            &camera.projection_matrix(),
            camera.world_position(),
            camera.node().world_scaling(),
        );
        camera.set_modelview_matrix(view);

        let nodes = scene
            .calculate_visible_meshes(self.camera, self.layer)
            .unwrap_or_default();
        self.last_stats = scene.render_buckets(&nodes, &mut *ctx.rasterizer, &view);
        ctx.canvas.end_frame();

        self.done = true;
        self.avail = false;
        true
    }

    /// Render unless a finished frame is still pending, then unbind
    pub fn refresh(&mut self, scene: &mut Scene, ctx: &mut RenderContext<'_>) -> bool {
        let rendered = !self.done && self.render(scene, ctx);
        self.unbind(&mut *ctx.canvas);
        rendered
    }

    /// Go back to the main framebuffer
    pub fn unbind(&self, canvas: &mut dyn Canvas) {
        canvas.restore_framebuffer();
    }

    /// Read the rendered frame into [`ImageRender::image`]
    ///
    /// Renders first when no finished frame is pending. Returns `Ok(false)`
    /// when that render was skipped; the previous image is kept. The main
    /// viewport and framebuffer are restored whether or not the read succeeds.
    pub fn calc_viewport(&mut self, scene: &mut Scene, ctx: &mut RenderContext<'_>) -> RasterResult<bool> {
        if !self.done && !self.render(scene, ctx) {
            return Ok(false);
        }
        self.done = false;

        let rect = self.viewport.capture_rect(&*ctx.canvas);
        let captured = ctx
            .canvas
            .read_pixels(rect)
            .ok_or_else(|| RasterError::CaptureFailed("offscreen target has no pixels".into()))
            .and_then(|pixels| {
                RgbaImage::from_raw(rect.width, rect.height, pixels)
                    .ok_or_else(|| RasterError::CaptureFailed("pixel buffer does not match capture size".into()))
            });

        let area = ctx.canvas.viewport_area();
        ctx.rasterizer.set_viewport(area);
        ctx.rasterizer.set_scissor(area);
        self.unbind(&mut *ctx.canvas);

        let mut image = captured?;
        // read back bottom row first
        image::imageops::flip_vertical_in_place(&mut image);
        if !self.viewport.alpha {
            for pixel in image.pixels_mut() {
                pixel[3] = 255;
            }
        }
        self.image = Some(image);
        self.avail = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat3, Transform};
    use crate::render::{MeshHandle, Rect, ShadingMaterial};
    use crate::scene::{MeshGeometry, RenderObject};
    use crate::test_support::{RasterCall, RecordingRasterizer, TestCanvas};
    use approx::assert_relative_eq;
    use std::rc::Rc;

    struct Fixture {
        scene: Scene,
        main_camera: CameraId,
        mirror_camera: CameraId,
        mirror: ObjectId,
    }

    /// Upright mirror in the XZ plane facing -Y, main camera at y = -5, a cube at y = -3
    fn fixture() -> Fixture {
        let mut scene = Scene::new("mirror test");
        let main_camera = scene.add_camera(
            Camera::new("main").with_transform(Transform::from_position(Vec3::new(0.0, -5.0, 0.0))),
        );
        let mirror_camera = scene.add_camera(Camera::new("reflection"));
        let mirror = scene.add_object(
            RenderObject::builder("mirror")
                .geometry(Rc::new(MeshGeometry::quad_xz(2.0, 1.0, None)))
                .build(),
        );
        let material = ShadingMaterial::new(MaterialId(1), "paint").into_ref();
        scene.add_object(
            RenderObject::builder("cube")
                .transform(Transform::from_position(Vec3::new(0.0, -3.0, 0.0)))
                .geometry(Rc::new(MeshGeometry::cuboid(Vec3::new(0.5, 0.5, 0.5), None)))
                .slot(material, MeshHandle(9), 36)
                .build(),
        );
        Fixture {
            scene,
            main_camera,
            mirror_camera,
            mirror,
        }
    }

    fn mirror_render(fixture: &Fixture) -> ImageRender {
        ImageRender::new_mirror(
            &fixture.scene,
            fixture.mirror_camera,
            fixture.mirror,
            Observer::ActiveCamera,
            None,
            &OffscreenConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_mirror_render_places_reflected_camera() {
        let mut fixture = fixture();
        let mut render = mirror_render(&fixture);
        let mut canvas = TestCanvas::new(64, 32);
        let mut rasterizer = RecordingRasterizer::default();
        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, 1.5);

        assert!(render.render(&mut fixture.scene, &mut ctx));
        assert!(render.is_done());
        assert!(!render.is_available());
        assert_eq!(render.last_stats().draw_calls, 1);

        let camera = fixture.scene.camera(fixture.mirror_camera).unwrap();
        assert_relative_eq!(camera.world_position(), Vec3::new(0.0, 5.0, 0.0), epsilon = 1e-5);
        let expected = Mat3::from_columns(&[-Vec3::x(), Vec3::z(), Vec3::y()]);
        assert_relative_eq!(camera.node().world_orientation(), expected, epsilon = 1e-5);
        assert!(camera.has_valid_projection_matrix());

        assert_eq!(canvas.offscreen_binds, 1);
        assert_eq!(canvas.end_frames, 1);
        assert_eq!(rasterizer.calls[0], RasterCall::BeginFrame(1.5));
        assert_eq!(rasterizer.calls[1], RasterCall::Viewport(Rect::new(0, 0, 64, 32)));
        assert_eq!(rasterizer.calls[3], RasterCall::Clear(ClearFlags::DEPTH));
        assert_eq!(rasterizer.drawn_meshes(), vec![MeshHandle(9)]);
    }

    #[test]
    fn test_observer_behind_mirror_skips_frame() {
        let mut fixture = fixture();
        let mut render = mirror_render(&fixture);
        fixture
            .scene
            .camera_mut(fixture.main_camera)
            .unwrap()
            .node_mut()
            .set_local_position(Vec3::new(0.0, 3.0, 0.0));
        fixture.scene.camera_mut(fixture.main_camera).unwrap().node_mut().update_world_data();

        let mut canvas = TestCanvas::new(64, 32);
        let mut rasterizer = RecordingRasterizer::default();
        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, 0.0);

        assert!(!render.render(&mut fixture.scene, &mut ctx));
        assert!(!render.is_done());
        assert_eq!(canvas.offscreen_binds, 0);
        assert!(rasterizer.calls.is_empty());
    }

    #[test]
    fn test_rejections_leave_canvas_untouched() {
        let mut fixture = fixture();
        let mut canvas = TestCanvas::new(64, 32);
        let mut rasterizer = RecordingRasterizer::default();
        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, 0.0);

        let mut active = ImageRender::new(&fixture.scene, fixture.main_camera, &OffscreenConfig::default()).unwrap();
        assert!(!active.render(&mut fixture.scene, &mut ctx));

        let mut disabled = mirror_render(&fixture);
        disabled.set_enabled(false);
        assert!(!disabled.render(&mut fixture.scene, &mut ctx));

        let mut with_viewport = mirror_render(&fixture);
        fixture
            .scene
            .camera_mut(fixture.mirror_camera)
            .unwrap()
            .set_viewport_enabled(true);
        assert!(!with_viewport.render(&mut fixture.scene, &mut ctx));

        drop(ctx);
        assert_eq!(canvas.offscreen_binds, 0);
        assert!(rasterizer.calls.is_empty());
    }

    #[test]
    fn test_plain_render_builds_default_projection() {
        let mut fixture = fixture();
        let mut render = ImageRender::new(&fixture.scene, fixture.mirror_camera, &OffscreenConfig::default()).unwrap();
        let mut canvas = TestCanvas::new(64, 32);
        let mut rasterizer = RecordingRasterizer::default();
        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, 0.0);

        assert!(!fixture.scene.camera(fixture.mirror_camera).unwrap().has_valid_projection_matrix());
        assert!(render.render(&mut fixture.scene, &mut ctx));
        let camera = fixture.scene.camera(fixture.mirror_camera).unwrap();
        assert!(camera.has_valid_projection_matrix());
        assert_relative_eq!(camera.world_position(), Vec3::zeros());
    }

    #[test]
    fn test_calc_viewport_reads_and_restores() {
        let mut fixture = fixture();
        let mut render = mirror_render(&fixture);
        let mut canvas = TestCanvas::new(8, 4);
        let mut rasterizer = RecordingRasterizer::default();
        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, 0.0);

        assert!(render.calc_viewport(&mut fixture.scene, &mut ctx).unwrap());
        assert!(!render.is_done());
        assert!(render.is_available());

        let image = render.image().unwrap();
        assert_eq!(image.dimensions(), (8, 4));
        assert_eq!(image.get_pixel(3, 2).0, [10, 20, 30, 255]);

        drop(ctx);
        assert_eq!(canvas.offscreen_binds, 1);
        assert_eq!(canvas.restores, 1);
        assert_eq!(rasterizer.calls.last(), Some(&RasterCall::Scissor(Rect::new(0, 0, 8, 4))));
    }

    #[test]
    fn test_calc_viewport_keeps_alpha_when_asked() {
        let mut fixture = fixture();
        let mut render = mirror_render(&fixture);
        render.set_viewport(ImageViewport {
            alpha: true,
            capture_size: [2, 2],
            ..ImageViewport::default()
        });
        let mut canvas = TestCanvas::new(8, 4);
        let mut rasterizer = RecordingRasterizer::default();
        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, 0.0);

        assert!(render.calc_viewport(&mut fixture.scene, &mut ctx).unwrap());
        let image = render.image().unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0).0, [10, 20, 30, 0]);
    }

    #[test]
    fn test_failed_read_still_restores() {
        let mut fixture = fixture();
        let mut render = mirror_render(&fixture);
        let mut canvas = TestCanvas::new(8, 4);
        canvas.fail_reads = true;
        let mut rasterizer = RecordingRasterizer::default();
        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, 0.0);

        let result = render.calc_viewport(&mut fixture.scene, &mut ctx);
        assert!(matches!(result, Err(RasterError::CaptureFailed(_))));
        assert!(render.image().is_none());
        drop(ctx);
        assert_eq!(canvas.restores, 1);
    }

    #[test]
    fn test_refresh_waits_for_pending_frame() {
        let mut fixture = fixture();
        let mut render = mirror_render(&fixture);
        let mut canvas = TestCanvas::new(8, 4);
        let mut rasterizer = RecordingRasterizer::default();
        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, 0.0);

        assert!(render.refresh(&mut fixture.scene, &mut ctx));
        assert!(!render.refresh(&mut fixture.scene, &mut ctx));
        drop(ctx);
        assert_eq!(canvas.offscreen_binds, 1);
        assert_eq!(canvas.restores, 2);
    }

    #[test]
    fn test_setup_errors() {
        let fixture = fixture();
        let config = OffscreenConfig::default();

        assert!(matches!(
            ImageRender::new(&fixture.scene, CameraId::default(), &config),
            Err(RasterError::CameraInvalid)
        ));

        let cube = fixture
            .scene
            .objects()
            .find(|(_, object)| object.name() == "cube")
            .map(|(id, _)| id)
            .unwrap();
        let mut render = ImageRender::new(&fixture.scene, fixture.mirror_camera, &config).unwrap();
        assert!(matches!(
            render.set_mirror(&fixture.scene, ObjectId::default(), None),
            Err(RasterError::MirrorInvalid)
        ));
        // a closed box has no usable plane
        assert!(matches!(
            render.set_mirror(&fixture.scene, cube, None),
            Err(RasterError::MirrorNormalInvalid)
        ));
        assert!(matches!(
            render.set_observer(&fixture.scene, Observer::Camera(fixture.mirror_camera)),
            Err(RasterError::ObserverInvalid)
        ));
        assert!(matches!(
            render.set_observer(&fixture.scene, Observer::Object(ObjectId::default())),
            Err(RasterError::ObserverInvalid)
        ));
        assert!(render.set_observer(&fixture.scene, Observer::Object(cube)).is_ok());
        assert!(matches!(render.set_clip(0.0), Err(RasterError::ClipInvalid(_))));
        assert!(matches!(render.set_clip(f32::NAN), Err(RasterError::ClipInvalid(_))));
        assert!(render.set_clip(25.0).is_ok());
        assert_relative_eq!(render.clip(), 25.0);
    }
}
