//! Mirror demo application
//!
//! Renders a small scene into a mirror texture with a headless backend: the
//! rasterizer logs what it would submit and the canvas serves a cleared
//! pixel buffer. The observer walks along the mirror and finally steps
//! behind it, where frames are skipped and the last image is kept.
//!
//! Usage: `mirror_demo [config.toml|config.ron] [output.png]`

use std::rc::Rc;

use raster_engine::config::{Config, ConfigError};
use raster_engine::foundation::logging;
use raster_engine::prelude::*;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Could not write {path}: {message}")]
    Output { path: String, message: String },
}

/// Rasterizer that only counts and logs submissions
#[derive(Default)]
struct LoggingRasterizer {
    draws: usize,
}

impl Rasterizer for LoggingRasterizer {
    fn begin_frame(&mut self, time: f64) {
        log::trace!("begin frame at {time:.3}s");
    }

    fn set_viewport(&mut self, rect: Rect) {
        log::trace!("viewport {rect:?}");
    }

    fn set_scissor(&mut self, rect: Rect) {
        log::trace!("scissor {rect:?}");
    }

    fn clear(&mut self, flags: ClearFlags) {
        log::trace!("clear {flags:?}");
    }

    fn set_matrix(&mut self, _view: &Mat4, _projection: &Mat4, camera_position: Vec3, _camera_scale: Vec3) {
        log::debug!("camera at ({:.2}, {:.2}, {:.2})", camera_position.x, camera_position.y, camera_position.z);
    }

    fn bind_shading_state(&mut self, state: &ShadingState<'_>) {
        log::trace!("bind material {:?} ({:?})", state.material, state.blend);
    }

    fn set_alpha_blend(&mut self, _blend: BlendMode) {}

    fn deactivate_textures(&mut self) {}

    fn draw(&mut self, batch: &DrawBatch) {
        self.draws += 1;
        log::trace!("draw {:?} ({} indices)", batch.mesh, batch.index_count);
    }
}

/// Canvas backed by a cleared RGBA buffer
struct MemoryCanvas {
    width: u32,
    height: u32,
    clear_color: [u8; 4],
    offscreen: bool,
}

impl Canvas for MemoryCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bind_offscreen(&mut self) {
        self.offscreen = true;
    }

    fn restore_framebuffer(&mut self) {
        self.offscreen = false;
    }

    fn read_pixels(&mut self, rect: Rect) -> Option<Vec<u8>> {
        self.offscreen.then(|| self.clear_color.repeat(rect.area()))
    }

    fn end_frame(&mut self) {}
}

fn load_config(path: Option<&String>) -> Result<RasterConfig, DemoError> {
    let config = match path {
        Some(path) => RasterConfig::load_from_file(path)?,
        None => RasterConfig::default(),
    };
    config.validate().map_err(DemoError::InvalidConfig)?;
    Ok(config)
}

fn build_scene(config: &RasterConfig) -> (Scene, CameraId, ObjectId, CameraId) {
    let mut scene = Scene::with_bucket_config("mirror room", config.buckets.clone());

    let observer = scene.add_camera(
        Camera::new("player").with_transform(Transform::from_position(Vec3::new(0.0, -6.0, 0.5))),
    );
    let reflection = scene.add_camera(Camera::new("reflection"));

    let mirror = scene.add_object(
        RenderObject::builder("mirror")
            .geometry(Rc::new(MeshGeometry::quad_xz(2.0, 1.5, None)))
            .build(),
    );

    let painted = ShadingMaterial::new(MaterialId(1), "painted")
        .with_base_color([0.8, 0.3, 0.2, 1.0])
        .into_ref();
    let glass = ShadingMaterial::new(MaterialId(2), "glass")
        .with_blend(BlendMode::Blend)
        .with_base_color([0.6, 0.8, 1.0, 0.4])
        .into_ref();
    let crate_mesh = Rc::new(MeshGeometry::cuboid(Vec3::new(0.5, 0.5, 0.5), None));

    for (i, x) in [-1.5f32, 0.0, 1.5].into_iter().enumerate() {
        let material = if i == 1 { Rc::clone(&glass) } else { Rc::clone(&painted) };
        scene.add_object(
            RenderObject::builder(format!("crate {i}"))
                .transform(Transform::from_position(Vec3::new(x, -3.0, 0.0)))
                .geometry(Rc::clone(&crate_mesh))
                .slot(material, MeshHandle(i as u64 + 1), 36)
                .build(),
        );
    }

    (scene, observer, mirror, reflection)
}

fn run(config: &RasterConfig, output: Option<&String>) -> Result<(), DemoError> {
    let (mut scene, observer, mirror, reflection) = build_scene(config);
    let mut render = ImageRender::new_mirror(
        &scene,
        reflection,
        mirror,
        Observer::Camera(observer),
        None,
        &config.offscreen,
    )?;

    let mut canvas = MemoryCanvas {
        width: 256,
        height: 128,
        clear_color: [40, 40, 48, 255],
        offscreen: false,
    };
    let mut rasterizer = LoggingRasterizer::default();

    let path = [-2.0f32, -1.0, 0.0, 1.0, 2.0];
    for (frame, x) in path.iter().enumerate() {
        let y = if frame + 1 == path.len() { 1.0 } else { -6.0 };
        if let Some(camera) = scene.camera_mut(observer) {
            camera.node_mut().set_local_position(Vec3::new(*x, y, 0.5));
            camera.node_mut().update_world_data();
        }

        let mut ctx = RenderContext::new(&mut canvas, &mut rasterizer, frame as f64 / 60.0);
        if render.calc_viewport(&mut scene, &mut ctx)? {
            let stats = render.last_stats();
            log::info!(
                "frame {frame}: {} binds, {} draws",
                stats.material_binds,
                stats.draw_calls
            );
        } else {
            log::info!("frame {frame}: observer behind mirror, image kept");
        }
    }
    log::info!("{} draw calls submitted in total", rasterizer.draws);

    if let (Some(output), Some(image)) = (output, render.image()) {
        image.save(output).map_err(|e| DemoError::Output {
            path: output.clone(),
            message: e.to_string(),
        })?;
        log::info!("Saved mirror image to {output}");
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match load_config(args.first()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    logging::init_with_level(&config.engine.log_level);
    log::info!("Starting mirror demo");

    if let Err(e) = run(&config, args.get(1)) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
