//! Recording doubles for the rasterizer, canvas and shape interfaces

use crate::bounds::{ShapeKind, ShapeSource};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::{
    BlendMode, Canvas, ClearFlags, DrawBatch, MaterialId, MeshHandle, Rasterizer, Rect, ShadingState, TextureHandle,
};

/// Shape with a fixed bound box, or none at all
pub(crate) struct FixedShape {
    kind: ShapeKind,
    corners: Option<[Vec3; 8]>,
}

impl FixedShape {
    /// Cube of half size `half` centred at the origin
    pub(crate) fn cube(kind: ShapeKind, half: f32) -> Self {
        let corners = std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { -half } else { half },
                if i & 2 == 0 { -half } else { half },
                if i & 4 == 0 { -half } else { half },
            )
        });
        Self {
            kind,
            corners: Some(corners),
        }
    }

    /// Shape whose data was never evaluated
    pub(crate) fn missing(kind: ShapeKind) -> Self {
        Self { kind, corners: None }
    }
}

impl ShapeSource for FixedShape {
    fn kind(&self) -> ShapeKind {
        self.kind
    }

    fn bound_box(&self) -> Option<[Vec3; 8]> {
        self.corners
    }
}

/// One call received by [`RecordingRasterizer`]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RasterCall {
    BeginFrame(f64),
    Viewport(Rect),
    Scissor(Rect),
    Clear(ClearFlags),
    SetMatrix {
        view: Mat4,
        projection: Mat4,
        camera_position: Vec3,
    },
    BindShading {
        material: MaterialId,
        uniform_bytes: usize,
        textures: Vec<TextureHandle>,
    },
    AlphaBlend(BlendMode),
    DeactivateTextures,
    Draw(MeshHandle),
}

/// Rasterizer that records every call in order
#[derive(Debug, Default)]
pub(crate) struct RecordingRasterizer {
    pub(crate) calls: Vec<RasterCall>,
}

impl RecordingRasterizer {
    /// Materials in bind order
    pub(crate) fn bound_materials(&self) -> Vec<MaterialId> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RasterCall::BindShading { material, .. } => Some(*material),
                _ => None,
            })
            .collect()
    }

    /// Meshes in draw order
    pub(crate) fn drawn_meshes(&self) -> Vec<MeshHandle> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                RasterCall::Draw(mesh) => Some(*mesh),
                _ => None,
            })
            .collect()
    }
}

impl Rasterizer for RecordingRasterizer {
    fn begin_frame(&mut self, time: f64) {
        self.calls.push(RasterCall::BeginFrame(time));
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.calls.push(RasterCall::Viewport(rect));
    }

    fn set_scissor(&mut self, rect: Rect) {
        self.calls.push(RasterCall::Scissor(rect));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.calls.push(RasterCall::Clear(flags));
    }

    fn set_matrix(&mut self, view: &Mat4, projection: &Mat4, camera_position: Vec3, _camera_scale: Vec3) {
        self.calls.push(RasterCall::SetMatrix {
            view: *view,
            projection: *projection,
            camera_position,
        });
    }

    fn bind_shading_state(&mut self, state: &ShadingState<'_>) {
        self.calls.push(RasterCall::BindShading {
            material: state.material,
            uniform_bytes: state.uniforms.len(),
            textures: state.textures.to_vec(),
        });
    }

    fn set_alpha_blend(&mut self, blend: BlendMode) {
        self.calls.push(RasterCall::AlphaBlend(blend));
    }

    fn deactivate_textures(&mut self) {
        self.calls.push(RasterCall::DeactivateTextures);
    }

    fn draw(&mut self, batch: &DrawBatch) {
        self.calls.push(RasterCall::Draw(batch.mesh));
    }
}

/// Canvas that counts framebuffer switches and serves a solid colour
#[derive(Debug)]
pub(crate) struct TestCanvas {
    width: u32,
    height: u32,
    pub(crate) fill: [u8; 4],
    pub(crate) fail_reads: bool,
    pub(crate) offscreen_binds: usize,
    pub(crate) restores: usize,
    pub(crate) end_frames: usize,
    pub(crate) reads: Vec<Rect>,
}

impl TestCanvas {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fill: [10, 20, 30, 0],
            fail_reads: false,
            offscreen_binds: 0,
            restores: 0,
            end_frames: 0,
            reads: Vec::new(),
        }
    }
}

impl Canvas for TestCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn bind_offscreen(&mut self) {
        self.offscreen_binds += 1;
    }

    fn restore_framebuffer(&mut self) {
        self.restores += 1;
    }

    fn read_pixels(&mut self, rect: Rect) -> Option<Vec<u8>> {
        self.reads.push(rect);
        if self.fail_reads {
            return None;
        }
        Some(self.fill.repeat(rect.area()))
    }

    fn end_frame(&mut self) {
        self.end_frames += 1;
    }
}
