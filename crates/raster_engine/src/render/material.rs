//! Material identity and shading-group state
//!
//! A material is the bucket key. Its GPU state (uniform block, textures,
//! blend mode) is bound once per bucket through [`Material::activate`].

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use super::Rasterizer;

/// Stable material identity, usable as a map key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Opaque texture binding handed to the rasterizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

bitflags! {
    /// Rasterizer modes derived from material settings
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaterialFlags: u32 {
        /// Alpha blended, drawn after solid geometry
        const ALPHA = 1 << 0;
        /// No back-face culling
        const TWO_SIDED = 1 << 2;
        /// Draw as wireframe
        const WIRE = 1 << 3;
        /// Lit by every light of the scene
        const MULTI_LIGHT = 1 << 4;
        /// Rendered into shadow maps
        const CAST_SHADOW = 1 << 5;
    }
}

/// Framebuffer blend equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// No blending
    #[default]
    Opaque,
    /// Additive
    Add,
    /// Multiplicative
    Multiply,
    /// Classic alpha blend
    Blend,
}

impl BlendMode {
    /// True for every mode that needs the alpha pass
    pub fn is_alpha(self) -> bool {
        !matches!(self, Self::Opaque)
    }
}

/// Material uniform block, uploaded once per bucket
///
/// Layout must match the shader's material uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// Base color (RGB + alpha)
    pub base_color: [f32; 4],
    /// Specular color (RGB + intensity)
    pub specular: [f32; 4],
    /// Hardness, emit, ambient, z-offset
    pub params: [f32; 4],
}

impl Default for MaterialUniforms {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            specular: [1.0, 1.0, 1.0, 0.5],
            params: [50.0, 0.0, 1.0, 0.0],
        }
    }
}

/// Everything the rasterizer needs to bind one shading group
#[derive(Debug, Clone, Copy)]
pub struct ShadingState<'a> {
    /// Material being bound
    pub material: MaterialId,
    /// Raw uniform block bytes
    pub uniforms: &'a [u8],
    /// Textures in binding order
    pub textures: &'a [TextureHandle],
    /// Blend equation
    pub blend: BlendMode,
    /// Rasterizer modes
    pub flags: MaterialFlags,
    /// Polygon depth offset
    pub z_offset: f32,
}

/// Material resource seen by buckets
pub trait Material {
    /// Stable identity, one bucket per id
    fn id(&self) -> MaterialId;

    /// Display name
    fn name(&self) -> &str;

    /// Rasterizer modes
    fn flags(&self) -> MaterialFlags;

    /// True when batches of this material go through the alpha pass
    fn is_alpha(&self) -> bool {
        self.flags().contains(MaterialFlags::ALPHA)
    }

    /// One-time setup when the material first gets a bucket
    fn on_construction(&self) {}

    /// Bind GPU state for every batch that follows
    fn activate(&self, rasterizer: &mut dyn Rasterizer);

    /// Undo per-bucket state after the bucket was drawn
    fn end_frame(&self, rasterizer: &mut dyn Rasterizer) {
        rasterizer.set_alpha_blend(BlendMode::Opaque);
        rasterizer.deactivate_textures();
    }
}

/// Shared material reference held by buckets and mesh slots
pub type MaterialRef = Rc<dyn Material>;

/// Standard node-less material
#[derive(Debug)]
pub struct ShadingMaterial {
    id: MaterialId,
    name: String,
    blend: BlendMode,
    back_face_culling: bool,
    wire: bool,
    shadeless: bool,
    cast_shadow: bool,
    z_offset: f32,
    textures: Vec<TextureHandle>,
    uniforms: MaterialUniforms,
    constructed: Cell<bool>,
}

impl ShadingMaterial {
    /// Opaque, back-face culled, lit material
    pub fn new(id: MaterialId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            blend: BlendMode::Opaque,
            back_face_culling: true,
            wire: false,
            shadeless: false,
            cast_shadow: true,
            z_offset: 0.0,
            textures: Vec::new(),
            uniforms: MaterialUniforms::default(),
            constructed: Cell::new(false),
        }
    }

    /// Set blend mode; every non-opaque mode forces the alpha pass
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Enable or disable back-face culling
    pub fn with_back_face_culling(mut self, enabled: bool) -> Self {
        self.back_face_culling = enabled;
        self
    }

    /// Draw as wireframe
    pub fn with_wire(mut self, wire: bool) -> Self {
        self.wire = wire;
        self
    }

    /// Ignore scene lights
    pub fn with_shadeless(mut self, shadeless: bool) -> Self {
        self.shadeless = shadeless;
        self
    }

    /// Render into shadow maps
    pub fn with_cast_shadow(mut self, cast: bool) -> Self {
        self.cast_shadow = cast;
        self
    }

    /// Polygon depth offset
    pub fn with_z_offset(mut self, z_offset: f32) -> Self {
        self.z_offset = z_offset;
        self.uniforms.params[3] = z_offset;
        self
    }

    /// Base color and alpha
    pub fn with_base_color(mut self, rgba: [f32; 4]) -> Self {
        self.uniforms.base_color = rgba;
        self
    }

    /// Append a texture binding
    pub fn with_texture(mut self, texture: TextureHandle) -> Self {
        self.textures.push(texture);
        self
    }

    /// Wrap into a shared reference
    pub fn into_ref(self) -> MaterialRef {
        Rc::new(self)
    }

    /// Blend mode
    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    /// Uniform block
    pub fn uniforms(&self) -> &MaterialUniforms {
        &self.uniforms
    }

    /// True once `on_construction` ran
    pub fn is_constructed(&self) -> bool {
        self.constructed.get()
    }
}

impl Material for ShadingMaterial {
    fn id(&self) -> MaterialId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn flags(&self) -> MaterialFlags {
        let mut flags = MaterialFlags::empty();
        flags.set(MaterialFlags::TWO_SIDED, !self.back_face_culling);
        flags.set(MaterialFlags::WIRE, self.wire);
        flags.set(MaterialFlags::ALPHA, self.blend.is_alpha());
        flags.set(MaterialFlags::MULTI_LIGHT, !self.shadeless);
        flags.set(MaterialFlags::CAST_SHADOW, self.cast_shadow);
        flags
    }

    fn on_construction(&self) {
        // materials are shared between objects
        if self.constructed.replace(true) {
            return;
        }
        log::debug!(
            "Constructed material '{}' ({:?}) with {} textures",
            self.name,
            self.id,
            self.textures.len()
        );
    }

    fn activate(&self, rasterizer: &mut dyn Rasterizer) {
        rasterizer.set_alpha_blend(self.blend);
        rasterizer.bind_shading_state(&ShadingState {
            material: self.id,
            uniforms: bytemuck::bytes_of(&self.uniforms),
            textures: &self.textures,
            blend: self.blend,
            flags: self.flags(),
            z_offset: self.z_offset,
        });
    }
}

impl fmt::Debug for dyn Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}
