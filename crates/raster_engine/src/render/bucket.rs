//! Draw batches grouped by material

use std::cell::RefCell;
use std::rc::Rc;

use super::{Material, MaterialId, MaterialRef, Rasterizer};
use crate::foundation::math::Mat4;
use crate::scene::ObjectId;

/// Handle to a vertex/index buffer pair owned by the GPU side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// One draw call: a mesh slot of a visible instance
#[derive(Debug, Clone)]
pub struct DrawBatch {
    /// Geometry to draw
    pub mesh: MeshHandle,
    /// Number of indices
    pub index_count: u32,
    /// Model matrix of the instance
    pub model: Mat4,
    /// Instance that produced the batch
    pub object: ObjectId,
}

impl DrawBatch {
    /// View-space depth of the batch origin (more negative is farther)
    pub fn view_depth(&self, view: &Mat4) -> f32 {
        let origin = self.model.column(3).into_owned();
        (view * origin).z
    }
}

/// Pass a bucket is drawn in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BucketType {
    /// Opaque geometry, drawn first in bucket insertion order
    Solid,
    /// Blended geometry, drawn after solids
    Alpha,
}

/// Shared bucket reference; identity is the allocation
pub type BucketRef = Rc<RefCell<MaterialBucket>>;

/// Container of every batch sharing one material
#[derive(Debug)]
pub struct MaterialBucket {
    material: MaterialRef,
    bucket_type: BucketType,
    batches: Vec<DrawBatch>,
}

impl MaterialBucket {
    /// Empty bucket for a material
    pub fn new(material: MaterialRef) -> Self {
        let bucket_type = if material.is_alpha() {
            BucketType::Alpha
        } else {
            BucketType::Solid
        };
        Self {
            material,
            bucket_type,
            batches: Vec::new(),
        }
    }

    /// Material of this bucket
    pub fn material(&self) -> &MaterialRef {
        &self.material
    }

    /// Material identity
    pub fn material_id(&self) -> MaterialId {
        self.material.id()
    }

    /// Pass this bucket belongs to
    pub fn bucket_type(&self) -> BucketType {
        self.bucket_type
    }

    /// Append a batch
    pub fn add_batch(&mut self, batch: DrawBatch) {
        self.batches.push(batch);
    }

    /// Batches in submission order
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Drop last frame's batches
    pub fn clear_batches(&mut self) {
        self.batches.clear();
    }

    /// Bind the material once and draw every batch
    ///
    /// Returns the number of draw calls.
    pub fn render(&self, rasterizer: &mut dyn Rasterizer) -> usize {
        if self.batches.is_empty() {
            return 0;
        }
        self.material.activate(rasterizer);
        for batch in &self.batches {
            rasterizer.draw(batch);
        }
        self.material.end_frame(rasterizer);
        self.batches.len()
    }
}
