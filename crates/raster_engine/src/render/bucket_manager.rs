//! Material → bucket mapping for one scene

use std::cell::RefCell;
use std::rc::Rc;

use super::{BucketRef, BucketType, DrawBatch, MaterialBucket, MaterialId, MaterialRef, Rasterizer};
use crate::core::BucketConfig;
use crate::foundation::math::Mat4;

/// Draw statistics of one bucket pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Times a material's shading state was bound
    pub material_binds: usize,
    /// Draw calls issued
    pub draw_calls: usize,
}

/// Owner of every material bucket of a scene
///
/// `find_bucket` is idempotent: a material id gets at most one bucket per
/// manager. Buckets are also listed per [`BucketType`] so solid geometry can
/// be drawn before alpha-blended geometry.
#[derive(Debug, Default)]
pub struct BucketManager {
    /// Every bucket in insertion order
    buckets: Vec<BucketRef>,
    solid: Vec<BucketRef>,
    alpha: Vec<BucketRef>,
    config: BucketConfig,
}

impl BucketManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty manager with custom ordering settings
    pub fn with_config(config: BucketConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Bucket of `material`, creating it on first use
    ///
    /// Returns the bucket and whether it was created by this call.
    pub fn find_bucket(&mut self, material: &MaterialRef) -> (BucketRef, bool) {
        let id = material.id();
        if let Some(bucket) = self.buckets.iter().find(|b| b.borrow().material_id() == id) {
            return (Rc::clone(bucket), false);
        }

        let bucket = Rc::new(RefCell::new(MaterialBucket::new(Rc::clone(material))));
        self.insert(Rc::clone(&bucket));
        log::debug!("Created {:?} bucket for material '{}'", bucket.borrow().bucket_type(), material.name());
        (bucket, true)
    }

    fn insert(&mut self, bucket: BucketRef) {
        match bucket.borrow().bucket_type() {
            BucketType::Solid => self.solid.push(Rc::clone(&bucket)),
            BucketType::Alpha => self.alpha.push(Rc::clone(&bucket)),
        }
        self.buckets.push(bucket);
    }

    /// Remove every bucket of a material (scene teardown only)
    ///
    /// Returns the number of buckets removed. No render pass may hold batches
    /// of the removed buckets.
    pub fn remove_material(&mut self, material: MaterialId) -> usize {
        let before = self.buckets.len();
        let keep = |b: &BucketRef| b.borrow().material_id() != material;
        self.buckets.retain(keep);
        self.solid.retain(keep);
        self.alpha.retain(keep);
        before - self.buckets.len()
    }

    /// Absorb every bucket of `other`, keeping bucket identity
    ///
    /// Buckets are appended as they are, without re-keying by material.
    /// `other` is left empty.
    pub fn merge(&mut self, other: &mut BucketManager) {
        log::debug!("Merging {} buckets into {}", other.buckets.len(), self.buckets.len());
        self.buckets.append(&mut other.buckets);
        self.solid.append(&mut other.solid);
        self.alpha.append(&mut other.alpha);
    }

    /// Every bucket in insertion order
    pub fn buckets(&self) -> &[BucketRef] {
        &self.buckets
    }

    /// Buckets of one pass in insertion order
    pub fn buckets_of(&self, bucket_type: BucketType) -> &[BucketRef] {
        match bucket_type {
            BucketType::Solid => &self.solid,
            BucketType::Alpha => &self.alpha,
        }
    }

    /// Forget last frame's batches, keeping the buckets
    pub fn clear_batches(&mut self) {
        for bucket in &self.buckets {
            bucket.borrow_mut().clear_batches();
        }
    }

    /// Draw all populated buckets
    ///
    /// Solid buckets are drawn first, state bound once per bucket. Alpha
    /// batches follow back-to-front in view space (when enabled), rebinding
    /// state only when the material changes between consecutive batches.
    pub fn render(&self, rasterizer: &mut dyn Rasterizer, view: &Mat4) -> RenderStats {
        let mut stats = RenderStats::default();

        for bucket in &self.solid {
            let drawn = bucket.borrow().render(rasterizer);
            if drawn > 0 {
                stats.material_binds += 1;
                stats.draw_calls += drawn;
            }
        }

        if self.config.sort_alpha_back_to_front {
            self.render_sorted_alpha(rasterizer, view, &mut stats);
        } else {
            for bucket in &self.alpha {
                let drawn = bucket.borrow().render(rasterizer);
                if drawn > 0 {
                    stats.material_binds += 1;
                    stats.draw_calls += drawn;
                }
            }
        }

        log::trace!(
            "Bucket pass: {} binds, {} draws",
            stats.material_binds,
            stats.draw_calls
        );
        stats
    }

    fn render_sorted_alpha(&self, rasterizer: &mut dyn Rasterizer, view: &Mat4, stats: &mut RenderStats) {
        let buckets: Vec<_> = self.alpha.iter().map(|b| b.borrow()).collect();

        let mut order: Vec<(f32, usize, &DrawBatch)> = Vec::new();
        for (index, bucket) in buckets.iter().enumerate() {
            for batch in bucket.batches() {
                order.push((batch.view_depth(view), index, batch));
            }
        }
        // farthest (most negative z) first; stable for equal depths
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut bound: Option<usize> = None;
        for (_, index, batch) in order {
            if bound != Some(index) {
                if let Some(previous) = bound {
                    buckets[previous].material().end_frame(rasterizer);
                }
                buckets[index].material().activate(rasterizer);
                stats.material_binds += 1;
                bound = Some(index);
            }
            rasterizer.draw(batch);
            stats.draw_calls += 1;
        }
        if let Some(last) = bound {
            buckets[last].material().end_frame(rasterizer);
        }
    }
}
