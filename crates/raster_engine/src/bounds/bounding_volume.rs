//! A single reference-counted bounding box

use std::fmt;
use std::rc::Rc;

use super::Aabb;
use crate::foundation::math::Vec3;

/// Kind of geometry a shape generator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// Polygon mesh
    Mesh,
    /// Curve or surface evaluated to a mesh
    Curve,
    /// Anything else (empties, lamps, cameras)
    Other,
}

/// Geometry owner a derived bounding box reads from
///
/// Implemented by whatever holds the raw mesh/curve data. Only mesh and
/// curve shapes contribute to a bounding box.
pub trait ShapeSource {
    /// Kind of geometry
    fn kind(&self) -> ShapeKind;

    /// The eight corners of the shape's current local bound box, if evaluated
    fn bound_box(&self) -> Option<[Vec3; 8]>;
}

/// How a volume recomputes its box during the update pass
#[derive(Clone)]
pub enum BoxUpdate {
    /// Box is pre-baked, the update pass leaves it alone
    Static,
    /// Box is recomputed from the generator's current shape on forced updates
    DerivedFromShape(Rc<dyn ShapeSource>),
}

impl fmt::Debug for BoxUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => f.write_str("Static"),
            Self::DerivedFromShape(shape) => f
                .debug_tuple("DerivedFromShape")
                .field(&shape.kind())
                .finish(),
        }
    }
}

/// Axis-aligned box shared by every instance of one mesh
///
/// Owned by a [`super::BoundingVolumeManager`]. The user count is only
/// changed through the manager's `add_user` / `remove_user`.
#[derive(Debug, Clone)]
pub struct BoundingVolume {
    aabb: Aabb,
    modified: bool,
    users: u32,
    source: BoxUpdate,
}

impl BoundingVolume {
    /// New volume with a zero box that never recomputes itself
    pub fn new_static() -> Self {
        Self::with_source(BoxUpdate::Static)
    }

    /// New volume recomputed from `shape` on forced updates
    pub fn from_shape(shape: Rc<dyn ShapeSource>) -> Self {
        Self::with_source(BoxUpdate::DerivedFromShape(shape))
    }

    /// New volume with an explicit update strategy
    pub fn with_source(source: BoxUpdate) -> Self {
        Self {
            aabb: Aabb::zero(),
            modified: false,
            users: 0,
            source,
        }
    }

    /// Copy with attributes kept and the user count reset
    pub(crate) fn replica(&self) -> Self {
        Self {
            users: 0,
            ..self.clone()
        }
    }

    /// Number of instances currently using this volume
    pub fn users(&self) -> u32 {
        self.users
    }

    /// Update strategy of this volume
    pub fn source(&self) -> &BoxUpdate {
        &self.source
    }

    /// Returns the new user count
    pub(crate) fn increment_users(&mut self) -> u32 {
        self.users += 1;
        self.users
    }

    /// Returns the new user count; panics on underflow
    pub(crate) fn decrement_users(&mut self) -> u32 {
        assert!(
            self.users > 0,
            "bounding volume released more times than it was acquired"
        );
        self.users -= 1;
        self.users
    }

    /// True when the box changed since the last `clear_modified`
    pub fn modified(&self) -> bool {
        self.modified
    }

    /// Acknowledge the last change
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }

    /// Current box
    pub fn aabb(&self) -> Aabb {
        self.aabb
    }

    /// Current box as `(min, max)`
    pub fn get_aabb(&self) -> (Vec3, Vec3) {
        (self.aabb.min, self.aabb.max)
    }

    /// Replace the box
    pub fn set_aabb(&mut self, min: Vec3, max: Vec3) {
        self.aabb = Aabb::new(min, max);
        self.modified = true;
    }

    /// Grow the box to also enclose `[min, max]`
    pub fn extend_aabb(&mut self, min: Vec3, max: Vec3) {
        self.aabb = self.aabb.union(&Aabb::new(min, max));
        self.modified = true;
    }

    /// Take the box of another volume
    pub fn copy_aabb(&mut self, other: &BoundingVolume) {
        self.aabb = other.aabb;
        self.modified = true;
    }

    /// Run the update strategy
    ///
    /// Shape-derived boxes only recompute when `force` is set and the shape
    /// is a mesh or curve with an evaluated bound box. Otherwise the box
    /// keeps its previous value.
    pub fn update(&mut self, force: bool) {
        let BoxUpdate::DerivedFromShape(shape) = &self.source else {
            return;
        };

        if !matches!(shape.kind(), ShapeKind::Mesh | ShapeKind::Curve) || !force {
            return;
        }

        let Some(corners) = shape.bound_box() else {
            return;
        };

        if let Some(aabb) = Aabb::from_points(&corners) {
            self.aabb = aabb;
            self.modified = true;
        }
    }
}
