//! Scene: renderable objects, cameras and the visibility + bucket pipeline

mod geometry;
mod node;
mod object;
#[allow(clippy::module_inception)]
mod scene;

pub use geometry::{MeshGeometry, Polygon};
pub use node::{SceneNode, SpatialNode};
pub use object::{MeshSlot, RenderObject, RenderObjectBuilder};
pub use scene::{FrameSettings, Scene};

slotmap::new_key_type! {
    /// Stable key of an object instance within its scene
    pub struct ObjectId;

    /// Stable key of a camera within its scene
    pub struct CameraId;
}
