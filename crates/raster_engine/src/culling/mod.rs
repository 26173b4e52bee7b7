//! Visibility culling
//!
//! Each renderable instance owns a [`CullingNode`] that pairs its shared
//! bounding volume with a frame-local `culled` flag. A scene traversal tests
//! every node against the camera [`Frustum`] and collects the survivors into
//! a [`CullingNodeList`].

mod frustum;
mod node;

pub use frustum::{Frustum, Plane};
pub use node::{CullingNode, CullingNodeList};
