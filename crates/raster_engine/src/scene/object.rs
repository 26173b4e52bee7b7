//! Renderable object instances

use std::rc::Rc;

use super::{MeshGeometry, ObjectId, SceneNode, SpatialNode};
use crate::bounds::{VolumeHandle, VolumeUser};
use crate::culling::CullingNode;
use crate::foundation::math::{Mat4, Transform};
use crate::render::{MaterialRef, MeshHandle};

/// One material/mesh pair of an object
#[derive(Debug, Clone)]
pub struct MeshSlot {
    /// Material the slot is drawn with
    pub material: MaterialRef,
    /// GPU geometry of the slot
    pub mesh: MeshHandle,
    /// Number of indices to draw
    pub index_count: u32,
}

/// Object instance placed in a scene
///
/// Instances of the same mesh share one bounding volume; the object keeps
/// its use counted through a [`VolumeUser`] for as long as it lives.
#[derive(Debug)]
pub struct RenderObject {
    name: String,
    node: Box<dyn SceneNode>,
    slots: Vec<MeshSlot>,
    geometry: Option<Rc<MeshGeometry>>,
    volume: Option<VolumeUser>,
    culling: CullingNode,
    use_culling: bool,
    visible: bool,
    layer: u32,
}

impl RenderObject {
    /// Start building an object
    pub fn builder(name: impl Into<String>) -> RenderObjectBuilder {
        RenderObjectBuilder::new(name)
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scene node carrying the object transform
    pub fn node(&self) -> &dyn SceneNode {
        self.node.as_ref()
    }

    /// Mutable scene node
    pub fn node_mut(&mut self) -> &mut dyn SceneNode {
        self.node.as_mut()
    }

    /// World transform of the instance
    pub fn world_transform(&self) -> Transform {
        self.node.world_transform()
    }

    /// Model matrix of the instance
    pub fn model_matrix(&self) -> Mat4 {
        self.world_transform().to_matrix()
    }

    /// Mesh slots in draw order
    pub fn slots(&self) -> &[MeshSlot] {
        &self.slots
    }

    /// Append a mesh slot
    pub fn add_slot(&mut self, slot: MeshSlot) {
        self.slots.push(slot);
    }

    /// CPU-side mesh data, if kept
    pub fn geometry(&self) -> Option<&Rc<MeshGeometry>> {
        self.geometry.as_ref()
    }

    /// Bounding volume of the instance
    pub fn volume_handle(&self) -> Option<VolumeHandle> {
        self.volume.as_ref().map(VolumeUser::handle)
    }

    /// Culling state of the last visibility pass
    pub fn culling_node(&self) -> &CullingNode {
        &self.culling
    }

    /// Whether frustum culling applies to the object
    pub fn use_culling(&self) -> bool {
        self.use_culling
    }

    /// Enable or disable frustum culling
    pub fn set_use_culling(&mut self, enabled: bool) {
        self.use_culling = enabled;
    }

    /// Whether the object is drawn at all
    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the object
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Layer bit mask
    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// Set the layer bit mask
    pub fn set_layer(&mut self, layer: u32) {
        self.layer = layer;
    }

    /// True when the object belongs to any layer of `mask` (0 matches all)
    pub fn in_layer(&self, mask: u32) -> bool {
        mask == 0 || self.layer & mask != 0
    }

    pub(crate) fn volume_user(&self) -> Option<&VolumeUser> {
        self.volume.as_ref()
    }

    pub(crate) fn volume_user_mut(&mut self) -> Option<&mut VolumeUser> {
        self.volume.as_mut()
    }

    /// Replace the counted volume use, releasing the previous one
    pub(crate) fn attach_volume(&mut self, user: Option<VolumeUser>) {
        self.culling.set_volume(user.as_ref().map(VolumeUser::handle));
        self.volume = user;
    }

    pub(crate) fn bind_id(&mut self, id: ObjectId) {
        let volume = self.culling.volume();
        self.culling = CullingNode::new(id);
        self.culling.set_volume(volume);
    }

    pub(crate) fn culling_node_mut(&mut self) -> &mut CullingNode {
        &mut self.culling
    }

    /// Copy of the instance data for duplication; the volume is attached by the scene
    pub(crate) fn instance_copy(&self) -> RenderObject {
        RenderObject {
            name: self.name.clone(),
            node: Box::new(SpatialNode::new(self.world_transform())),
            slots: self.slots.clone(),
            geometry: self.geometry.clone(),
            volume: None,
            culling: CullingNode::new(ObjectId::default()),
            use_culling: self.use_culling,
            visible: self.visible,
            layer: self.layer,
        }
    }
}

/// Builder for [`RenderObject`]
#[derive(Debug)]
pub struct RenderObjectBuilder {
    name: String,
    node: Option<Box<dyn SceneNode>>,
    slots: Vec<MeshSlot>,
    geometry: Option<Rc<MeshGeometry>>,
    use_culling: bool,
    visible: bool,
    layer: u32,
}

impl RenderObjectBuilder {
    /// Visible, culled object on layer 1 at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node: None,
            slots: Vec::new(),
            geometry: None,
            use_culling: true,
            visible: true,
            layer: 1,
        }
    }

    /// Place the object with a transform
    pub fn transform(mut self, transform: Transform) -> Self {
        self.node = Some(Box::new(SpatialNode::new(transform)));
        self
    }

    /// Use a node from the scene-graph library
    pub fn node(mut self, node: Box<dyn SceneNode>) -> Self {
        self.node = Some(node);
        self
    }

    /// Add a mesh slot
    pub fn slot(mut self, material: MaterialRef, mesh: MeshHandle, index_count: u32) -> Self {
        self.slots.push(MeshSlot {
            material,
            mesh,
            index_count,
        });
        self
    }

    /// Keep CPU-side mesh data; bounds are derived from it
    pub fn geometry(mut self, geometry: Rc<MeshGeometry>) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Enable or disable frustum culling
    pub fn culling(mut self, enabled: bool) -> Self {
        self.use_culling = enabled;
        self
    }

    /// Initial visibility
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Layer bit mask
    pub fn layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    /// Finish the object; it gets its id and volume when added to a scene
    pub fn build(self) -> RenderObject {
        RenderObject {
            name: self.name,
            node: self.node.unwrap_or_else(|| Box::new(SpatialNode::default())),
            slots: self.slots,
            geometry: self.geometry,
            volume: None,
            culling: CullingNode::new(ObjectId::default()),
            use_culling: self.use_culling,
            visible: self.visible,
            layer: self.layer,
        }
    }
}
