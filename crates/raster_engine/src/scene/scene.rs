//! Scene container: objects, cameras, shared bounds and material buckets

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::SlotMap;

use super::{CameraId, ObjectId, RenderObject};
use crate::bounds::{
    BoundingVolume, BoundingVolumeManager, ShapeSource, SharedVolumeManager, VolumeHandle, VolumeUser,
};
use crate::core::BucketConfig;
use crate::culling::CullingNodeList;
use crate::error::{RasterError, RasterResult};
use crate::foundation::math::Mat4;
use crate::render::{BucketManager, Camera, DrawBatch, MaterialId, Rasterizer, RenderStats};

/// Output resolution of the scene's render settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    /// Horizontal resolution in pixels
    pub resolution_x: u32,
    /// Vertical resolution in pixels
    pub resolution_y: u32,
    /// Horizontal pixel aspect
    pub pixel_aspect_x: f32,
    /// Vertical pixel aspect
    pub pixel_aspect_y: f32,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            resolution_x: 1920,
            resolution_y: 1080,
            pixel_aspect_x: 1.0,
            pixel_aspect_y: 1.0,
        }
    }
}

impl FrameSettings {
    /// Output resolution with square pixels
    pub fn new(resolution_x: u32, resolution_y: u32) -> Self {
        Self {
            resolution_x,
            resolution_y,
            ..Self::default()
        }
    }

    /// Frame width over height including pixel aspect, 1 for a zero height
    pub fn aspect_ratio(&self) -> f32 {
        if self.resolution_y == 0 {
            return 1.0;
        }
        (self.resolution_x as f32 * self.pixel_aspect_x) / (self.resolution_y as f32 * self.pixel_aspect_y)
    }
}

/// Scene owning objects, cameras, the bounding-volume manager and buckets
#[derive(Debug)]
pub struct Scene {
    name: String,
    objects: SlotMap<ObjectId, RenderObject>,
    cameras: SlotMap<CameraId, Camera>,
    active_camera: Option<CameraId>,
    // declared after `objects` so volume guards release before the manager drops
    volumes: SharedVolumeManager,
    buckets: BucketManager,
    frame_settings: FrameSettings,
}

impl Scene {
    /// Empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_bucket_config(name, BucketConfig::default())
    }

    /// Empty scene with bucket drawing options
    pub fn with_bucket_config(name: impl Into<String>, config: BucketConfig) -> Self {
        let name = name.into();
        log::debug!("Created scene '{}'", name);
        Self {
            name,
            objects: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            active_camera: None,
            volumes: BoundingVolumeManager::new_shared(),
            buckets: BucketManager::with_config(config),
            frame_settings: FrameSettings::default(),
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Render resolution settings
    pub fn frame_settings(&self) -> &FrameSettings {
        &self.frame_settings
    }

    /// Replace the render resolution settings
    pub fn set_frame_settings(&mut self, settings: FrameSettings) {
        self.frame_settings = settings;
    }

    /// Shared bounding-volume manager
    pub fn volumes(&self) -> &SharedVolumeManager {
        &self.volumes
    }

    /// Material buckets
    pub fn buckets(&self) -> &BucketManager {
        &self.buckets
    }

    /// Add an object and give it a bounding volume
    ///
    /// Objects with mesh data get a shape-derived volume computed right away;
    /// others get a static volume that callers size with `set_aabb`.
    pub fn add_object(&mut self, mut object: RenderObject) -> ObjectId {
        let volume = match object.geometry() {
            Some(geometry) => BoundingVolume::from_shape(Rc::clone(geometry) as Rc<dyn ShapeSource>),
            None => BoundingVolume::new_static(),
        };
        let handle = {
            let mut volumes = self.volumes.borrow_mut();
            let handle = volumes.register(volume);
            volumes.volume_mut(handle).update(true);
            handle
        };
        object.attach_volume(Some(VolumeUser::acquire(&self.volumes, handle)));

        let id = self.objects.insert_with_key(|id| {
            object.bind_id(id);
            object
        });
        log::debug!("Added object {:?} to scene '{}'", id, self.name);
        id
    }

    /// New instance of an object sharing its bounding volume
    pub fn duplicate_object(&mut self, id: ObjectId) -> Option<ObjectId> {
        let source = self.objects.get(id)?;
        let mut copy = source.instance_copy();
        copy.attach_volume(source.volume_user().and_then(VolumeUser::share));

        Some(self.objects.insert_with_key(|new_id| {
            copy.bind_id(new_id);
            copy
        }))
    }

    /// Give an object its own copy of its bounding volume
    ///
    /// Returns `false` when the object does not exist or has no volume.
    pub fn make_bounds_unique(&mut self, id: ObjectId) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        let Some(replica) = object.volume_user().and_then(VolumeUser::acquire_replica) else {
            return false;
        };
        let previous = object.volume_handle();
        object.attach_volume(Some(replica));
        if let Some(previous) = previous {
            self.destroy_if_unused(previous);
        }
        true
    }

    /// Remove an object, releasing its volume use
    ///
    /// The volume itself is destroyed once no instance uses it anymore.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let Some(object) = self.objects.remove(id) else {
            return false;
        };
        let handle = object.volume_handle();
        drop(object);
        if let Some(handle) = handle {
            self.destroy_if_unused(handle);
        }
        log::debug!("Removed object {:?} from scene '{}'", id, self.name);
        true
    }

    fn destroy_if_unused(&mut self, handle: VolumeHandle) {
        let mut volumes = self.volumes.borrow_mut();
        if volumes.get(handle).is_some_and(|v| v.users() == 0) {
            volumes.destroy(handle);
        }
    }

    /// Object by id
    pub fn object(&self, id: ObjectId) -> Option<&RenderObject> {
        self.objects.get(id)
    }

    /// Mutable object by id
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut RenderObject> {
        self.objects.get_mut(id)
    }

    /// Every object with its id
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &RenderObject)> {
        self.objects.iter()
    }

    /// Number of objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Recompute the boxes of active volumes
    ///
    /// Shape-derived volumes only recompute when `force` is set.
    pub fn update_bounds(&mut self, force: bool) {
        self.volumes.borrow_mut().update(force);
    }

    /// Add a camera; the first one becomes active
    pub fn add_camera(&mut self, camera: Camera) -> CameraId {
        let id = self.cameras.insert(camera);
        if self.active_camera.is_none() {
            self.active_camera = Some(id);
        }
        id
    }

    /// Camera by id
    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.get(id)
    }

    /// Mutable camera by id
    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras.get_mut(id)
    }

    /// Camera the main view renders from
    pub fn active_camera(&self) -> Option<CameraId> {
        self.active_camera
    }

    /// Select the camera of the main view
    pub fn set_active_camera(&mut self, id: CameraId) -> RasterResult<()> {
        if !self.cameras.contains_key(id) {
            return Err(RasterError::CameraInvalid);
        }
        self.active_camera = Some(id);
        Ok(())
    }

    /// Cull every visible object of `layer` against a camera
    ///
    /// Returns the culling nodes of the objects that passed. Objects with
    /// culling disabled always pass; hidden objects never do.
    pub fn calculate_visible_meshes(&mut self, camera: CameraId, layer: u32) -> RasterResult<CullingNodeList> {
        let frustum = self
            .cameras
            .get(camera)
            .ok_or(RasterError::CameraInvalid)?
            .culling_frustum();
        let volumes = self.volumes.borrow();

        let mut visible = CullingNodeList::new();
        for (_, object) in self.objects.iter_mut() {
            if !object.visible() || !object.in_layer(layer) {
                object.culling_node_mut().set_culled(true);
                continue;
            }
            let transform = object.world_transform();
            let use_culling = object.use_culling();
            let node = object.culling_node_mut();
            let passed = if use_culling {
                node.test(&volumes, &transform, &frustum)
            } else {
                node.set_culled(false);
                true
            };
            if passed {
                visible.push(node.clone());
            }
        }
        log::trace!("Scene '{}': {} visible objects", self.name, visible.len());
        Ok(visible)
    }

    /// Fill the buckets from visible nodes and draw them
    ///
    /// Every batch is assigned before the first bucket is drawn.
    pub fn render_buckets(&mut self, nodes: &CullingNodeList, rasterizer: &mut dyn Rasterizer, view: &Mat4) -> RenderStats {
        self.buckets.clear_batches();
        for node in nodes {
            let Some(object) = self.objects.get(node.object()) else {
                continue;
            };
            let model = object.model_matrix();
            for slot in object.slots() {
                let (bucket, created) = self.buckets.find_bucket(&slot.material);
                if created {
                    slot.material.on_construction();
                }
                bucket.borrow_mut().add_batch(DrawBatch {
                    mesh: slot.mesh,
                    index_count: slot.index_count,
                    model,
                    object: node.object(),
                });
            }
        }
        self.buckets.render(rasterizer, view)
    }

    /// Drop the buckets of a material (scene teardown only)
    pub fn remove_material(&mut self, material: MaterialId) -> usize {
        self.buckets.remove_material(material)
    }

    /// Absorb every object, camera, volume and bucket of `other`
    ///
    /// Object and camera ids of `other` are not valid in this scene; the
    /// returned maps translate them. The active camera stays unchanged.
    pub fn merge_scene(&mut self, other: &mut Scene) -> (HashMap<ObjectId, ObjectId>, HashMap<CameraId, CameraId>) {
        let remap = self.volumes.borrow_mut().merge(&mut other.volumes.borrow_mut());

        let mut object_ids = HashMap::with_capacity(other.objects.len());
        for (old, mut object) in other.objects.drain() {
            if let Some(user) = object.volume_user_mut() {
                user.rebind(&self.volumes, &remap);
            }
            let handle = object.volume_handle();
            object.culling_node_mut().set_volume(handle);
            let new = self.objects.insert_with_key(|id| {
                object.bind_id(id);
                object
            });
            object_ids.insert(old, new);
        }

        let mut camera_ids = HashMap::with_capacity(other.cameras.len());
        for (old, camera) in other.cameras.drain() {
            camera_ids.insert(old, self.cameras.insert(camera));
        }
        other.active_camera = None;

        self.buckets.merge(&mut other.buckets);
        log::debug!(
            "Merged scene '{}' into '{}': {} objects, {} cameras",
            other.name,
            self.name,
            object_ids.len(),
            camera_ids.len()
        );
        (object_ids, camera_ids)
    }
}
