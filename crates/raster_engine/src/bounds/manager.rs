//! Registry of every bounding volume in a render context

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use super::BoundingVolume;

new_key_type! {
    /// Stable handle to a volume inside a [`BoundingVolumeManager`]
    ///
    /// Handles are weak: holding one does not keep the volume alive or
    /// count as a user.
    pub struct VolumeHandle;
}

/// Manager shared between a scene and the volume guards of its objects
pub type SharedVolumeManager = Rc<RefCell<BoundingVolumeManager>>;

/// Arena of bounding volumes plus the list of active ones
///
/// A volume is in the active list exactly while its user count is
/// positive. The update pass only visits active volumes.
#[derive(Debug, Default)]
pub struct BoundingVolumeManager {
    volumes: SlotMap<VolumeHandle, BoundingVolume>,
    /// Registration order of every volume
    registry: Vec<VolumeHandle>,
    /// Volumes with at least one user, in activation order
    active: Vec<VolumeHandle>,
}

impl BoundingVolumeManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty manager ready to be shared with volume guards
    pub fn new_shared() -> SharedVolumeManager {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Take ownership of a volume and append it to the registry
    pub fn register(&mut self, volume: BoundingVolume) -> VolumeHandle {
        let handle = self.volumes.insert(volume);
        self.registry.push(handle);
        log::trace!("Registered bounding volume {:?}", handle);
        handle
    }

    /// Count one more user; the volume becomes active on the 0 → 1 transition
    pub fn add_user(&mut self, handle: VolumeHandle) {
        let users = self.volume_mut(handle).increment_users();
        if users == 1 {
            self.active.push(handle);
        }
    }

    /// Count one user less; the volume leaves the active set on the 1 → 0 transition
    ///
    /// # Panics
    /// When the volume has no users left (double release).
    pub fn remove_user(&mut self, handle: VolumeHandle) {
        let users = self.volume_mut(handle).decrement_users();
        if users == 0 {
            if let Some(index) = self.active.iter().position(|h| *h == handle) {
                self.active.remove(index);
            }
        }
    }

    /// Register a detached copy of a volume
    ///
    /// The copy keeps box, modified flag and update strategy but starts with
    /// zero users, so it is not active until someone acquires it.
    pub fn replicate(&mut self, handle: VolumeHandle) -> VolumeHandle {
        let replica = self.volume(handle).replica();
        self.register(replica)
    }

    /// Run the update strategy of every active volume
    ///
    /// Shape-derived volumes only recompute when `force` is set.
    pub fn update(&mut self, force: bool) {
        for handle in &self.active {
            if let Some(volume) = self.volumes.get_mut(*handle) {
                volume.update(force);
            }
        }
    }

    /// Remove a volume nobody uses anymore
    ///
    /// # Panics
    /// When the volume still has users.
    pub fn destroy(&mut self, handle: VolumeHandle) -> BoundingVolume {
        let users = self.volume(handle).users();
        assert_eq!(users, 0, "cannot destroy a bounding volume with {users} users");
        self.registry.retain(|h| *h != handle);
        self.volumes
            .remove(handle)
            .unwrap_or_else(|| panic!("unknown bounding volume handle {handle:?}"))
    }

    /// Move every volume of `other` into this manager
    ///
    /// User counts and the active state travel with the volumes; `other` is
    /// left empty. Returns the handle remapping so callers can rebind their
    /// guards.
    pub fn merge(&mut self, other: &mut BoundingVolumeManager) -> HashMap<VolumeHandle, VolumeHandle> {
        let mut remap = HashMap::with_capacity(other.registry.len());
        for old in other.registry.drain(..) {
            if let Some(volume) = other.volumes.remove(old) {
                let new = self.volumes.insert(volume);
                self.registry.push(new);
                remap.insert(old, new);
            }
        }
        for old in other.active.drain(..) {
            if let Some(new) = remap.get(&old) {
                self.active.push(*new);
            }
        }
        log::debug!("Merged {} bounding volumes", remap.len());
        remap
    }

    /// Borrow a volume, `None` for stale handles
    pub fn get(&self, handle: VolumeHandle) -> Option<&BoundingVolume> {
        self.volumes.get(handle)
    }

    /// Mutably borrow a volume, `None` for stale handles
    pub fn get_mut(&mut self, handle: VolumeHandle) -> Option<&mut BoundingVolume> {
        self.volumes.get_mut(handle)
    }

    /// Borrow a volume
    ///
    /// # Panics
    /// On a handle that does not belong to this manager.
    pub fn volume(&self, handle: VolumeHandle) -> &BoundingVolume {
        self.volumes
            .get(handle)
            .unwrap_or_else(|| panic!("unknown bounding volume handle {handle:?}"))
    }

    /// Mutably borrow a volume
    ///
    /// # Panics
    /// On a handle that does not belong to this manager.
    pub fn volume_mut(&mut self, handle: VolumeHandle) -> &mut BoundingVolume {
        self.volumes
            .get_mut(handle)
            .unwrap_or_else(|| panic!("unknown bounding volume handle {handle:?}"))
    }

    /// True while the handle refers to a volume of this manager
    pub fn contains(&self, handle: VolumeHandle) -> bool {
        self.volumes.contains_key(handle)
    }

    /// True while the volume has at least one user
    pub fn is_active(&self, handle: VolumeHandle) -> bool {
        self.active.contains(&handle)
    }

    /// Every registered volume in registration order
    pub fn registered(&self) -> &[VolumeHandle] {
        &self.registry
    }

    /// Active volumes in activation order
    pub fn active(&self) -> &[VolumeHandle] {
        &self.active
    }

    /// Number of registered volumes
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// True when no volume is registered
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

impl Drop for BoundingVolumeManager {
    fn drop(&mut self) {
        log::debug!(
            "BoundingVolumeManager dropping with {} volumes ({} active)",
            self.volumes.len(),
            self.active.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{ShapeKind, Aabb};
    use crate::foundation::math::Vec3;
    use crate::test_support::FixedShape;

    #[test]
    fn test_register_appends_without_activating() {
        let mut manager = BoundingVolumeManager::new();
        let a = manager.register(BoundingVolume::new_static());
        let b = manager.register(BoundingVolume::new_static());

        assert_eq!(manager.registered(), &[a, b]);
        assert!(manager.active().is_empty());
    }

    #[test]
    fn test_active_iff_net_positive_users() {
        let mut manager = BoundingVolumeManager::new();
        let handle = manager.register(BoundingVolume::new_static());

        // (add?, expected active after the call)
        let script = [
            (true, true),
            (true, true),
            (false, true),
            (true, true),
            (false, true),
            (false, false),
            (true, true),
            (false, false),
        ];

        let mut net = 0i32;
        for (add, expected) in script {
            if add {
                manager.add_user(handle);
                net += 1;
            } else {
                manager.remove_user(handle);
                net -= 1;
            }
            assert_eq!(manager.is_active(handle), expected);
            assert_eq!(manager.is_active(handle), net > 0);
            assert_eq!(manager.volume(handle).users(), net as u32);
            // never listed twice
            assert!(manager.active().iter().filter(|h| **h == handle).count() <= 1);
        }
    }

    #[test]
    fn test_remove_user_keeps_other_active_volumes_in_order() {
        let mut manager = BoundingVolumeManager::new();
        let a = manager.register(BoundingVolume::new_static());
        let b = manager.register(BoundingVolume::new_static());
        let c = manager.register(BoundingVolume::new_static());
        manager.add_user(a);
        manager.add_user(b);
        manager.add_user(c);

        manager.remove_user(b);
        assert_eq!(manager.active(), &[a, c]);
    }

    #[test]
    #[should_panic(expected = "released more times")]
    fn test_remove_user_with_zero_users_panics() {
        let mut manager = BoundingVolumeManager::new();
        let handle = manager.register(BoundingVolume::new_static());
        manager.remove_user(handle);
    }

    #[test]
    fn test_replicate_is_detached_copy() {
        let mut manager = BoundingVolumeManager::new();
        let original = manager.register(BoundingVolume::new_static());
        manager.volume_mut(original).set_aabb(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 2.0, 3.0));
        manager.add_user(original);

        let replica = manager.replicate(original);
        assert_ne!(original, replica);
        assert_eq!(manager.volume(replica).users(), 0);
        assert!(!manager.is_active(replica));
        assert_eq!(manager.volume(replica).aabb(), manager.volume(original).aabb());
        assert_eq!(manager.registered(), &[original, replica]);

        // the copy evolves independently
        manager.volume_mut(replica).extend_aabb(Vec3::zeros(), Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(manager.volume(original).aabb().max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_update_only_visits_active_volumes() {
        let mut manager = BoundingVolumeManager::new();
        let active = manager.register(BoundingVolume::from_shape(Rc::new(FixedShape::cube(ShapeKind::Mesh, 1.0))));
        let idle = manager.register(BoundingVolume::from_shape(Rc::new(FixedShape::cube(ShapeKind::Mesh, 1.0))));
        manager.add_user(active);

        manager.update(false);
        assert!(!manager.volume(active).modified());

        manager.update(true);
        assert!(manager.volume(active).modified());
        assert!(!manager.volume(idle).modified());
        assert_eq!(manager.volume(idle).aabb(), Aabb::zero());
    }

    #[test]
    fn test_destroy_unused_volume() {
        let mut manager = BoundingVolumeManager::new();
        let handle = manager.register(BoundingVolume::new_static());
        manager.destroy(handle);
        assert!(!manager.contains(handle));
        assert!(manager.registered().is_empty());
    }

    #[test]
    #[should_panic(expected = "cannot destroy")]
    fn test_destroy_used_volume_panics() {
        let mut manager = BoundingVolumeManager::new();
        let handle = manager.register(BoundingVolume::new_static());
        manager.add_user(handle);
        manager.destroy(handle);
    }

    #[test]
    fn test_merge_moves_volumes_and_active_state() {
        let mut target = BoundingVolumeManager::new();
        let kept = target.register(BoundingVolume::new_static());
        target.add_user(kept);

        let mut source = BoundingVolumeManager::new();
        let used = source.register(BoundingVolume::new_static());
        let unused = source.register(BoundingVolume::new_static());
        source.add_user(used);

        let remap = target.merge(&mut source);
        assert!(source.is_empty());
        assert!(source.active().is_empty());
        assert_eq!(target.len(), 3);
        assert!(target.is_active(remap[&used]));
        assert!(!target.is_active(remap[&unused]));
        assert_eq!(target.volume(remap[&used]).users(), 1);
        assert_eq!(target.active().len(), 2);
    }
}
