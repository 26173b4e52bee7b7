//! Scoped ownership of one bounding-volume user

use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::cell::RefCell;

use super::{BoundingVolumeManager, SharedVolumeManager, VolumeHandle};

/// One counted use of a bounding volume
///
/// Acquiring adds a user; dropping the guard removes it again, so every
/// `add_user` is paired with exactly one `remove_user`. The guard holds the
/// manager weakly: if the manager is gone there is nothing left to release.
#[derive(Debug)]
pub struct VolumeUser {
    manager: Weak<RefCell<BoundingVolumeManager>>,
    handle: VolumeHandle,
}

impl VolumeUser {
    /// Count a new user of `handle`
    pub fn acquire(manager: &SharedVolumeManager, handle: VolumeHandle) -> Self {
        manager.borrow_mut().add_user(handle);
        Self {
            manager: Rc::downgrade(manager),
            handle,
        }
    }

    /// Replicate the volume and acquire the detached copy
    ///
    /// Used when an object instance is duplicated and needs a box that can
    /// diverge from the original.
    pub fn acquire_replica(&self) -> Option<Self> {
        let manager = self.manager.upgrade()?;
        let replica = manager.borrow_mut().replicate(self.handle);
        Some(Self::acquire(&manager, replica))
    }

    /// Count another user of the same volume
    pub fn share(&self) -> Option<Self> {
        let manager = self.manager.upgrade()?;
        Some(Self::acquire(&manager, self.handle))
    }

    /// The guarded volume
    pub fn handle(&self) -> VolumeHandle {
        self.handle
    }

    /// The manager this guard releases into, if still alive
    pub fn manager(&self) -> Option<SharedVolumeManager> {
        self.manager.upgrade()
    }

    /// Point the guard at the manager that absorbed its volume
    ///
    /// The user count moved with the volume, so nothing is added or removed.
    pub fn rebind(&mut self, manager: &SharedVolumeManager, remap: &HashMap<VolumeHandle, VolumeHandle>) {
        if let Some(new) = remap.get(&self.handle) {
            self.handle = *new;
            self.manager = Rc::downgrade(manager);
        }
    }
}

impl Drop for VolumeUser {
    fn drop(&mut self) {
        let Some(manager) = self.manager.upgrade() else {
            return;
        };
        let Ok(mut manager) = manager.try_borrow_mut() else {
            log::warn!("Bounding volume manager busy, user of {:?} leaked", self.handle);
            return;
        };
        if manager.contains(self.handle) {
            manager.remove_user(self.handle);
        }
    }
}
