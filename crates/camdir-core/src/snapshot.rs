//! Single-slot cache of the last queried device's capabilities.

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use crate::types::{Capability, CapabilityMap, Rotation};

/// Capabilities of one device, captured at one point in time.
///
/// Never mutated after construction; a refresh installs a new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySnapshot {
    device_id: String,
    capabilities: Vec<Capability>,
    orientation: Rotation,
}

impl CapabilitySnapshot {
    pub fn new(device_id: impl Into<String>, map: CapabilityMap) -> Self {
        Self {
            device_id: device_id.into(),
            capabilities: map.capabilities,
            orientation: map.orientation,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Capabilities in enumeration order.
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    pub fn orientation(&self) -> Rotation {
        self.orientation
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Capability> {
        self.capabilities.get(index)
    }
}

/// Holds at most one snapshot. Querying another device replaces it.
///
/// Readers get an `Arc` to the resident snapshot, so a later replacement
/// never changes data a reader is already looking at. A poisoned lock is
/// recovered since the slot is only ever assigned whole values.
#[derive(Debug, Default)]
pub struct ActiveDeviceCache {
    slot: RwLock<Option<Arc<CapabilitySnapshot>>>,
}

impl ActiveDeviceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the resident snapshot if it belongs to `device_id`.
    pub fn lookup(&self, device_id: &str) -> Option<Arc<CapabilitySnapshot>> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|snapshot| snapshot.device_id() == device_id)
            .cloned()
    }

    /// Id of the device currently resident, if any.
    pub fn resident_device(&self) -> Option<String> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|snapshot| snapshot.device_id().to_string())
    }

    /// Take exclusive access to the slot for a rebuild.
    ///
    /// Readers block until the returned guard is dropped.
    pub fn write(&self) -> CacheWriteGuard<'_> {
        CacheWriteGuard {
            slot: self.slot.write().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Drop whatever is resident. Returns the evicted device id.
    pub fn clear(&self) -> Option<String> {
        self.write().clear()
    }
}

/// Exclusive access to the cache slot.
pub struct CacheWriteGuard<'a> {
    slot: RwLockWriteGuard<'a, Option<Arc<CapabilitySnapshot>>>,
}

impl CacheWriteGuard<'_> {
    /// Resident snapshot for `device_id`, re-checked under the write lock.
    pub fn lookup(&self, device_id: &str) -> Option<Arc<CapabilitySnapshot>> {
        self.slot
            .as_ref()
            .filter(|snapshot| snapshot.device_id() == device_id)
            .cloned()
    }

    /// Replace the slot contents wholesale and return the new snapshot.
    pub fn install(&mut self, snapshot: CapabilitySnapshot) -> Arc<CapabilitySnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.slot = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub fn clear(&mut self) -> Option<String> {
        self.slot.take().map(|snapshot| snapshot.device_id().to_string())
    }

    pub fn resident_device(&self) -> Option<&str> {
        self.slot.as_ref().map(|snapshot| snapshot.device_id())
    }
}
