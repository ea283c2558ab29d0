//! Platform backend hooks.
//!
//! A backend knows how to talk to the operating system's capture stack. The
//! directory only ever calls it through this trait, so one caching and
//! matching implementation serves every platform.

use crate::error::BackendError;
use crate::types::{CapabilityMap, DeviceDescriptor};

pub trait Backend: Send + Sync {
    /// One-time setup. Called once when the directory is created.
    fn init(&self) -> Result<(), BackendError>;

    /// Enumerate every capture mode of `device_id`, in the order the
    /// platform reports them.
    ///
    /// May block for as long as the driver takes to answer.
    fn build_capability_map(&self, device_id: &str) -> Result<CapabilityMap, BackendError>;

    /// List the devices currently attached.
    fn devices(&self) -> Result<Vec<DeviceDescriptor>, BackendError>;

    /// Re-scan platform state. Returns `true` when previously reported
    /// capability data may be stale.
    fn refresh(&self) -> Result<bool, BackendError> {
        Ok(false)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn init(&self) -> Result<(), BackendError> {
        (**self).init()
    }

    fn build_capability_map(&self, device_id: &str) -> Result<CapabilityMap, BackendError> {
        (**self).build_capability_map(device_id)
    }

    fn devices(&self) -> Result<Vec<DeviceDescriptor>, BackendError> {
        (**self).devices()
    }

    fn refresh(&self) -> Result<bool, BackendError> {
        (**self).refresh()
    }
}
