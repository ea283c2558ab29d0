//! Platform-independent directory of video-capture device capabilities.
//!
//! [`CapabilityDirectory`] caches the capture modes of the last queried
//! device and picks the mode closest to an application's request. Device
//! enumeration itself is delegated to a [`Backend`].

pub mod backend;
pub mod directory;
pub mod error;
pub mod matcher;
pub mod snapshot;
pub mod types;

pub use backend::Backend;
pub use directory::CapabilityDirectory;
pub use error::{BackendError, CaptureError, CaptureResult};
pub use matcher::{MatchPolicy, MatchScore, RankedCapability};
pub use snapshot::{ActiveDeviceCache, CapabilitySnapshot};
pub use types::*;
