//! Camera backend for the capability directory.
//!
//! This module provides:
//! - Device enumeration (V4L2 scan on Linux, nokhwa elsewhere)
//! - Capture mode discovery via nokhwa
//! - Mapping of nokhwa frame formats onto directory pixel formats

pub mod backend;
#[cfg(target_os = "linux")]
pub mod v4l2;

pub use backend::NokhwaBackend;

/// Highest `/dev/videoN` index probed on Linux
#[cfg(target_os = "linux")]
pub const MAX_V4L2_DEVICES: u32 = 64;

/// Platform error codes carried in enumeration failures
pub const ERR_QUERY_FAILED: i32 = 1;
pub const ERR_OPEN_FAILED: i32 = 2;
pub const ERR_FORMATS_FAILED: i32 = 3;

/// Video error type
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("No native camera API on this platform")]
    NoNativeApi,

    #[error("Invalid orientation for {device}: {degrees} degrees")]
    InvalidOrientation { device: String, degrees: u32 },
}

pub type VideoResult<T> = Result<T, VideoError>;
