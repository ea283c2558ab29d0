use thiserror::Error;

/// Errors reported by a platform backend while enumerating devices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Enumeration failed (code {code}): {message}")]
    Enumeration { code: i32, message: String },

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl BackendError {
    /// Build an enumeration failure carrying a platform error code.
    pub fn enumeration(code: i32, message: impl Into<String>) -> Self {
        Self::Enumeration {
            code,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Capability index {index} out of range (device has {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("No capabilities reported for device: {0}")]
    NoCapabilities(String),

    #[error("Invalid capability request: {0}")]
    InvalidRequest(String),

    #[error("Failed to enumerate capabilities for {device_id}: {source}")]
    BackendEnumerationFailure {
        device_id: String,
        #[source]
        source: BackendError,
    },

    #[error("Failed to initialize backend: {0}")]
    BackendInit(#[source] BackendError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Invalid match policy: {0}")]
    InvalidPolicy(String),
}

impl CaptureError {
    /// Map a backend failure for `device_id` onto the directory's error kinds.
    pub(crate) fn from_backend(device_id: &str, err: BackendError) -> Self {
        match err {
            BackendError::DeviceNotFound(id) => Self::DeviceNotFound(id),
            source => Self::BackendEnumerationFailure {
                device_id: device_id.to_string(),
                source,
            },
        }
    }
}

pub type CaptureResult<T> = Result<T, CaptureError>;
