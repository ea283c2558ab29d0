//! Capability backend on top of nokhwa.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use camdir_core::{
    Backend, BackendError, Capability, CapabilityMap, DeviceDescriptor, PixelFormat, Rotation,
};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use tracing::{debug, info, warn};

use super::{VideoError, VideoResult, ERR_FORMATS_FAILED, ERR_OPEN_FAILED, ERR_QUERY_FAILED};

/// Enumerates cameras and their capture modes through nokhwa.
///
/// Device ids are the platform camera index rendered as a string, the same
/// ids the Linux `/dev/videoN` scan produces.
pub struct NokhwaBackend {
    api: ApiBackend,
    orientations: HashMap<String, Rotation>,
}

impl NokhwaBackend {
    pub fn new() -> Self {
        #[cfg(target_os = "linux")]
        let api = ApiBackend::Video4Linux;
        #[cfg(not(target_os = "linux"))]
        let api = ApiBackend::Auto;

        Self {
            api,
            orientations: HashMap::new(),
        }
    }

    /// Mounting orientations for devices whose driver does not report one,
    /// in clockwise degrees keyed by device id.
    pub fn with_orientations<'a>(
        mut self,
        orientations: impl IntoIterator<Item = (&'a String, &'a u32)>,
    ) -> VideoResult<Self> {
        for (device, degrees) in orientations {
            let rotation = Rotation::from_degrees(*degrees).ok_or_else(|| VideoError::InvalidOrientation {
                device: device.clone(),
                degrees: *degrees,
            })?;
            self.orientations.insert(device.clone(), rotation);
        }
        Ok(self)
    }

    fn query(&self) -> Result<Vec<nokhwa::utils::CameraInfo>, BackendError> {
        match nokhwa::query(self.api) {
            Ok(cameras) => Ok(cameras),
            Err(e) if self.api != ApiBackend::Auto => {
                warn!("CAMERA: Failed to query with {:?} backend: {}, trying Auto", self.api, e);
                nokhwa::query(ApiBackend::Auto)
                    .map_err(|e| BackendError::enumeration(ERR_QUERY_FAILED, e.to_string()))
            }
            Err(e) => Err(BackendError::enumeration(ERR_QUERY_FAILED, e.to_string())),
        }
    }

    fn resolve(&self, device_id: &str) -> Result<CameraIndex, BackendError> {
        let known = self.devices()?;
        if !known.iter().any(|d| d.id == device_id) {
            return Err(BackendError::DeviceNotFound(device_id.to_string()));
        }
        Ok(match device_id.parse::<u32>() {
            Ok(index) => CameraIndex::Index(index),
            Err(_) => CameraIndex::String(device_id.to_string()),
        })
    }

    #[cfg(target_os = "linux")]
    fn scan_v4l2() -> Vec<DeviceDescriptor> {
        let mut devices = Vec::new();
        for i in 0..super::MAX_V4L2_DEVICES {
            let path = std::path::PathBuf::from(format!("/dev/video{i}"));
            if !path.exists() {
                continue;
            }
            match super::v4l2::query(&path) {
                Some(identity) if !identity.can_capture => {
                    debug!("CAMERA: Skipping {} ({}): not a capture node", path.display(), identity.card);
                }
                Some(identity) => devices.push(DeviceDescriptor {
                    id: i.to_string(),
                    name: identity.card,
                    driver: Some(identity.driver),
                }),
                None => devices.push(DeviceDescriptor {
                    id: i.to_string(),
                    name: format!("Camera {i}"),
                    driver: None,
                }),
            }
        }
        devices
    }
}

impl Default for NokhwaBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn index_id(index: &CameraIndex) -> String {
    match index {
        CameraIndex::Index(i) => i.to_string(),
        CameraIndex::String(s) => s.clone(),
    }
}

/// Map a nokhwa frame format onto the directory's pixel formats.
pub fn pixel_format(format: FrameFormat) -> PixelFormat {
    match format {
        FrameFormat::MJPEG => PixelFormat::Mjpeg,
        FrameFormat::YUYV => PixelFormat::Yuy2,
        FrameFormat::NV12 => PixelFormat::Nv12,
        FrameFormat::GRAY => PixelFormat::Gray8,
        FrameFormat::RAWRGB => PixelFormat::Rgb24,
        #[allow(unreachable_patterns)]
        _ => PixelFormat::Unknown,
    }
}

/// Convert reported formats into capabilities, largest and fastest first.
///
/// nokhwa collects modes through hash maps, so the raw order is not stable
/// between calls; sorting gives the snapshot a reproducible order.
pub fn capabilities_from_formats(formats: &[CameraFormat], rotation: Rotation) -> Vec<Capability> {
    let mut capabilities: Vec<Capability> = formats
        .iter()
        .map(|fmt| {
            let resolution = fmt.resolution();
            Capability::new(
                resolution.width(),
                resolution.height(),
                fmt.frame_rate(),
                pixel_format(fmt.format()),
            )
            .with_rotation(rotation)
        })
        .collect();
    let mut seen = HashSet::new();
    capabilities.retain(|c| seen.insert(*c));
    capabilities.sort_by_key(|c| (Reverse(c.area()), Reverse(c.max_fps)));
    capabilities
}

impl Backend for NokhwaBackend {
    fn init(&self) -> Result<(), BackendError> {
        match nokhwa::native_api_backend() {
            Some(native) => {
                info!("CAMERA: Native backend {:?}, using {:?}", native, self.api);
                Ok(())
            }
            None => Err(BackendError::Unavailable(VideoError::NoNativeApi.to_string())),
        }
    }

    fn build_capability_map(&self, device_id: &str) -> Result<CapabilityMap, BackendError> {
        let index = self.resolve(device_id)?;
        info!("CAMERA: Enumerating capture modes for device {}", device_id);

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
        let mut camera = Camera::new(index, requested)
            .map_err(|e| BackendError::enumeration(ERR_OPEN_FAILED, format!("Failed to open camera: {e}")))?;

        let formats = camera.compatible_camera_formats().map_err(|e| {
            BackendError::enumeration(ERR_FORMATS_FAILED, format!("Failed to list formats: {e}"))
        })?;

        let orientation = self.orientations.get(device_id).copied().unwrap_or_default();
        let capabilities = capabilities_from_formats(&formats, orientation);
        debug!("CAMERA: Device {} reports {} modes", device_id, capabilities.len());

        Ok(CapabilityMap {
            capabilities,
            orientation,
        })
    }

    fn devices(&self) -> Result<Vec<DeviceDescriptor>, BackendError> {
        // On Linux the /dev scan is more reliable than nokhwa's query
        #[cfg(target_os = "linux")]
        {
            let devices = Self::scan_v4l2();
            if !devices.is_empty() {
                debug!("CAMERA: Found {} devices via /dev scan", devices.len());
                return Ok(devices);
            }
            debug!("CAMERA: No /dev/video* capture nodes, trying nokhwa query");
        }

        let cameras = self.query()?;
        Ok(cameras
            .iter()
            .map(|info| DeviceDescriptor {
                id: index_id(info.index()),
                name: info.human_name(),
                driver: None,
            })
            .collect())
    }

    /// Called by `camdir watch` before every scan. Hotplug is not tracked,
    /// so any cached device may have changed.
    fn refresh(&self) -> Result<bool, BackendError> {
        Ok(true)
    }
}
