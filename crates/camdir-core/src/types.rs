//! Capture capability value types.

use serde::{Deserialize, Serialize};

/// Raw pixel layout a device can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Unspecified. In a request this means "any format".
    #[default]
    Unknown,
    I420,
    Iyuv,
    Rgb24,
    Bgr24,
    Argb,
    Bgra,
    Rgb565,
    Yuy2,
    Yv12,
    Uyvy,
    Nv12,
    Mjpeg,
    Gray8,
}

impl PixelFormat {
    /// Parse a format name as printed by `Display` (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let format = match name.to_ascii_lowercase().as_str() {
            "unknown" | "any" => Self::Unknown,
            "i420" => Self::I420,
            "iyuv" => Self::Iyuv,
            "rgb24" => Self::Rgb24,
            "bgr24" => Self::Bgr24,
            "argb" => Self::Argb,
            "bgra" => Self::Bgra,
            "rgb565" => Self::Rgb565,
            "yuy2" | "yuyv" => Self::Yuy2,
            "yv12" => Self::Yv12,
            "uyvy" => Self::Uyvy,
            "nv12" => Self::Nv12,
            "mjpeg" | "mjpg" => Self::Mjpeg,
            "gray8" | "gray" => Self::Gray8,
            _ => return None,
        };
        Some(format)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PixelFormat::Unknown)
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::I420 => "i420",
            Self::Iyuv => "iyuv",
            Self::Rgb24 => "rgb24",
            Self::Bgr24 => "bgr24",
            Self::Argb => "argb",
            Self::Bgra => "bgra",
            Self::Rgb565 => "rgb565",
            Self::Yuy2 => "yuy2",
            Self::Yv12 => "yv12",
            Self::Uyvy => "uyvy",
            Self::Nv12 => "nv12",
            Self::Mjpeg => "mjpeg",
            Self::Gray8 => "gray8",
        };
        f.write_str(name)
    }
}

/// Clockwise rotation to apply to captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Rotation {
    #[default]
    #[serde(rename = "0")]
    Deg0,
    #[serde(rename = "90")]
    Deg90,
    #[serde(rename = "180")]
    Deg180,
    #[serde(rename = "270")]
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Convert from degrees. Only multiples of 90 are valid; values wrap at 360.
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }
}

/// One capture mode supported by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    pub width: u32,
    pub height: u32,
    /// Maximum frames per second in this mode
    pub max_fps: u32,
    pub pixel_format: PixelFormat,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Capability {
    pub fn new(width: u32, height: u32, max_fps: u32, pixel_format: PixelFormat) -> Self {
        Self {
            width,
            height,
            max_fps,
            pixel_format,
            rotation: Rotation::Deg0,
        }
    }

    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// Pixel area, widened so 32-bit dimensions cannot overflow.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}@{} {}",
            self.width, self.height, self.max_fps, self.pixel_format
        )
    }
}

/// Everything a backend reports for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityMap {
    /// Capabilities in the backend's enumeration order
    pub capabilities: Vec<Capability>,
    /// Device-level mounting orientation
    pub orientation: Rotation,
}

impl CapabilityMap {
    pub fn new(capabilities: Vec<Capability>) -> Self {
        Self {
            capabilities,
            orientation: Rotation::Deg0,
        }
    }
}

/// A device as listed by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
}
