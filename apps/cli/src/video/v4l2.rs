//! Minimal V4L2 device identification via `VIDIOC_QUERYCAP`.

use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use tracing::debug;

const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
const V4L2_CAP_VIDEO_CAPTURE_MPLANE: u32 = 0x0000_1000;
const V4L2_CAP_DEVICE_CAPS: u32 = 0x8000_0000;

#[repr(C)]
#[allow(dead_code)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

/// What the kernel reports about a video node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct V4l2Identity {
    pub driver: String,
    pub card: String,
    /// Whether this node can capture frames (metadata nodes cannot)
    pub can_capture: bool,
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Query a `/dev/videoN` node. Returns `None` if it cannot be opened or the
/// ioctl fails.
pub fn query(path: &Path) -> Option<V4l2Identity> {
    let file = File::open(path).ok()?;
    let fd = file.as_raw_fd();

    // SAFETY: the struct is plain data and matches the kernel's layout.
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP, &mut cap) };
    if result != 0 {
        debug!("CAMERA: VIDIOC_QUERYCAP failed on {}", path.display());
        return None;
    }

    let caps = if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    };

    Some(V4l2Identity {
        driver: c_string(&cap.driver),
        card: c_string(&cap.card),
        can_capture: caps & (V4L2_CAP_VIDEO_CAPTURE | V4L2_CAP_VIDEO_CAPTURE_MPLANE) != 0,
    })
}
