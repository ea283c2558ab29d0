//! Device listing, capability tables and orientation.

use std::thread;
use std::time::Duration;

use camdir_core::{Backend, Capability, CapabilityDirectory, CaptureResult, DeviceDescriptor};
use serde::Serialize;

/// One row of a capability table.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedCapability {
    pub index: usize,
    #[serde(flatten)]
    pub capability: Capability,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapabilityReport {
    pub device_id: String,
    pub orientation: u32,
    pub count: usize,
    pub capabilities: Vec<IndexedCapability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrientationReport {
    pub device_id: String,
    pub degrees: u32,
}

pub fn list_devices<B: Backend>(dir: &CapabilityDirectory<B>) -> CaptureResult<Vec<DeviceDescriptor>> {
    dir.devices()
}

pub fn capabilities<B: Backend>(dir: &CapabilityDirectory<B>, device_id: &str) -> CaptureResult<CapabilityReport> {
    let capabilities: Vec<IndexedCapability> = dir
        .capabilities(device_id)?
        .into_iter()
        .enumerate()
        .map(|(index, capability)| IndexedCapability { index, capability })
        .collect();

    Ok(CapabilityReport {
        device_id: device_id.to_string(),
        orientation: dir.orientation(device_id)?.degrees(),
        count: capabilities.len(),
        capabilities,
    })
}

pub fn orientation<B: Backend>(dir: &CapabilityDirectory<B>, device_id: &str) -> CaptureResult<OrientationReport> {
    Ok(OrientationReport {
        device_id: device_id.to_string(),
        degrees: dir.orientation(device_id)?.degrees(),
    })
}

/// Re-scan the backend before every report so hotplugged or reconfigured
/// cameras show up. `iterations` of `None` runs until `emit` fails.
pub fn watch_capabilities<B: Backend>(
    dir: &CapabilityDirectory<B>,
    device_id: &str,
    interval: Duration,
    iterations: Option<u32>,
    mut emit: impl FnMut(&CapabilityReport) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let mut done = 0u32;
    loop {
        dir.refresh()?;
        emit(&capabilities(dir, device_id)?)?;

        done += 1;
        if iterations.is_some_and(|limit| done >= limit) {
            return Ok(());
        }
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixture;
    use camdir_core::CaptureError;

    #[test]
    fn test_list_devices() {
        let devices = list_devices(&fixture::directory()).unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].name, "Fixture Cam");
    }

    #[test]
    fn test_capability_report() {
        let report = capabilities(&fixture::directory(), "0").unwrap();
        assert_eq!(report.count, 3);
        assert_eq!(report.orientation, 180);
        assert_eq!(report.capabilities[2].index, 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["capabilities"][1]["width"], 1280);
        assert_eq!(json["capabilities"][1]["pixel_format"], "mjpeg");
    }

    #[test]
    fn test_watch_rescans_each_round() {
        use std::sync::atomic::Ordering;

        let dir = fixture::directory();
        let mut reports = Vec::new();
        watch_capabilities(&dir, "0", Duration::ZERO, Some(3), |report| {
            reports.push(report.count);
            Ok(())
        })
        .unwrap();

        assert_eq!(reports, vec![3, 3, 3]);
        assert_eq!(dir.backend().refreshes.load(Ordering::SeqCst), 3);
        // Each refresh drops the cached device, so every round rebuilds
        assert_eq!(dir.backend().builds.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unknown_device() {
        let dir = fixture::directory();
        assert!(matches!(capabilities(&dir, "7"), Err(CaptureError::DeviceNotFound(_))));
        assert!(matches!(orientation(&dir, "7"), Err(CaptureError::DeviceNotFound(_))));
        assert_eq!(orientation(&dir, "0").unwrap().degrees, 180);
    }
}
