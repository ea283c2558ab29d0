//! Capability directory: the public query surface over a backend.
//!
//! Queries for the resident device are served from the cache under a shared
//! lock. Any other device id triggers a rebuild under the exclusive lock,
//! which evicts the previous device. Failed rebuilds leave the cache as it
//! was and are retried on the next query.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{CaptureError, CaptureResult};
use crate::matcher::{self, MatchPolicy, MatchScore, RankedCapability};
use crate::snapshot::{ActiveDeviceCache, CapabilitySnapshot};
use crate::types::{Capability, DeviceDescriptor, Rotation};

pub struct CapabilityDirectory<B: Backend> {
    backend: B,
    cache: ActiveDeviceCache,
    policy: MatchPolicy,
}

impl<B: Backend> CapabilityDirectory<B> {
    /// Initialize the backend and create an empty directory.
    pub fn new(backend: B, policy: MatchPolicy) -> CaptureResult<Self> {
        policy.validate()?;
        backend.init().map_err(CaptureError::BackendInit)?;
        info!("Capability directory initialized");
        Ok(Self {
            backend,
            cache: ActiveDeviceCache::new(),
            policy,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Number of capabilities reported for `device_id`.
    pub fn count(&self, device_id: &str) -> CaptureResult<usize> {
        Ok(self.snapshot(device_id)?.len())
    }

    /// Capability at `index` in the device's enumeration order.
    pub fn capability(&self, device_id: &str, index: usize) -> CaptureResult<Capability> {
        let snapshot = self.snapshot(device_id)?;
        snapshot
            .get(index)
            .copied()
            .ok_or(CaptureError::IndexOutOfRange {
                index,
                count: snapshot.len(),
            })
    }

    /// All capabilities of `device_id`, in enumeration order.
    pub fn capabilities(&self, device_id: &str) -> CaptureResult<Vec<Capability>> {
        Ok(self.snapshot(device_id)?.capabilities().to_vec())
    }

    /// The device capability closest to `requested`.
    pub fn best_match(&self, device_id: &str, requested: &Capability) -> CaptureResult<Capability> {
        self.best_match_scored(device_id, requested)
            .map(|(capability, _)| capability)
    }

    /// Like [`best_match`](Self::best_match), also returning the cost breakdown.
    pub fn best_match_scored(
        &self,
        device_id: &str,
        requested: &Capability,
    ) -> CaptureResult<(Capability, MatchScore)> {
        matcher::validate_request(requested)?;
        let snapshot = self.snapshot(device_id)?;
        if snapshot.is_empty() {
            return Err(CaptureError::NoCapabilities(device_id.to_string()));
        }

        let (index, score) = matcher::best_match(&self.policy, requested, snapshot.capabilities())?;
        let capability = snapshot.capabilities()[index];
        debug!(
            "Best match for {} on {}: #{} {} (cost {:.4})",
            requested, device_id, index, capability, score.total
        );
        Ok((capability, score))
    }

    /// Every capability of `device_id` ordered from best to worst match.
    pub fn ranked(
        &self,
        device_id: &str,
        requested: &Capability,
    ) -> CaptureResult<Vec<RankedCapability>> {
        matcher::validate_request(requested)?;
        let snapshot = self.snapshot(device_id)?;
        if snapshot.is_empty() {
            return Err(CaptureError::NoCapabilities(device_id.to_string()));
        }
        matcher::rank(&self.policy, requested, snapshot.capabilities())
    }

    /// Mounting orientation reported for the device.
    pub fn orientation(&self, device_id: &str) -> CaptureResult<Rotation> {
        Ok(self.snapshot(device_id)?.orientation())
    }

    /// Ask the backend to re-scan. Clears the cache if it reports a change.
    pub fn refresh(&self) -> CaptureResult<()> {
        let stale = self
            .backend
            .refresh()
            .map_err(CaptureError::Backend)?;
        if stale {
            if let Some(evicted) = self.cache.clear() {
                info!("Backend refreshed, dropped cached capabilities for {}", evicted);
            }
        }
        Ok(())
    }

    /// Drop the cached snapshot so the next query rebuilds.
    pub fn invalidate(&self) {
        if let Some(evicted) = self.cache.clear() {
            debug!("Invalidated cached capabilities for {}", evicted);
        }
    }

    /// Device whose capabilities are currently cached.
    pub fn resident_device(&self) -> Option<String> {
        self.cache.resident_device()
    }

    /// Devices the backend can see right now. Does not touch the cache.
    pub fn devices(&self) -> CaptureResult<Vec<DeviceDescriptor>> {
        Ok(self.backend.devices()?)
    }

    /// Snapshot for `device_id`, rebuilding it if another device (or
    /// nothing) is resident.
    pub fn snapshot(&self, device_id: &str) -> CaptureResult<Arc<CapabilitySnapshot>> {
        if device_id.is_empty() {
            return Err(CaptureError::DeviceNotFound("empty device id".into()));
        }

        if let Some(snapshot) = self.cache.lookup(device_id) {
            debug!("Capability cache hit for {}", device_id);
            return Ok(snapshot);
        }

        let mut slot = self.cache.write();
        // Another thread may have rebuilt this device while we waited.
        if let Some(snapshot) = slot.lookup(device_id) {
            return Ok(snapshot);
        }

        let map = self.backend.build_capability_map(device_id).map_err(|e| {
            warn!("Capability enumeration failed for {}: {}", device_id, e);
            CaptureError::from_backend(device_id, e)
        })?;

        match slot.resident_device() {
            Some(previous) => info!(
                "Rebuilt capabilities for {} ({} modes), evicting {}",
                device_id,
                map.capabilities.len(),
                previous
            ),
            None => info!(
                "Rebuilt capabilities for {} ({} modes)",
                device_id,
                map.capabilities.len()
            ),
        }

        Ok(slot.install(CapabilitySnapshot::new(device_id, map)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    use super::*;
    use crate::error::BackendError;
    use crate::types::{CapabilityMap, PixelFormat};

    #[derive(Default)]
    struct MockBackend {
        devices: HashMap<String, CapabilityMap>,
        builds: AtomicUsize,
        inits: AtomicUsize,
        failing: AtomicBool,
        stale: AtomicBool,
    }

    impl MockBackend {
        fn with_device(mut self, id: &str, map: CapabilityMap) -> Self {
            self.devices.insert(id.to_string(), map);
            self
        }

        fn builds(&self) -> usize {
            self.builds.load(Ordering::SeqCst)
        }
    }

    impl Backend for MockBackend {
        fn init(&self) -> Result<(), BackendError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn build_capability_map(&self, device_id: &str) -> Result<CapabilityMap, BackendError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(BackendError::enumeration(-19, "device busy"));
            }
            self.devices
                .get(device_id)
                .cloned()
                .ok_or_else(|| BackendError::DeviceNotFound(device_id.to_string()))
        }

        fn devices(&self) -> Result<Vec<DeviceDescriptor>, BackendError> {
            let mut ids: Vec<&String> = self.devices.keys().collect();
            ids.sort();
            Ok(ids
                .into_iter()
                .map(|id| DeviceDescriptor {
                    id: id.clone(),
                    name: format!("Mock {id}"),
                    driver: None,
                })
                .collect())
        }

        fn refresh(&self) -> Result<bool, BackendError> {
            Ok(self.stale.swap(false, Ordering::SeqCst))
        }
    }

    fn yuv(width: u32, height: u32, fps: u32) -> Capability {
        Capability::new(width, height, fps, PixelFormat::I420)
    }

    fn webcam() -> CapabilityMap {
        CapabilityMap::new(vec![yuv(640, 480, 30), yuv(1280, 720, 30), yuv(1920, 1080, 15)])
    }

    fn directory(backend: MockBackend) -> CapabilityDirectory<MockBackend> {
        CapabilityDirectory::new(backend, MatchPolicy::default()).unwrap()
    }

    #[test]
    fn test_init_called_once() {
        let dir = directory(MockBackend::default());
        assert_eq!(dir.backend().inits.load(Ordering::SeqCst), 1);
        assert!(dir.resident_device().is_none());
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let policy = MatchPolicy {
            format_weight: 1000.0,
            ..MatchPolicy::default()
        };
        let result = CapabilityDirectory::new(MockBackend::default(), policy);
        assert!(matches!(result, Err(CaptureError::InvalidPolicy(_))));
    }

    #[test]
    fn test_count_and_index() {
        let dir = directory(MockBackend::default().with_device("cam0", webcam()));
        assert_eq!(dir.count("cam0").unwrap(), 3);
        for i in 0..3 {
            assert_eq!(dir.capability("cam0", i).unwrap(), webcam().capabilities[i]);
        }
        let err = dir.capability("cam0", 3).unwrap_err();
        assert!(matches!(err, CaptureError::IndexOutOfRange { index: 3, count: 3 }));
    }

    #[test]
    fn test_capabilities_in_enumeration_order() {
        let dir = directory(MockBackend::default().with_device("cam0", webcam()));
        assert_eq!(dir.capabilities("cam0").unwrap(), webcam().capabilities);
        assert_eq!(dir.count("cam0").unwrap(), 3);
        assert_eq!(dir.backend().builds(), 1);
    }

    #[test]
    fn test_empty_device_counts_zero() {
        let dir = directory(MockBackend::default().with_device("cam0", CapabilityMap::default()));
        assert_eq!(dir.count("cam0").unwrap(), 0);
        assert!(matches!(
            dir.best_match("cam0", &yuv(640, 480, 30)),
            Err(CaptureError::NoCapabilities(_))
        ));
    }

    #[test]
    fn test_repeated_queries_hit_cache() {
        let dir = directory(MockBackend::default().with_device("cam0", webcam()));
        dir.count("cam0").unwrap();
        dir.capability("cam0", 1).unwrap();
        dir.best_match("cam0", &yuv(1280, 720, 30)).unwrap();
        dir.orientation("cam0").unwrap();
        assert_eq!(dir.backend().builds(), 1);
    }

    #[test]
    fn test_single_slot_eviction() {
        let dir = directory(
            MockBackend::default()
                .with_device("a", webcam())
                .with_device("b", CapabilityMap::new(vec![yuv(320, 240, 15)])),
        );
        dir.count("a").unwrap();
        dir.count("b").unwrap();
        dir.count("a").unwrap();
        assert_eq!(dir.backend().builds(), 3);
        assert_eq!(dir.resident_device().as_deref(), Some("a"));
    }

    #[test]
    fn test_best_match_example() {
        let dir = directory(MockBackend::default().with_device("cam0", webcam()));
        let (best, score) = dir.best_match_scored("cam0", &yuv(1280, 720, 30)).unwrap();
        assert_eq!(best, yuv(1280, 720, 30));
        assert_eq!(score.total, 0.0);
        assert_eq!(dir.best_match("cam0", &yuv(1280, 720, 30)).unwrap(), best);
    }

    #[test]
    fn test_invalid_request_skips_backend() {
        let dir = directory(MockBackend::default().with_device("cam0", webcam()));
        let err = dir.best_match("cam0", &yuv(0, 720, 30)).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidRequest(_)));
        assert_eq!(dir.backend().builds(), 0);
    }

    #[test]
    fn test_ranked_orders_all_modes() {
        let dir = directory(MockBackend::default().with_device("cam0", webcam()));
        let ranked = dir.ranked("cam0", &yuv(1280, 720, 30)).unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].index, 1);
    }

    #[test]
    fn test_orientation() {
        let mut rotated = webcam();
        rotated.orientation = Rotation::Deg270;
        let dir = directory(MockBackend::default().with_device("front", rotated));
        assert_eq!(dir.orientation("front").unwrap(), Rotation::Deg270);

        let err = dir.orientation("missing").unwrap_err();
        assert!(matches!(err, CaptureError::DeviceNotFound(id) if id == "missing"));
    }

    #[test]
    fn test_empty_id_not_found() {
        let dir = directory(MockBackend::default());
        assert!(matches!(dir.count(""), Err(CaptureError::DeviceNotFound(_))));
        assert_eq!(dir.backend().builds(), 0);
    }

    #[test]
    fn test_failure_is_not_cached() {
        let dir = directory(
            MockBackend::default()
                .with_device("a", webcam())
                .with_device("b", webcam()),
        );
        dir.count("a").unwrap();

        dir.backend().failing.store(true, Ordering::SeqCst);
        let err = dir.count("b").unwrap_err();
        assert!(matches!(
            err,
            CaptureError::BackendEnumerationFailure { ref device_id, source: BackendError::Enumeration { code: -19, .. } }
                if device_id == "b"
        ));
        // Previous snapshot survives the failed rebuild
        assert_eq!(dir.resident_device().as_deref(), Some("a"));

        dir.backend().failing.store(false, Ordering::SeqCst);
        assert_eq!(dir.count("b").unwrap(), 3);
        assert_eq!(dir.backend().builds(), 3);
    }

    #[test]
    fn test_refresh() {
        let dir = directory(MockBackend::default().with_device("cam0", webcam()));
        dir.count("cam0").unwrap();

        dir.refresh().unwrap();
        assert_eq!(dir.resident_device().as_deref(), Some("cam0"));

        dir.backend().stale.store(true, Ordering::SeqCst);
        dir.refresh().unwrap();
        assert!(dir.resident_device().is_none());

        dir.count("cam0").unwrap();
        assert_eq!(dir.backend().builds(), 2);
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let dir = directory(MockBackend::default().with_device("cam0", webcam()));
        dir.count("cam0").unwrap();
        dir.invalidate();
        dir.count("cam0").unwrap();
        assert_eq!(dir.backend().builds(), 2);
    }

    #[test]
    fn test_devices_passthrough() {
        let dir = directory(
            MockBackend::default()
                .with_device("a", webcam())
                .with_device("b", webcam()),
        );
        let devices = dir.devices().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].id, "a");
        assert_eq!(dir.backend().builds(), 0);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        // Each device's modes carry the device's marker in every field, so a
        // torn read would show mismatched fields.
        fn uniform(marker: u32) -> CapabilityMap {
            CapabilityMap::new((0..16).map(|_| yuv(marker, marker, marker)).collect())
        }

        let dir = Arc::new(directory(
            MockBackend::default()
                .with_device("a", uniform(1))
                .with_device("b", uniform(2)),
        ));
        dir.count("a").unwrap();

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let dir = Arc::clone(&dir);
                thread::spawn(move || {
                    for i in 0..500 {
                        let cap = dir.capability("a", i % 16).unwrap();
                        assert_eq!((cap.width, cap.height, cap.max_fps), (1, 1, 1));
                    }
                })
            })
            .collect();

        let writer = {
            let dir = Arc::clone(&dir);
            thread::spawn(move || {
                for _ in 0..100 {
                    let cap = dir.capability("b", 0).unwrap();
                    assert_eq!((cap.width, cap.height, cap.max_fps), (2, 2, 2));
                }
            })
        };

        for reader in readers {
            reader.join().unwrap();
        }
        writer.join().unwrap();
    }
}
