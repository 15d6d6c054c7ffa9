//! Device registry
//!
//! Aggregates every transport backend, maps device identifiers to the
//! backend that owns them and caches the last-known snapshot. A cache miss
//! triggers a full re-enumeration of all backends.

use crate::device::traits::{DeviceTransport, Platform, UnifiedDeviceInfo};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Cached ownership of one device
#[derive(Clone)]
struct RegistryEntry {
    backend: Arc<dyn DeviceTransport>,
    info: UnifiedDeviceInfo,
}

/// Registry of transport backends and the devices they expose
pub struct DeviceRegistry {
    backends: Vec<Arc<dyn DeviceTransport>>,
    cache: RwLock<HashMap<String, RegistryEntry>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry over the given backends
    pub fn with_backends(backends: Vec<Arc<dyn DeviceTransport>>) -> Self {
        Self {
            backends,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Register another backend
    pub fn add_backend(&mut self, backend: Arc<dyn DeviceTransport>) {
        self.backends.push(backend);
    }

    /// Number of registered backends
    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Re-enumerate every backend and rebuild the identifier map
    ///
    /// A backend that fails to enumerate contributes no devices; the others
    /// are still indexed.
    pub fn refresh(&self) -> Vec<UnifiedDeviceInfo> {
        let mut map = HashMap::new();
        let mut devices = Vec::new();

        for backend in &self.backends {
            match backend.list_devices() {
                Ok(list) => {
                    debug!(
                        "Backend '{}' reported {} device(s)",
                        backend.backend_name(),
                        list.len()
                    );
                    for info in list {
                        map.insert(
                            info.serial.clone(),
                            RegistryEntry {
                                backend: Arc::clone(backend),
                                info: info.clone(),
                            },
                        );
                        devices.push(info);
                    }
                }
                Err(e) => {
                    warn!(
                        "Failed to enumerate backend '{}': {}",
                        backend.backend_name(),
                        e
                    );
                }
            }
        }

        match self.cache.write() {
            Ok(mut cache) => *cache = map,
            Err(poisoned) => *poisoned.into_inner() = map,
        }

        devices
    }

    /// All devices across all backends (always re-enumerates)
    pub fn all_devices(&self) -> Vec<UnifiedDeviceInfo> {
        self.refresh()
    }

    fn lookup(&self, id: &str) -> Option<RegistryEntry> {
        let cache = match self.cache.read() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        cache.get(id).cloned()
    }

    fn lookup_or_refresh(&self, id: &str) -> Option<RegistryEntry> {
        if let Some(entry) = self.lookup(id) {
            return Some(entry);
        }
        debug!("Cache miss for '{}', re-enumerating backends", id);
        self.refresh();
        self.lookup(id)
    }

    /// Resolve an identifier to the backend that owns it
    pub fn resolve(&self, id: &str) -> Option<Arc<dyn DeviceTransport>> {
        self.lookup_or_refresh(id).map(|entry| entry.backend)
    }

    /// Last-known snapshot for an identifier
    pub fn cached_info(&self, id: &str) -> Option<UnifiedDeviceInfo> {
        self.lookup_or_refresh(id).map(|entry| entry.info)
    }

    /// Platform of a resolved identifier
    pub fn platform_of(&self, id: &str) -> Option<Platform> {
        self.lookup_or_refresh(id).map(|entry| entry.backend.platform())
    }

    /// Whether two devices run different platforms
    ///
    /// Returns `false` if either identifier is unresolved; callers must
    /// check resolution first instead of relying on that.
    pub fn is_cross_platform(&self, id_a: &str, id_b: &str) -> bool {
        match (self.platform_of(id_a), self.platform_of(id_b)) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdb::{MockDevice, MockTransport};

    fn registry() -> (DeviceRegistry, Arc<MockTransport>) {
        let android = Arc::new(MockTransport::new(Platform::Android));
        android.add_device(MockDevice::android("R58M123"));
        let ios = Arc::new(MockTransport::new(Platform::Ios));
        ios.add_device(MockDevice::iphone("00008101-AAA"));
        let registry = DeviceRegistry::with_backends(vec![
            android.clone() as Arc<dyn DeviceTransport>,
            ios as Arc<dyn DeviceTransport>,
        ]);
        (registry, android)
    }

    #[test]
    fn test_resolve_known_and_unknown() {
        let (registry, _) = registry();
        let backend = registry.resolve("R58M123").unwrap();
        assert_eq!(backend.platform(), Platform::Android);
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_cache_avoids_reenumeration() {
        let (registry, android) = registry();
        registry.resolve("R58M123").unwrap();
        let after_first = android.enumeration_count();
        registry.resolve("R58M123").unwrap();
        registry.resolve("00008101-AAA").unwrap();
        assert_eq!(android.enumeration_count(), after_first);
    }

    #[test]
    fn test_cache_miss_picks_up_new_device() {
        let (registry, android) = registry();
        registry.refresh();
        android.add_device(MockDevice::android("NEW1"));
        assert!(registry.resolve("NEW1").is_some());
    }

    #[test]
    fn test_is_cross_platform() {
        let (registry, android) = registry();
        android.add_device(MockDevice::android("R58M999"));
        assert!(registry.is_cross_platform("R58M123", "00008101-AAA"));
        assert!(!registry.is_cross_platform("R58M123", "R58M999"));
        assert!(!registry.is_cross_platform("R58M123", "missing"));
    }

    #[test]
    fn test_all_devices_and_cached_info() {
        let (registry, _) = registry();
        assert_eq!(registry.all_devices().len(), 2);
        let info = registry.cached_info("00008101-AAA").unwrap();
        assert_eq!(info.platform, Platform::Ios);
        assert_eq!(registry.backend_count(), 2);
    }
}
