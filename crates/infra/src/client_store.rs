//! In-memory client-side key-value storage.

use std::collections::HashMap;
use std::sync::RwLock;

use stockroom_auth::ClientStorage;

/// Durable-storage stand-in for tests and dev. Real clients back this with
/// whatever the platform offers; consumers already tolerate it being empty,
/// partial, or stale.
#[derive(Debug, Default)]
pub struct MemoryClientStorage {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryClientStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClientStorage for MemoryClientStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(key);
        }
    }
}
