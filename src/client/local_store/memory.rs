use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::{KeyValueStore, StoreKey};
use crate::shared::error::{SyncError, SyncResult};

/// In-process key/value store
///
/// Clones share the same map, so a test can keep a handle and inspect what
/// the engine persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<StoreKey, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw persisted value for a key
    pub fn raw(&self, key: StoreKey) -> Option<String> {
        self.values.lock().ok()?.get(&key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn save(&self, key: StoreKey, value: &str) -> SyncResult<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| SyncError::storage("memory store poisoned"))?;
        values.insert(key, value.to_string());
        Ok(())
    }

    fn load(&self, key: StoreKey) -> SyncResult<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| SyncError::storage("memory store poisoned"))?;
        Ok(values.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_values() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store.save(StoreKey::PresenceEnabled, "true").unwrap();
        assert_eq!(handle.raw(StoreKey::PresenceEnabled).as_deref(), Some("true"));
        assert_eq!(handle.load(StoreKey::Roster).unwrap(), None);
    }
}
