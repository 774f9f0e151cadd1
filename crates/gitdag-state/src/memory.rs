use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::StateResult;
use crate::traits::StateStore;

/// In-memory state store for tests and ephemeral runs.
pub struct InMemoryStateStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryStateStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for InMemoryStateStore {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StateResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn list_by_prefix(&self, prefix: &str) -> StateResult<BTreeMap<String, Vec<u8>>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl std::fmt::Debug for InMemoryStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStateStore")
            .field("entry_count", &self.len())
            .finish()
    }
}
