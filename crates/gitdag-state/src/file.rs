use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::traits::StateStore;

/// File-backed state store: one JSON map per remote, written through on
/// every update so a crash between runs never loses acknowledged state.
pub struct FileStateStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl FileStateStore {
    /// Open the store at `path`, reading any existing content. A missing
    /// file is an empty store; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> StateResult<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data)
                .map_err(|e| StateError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "opened state store");
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// The file this store persists to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, Vec<u8>>) -> StateResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec(entries)
            .map_err(|e| StateError::Serialization(e.to_string()))?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl StateStore for FileStateStore {
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StateResult<()> {
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), value.to_vec());
        self.persist(&map)
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

impl std::fmt::Debug for FileStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStateStore")
            .field("path", &self.path)
            .finish()
    }
}
