use std::collections::BTreeMap;

use crate::error::StateResult;

/// Durable key/value state shared between helper runs.
///
/// The bridge records its ref observations and large-object mappings here.
/// Keys are flat strings namespaced by reserved prefixes; values are opaque
/// bytes. Implementations must keep `list_by_prefix` results sorted by key
/// so prefix scans iterate deterministically.
pub trait StateStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` if the key has never been set.
    fn get(&self, key: &str) -> StateResult<Option<Vec<u8>>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &[u8]) -> StateResult<()>;

    /// All entries whose keys start with `prefix`, sorted by key.
    fn list_by_prefix(&self, prefix: &str) -> StateResult<BTreeMap<String, Vec<u8>>>;
}
