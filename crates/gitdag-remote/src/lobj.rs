use std::collections::HashMap;
use std::sync::Arc;

use gitdag_backend::{abs_path, DagBackend};
use gitdag_state::StateStore;
use gitdag_types::{ContentAddress, GitOid};
use tracing::debug;

use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};

/// Keeps oversized objects out of directory nodes.
///
/// Objects above the configured threshold are stored as plain files, linked
/// under the reserved top-level directory, and journaled in the state store
/// so a later run can restore any mapping the tree has lost. The in-memory
/// map mirrors the reserved directory and is loaded lazily on first use.
pub struct LargeObjectTracker {
    backend: Arc<dyn DagBackend>,
    state: Arc<dyn StateStore>,
    config: RemoteConfig,
    cache: Option<HashMap<String, ContentAddress>>,
}

impl LargeObjectTracker {
    pub fn new(
        backend: Arc<dyn DagBackend>,
        state: Arc<dyn StateStore>,
        config: RemoteConfig,
    ) -> Self {
        Self {
            backend,
            state,
            config,
            cache: None,
        }
    }

    /// Drop the lazily loaded mapping so the next use reloads it from the
    /// tree. Call after switching to an unrelated root.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Store `data` out-of-band when it exceeds the threshold, linking it
    /// under the reserved directory of `root` and journaling the mapping.
    /// Objects at or below the threshold pass through untouched.
    pub fn externalize(
        &mut self,
        root: &mut ContentAddress,
        oid: &GitOid,
        data: &[u8],
    ) -> RemoteResult<()> {
        if data.len() <= self.config.large_object_threshold {
            return Ok(());
        }

        let name = ContentAddress::from_oid(oid).to_string();
        let stored = self.backend.add(data)?;
        debug!(object = %oid, size = data.len(), file = %stored, "externalizing large object");

        self.state
            .set(&self.config.lobj_key(&name), stored.to_string().as_bytes())?;
        *root = self
            .backend
            .patch_link(root, &self.config.lobj_link(&name), &stored)?;
        if let Some(cache) = self.cache.as_mut() {
            cache.insert(name, stored);
        }
        Ok(())
    }

    /// Look `requested` up in the large-object mapping under `root`.
    ///
    /// `Ok(None)` means the object was never externalized and should be
    /// read the normal way. A hit re-journals the mapping, reads the file
    /// back, and verifies the content still hashes to the requested
    /// address before handing it out.
    pub fn provide(
        &mut self,
        root: &ContentAddress,
        requested: &ContentAddress,
    ) -> RemoteResult<Option<Vec<u8>>> {
        let name = requested.to_string();
        let Some(stored) = self.ensure_cache(root)?.get(&name).cloned() else {
            return Ok(None);
        };

        self.state
            .set(&self.config.lobj_key(&name), stored.to_string().as_bytes())?;

        let data = self.backend.get_object(&stored)?;
        let computed = ContentAddress::from_oid(&GitOid::from_bytes(&data));
        if computed != *requested {
            return Err(RemoteError::IntegrityMismatch {
                requested: requested.clone(),
                computed,
            });
        }
        Ok(Some(data))
    }

    /// Restore journaled mappings missing from the tree under `root`.
    /// Returns the patched root, which equals `root` when nothing was
    /// missing.
    pub fn reconcile(&mut self, root: &ContentAddress) -> RemoteResult<ContentAddress> {
        self.ensure_cache(root)?;

        let mut current = root.clone();
        let prefix = format!("{}/", self.config.lobj_prefix);
        for (key, value) in self.state.list_by_prefix(&self.config.lobj_prefix)? {
            let name = key.strip_prefix(&prefix).unwrap_or(&key).to_string();
            if self.cache.as_ref().is_some_and(|c| c.contains_key(&name)) {
                continue;
            }

            let stored: ContentAddress = std::str::from_utf8(&value)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| RemoteError::CorruptState {
                    key: key.clone(),
                    reason: "value is not a content address".to_string(),
                })?;

            debug!(object = %name, file = %stored, "restoring large-object link");
            current = self
                .backend
                .patch_link(&current, &self.config.lobj_link(&name), &stored)?;
            if let Some(cache) = self.cache.as_mut() {
                cache.insert(name, stored);
            }
        }
        Ok(current)
    }

    fn ensure_cache(&mut self, root: &ContentAddress) -> RemoteResult<&HashMap<String, ContentAddress>> {
        if self.cache.is_none() {
            let mut map = HashMap::new();
            match self
                .backend
                .list(&abs_path(root, &self.config.large_object_dir))
            {
                Ok(links) => {
                    for link in links {
                        map.insert(link.name, link.addr);
                    }
                }
                Err(e) if e.is_no_link() => {}
                Err(e) => return Err(e.into()),
            }
            self.cache = Some(map);
        }
        Ok(self.cache.get_or_insert_with(HashMap::new))
    }
}
