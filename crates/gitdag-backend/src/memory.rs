use std::collections::HashMap;
use std::sync::RwLock;

use gitdag_types::ContentAddress;

use crate::error::{BackendError, BackendResult};
use crate::node::{upsert_entry, DagLink, DagNode, DirEntry, LinkKind};
use crate::path::{parse_path, split_segments};
use crate::traits::DagBackend;

/// In-memory, HashMap-based DAG backend.
///
/// Intended for tests and embedding. All nodes are held in memory behind a
/// `RwLock` for safe concurrent access. Nodes are cloned on read.
pub struct InMemoryDagBackend {
    nodes: RwLock<HashMap<ContentAddress, DagNode>>,
}

impl InMemoryDagBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Number of nodes currently stored.
    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no nodes are stored.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().expect("lock poisoned").is_empty()
    }

    fn load(&self, addr: &ContentAddress) -> BackendResult<DagNode> {
        self.nodes
            .read()
            .expect("lock poisoned")
            .get(addr)
            .cloned()
            .ok_or_else(|| BackendError::UnknownAddress(addr.clone()))
    }

    fn store(&self, node: DagNode) -> BackendResult<ContentAddress> {
        let addr = node.address()?;
        let mut map = self.nodes.write().expect("lock poisoned");
        // Idempotent: content-addressing guarantees the same address always
        // maps to the same node.
        map.entry(addr.clone()).or_insert(node);
        Ok(addr)
    }

    /// Follow `segments` from `root` to the address they name. The final
    /// link target is returned without being loaded, so dangling leaf links
    /// resolve fine.
    fn walk(
        &self,
        root: &ContentAddress,
        segments: &[String],
        full: &str,
    ) -> BackendResult<ContentAddress> {
        let mut current = root.clone();
        for name in segments {
            let entries = match self.load(&current)? {
                DagNode::Directory(entries) => entries,
                _ => return Err(BackendError::NotADirectory(full.to_string())),
            };
            current = entries
                .iter()
                .find(|e| e.name == *name)
                .map(|e| e.addr.clone())
                .ok_or_else(|| BackendError::NoLink {
                    name: name.clone(),
                    path: full.to_string(),
                })?;
        }
        Ok(current)
    }

    fn link_of(&self, entry: &DirEntry) -> DagLink {
        let kind = self
            .nodes
            .read()
            .expect("lock poisoned")
            .get(&entry.addr)
            .map(DagNode::link_kind)
            .unwrap_or(LinkKind::Node);
        DagLink {
            name: entry.name.clone(),
            kind,
            addr: entry.addr.clone(),
        }
    }

    fn patch_entries(
        &self,
        mut entries: Vec<DirEntry>,
        segments: &[String],
        target: &ContentAddress,
    ) -> BackendResult<ContentAddress> {
        let name = &segments[0];
        let child = if segments.len() == 1 {
            target.clone()
        } else {
            let sub = match entries.iter().find(|e| e.name == *name) {
                Some(entry) => match self.load(&entry.addr)? {
                    DagNode::Directory(sub) => sub,
                    _ => return Err(BackendError::NotADirectory(name.clone())),
                },
                None => Vec::new(),
            };
            self.patch_entries(sub, &segments[1..], target)?
        };
        upsert_entry(&mut entries, name, child);
        self.store(DagNode::Directory(entries))
    }
}

impl Default for InMemoryDagBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DagBackend for InMemoryDagBackend {
    fn list(&self, path: &str) -> BackendResult<Vec<DagLink>> {
        let (root, segments) = parse_path(path)?;
        let addr = self.walk(&root, &segments, path)?;
        match self.load(&addr)? {
            DagNode::Directory(entries) => {
                Ok(entries.iter().map(|e| self.link_of(e)).collect())
            }
            _ => Err(BackendError::NotADirectory(path.to_string())),
        }
    }

    fn cat(&self, path: &str) -> BackendResult<Vec<u8>> {
        let (root, segments) = parse_path(path)?;
        let addr = self.walk(&root, &segments, path)?;
        match self.load(&addr)? {
            DagNode::File(data) | DagNode::Object(data) => Ok(data),
            DagNode::Directory(_) => Err(BackendError::NotAFile(path.to_string())),
        }
    }

    fn add(&self, data: &[u8]) -> BackendResult<ContentAddress> {
        self.store(DagNode::File(data.to_vec()))
    }

    fn put_object(&self, data: &[u8]) -> BackendResult<ContentAddress> {
        self.store(DagNode::Object(data.to_vec()))
    }

    fn get_object(&self, addr: &ContentAddress) -> BackendResult<Vec<u8>> {
        match self.load(addr)? {
            DagNode::File(data) | DagNode::Object(data) => Ok(data),
            DagNode::Directory(_) => Err(BackendError::NotAFile(addr.to_string())),
        }
    }

    fn resolve(&self, path: &str) -> BackendResult<ContentAddress> {
        let (root, segments) = parse_path(path)?;
        self.walk(&root, &segments, path)
    }

    fn patch_link(
        &self,
        root: &ContentAddress,
        path: &str,
        target: &ContentAddress,
    ) -> BackendResult<ContentAddress> {
        let segments = split_segments(path)?;
        let entries = match self.load(root)? {
            DagNode::Directory(entries) => entries,
            _ => return Err(BackendError::NotADirectory(root.to_string())),
        };
        self.patch_entries(entries, &segments, target)
    }

    fn empty_root(&self) -> BackendResult<ContentAddress> {
        self.store(DagNode::Directory(Vec::new()))
    }
}

impl std::fmt::Debug for InMemoryDagBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDagBackend")
            .field("node_count", &self.len())
            .finish()
    }
}
