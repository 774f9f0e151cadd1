use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use gitdag_types::ContentAddress;
use tracing::debug;

use crate::error::{BackendError, BackendResult};
use crate::node::{upsert_entry, DagLink, DagNode, DirEntry, LinkKind};
use crate::path::{parse_path, split_segments};
use crate::traits::DagBackend;

/// Filesystem-backed DAG backend: one JSON-encoded node file per address
/// under a store directory. Node files are immutable once written, so a
/// store can be shared between successive helper runs.
pub struct FsDagBackend {
    dir: PathBuf,
}

impl FsDagBackend {
    /// Open (creating if needed) a node store under `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> BackendResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "opened node store");
        Ok(Self { dir })
    }

    /// The directory this store lives in.
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn node_path(&self, addr: &ContentAddress) -> PathBuf {
        self.dir.join(format!("{addr}.json"))
    }

    fn load(&self, addr: &ContentAddress) -> BackendResult<DagNode> {
        let path = self.node_path(addr);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(BackendError::UnknownAddress(addr.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data).map_err(|e| BackendError::Encoding(e.to_string()))
    }

    fn store(&self, node: DagNode) -> BackendResult<ContentAddress> {
        let addr = node.address()?;
        let path = self.node_path(&addr);
        // Idempotent: a present file already holds this exact content.
        if !path.exists() {
            let data =
                serde_json::to_vec(&node).map_err(|e| BackendError::Encoding(e.to_string()))?;
            fs::write(&path, data)?;
            debug!(%addr, "stored node");
        }
        Ok(addr)
    }

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

    fn link_of(&self, entry: &DirEntry) -> BackendResult<DagLink> {
        let kind = match self.load(&entry.addr) {
            Ok(node) => node.link_kind(),
            Err(BackendError::UnknownAddress(_)) => LinkKind::Node,
            Err(e) => return Err(e),
        };
        Ok(DagLink {
            name: entry.name.clone(),
            kind,
            addr: entry.addr.clone(),
        })
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

impl DagBackend for FsDagBackend {
    fn list(&self, path: &str) -> BackendResult<Vec<DagLink>> {
        let (root, segments) = parse_path(path)?;
        let addr = self.walk(&root, &segments, path)?;
        match self.load(&addr)? {
            DagNode::Directory(entries) => {
                entries.iter().map(|e| self.link_of(e)).collect()
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

impl std::fmt::Debug for FsDagBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsDagBackend").field("dir", &self.dir).finish()
    }
}
