use std::collections::HashSet;
use std::sync::Arc;

use gitdag_backend::DagBackend;
use gitdag_remote::{BlockProvider, RemoteError, RemoteResult, TransferEngine, WriteHook};
use gitdag_types::{ContentAddress, GitOid};
use tracing::{debug, warn};

use crate::exec::{git_succeeds, run_git, run_git_with_input};
use crate::objects::{self, ObjectKind};

/// Moves git objects between the local repository and the backend with git
/// plumbing commands. Pushes walk `rev-list --objects`; fetches walk the
/// object graph from the requested tip, stopping at anything the local
/// repository already has.
pub struct GitCliEngine {
    backend: Arc<dyn DagBackend>,
}

impl GitCliEngine {
    pub fn new(backend: Arc<dyn DagBackend>) -> Self {
        Self { backend }
    }

    fn read_local(&self, oid: &GitOid) -> RemoteResult<(ObjectKind, Vec<u8>)> {
        let sha = oid.to_hex();
        let kind_out = run_git(&["cat-file", "-t", &sha])?;
        let kind_str = String::from_utf8_lossy(&kind_out).trim().to_string();
        let kind = ObjectKind::parse(&kind_str).ok_or_else(|| {
            RemoteError::Engine(format!("object {sha} has unknown kind {kind_str:?}"))
        })?;
        // cat-file with the explicit kind yields the raw form; -p would
        // pretty-print trees and break the framing.
        let content = run_git(&["cat-file", kind.as_str(), &sha])?;
        Ok((kind, content))
    }

    fn write_local(&self, kind: ObjectKind, content: &[u8]) -> RemoteResult<GitOid> {
        let out = run_git_with_input(
            &["hash-object", "-w", "-t", kind.as_str(), "--stdin"],
            content,
        )?;
        let hex = String::from_utf8_lossy(&out);
        GitOid::from_hex(hex.trim()).map_err(|e| {
            RemoteError::Engine(format!("hash-object produced {:?}: {e}", hex.trim()))
        })
    }

    fn have_local(&self, oid: &GitOid) -> RemoteResult<bool> {
        git_succeeds(&["cat-file", "-e", &oid.to_hex()])
    }
}

impl TransferEngine for GitCliEngine {
    fn push_from_root(&self, tip: &GitOid, on_write: &mut WriteHook<'_>) -> RemoteResult<()> {
        let listing = run_git(&["rev-list", "--objects", &tip.to_hex()])?;
        let listing = String::from_utf8_lossy(&listing);

        let mut moved = 0usize;
        for line in listing.lines() {
            // Each line is `<sha>` optionally followed by a path.
            let Some(sha) = line.split_whitespace().next() else {
                continue;
            };
            let oid = GitOid::from_hex(sha)
                .map_err(|e| RemoteError::Engine(format!("rev-list produced {sha:?}: {e}")))?;

            let (kind, content) = self.read_local(&oid)?;
            let data = objects::frame(kind, &content);
            on_write(&oid, &data)?;
            self.backend.put_object(&data)?;
            moved += 1;
        }

        debug!(tip = %tip, objects = moved, "push transfer complete");
        Ok(())
    }

    fn fetch_into(&self, oid: &GitOid, provide: &mut BlockProvider<'_>) -> RemoteResult<()> {
        let mut queue = vec![*oid];
        let mut seen = HashSet::new();
        let mut moved = 0usize;

        while let Some(wanted) = queue.pop() {
            if !seen.insert(wanted) {
                continue;
            }
            if self.have_local(&wanted)? {
                continue;
            }

            let addr = ContentAddress::from_oid(&wanted);
            let data = match provide(&addr)? {
                Some(data) => data,
                None => self.backend.get_object(&addr)?,
            };

            let computed = GitOid::from_bytes(&data);
            if computed != wanted {
                return Err(RemoteError::IntegrityMismatch {
                    requested: addr,
                    computed: ContentAddress::from_oid(&computed),
                });
            }

            let (kind, content) = objects::split_header(&data)?;
            let written = self.write_local(kind, content)?;
            if written != wanted {
                warn!(expected = %wanted, written = %written, "local object id differs");
            }
            moved += 1;
            queue.extend(objects::referenced_oids(kind, content)?);
        }

        debug!(root = %oid, objects = moved, "fetch transfer complete");
        Ok(())
    }
}
