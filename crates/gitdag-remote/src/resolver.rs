use gitdag_backend::{abs_path, DagBackend, LinkKind};
use gitdag_types::ContentAddress;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::LocalRepo;
use crate::types::RefEntry;

/// Turns the tree under a backend root into git ref advertisements.
pub struct RefResolver<'a> {
    backend: &'a dyn DagBackend,
    reserved_dir: &'a str,
}

impl<'a> RefResolver<'a> {
    /// `reserved_dir` is the top-level directory holding large-object
    /// bookkeeping; it is never advertised as a ref.
    pub fn new(backend: &'a dyn DagBackend, reserved_dir: &'a str) -> Self {
        Self {
            backend,
            reserved_dir,
        }
    }

    /// Every ref reachable under `root`, in listing order.
    ///
    /// Object links render as direct refs. File links are read and rendered
    /// as pointers, with a leading `ref: ` rewritten to the `@` syntax the
    /// client expects for symbolic refs; other file content passes through
    /// verbatim.
    pub fn advertised(&self, root: &ContentAddress) -> RemoteResult<Vec<RefEntry>> {
        let mut out = Vec::new();
        self.walk(root, "", 0, &mut out)?;
        Ok(out)
    }

    fn walk(
        &self,
        root: &ContentAddress,
        prefix: &str,
        depth: usize,
        out: &mut Vec<RefEntry>,
    ) -> RemoteResult<()> {
        for link in self.backend.list(&abs_path(root, prefix))? {
            let rel = if prefix.is_empty() {
                link.name.clone()
            } else {
                format!("{prefix}/{}", link.name)
            };
            match link.kind {
                LinkKind::Directory => {
                    if depth == 0 && link.name == self.reserved_dir {
                        continue;
                    }
                    self.walk(root, &rel, depth + 1, out)?;
                }
                LinkKind::File => {
                    let content = self.backend.cat(&abs_path(root, &rel))?;
                    let dest = String::from_utf8(content)
                        .map_err(|_| RemoteError::RefNotUtf8 { name: rel.clone() })?;
                    let dest = dest.trim_end().replacen("ref: ", "@", 1);
                    out.push(RefEntry::pointer(rel, dest));
                }
                LinkKind::Node => {
                    out.push(RefEntry::direct(rel, link.addr.to_oid()?));
                }
            }
        }
        Ok(())
    }

    /// Local branches compared against `root`. Branches absent on the
    /// remote advertise the all-zero id so the client offers them for push.
    pub fn for_push(
        &self,
        root: &ContentAddress,
        repo: &dyn LocalRepo,
    ) -> RemoteResult<Vec<RefEntry>> {
        let mut out = Vec::new();
        for name in repo.branches()? {
            match self.backend.resolve(&abs_path(root, &name)) {
                Ok(addr) => out.push(RefEntry::direct(&name, addr.to_oid()?)),
                Err(e) if e.is_no_link() => {
                    debug!(branch = %name, "branch not on remote yet");
                    out.push(RefEntry::absent(&name));
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(out)
    }
}
