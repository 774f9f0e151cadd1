use gitdag_types::ContentAddress;

use crate::error::BackendResult;
use crate::node::DagLink;

/// A content-addressed Merkle-DAG store with named links.
///
/// All implementations must satisfy these invariants:
/// - Nodes are immutable once written; every address is re-derivable from
///   the content it names.
/// - `patch_link` has persistent-tree semantics: it returns a new root and
///   never alters nodes reachable from the old one. Equal trees get equal
///   addresses.
/// - Directory listings are returned in a stable order for a given node.
/// - Link absence is reported as a `NoLink` error, distinguishable via
///   [`BackendError::is_no_link`](crate::BackendError::is_no_link); it is
///   never conflated with I/O or corruption failures.
pub trait DagBackend: Send + Sync {
    /// List the links of the directory at an absolute path.
    fn list(&self, path: &str) -> BackendResult<Vec<DagLink>>;

    /// Read the content of the file or raw object at an absolute path.
    fn cat(&self, path: &str) -> BackendResult<Vec<u8>>;

    /// Store raw file content and return its address. Idempotent.
    fn add(&self, data: &[u8]) -> BackendResult<ContentAddress>;

    /// Store a canonically encoded git object, addressed by its git id.
    /// Idempotent.
    fn put_object(&self, data: &[u8]) -> BackendResult<ContentAddress>;

    /// Fetch stored content by address, regardless of where it is linked.
    fn get_object(&self, addr: &ContentAddress) -> BackendResult<Vec<u8>>;

    /// Resolve an absolute path to the address it links to. The target may
    /// be an address the backend holds no node for (a dangling link).
    fn resolve(&self, path: &str) -> BackendResult<ContentAddress>;

    /// Return a new root equal to `root` with the link at the root-relative
    /// `path` (re)pointed at `target`, creating intermediate directories.
    fn patch_link(
        &self,
        root: &ContentAddress,
        path: &str,
        target: &ContentAddress,
    ) -> BackendResult<ContentAddress>;

    /// The address of the canonical empty directory.
    fn empty_root(&self) -> BackendResult<ContentAddress>;
}
