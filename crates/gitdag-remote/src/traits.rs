use gitdag_types::{ContentAddress, GitOid};

use crate::error::RemoteResult;

/// Write interceptor the transfer engine feeds every pushed object through.
pub type WriteHook<'a> = dyn FnMut(&GitOid, &[u8]) -> RemoteResult<()> + 'a;

/// Block provider consulted before the backend for each fetched address.
/// `Ok(None)` means "not provided here, read it the normal way".
pub type BlockProvider<'a> = dyn FnMut(&ContentAddress) -> RemoteResult<Option<Vec<u8>>> + 'a;

/// The local repository the helper runs against.
pub trait LocalRepo: Send + Sync {
    /// Resolve a ref name, following symbolic refs, to its object id.
    fn resolve_ref(&self, name: &str) -> RemoteResult<GitOid>;

    /// Fully qualified names of all local branches.
    fn branches(&self) -> RemoteResult<Vec<String>>;
}

/// The object-graph walker moving git objects in and out of the backend.
///
/// The bridge never interprets object contents itself; it only sequences
/// these two transfers and intercepts the byte stream for large-object
/// handling.
pub trait TransferEngine: Send + Sync {
    /// Upload every object reachable from `tip`, passing each one's id and
    /// canonical encoding through `on_write` before it is stored.
    fn push_from_root(&self, tip: &GitOid, on_write: &mut WriteHook<'_>) -> RemoteResult<()>;

    /// Materialize `oid` and everything it references into the local
    /// repository, asking `provide` for each address first.
    fn fetch_into(&self, oid: &GitOid, provide: &mut BlockProvider<'_>) -> RemoteResult<()>;
}
