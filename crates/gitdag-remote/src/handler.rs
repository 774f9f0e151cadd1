use gitdag_types::GitOid;

use crate::command::DEFAULT_CAPABILITIES;
use crate::error::RemoteResult;
use crate::types::RefEntry;

/// Lifecycle contract the dispatcher drives.
///
/// An implementation binds one remote (a backend root plus a local
/// repository) and lives for exactly one protocol run: `initialize` before
/// the first command, `finish` after the batch completes.
pub trait RemoteHandler {
    /// Bind to the backend root and local repository. Fails if either
    /// cannot be opened.
    fn initialize(&mut self) -> RemoteResult<()>;

    /// Capability names advertised to the client, in order.
    fn capabilities(&self) -> Vec<String> {
        DEFAULT_CAPABILITIES.iter().map(|c| c.to_string()).collect()
    }

    /// The remote's refs (`for_push` false) or the local branches compared
    /// against the remote (`for_push` true).
    fn list(&mut self, for_push: bool) -> RemoteResult<Vec<RefEntry>>;

    /// Transfer `src` to the remote under `dst`. Returns the name echoed in
    /// the client's `ok <name>` acknowledgement.
    fn push(&mut self, src: &str, dst: &str) -> RemoteResult<String>;

    /// Materialize `oid` locally and record it as the last seen value of
    /// `ref_name`.
    fn fetch(&mut self, oid: &GitOid, ref_name: &str) -> RemoteResult<()>;

    /// End-of-run hook, called after a successful batch.
    fn finish(&mut self) -> RemoteResult<()>;
}
