use std::fmt;
use std::sync::Arc;

use gitdag_backend::{abs_path, DagBackend};
use gitdag_state::StateStore;
use gitdag_types::{ContentAddress, GitOid};
use tracing::{debug, info};

use crate::config::RemoteConfig;
use crate::error::{RemoteError, RemoteResult};
use crate::handler::RemoteHandler;
use crate::lobj::LargeObjectTracker;
use crate::resolver::RefResolver;
use crate::traits::{LocalRepo, TransferEngine};
use crate::types::RefEntry;

/// The bridge between one local repository and one backend root.
///
/// Every push derives a new root; the handler tracks the latest one across
/// the run and reports it when the run finishes, since that address is what
/// the remote URL has to point at next time.
pub struct DagHandler {
    backend: Arc<dyn DagBackend>,
    repo: Arc<dyn LocalRepo>,
    engine: Arc<dyn TransferEngine>,
    state: Arc<dyn StateStore>,
    config: RemoteConfig,
    lobj: LargeObjectTracker,
    address: String,
    current_root: Option<ContentAddress>,
    did_push: bool,
}

impl DagHandler {
    /// `address` is the root named in the remote URL; empty means "start
    /// from the empty tree".
    pub fn new(
        backend: Arc<dyn DagBackend>,
        repo: Arc<dyn LocalRepo>,
        engine: Arc<dyn TransferEngine>,
        state: Arc<dyn StateStore>,
        config: RemoteConfig,
        address: impl Into<String>,
    ) -> Self {
        let lobj = LargeObjectTracker::new(backend.clone(), state.clone(), config.clone());
        Self {
            backend,
            repo,
            engine,
            state,
            config,
            lobj,
            address: address.into(),
            current_root: None,
            did_push: false,
        }
    }

    /// The latest root, updated by pushes and the end-of-run reconcile.
    pub fn current_root(&self) -> Option<&ContentAddress> {
        self.current_root.as_ref()
    }

    fn root(&self) -> RemoteResult<ContentAddress> {
        self.current_root
            .clone()
            .ok_or(RemoteError::NotInitialized)
    }

    fn read_ref(&self, root: &ContentAddress, name: &str) -> RemoteResult<Option<String>> {
        match self.backend.cat(&abs_path(root, name)) {
            Ok(content) => {
                let content = String::from_utf8(content).map_err(|_| RemoteError::RefNotUtf8 {
                    name: name.to_string(),
                })?;
                Ok(Some(content))
            }
            Err(e) if e.is_no_link() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl RemoteHandler for DagHandler {
    fn initialize(&mut self) -> RemoteResult<()> {
        let root = if self.address.is_empty() {
            self.backend.empty_root()?
        } else {
            let root: ContentAddress = self.address.parse()?;
            // The root has to be a directory we can actually read.
            self.backend.list(&abs_path(&root, ""))?;
            root
        };
        info!(root = %root, "bound to remote root");
        self.lobj.invalidate();
        self.current_root = Some(root);
        self.did_push = false;
        Ok(())
    }

    fn list(&mut self, for_push: bool) -> RemoteResult<Vec<RefEntry>> {
        let root = self.root()?;
        let resolver = RefResolver::new(self.backend.as_ref(), &self.config.large_object_dir);
        if for_push {
            resolver.for_push(&root, self.repo.as_ref())
        } else {
            resolver.advertised(&root)
        }
    }

    fn push(&mut self, src: &str, dst: &str) -> RemoteResult<String> {
        self.did_push = true;
        let mut root = self.root()?;
        let tip = self.repo.resolve_ref(src)?;
        debug!(src, dst, tip = %tip, "pushing");

        let engine = self.engine.clone();
        {
            let lobj = &mut self.lobj;
            let root = &mut root;
            engine.push_from_root(&tip, &mut |oid, data| lobj.externalize(root, oid, data))?;
        }

        self.state.set(dst, tip.to_hex().as_bytes())?;
        root = self
            .backend
            .patch_link(&root, dst, &ContentAddress::from_oid(&tip))?;

        if self.read_ref(&root, "HEAD")?.is_none() {
            let head = self.backend.add(b"ref: refs/heads/master")?;
            root = self.backend.patch_link(&root, "HEAD", &head)?;
        }

        self.current_root = Some(root);
        Ok(dst.to_string())
    }

    fn fetch(&mut self, oid: &GitOid, ref_name: &str) -> RemoteResult<()> {
        let root = self.root()?;
        debug!(%oid, ref_name, "fetching");

        let engine = self.engine.clone();
        {
            let lobj = &mut self.lobj;
            engine.fetch_into(oid, &mut |addr| lobj.provide(&root, addr))?;
        }

        self.state.set(ref_name, oid.to_hex().as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> RemoteResult<()> {
        if self.did_push {
            let root = self.root()?;
            let reconciled = self.lobj.reconcile(&root)?;
            self.current_root = Some(reconciled.clone());
            info!("pushed to dag://{reconciled}");
        }
        Ok(())
    }
}

impl fmt::Debug for DagHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DagHandler")
            .field("address", &self.address)
            .field("current_root", &self.current_root)
            .field("did_push", &self.did_push)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use gitdag_backend::InMemoryDagBackend;
    use gitdag_state::InMemoryStateStore;

    struct FakeRepo {
        refs: HashMap<String, GitOid>,
    }

    impl FakeRepo {
        fn with_branch(name: &str, tip: GitOid) -> Self {
            let mut refs = HashMap::new();
            refs.insert(name.to_string(), tip);
            Self { refs }
        }
    }

    impl LocalRepo for FakeRepo {
        fn resolve_ref(&self, name: &str) -> RemoteResult<GitOid> {
            self.refs
                .get(name)
                .copied()
                .ok_or_else(|| RemoteError::Repo(format!("unknown ref {name}")))
        }

        fn branches(&self) -> RemoteResult<Vec<String>> {
            let mut names: Vec<String> = self.refs.keys().cloned().collect();
            names.sort();
            Ok(names)
        }
    }

    /// Pushes a fixed object set; fetches by asking the provider first and
    /// falling back to the backend, recording what it moved.
    struct FakeEngine {
        backend: Arc<InMemoryDagBackend>,
        objects: Vec<Vec<u8>>,
        fetched: Mutex<Vec<GitOid>>,
        provided: Mutex<Vec<Vec<u8>>>,
    }

    impl FakeEngine {
        fn new(backend: Arc<InMemoryDagBackend>, objects: Vec<Vec<u8>>) -> Self {
            Self {
                backend,
                objects,
                fetched: Mutex::new(Vec::new()),
                provided: Mutex::new(Vec::new()),
            }
        }
    }

    impl TransferEngine for FakeEngine {
        fn push_from_root(
            &self,
            _tip: &GitOid,
            on_write: &mut crate::traits::WriteHook<'_>,
        ) -> RemoteResult<()> {
            for data in &self.objects {
                on_write(&GitOid::from_bytes(data), data)?;
                self.backend.put_object(data)?;
            }
            Ok(())
        }

        fn fetch_into(
            &self,
            oid: &GitOid,
            provide: &mut crate::traits::BlockProvider<'_>,
        ) -> RemoteResult<()> {
            self.fetched.lock().unwrap().push(*oid);
            let addr = ContentAddress::from_oid(oid);
            match provide(&addr)? {
                Some(data) => self.provided.lock().unwrap().push(data),
                None => {
                    self.backend.get_object(&addr)?;
                }
            }
            Ok(())
        }
    }

    fn commit() -> Vec<u8> {
        b"commit 3\0abc".to_vec()
    }

    fn small_config() -> RemoteConfig {
        RemoteConfig {
            large_object_threshold: 16,
            ..RemoteConfig::default()
        }
    }

    fn handler_for(
        objects: Vec<Vec<u8>>,
        address: &str,
        config: RemoteConfig,
    ) -> (Arc<InMemoryDagBackend>, Arc<InMemoryStateStore>, DagHandler) {
        let backend = Arc::new(InMemoryDagBackend::new());
        let state = Arc::new(InMemoryStateStore::new());
        let tip = GitOid::from_bytes(&objects[0]);
        let repo = Arc::new(FakeRepo::with_branch("refs/heads/master", tip));
        let engine = Arc::new(FakeEngine::new(backend.clone(), objects));
        let handler = DagHandler::new(
            backend.clone(),
            repo,
            engine,
            state.clone(),
            config,
            address,
        );
        (backend, state, handler)
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    #[test]
    fn empty_address_binds_to_the_empty_root() {
        let (backend, _, mut handler) = handler_for(vec![commit()], "", small_config());
        handler.initialize().unwrap();
        assert_eq!(
            handler.current_root(),
            Some(&backend.empty_root().unwrap())
        );
    }

    #[test]
    fn explicit_address_is_parsed_and_validated() {
        let (backend, _, mut handler) = handler_for(vec![commit()], "", small_config());
        handler.initialize().unwrap();
        handler.push("refs/heads/master", "refs/heads/master").unwrap();
        let root = handler.current_root().unwrap().clone();

        let state = Arc::new(InMemoryStateStore::new());
        let repo = Arc::new(FakeRepo::with_branch(
            "refs/heads/master",
            GitOid::from_bytes(&commit()),
        ));
        let engine = Arc::new(FakeEngine::new(backend.clone(), vec![commit()]));
        let mut rebound = DagHandler::new(
            backend.clone(),
            repo,
            engine,
            state,
            small_config(),
            root.to_string(),
        );
        rebound.initialize().unwrap();
        assert_eq!(rebound.current_root(), Some(&root));
    }

    #[test]
    fn unknown_address_fails_initialization() {
        let phantom = ContentAddress::for_directory(b"[{\"never\":\"stored\"}]");
        let (_, _, mut handler) =
            handler_for(vec![commit()], &phantom.to_string(), small_config());
        assert!(matches!(
            handler.initialize(),
            Err(RemoteError::Backend(_))
        ));
    }

    #[test]
    fn garbage_address_fails_initialization() {
        let (_, _, mut handler) = handler_for(vec![commit()], "not-an-address", small_config());
        assert!(matches!(handler.initialize(), Err(RemoteError::Type(_))));
    }

    #[test]
    fn operations_before_initialization_fail() {
        let (_, _, mut handler) = handler_for(vec![commit()], "", small_config());
        assert!(matches!(
            handler.list(false),
            Err(RemoteError::NotInitialized)
        ));
    }

    // -----------------------------------------------------------------------
    // Pushing
    // -----------------------------------------------------------------------

    #[test]
    fn push_returns_the_destination_name() {
        let (_, _, mut handler) = handler_for(vec![commit()], "", small_config());
        handler.initialize().unwrap();
        let done = handler.push("refs/heads/master", "refs/heads/master").unwrap();
        assert_eq!(done, "refs/heads/master");
    }

    #[test]
    fn push_then_list_advertises_branch_and_head() {
        let (_, _, mut handler) = handler_for(vec![commit()], "", small_config());
        handler.initialize().unwrap();
        handler.push("refs/heads/master", "refs/heads/master").unwrap();

        let tip = GitOid::from_bytes(&commit());
        let refs: Vec<String> = handler
            .list(false)
            .unwrap()
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(
            refs,
            vec![
                "@refs/heads/master HEAD".to_string(),
                format!("{tip} refs/heads/master"),
            ]
        );
    }

    #[test]
    fn push_records_the_ref_in_state() {
        let (_, state, mut handler) = handler_for(vec![commit()], "", small_config());
        handler.initialize().unwrap();
        handler.push("refs/heads/master", "refs/heads/master").unwrap();

        let tip = GitOid::from_bytes(&commit());
        assert_eq!(
            state.get("refs/heads/master").unwrap(),
            Some(tip.to_hex().into_bytes())
        );
    }

    #[test]
    fn push_keeps_an_existing_head() {
        let (backend, _, mut handler) = handler_for(vec![commit()], "", small_config());
        handler.initialize().unwrap();
        handler.push("refs/heads/master", "refs/heads/other").unwrap();
        let after_first = handler.current_root().unwrap().clone();

        // HEAD was just seeded; a second push must not reseed it.
        handler.push("refs/heads/master", "refs/heads/more").unwrap();
        let root = handler.current_root().unwrap();
        let head = backend.cat(&abs_path(root, "HEAD")).unwrap();
        assert_eq!(head, b"ref: refs/heads/master");
        assert_ne!(*root, after_first);
    }

    #[test]
    fn oversized_objects_are_linked_under_the_reserved_dir() {
        let big = {
            let mut v = b"blob 64\0".to_vec();
            v.extend(std::iter::repeat(b'x').take(64));
            v
        };
        let (backend, _, mut handler) =
            handler_for(vec![commit(), big.clone()], "", small_config());
        handler.initialize().unwrap();
        handler.push("refs/heads/master", "refs/heads/master").unwrap();

        let addr = ContentAddress::from_oid(&GitOid::from_bytes(&big));
        let root = handler.current_root().unwrap();
        let stored = backend
            .resolve(&abs_path(root, &format!("objects/{addr}")))
            .unwrap();
        assert_eq!(backend.get_object(&stored).unwrap(), big);
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    #[test]
    fn fetch_records_the_ref_in_state() {
        let (_, state, mut handler) = handler_for(vec![commit()], "", small_config());
        handler.initialize().unwrap();
        handler.push("refs/heads/master", "refs/heads/master").unwrap();

        let tip = GitOid::from_bytes(&commit());
        handler.fetch(&tip, "refs/heads/master").unwrap();
        assert_eq!(
            state.get("refs/heads/master").unwrap(),
            Some(tip.to_hex().into_bytes())
        );
    }

    #[test]
    fn fetch_serves_externalized_objects_through_the_provider() {
        let big = {
            let mut v = b"blob 64\0".to_vec();
            v.extend(std::iter::repeat(b'x').take(64));
            v
        };
        let backend = Arc::new(InMemoryDagBackend::new());
        let state = Arc::new(InMemoryStateStore::new());
        let tip = GitOid::from_bytes(&big);
        let repo = Arc::new(FakeRepo::with_branch("refs/heads/master", tip));
        let engine = Arc::new(FakeEngine::new(
            backend.clone(),
            vec![big.clone()],
        ));
        let mut handler = DagHandler::new(
            backend,
            repo,
            engine.clone(),
            state,
            small_config(),
            "",
        );
        handler.initialize().unwrap();
        handler.push("refs/heads/master", "refs/heads/master").unwrap();

        handler.fetch(&tip, "refs/heads/master").unwrap();
        assert_eq!(engine.fetched.lock().unwrap().as_slice(), &[tip]);
        assert_eq!(engine.provided.lock().unwrap().as_slice(), &[big]);
    }

    // -----------------------------------------------------------------------
    // Finishing
    // -----------------------------------------------------------------------

    #[test]
    fn finish_restores_journaled_large_objects() {
        let big = {
            let mut v = b"blob 64\0".to_vec();
            v.extend(std::iter::repeat(b'x').take(64));
            v
        };
        let (backend, state, mut first) =
            handler_for(vec![commit(), big.clone()], "", small_config());
        first.initialize().unwrap();
        first.push("refs/heads/master", "refs/heads/master").unwrap();
        first.finish().unwrap();

        // A later run starts from the empty root; its tree knows nothing of
        // the mapping until finish reconciles the journal back in.
        let repo = Arc::new(FakeRepo::with_branch(
            "refs/heads/master",
            GitOid::from_bytes(&commit()),
        ));
        let engine = Arc::new(FakeEngine::new(backend.clone(), vec![commit()]));
        let mut second = DagHandler::new(
            backend.clone(),
            repo,
            engine,
            state,
            small_config(),
            "",
        );
        second.initialize().unwrap();
        second.push("refs/heads/master", "refs/heads/master").unwrap();
        second.finish().unwrap();

        let addr = ContentAddress::from_oid(&GitOid::from_bytes(&big));
        let root = second.current_root().unwrap();
        assert!(backend
            .resolve(&abs_path(root, &format!("objects/{addr}")))
            .is_ok());
    }

    #[test]
    fn finish_without_a_push_touches_nothing() {
        let (_, state, mut handler) = handler_for(vec![commit()], "", small_config());
        handler.initialize().unwrap();
        // A corrupt journal entry would fail reconciliation if it ran.
        state.set("//lobj/bogus", b"not an address").unwrap();

        let before = handler.current_root().cloned();
        handler.list(false).unwrap();
        handler.finish().unwrap();
        assert_eq!(handler.current_root().cloned(), before);
    }

    // -----------------------------------------------------------------------
    // Whole protocol runs
    // -----------------------------------------------------------------------

    #[test]
    fn a_pushed_batch_is_acknowledged_and_advertised_next_run() {
        use crate::dispatcher::Dispatcher;

        let (backend, state, handler) = handler_for(vec![commit()], "", small_config());
        let mut dispatcher = Dispatcher::new(handler, small_config());
        let mut out = Vec::new();
        dispatcher
            .run(
                &b"push refs/heads/master:refs/heads/master\n\n"[..],
                &mut out,
            )
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ok refs/heads/master\n\n");

        // A second run bound to the published root lists what was pushed.
        let root = dispatcher.into_handler().current_root().unwrap().clone();
        let repo = Arc::new(FakeRepo::with_branch(
            "refs/heads/master",
            GitOid::from_bytes(&commit()),
        ));
        let engine = Arc::new(FakeEngine::new(backend.clone(), vec![commit()]));
        let handler = DagHandler::new(
            backend,
            repo,
            engine,
            state,
            small_config(),
            root.to_string(),
        );
        let mut dispatcher = Dispatcher::new(handler, small_config());
        let mut out = Vec::new();
        dispatcher.run(&b"list\n\n"[..], &mut out).unwrap();

        let tip = GitOid::from_bytes(&commit());
        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains(&format!("{tip} refs/heads/master\n")));
    }
}
