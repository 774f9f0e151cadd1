use std::path::{Path, PathBuf};

use gitdag_remote::{LocalRepo, RemoteError, RemoteResult};
use gitdag_types::GitOid;
use tracing::debug;

use crate::exec::run_git;

/// Local repository access through the git CLI.
///
/// The helper inherits `GIT_DIR` from the git process that spawned it, so
/// every subprocess already runs against the right repository.
#[derive(Debug, Clone)]
pub struct GitCliRepo {
    git_dir: PathBuf,
}

impl GitCliRepo {
    /// Open the repository the environment points at. Fails when no
    /// repository is reachable.
    pub fn open() -> RemoteResult<Self> {
        let out = run_git(&["rev-parse", "--git-dir"])?;
        let git_dir = PathBuf::from(String::from_utf8_lossy(&out).trim());
        debug!(git_dir = %git_dir.display(), "opened repository");
        Ok(Self { git_dir })
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

impl LocalRepo for GitCliRepo {
    fn resolve_ref(&self, name: &str) -> RemoteResult<GitOid> {
        let out = run_git(&["rev-parse", name])?;
        let hex = String::from_utf8_lossy(&out);
        GitOid::from_hex(hex.trim()).map_err(|e| {
            RemoteError::Repo(format!("rev-parse {name} produced {:?}: {e}", hex.trim()))
        })
    }

    fn branches(&self) -> RemoteResult<Vec<String>> {
        let out = run_git(&["for-each-ref", "--format=%(refname)", "refs/heads"])?;
        Ok(String::from_utf8_lossy(&out)
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
