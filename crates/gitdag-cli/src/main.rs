//! The `git-remote-dag` helper binary.
//!
//! git invokes it as `git-remote-dag <remote> <url>` for remotes with
//! `dag://<root-address>` URLs (a bare `dag://` names a remote that does
//! not exist yet) and speaks the remote-helper line protocol over
//! stdin/stdout. Diagnostics go to stderr so the protocol stream stays
//! clean; after a push the handler logs the new root address, which is
//! what the remote URL has to point at next time.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use gitdag_backend::FsDagBackend;
use gitdag_git::{GitCliEngine, GitCliRepo};
use gitdag_remote::{DagHandler, Dispatcher, RemoteConfig};
use gitdag_state::FileStateStore;

#[derive(Debug, Parser)]
#[command(name = "git-remote-dag", version)]
struct Args {
    /// Remote name, or the URL again for anonymous remotes.
    remote: String,

    /// Remote URL, `dag://<root-address>`.
    url: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    debug!(remote = args.remote.as_str(), url = args.url.as_str(), "helper starting");

    let address = parse_remote_url(&args.url)?;
    let data_dir = data_dir();

    let backend = Arc::new(
        FsDagBackend::open(data_dir.join("nodes")).context("cannot open the node store")?,
    );
    let state_path = data_dir
        .join("state")
        .join(format!("{}.json", state_file_name(&args.remote)));
    let state =
        Arc::new(FileStateStore::open(state_path).context("cannot open the state store")?);
    let repo = Arc::new(GitCliRepo::open().context("cannot open the local repository")?);
    let engine = Arc::new(GitCliEngine::new(backend.clone()));

    let config = config_from_env();
    let handler = DagHandler::new(backend, repo, engine, state, config.clone(), address);
    let mut dispatcher = Dispatcher::new(handler, config);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    dispatcher.run(stdin.lock(), stdout.lock())?;
    Ok(())
}

/// Accepts `dag://<address>`, `dag:<address>`, and the bare `<address>`
/// git passes when the remote was added in the `dag::<address>` form. The
/// address part may be empty for a brand-new remote.
fn parse_remote_url(url: &str) -> Result<String> {
    let rest = url
        .strip_prefix("dag://")
        .or_else(|| url.strip_prefix("dag:"))
        .unwrap_or(url);
    anyhow::ensure!(
        !rest.contains("://"),
        "unsupported URL {url:?}: expected dag://<address>"
    );
    Ok(rest.trim_matches('/').to_string())
}

/// Where the shared node and state stores live: `GITDAG_PATH` when set,
/// `~/.gitdag` otherwise.
fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("GITDAG_PATH") {
        return PathBuf::from(dir);
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".gitdag"),
        Err(_) => PathBuf::from(".gitdag"),
    }
}

fn config_from_env() -> RemoteConfig {
    let mut config = RemoteConfig::default();
    if let Ok(raw) = std::env::var("GITDAG_LARGE_OBJECT_THRESHOLD") {
        match raw.parse() {
            Ok(threshold) => config.large_object_threshold = threshold,
            Err(_) => warn!(
                value = raw.as_str(),
                "ignoring unparsable GITDAG_LARGE_OBJECT_THRESHOLD"
            ),
        }
    }
    config
}

/// Remote names can be URLs; keep the state file name flat and safe.
fn state_file_name(remote: &str) -> String {
    remote
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scheme_and_address() {
        let addr = parse_remote_url("dag://f0170011417cafe").unwrap();
        assert_eq!(addr, "f0170011417cafe");
    }

    #[test]
    fn parses_the_short_scheme_form() {
        let addr = parse_remote_url("dag:f0170011417cafe").unwrap();
        assert_eq!(addr, "f0170011417cafe");
    }

    #[test]
    fn a_bare_scheme_means_a_new_remote() {
        assert_eq!(parse_remote_url("dag://").unwrap(), "");
    }

    #[test]
    fn a_bare_address_is_taken_as_is() {
        let addr = parse_remote_url("f0170011417cafe").unwrap();
        assert_eq!(addr, "f0170011417cafe");
    }

    #[test]
    fn trailing_slashes_are_dropped() {
        assert_eq!(parse_remote_url("dag://abc/").unwrap(), "abc");
    }

    #[test]
    fn foreign_schemes_are_rejected() {
        assert!(parse_remote_url("https://example.com/repo").is_err());
    }

    #[test]
    fn state_file_names_stay_flat() {
        assert_eq!(state_file_name("origin"), "origin");
        assert_eq!(state_file_name("dag://abc/def"), "dag___abc_def");
    }
}
