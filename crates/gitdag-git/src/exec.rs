use std::io::Write;
use std::process::{Command, Stdio};

use gitdag_remote::{RemoteError, RemoteResult};
use tracing::debug;

/// Run a git command, capturing stdout. A nonzero exit is an error
/// carrying git's stderr.
pub(crate) fn run_git(args: &[&str]) -> RemoteResult<Vec<u8>> {
    debug!(?args, "running git");
    let output = Command::new("git").args(args).output()?;
    if !output.status.success() {
        return Err(command_failed(args, &output.stderr));
    }
    Ok(output.stdout)
}

/// Run a git command feeding `input` on stdin.
pub(crate) fn run_git_with_input(args: &[&str], input: &[u8]) -> RemoteResult<Vec<u8>> {
    debug!(?args, bytes = input.len(), "running git with input");
    let mut child = Command::new("git")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input)?;
    }
    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(command_failed(args, &output.stderr));
    }
    Ok(output.stdout)
}

/// Whether a git command exits zero, with all output swallowed.
pub(crate) fn git_succeeds(args: &[&str]) -> RemoteResult<bool> {
    let output = Command::new("git").args(args).output()?;
    Ok(output.status.success())
}

fn command_failed(args: &[&str], stderr: &[u8]) -> RemoteError {
    RemoteError::Repo(format!(
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(stderr).trim()
    ))
}
