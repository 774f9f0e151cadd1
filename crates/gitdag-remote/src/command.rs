use gitdag_types::GitOid;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};

/// Capabilities advertised to the client, in protocol order.
pub const DEFAULT_CAPABILITIES: &[&str] = &["list", "push", "fetch"];

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Capabilities,
    List { for_push: bool },
    Push { src: String, dst: String },
    Fetch { oid: GitOid, ref_name: String },
    /// A blank line: flush deferred work and end the batch.
    EndOfBatch,
    /// Anything else. The dispatcher treats it as fatal, never skips it.
    Unknown(String),
}

impl Command {
    /// Parse one protocol line. A trailing newline is tolerated; malformed
    /// arguments to a known verb are an error, unknown verbs are
    /// [`Command::Unknown`].
    pub fn parse(line: &str) -> RemoteResult<Self> {
        let line = line.trim_end_matches(['\n', '\r']);
        match line {
            "" => return Ok(Command::EndOfBatch),
            "capabilities" => return Ok(Command::Capabilities),
            "list" => return Ok(Command::List { for_push: false }),
            "list for-push" => return Ok(Command::List { for_push: true }),
            _ => {}
        }

        if let Some(spec) = line.strip_prefix("push ") {
            // The force marker is accepted and dropped: a link patch always
            // overwrites, so every push already behaves as forced.
            let spec = match spec.strip_prefix('+') {
                Some(rest) => {
                    debug!(spec = rest, "dropping force marker");
                    rest
                }
                None => spec,
            };
            let (src, dst) = spec.split_once(':').ok_or_else(|| {
                RemoteError::MalformedCommand {
                    line: line.to_string(),
                    reason: "expected <src>:<dst>".to_string(),
                }
            })?;
            if src.is_empty() || dst.is_empty() {
                return Err(RemoteError::MalformedCommand {
                    line: line.to_string(),
                    reason: "empty ref name".to_string(),
                });
            }
            return Ok(Command::Push {
                src: src.to_string(),
                dst: dst.to_string(),
            });
        }

        if let Some(rest) = line.strip_prefix("fetch ") {
            let (sha, ref_name) = rest.split_once(' ').ok_or_else(|| {
                RemoteError::MalformedCommand {
                    line: line.to_string(),
                    reason: "expected <sha> <ref>".to_string(),
                }
            })?;
            let oid = GitOid::from_hex(sha).map_err(|e| RemoteError::MalformedCommand {
                line: line.to_string(),
                reason: e.to_string(),
            })?;
            return Ok(Command::Fetch {
                oid,
                ref_name: ref_name.to_string(),
            });
        }

        Ok(Command::Unknown(line.to_string()))
    }
}
