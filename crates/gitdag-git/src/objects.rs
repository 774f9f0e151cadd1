use gitdag_remote::{RemoteError, RemoteResult};
use gitdag_types::GitOid;
use tracing::debug;

/// The four git object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "commit" => Some(ObjectKind::Commit),
            "tree" => Some(ObjectKind::Tree),
            "blob" => Some(ObjectKind::Blob),
            "tag" => Some(ObjectKind::Tag),
            _ => None,
        }
    }
}

fn malformed(message: &str) -> RemoteError {
    RemoteError::Engine(format!("malformed object: {message}"))
}

/// Wrap `content` in the `<kind> <len>\0` framing git hashes and stores.
pub fn frame(kind: ObjectKind, content: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(content.len() + 16);
    data.extend_from_slice(kind.as_str().as_bytes());
    data.push(b' ');
    data.extend_from_slice(content.len().to_string().as_bytes());
    data.push(0);
    data.extend_from_slice(content);
    data
}

/// Split framed object data into its kind and bare content.
pub fn split_header(data: &[u8]) -> RemoteResult<(ObjectKind, &[u8])> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| malformed("missing NUL in header"))?;
    let header =
        std::str::from_utf8(&data[..nul]).map_err(|_| malformed("header is not utf-8"))?;
    let (kind, _len) = header
        .split_once(' ')
        .ok_or_else(|| malformed("missing space in header"))?;
    let kind = ObjectKind::parse(kind)
        .ok_or_else(|| malformed(&format!("unknown object kind {kind:?}")))?;
    Ok((kind, &data[nul + 1..]))
}

/// The object ids `content` refers to, in header order.
pub fn referenced_oids(kind: ObjectKind, content: &[u8]) -> RemoteResult<Vec<GitOid>> {
    match kind {
        ObjectKind::Blob => Ok(Vec::new()),
        ObjectKind::Tree => tree_children(content),
        ObjectKind::Commit => commit_children(content),
        ObjectKind::Tag => tag_target(content),
    }
}

/// Tree format: a run of `<octal mode> <name>\0<20 raw bytes>` entries.
fn tree_children(content: &[u8]) -> RemoteResult<Vec<GitOid>> {
    let mut oids = Vec::new();
    let mut pos = 0;
    while pos < content.len() {
        let space = content[pos..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| malformed("tree entry missing space after mode"))?;
        let mode = std::str::from_utf8(&content[pos..pos + space])
            .ok()
            .and_then(|s| u32::from_str_radix(s, 8).ok())
            .ok_or_else(|| malformed("tree entry has a bad mode"))?;
        pos += space + 1;

        let nul = content[pos..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| malformed("tree entry missing NUL after name"))?;
        pos += nul + 1;

        if pos + 20 > content.len() {
            return Err(malformed("tree entry truncated"));
        }
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&content[pos..pos + 20]);
        pos += 20;

        // Gitlinks name commits of other repositories; there is nothing to
        // transfer for them.
        if mode == 0o160000 {
            debug!(oid = %GitOid::from(raw), "skipping gitlink entry");
            continue;
        }
        oids.push(GitOid::from(raw));
    }
    Ok(oids)
}

/// Commit header: a `tree` line, then zero or more `parent` lines.
fn commit_children(content: &[u8]) -> RemoteResult<Vec<GitOid>> {
    let mut lines = content.split(|&b| b == b'\n');
    let tree = lines
        .next()
        .and_then(|l| l.strip_prefix(b"tree "))
        .ok_or_else(|| malformed("commit missing tree line"))?;
    let mut oids = vec![oid_field(tree)?];
    for line in lines {
        match line.strip_prefix(b"parent ") {
            Some(parent) => oids.push(oid_field(parent)?),
            None => break,
        }
    }
    Ok(oids)
}

fn tag_target(content: &[u8]) -> RemoteResult<Vec<GitOid>> {
    let first = content.split(|&b| b == b'\n').next().unwrap_or_default();
    let target = first
        .strip_prefix(b"object ")
        .ok_or_else(|| malformed("tag missing object line"))?;
    Ok(vec![oid_field(target)?])
}

fn oid_field(field: &[u8]) -> RemoteResult<GitOid> {
    let hex = std::str::from_utf8(field).map_err(|_| malformed("object id is not utf-8"))?;
    GitOid::from_hex(hex).map_err(|e| malformed(&format!("bad object id {hex:?}: {e}")))
}
