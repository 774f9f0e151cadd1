use gitdag_types::ContentAddress;

use crate::error::{BackendError, BackendResult};

/// Scheme segment of an absolute backend path.
pub const PATH_SCHEME: &str = "dag";

/// Split an absolute path into its root address and relative segments.
///
/// Accepted forms: `/dag/<address>/sub/path`, `dag/<address>`, and the bare
/// `<address>/sub/path`. Repeated and trailing slashes are tolerated.
pub fn parse_path(path: &str) -> BackendResult<(ContentAddress, Vec<String>)> {
    let mut parts = path.split('/').filter(|s| !s.is_empty()).peekable();
    if parts.peek() == Some(&PATH_SCHEME) {
        parts.next();
    }
    let head = parts
        .next()
        .ok_or_else(|| BackendError::MalformedPath(path.to_string()))?;
    let addr = ContentAddress::parse(head)?;
    Ok((addr, parts.map(str::to_string).collect()))
}

/// Render an absolute path rooted at `root`. An empty `rest` yields the
/// root itself.
pub fn abs_path(root: &ContentAddress, rest: &str) -> String {
    if rest.is_empty() {
        format!("/{PATH_SCHEME}/{root}")
    } else {
        format!("/{PATH_SCHEME}/{root}/{rest}")
    }
}

/// Split a root-relative link path into its segments.
pub fn split_segments(path: &str) -> BackendResult<Vec<String>> {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if segments.is_empty() {
        return Err(BackendError::MalformedPath(path.to_string()));
    }
    Ok(segments)
}
