use gitdag_types::{ContentAddress, GitOid};
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, BackendResult};

/// How a listed link should be interpreted by a walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// The target is a directory node; walkers recurse into it.
    Directory,
    /// The target is a file node with readable content.
    File,
    /// Untyped: the target is a raw object, or an address the backend holds
    /// no node record for. Walkers treat it as a direct object reference.
    Node,
}

/// One entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DagLink {
    pub name: String,
    pub kind: LinkKind,
    pub addr: ContentAddress,
}

/// A named child inside a stored directory node. Kept sorted by name so a
/// directory's canonical encoding, and therefore its address, is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub addr: ContentAddress,
}

/// A stored node. The backend is a map from [`ContentAddress`] to `DagNode`;
/// every variant's address is re-derivable from its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DagNode {
    /// An ordered list of named links.
    Directory(Vec<DirEntry>),
    /// Raw file content (ref files, externalized payloads).
    File(Vec<u8>),
    /// A git object in its canonical encoding, addressed by its git id.
    Object(Vec<u8>),
}

impl DagNode {
    /// The canonical byte encoding of a directory's entry list.
    pub fn encode_directory(entries: &[DirEntry]) -> BackendResult<Vec<u8>> {
        serde_json::to_vec(entries).map_err(|e| BackendError::Encoding(e.to_string()))
    }

    /// The address this node is stored under.
    pub fn address(&self) -> BackendResult<ContentAddress> {
        match self {
            DagNode::Directory(entries) => {
                let encoded = Self::encode_directory(entries)?;
                Ok(ContentAddress::for_directory(&encoded))
            }
            DagNode::File(data) => Ok(ContentAddress::for_raw(data)),
            DagNode::Object(data) => Ok(ContentAddress::from_oid(&GitOid::from_bytes(data))),
        }
    }

    /// The [`LinkKind`] a link pointing at this node carries in listings.
    pub fn link_kind(&self) -> LinkKind {
        match self {
            DagNode::Directory(_) => LinkKind::Directory,
            DagNode::File(_) => LinkKind::File,
            DagNode::Object(_) => LinkKind::Node,
        }
    }
}

/// Insert or replace `name` in a sorted entry list, keeping it sorted.
pub(crate) fn upsert_entry(entries: &mut Vec<DirEntry>, name: &str, addr: ContentAddress) {
    match entries.binary_search_by(|e| e.name.as_str().cmp(name)) {
        Ok(i) => entries[i].addr = addr,
        Err(i) => entries.insert(
            i,
            DirEntry {
                name: name.to_string(),
                addr,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_address_is_order_independent_after_upsert() {
        let a = ContentAddress::for_raw(b"a");
        let b = ContentAddress::for_raw(b"b");

        let mut first = Vec::new();
        upsert_entry(&mut first, "beta", b.clone());
        upsert_entry(&mut first, "alpha", a.clone());

        let mut second = Vec::new();
        upsert_entry(&mut second, "alpha", a);
        upsert_entry(&mut second, "beta", b);

        assert_eq!(first, second);
        assert_eq!(
            DagNode::Directory(first).address().unwrap(),
            DagNode::Directory(second).address().unwrap()
        );
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut entries = Vec::new();
        upsert_entry(&mut entries, "x", ContentAddress::for_raw(b"1"));
        upsert_entry(&mut entries, "x", ContentAddress::for_raw(b"2"));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].addr, ContentAddress::for_raw(b"2"));
    }

    #[test]
    fn object_node_is_addressed_by_git_id() {
        let data = b"blob 5\0hello".to_vec();
        let node = DagNode::Object(data.clone());
        let addr = node.address().unwrap();
        assert_eq!(addr.to_oid().unwrap(), GitOid::from_bytes(&data));
    }

    #[test]
    fn link_kinds_follow_variants() {
        assert_eq!(
            DagNode::Directory(Vec::new()).link_kind(),
            LinkKind::Directory
        );
        assert_eq!(DagNode::File(Vec::new()).link_kind(), LinkKind::File);
        assert_eq!(DagNode::Object(Vec::new()).link_kind(), LinkKind::Node);
    }
}
