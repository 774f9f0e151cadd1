use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::TypeError;

/// Hex width of a rendered [`GitOid`].
pub const OID_HEX_LEN: usize = 40;

/// A git object identifier.
///
/// A `GitOid` is the SHA-1 hash of a git object's canonical encoding
/// (`<type> <len>\0<content>`). Identical objects always produce the same
/// `GitOid`, which is what makes them addressable across repositories.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GitOid([u8; 20]);

impl GitOid {
    /// Compute a `GitOid` from a canonically encoded object.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create a `GitOid` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// The zero object ID (all zeros). The protocol uses it as the sentinel
    /// for "ref absent" and "nothing to fetch".
    pub const fn zero() -> Self {
        Self([0u8; 20])
    }

    /// Returns `true` if this is the zero object ID.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The raw 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a 40-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(TypeError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GitOid({})", self.short_hex())
    }
}

impl fmt::Display for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 20]> for GitOid {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<GitOid> for [u8; 20] {
    fn from(id: GitOid) -> Self {
        id.0
    }
}
