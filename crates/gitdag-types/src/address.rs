use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;
use crate::oid::GitOid;

const ADDRESS_VERSION: u8 = 0x01;
const MULTIBASE_HEX: char = 'f';

/// Payload format tag carried inside a [`ContentAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Codec {
    /// A git object in its canonical encoding.
    GitRaw,
    /// Raw bytes with no further structure (externalized large objects).
    Raw,
    /// A directory node in the canonical link-list encoding.
    Directory,
}

impl Codec {
    pub const fn code(self) -> u8 {
        match self {
            Codec::GitRaw => 0x78,
            Codec::Raw => 0x55,
            Codec::Directory => 0x70,
        }
    }

    fn from_code(code: u8) -> Result<Self, TypeError> {
        match code {
            0x78 => Ok(Codec::GitRaw),
            0x55 => Ok(Codec::Raw),
            0x70 => Ok(Codec::Directory),
            other => Err(TypeError::UnknownCodec(other)),
        }
    }
}

/// Hash function tag carried inside a [`ContentAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgo {
    Sha1,
    Blake3,
}

impl HashAlgo {
    pub const fn code(self) -> u8 {
        match self {
            HashAlgo::Sha1 => 0x11,
            HashAlgo::Blake3 => 0x1e,
        }
    }

    pub const fn digest_len(self) -> usize {
        match self {
            HashAlgo::Sha1 => 20,
            HashAlgo::Blake3 => 32,
        }
    }

    fn from_code(code: u8) -> Result<Self, TypeError> {
        match code {
            0x11 => Ok(HashAlgo::Sha1),
            0x1e => Ok(HashAlgo::Blake3),
            other => Err(TypeError::UnknownHashAlgo(other)),
        }
    }
}

/// Self-describing address of a node stored in the backend.
///
/// Rendered form: a lowercase-hex multibase string (prefix `f`) over the
/// byte sequence `[version, codec, hash-algorithm, digest-length, digest]`.
/// The codec tag distinguishes git objects from raw payloads and directory
/// nodes sharing one backend, and the hash tag makes every address
/// re-derivable from the content it names.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentAddress {
    codec: Codec,
    algo: HashAlgo,
    digest: Vec<u8>,
}

impl ContentAddress {
    /// Address of a git object, from its object id. Lossless: the digest is
    /// the oid itself, never re-hashed.
    pub fn from_oid(oid: &GitOid) -> Self {
        Self {
            codec: Codec::GitRaw,
            algo: HashAlgo::Sha1,
            digest: oid.as_bytes().to_vec(),
        }
    }

    /// Recover the git object id from a git object address.
    pub fn to_oid(&self) -> Result<GitOid, TypeError> {
        if self.codec != Codec::GitRaw || self.algo != HashAlgo::Sha1 {
            return Err(TypeError::NotAGitAddress(self.to_string()));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&self.digest);
        Ok(GitOid::from_hash(arr))
    }

    /// Address of a raw payload (externalized large-object content).
    pub fn for_raw(data: &[u8]) -> Self {
        Self {
            codec: Codec::Raw,
            algo: HashAlgo::Blake3,
            digest: blake3::hash(data).as_bytes().to_vec(),
        }
    }

    /// Address of a directory node, from its canonical encoding.
    pub fn for_directory(encoded: &[u8]) -> Self {
        Self {
            codec: Codec::Directory,
            algo: HashAlgo::Blake3,
            digest: blake3::hash(encoded).as_bytes().to_vec(),
        }
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn hash_algo(&self) -> HashAlgo {
        self.algo
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// The undecorated byte sequence the rendered form encodes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + self.digest.len());
        bytes.push(ADDRESS_VERSION);
        bytes.push(self.codec.code());
        bytes.push(self.algo.code());
        bytes.push(self.digest.len() as u8);
        bytes.extend_from_slice(&self.digest);
        bytes
    }

    /// Parse a rendered address. Fails with a [`TypeError`] on anything not
    /// produced by the encoder: wrong multibase prefix, non-hex payload,
    /// truncation, unknown version, codec, or hash tags, or a digest whose
    /// length does not match its declaration.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let mut chars = s.chars();
        let base = chars.next().ok_or(TypeError::EmptyAddress)?;
        if base != MULTIBASE_HEX {
            return Err(TypeError::UnsupportedBase(base));
        }
        let bytes =
            hex::decode(chars.as_str()).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() < 4 {
            return Err(TypeError::Truncated(bytes.len()));
        }
        if bytes[0] != ADDRESS_VERSION {
            return Err(TypeError::UnsupportedVersion(bytes[0]));
        }
        let codec = Codec::from_code(bytes[1])?;
        let algo = HashAlgo::from_code(bytes[2])?;
        let declared = bytes[3] as usize;
        if declared != algo.digest_len() {
            return Err(TypeError::DigestLength {
                declared,
                actual: algo.digest_len(),
            });
        }
        let digest = &bytes[4..];
        if digest.len() != declared {
            return Err(TypeError::DigestLength {
                declared,
                actual: digest.len(),
            });
        }
        Ok(Self {
            codec,
            algo,
            digest: digest.to_vec(),
        })
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", MULTIBASE_HEX, hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentAddress({self})")
    }
}

impl FromStr for ContentAddress {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ContentAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}
