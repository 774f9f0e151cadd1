use thiserror::Error;

/// Errors produced by identifier parsing and translation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("empty content address")]
    EmptyAddress,

    #[error("unsupported multibase prefix {0:?}")]
    UnsupportedBase(char),

    #[error("content address too short: {0} bytes")]
    Truncated(usize),

    #[error("unsupported address version {0:#04x}")]
    UnsupportedVersion(u8),

    #[error("unknown codec {0:#04x}")]
    UnknownCodec(u8),

    #[error("unknown hash algorithm {0:#04x}")]
    UnknownHashAlgo(u8),

    #[error("digest length mismatch: declared {declared}, got {actual}")]
    DigestLength { declared: usize, actual: usize },

    #[error("not a git object address: {0}")]
    NotAGitAddress(String),
}
