use gitdag_types::{ContentAddress, TypeError};
use thiserror::Error;

/// Errors produced by backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("no link named {name:?} under {path}")]
    NoLink { name: String, path: String },

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("no node stored at {0}")]
    UnknownAddress(ContentAddress),

    #[error("malformed path {0:?}")]
    MalformedPath(String),

    #[error("node encoding error: {0}")]
    Encoding(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Whether this error means "the link does not exist" rather than a real
    /// failure. Callers that treat absence as empty must check this, never
    /// match error text themselves.
    ///
    /// Transport errors are matched against the phrasings older servers send
    /// for the same condition; that fragile comparison is confined to here.
    pub fn is_no_link(&self) -> bool {
        match self {
            BackendError::NoLink { .. } => true,
            BackendError::Transport(msg) => {
                msg.contains("no link named") || msg.contains("no link by that name")
            }
            _ => false,
        }
    }
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
