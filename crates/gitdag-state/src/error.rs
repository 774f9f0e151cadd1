//! Error types for state-store operations.

use thiserror::Error;

/// Errors that can occur during state-store operations.
#[derive(Debug, Error)]
pub enum StateError {
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based state operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for state operations.
pub type StateResult<T> = std::result::Result<T, StateError>;
