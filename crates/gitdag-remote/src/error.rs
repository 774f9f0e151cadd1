use gitdag_backend::BackendError;
use gitdag_state::StateError;
use gitdag_types::{ContentAddress, TypeError};
use thiserror::Error;

/// Errors produced by the bridge core.
///
/// Protocol and integrity errors are always fatal to the run. Absence is
/// never an error here: missing links surface as zero-hash placeholders and
/// unprovided blocks as `Ok(None)` from the tracker.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("received unknown command {0:?}")]
    UnknownCommand(String),

    #[error("malformed command {line:?}: {reason}")]
    MalformedCommand { line: String, reason: String },

    #[error("handler used before initialization")]
    NotInitialized,

    #[error("repository error: {0}")]
    Repo(String),

    #[error("transfer engine error: {0}")]
    Engine(String),

    #[error("ref {name:?} is not valid UTF-8")]
    RefNotUtf8 { name: String },

    #[error("unexpected address for provided block: {computed} != {requested}")]
    IntegrityMismatch {
        requested: ContentAddress,
        computed: ContentAddress,
    },

    #[error("corrupt state entry {key:?}: {reason}")]
    CorruptState { key: String, reason: String },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for bridge operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
