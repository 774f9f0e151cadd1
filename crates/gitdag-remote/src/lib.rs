//! Protocol front end of the gitdag bridge.
//!
//! [`Dispatcher`] speaks the line protocol with the client over any
//! reader/writer pair; [`DagHandler`] carries the commands out against a
//! [`gitdag_backend::DagBackend`]. The [`LocalRepo`] and [`TransferEngine`]
//! traits are the seams the git side plugs into, which keeps everything in
//! this crate drivable by in-memory fakes.

pub mod command;
pub mod config;
pub mod dag;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod lobj;
pub mod resolver;
pub mod traits;
pub mod types;

pub use command::{Command, DEFAULT_CAPABILITIES};
pub use config::RemoteConfig;
pub use dag::DagHandler;
pub use dispatcher::Dispatcher;
pub use error::{RemoteError, RemoteResult};
pub use handler::RemoteHandler;
pub use lobj::LargeObjectTracker;
pub use resolver::RefResolver;
pub use traits::{BlockProvider, LocalRepo, TransferEngine, WriteHook};
pub use types::{RefEntry, RefTarget};
