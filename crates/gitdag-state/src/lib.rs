//! Local persistent state for gitdag.
//!
//! A remote helper process is short-lived; anything it must remember between
//! runs goes through the [`StateStore`] trait: which hash a ref was last
//! seen at, and where externalized large objects live. [`FileStateStore`]
//! persists one JSON map per remote; [`InMemoryStateStore`] backs tests.

pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use error::{StateError, StateResult};
pub use file::FileStateStore;
pub use memory::InMemoryStateStore;
pub use traits::StateStore;
