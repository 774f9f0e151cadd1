//! Merkle-DAG storage backends for gitdag.
//!
//! A backend is a content-addressed node store with named links: directories
//! hold ordered `name -> address` entries, files hold raw content, and git
//! objects are stored under their own object ids. The [`DagBackend`] trait is
//! the seam the bridge drives; [`InMemoryDagBackend`] backs tests and
//! [`FsDagBackend`] backs single-host remotes shared between helper runs.
//!
//! Roots are persistent trees: [`DagBackend::patch_link`] derives a new root
//! from an old one without touching any existing node, so every historical
//! root stays readable.

pub mod error;
pub mod fs;
pub mod memory;
pub mod node;
pub mod path;
pub mod traits;

pub use error::{BackendError, BackendResult};
pub use fs::FsDagBackend;
pub use memory::InMemoryDagBackend;
pub use node::{DagLink, DagNode, DirEntry, LinkKind};
pub use path::{abs_path, parse_path, split_segments, PATH_SCHEME};
pub use traits::DagBackend;
