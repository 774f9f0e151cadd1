//! Git-side collaborators for the gitdag bridge.
//!
//! Everything here shells out to git plumbing instead of reimplementing
//! repository access: the helper always runs as a child of git with
//! `GIT_DIR` set, so the CLI is both available and already pointed at the
//! right repository. [`objects`] holds the pure object-format parsing the
//! transfer walk needs.

pub mod engine;
mod exec;
pub mod objects;
pub mod repo;

pub use engine::GitCliEngine;
pub use repo::GitCliRepo;
