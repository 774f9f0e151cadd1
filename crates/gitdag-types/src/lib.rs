//! Identifier types for gitdag.
//!
//! This crate provides the two naming schemes the bridge translates between
//! and the lossless codec connecting them. Every other gitdag crate depends
//! on `gitdag-types`.
//!
//! # Key Types
//!
//! - [`GitOid`] — Native git object identifier (SHA-1, 20 bytes)
//! - [`ContentAddress`] — Self-describing backend address (multibase-hex
//!   rendering of version, codec, hash tags and digest)
//! - [`Codec`] / [`HashAlgo`] — The tag sets a [`ContentAddress`] carries

pub mod address;
pub mod error;
pub mod oid;

pub use address::{Codec, ContentAddress, HashAlgo};
pub use error::TypeError;
pub use oid::{GitOid, OID_HEX_LEN};
