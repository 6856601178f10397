//! Filesystem side of the engine
//!
//! Walks a tracked root and computes content digests for what it finds.

pub mod hasher;
pub mod path;
pub mod walker;

pub use hasher::{ContentHasher, HashAlgorithm};
pub use walker::{ScannedEntry, Walker, WalkerConfig};
