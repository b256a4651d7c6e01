//! # Utility Functions (`utils`)
//!
//! Filesystem and binary serialization helpers shared by the store operations.

pub(crate) mod fs;
pub(crate) mod serialization;
