//! Shared utilities.
//!
//! Hashing for download verification, glob-driven file discovery and test helpers.

pub mod hash;
pub mod walk;

#[cfg(test)]
pub mod testutil;
