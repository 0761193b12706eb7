//! # Hashing for Key Derivation
//!
//! Storage keys are built from hashed path names and hashed parameters.
//! This module holds the hash functions and the per-parameter
//! [`StorageHasher`] strategy.

pub mod hash;

pub use hash::{blake3_128, blake3_hash, sha256, StorageHasher};
