//! # Storage Keys, Updates and Responses
//!
//! The data model of the access layer.
//!
//! ```text
//! key.rs       - StorageKey, StoragePath, StorageKeyFactory
//! update.rs    - StorageUpdate / StorageChange as returned by the node
//! response.rs  - StorageResponse / ChildStorageResponse handed to callers
//! hex.rs       - 0x-hex helpers for the JSON wire
//! ```
//!
//! Everything here is created per call and dropped once the caller has its
//! responses. Nothing is cached across queries.

pub mod hex;
pub mod key;
pub mod response;
pub mod update;

pub use key::{KeyError, StorageKey, StorageKeyFactory, StoragePath};
pub use response::{ChildStorageResponse, StorageResponse};
pub use update::{BlockHash, BlockHashError, HexBytes, StorageChange, StorageUpdate};
