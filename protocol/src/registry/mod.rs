//! # Runtime Type Registry
//!
//! Maps a storage path to the shape needed to decode its bytes. The core
//! never hardcodes what a storage item contains; callers either decode into
//! a static Rust type or hand in a registry.
//!
//! ```text
//! shape.rs  - TypeShape and its textual grammar
//! value.rs  - dynamic Value, shape-driven decode/encode
//! mod.rs    - TypeRegistry trait and the in-memory registry
//! ```
//!
//! ## Registry files
//!
//! [`InMemoryTypeRegistry::from_json`] loads a JSON object keyed by
//! `"Module.Item"`:
//!
//! ```json
//! {
//!   "System.Number": { "value": "u32" },
//!   "System.Account": {
//!     "hashers": ["blake3_128_concat"],
//!     "value": "{nonce: u32, free: u128, reserved: u128}"
//!   }
//! }
//! ```

pub mod shape;
pub mod value;

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::crypto::StorageHasher;
use crate::storage::StoragePath;

pub use shape::{FieldShape, ShapeParseError, TypeShape, VariantShape};
pub use value::{ShapedValue, Value};

/// Supplies decode shapes for storage paths.
pub trait TypeRegistry: Send + Sync {
    /// The value shape registered for `path`, if any.
    fn shape(&self, path: &StoragePath) -> Option<&TypeShape>;
}

/// Errors raised while loading a registry file.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("malformed registry document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid storage path '{0}': expected Module.Item")]
    InvalidPath(String),

    #[error("invalid shape for {path}: {source}")]
    Shape {
        path: String,
        #[source]
        source: ShapeParseError,
    },
}

/// A registered storage item: its path (with hashers) and value shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    pub path: StoragePath,
    pub shape: TypeShape,
}

#[derive(Debug, Deserialize)]
struct EntryDocument {
    #[serde(default)]
    hashers: Vec<StorageHasher>,
    value: String,
}

/// A registry held entirely in memory, keyed by `"Module.Item"`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTypeRegistry {
    entries: BTreeMap<String, StorageEntry>,
}

impl InMemoryTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the shape for `path`.
    pub fn register(&mut self, path: StoragePath, shape: TypeShape) {
        self.entries
            .insert(path.name(), StorageEntry { path, shape });
    }

    /// Looks up an entry by its `"Module.Item"` name.
    pub fn entry(&self, name: &str) -> Option<&StorageEntry> {
        self.entries.get(name)
    }

    /// Iterates entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = &StorageEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a registry document (see the module docs for the format).
    pub fn from_json(document: &str) -> Result<Self, RegistryError> {
        let raw: BTreeMap<String, EntryDocument> = serde_json::from_str(document)?;
        let mut registry = Self::new();
        for (name, entry) in raw {
            let path = name
                .parse::<StoragePath>()
                .map_err(|_| RegistryError::InvalidPath(name.clone()))?
                .with_hashers(entry.hashers);
            let shape = entry
                .value
                .parse::<TypeShape>()
                .map_err(|source| RegistryError::Shape {
                    path: name.clone(),
                    source,
                })?;
            registry.register(path, shape);
        }
        Ok(registry)
    }
}

impl TypeRegistry for InMemoryTypeRegistry {
    fn shape(&self, path: &StoragePath) -> Option<&TypeShape> {
        self.entries.get(&path.name()).map(|entry| &entry.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "System.Number": { "value": "u32" },
        "System.Account": {
            "hashers": ["blake3_128_concat"],
            "value": "{nonce: u32, free: u128}"
        }
    }"#;

    #[test]
    fn loads_document() {
        let registry = InMemoryTypeRegistry::from_json(DOCUMENT).unwrap();
        assert_eq!(registry.len(), 2);

        let account = registry.entry("System.Account").unwrap();
        assert_eq!(account.path.hashers(), &[StorageHasher::Blake3_128Concat]);
        assert!(matches!(account.shape, TypeShape::Composite(_)));

        let number = StoragePath::new("System", "Number");
        assert_eq!(registry.shape(&number), Some(&TypeShape::U32));
    }

    #[test]
    fn unknown_path_has_no_shape() {
        let registry = InMemoryTypeRegistry::from_json(DOCUMENT).unwrap();
        assert!(registry.shape(&StoragePath::new("Balances", "Locks")).is_none());
    }

    #[test]
    fn rejects_bad_shape_and_bad_path() {
        let err = InMemoryTypeRegistry::from_json(r#"{"A.B": {"value": "u7"}}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Shape { ref path, .. } if path == "A.B"));

        let err = InMemoryTypeRegistry::from_json(r#"{"NoDot": {"value": "u8"}}"#).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPath(_)));
    }
}
