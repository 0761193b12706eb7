//! # Storage Keys
//!
//! A storage item lives at a key built from three parts:
//!
//! ```text
//! blake3_128(module) ++ blake3_128(item) ++ hasher_1(param_1) ++ ... ++ hasher_n(param_n)
//! ```
//!
//! The number of parameters is fixed per [`StoragePath`] by its list of
//! hashers: none for a plain value, one for a map, several for an n-ary map.
//! The [`StorageKeyFactory`] builds keys one at a time or in batches; in a
//! batch every entry succeeds or fails on its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::hex::{from_hex, to_hex};
use crate::codec::{decode_prefix, CodecError, Decode, Encode};
use crate::crypto::{blake3_128, StorageHasher};

// ---------------------------------------------------------------------------
// StorageKey
// ---------------------------------------------------------------------------

/// Opaque, immutable storage key bytes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(Vec<u8>);

impl StorageKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.0.starts_with(prefix)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn from_hex(text: &str) -> Result<Self, hex::FromHexError> {
        from_hex(text).map(Self)
    }
}

impl AsRef<[u8]> for StorageKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for StorageKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageKey({})", self.to_hex())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for StorageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        super::hex::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for StorageKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        super::hex::deserialize(deserializer).map(Self)
    }
}

// ---------------------------------------------------------------------------
// StoragePath
// ---------------------------------------------------------------------------

/// Symbolic location of a storage item plus the hasher for each key
/// parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoragePath {
    module: String,
    item: String,
    hashers: Vec<StorageHasher>,
}

impl StoragePath {
    /// A plain value path (no key parameters).
    pub fn new(module: impl Into<String>, item: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            item: item.into(),
            hashers: Vec::new(),
        }
    }

    /// Declares one hasher per key parameter.
    pub fn with_hashers(mut self, hashers: impl Into<Vec<StorageHasher>>) -> Self {
        self.hashers = hashers.into();
        self
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn hashers(&self) -> &[StorageHasher] {
        &self.hashers
    }

    /// `"Module.Item"`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.module, self.item)
    }

    /// The 32-byte prefix shared by every key under this path.
    pub fn prefix(&self) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(32);
        prefix.extend_from_slice(&blake3_128(self.module.as_bytes()));
        prefix.extend_from_slice(&blake3_128(self.item.as_bytes()));
        prefix
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.item)
    }
}

impl FromStr for StoragePath {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((module, item))
                if !module.is_empty() && !item.is_empty() && !item.contains('.') =>
            {
                Ok(Self::new(module, item))
            }
            _ => Err(KeyError::InvalidPath(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a storage key could not be built (or taken apart).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("{path} takes {expected} key parameters, got {got}")]
    ParamCountMismatch {
        path: String,
        expected: usize,
        got: usize,
    },

    #[error("{path}: parameter {position} could not be encoded: {source}")]
    Encoding {
        path: String,
        position: usize,
        #[source]
        source: CodecError,
    },

    #[error("invalid storage path '{0}': expected Module.Item")]
    InvalidPath(String),

    #[error("key {key} is not under {path}")]
    ForeignKey { path: String, key: String },

    #[error("{0:?} does not keep the parameter in the key")]
    NotReversible(StorageHasher),

    #[error("{path}: embedded parameter could not be decoded: {source}")]
    Decoding {
        path: String,
        #[source]
        source: CodecError,
    },
}

// ---------------------------------------------------------------------------
// StorageKeyFactory
// ---------------------------------------------------------------------------

/// Builds storage keys from paths and encoded parameters.
///
/// Stateless; construct one wherever keys are needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageKeyFactory;

impl StorageKeyFactory {
    pub fn new() -> Self {
        Self
    }

    /// Key of a plain value item.
    pub fn value_key(&self, path: &StoragePath) -> Result<StorageKey, KeyError> {
        self.key(path, &[])
    }

    /// Key for one full set of positional parameters.
    pub fn key(&self, path: &StoragePath, params: &[&dyn Encode]) -> Result<StorageKey, KeyError> {
        if params.len() != path.hashers.len() {
            return Err(KeyError::ParamCountMismatch {
                path: path.name(),
                expected: path.hashers.len(),
                got: params.len(),
            });
        }
        self.build(path, params)
    }

    /// Key prefix covering every entry whose leading parameters equal
    /// `params`. With no parameters this is the path prefix itself.
    pub fn partial_key(
        &self,
        path: &StoragePath,
        params: &[&dyn Encode],
    ) -> Result<StorageKey, KeyError> {
        if params.len() > path.hashers.len() {
            return Err(KeyError::ParamCountMismatch {
                path: path.name(),
                expected: path.hashers.len(),
                got: params.len(),
            });
        }
        self.build(path, params)
    }

    /// One key per parameter of a single-parameter map.
    ///
    /// The result lines up with `params`; a parameter that fails to encode
    /// only fails its own entry.
    pub fn map_keys<P: Encode>(
        &self,
        path: &StoragePath,
        params: &[P],
    ) -> Vec<Result<StorageKey, KeyError>> {
        params
            .iter()
            .map(|param| self.key(path, &[param as &dyn Encode]))
            .collect()
    }

    /// One key per parameter group of an n-ary map.
    ///
    /// Each group is a full positional parameter list. Groups are
    /// independent: a bad group yields an error in its slot and nothing else.
    pub fn nmap_keys(
        &self,
        path: &StoragePath,
        groups: &[Vec<&dyn Encode>],
    ) -> Vec<Result<StorageKey, KeyError>> {
        groups.iter().map(|group| self.key(path, group)).collect()
    }

    /// Recovers the first key parameter from a key built with a hasher that
    /// keeps it (`Identity` or a concat hasher).
    pub fn first_param<T: Decode>(
        &self,
        path: &StoragePath,
        key: &StorageKey,
    ) -> Result<T, KeyError> {
        let hasher = *path.hashers.first().ok_or(KeyError::ParamCountMismatch {
            path: path.name(),
            expected: 0,
            got: 1,
        })?;
        let offset = hasher
            .concat_offset()
            .ok_or(KeyError::NotReversible(hasher))?;
        let prefix = path.prefix();
        let rest = key
            .as_bytes()
            .strip_prefix(prefix.as_slice())
            .filter(|rest| rest.len() >= offset)
            .ok_or_else(|| KeyError::ForeignKey {
                path: path.name(),
                key: key.to_hex(),
            })?;
        decode_prefix::<T>(&rest[offset..])
            .map(|(value, _)| value)
            .map_err(|source| KeyError::Decoding {
                path: path.name(),
                source,
            })
    }

    fn build(&self, path: &StoragePath, params: &[&dyn Encode]) -> Result<StorageKey, KeyError> {
        let mut key = path.prefix();
        for (position, (param, hasher)) in params.iter().zip(&path.hashers).enumerate() {
            let encoded = param.encode().map_err(|source| KeyError::Encoding {
                path: path.name(),
                position,
                source,
            })?;
            key.extend_from_slice(&hasher.hash(&encoded));
        }
        Ok(StorageKey(key))
    }
}
