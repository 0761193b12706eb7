//! Caller-facing query results.
//!
//! A [`StorageResponse`] pairs a key with what the node returned for it and
//! with the outcome of decoding that value. The fields are private so the
//! one invariant holds: no raw value, no decoded value.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::key::StorageKey;
use crate::codec::{CodecError, CodecResult};

/// Result for one requested key.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageResponse<T> {
    key: StorageKey,
    raw_value: Option<Vec<u8>>,
    decoded: Option<CodecResult<T>>,
}

impl<T> StorageResponse<T> {
    /// A key the node holds no value for.
    pub fn empty(key: StorageKey) -> Self {
        Self {
            key,
            raw_value: None,
            decoded: None,
        }
    }

    /// Builds a response, decoding `raw_value` with `decode` if present.
    pub fn from_raw(
        key: StorageKey,
        raw_value: Option<Vec<u8>>,
        decode: impl FnOnce(&StorageKey, &[u8]) -> CodecResult<T>,
    ) -> Self {
        let decoded = raw_value.as_deref().map(|raw| decode(&key, raw));
        Self {
            key,
            raw_value,
            decoded,
        }
    }

    pub fn key(&self) -> &StorageKey {
        &self.key
    }

    pub fn raw_value(&self) -> Option<&[u8]> {
        self.raw_value.as_deref()
    }

    /// The decoded value, if the key had a value and it decoded cleanly.
    pub fn decoded_value(&self) -> Option<&T> {
        self.decoded.as_ref().and_then(|result| result.as_ref().ok())
    }

    /// The decode failure for this key, if any.
    pub fn decode_error(&self) -> Option<&CodecError> {
        self.decoded.as_ref().and_then(|result| result.as_ref().err())
    }

    pub fn into_value(self) -> Option<T> {
        self.decoded.and_then(Result::ok)
    }

    pub fn into_parts(self) -> (StorageKey, Option<Vec<u8>>, Option<CodecResult<T>>) {
        (self.key, self.raw_value, self.decoded)
    }
}

impl<T: Serialize> Serialize for StorageResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("StorageResponse", 4)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("raw", &self.raw_value.as_deref().map(super::hex::to_hex))?;
        state.serialize_field("value", &self.decoded_value())?;
        state.serialize_field("error", &self.decode_error().map(ToString::to_string))?;
        state.end()
    }
}

/// Result for one key inside a child trie.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildStorageResponse<T> {
    child_key: StorageKey,
    response: StorageResponse<T>,
}

impl<T> ChildStorageResponse<T> {
    pub fn new(child_key: StorageKey, response: StorageResponse<T>) -> Self {
        Self {
            child_key,
            response,
        }
    }

    pub fn child_key(&self) -> &StorageKey {
        &self.child_key
    }

    pub fn key(&self) -> &StorageKey {
        self.response.key()
    }

    pub fn raw_value(&self) -> Option<&[u8]> {
        self.response.raw_value()
    }

    pub fn decoded_value(&self) -> Option<&T> {
        self.response.decoded_value()
    }

    pub fn decode_error(&self) -> Option<&CodecError> {
        self.response.decode_error()
    }

    pub fn into_response(self) -> StorageResponse<T> {
        self.response
    }
}

impl<T: Serialize> Serialize for ChildStorageResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChildStorageResponse", 5)?;
        state.serialize_field("child_key", &self.child_key)?;
        state.serialize_field("key", self.response.key())?;
        state.serialize_field("raw", &self.raw_value().map(super::hex::to_hex))?;
        state.serialize_field("value", &self.decoded_value())?;
        state.serialize_field("error", &self.decode_error().map(ToString::to_string))?;
        state.end()
    }
}
