//! Response decoders: raw value bytes in, typed values out.
//!
//! A decoder sees one item at a time. Whatever it returns, success or
//! error, is stored on that item's [`StorageResponse`](crate::storage::StorageResponse)
//! and never leaks into its neighbours.

use std::fmt;
use std::marker::PhantomData;

use crate::codec::{decode_exact, CodecResult, Decode, Decoder};
use crate::error::{QueryError, QueryResult};
use crate::registry::{TypeRegistry, TypeShape, Value};
use crate::storage::{HexBytes, StorageKey, StoragePath};

/// Turns the raw bytes stored under a key into a value.
///
/// The whole buffer belongs to the value; leftover bytes are an error.
pub trait ResponseDecoder: Send + Sync {
    type Output: Send;

    fn decode(&self, key: &StorageKey, raw: &[u8]) -> CodecResult<Self::Output>;
}

/// Decodes into a statically known type.
pub struct TypedDecoder<T> {
    _target: PhantomData<fn() -> T>,
}

impl<T> TypedDecoder<T> {
    pub fn new() -> Self {
        Self {
            _target: PhantomData,
        }
    }
}

impl<T> Default for TypedDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedDecoder<{}>", std::any::type_name::<T>())
    }
}

impl<T: Decode + Send> ResponseDecoder for TypedDecoder<T> {
    type Output = T;

    fn decode(&self, _key: &StorageKey, raw: &[u8]) -> CodecResult<T> {
        decode_exact(raw)
    }
}

/// Decodes by the shape a type registry declares for a storage path.
#[derive(Debug, Clone)]
pub struct RegistryDecoder {
    path: StoragePath,
    shape: TypeShape,
}

impl RegistryDecoder {
    pub fn new(path: StoragePath, shape: TypeShape) -> Self {
        Self { path, shape }
    }

    /// Looks `path` up in `registry`.
    pub fn for_path(registry: &dyn TypeRegistry, path: &StoragePath) -> QueryResult<Self> {
        let shape = registry
            .shape(path)
            .ok_or_else(|| QueryError::UnknownPath(path.name()))?;
        Ok(Self::new(path.clone(), shape.clone()))
    }

    pub fn path(&self) -> &StoragePath {
        &self.path
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }
}

impl ResponseDecoder for RegistryDecoder {
    type Output = Value;

    fn decode(&self, _key: &StorageKey, raw: &[u8]) -> CodecResult<Value> {
        let mut decoder = Decoder::new(raw);
        let value = Value::decode_shape(&self.shape, &mut decoder)?;
        decoder.finish()?;
        Ok(value)
    }
}

/// Passes the raw bytes through untouched, for storage nobody has a
/// shape for.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl ResponseDecoder for RawDecoder {
    type Output = HexBytes;

    fn decode(&self, _key: &StorageKey, raw: &[u8]) -> CodecResult<HexBytes> {
        Ok(HexBytes(raw.to_vec()))
    }
}

/// Runs `decoder` on one item, logging a failure against its key.
pub(crate) fn decode_item<D: ResponseDecoder + ?Sized>(
    decoder: &D,
    key: &StorageKey,
    raw: &[u8],
) -> CodecResult<D::Output> {
    decoder.decode(key, raw).map_err(|err| {
        tracing::warn!(key = %key, bytes = raw.len(), error = %err, "failed to decode storage value");
        err
    })
}
