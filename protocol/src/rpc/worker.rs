//! One typed request/response exchange.
//!
//! An [`RpcWorker`] is a method, its parameters and the type the answer
//! should deserialize into. Performing it is a single await; nothing is
//! retried and nothing is cached.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use super::transport::{RpcTransport, TransportError};
use super::types::{
    get_child_storage_params, get_keys_paged_params, query_storage_at_params, RpcMethod,
};
use crate::storage::{BlockHash, HexBytes, StorageKey, StorageUpdate};

/// A pending typed RPC exchange.
#[derive(Debug, Clone)]
pub struct RpcWorker<R> {
    method: RpcMethod,
    params: serde_json::Value,
    _response: PhantomData<fn() -> R>,
}

impl<R: DeserializeOwned> RpcWorker<R> {
    pub fn new(method: RpcMethod, params: serde_json::Value) -> Self {
        Self {
            method,
            params,
            _response: PhantomData,
        }
    }

    pub fn method(&self) -> RpcMethod {
        self.method
    }

    /// Sends the request and deserializes the result.
    pub async fn perform(self, transport: &dyn RpcTransport) -> Result<R, TransportError> {
        let method = self.method;
        let raw = transport.call(method, self.params).await.map_err(|err| {
            tracing::warn!(method = %method, error = %err, "rpc call failed");
            err
        })?;
        serde_json::from_value(raw).map_err(|err| TransportError::InvalidResponse {
            method,
            reason: err.to_string(),
        })
    }
}

impl RpcWorker<Vec<StorageUpdate>> {
    /// `state_queryStorageAt(keys, at)`.
    pub fn query_storage_at(keys: &[StorageKey], at: Option<&BlockHash>) -> Self {
        Self::new(RpcMethod::QueryStorageAt, query_storage_at_params(keys, at))
    }
}

impl RpcWorker<Vec<StorageKey>> {
    /// `state_getKeysPaged(prefix, count, startKey, at)`.
    pub fn get_keys_paged(
        prefix: &StorageKey,
        count: u32,
        start_key: Option<&StorageKey>,
        at: Option<&BlockHash>,
    ) -> Self {
        Self::new(
            RpcMethod::GetKeysPaged,
            get_keys_paged_params(prefix, count, start_key, at),
        )
    }
}

impl RpcWorker<Option<HexBytes>> {
    /// `childstate_getStorage(childKey, key, at)`.
    pub fn get_child_storage(
        child_key: &StorageKey,
        key: &StorageKey,
        at: Option<&BlockHash>,
    ) -> Self {
        Self::new(
            RpcMethod::GetChildStorage,
            get_child_storage_params(child_key, key, at),
        )
    }
}
