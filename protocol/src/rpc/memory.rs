//! # In-Memory Node
//!
//! [`MemoryTransport`] answers the storage RPCs from an ordered in-memory
//! key space, with the same paging rules a real node applies. It backs the
//! test suites and is handy for wiring demos without a running node.
//!
//! Every call is recorded so tests can assert on exactly what was sent.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;

use super::transport::{RpcTransport, TransportError};
use super::types::{RpcError, RpcMethod};
use crate::storage::{BlockHash, HexBytes, StorageChange, StorageKey, StorageUpdate};

/// One call as received by the in-memory node.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: RpcMethod,
    pub params: serde_json::Value,
}

#[derive(Debug, Default)]
struct NodeState {
    top: BTreeMap<StorageKey, Vec<u8>>,
    children: HashMap<StorageKey, BTreeMap<StorageKey, Vec<u8>>>,
}

/// Storage RPCs served from memory.
#[derive(Debug)]
pub struct MemoryTransport {
    block: BlockHash,
    state: RwLock<NodeState>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// An empty node whose best block hash is all `0x11`.
    pub fn new() -> Self {
        Self::at_block(BlockHash([0x11; 32]))
    }

    /// An empty node that reports `block` as its best block.
    pub fn at_block(block: BlockHash) -> Self {
        Self {
            block,
            state: RwLock::new(NodeState::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn block_hash(&self) -> BlockHash {
        self.block
    }

    pub fn insert(&self, key: StorageKey, value: Vec<u8>) {
        self.state.write().top.insert(key, value);
    }

    pub fn remove(&self, key: &StorageKey) -> Option<Vec<u8>> {
        self.state.write().top.remove(key)
    }

    pub fn insert_child(&self, child_key: StorageKey, key: StorageKey, value: Vec<u8>) {
        self.state
            .write()
            .children
            .entry(child_key)
            .or_default()
            .insert(key, value);
    }

    /// Snapshot of every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Number of calls received for `method`.
    pub fn call_count(&self, method: RpcMethod) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.method == method)
            .count()
    }

    fn check_block(&self, at: Option<&BlockHash>) -> Result<(), RpcError> {
        match at {
            Some(hash) if *hash != self.block => Err(RpcError::unknown_block(hash)),
            _ => Ok(()),
        }
    }

    fn query_storage_at(
        &self,
        (keys, at): (Vec<StorageKey>, Option<BlockHash>),
    ) -> Result<Vec<StorageUpdate>, RpcError> {
        self.check_block(at.as_ref())?;
        let state = self.state.read();
        let changes = keys
            .into_iter()
            .map(|key| {
                let value = state.top.get(&key).cloned().map(HexBytes);
                StorageChange(key, value)
            })
            .collect();
        Ok(vec![StorageUpdate::new(Some(self.block), changes)])
    }

    fn get_keys_paged(
        &self,
        (prefix, count, start_key, at): (StorageKey, u32, Option<StorageKey>, Option<BlockHash>),
    ) -> Result<Vec<StorageKey>, RpcError> {
        self.check_block(at.as_ref())?;
        let state = self.state.read();
        let lower = match &start_key {
            // A start key before the prefix would otherwise skip nothing.
            Some(start) if start.as_bytes() >= prefix.as_bytes() => Bound::Excluded(start.clone()),
            _ => Bound::Included(prefix.clone()),
        };
        Ok(state
            .top
            .range((lower, Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix.as_bytes()))
            .take(count as usize)
            .cloned()
            .collect())
    }

    fn get_child_storage(
        &self,
        (child_key, key, at): (StorageKey, StorageKey, Option<BlockHash>),
    ) -> Result<Option<HexBytes>, RpcError> {
        self.check_block(at.as_ref())?;
        let state = self.state.read();
        Ok(state
            .children
            .get(&child_key)
            .and_then(|trie| trie.get(&key))
            .cloned()
            .map(HexBytes))
    }
}

fn params<P: DeserializeOwned>(params: serde_json::Value) -> Result<P, RpcError> {
    serde_json::from_value(params).map_err(|err| RpcError::invalid_params(err.to_string()))
}

fn respond<R: serde::Serialize>(result: Result<R, RpcError>) -> Result<serde_json::Value, TransportError> {
    let value = result.map_err(TransportError::Rpc)?;
    serde_json::to_value(value)
        .map_err(|err| TransportError::Rpc(RpcError::internal_error(err.to_string())))
}

#[async_trait]
impl RpcTransport for MemoryTransport {
    async fn call(
        &self,
        method: RpcMethod,
        raw_params: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        self.calls.lock().push(RecordedCall {
            method,
            params: raw_params.clone(),
        });

        match method {
            RpcMethod::QueryStorageAt => {
                respond(params(raw_params).and_then(|p| self.query_storage_at(p)))
            }
            RpcMethod::GetKeysPaged => {
                respond(params(raw_params).and_then(|p| self.get_keys_paged(p)))
            }
            RpcMethod::GetChildStorage => {
                respond(params(raw_params).and_then(|p| self.get_child_storage(p)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::RpcWorker;

    fn key(bytes: &[u8]) -> StorageKey {
        StorageKey::new(bytes.to_vec())
    }

    #[tokio::test]
    async fn keys_paged_respects_prefix_count_and_start() {
        let node = MemoryTransport::new();
        for i in 0..5u8 {
            node.insert(key(&[0xaa, i]), vec![i]);
        }
        node.insert(key(&[0xab, 0]), vec![]);
        node.insert(key(&[0xa9, 0]), vec![]);

        let first = RpcWorker::get_keys_paged(&key(&[0xaa]), 3, None, None)
            .perform(&node)
            .await
            .unwrap();
        assert_eq!(first, vec![key(&[0xaa, 0]), key(&[0xaa, 1]), key(&[0xaa, 2])]);

        let second = RpcWorker::get_keys_paged(&key(&[0xaa]), 3, first.last(), None)
            .perform(&node)
            .await
            .unwrap();
        assert_eq!(second, vec![key(&[0xaa, 3]), key(&[0xaa, 4])]);
        assert_eq!(node.call_count(RpcMethod::GetKeysPaged), 2);
    }

    #[tokio::test]
    async fn absent_keys_come_back_as_null() {
        let node = MemoryTransport::new();
        node.insert(key(&[1]), vec![7]);

        let updates = RpcWorker::query_storage_at(&[key(&[1]), key(&[2])], None)
            .perform(&node)
            .await
            .unwrap();
        assert_eq!(
            updates[0].changes,
            vec![
                StorageChange(key(&[1]), Some(HexBytes(vec![7]))),
                StorageChange(key(&[2]), None),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_block_is_an_rpc_error() {
        let node = MemoryTransport::new();
        let err = RpcWorker::query_storage_at(&[key(&[1])], Some(&BlockHash([0x22; 32])))
            .perform(&node)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Rpc(RpcError { code: -32000, .. })));
    }

    #[tokio::test]
    async fn child_storage_lookup() {
        let node = MemoryTransport::new();
        node.insert_child(key(b":child:1"), key(&[5]), vec![0x2a]);

        let hit = RpcWorker::get_child_storage(&key(b":child:1"), &key(&[5]), None)
            .perform(&node)
            .await
            .unwrap();
        assert_eq!(hit, Some(HexBytes(vec![0x2a])));

        let miss = RpcWorker::get_child_storage(&key(b":child:2"), &key(&[5]), None)
            .perform(&node)
            .await
            .unwrap();
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn malformed_params_are_rejected() {
        let node = MemoryTransport::new();
        let err = node
            .call(RpcMethod::GetKeysPaged, serde_json::json!(["0xzz"]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Rpc(RpcError { code: -32602, .. })));
    }
}
