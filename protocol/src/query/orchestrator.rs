//! # Paged Query Orchestrator
//!
//! Fetches values for any number of keys. The key list is cut into pages,
//! every page goes out at once as its own `state_queryStorageAt` call, and
//! the call returns once all pages have answered.
//!
//! ```text
//! keys ──chunks(page_size)──► page 0 ─┐
//!                             page 1 ─┼─ try_join_all ──► merge ──► responses
//!                             page n ─┘      (fail-fast)   (input order)
//! ```
//!
//! The join is all-or-nothing: the first failing page drops the pending
//! ones and fails the call. Pages share nothing while in flight; the only
//! accumulation happens in [`merge_updates`] after the join, so the output
//! order is the caller's key order no matter which page answered first.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use futures::stream::{self, StreamExt, TryStreamExt};

use super::decoder::{decode_item, ResponseDecoder};
use super::enumerator::PrefixKeyEnumerator;
use crate::config::QueryConfig;
use crate::error::{QueryError, QueryResult};
use crate::rpc::{RpcTransport, RpcWorker};
use crate::storage::{
    BlockHash, ChildStorageResponse, StorageChange, StorageKey, StorageResponse, StorageUpdate,
};

/// Runs paged storage queries against one transport.
#[derive(Clone)]
pub struct QueryOrchestrator {
    transport: Arc<dyn RpcTransport>,
    config: QueryConfig,
}

impl QueryOrchestrator {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self::with_config(transport, QueryConfig::default())
    }

    pub fn with_config(transport: Arc<dyn RpcTransport>, config: QueryConfig) -> Self {
        Self {
            transport,
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Raw updates for `keys`, one `state_queryStorageAt` per page.
    ///
    /// Updates come back in page order. An empty key list sends nothing.
    pub async fn fetch_updates(
        &self,
        keys: &[StorageKey],
        at: Option<&BlockHash>,
    ) -> QueryResult<Vec<StorageUpdate>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let transport = self.transport.as_ref();
        let pages: Vec<&[StorageKey]> = keys.chunks(self.config.page_size).collect();
        let page_count = pages.len();
        tracing::debug!(keys = keys.len(), pages = page_count, "fetching storage pages");

        let workers = pages.into_iter().enumerate().map(|(page, chunk)| async move {
            let updates = RpcWorker::query_storage_at(chunk, at)
                .perform(transport)
                .await
                .map_err(|source| QueryError::PageFailed {
                    page,
                    pages: page_count,
                    source,
                })?;
            tracing::trace!(page, keys = chunk.len(), updates = updates.len(), "page complete");
            Ok::<_, QueryError>(updates)
        });

        let pages = try_join_all(workers).await?;
        Ok(pages.into_iter().flatten().collect())
    }

    /// Values for `keys`, decoded with `decoder`, in the order of `keys`.
    pub async fn query_items<D: ResponseDecoder>(
        &self,
        keys: &[StorageKey],
        decoder: &D,
        at: Option<&BlockHash>,
    ) -> QueryResult<Vec<StorageResponse<D::Output>>> {
        let updates = self.fetch_updates(keys, at).await?;
        Ok(merge_updates(keys, updates, decoder))
    }

    /// Every entry under `prefix`: enumerates the keys, then queries them.
    pub async fn query_by_prefix<D: ResponseDecoder>(
        &self,
        prefix: &StorageKey,
        decoder: &D,
        at: Option<&BlockHash>,
    ) -> QueryResult<Vec<StorageResponse<D::Output>>> {
        let keys = PrefixKeyEnumerator::new(self.transport.clone())
            .with_page_size(self.config.key_page_size)
            .enumerate(prefix, at)
            .await?;
        self.query_items(&keys, decoder, at).await
    }

    /// Values for `keys` inside the child trie `child_key`.
    ///
    /// One `childstate_getStorage` call per key. At most `page_size` calls
    /// are in flight at a time; results keep the input order and the first
    /// error fails the call, dropping whatever is still pending.
    pub async fn query_child_items<D: ResponseDecoder>(
        &self,
        child_key: &StorageKey,
        keys: &[StorageKey],
        decoder: &D,
        at: Option<&BlockHash>,
    ) -> QueryResult<Vec<ChildStorageResponse<D::Output>>> {
        let transport = self.transport.as_ref();
        tracing::debug!(child = %child_key, keys = keys.len(), "fetching child storage");

        let values: Vec<_> = stream::iter(keys)
            .map(|key| async move {
                let value = RpcWorker::get_child_storage(child_key, key, at)
                    .perform(transport)
                    .await?;
                Ok::<_, QueryError>((key, value))
            })
            .buffered(self.config.page_size)
            .try_collect()
            .await?;

        Ok(values
            .into_iter()
            .map(|(key, value)| {
                let response = StorageResponse::from_raw(
                    key.clone(),
                    value.map(|bytes| bytes.0),
                    |key, raw| decode_item(decoder, key, raw),
                );
                ChildStorageResponse::new(child_key.clone(), response)
            })
            .collect())
    }
}

impl fmt::Debug for QueryOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Lines fetched updates up with the caller's keys and decodes each value.
///
/// The output has exactly one response per entry of `keys`, in that order.
/// A key no update mentions gets an empty response. When several updates
/// carry the same key the last one wins.
pub fn merge_updates<D: ResponseDecoder + ?Sized>(
    keys: &[StorageKey],
    updates: Vec<StorageUpdate>,
    decoder: &D,
) -> Vec<StorageResponse<D::Output>> {
    let mut values: HashMap<StorageKey, Option<Vec<u8>>> = HashMap::with_capacity(keys.len());
    for update in updates {
        for StorageChange(key, value) in update.changes {
            values.insert(key, value.map(|bytes| bytes.0));
        }
    }

    keys.iter()
        .map(|key| {
            let raw = values.get(key).cloned().flatten();
            StorageResponse::from_raw(key.clone(), raw, |key, raw| decode_item(decoder, key, raw))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::TypedDecoder;
    use crate::rpc::{MemoryTransport, RpcMethod};
    use crate::storage::HexBytes;

    fn key(n: u16) -> StorageKey {
        StorageKey::new(n.to_be_bytes().to_vec())
    }

    #[test]
    fn merge_follows_caller_order() {
        let keys = vec![key(3), key(1), key(2)];
        let updates = vec![
            StorageUpdate::new(None, vec![StorageChange(key(1), Some(HexBytes(vec![1])))]),
            StorageUpdate::new(
                None,
                vec![
                    StorageChange(key(2), Some(HexBytes(vec![2]))),
                    StorageChange(key(3), Some(HexBytes(vec![3]))),
                ],
            ),
        ];

        let merged = merge_updates(&keys, updates, &TypedDecoder::<u8>::new());
        let values: Vec<_> = merged.iter().map(|r| r.decoded_value().copied()).collect();
        assert_eq!(values, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn merge_keeps_decode_errors_local() {
        let keys = vec![key(1), key(2), key(3)];
        let updates = vec![StorageUpdate::new(
            None,
            vec![
                StorageChange(key(1), Some(HexBytes(vec![1, 0]))),
                StorageChange(key(2), Some(HexBytes(vec![2]))),
                StorageChange(key(3), Some(HexBytes(vec![3, 0]))),
            ],
        )];

        let merged = merge_updates(&keys, updates, &TypedDecoder::<u16>::new());
        assert_eq!(merged[0].decoded_value(), Some(&1));
        assert!(merged[1].decode_error().is_some());
        assert_eq!(merged[1].raw_value(), Some(&[2u8][..]));
        assert_eq!(merged[2].decoded_value(), Some(&3));
    }

    #[tokio::test]
    async fn keys_are_split_into_pages() {
        let node = Arc::new(MemoryTransport::new());
        let keys: Vec<_> = (0..2500).map(key).collect();
        for k in &keys {
            node.insert(k.clone(), k.as_bytes().to_vec());
        }

        let orchestrator = QueryOrchestrator::new(node.clone());
        let responses = orchestrator
            .query_items(&keys, &TypedDecoder::<[u8; 2]>::new(), None)
            .await
            .unwrap();

        assert_eq!(node.call_count(RpcMethod::QueryStorageAt), 3);
        assert_eq!(responses.len(), 2500);
        for (k, response) in keys.iter().zip(&responses) {
            assert_eq!(response.key(), k);
            assert_eq!(response.decoded_value().map(|v| &v[..]), Some(k.as_bytes()));
        }
    }

    #[tokio::test]
    async fn empty_key_list_sends_nothing() {
        let node = Arc::new(MemoryTransport::new());
        let orchestrator = QueryOrchestrator::new(node.clone());
        let responses = orchestrator
            .query_items(&[], &TypedDecoder::<u8>::new(), None)
            .await
            .unwrap();
        assert!(responses.is_empty());
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn child_items_keep_input_order() {
        let node = Arc::new(MemoryTransport::new());
        let child = StorageKey::new(b":child_storage:default:1".to_vec());
        node.insert_child(child.clone(), key(1), vec![10]);
        node.insert_child(child.clone(), key(3), vec![30]);

        let orchestrator = QueryOrchestrator::new(node.clone());
        let responses = orchestrator
            .query_child_items(&child, &[key(3), key(2), key(1)], &TypedDecoder::<u8>::new(), None)
            .await
            .unwrap();

        let values: Vec<_> = responses.iter().map(|r| r.decoded_value().copied()).collect();
        assert_eq!(values, vec![Some(30), None, Some(10)]);
        assert!(responses.iter().all(|r| r.child_key() == &child));
        assert_eq!(node.call_count(RpcMethod::GetChildStorage), 3);
    }

    #[tokio::test]
    async fn prefix_query_reads_every_key() {
        let node = Arc::new(MemoryTransport::new());
        for i in 0..15u8 {
            node.insert(StorageKey::new(vec![0xaa, i]), vec![i]);
        }
        node.insert(StorageKey::new(vec![0xab, 0]), vec![0xff]);

        let config = QueryConfig {
            page_size: 4,
            key_page_size: 5,
        };
        let orchestrator = QueryOrchestrator::with_config(node.clone(), config);
        let responses = orchestrator
            .query_by_prefix(&StorageKey::new(vec![0xaa]), &TypedDecoder::<u8>::new(), None)
            .await
            .unwrap();

        let values: Vec<u8> = responses.iter().filter_map(|r| r.decoded_value().copied()).collect();
        assert_eq!(values, (0..15).collect::<Vec<u8>>());
        assert_eq!(node.call_count(RpcMethod::GetKeysPaged), 4);
        assert_eq!(node.call_count(RpcMethod::QueryStorageAt), 4);
    }
}
