//! Prefix key enumeration.
//!
//! `state_getKeysPaged` returns at most `count` keys strictly after a start
//! key. The enumerator walks that cursor until the node hands back a page
//! shorter than requested, which is the only end signal the RPC offers. A
//! prefix holding an exact multiple of the page size therefore costs one
//! extra, empty request.

use std::sync::Arc;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::{QueryError, QueryResult};
use crate::rpc::{RpcTransport, RpcWorker};
use crate::storage::{BlockHash, StorageKey};

/// Collects every key under a byte prefix, one page at a time.
#[derive(Clone)]
pub struct PrefixKeyEnumerator {
    transport: Arc<dyn RpcTransport>,
    page_size: u32,
}

impl PrefixKeyEnumerator {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            page_size: DEFAULT_PAGE_SIZE as u32,
        }
    }

    /// Sets the keys requested per call. Zero is raised to one.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Lists all keys starting with `prefix`, in the node's key order.
    ///
    /// Any failed page fails the whole enumeration. A full page whose last
    /// key does not move past the previous cursor is reported as
    /// [`QueryError::StalledEnumeration`] instead of looping.
    pub async fn enumerate(
        &self,
        prefix: &StorageKey,
        at: Option<&BlockHash>,
    ) -> QueryResult<Vec<StorageKey>> {
        let mut keys = Vec::new();
        let mut start_key: Option<StorageKey> = None;
        let mut requests = 0usize;

        loop {
            let page = RpcWorker::get_keys_paged(prefix, self.page_size, start_key.as_ref(), at)
                .perform(self.transport.as_ref())
                .await?;
            requests += 1;

            let page_len = page.len();
            let last = page.last().cloned();
            keys.extend(page);
            tracing::debug!(
                prefix = %prefix,
                page = requests,
                page_keys = page_len,
                total_keys = keys.len(),
                "fetched key page"
            );

            if page_len < self.page_size as usize {
                break;
            }

            match last {
                Some(last) if start_key.as_ref().map_or(true, |start| last > *start) => {
                    start_key = Some(last);
                }
                Some(last) => return Err(QueryError::StalledEnumeration(last)),
                None => break,
            }
        }

        tracing::debug!(prefix = %prefix, requests, keys = keys.len(), "prefix enumeration complete");
        Ok(keys)
    }
}

impl std::fmt::Debug for PrefixKeyEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixKeyEnumerator")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}
