//! Error type for orchestrated storage queries.
//!
//! Every query entry point returns a [`QueryError`]. Key and decode
//! failures never reach it. Keys are built before a query starts, and decode
//! errors stay attached to the item they belong to (see
//! [`StorageResponse::decode_error`](crate::storage::StorageResponse::decode_error)).

use thiserror::Error;

use crate::rpc::TransportError;
use crate::storage::StorageKey;

/// Errors that abort a whole query call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// A single exchange with the node failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// One page of a paged call failed, failing the call.
    #[error("page {page} of {pages} failed: {source}")]
    PageFailed {
        /// Zero-based index of the failing page.
        page: usize,
        /// Number of pages the call was split into.
        pages: usize,
        #[source]
        source: TransportError,
    },

    /// The type registry has no shape for this storage path.
    #[error("no shape registered for {0}")]
    UnknownPath(String),

    /// A full key page did not advance past the previous start key.
    #[error("key enumeration stalled at {0}")]
    StalledEnumeration(StorageKey),
}

/// Convenience alias for query results.
pub type QueryResult<T> = Result<T, QueryError>;
