//! The transport seam.
//!
//! The access layer never opens sockets. It issues calls through an
//! [`RpcTransport`] injected by the caller: an HTTP client in the CLI, the
//! in-memory node in tests, or whatever the embedding application uses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{RpcError, RpcMethod};

/// Failures moving a request to the node and back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The node answered with a JSON-RPC error object.
    #[error("node returned error: {0}")]
    Rpc(RpcError),

    /// The request never got a well-formed answer (connection refused, HTTP
    /// status, and so on).
    #[error("connection error: {0}")]
    Connection(String),

    /// No answer within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The answer arrived but did not have the expected shape.
    #[error("invalid response to {method}: {reason}")]
    InvalidResponse { method: RpcMethod, reason: String },
}

/// Dispatches one JSON-RPC call and returns its `result` payload.
///
/// Implementations must be safe to call concurrently; the paged query
/// orchestrator issues one call per page at the same time.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(
        &self,
        method: RpcMethod,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError>;
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    async fn call(
        &self,
        method: RpcMethod,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        (**self).call(method, params).await
    }
}
