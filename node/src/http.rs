//! HTTP JSON-RPC transport.
//!
//! Posts one JSON-RPC 2.0 request per call with `reqwest`. The client is
//! shared by all concurrent page requests; request ids are unique per
//! transport.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use nova_storage::rpc::{RpcMethod, RpcRequest, RpcResponse, RpcTransport, TransportError};

/// [`RpcTransport`] over HTTP POST.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    url: String,
    timeout: Duration,
    next_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout,
            next_id: AtomicU64::new(1),
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(
        &self,
        method: RpcMethod,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        tracing::debug!(id, method = %method, url = %self.url, "sending rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?
            .error_for_status()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let envelope: RpcResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(self.timeout)
            } else {
                TransportError::InvalidResponse {
                    method,
                    reason: e.to_string(),
                }
            }
        })?;

        envelope.into_result().map_err(TransportError::Rpc)
    }
}
