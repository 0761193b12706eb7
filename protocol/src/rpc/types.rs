//! # JSON-RPC Wire Types
//!
//! Type-safe definitions for the storage RPCs this crate issues. Only the
//! envelope and the method enumeration live here; moving bytes is the job
//! of an [`RpcTransport`](super::RpcTransport).
//!
//! ## Method Index
//!
//! | Method                  | Parameters                              | Result                 |
//! |-------------------------|-----------------------------------------|------------------------|
//! | `state_queryStorageAt`  | `(keys, at?)`                           | `Vec<StorageUpdate>`   |
//! | `state_getKeysPaged`    | `(prefix, count, startKey?, at?)`       | `Vec<StorageKey>`      |
//! | `childstate_getStorage` | `(childKey, key, at?)`                  | `Option<HexBytes>`     |
//!
//! `startKey` is exclusive: the node returns keys strictly after it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::JSONRPC_VERSION;
use crate::storage::{BlockHash, StorageKey};

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

/// Storage RPC methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    /// Read values for a batch of keys at one block.
    #[serde(rename = "state_queryStorageAt")]
    QueryStorageAt,
    /// List keys under a prefix, one page at a time.
    #[serde(rename = "state_getKeysPaged")]
    GetKeysPaged,
    /// Read one value from a child trie.
    #[serde(rename = "childstate_getStorage")]
    GetChildStorage,
}

impl RpcMethod {
    /// Method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::QueryStorageAt => "state_queryStorageAt",
            Self::GetKeysPaged => "state_getKeysPaged",
            Self::GetChildStorage => "childstate_getStorage",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parameter builders
// ---------------------------------------------------------------------------

/// Parameters for `state_queryStorageAt`.
pub fn query_storage_at_params(keys: &[StorageKey], at: Option<&BlockHash>) -> serde_json::Value {
    json!([keys, at])
}

/// Parameters for `state_getKeysPaged`.
pub fn get_keys_paged_params(
    prefix: &StorageKey,
    count: u32,
    start_key: Option<&StorageKey>,
    at: Option<&BlockHash>,
) -> serde_json::Value {
    json!([prefix, count, start_key, at])
}

/// Parameters for `childstate_getStorage`: `[childKey, key, at]`, with
/// `at` null for the node's best block.
pub fn get_child_storage_params(
    child_key: &StorageKey,
    key: &StorageKey,
    at: Option<&BlockHash>,
) -> serde_json::Value {
    json!([child_key, key, at])
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version. Always "2.0".
    pub jsonrpc: String,
    /// Request identifier. Echoed back in the response.
    pub id: u64,
    /// The method to invoke.
    pub method: RpcMethod,
    /// Positional parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcRequest {
    /// Creates a new RPC request with the given method and parameters.
    pub fn new(id: u64, method: RpcMethod, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method,
            params,
        }
    }
}

/// A JSON-RPC 2.0 response.
///
/// Exactly one of `result` or `error` is set by a conforming node. A `null`
/// result is legitimate (e.g. an absent child storage value), so `result`
/// keeps the raw JSON and [`RpcResponse::into_result`] decides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// JSON-RPC version. Always "2.0".
    pub jsonrpc: String,
    /// The request ID this response corresponds to.
    pub id: serde_json::Value,
    /// The successful result, if the method completed without error.
    #[serde(default)]
    pub result: serde_json::Value,
    /// The error, if the method failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Creates a successful response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result,
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: serde_json::Value::Null,
            error: Some(error),
        }
    }

    /// Splits the envelope into the result or the node-side error.
    pub fn into_result(self) -> Result<serde_json::Value, RpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 error object.
///
/// Error codes follow the JSON-RPC 2.0 specification:
/// - `-32700`: Parse error
/// - `-32600`: Invalid request
/// - `-32601`: Method not found
/// - `-32602`: Invalid params
/// - `-32603`: Internal error
/// - `-32000` to `-32099`: Server error (application-specific)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// The requested method does not exist.
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::with_code(-32601, format!("method not found: {}", method.into()))
    }

    /// Invalid method parameters.
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::with_code(-32602, msg)
    }

    /// Internal server error.
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::with_code(-32603, msg)
    }

    /// The block the query was pinned to is unknown to the node.
    pub fn unknown_block(hash: &BlockHash) -> Self {
        Self::with_code(-32000, format!("unknown block: {}", hash))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

impl std::error::Error for RpcError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_request_serialization() {
        let req = RpcRequest::new(
            1,
            RpcMethod::GetKeysPaged,
            get_keys_paged_params(&StorageKey::new(vec![0xab]), 1000, None, None),
        );

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["method"], "state_getKeysPaged");
        assert_eq!(json["params"], json!(["0xab", 1000, null, null]));

        let recovered: RpcRequest = serde_json::from_value(json).unwrap();
        assert_eq!(recovered.method, RpcMethod::GetKeysPaged);
    }

    #[test]
    fn child_storage_params_carry_block() {
        let child = StorageKey::new(vec![0x3a, 0x63]);
        let key = StorageKey::new(vec![0x01]);
        assert_eq!(
            get_child_storage_params(&child, &key, None),
            json!(["0x3a63", "0x01", null])
        );
        let at = BlockHash([0x22; 32]);
        let params = get_child_storage_params(&child, &key, Some(&at));
        assert_eq!(params[2], json!(at.to_hex()));
        assert_eq!(params.as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn method_names_match_serde() {
        for method in [
            RpcMethod::QueryStorageAt,
            RpcMethod::GetKeysPaged,
            RpcMethod::GetChildStorage,
        ] {
            let json = serde_json::to_value(method).unwrap();
            assert_eq!(json, json!(method.as_str()));
        }
    }

    #[test]
    fn null_result_is_success() {
        let resp: RpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert_eq!(resp.into_result(), Ok(serde_json::Value::Null));
    }

    #[test]
    fn error_response_surfaces_error() {
        let resp: RpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"bad"}}"#,
        )
        .unwrap();
        assert_eq!(resp.into_result(), Err(RpcError::invalid_params("bad")));
    }

    #[test]
    fn error_codes_are_correct() {
        assert_eq!(RpcError::method_not_found("").code, -32601);
        assert_eq!(RpcError::invalid_params("").code, -32602);
        assert_eq!(RpcError::internal_error("").code, -32603);
        assert_eq!(RpcError::unknown_block(&BlockHash([0; 32])).code, -32000);
    }
}
