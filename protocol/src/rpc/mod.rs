//! # RPC Layer
//!
//! Typed request/response exchanges over an injected transport.
//!
//! ```text
//! types.rs      - JSON-RPC envelope, method enumeration, parameter builders
//! transport.rs  - RpcTransport trait and TransportError
//! worker.rs     - RpcWorker: one typed exchange
//! memory.rs     - MemoryTransport: storage RPCs served from memory
//! ```
//!
//! The crate stays transport-agnostic; the CLI brings an HTTP client.

pub mod memory;
pub mod transport;
pub mod types;
pub mod worker;

pub use memory::{MemoryTransport, RecordedCall};
pub use transport::{RpcTransport, TransportError};
pub use types::{RpcError, RpcMethod, RpcRequest, RpcResponse};
pub use worker::RpcWorker;
