// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NOVA Storage: Remote State Access
//!
//! Typed reads of on-chain state over JSON-RPC. A caller names a storage
//! item and its parameters; this crate derives the storage keys, fetches the
//! values in bounded pages, and decodes the bytes that come back.
//!
//! ## Architecture
//!
//! - **codec**: compact binary encoding (fixed-width and compact integers,
//!   strings, sequences, options, results, tuples).
//! - **storage**: storage keys and paths, the key factory, node updates and
//!   caller-facing responses.
//! - **crypto**: storage hashers used when deriving keys.
//! - **registry**: runtime type shapes and dynamically decoded values.
//! - **rpc**: wire types, the transport seam, typed workers, an in-memory node.
//! - **query**: paged fan-out, prefix enumeration, response decoding.
//! - **config**: protocol constants and paging knobs.
//!
//! ## Data flow
//!
//! ```text
//! StorageKeyFactory ──► QueryOrchestrator ──► RpcWorker × pages ──► RpcTransport
//!                               │
//!                               ▼
//!                      merge_updates + ResponseDecoder ──► Vec<StorageResponse<T>>
//! ```
//!
//! ## Ground rules
//!
//! 1. Output order is the caller's key order. Always.
//! 2. One failed page fails the call. One undecodable value fails only itself.
//! 3. No caching. Every query is a fresh round trip.
//! 4. No sockets in the library. Bring a transport.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod query;
pub mod registry;
pub mod rpc;
pub mod storage;

pub use error::{QueryError, QueryResult};
