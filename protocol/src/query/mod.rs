//! # Storage Queries
//!
//! The async half of the crate: paged value queries, prefix enumeration and
//! per-item decoding.
//!
//! ```text
//! orchestrator.rs - QueryOrchestrator: paged fan-out, fail-fast join, ordered merge
//! enumerator.rs   - PrefixKeyEnumerator: cursor walk over state_getKeysPaged
//! decoder.rs      - ResponseDecoder and its typed, registry and raw flavours
//! ```

pub mod decoder;
pub mod enumerator;
pub mod orchestrator;

pub use decoder::{RawDecoder, RegistryDecoder, ResponseDecoder, TypedDecoder};
pub use enumerator::PrefixKeyEnumerator;
pub use orchestrator::{merge_updates, QueryOrchestrator};
