//! # Binary Codec
//!
//! Lossless, deterministic byte encoding for the value shapes stored on
//! chain. The format is positional and carries no type information: the
//! reader must know what it expects, either statically (a Rust type that
//! implements [`Decode`]) or at runtime (a [`TypeShape`] from the registry).
//!
//! ## Layout
//!
//! ```text
//! error.rs       - CodecError
//! decoder.rs     - Decoder (cursor + confirm), Encode / Decode traits
//! compact.rs     - CompactInteger, Compact<T>, length prefixes
//! primitives.rs  - integers, bool, strings, sequences, Option, Result, tuples
//! ```
//!
//! ## Exact consumption
//!
//! Decoding never over-reads. A value decoded out of a larger buffer consumes
//! exactly its own bytes, and a failed decode leaves the cursor where it was.
//!
//! [`TypeShape`]: crate::registry::TypeShape

pub mod compact;
pub mod decoder;
pub mod error;
pub mod primitives;

pub use compact::{decode_length, encode_length, Compact, CompactInteger, CompactMode};
pub use decoder::{decode_exact, decode_prefix, Decode, Decoder, Encode};
pub use error::{CodecError, CodecResult};
