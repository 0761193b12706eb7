//! Error types for the binary codec.
//!
//! Every codec failure means the bytes (or the value) are malformed. None of
//! these are retryable, so they carry just enough context to log.

use thiserror::Error;

/// Errors raised while encoding or decoding values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A boolean byte was neither `0x00` nor `0x01`.
    #[error("invalid boolean byte: 0x{0:02x}")]
    InvalidBoolean(u8),

    /// A big-integer compact header announced a payload with no significant bytes.
    #[error("unexpected zero length in compact integer")]
    UnexpectedZeroLength,

    /// The value needs more bytes than a single compact header can describe.
    #[error("value too large to encode as a compact integer")]
    ValueTooLarge,

    /// A string payload was not valid UTF-8.
    #[error("invalid utf-8 in string payload")]
    InvalidUtf8,

    /// An optional tag byte was neither `0x00` nor `0x01`.
    #[error("invalid optional tag: 0x{0:02x}")]
    InvalidOptionTag(u8),

    /// A result tag byte was neither `0x00` nor `0x01`.
    #[error("invalid result prefix: 0x{0:02x}")]
    InvalidResultPrefix(u8),

    /// The input ended before the value was complete.
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof {
        /// Bytes the decoder tried to read.
        needed: usize,
        /// Bytes that were actually left.
        remaining: usize,
    },

    /// A sequence declared more elements than the remaining input can hold.
    #[error("sequence of {count} elements cannot fit in {remaining} remaining bytes")]
    LengthOverflow {
        /// Element count from the length prefix.
        count: usize,
        /// Bytes left after the prefix.
        remaining: usize,
    },

    /// A compact integer decoded fine but does not fit the requested type.
    #[error("compact integer overflows {target}")]
    CompactOverflow {
        /// Name of the target integer type.
        target: &'static str,
    },

    /// An enum variant index has no matching variant.
    #[error("invalid variant index: {0}")]
    InvalidVariant(u8),

    /// A buffer that must hold exactly one value had bytes left over.
    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    /// A dynamic value did not match the shape it was encoded against.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}

/// Convenience alias used throughout the codec.
pub type CodecResult<T> = Result<T, CodecError>;
