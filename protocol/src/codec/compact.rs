//! # Compact Integers
//!
//! Self-describing variable-width unsigned integers. The two low bits of the
//! first byte select one of four modes:
//!
//! | Mode | Range              | Layout                                          |
//! |------|--------------------|-------------------------------------------------|
//! | `00` | `0 ..= 2^6 - 1`    | 1 byte, `value << 2`                            |
//! | `01` | `2^6 ..= 2^14 - 1` | 2 bytes LE, `(value << 2) \| 0b01`              |
//! | `10` | `2^14 ..= 2^30 - 1`| 4 bytes LE, `(value << 2) \| 0b10`              |
//! | `11` | `2^30 ..`          | header `((len - 4) << 2) \| 0b11`, then `len` LE bytes |
//!
//! The big-integer header must fit in one byte, so the payload tops out at
//! 67 bytes. Anything larger fails with [`CodecError::ValueTooLarge`].
//!
//! Compacts are used for every length prefix in the codec, and as a standalone
//! arbitrary-precision integer via [`CompactInteger`].

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use super::decoder::{Decode, Decoder, Encode};
use super::error::{CodecError, CodecResult};
use crate::config::{
    COMPACT_FOUR_BYTE_LIMIT, COMPACT_MAX_BIG_INT_BYTES, COMPACT_SINGLE_BYTE_LIMIT,
    COMPACT_TWO_BYTE_LIMIT,
};

// ---------------------------------------------------------------------------
// CompactMode
// ---------------------------------------------------------------------------

/// The four width classes of the compact encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompactMode {
    /// `0b00`: one byte.
    SingleByte,
    /// `0b01`: two bytes.
    TwoByte,
    /// `0b10`: four bytes.
    FourByte,
    /// `0b11`: header byte plus 4..=67 payload bytes.
    BigInteger,
}

impl CompactMode {
    /// Picks the narrowest mode able to hold `value`.
    pub fn for_value(value: &BigUint) -> Self {
        match value.to_u64() {
            Some(v) if v < COMPACT_SINGLE_BYTE_LIMIT => Self::SingleByte,
            Some(v) if v < COMPACT_TWO_BYTE_LIMIT => Self::TwoByte,
            Some(v) if v < COMPACT_FOUR_BYTE_LIMIT => Self::FourByte,
            _ => Self::BigInteger,
        }
    }

    /// Reads the mode out of the first encoded byte.
    pub fn from_header(byte: u8) -> Self {
        match byte & 0b11 {
            0b00 => Self::SingleByte,
            0b01 => Self::TwoByte,
            0b10 => Self::FourByte,
            _ => Self::BigInteger,
        }
    }

    /// The two-bit tag written into the low bits of the first byte.
    pub fn tag(self) -> u8 {
        match self {
            Self::SingleByte => 0b00,
            Self::TwoByte => 0b01,
            Self::FourByte => 0b10,
            Self::BigInteger => 0b11,
        }
    }
}

// ---------------------------------------------------------------------------
// CompactInteger
// ---------------------------------------------------------------------------

/// An arbitrary-precision unsigned integer together with its encoding mode.
///
/// The mode is always a function of the value: [`CompactInteger::new`]
/// derives it from the magnitude, and decoding reads it off the header
/// byte. Two values that compare equal therefore also encode identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompactInteger {
    value: BigUint,
    mode: CompactMode,
}

impl CompactInteger {
    /// Wraps `value`, choosing the narrowest mode that holds it.
    pub fn new(value: impl Into<BigUint>) -> Self {
        let value = value.into();
        let mode = CompactMode::for_value(&value);
        Self { value, mode }
    }

    /// The integer itself.
    pub fn value(&self) -> &BigUint {
        &self.value
    }

    /// The width class used on the wire.
    pub fn mode(&self) -> CompactMode {
        self.mode
    }

    /// Consumes the wrapper, returning the integer.
    pub fn into_value(self) -> BigUint {
        self.value
    }
}

impl From<u64> for CompactInteger {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<u128> for CompactInteger {
    fn from(value: u128) -> Self {
        Self::new(value)
    }
}

impl From<BigUint> for CompactInteger {
    fn from(value: BigUint) -> Self {
        Self::new(value)
    }
}

impl Encode for CompactInteger {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        let tag = self.mode.tag();
        match self.mode {
            CompactMode::SingleByte | CompactMode::TwoByte | CompactMode::FourByte => {
                // Below 2^30 by construction, so the shifted value fits a u32.
                let small = self.value.to_u32().ok_or(CodecError::ValueTooLarge)?;
                let word = (small << 2) | u32::from(tag);
                let width = match self.mode {
                    CompactMode::SingleByte => 1,
                    CompactMode::TwoByte => 2,
                    _ => 4,
                };
                dest.extend_from_slice(&word.to_le_bytes()[..width]);
            }
            CompactMode::BigInteger => {
                let mut payload = self.value.to_bytes_le();
                if payload.len() < 4 {
                    payload.resize(4, 0);
                }
                if payload.len() > COMPACT_MAX_BIG_INT_BYTES {
                    return Err(CodecError::ValueTooLarge);
                }
                let header = (((payload.len() - 4) as u8) << 2) | tag;
                dest.push(header);
                dest.extend_from_slice(&payload);
            }
        }
        Ok(())
    }
}

impl Decode for CompactInteger {
    fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        let header = decoder.peek(1)?[0];
        let mode = CompactMode::from_header(header);
        let value = match mode {
            CompactMode::SingleByte => {
                decoder.confirm(1);
                BigUint::from(header >> 2)
            }
            CompactMode::TwoByte => {
                let bytes = decoder.read(2)?;
                BigUint::from(u16::from_le_bytes([bytes[0], bytes[1]]) >> 2)
            }
            CompactMode::FourByte => {
                let bytes = decoder.read(4)?;
                BigUint::from(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) >> 2)
            }
            CompactMode::BigInteger => {
                // The header is metadata only: no shift applies to the payload.
                let len = usize::from(header >> 2) + 4;
                let framed = decoder.peek(1 + len)?;
                let payload = &framed[1..];
                if payload.iter().all(|b| *b == 0) {
                    return Err(CodecError::UnexpectedZeroLength);
                }
                decoder.confirm(1 + len);
                BigUint::from_bytes_le(payload)
            }
        };
        Ok(Self { value, mode })
    }
}

// ---------------------------------------------------------------------------
// Compact<T>
// ---------------------------------------------------------------------------

/// Compact encoding of a fixed-width unsigned integer.
///
/// Encodes exactly like [`CompactInteger`] but decodes straight into the
/// native type, failing with [`CodecError::CompactOverflow`] if the
/// decoded value is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Compact<T>(pub T);

macro_rules! impl_compact {
    ($($ty:ty => $to:ident),* $(,)?) => {$(
        impl Encode for Compact<$ty> {
            fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
                CompactInteger::new(BigUint::from(self.0)).encode_to(dest)
            }
        }

        impl Decode for Compact<$ty> {
            fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
                let compact = CompactInteger::decode(decoder)?;
                compact
                    .value()
                    .$to()
                    .map(Compact)
                    .ok_or(CodecError::CompactOverflow { target: stringify!($ty) })
            }
        }

        impl From<$ty> for Compact<$ty> {
            fn from(value: $ty) -> Self {
                Compact(value)
            }
        }
    )*};
}

impl_compact!(u8 => to_u8, u16 => to_u16, u32 => to_u32, u64 => to_u64, u128 => to_u128);

/// Writes a collection length as a compact integer.
pub fn encode_length(len: usize, dest: &mut Vec<u8>) -> CodecResult<()> {
    Compact(len as u64).encode_to(dest)
}

/// Reads a compact collection length.
pub fn decode_length(decoder: &mut Decoder<'_>) -> CodecResult<usize> {
    let Compact(len) = Compact::<u64>::decode(decoder)?;
    usize::try_from(len).map_err(|_| CodecError::CompactOverflow { target: "usize" })
}

impl CompactInteger {
    /// Returns `true` if the integer is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}
