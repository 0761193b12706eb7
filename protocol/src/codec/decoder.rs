//! # Cursor-Based Decoder
//!
//! The [`Decoder`] walks a borrowed byte slice with a read cursor. Reading is
//! split into two steps: [`Decoder::peek`] looks at bytes without moving, and
//! [`Decoder::confirm`] advances once the caller is satisfied with what it
//! saw. [`Decoder::decode`] wraps a full value decode in a checkpoint, so a
//! value that fails halfway leaves the cursor exactly where it started.
//!
//! The [`Encode`] and [`Decode`] traits live here too, since every codec
//! implementation touches both.

use super::error::{CodecError, CodecResult};
use crate::config::MAX_ZERO_WIDTH_ITEMS;

/// Types that can be written in the compact binary format.
///
/// `encode_to` is fallible because some values (very large compact
/// integers, dynamic values checked against a shape) cannot always be
/// represented. The trait is object safe so heterogeneous key parameters
/// can travel as `&dyn Encode`.
pub trait Encode {
    /// Appends the encoding of `self` to `dest`.
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()>;

    /// Encodes `self` into a fresh buffer.
    fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut dest = Vec::new();
        self.encode_to(&mut dest)?;
        Ok(dest)
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        (**self).encode_to(dest)
    }
}

/// Types that can be read back from the compact binary format.
pub trait Decode: Sized {
    /// Fewest bytes any encoding of `Self` takes. Sequences check their
    /// declared count against it before reading elements.
    const MIN_ENCODED_LEN: usize = 1;

    /// Reads one value from the decoder.
    ///
    /// Implementations may leave the cursor anywhere on failure; callers
    /// should go through [`Decoder::decode`], which restores it.
    fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self>;
}

/// Read cursor over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Decoder<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    /// Returns `true` once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the next `len` bytes without consuming them.
    pub fn peek(&self, len: usize) -> CodecResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        Ok(&self.data[self.cursor..self.cursor + len])
    }

    /// Advances the cursor by `len` bytes previously returned by `peek`.
    ///
    /// Saturates at the end of input; confirming more than was peeked is a
    /// logic error, not a data error.
    pub fn confirm(&mut self, len: usize) {
        debug_assert!(len <= self.remaining(), "confirm past end of input");
        self.cursor = (self.cursor + len).min(self.data.len());
    }

    /// Peeks and confirms `len` bytes in one step.
    pub fn read(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let bytes = self.peek(len)?;
        self.confirm(len);
        Ok(bytes)
    }

    /// Reads a single byte.
    pub fn read_byte(&mut self) -> CodecResult<u8> {
        Ok(self.read(1)?[0])
    }

    /// Fails unless `count` elements of at least `min_width` bytes each fit
    /// in what is left. Zero-width elements are capped at
    /// [`MAX_ZERO_WIDTH_ITEMS`].
    pub fn check_count(&self, count: usize, min_width: usize) -> CodecResult<()> {
        let fits = match min_width {
            0 => count <= MAX_ZERO_WIDTH_ITEMS,
            width => count <= self.remaining() / width,
        };
        if fits {
            Ok(())
        } else {
            Err(CodecError::LengthOverflow {
                count,
                remaining: self.remaining(),
            })
        }
    }

    /// Decodes one `T`, rewinding to the starting position on failure.
    pub fn decode<T: Decode>(&mut self) -> CodecResult<T> {
        let checkpoint = self.cursor;
        T::decode(self).map_err(|err| {
            self.cursor = checkpoint;
            err
        })
    }

    /// Runs an arbitrary decode step with the same rewind-on-failure rule.
    pub fn attempt<T>(
        &mut self,
        step: impl FnOnce(&mut Decoder<'a>) -> CodecResult<T>,
    ) -> CodecResult<T> {
        let checkpoint = self.cursor;
        step(self).map_err(|err| {
            self.cursor = checkpoint;
            err
        })
    }

    /// Fails with [`CodecError::TrailingBytes`] unless the input is exhausted.
    pub fn finish(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}

/// Decodes one `T` from the front of `bytes` and reports how many bytes it used.
pub fn decode_prefix<T: Decode>(bytes: &[u8]) -> CodecResult<(T, usize)> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode()?;
    Ok((value, decoder.position()))
}

/// Decodes a buffer that must contain exactly one `T`.
pub fn decode_exact<T: Decode>(bytes: &[u8]) -> CodecResult<T> {
    let mut decoder = Decoder::new(bytes);
    let value = decoder.decode()?;
    decoder.finish()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_advance() {
        let decoder = Decoder::new(&[1, 2, 3]);
        assert_eq!(decoder.peek(2).unwrap(), &[1, 2]);
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn read_past_end_reports_eof() {
        let mut decoder = Decoder::new(&[1, 2]);
        let err = decoder.read(3).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEof {
                needed: 3,
                remaining: 2
            }
        );
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn failed_decode_rewinds_cursor() {
        // A u32 followed by a truncated u32: the second read must not eat
        // the two bytes that are present.
        let bytes = [1, 0, 0, 0, 9, 9];
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.decode::<u32>().unwrap(), 1);
        assert!(decoder.decode::<u32>().is_err());
        assert_eq!(decoder.position(), 4);
        assert_eq!(decoder.decode::<u16>().unwrap(), 0x0909);
    }

    #[test]
    fn failed_composite_decode_rewinds_whole_value() {
        // (u8, bool) where the bool byte is invalid: the u8 must be given back.
        let bytes = [7, 2];
        let mut decoder = Decoder::new(&bytes);
        assert!(decoder.decode::<(u8, bool)>().is_err());
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn decode_exact_rejects_trailing_bytes() {
        assert_eq!(
            decode_exact::<u8>(&[1, 2]),
            Err(CodecError::TrailingBytes(1))
        );
        assert_eq!(decode_exact::<u8>(&[1]), Ok(1));
    }

    #[test]
    fn decode_prefix_consumes_only_the_value() {
        let (value, used) = decode_prefix::<u16>(&[0x34, 0x12, 0xff, 0xff]).unwrap();
        assert_eq!(value, 0x1234);
        assert_eq!(used, 2);
    }
}
