//! Encode/decode implementations for the built-in value shapes: fixed-width
//! integers, booleans, strings, sequences, optionals, results, tuples and
//! fixed-size arrays.

use super::compact::{decode_length, encode_length};
use super::decoder::{Decode, Decoder, Encode};
use super::error::{CodecError, CodecResult};

// ---------------------------------------------------------------------------
// Fixed-width integers
// ---------------------------------------------------------------------------

macro_rules! impl_fixed_width {
    ($($ty:ty),* $(,)?) => {$(
        impl Encode for $ty {
            fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
                dest.extend_from_slice(&self.to_le_bytes());
                Ok(())
            }
        }

        impl Decode for $ty {
            const MIN_ENCODED_LEN: usize = std::mem::size_of::<$ty>();

            fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
                const WIDTH: usize = std::mem::size_of::<$ty>();
                let bytes = decoder.read(WIDTH)?;
                let mut buf = [0u8; WIDTH];
                buf.copy_from_slice(bytes);
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    )*};
}

impl_fixed_width!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

// ---------------------------------------------------------------------------
// Boolean
// ---------------------------------------------------------------------------

impl Encode for bool {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        dest.push(u8::from(*self));
        Ok(())
    }
}

impl Decode for bool {
    fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        match decoder.peek(1)?[0] {
            0x00 => {
                decoder.confirm(1);
                Ok(false)
            }
            0x01 => {
                decoder.confirm(1);
                Ok(true)
            }
            other => Err(CodecError::InvalidBoolean(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

impl Encode for str {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        encode_length(self.len(), dest)?;
        dest.extend_from_slice(self.as_bytes());
        Ok(())
    }
}

impl Encode for String {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        self.as_str().encode_to(dest)
    }
}

impl Decode for String {
    fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        let len = decode_length(decoder)?;
        let bytes = decoder.read(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

impl<T: Encode> Encode for [T] {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        encode_length(self.len(), dest)?;
        for item in self {
            item.encode_to(dest)?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        self.as_slice().encode_to(dest)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        let len = decode_length(decoder)?;
        decoder.check_count(len, T::MIN_ENCODED_LEN)?;
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(T::decode(decoder)?);
        }
        Ok(items)
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        for item in self {
            item.encode_to(dest)?;
        }
        Ok(())
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    const MIN_ENCODED_LEN: usize = T::MIN_ENCODED_LEN.saturating_mul(N);

    fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(T::decode(decoder)?);
        }
        items
            .try_into()
            .map_err(|_| CodecError::ShapeMismatch(format!("expected {} elements", N)))
    }
}

// ---------------------------------------------------------------------------
// Option / Result
// ---------------------------------------------------------------------------

impl<T: Encode> Encode for Option<T> {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        match self {
            None => dest.push(0x00),
            Some(value) => {
                dest.push(0x01);
                value.encode_to(dest)?;
            }
        }
        Ok(())
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        match decoder.read_byte()? {
            0x00 => Ok(None),
            0x01 => T::decode(decoder).map(Some),
            other => Err(CodecError::InvalidOptionTag(other)),
        }
    }
}

impl<T: Encode, E: Encode> Encode for Result<T, E> {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        match self {
            Ok(value) => {
                dest.push(0x00);
                value.encode_to(dest)
            }
            Err(err) => {
                dest.push(0x01);
                err.encode_to(dest)
            }
        }
    }
}

impl<T: Decode, E: Decode> Decode for Result<T, E> {
    fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        match decoder.read_byte()? {
            0x00 => T::decode(decoder).map(Ok),
            0x01 => E::decode(decoder).map(Err),
            other => Err(CodecError::InvalidResultPrefix(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tuples
// ---------------------------------------------------------------------------

impl Encode for () {
    fn encode_to(&self, _dest: &mut Vec<u8>) -> CodecResult<()> {
        Ok(())
    }
}

impl Decode for () {
    const MIN_ENCODED_LEN: usize = 0;

    fn decode(_decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(())
    }
}

macro_rules! impl_tuple {
    ($($name:ident),+) => {
        impl<$($name: Encode),+> Encode for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
                let ($($name,)+) = self;
                $($name.encode_to(dest)?;)+
                Ok(())
            }
        }

        impl<$($name: Decode),+> Decode for ($($name,)+) {
            const MIN_ENCODED_LEN: usize = 0 $(+ $name::MIN_ENCODED_LEN)+;

            fn decode(decoder: &mut Decoder<'_>) -> CodecResult<Self> {
                Ok(($($name::decode(decoder)?,)+))
            }
        }
    };
}

impl_tuple!(A);
impl_tuple!(A, B);
impl_tuple!(A, B, C);
impl_tuple!(A, B, C, D);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_exact, decode_prefix, Compact};

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(0x1234u16.encode().unwrap(), vec![0x34, 0x12]);
        assert_eq!((-2i32).encode().unwrap(), vec![0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(
            u64::MAX.encode().unwrap(),
            vec![0xff; 8]
        );
        assert_eq!(decode_exact::<i64>(&(-5i64).encode().unwrap()), Ok(-5));
        assert_eq!(decode_exact::<u128>(&u128::MAX.encode().unwrap()), Ok(u128::MAX));
    }

    #[test]
    fn short_integer_input_fails() {
        assert!(matches!(
            decode_exact::<u32>(&[1, 2, 3]),
            Err(CodecError::UnexpectedEof { needed: 4, remaining: 3 })
        ));
    }

    #[test]
    fn booleans() {
        assert_eq!(true.encode().unwrap(), vec![0x01]);
        assert_eq!(false.encode().unwrap(), vec![0x00]);
        assert_eq!(decode_exact::<bool>(&[0x01]), Ok(true));
        assert_eq!(decode_exact::<bool>(&[0x02]), Err(CodecError::InvalidBoolean(0x02)));
    }

    #[test]
    fn strings() {
        let encoded = "nova".encode().unwrap();
        assert_eq!(encoded, vec![0x10, b'n', b'o', b'v', b'a']);
        assert_eq!(decode_exact::<String>(&encoded), Ok("nova".to_string()));

        let empty = String::new().encode().unwrap();
        assert_eq!(empty, vec![0x00]);
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert_eq!(
            decode_exact::<String>(&[0x08, 0xff, 0xfe]),
            Err(CodecError::InvalidUtf8)
        );
    }

    #[test]
    fn vectors_carry_compact_count() {
        let values: Vec<u16> = vec![1, 2, 3];
        let encoded = values.encode().unwrap();
        assert_eq!(encoded, vec![0x0c, 1, 0, 2, 0, 3, 0]);
        assert_eq!(decode_exact::<Vec<u16>>(&encoded), Ok(values));
    }

    #[test]
    fn long_vector_switches_length_mode() {
        let values = vec![7u8; 100];
        let encoded = values.encode().unwrap();
        assert_eq!(&encoded[..2], &Compact(100u32).encode().unwrap()[..]);
        assert_eq!(encoded.len(), 102);
        assert_eq!(decode_exact::<Vec<u8>>(&encoded), Ok(values));
    }

    #[test]
    fn hostile_length_prefix_fails_cleanly() {
        // Claims 2^29 elements but carries two bytes.
        let bytes = [0xfe, 0xff, 0xff, 0x7f, 0x01, 0x02];
        assert_eq!(
            decode_exact::<Vec<u32>>(&bytes),
            Err(CodecError::LengthOverflow {
                count: (1 << 29) - 1,
                remaining: 2,
            })
        );
    }

    #[test]
    fn zero_width_elements_are_capped() {
        // 2^25 - 1 unit elements from four bytes.
        let bytes = [0xfe, 0xff, 0xff, 0x07];
        assert!(matches!(
            decode_exact::<Vec<()>>(&bytes),
            Err(CodecError::LengthOverflow { remaining: 0, .. })
        ));

        let mut small = Vec::new();
        encode_length(3, &mut small).unwrap();
        assert_eq!(decode_exact::<Vec<()>>(&small), Ok(vec![(), (), ()]));
    }

    #[test]
    fn tuple_width_sums_its_parts() {
        assert_eq!(<(u8, u32, ())>::MIN_ENCODED_LEN, 5);
        assert_eq!(<[u16; 4]>::MIN_ENCODED_LEN, 8);
        // (u16, u16) pairs need four bytes each; three bytes hold none.
        assert!(matches!(
            decode_exact::<Vec<(u16, u16)>>(&[0x04, 1, 2, 3]),
            Err(CodecError::LengthOverflow { count: 1, remaining: 3 })
        ));
    }

    #[test]
    fn options() {
        assert_eq!(None::<u8>.encode().unwrap(), vec![0x00]);
        assert_eq!(Some(5u8).encode().unwrap(), vec![0x01, 0x05]);
        assert_eq!(decode_exact::<Option<u8>>(&[0x01, 0x05]), Ok(Some(5)));
        assert_eq!(decode_exact::<Option<u8>>(&[0x00]), Ok(None));
        assert_eq!(
            decode_exact::<Option<u8>>(&[0x02, 0x05]),
            Err(CodecError::InvalidOptionTag(0x02))
        );
    }

    #[test]
    fn results() {
        let ok: Result<u32, String> = Ok(9);
        let err: Result<u32, String> = Err("no".into());
        assert_eq!(ok.encode().unwrap(), vec![0x00, 9, 0, 0, 0]);
        assert_eq!(err.encode().unwrap(), vec![0x01, 0x08, b'n', b'o']);
        assert_eq!(decode_exact::<Result<u32, String>>(&[0x00, 9, 0, 0, 0]), Ok(ok));
        assert_eq!(
            decode_exact::<Result<u32, String>>(&[0x01, 0x08, b'n', b'o']),
            Ok(err)
        );
        assert_eq!(
            decode_exact::<Result<u32, String>>(&[0x02]),
            Err(CodecError::InvalidResultPrefix(0x02))
        );
    }

    #[test]
    fn nested_composite_round_trip() {
        let value: (u8, Vec<Option<String>>, Result<bool, u64>, [u8; 4]) = (
            42,
            vec![Some("a".into()), None, Some("ümlaut".into())],
            Err(1 << 40),
            [1, 2, 3, 4],
        );
        let encoded = value.encode().unwrap();
        assert_eq!(decode_exact::<(u8, Vec<Option<String>>, Result<bool, u64>, [u8; 4])>(&encoded), Ok(value));
    }

    #[test]
    fn fixed_arrays_have_no_length_prefix() {
        let hash = [0xabu8; 32];
        let encoded = hash.encode().unwrap();
        assert_eq!(encoded.len(), 32);
        assert_eq!(decode_exact::<[u8; 32]>(&encoded), Ok(hash));
    }

    #[test]
    fn trailing_bytes_are_left_alone() {
        let mut bytes = "abc".encode().unwrap();
        bytes.extend_from_slice(&[0xde, 0xad]);
        let (value, used) = decode_prefix::<String>(&bytes).unwrap();
        assert_eq!(value, "abc");
        assert_eq!(used, 4);
    }
}
