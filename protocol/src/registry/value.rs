//! # Dynamic Values
//!
//! [`Value`] is what the registry-driven decoder produces when the caller
//! has no static Rust type for a storage item. Decoding is a single pass
//! guided by a [`TypeShape`]; there is no guessing between candidate shapes.
//!
//! The same shape drives encoding, so dynamic values can also be used as
//! storage key parameters ([`ShapedValue`]).

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use serde::{Serialize, Serializer};

use super::shape::TypeShape;
use crate::codec::{
    decode_length, encode_length, CodecError, CodecResult, Compact, CompactInteger, Decode,
    Decoder, Encode,
};

/// A decoded storage value of runtime-determined shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    /// Any unsigned fixed-width integer.
    Unsigned(u128),
    /// Any signed fixed-width integer.
    Signed(i128),
    /// A compact integer, kept at full precision.
    BigUnsigned(BigUint),
    Str(String),
    Bytes(Vec<u8>),
    Sequence(Vec<Value>),
    Option(Option<Box<Value>>),
    Result(Result<Box<Value>, Box<Value>>),
    Tuple(Vec<Value>),
    Composite(Vec<(String, Value)>),
    Variant {
        index: u8,
        name: String,
        fields: Vec<Value>,
    },
}

impl Value {
    /// Decodes one value of the given shape.
    pub fn decode_shape(shape: &TypeShape, decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        decoder.attempt(|decoder| Self::decode_inner(shape, decoder))
    }

    fn decode_inner(shape: &TypeShape, decoder: &mut Decoder<'_>) -> CodecResult<Self> {
        Ok(match shape {
            TypeShape::Bool => Value::Bool(bool::decode(decoder)?),
            TypeShape::U8 => Value::Unsigned(u8::decode(decoder)?.into()),
            TypeShape::U16 => Value::Unsigned(u16::decode(decoder)?.into()),
            TypeShape::U32 => Value::Unsigned(u32::decode(decoder)?.into()),
            TypeShape::U64 => Value::Unsigned(u64::decode(decoder)?.into()),
            TypeShape::U128 => Value::Unsigned(u128::decode(decoder)?),
            TypeShape::I8 => Value::Signed(i8::decode(decoder)?.into()),
            TypeShape::I16 => Value::Signed(i16::decode(decoder)?.into()),
            TypeShape::I32 => Value::Signed(i32::decode(decoder)?.into()),
            TypeShape::I64 => Value::Signed(i64::decode(decoder)?.into()),
            TypeShape::I128 => Value::Signed(i128::decode(decoder)?),
            TypeShape::Compact => Value::BigUnsigned(CompactInteger::decode(decoder)?.into_value()),
            TypeShape::Str => Value::Str(String::decode(decoder)?),
            TypeShape::Bytes => {
                let len = decode_length(decoder)?;
                Value::Bytes(decoder.read(len)?.to_vec())
            }
            TypeShape::FixedBytes(len) => Value::Bytes(decoder.read(*len)?.to_vec()),
            TypeShape::Sequence(inner) => {
                let len = decode_length(decoder)?;
                decoder.check_count(len, inner.min_encoded_len())?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(Self::decode_inner(inner, decoder)?);
                }
                Value::Sequence(items)
            }
            TypeShape::Array(inner, len) => {
                decoder.check_count(*len, inner.min_encoded_len())?;
                let mut items = Vec::with_capacity(*len);
                for _ in 0..*len {
                    items.push(Self::decode_inner(inner, decoder)?);
                }
                Value::Sequence(items)
            }
            TypeShape::Option(inner) => match decoder.read_byte()? {
                0x00 => Value::Option(None),
                0x01 => Value::Option(Some(Box::new(Self::decode_inner(inner, decoder)?))),
                other => return Err(CodecError::InvalidOptionTag(other)),
            },
            TypeShape::Result(ok, err) => match decoder.read_byte()? {
                0x00 => Value::Result(Ok(Box::new(Self::decode_inner(ok, decoder)?))),
                0x01 => Value::Result(Err(Box::new(Self::decode_inner(err, decoder)?))),
                other => return Err(CodecError::InvalidResultPrefix(other)),
            },
            TypeShape::Tuple(items) => Value::Tuple(
                items
                    .iter()
                    .map(|item| Self::decode_inner(item, decoder))
                    .collect::<CodecResult<_>>()?,
            ),
            TypeShape::Composite(fields) => Value::Composite(
                fields
                    .iter()
                    .map(|field| Ok((field.name.clone(), Self::decode_inner(&field.shape, decoder)?)))
                    .collect::<CodecResult<_>>()?,
            ),
            TypeShape::Variant(variants) => {
                let index = decoder.read_byte()?;
                let variant = variants
                    .get(usize::from(index))
                    .ok_or(CodecError::InvalidVariant(index))?;
                let fields = variant
                    .fields
                    .iter()
                    .map(|field| Self::decode_inner(field, decoder))
                    .collect::<CodecResult<_>>()?;
                Value::Variant {
                    index,
                    name: variant.name.clone(),
                    fields,
                }
            }
        })
    }

    /// Encodes `self` as the given shape, failing with
    /// [`CodecError::ShapeMismatch`] when the two disagree.
    pub fn encode_shape(&self, shape: &TypeShape, dest: &mut Vec<u8>) -> CodecResult<()> {
        fn mismatch(shape: &TypeShape, value: &Value) -> CodecError {
            CodecError::ShapeMismatch(format!("{:?} is not a {}", value, shape))
        }

        fn unsigned<T: TryFrom<u128> + Encode>(
            v: u128,
            shape: &TypeShape,
            value: &Value,
            dest: &mut Vec<u8>,
        ) -> CodecResult<()> {
            T::try_from(v)
                .map_err(|_| mismatch(shape, value))?
                .encode_to(dest)
        }

        fn signed<T: TryFrom<i128> + Encode>(
            v: i128,
            shape: &TypeShape,
            value: &Value,
            dest: &mut Vec<u8>,
        ) -> CodecResult<()> {
            T::try_from(v)
                .map_err(|_| mismatch(shape, value))?
                .encode_to(dest)
        }

        match (shape, self) {
            (TypeShape::Bool, Value::Bool(b)) => b.encode_to(dest),
            (TypeShape::U8, Value::Unsigned(v)) => unsigned::<u8>(*v, shape, self, dest),
            (TypeShape::U16, Value::Unsigned(v)) => unsigned::<u16>(*v, shape, self, dest),
            (TypeShape::U32, Value::Unsigned(v)) => unsigned::<u32>(*v, shape, self, dest),
            (TypeShape::U64, Value::Unsigned(v)) => unsigned::<u64>(*v, shape, self, dest),
            (TypeShape::U128, Value::Unsigned(v)) => v.encode_to(dest),
            (TypeShape::I8, Value::Signed(v)) => signed::<i8>(*v, shape, self, dest),
            (TypeShape::I16, Value::Signed(v)) => signed::<i16>(*v, shape, self, dest),
            (TypeShape::I32, Value::Signed(v)) => signed::<i32>(*v, shape, self, dest),
            (TypeShape::I64, Value::Signed(v)) => signed::<i64>(*v, shape, self, dest),
            (TypeShape::I128, Value::Signed(v)) => v.encode_to(dest),
            (TypeShape::Compact, Value::Unsigned(v)) => Compact(*v).encode_to(dest),
            (TypeShape::Compact, Value::BigUnsigned(v)) => {
                CompactInteger::new(v.clone()).encode_to(dest)
            }
            (TypeShape::Str, Value::Str(s)) => s.encode_to(dest),
            (TypeShape::Bytes, Value::Bytes(bytes)) => {
                encode_length(bytes.len(), dest)?;
                dest.extend_from_slice(bytes);
                Ok(())
            }
            (TypeShape::FixedBytes(len), Value::Bytes(bytes)) if bytes.len() == *len => {
                dest.extend_from_slice(bytes);
                Ok(())
            }
            (TypeShape::Sequence(inner), Value::Sequence(items)) => {
                encode_length(items.len(), dest)?;
                items.iter().try_for_each(|item| item.encode_shape(inner, dest))
            }
            (TypeShape::Array(inner, len), Value::Sequence(items)) if items.len() == *len => {
                items.iter().try_for_each(|item| item.encode_shape(inner, dest))
            }
            (TypeShape::Option(_), Value::Option(None)) => {
                dest.push(0x00);
                Ok(())
            }
            (TypeShape::Option(inner), Value::Option(Some(value))) => {
                dest.push(0x01);
                value.encode_shape(inner, dest)
            }
            (TypeShape::Result(ok, _), Value::Result(Ok(value))) => {
                dest.push(0x00);
                value.encode_shape(ok, dest)
            }
            (TypeShape::Result(_, err), Value::Result(Err(value))) => {
                dest.push(0x01);
                value.encode_shape(err, dest)
            }
            (TypeShape::Tuple(shapes), Value::Tuple(items)) if shapes.len() == items.len() => shapes
                .iter()
                .zip(items)
                .try_for_each(|(shape, item)| item.encode_shape(shape, dest)),
            (TypeShape::Composite(fields), Value::Composite(items))
                if fields.len() == items.len() =>
            {
                fields.iter().zip(items).try_for_each(|(field, (_, item))| {
                    item.encode_shape(&field.shape, dest)
                })
            }
            (TypeShape::Variant(variants), Value::Variant { index, fields, .. }) => {
                let variant = variants
                    .get(usize::from(*index))
                    .filter(|variant| variant.fields.len() == fields.len())
                    .ok_or_else(|| mismatch(shape, self))?;
                dest.push(*index);
                variant
                    .fields
                    .iter()
                    .zip(fields)
                    .try_for_each(|(shape, item)| item.encode_shape(shape, dest))
            }
            _ => Err(mismatch(shape, self)),
        }
    }

    /// Renders the value as JSON for display and piping.
    ///
    /// Integers that overflow a JSON-safe `u64`/`i64` are rendered as
    /// decimal strings; bytes as `0x` hex.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Map, Value as Json};

        match self {
            Value::Bool(b) => Json::Bool(*b),
            Value::Unsigned(v) => match u64::try_from(*v) {
                Ok(small) => json!(small),
                Err(_) => Json::String(v.to_string()),
            },
            Value::Signed(v) => match i64::try_from(*v) {
                Ok(small) => json!(small),
                Err(_) => Json::String(v.to_string()),
            },
            Value::BigUnsigned(v) => match v.to_u64() {
                Some(small) => json!(small),
                None => Json::String(v.to_string()),
            },
            Value::Str(s) => Json::String(s.clone()),
            Value::Bytes(bytes) => Json::String(format!("0x{}", hex::encode(bytes))),
            Value::Sequence(items) | Value::Tuple(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Option(None) => Json::Null,
            Value::Option(Some(inner)) => inner.to_json(),
            Value::Result(Ok(inner)) => json!({ "ok": inner.to_json() }),
            Value::Result(Err(inner)) => json!({ "err": inner.to_json() }),
            Value::Composite(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Value::Variant { name, fields, .. } => {
                let payload = match fields.as_slice() {
                    [] => return Json::String(name.clone()),
                    [single] => single.to_json(),
                    many => Json::Array(many.iter().map(Value::to_json).collect()),
                };
                let mut object = Map::new();
                object.insert(name.clone(), payload);
                Json::Object(object)
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// A dynamic value paired with the shape it should be encoded as.
///
/// Lets runtime-typed parameters flow into anything that takes
/// `&dyn Encode`, storage keys in particular.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapedValue {
    pub shape: TypeShape,
    pub value: Value,
}

impl ShapedValue {
    pub fn new(shape: TypeShape, value: Value) -> Self {
        Self { shape, value }
    }
}

impl Encode for ShapedValue {
    fn encode_to(&self, dest: &mut Vec<u8>) -> CodecResult<()> {
        self.value.encode_shape(&self.shape, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_exact;

    fn decode(shape: &str, bytes: &[u8]) -> CodecResult<Value> {
        let shape: TypeShape = shape.parse().unwrap();
        let mut decoder = Decoder::new(bytes);
        let value = Value::decode_shape(&shape, &mut decoder)?;
        decoder.finish()?;
        Ok(value)
    }

    #[test]
    fn decodes_account_like_composite() {
        let bytes = (7u32, 1_000u128, true).encode().unwrap();
        let value = decode("{nonce: u32, free: u128, active: bool}", &bytes).unwrap();
        assert_eq!(
            value,
            Value::Composite(vec![
                ("nonce".into(), Value::Unsigned(7)),
                ("free".into(), Value::Unsigned(1_000)),
                ("active".into(), Value::Bool(true)),
            ])
        );
        assert_eq!(
            value.to_json(),
            serde_json::json!({ "nonce": 7, "free": 1000, "active": true })
        );
    }

    #[test]
    fn matches_static_decoding() {
        let typed: Vec<Option<(u16, String)>> = vec![Some((3, "x".into())), None];
        let bytes = typed.encode().unwrap();
        let dynamic = decode("vec<option<(u16, str)>>", &bytes).unwrap();
        let mut reencoded = Vec::new();
        dynamic
            .encode_shape(&"vec<option<(u16, str)>>".parse().unwrap(), &mut reencoded)
            .unwrap();
        assert_eq!(reencoded, bytes);
        assert_eq!(decode_exact::<Vec<Option<(u16, String)>>>(&reencoded), Ok(typed));
    }

    #[test]
    fn variant_index_selects_arm() {
        let value = decode("enum{Idle: (), Bonded: (u32, bool)}", &[1, 5, 0, 0, 0, 1]).unwrap();
        assert_eq!(
            value,
            Value::Variant {
                index: 1,
                name: "Bonded".into(),
                fields: vec![Value::Unsigned(5), Value::Bool(true)],
            }
        );
        assert_eq!(
            decode("enum{Idle: ()}", &[3]),
            Err(CodecError::InvalidVariant(3))
        );
    }

    #[test]
    fn errors_propagate_with_codec_variants() {
        assert_eq!(decode("bool", &[7]), Err(CodecError::InvalidBoolean(7)));
        assert_eq!(
            decode("result<u8, u8>", &[9, 0]),
            Err(CodecError::InvalidResultPrefix(9))
        );
        assert_eq!(decode("u8", &[1, 2]), Err(CodecError::TrailingBytes(1)));
    }

    #[test]
    fn sequence_count_is_bounded_by_input() {
        // Four bytes declaring 2^25 - 1 unit elements.
        assert!(matches!(
            decode("vec<()>", &[0xfe, 0xff, 0xff, 0x07]),
            Err(CodecError::LengthOverflow { count: 33_554_431, remaining: 0 })
        ));
        // Three u32s promised, one byte delivered.
        assert_eq!(
            decode("vec<u32>", &[0x0c, 0x01]),
            Err(CodecError::LengthOverflow { count: 3, remaining: 1 })
        );
        assert_eq!(
            decode("vec<()>", &[0x08]),
            Ok(Value::Sequence(vec![Value::Tuple(vec![]), Value::Tuple(vec![])]))
        );
    }

    #[test]
    fn failed_dynamic_decode_rewinds() {
        let bytes = [1u8, 9];
        let mut decoder = Decoder::new(&bytes);
        let shape: TypeShape = "(u8, bool)".parse().unwrap();
        assert!(Value::decode_shape(&shape, &mut decoder).is_err());
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn large_integers_render_as_strings() {
        assert_eq!(
            Value::Unsigned(u128::MAX).to_json(),
            serde_json::json!(u128::MAX.to_string())
        );
        assert_eq!(Value::Bytes(vec![0xab, 0x01]).to_json(), serde_json::json!("0xab01"));
    }

    #[test]
    fn shaped_value_rejects_out_of_range() {
        let shaped = ShapedValue::new(TypeShape::U8, Value::Unsigned(300));
        assert!(matches!(shaped.encode(), Err(CodecError::ShapeMismatch(_))));

        let shaped = ShapedValue::new(TypeShape::U16, Value::Unsigned(300));
        assert_eq!(shaped.encode().unwrap(), vec![0x2c, 0x01]);
    }
}
