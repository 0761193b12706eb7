//! # Type Shapes
//!
//! A [`TypeShape`] tells the dynamic decoder what bytes to expect for a
//! storage item. Shapes come from the runtime type registry, usually loaded
//! from a registry file written in a small textual grammar:
//!
//! ```text
//! bool | u8 .. u128 | i8 .. i128 | compact | str | bytes
//! vec<T>              option<T>            result<T, E>
//! (T1, T2, ...)       [T; N]               {name: T, other: U}
//! enum{Idle: (), Active: (u32, bool)}
//! ```
//!
//! `[u8; N]` parses to [`TypeShape::FixedBytes`] so hashes and account ids
//! come out as byte strings rather than lists of numbers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A named field of a composite shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    /// Field name.
    pub name: String,
    /// Field shape.
    pub shape: TypeShape,
}

/// One arm of a variant shape. The arm index on the wire is its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantShape {
    /// Variant name.
    pub name: String,
    /// Positional payload shapes (empty for unit variants).
    pub fields: Vec<TypeShape>,
}

/// Decode shape of a storage value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeShape {
    Bool,
    U8,
    U16,
    U32,
    U64,
    U128,
    I8,
    I16,
    I32,
    I64,
    I128,
    /// Arbitrary-precision compact integer.
    Compact,
    /// Length-prefixed UTF-8 string.
    Str,
    /// Length-prefixed byte string.
    Bytes,
    /// Byte array of fixed length, no prefix.
    FixedBytes(usize),
    /// Length-prefixed sequence.
    Sequence(Box<TypeShape>),
    /// Fixed-length array of a non-byte element, no prefix.
    Array(Box<TypeShape>, usize),
    Option(Box<TypeShape>),
    Result(Box<TypeShape>, Box<TypeShape>),
    Tuple(Vec<TypeShape>),
    /// Struct with named fields, encoded positionally.
    Composite(Vec<FieldShape>),
    /// Tagged union with a one-byte variant index.
    Variant(Vec<VariantShape>),
}

impl TypeShape {
    /// Convenience constructor for `vec<T>`.
    pub fn sequence(inner: TypeShape) -> Self {
        Self::Sequence(Box::new(inner))
    }

    /// Convenience constructor for `option<T>`.
    pub fn option(inner: TypeShape) -> Self {
        Self::Option(Box::new(inner))
    }

    /// Convenience constructor for `result<T, E>`.
    pub fn result(ok: TypeShape, err: TypeShape) -> Self {
        Self::Result(Box::new(ok), Box::new(err))
    }

    /// Fewest bytes a value of this shape can encode to.
    pub fn min_encoded_len(&self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 => 4,
            Self::U64 | Self::I64 => 8,
            Self::U128 | Self::I128 => 16,
            Self::Compact | Self::Str | Self::Bytes | Self::Sequence(_) => 1,
            Self::Option(_) | Self::Result(..) | Self::Variant(_) => 1,
            Self::FixedBytes(len) => *len,
            Self::Array(inner, len) => inner.min_encoded_len().saturating_mul(*len),
            Self::Tuple(items) => items
                .iter()
                .fold(0, |sum, item| sum.saturating_add(item.min_encoded_len())),
            Self::Composite(fields) => fields
                .iter()
                .fold(0, |sum, field| sum.saturating_add(field.shape.min_encoded_len())),
        }
    }

    fn primitive(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Self::Bool,
            "u8" => Self::U8,
            "u16" => Self::U16,
            "u32" => Self::U32,
            "u64" => Self::U64,
            "u128" => Self::U128,
            "i8" => Self::I8,
            "i16" => Self::I16,
            "i32" => Self::I32,
            "i64" => Self::I64,
            "i128" => Self::I128,
            "compact" => Self::Compact,
            "str" => Self::Str,
            "bytes" => Self::Bytes,
            _ => return None,
        })
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, items: &[TypeShape]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            Ok(())
        }

        match self {
            Self::Bool => write!(f, "bool"),
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::U32 => write!(f, "u32"),
            Self::U64 => write!(f, "u64"),
            Self::U128 => write!(f, "u128"),
            Self::I8 => write!(f, "i8"),
            Self::I16 => write!(f, "i16"),
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
            Self::I128 => write!(f, "i128"),
            Self::Compact => write!(f, "compact"),
            Self::Str => write!(f, "str"),
            Self::Bytes => write!(f, "bytes"),
            Self::FixedBytes(n) => write!(f, "[u8; {}]", n),
            Self::Sequence(inner) => write!(f, "vec<{}>", inner),
            Self::Array(inner, n) => write!(f, "[{}; {}]", inner, n),
            Self::Option(inner) => write!(f, "option<{}>", inner),
            Self::Result(ok, err) => write!(f, "result<{}, {}>", ok, err),
            Self::Tuple(items) => {
                write!(f, "(")?;
                list(f, items)?;
                write!(f, ")")
            }
            Self::Composite(fields) => {
                write!(f, "{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.shape)?;
                }
                write!(f, "}}")
            }
            Self::Variant(variants) => {
                write!(f, "enum{{")?;
                for (i, variant) in variants.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: (", variant.name)?;
                    list(f, &variant.fields)?;
                    write!(f, ")")?;
                }
                write!(f, "}}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// A shape string that does not follow the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid shape at offset {offset}: {message}")]
pub struct ShapeParseError {
    /// Byte offset into the input where parsing stopped.
    pub offset: usize,
    /// What the parser expected.
    pub message: String,
}

impl FromStr for TypeShape {
    type Err = ShapeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parser = ShapeParser { input, pos: 0 };
        let shape = parser.shape()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(shape)
    }
}

struct ShapeParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ShapeParser<'a> {
    fn error(&self, message: impl Into<String>) -> ShapeParseError {
        ShapeParseError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ShapeParseError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn ident(&mut self) -> Result<&'a str, ShapeParseError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn number(&mut self) -> Result<usize, ShapeParseError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let value = rest[..len]
            .parse()
            .map_err(|_| self.error("expected array length"))?;
        self.pos += len;
        Ok(value)
    }

    /// Comma-separated shapes up to (and including) `close`.
    fn shape_list(&mut self, close: char) -> Result<Vec<TypeShape>, ShapeParseError> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.shape()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect(',')?;
        }
    }

    fn shape(&mut self) -> Result<TypeShape, ShapeParseError> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                Ok(TypeShape::Tuple(self.shape_list(')')?))
            }
            Some('[') => {
                self.pos += 1;
                let inner = self.shape()?;
                self.expect(';')?;
                let len = self.number()?;
                self.expect(']')?;
                Ok(match inner {
                    TypeShape::U8 => TypeShape::FixedBytes(len),
                    other => TypeShape::Array(Box::new(other), len),
                })
            }
            Some('{') => {
                self.pos += 1;
                let mut fields = Vec::new();
                if self.eat('}') {
                    return Ok(TypeShape::Composite(fields));
                }
                loop {
                    let name = self.ident()?.to_string();
                    self.expect(':')?;
                    let shape = self.shape()?;
                    fields.push(FieldShape { name, shape });
                    if self.eat('}') {
                        return Ok(TypeShape::Composite(fields));
                    }
                    self.expect(',')?;
                }
            }
            Some(_) => {
                let start = self.pos;
                let name = self.ident()?;
                match name {
                    "vec" => {
                        self.expect('<')?;
                        let inner = self.shape()?;
                        self.expect('>')?;
                        Ok(TypeShape::sequence(inner))
                    }
                    "option" => {
                        self.expect('<')?;
                        let inner = self.shape()?;
                        self.expect('>')?;
                        Ok(TypeShape::option(inner))
                    }
                    "result" => {
                        self.expect('<')?;
                        let ok = self.shape()?;
                        self.expect(',')?;
                        let err = self.shape()?;
                        self.expect('>')?;
                        Ok(TypeShape::result(ok, err))
                    }
                    "enum" => self.variants(),
                    other => TypeShape::primitive(other).ok_or_else(|| {
                        self.pos = start;
                        self.error(format!("unknown type '{}'", other))
                    }),
                }
            }
            None => Err(self.error("unexpected end of shape")),
        }
    }

    fn variants(&mut self) -> Result<TypeShape, ShapeParseError> {
        self.expect('{')?;
        let mut variants = Vec::new();
        loop {
            let name = self.ident()?.to_string();
            self.expect(':')?;
            self.expect('(')?;
            let fields = self.shape_list(')')?;
            variants.push(VariantShape { name, fields });
            if self.eat('}') {
                break;
            }
            self.expect(',')?;
        }
        if variants.len() > 256 {
            return Err(self.error("more than 256 variants"));
        }
        Ok(TypeShape::Variant(variants))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TypeShape {
        s.parse().unwrap()
    }

    #[test]
    fn primitives() {
        assert_eq!(parse("u32"), TypeShape::U32);
        assert_eq!(parse(" bool "), TypeShape::Bool);
        assert_eq!(parse("compact"), TypeShape::Compact);
    }

    #[test]
    fn nested_generics() {
        assert_eq!(
            parse("vec<option<(u32, bool)>>"),
            TypeShape::sequence(TypeShape::option(TypeShape::Tuple(vec![
                TypeShape::U32,
                TypeShape::Bool
            ])))
        );
        assert_eq!(
            parse("result<u128, str>"),
            TypeShape::result(TypeShape::U128, TypeShape::Str)
        );
    }

    #[test]
    fn byte_arrays_become_fixed_bytes() {
        assert_eq!(parse("[u8; 32]"), TypeShape::FixedBytes(32));
        assert_eq!(
            parse("[u16;3]"),
            TypeShape::Array(Box::new(TypeShape::U16), 3)
        );
    }

    #[test]
    fn composites_and_variants() {
        let shape = parse("{free: u128, reserved: u128, flags: enum{None: (), Some: (u8)}}");
        let TypeShape::Composite(fields) = shape else {
            panic!("expected composite");
        };
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "free");
        let TypeShape::Variant(variants) = &fields[2].shape else {
            panic!("expected variant");
        };
        assert_eq!(variants[0].fields, vec![]);
        assert_eq!(variants[1].fields, vec![TypeShape::U8]);
    }

    #[test]
    fn display_parses_back() {
        for text in [
            "vec<[u8; 32]>",
            "option<result<(), str>>",
            "{a: u8, b: vec<compact>}",
            "enum{A: (), B: (u32, bool)}",
            "[i64; 2]",
        ] {
            let shape = parse(text);
            assert_eq!(parse(&shape.to_string()), shape, "{}", text);
        }
    }

    #[test]
    fn minimum_widths() {
        assert_eq!(parse("{nonce: u32, free: u128, active: bool}").min_encoded_len(), 21);
        assert_eq!(parse("vec<u64>").min_encoded_len(), 1);
        assert_eq!(parse("[u8; 32]").min_encoded_len(), 32);
        assert_eq!(parse("[u16; 3]").min_encoded_len(), 6);
        assert_eq!(parse("()").min_encoded_len(), 0);
        assert_eq!(parse("((), ())").min_encoded_len(), 0);
    }

    #[test]
    fn errors_carry_offset() {
        let err = "vec<u33>".parse::<TypeShape>().unwrap_err();
        assert_eq!(err.offset, 4);

        assert!("vec<u8".parse::<TypeShape>().is_err());
        assert!("u8 u8".parse::<TypeShape>().is_err());
        assert!("".parse::<TypeShape>().is_err());
    }
}
