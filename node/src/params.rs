//! Parsing of typed key parameters given on the command line.
//!
//! A parameter is `type:value`. The type is any scalar shape (`bool`,
//! `u8`..`u128`, `i8`..`i128`, `compact`, `str`) or one of the byte forms:
//! `hex` appends the bytes as they are, `bytes` prefixes them with their
//! compact length. A group is a comma-separated list of parameters and
//! builds one key. Inside a group, `\,` is a literal comma and `\\` a
//! literal backslash, so `str:a\,b` is the single string `a,b`.

use anyhow::{anyhow, bail, Context, Result};

use nova_storage::registry::{ShapedValue, TypeShape, Value};
use nova_storage::storage::hex::from_hex;

/// Parses one `type:value` parameter.
pub fn parse_param(text: &str) -> Result<ShapedValue> {
    let (kind, raw) = text
        .split_once(':')
        .ok_or_else(|| anyhow!("parameter '{}' is not of the form type:value", text))?;

    let (shape, value) = match kind {
        "hex" => {
            let bytes = from_hex(raw).with_context(|| format!("invalid hex in '{}'", text))?;
            (TypeShape::FixedBytes(bytes.len()), Value::Bytes(bytes))
        }
        "bytes" => {
            let bytes = from_hex(raw).with_context(|| format!("invalid hex in '{}'", text))?;
            (TypeShape::Bytes, Value::Bytes(bytes))
        }
        "str" => (TypeShape::Str, Value::Str(raw.to_string())),
        "bool" => {
            let b = raw
                .parse::<bool>()
                .with_context(|| format!("invalid bool in '{}'", text))?;
            (TypeShape::Bool, Value::Bool(b))
        }
        other => {
            let shape: TypeShape = other
                .parse()
                .map_err(|e| anyhow!("unknown parameter type '{}': {}", other, e))?;
            let value = match shape {
                TypeShape::U8
                | TypeShape::U16
                | TypeShape::U32
                | TypeShape::U64
                | TypeShape::U128
                | TypeShape::Compact => Value::Unsigned(
                    raw.parse::<u128>()
                        .with_context(|| format!("invalid unsigned integer in '{}'", text))?,
                ),
                TypeShape::I8
                | TypeShape::I16
                | TypeShape::I32
                | TypeShape::I64
                | TypeShape::I128 => Value::Signed(
                    raw.parse::<i128>()
                        .with_context(|| format!("invalid signed integer in '{}'", text))?,
                ),
                _ => bail!("parameter type '{}' is not supported on the command line", other),
            };
            (shape, value)
        }
    };

    Ok(ShapedValue::new(shape, value))
}

/// Parses a comma-separated parameter group. An empty string is an empty group.
pub fn parse_group(text: &str) -> Result<Vec<ShapedValue>> {
    let parts = split_group(text)?;
    parts
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(parse_param)
        .collect()
}

/// Splits on unescaped commas and resolves `\,` and `\\`.
fn split_group(text: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ (',' | '\\')) => current.push(escaped),
                Some(other) => bail!("unknown escape '\\{}' in '{}'", other, text),
                None => bail!("dangling '\\' at the end of '{}'", text),
            },
            ',' => parts.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    parts.push(current);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_storage::codec::Encode;

    #[test]
    fn integers_encode_little_endian() {
        let param = parse_param("u32:258").unwrap();
        assert_eq!(param.encode().unwrap(), vec![2, 1, 0, 0]);
    }

    #[test]
    fn hex_is_raw_and_bytes_is_prefixed() {
        assert_eq!(parse_param("hex:0xabcd").unwrap().encode().unwrap(), vec![0xab, 0xcd]);
        assert_eq!(
            parse_param("bytes:0xabcd").unwrap().encode().unwrap(),
            vec![0x08, 0xab, 0xcd]
        );
    }

    #[test]
    fn out_of_range_value_fails_at_encode() {
        let param = parse_param("u8:300").unwrap();
        assert!(param.encode().is_err());
    }

    #[test]
    fn groups_split_on_commas() {
        let group = parse_group("u8:1, str:ab").unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[1].encode().unwrap(), vec![0x08, b'a', b'b']);
        assert!(parse_group("").unwrap().is_empty());
    }

    #[test]
    fn escaped_commas_stay_in_strings() {
        let group = parse_group(r"str:a\,b, u8:7").unwrap();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].encode().unwrap(), vec![0x0c, b'a', b',', b'b']);

        let group = parse_group(r"str:c:\\dir").unwrap();
        assert_eq!(group[0].encode().unwrap(), vec![0x18, b'c', b':', b'\\', b'd', b'i', b'r']);

        assert!(parse_group(r"str:a\").is_err());
        assert!(parse_group(r"str:a\n").is_err());
    }

    #[test]
    fn rejects_malformed_parameters() {
        assert!(parse_param("42").is_err());
        assert!(parse_param("u9:1").is_err());
        assert!(parse_param("vec<u8>:1").is_err());
        assert!(parse_param("u32:abc").is_err());
    }
}
