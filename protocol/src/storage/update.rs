//! Wire shapes returned by the storage RPCs.
//!
//! A `state_queryStorageAt` call answers with a list of [`StorageUpdate`]s,
//! one per block it looked at. Each update carries `(key, value)` pairs
//! where a `null` value means the key is absent.
//!
//! ```json
//! { "block": "0x…", "changes": [["0x26aa…", "0x0100…"], ["0x26ab…", null]] }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::hex::{from_hex, to_hex};
use super::key::StorageKey;
use crate::config::BLOCK_HASH_LENGTH;

/// A 32-byte block hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHash(pub [u8; BLOCK_HASH_LENGTH]);

impl BlockHash {
    pub fn as_bytes(&self) -> &[u8; BLOCK_HASH_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

/// Errors from parsing a block hash.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BlockHashError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("block hash must be 32 bytes, got {0}")]
    Length(usize),
}

impl FromStr for BlockHash {
    type Err = BlockHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = from_hex(s)?;
        let array: [u8; BLOCK_HASH_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| BlockHashError::Length(bytes.len()))?;
        Ok(Self(array))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self.to_hex())
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for BlockHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        super::hex::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for BlockHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = super::hex::deserialize(deserializer)?;
        let len = bytes.len();
        bytes
            .try_into()
            .map(Self)
            .map_err(|_| serde::de::Error::custom(BlockHashError::Length(len)))
    }
}

/// Raw bytes that travel as `0x` hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HexBytes(#[serde(with = "super::hex")] pub Vec<u8>);

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One `(key, value)` change. `None` means the key holds no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChange(pub StorageKey, pub Option<HexBytes>);

/// The set of changes one storage page request produced at one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUpdate {
    /// Block the values were read at. Some nodes omit it.
    #[serde(default)]
    pub block: Option<BlockHash>,
    pub changes: Vec<StorageChange>,
}

impl StorageUpdate {
    pub fn new(block: Option<BlockHash>, changes: Vec<StorageChange>) -> Self {
        Self { block, changes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_node_payload() {
        let json = serde_json::json!({
            "block": format!("0x{}", "ab".repeat(32)),
            "changes": [["0x01", "0xff00"], ["0x02", null]]
        });
        let update: StorageUpdate = serde_json::from_value(json).unwrap();
        assert_eq!(update.block, Some(BlockHash([0xab; 32])));
        assert_eq!(
            update.changes,
            vec![
                StorageChange(StorageKey::new(vec![1]), Some(HexBytes(vec![0xff, 0x00]))),
                StorageChange(StorageKey::new(vec![2]), None),
            ]
        );
    }

    #[test]
    fn missing_block_is_tolerated() {
        let update: StorageUpdate = serde_json::from_str(r#"{"changes": []}"#).unwrap();
        assert!(update.block.is_none());
    }

    #[test]
    fn block_hash_length_is_enforced() {
        assert_eq!(
            "0x0102".parse::<BlockHash>(),
            Err(BlockHashError::Length(2))
        );
        let json = serde_json::json!({ "block": "0x0102", "changes": [] });
        assert!(serde_json::from_value::<StorageUpdate>(json).is_err());
    }

    #[test]
    fn bad_hex_keeps_the_hex_error() {
        assert!(matches!(
            "0xzz".parse::<BlockHash>(),
            Err(BlockHashError::Hex(_))
        ));
    }
}
