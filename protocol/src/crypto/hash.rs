//! # Hashing Utilities
//!
//! Hash functions used to derive storage keys. Two families are supported,
//! and nothing else without a very good reason:
//!
//! - **BLAKE3**: the default. Storage prefixes are `blake3_128(module) ++
//!   blake3_128(item)`, and most map parameters are hashed with one of the
//!   BLAKE3 variants of [`StorageHasher`].
//! - **SHA-256**: for interoperability with storage items that were laid
//!   out by external tooling.
//!
//! ## Concat hashers
//!
//! A plain hasher throws the parameter away; a *concat* hasher appends the
//! encoded parameter after its digest. That costs key length but lets a
//! caller who enumerated keys by prefix recover the parameters from the key
//! itself, which is what makes map iteration useful.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the input data.
///
/// # Example
///
/// ```
/// use nova_storage::crypto::sha256;
///
/// let hash = sha256(b"NOVA storage");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute the BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use nova_storage::crypto::blake3_hash;
///
/// let hash = blake3_hash(b"NOVA storage");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// The first 16 bytes of the BLAKE3 digest.
///
/// 128 bits is plenty for storage prefixes: the input space is a handful
/// of module and item names, not adversarial data.
pub fn blake3_128(data: &[u8]) -> [u8; 16] {
    let mut output = [0u8; 16];
    output.copy_from_slice(&blake3_hash(data)[..16]);
    output
}

/// Strategy for turning one encoded key parameter into key bytes.
///
/// Declared per storage path and per parameter position; see
/// [`StoragePath`](crate::storage::StoragePath).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(non_camel_case_types)]
pub enum StorageHasher {
    /// The encoded parameter is used as-is.
    Identity,
    /// 16-byte BLAKE3 digest.
    Blake3_128,
    /// 16-byte BLAKE3 digest followed by the encoded parameter.
    Blake3_128Concat,
    /// Full 32-byte BLAKE3 digest.
    Blake3_256,
    /// Full 32-byte SHA-256 digest.
    Sha256,
}

impl StorageHasher {
    /// Hashes an encoded parameter into its key segment.
    pub fn hash(self, encoded: &[u8]) -> Vec<u8> {
        match self {
            Self::Identity => encoded.to_vec(),
            Self::Blake3_128 => blake3_128(encoded).to_vec(),
            Self::Blake3_128Concat => {
                let mut out = Vec::with_capacity(16 + encoded.len());
                out.extend_from_slice(&blake3_128(encoded));
                out.extend_from_slice(encoded);
                out
            }
            Self::Blake3_256 => blake3_hash(encoded).to_vec(),
            Self::Sha256 => sha256(encoded).to_vec(),
        }
    }

    /// Number of digest bytes that precede the raw parameter, for hashers
    /// that keep it. `None` for hashers that discard the parameter.
    pub fn concat_offset(self) -> Option<usize> {
        match self {
            Self::Identity => Some(0),
            Self::Blake3_128Concat => Some(16),
            Self::Blake3_128 | Self::Blake3_256 | Self::Sha256 => None,
        }
    }

    /// Parses the names used in registry files and on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "identity" => Some(Self::Identity),
            "blake3_128" => Some(Self::Blake3_128),
            "blake3_128_concat" => Some(Self::Blake3_128Concat),
            "blake3_256" => Some(Self::Blake3_256),
            "sha256" => Some(Self::Sha256),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn blake3_128_is_digest_prefix() {
        let full = blake3_hash(b"System");
        assert_eq!(&blake3_128(b"System")[..], &full[..16]);
    }

    #[test]
    fn hasher_output_lengths() {
        let param = [1u8, 2, 3, 4];
        assert_eq!(StorageHasher::Identity.hash(&param), param.to_vec());
        assert_eq!(StorageHasher::Blake3_128.hash(&param).len(), 16);
        assert_eq!(StorageHasher::Blake3_256.hash(&param).len(), 32);
        assert_eq!(StorageHasher::Sha256.hash(&param).len(), 32);

        let concat = StorageHasher::Blake3_128Concat.hash(&param);
        assert_eq!(concat.len(), 20);
        assert_eq!(&concat[16..], &param);
    }

    #[test]
    fn names_round_trip() {
        for hasher in [
            StorageHasher::Identity,
            StorageHasher::Blake3_128,
            StorageHasher::Blake3_128Concat,
            StorageHasher::Blake3_256,
            StorageHasher::Sha256,
        ] {
            let name = serde_json::to_value(hasher).unwrap();
            let name = name.as_str().unwrap().to_string();
            assert_eq!(StorageHasher::from_name(&name), Some(hasher));
        }
    }
}
