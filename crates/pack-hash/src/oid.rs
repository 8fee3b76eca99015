use std::fmt;
use std::str::FromStr;

use crate::{hex, HashError};

/// Length of a SHA-1 object id in bytes.
pub const ID_LEN: usize = 20;

/// A 20-byte object identifier — the SHA-1 of an object's content.
///
/// Packs reference delta bases by this id, and the decoder keys all of
/// its bookkeeping on it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; ID_LEN]);

impl ObjectId {
    /// The null id (all zeros).
    pub const ZERO: Self = Self([0u8; ID_LEN]);

    /// Create an id from a raw 20-byte digest slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HashError> {
        if bytes.len() != ID_LEN {
            return Err(HashError::InvalidDigestLength {
                expected: ID_LEN,
                actual: bytes.len(),
            });
        }
        let mut id = [0u8; ID_LEN];
        id.copy_from_slice(bytes);
        Ok(Self(id))
    }

    /// Parse an id from its 40-character hex form.
    pub fn from_hex(hex_str: &str) -> Result<Self, HashError> {
        let mut id = [0u8; ID_LEN];
        hex::decode(hex_str, &mut id)?;
        Ok(Self(id))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// First byte of the digest (fan-out style indexing).
    pub fn first_byte(&self) -> u8 {
        self.0[0]
    }

    /// Whether this is the all-zeros id.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl From<[u8; ID_LEN]> for ObjectId {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..8])
    }
}

impl FromStr for ObjectId {
    type Err = HashError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const HEX: &str = "da39a3ee5e6b4b0d3255bfef95601890afd80709";

    #[test]
    fn from_hex_and_back() {
        let id = ObjectId::from_hex(HEX).unwrap();
        assert_eq!(id.to_hex(), HEX);
        assert_eq!(id.as_bytes().len(), ID_LEN);
    }

    #[test]
    fn display_roundtrip() {
        let id = ObjectId::from_hex(HEX).unwrap();
        let parsed: ObjectId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn debug_shows_short_id() {
        let id = ObjectId::from_hex(HEX).unwrap();
        assert_eq!(format!("{id:?}"), "ObjectId(da39a3ee)");
    }

    #[test]
    fn from_bytes_wrong_length() {
        let err = ObjectId::from_bytes(&[0; 10]).unwrap_err();
        assert!(matches!(
            err,
            HashError::InvalidDigestLength {
                expected: 20,
                actual: 10
            }
        ));
    }

    #[test]
    fn from_hex_wrong_length() {
        assert!(matches!(
            ObjectId::from_hex("abcd").unwrap_err(),
            HashError::InvalidHexLength { .. }
        ));
    }

    #[test]
    fn zero_id() {
        assert!(ObjectId::ZERO.is_zero());
        assert!(!ObjectId::from_hex(HEX).unwrap().is_zero());
    }

    #[test]
    fn first_byte() {
        assert_eq!(ObjectId::from_hex(HEX).unwrap().first_byte(), 0xda);
    }

    #[test]
    fn usable_as_map_key() {
        let id = ObjectId::from_hex(HEX).unwrap();
        let mut map = HashMap::new();
        map.insert(id, 42u64);
        assert_eq!(map.get(&id), Some(&42));
    }

    #[test]
    fn ordering_is_bytewise() {
        let a = ObjectId::from_hex("0000000000000000000000000000000000000001").unwrap();
        let b = ObjectId::from_hex("0000000000000000000000000000000000000002").unwrap();
        assert!(a < b);
    }
}
