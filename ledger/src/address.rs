//! # Addresses
//!
//! Every participant in the ledger -- accounts, assets, strategies, fee
//! collectors, and the ledger instance itself -- is identified by a 20-byte
//! [`Address`]. The ledger never interprets the bytes; it only compares them
//! and uses them as table keys.
//!
//! Addresses serialize as hex strings (not byte arrays) so that
//! address-keyed maps survive the trip through JSON, where map keys must be
//! strings.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A 20-byte participant identifier.
///
/// The all-zero address is reserved: it is never a valid account, collector,
/// manager, or withdrawer, and construction-time validation rejects it
/// wherever a real participant is required.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// The reserved all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Creates an `Address` from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Returns the raw 20-byte identifier.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns `true` if this is the reserved zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Returns the hex-encoded address.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a hex-encoded address (40 hex characters, no prefix).
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Derives a deterministic test/demo address from a label.
    ///
    /// The label's UTF-8 bytes are copied into the low bytes of the address,
    /// truncated or zero-padded to 20 bytes. Distinct short labels therefore
    /// produce distinct addresses. Not for production identity.
    pub fn from_label(label: &str) -> Self {
        let mut arr = [0u8; 20];
        let bytes = label.as_bytes();
        let n = bytes.len().min(20);
        arr[..n].copy_from_slice(&bytes[..n]);
        Self(arr)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Hex-string serde so that HashMap<Address, V> serializes as a JSON object.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn hex_roundtrip() {
        let addr = Address::from_label("treasury");
        let recovered = Address::from_hex(&addr.to_hex()).unwrap();
        assert_eq!(addr, recovered);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(Address::from_hex("deadbeef").is_err());
    }

    #[test]
    fn labels_are_deterministic_and_distinct() {
        assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    }

    #[test]
    fn serializes_as_hex_string() {
        let addr = Address::from_label("alice");
        let json = serde_json::to_string(&addr).expect("serialize");
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));

        let recovered: Address = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(addr, recovered);
    }

    #[test]
    fn works_as_json_map_key() {
        use std::collections::HashMap;

        let mut map: HashMap<Address, u64> = HashMap::new();
        map.insert(Address::from_label("alice"), 42);

        let json = serde_json::to_string(&map).expect("serialize");
        let recovered: HashMap<Address, u64> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered.get(&Address::from_label("alice")), Some(&42));
    }
}
