use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors raised while parsing a sensor identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdError {
    #[error("expected {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid hex digit at position {0}")]
    InvalidDigit(usize),
}

/// Opaque 12-byte sensor identifier.
///
/// The canonical textual form is 24 lowercase hex characters. Ordering is
/// lexicographic over the raw bytes, which coincides with ordering over the
/// canonical hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub const LENGTH: usize = 12;

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parse the canonical 24-character hex form.
    pub fn parse(s: &str) -> Result<Self, ObjectIdError> {
        let raw = s.as_bytes();

        if raw.len() != Self::LENGTH * 2 {
            return Err(ObjectIdError::InvalidLength {
                expected: Self::LENGTH * 2,
                actual: raw.len(),
            });
        }

        let mut bytes = [0u8; 12];

        for (idx, chunk) in raw.chunks_exact(2).enumerate() {
            let hi = hex_value(chunk[0]).ok_or(ObjectIdError::InvalidDigit(idx * 2))?;
            let lo = hex_value(chunk[1]).ok_or(ObjectIdError::InvalidDigit(idx * 2 + 1))?;
            bytes[idx] = (hi << 4) | lo;
        }

        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(Self::LENGTH * 2);

        for byte in self.0 {
            out.push(hex_digit(byte >> 4));
            out.push(hex_digit(byte & 0x0f));
        }

        out
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn hex_digit(v: u8) -> char {
    match v {
        0..=9 => (b'0' + v) as char,
        _ => (b'a' + v - 10) as char,
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let id = ObjectId::parse("5c7c3bbd9019a1fb0a4567ef").unwrap();
        assert_eq!(id.to_hex(), "5c7c3bbd9019a1fb0a4567ef");
        assert_eq!(id, "5c7c3bbd9019a1fb0a4567ef".parse().unwrap());
    }

    #[test]
    fn test_uppercase_input_normalizes() {
        let id = ObjectId::parse("5C7C3BBD9019A1FB0A4567EF").unwrap();
        assert_eq!(id.to_hex(), "5c7c3bbd9019a1fb0a4567ef");
    }

    #[test]
    fn test_invalid_length() {
        assert_eq!(
            ObjectId::parse("abc"),
            Err(ObjectIdError::InvalidLength {
                expected: 24,
                actual: 3
            })
        );
    }

    #[test]
    fn test_invalid_digit() {
        assert_eq!(
            ObjectId::parse("zc7c3bbd9019a1fb0a4567ef"),
            Err(ObjectIdError::InvalidDigit(0))
        );
    }

    #[test]
    fn test_ordering_matches_hex_ordering() {
        let a = ObjectId::parse("000000000000000000000001").unwrap();
        let b = ObjectId::parse("0000000000000000000000ff").unwrap();
        let c = ObjectId::parse("010000000000000000000000").unwrap();

        assert!(a < b);
        assert!(b < c);
        assert!(a.to_hex() < b.to_hex());
        assert!(b.to_hex() < c.to_hex());
    }

    #[test]
    fn test_serde_string_form() {
        let id = ObjectId::parse("5c7c3bbd9019a1fb0a4567ef").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5c7c3bbd9019a1fb0a4567ef\"");

        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
