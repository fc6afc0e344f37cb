//! Address - 20-byte account/contract identifier in `0x`-prefixed hex

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account or contract address as handed out by the wallet provider.
///
/// Stored lowercase; comparison is case-insensitive because providers mix
/// checksummed and plain forms for the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 20 bytes, got {0}")]
    Length(usize),
    #[error("invalid hex: {0}")]
    Hex(String),
}

impl Address {
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or(AddressError::MissingPrefix)?;
        let bytes = hex::decode(body).map_err(|e| AddressError::Hex(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(AddressError::Length(bytes.len()));
        }
        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Navbar label: `0x123...cdef` (chars 0..5, then 38..42).
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..5], &self.0[38..42])
    }
}

impl FromStr for Address {
    type Err = AddressError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl TryFrom<String> for Address {
    type Error = AddressError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(&value) }
}

impl From<Address> for String {
    fn from(value: Address) -> Self { value.0 }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: &str = "0x90F79bf6EB2c4f870365E785982E1f101E93b906";

    #[test]
    fn parses_and_normalizes_case() {
        let a = Address::parse(USER).unwrap();
        assert_eq!(a.as_str(), "0x90f79bf6eb2c4f870365e785982e1f101e93b906");
        assert_eq!(a, Address::parse(&USER.to_lowercase()).unwrap());
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(Address::parse("90f79bf6"), Err(AddressError::MissingPrefix));
        assert_eq!(Address::parse("0x1234"), Err(AddressError::Length(2)));
        assert!(matches!(Address::parse("0xzz"), Err(AddressError::Hex(_))));
    }

    #[test]
    fn short_label() {
        let a = Address::parse(USER).unwrap();
        assert_eq!(a.short(), "0x90f...b906");
    }

    #[test]
    fn serde_roundtrip_validates() {
        let a: Address = serde_json::from_str(&format!("\"{}\"", USER)).unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), format!("\"{}\"", a.as_str()));
        assert!(serde_json::from_str::<Address>("\"0x12\"").is_err());
    }
}
