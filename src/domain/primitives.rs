//! Domain primitives: Address, HexKey, Side.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("missing 0x prefix: {0}")]
    MissingPrefix(String),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("expected {expected} bytes, got {actual}: {value}")]
    InvalidLength {
        value: String,
        expected: usize,
        actual: usize,
    },
}

fn normalize_hex(value: &str, expected_len: usize) -> Result<String, AddressParseError> {
    let trimmed = value.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| AddressParseError::MissingPrefix(value.to_string()))?;
    let bytes =
        hex::decode(body).map_err(|_| AddressParseError::InvalidHex(value.to_string()))?;
    if bytes.len() != expected_len {
        return Err(AddressParseError::InvalidLength {
            value: value.to_string(),
            expected: expected_len,
            actual: bytes.len(),
        });
    }
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// 20-byte account or contract address, lowercase `0x`-prefixed hex.
///
/// Entity ids are derived from addresses, so two spellings of the same address must
/// collapse to one string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub const LEN: usize = 20;

    /// Parse and normalize an address.
    ///
    /// # Errors
    /// Returns an error if the input is not `0x` followed by 40 hex digits.
    pub fn parse(value: &str) -> Result<Self, AddressParseError> {
        normalize_hex(value, Self::LEN).map(Address)
    }

    /// Pseudo-token standing in for the chain's native asset.
    pub fn native() -> Self {
        Address(format!("0x{}", "e".repeat(40)))
    }

    /// The zero address.
    pub fn zero() -> Self {
        Address(format!("0x{}", "0".repeat(40)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

/// bytes32 key emitted by the contracts (order keys, position keys).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HexKey(String);

impl HexKey {
    pub const LEN: usize = 32;

    /// Parse and normalize a bytes32 hex key.
    ///
    /// # Errors
    /// Returns an error if the input is not `0x` followed by 64 hex digits.
    pub fn parse(value: &str) -> Result<Self, AddressParseError> {
        normalize_hex(value, Self::LEN).map(HexKey)
    }

    /// Format raw key bytes.
    ///
    /// # Errors
    /// Returns an error if `bytes` is not exactly 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressParseError> {
        if bytes.len() != Self::LEN {
            return Err(AddressParseError::InvalidLength {
                value: hex::encode(bytes),
                expected: Self::LEN,
                actual: bytes.len(),
            });
        }
        Ok(HexKey(format!("0x{}", hex::encode(bytes))))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for HexKey {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        HexKey::parse(&value)
    }
}

impl From<HexKey> for String {
    fn from(value: HexKey) -> Self {
        value.0
    }
}

/// Position side as encoded on chain (`uint8`: 0 = long, 1 = short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown side {0}")]
pub struct UnknownSide(pub u8);

impl Side {
    pub fn as_u8(self) -> u8 {
        match self {
            Side::Long => 0,
            Side::Short => 1,
        }
    }

    pub fn is_long(self) -> bool {
        self == Side::Long
    }
}

impl TryFrom<u8> for Side {
    type Error = UnknownSide;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Side::Long),
            1 => Ok(Side::Short),
            other => Err(UnknownSide(other)),
        }
    }
}

impl From<Side> for u8 {
    fn from(value: Side) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}
