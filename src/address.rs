// ABOUTME: Defines Address - the 20-byte identity of accounts, policies and relays.
// ABOUTME: Parses and prints as 0x-prefixed hex, serializes as a string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Identity of a principal: an account, a policy instance, or a relay.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LEN]);

/// Error returned when parsing an address from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    #[error("expected {expected} hex digits, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("invalid hex digit {0:?}")]
    InvalidDigit(char),
}

impl Address {
    /// The all-zero address, used as the "nobody" sentinel.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Create an address from raw bytes.
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Create an address with every byte set to `byte`.
    ///
    /// Handy for fixtures: `Address::repeat(0x55)` is `0x5555...55`.
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; ADDRESS_LEN])
    }

    /// Generate a fresh random address for a newly deployed component.
    pub fn random() -> Self {
        let hi = uuid::Uuid::new_v4();
        let lo = uuid::Uuid::new_v4();
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[..16].copy_from_slice(hi.as_bytes());
        bytes[16..].copy_from_slice(&lo.as_bytes()[..ADDRESS_LEN - 16]);
        Self(bytes)
    }

    /// Raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Map the zero sentinel to `None`.
    pub fn non_zero(self) -> Option<Self> {
        if self.is_zero() { None } else { Some(self) }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        let actual = digits.chars().count();
        if actual != ADDRESS_LEN * 2 {
            return Err(AddressParseError::Length {
                expected: ADDRESS_LEN * 2,
                actual,
            });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(digits, &mut bytes).map_err(|err| match err {
            hex::FromHexError::InvalidHexCharacter { c, .. } => AddressParseError::InvalidDigit(c),
            _ => AddressParseError::Length {
                expected: ADDRESS_LEN * 2,
                actual,
            },
        })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
