//! Identity and digest types for settlement participants and orders
//!
//! Both are fixed 32-byte values rendered as `0x`-prefixed lowercase hex.
//! An [`Address`] is the public identity of a participant (for the Ed25519
//! scheme it is the verifying key itself); the all-zero address is the wire
//! value for "any" or "none".

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::IdentifierParseError;

macro_rules! bytes32_newtype {
    ($name:ident) => {
        impl $name {
            /// Byte width of the value.
            pub const LEN: usize = 32;

            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Borrow the raw bytes.
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// Copy out the raw bytes.
            pub fn to_bytes(self) -> [u8; 32] {
                self.0
            }

            /// `true` when every byte is zero.
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|b| *b == 0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = s.strip_prefix("0x").unwrap_or(s);
                let raw = hex::decode(digits).map_err(|_| IdentifierParseError::InvalidHex)?;
                let bytes: [u8; 32] = raw.try_into().map_err(|raw: Vec<u8>| {
                    IdentifierParseError::InvalidLength {
                        expected: 32,
                        actual: raw.len(),
                    }
                })?;
                Ok(Self(bytes))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Identity of a maker, taker, sender, fee recipient or exchange.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; 32]);

bytes32_newtype!(Address);

impl Address {
    /// Wildcard / null identity.
    pub const ZERO: Address = Address([0u8; 32]);
}

/// SHA-256 digest of an order's canonical encoding.
///
/// This is the value makers sign and the ledger uses for replay protection.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderHash([u8; 32]);

bytes32_newtype!(OrderHash);
