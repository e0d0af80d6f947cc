//! Error types for the order model
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Failure to produce the canonical byte form of an asset descriptor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("Asset data payload is empty")]
    EmptyAssetData,

    #[error("Asset data payload too long: {len} bytes (max {max})")]
    AssetDataTooLong { len: usize, max: usize },

    #[error("Proxy id 0x{proxy_id} is reserved for a built-in asset standard")]
    ReservedProxyId { proxy_id: String },
}

/// Failure to parse a hex-encoded identifier or digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierParseError {
    #[error("Invalid hex string")]
    InvalidHex,

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Failure to convert between human units and base units.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount must not be negative: {0}")]
    Negative(String),

    #[error("Amount {value} has more than {decimals} decimal places")]
    TooPrecise { value: String, decimals: u32 },

    #[error("Amount does not fit in 256 bits")]
    Overflow,

    #[error("Invalid amount: {0}")]
    Invalid(String),
}
