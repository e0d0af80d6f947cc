//! Order model and canonical order hashing
//!
//! An [`Order`] is an immutable intent to trade `maker_asset_amount` of
//! `maker_asset` for `taker_asset_amount` of `taker_asset`. Its identity is the
//! [`OrderHash`]: SHA-256 over a versioned, fixed-layout encoding that every
//! implementation sharing a ledger must reproduce byte for byte.
//!
//! Encoding v1 (all integers big-endian):
//!
//! | field | bytes |
//! |---|---|
//! | version (`0x01`) | 1 |
//! | exchange | 32 |
//! | maker | 32 |
//! | taker (zero = any) | 32 |
//! | fee_recipient (zero = none) | 32 |
//! | sender (zero = any) | 32 |
//! | maker_asset_amount | 32 |
//! | taker_asset_amount | 32 |
//! | maker_fee | 32 |
//! | taker_fee | 32 |
//! | expiration (unix seconds) | 8 |
//! | salt | 32 |
//! | sha256(maker_asset) | 32 |
//! | sha256(taker_asset) | 32 |
//!
//! The digest is `sha256(ORDER_DOMAIN_TAG ‖ encoding)`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::asset::AssetData;
use crate::errors::EncodingError;
use crate::ids::{Address, OrderHash};
use crate::numeric::Amount;

/// Encoding version byte (frozen).
pub const ORDER_ENCODING_VERSION: u8 = 1;

/// Domain separation prefix for order digests.
pub const ORDER_DOMAIN_TAG: &[u8] = b"p2p-settlement/order/v1";

/// Length of the v1 canonical encoding.
pub const ORDER_ENCODING_LEN: usize = 1 + 32 * 12 + 8;

/// Immutable order.
///
/// Restriction fields use `None` for "any"; `Some(Address::ZERO)` is treated
/// the same way by every accessor so hashing and matching cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    /// Settlement authority this order may be settled on.
    pub exchange: Address,
    pub maker: Address,
    pub taker: Option<Address>,
    pub sender: Option<Address>,
    pub fee_recipient: Option<Address>,
    pub maker_asset: AssetData,
    pub taker_asset: AssetData,
    pub maker_asset_amount: Amount,
    pub taker_asset_amount: Amount,
    pub maker_fee: Amount,
    pub taker_fee: Amount,
    /// Unix seconds; the order is invalid once `now >= expiration`.
    pub expiration: u64,
    pub salt: Amount,
}

impl Order {
    /// Identity allowed to fill, `None` if anyone may.
    pub fn taker_restriction(&self) -> Option<Address> {
        self.taker.filter(|a| !a.is_zero())
    }

    /// Identity allowed to submit, `None` if anyone may.
    pub fn sender_restriction(&self) -> Option<Address> {
        self.sender.filter(|a| !a.is_zero())
    }

    /// Fee recipient, `None` if fees are not collected.
    pub fn fee_recipient_address(&self) -> Option<Address> {
        self.fee_recipient.filter(|a| !a.is_zero())
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expiration
    }

    /// Canonical v1 encoding.
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        let maker_asset = self.maker_asset.digest()?;
        let taker_asset = self.taker_asset.digest()?;

        let mut out = Vec::with_capacity(ORDER_ENCODING_LEN);
        out.push(ORDER_ENCODING_VERSION);
        out.extend_from_slice(self.exchange.as_bytes());
        out.extend_from_slice(self.maker.as_bytes());
        out.extend_from_slice(self.taker_restriction().unwrap_or(Address::ZERO).as_bytes());
        out.extend_from_slice(self.fee_recipient_address().unwrap_or(Address::ZERO).as_bytes());
        out.extend_from_slice(self.sender_restriction().unwrap_or(Address::ZERO).as_bytes());
        out.extend_from_slice(&self.maker_asset_amount.to_be_bytes());
        out.extend_from_slice(&self.taker_asset_amount.to_be_bytes());
        out.extend_from_slice(&self.maker_fee.to_be_bytes());
        out.extend_from_slice(&self.taker_fee.to_be_bytes());
        out.extend_from_slice(&self.expiration.to_be_bytes());
        out.extend_from_slice(&self.salt.to_be_bytes());
        out.extend_from_slice(&maker_asset);
        out.extend_from_slice(&taker_asset);
        debug_assert_eq!(out.len(), ORDER_ENCODING_LEN);
        Ok(out)
    }

    /// Order hash over the canonical encoding.
    pub fn hash(&self) -> Result<OrderHash, EncodingError> {
        let mut hasher = Sha256::new();
        hasher.update(ORDER_DOMAIN_TAG);
        hasher.update(self.encode()?);
        Ok(OrderHash::from_bytes(hasher.finalize().into()))
    }
}

/// Signature schemes understood by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SignatureScheme {
    /// Ed25519 over the raw order hash.
    Ed25519 = 0x02,
    /// Ed25519 over the hash wrapped in a personal-message prefix.
    Ed25519Prefixed = 0x03,
}

impl SignatureScheme {
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for SignatureScheme {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0x02 => Ok(SignatureScheme::Ed25519),
            0x03 => Ok(SignatureScheme::Ed25519Prefixed),
            other => Err(other),
        }
    }
}

/// Signature bytes tagged with the id of the scheme that produced them.
///
/// The id is kept raw so that signatures from unknown schemes can still be
/// carried and rejected explicitly at verification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub scheme_id: u8,
    #[serde(with = "hex::serde")]
    pub bytes: Vec<u8>,
}

impl Signature {
    pub fn new(scheme: SignatureScheme, bytes: Vec<u8>) -> Self {
        Self {
            scheme_id: scheme.id(),
            bytes,
        }
    }

    /// Decoded scheme, or the unrecognised id.
    pub fn scheme(&self) -> Result<SignatureScheme, u8> {
        SignatureScheme::try_from(self.scheme_id)
    }

    /// Wire form: `0x ‖ bytes ‖ scheme_id`.
    pub fn to_hex(&self) -> String {
        let mut raw = self.bytes.clone();
        raw.push(self.scheme_id);
        format!("0x{}", hex::encode(raw))
    }

    /// Parse the wire form. `None` for invalid hex or an empty payload.
    pub fn from_hex(s: &str) -> Option<Self> {
        let mut raw = hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok()?;
        let scheme_id = raw.pop()?;
        Some(Self { scheme_id, bytes: raw })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Order plus the maker's signature over its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOrder {
    pub order: Order,
    pub signature: Signature,
}

impl SignedOrder {
    /// Pair an order with a signature. Nothing is verified here; the
    /// matching engine and ledger verify before use.
    pub fn new(order: Order, signature: Signature) -> Self {
        Self { order, signature }
    }

    pub fn hash(&self) -> Result<OrderHash, EncodingError> {
        self.order.hash()
    }

    pub fn maker(&self) -> Address {
        self.order.maker
    }
}
