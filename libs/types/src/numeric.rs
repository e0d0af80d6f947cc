//! Fixed-width base-unit amounts
//!
//! Every quantity the protocol moves is an unsigned 256-bit integer count of
//! base units. The base-unit scale belongs to the asset, not to the protocol.
//! Products are formed in 512 bits so that cross-multiplied price checks and
//! pro-rata fills cannot wrap silently; narrowing back to 256 bits is checked.
//!
//! `Decimal` only appears at the edges (configuration and display) through
//! [`Amount::from_units`] and [`Amount::to_units`].

use primitive_types::{U256, U512};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AmountError;

/// Largest decimals value whose power of ten fits in 256 bits.
const MAX_DECIMALS: u32 = 77;

/// Unsigned 256-bit base-unit quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256([0; 4]));
    pub const MAX: Amount = Amount(U256([u64::MAX; 4]));

    pub fn from_u256(value: U256) -> Self {
        Self(value)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(U256::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(U256::from(value))
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Exact 512-bit product.
    pub fn full_mul(self, other: Amount) -> U512 {
        self.0.full_mul(other.0)
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(U256::from_big_endian(&bytes))
    }

    /// Big-endian 32-byte form used by the canonical order encoding.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.0.to_big_endian(&mut out);
        out
    }

    /// `floor(numerator * target / denominator)`.
    ///
    /// `None` when `denominator` is zero or the quotient exceeds 256 bits.
    pub fn partial_amount_floor(numerator: Amount, denominator: Amount, target: Amount) -> Option<Amount> {
        if denominator.is_zero() {
            return None;
        }
        let product = numerator.full_mul(target);
        narrow(product / U512::from(denominator.0))
    }

    /// `ceil(numerator * target / denominator)`.
    ///
    /// `None` when `denominator` is zero or the quotient exceeds 256 bits.
    pub fn partial_amount_ceil(numerator: Amount, denominator: Amount, target: Amount) -> Option<Amount> {
        if denominator.is_zero() {
            return None;
        }
        let denominator = U512::from(denominator.0);
        let product = numerator.full_mul(target);
        let rounded = product.checked_add(denominator - U512::one())?;
        narrow(rounded / denominator)
    }

    /// Convert a human-unit value (e.g. `0.4`) into base units for an asset
    /// with `decimals` decimal places.
    pub fn from_units(value: Decimal, decimals: u32) -> Result<Amount, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(value.to_string()));
        }
        if decimals > MAX_DECIMALS {
            return Err(AmountError::Overflow);
        }
        let value = value.normalize();
        let mantissa = U256::from(value.mantissa().unsigned_abs());
        let scale = value.scale();

        if scale <= decimals {
            let factor = U256::exp10((decimals - scale) as usize);
            mantissa
                .checked_mul(factor)
                .map(Amount)
                .ok_or(AmountError::Overflow)
        } else {
            Err(AmountError::TooPrecise {
                value: value.to_string(),
                decimals,
            })
        }
    }

    /// Render base units as a human-unit `Decimal`.
    ///
    /// `None` when the value does not fit the 96-bit `Decimal` mantissa or
    /// `decimals` exceeds its 28-digit scale.
    pub fn to_units(&self, decimals: u32) -> Option<Decimal> {
        if self.0.bits() > 96 || decimals > 28 {
            return None;
        }
        Decimal::try_from_i128_with_scale(self.0.low_u128() as i128, decimals)
            .ok()
            .map(|d| d.normalize())
    }
}

fn narrow(value: U512) -> Option<Amount> {
    U256::try_from(value).ok().map(Amount)
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<U256> for Amount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a decimal base-unit integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        U256::from_dec_str(s)
            .map(Amount)
            .map_err(|_| AmountError::Invalid(s.to_string()))
    }
}
