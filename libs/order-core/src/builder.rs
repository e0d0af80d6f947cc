//! Complementary order construction
//!
//! Builds a left order and its mirror: the right maker supplies exactly what
//! the left maker asks for, and names its own price through
//! `right_taker_amount`. Whatever the left maker's asset is worth beyond that
//! price is the spread the matcher captures at settlement.
//!
//! Salts are drawn per order from a cryptographic RNG (256 bits).

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::debug;
use types::asset::AssetData;
use types::errors::EncodingError;
use types::ids::Address;
use types::numeric::Amount;
use types::order::Order;

/// Fees attached to one side of a pair. All zero by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideFees {
    pub maker_fee: Amount,
    pub taker_fee: Amount,
}

/// Taker and sender restrictions for one side. Unrestricted by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideRestrictions {
    pub taker: Option<Address>,
    pub sender: Option<Address>,
}

/// Parameters of a complementary pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairParams {
    pub exchange: Address,
    pub left_maker: Address,
    pub right_maker: Address,
    /// Asset the left maker sells (and the right maker buys).
    pub left_maker_asset: AssetData,
    /// Asset the left maker buys (and the right maker sells).
    pub left_taker_asset: AssetData,
    pub left_maker_amount: Amount,
    pub left_taker_amount: Amount,
    /// What the right maker wants of the left maker's asset.
    pub right_taker_amount: Amount,
    pub left_expiration: u64,
    /// Defaults to `left_expiration`.
    pub right_expiration: Option<u64>,
    pub fee_recipient: Option<Address>,
    pub left_fees: SideFees,
    pub right_fees: SideFees,
    pub left_restrictions: SideRestrictions,
    pub right_restrictions: SideRestrictions,
}

impl PairParams {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        exchange: Address,
        left_maker: Address,
        right_maker: Address,
        left_maker_asset: AssetData,
        left_taker_asset: AssetData,
        left_maker_amount: Amount,
        left_taker_amount: Amount,
        right_taker_amount: Amount,
        expiration: u64,
    ) -> Self {
        Self {
            exchange,
            left_maker,
            right_maker,
            left_maker_asset,
            left_taker_asset,
            left_maker_amount,
            left_taker_amount,
            right_taker_amount,
            left_expiration: expiration,
            right_expiration: None,
            fee_recipient: None,
            left_fees: SideFees::default(),
            right_fees: SideFees::default(),
            left_restrictions: SideRestrictions::default(),
            right_restrictions: SideRestrictions::default(),
        }
    }

    pub fn with_right_expiration(mut self, expiration: u64) -> Self {
        self.right_expiration = Some(expiration);
        self
    }

    pub fn with_fees(mut self, fee_recipient: Address, left: SideFees, right: SideFees) -> Self {
        self.fee_recipient = Some(fee_recipient);
        self.left_fees = left;
        self.right_fees = right;
        self
    }

    pub fn with_restrictions(mut self, left: SideRestrictions, right: SideRestrictions) -> Self {
        self.left_restrictions = left;
        self.right_restrictions = right;
        self
    }

    /// Restrict both sides to a single sender (the matcher).
    pub fn with_sender(mut self, sender: Address) -> Self {
        self.left_restrictions.sender = Some(sender);
        self.right_restrictions.sender = Some(sender);
        self
    }

    fn validate(&self) -> Result<(), BuilderError> {
        for (name, amount) in [
            ("left maker amount", self.left_maker_amount),
            ("left taker amount", self.left_taker_amount),
            ("right taker amount", self.right_taker_amount),
        ] {
            if amount.is_zero() {
                return Err(BuilderError::InvalidParams(format!("{} must be positive", name)));
            }
        }

        self.left_maker_asset.encode()?;
        self.left_taker_asset.encode()?;
        if self.left_maker_asset == self.left_taker_asset {
            return Err(BuilderError::InvalidParams(
                "maker and taker assets must differ".to_string(),
            ));
        }

        let left_sender = self.left_restrictions.sender.filter(|a| !a.is_zero());
        let right_sender = self.right_restrictions.sender.filter(|a| !a.is_zero());
        if let (Some(l), Some(r)) = (left_sender, right_sender) {
            if l != r {
                return Err(BuilderError::InvalidParams(format!(
                    "sender restrictions {} and {} cannot both be satisfied",
                    l, r
                )));
            }
        }

        if let Some(taker) = self.left_restrictions.taker.filter(|a| !a.is_zero()) {
            if taker != self.right_maker {
                return Err(BuilderError::InvalidParams(format!(
                    "left taker restricted to {} but the counter maker is {}",
                    taker, self.right_maker
                )));
            }
        }
        if let Some(taker) = self.right_restrictions.taker.filter(|a| !a.is_zero()) {
            if taker != self.left_maker {
                return Err(BuilderError::InvalidParams(format!(
                    "right taker restricted to {} but the counter maker is {}",
                    taker, self.left_maker
                )));
            }
        }
        Ok(())
    }
}

/// Draw a 256-bit salt.
pub fn generate_salt<R: RngCore + CryptoRng>(rng: &mut R) -> Amount {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    Amount::from_be_bytes(bytes)
}

/// Build a left order and its complementary right order, salted from the OS RNG.
pub fn build_complementary_pair(params: &PairParams) -> Result<(Order, Order), BuilderError> {
    build_complementary_pair_with_rng(params, &mut OsRng)
}

/// Same as [`build_complementary_pair`] with a caller-supplied RNG.
pub fn build_complementary_pair_with_rng<R: RngCore + CryptoRng>(
    params: &PairParams,
    rng: &mut R,
) -> Result<(Order, Order), BuilderError> {
    params.validate()?;

    let left = Order {
        exchange: params.exchange,
        maker: params.left_maker,
        taker: params.left_restrictions.taker,
        sender: params.left_restrictions.sender,
        fee_recipient: params.fee_recipient,
        maker_asset: params.left_maker_asset.clone(),
        taker_asset: params.left_taker_asset.clone(),
        maker_asset_amount: params.left_maker_amount,
        taker_asset_amount: params.left_taker_amount,
        maker_fee: params.left_fees.maker_fee,
        taker_fee: params.left_fees.taker_fee,
        expiration: params.left_expiration,
        salt: generate_salt(rng),
    };

    let right = Order {
        exchange: params.exchange,
        maker: params.right_maker,
        taker: params.right_restrictions.taker,
        sender: params.right_restrictions.sender,
        fee_recipient: params.fee_recipient,
        maker_asset: left.taker_asset.clone(),
        taker_asset: left.maker_asset.clone(),
        maker_asset_amount: left.taker_asset_amount,
        taker_asset_amount: params.right_taker_amount,
        maker_fee: params.right_fees.maker_fee,
        taker_fee: params.right_fees.taker_fee,
        expiration: params.right_expiration.unwrap_or(params.left_expiration),
        salt: generate_salt(rng),
    };

    debug!(
        left_maker = %left.maker,
        right_maker = %right.maker,
        left_maker_amount = %left.maker_asset_amount,
        left_taker_amount = %left.taker_asset_amount,
        right_taker_amount = %right.taker_asset_amount,
        "Built complementary order pair"
    );
    Ok((left, right))
}

/// Order builder errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Asset encoding failed: {0}")]
    Encoding(#[from] EncodingError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn params() -> PairParams {
        PairParams::new(
            addr(0xee),
            addr(0x01),
            addr(0x02),
            AssetData::erc20(addr(0xa0)),
            AssetData::erc20(addr(0xb0)),
            Amount::from_u64(10_000),
            Amount::from_u64(400),
            Amount::from_u64(200),
            2_000_000_000,
        )
    }

    #[test]
    fn test_pair_is_complementary() {
        let (left, right) = build_complementary_pair(&params()).unwrap();
        assert_eq!(left.maker_asset, right.taker_asset);
        assert_eq!(left.taker_asset, right.maker_asset);
        assert_eq!(right.maker_asset_amount, left.taker_asset_amount);
        assert_eq!(right.taker_asset_amount, Amount::from_u64(200));
        assert_eq!(left.maker, addr(0x01));
        assert_eq!(right.maker, addr(0x02));
        assert_eq!(left.expiration, right.expiration);
    }

    #[test]
    fn test_salts_are_independent() {
        let (left, right) = build_complementary_pair(&params()).unwrap();
        assert_ne!(left.salt, right.salt);
        assert_ne!(left.hash().unwrap(), right.hash().unwrap());
        let (again, _) = build_complementary_pair(&params()).unwrap();
        assert_ne!(left.salt, again.salt);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a = build_complementary_pair_with_rng(&params(), &mut ChaCha20Rng::seed_from_u64(7)).unwrap();
        let b = build_complementary_pair_with_rng(&params(), &mut ChaCha20Rng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_independent_expirations_accepted() {
        let (left, right) = build_complementary_pair(&params().with_right_expiration(2_100_000_000)).unwrap();
        assert_eq!(left.expiration, 2_000_000_000);
        assert_eq!(right.expiration, 2_100_000_000);
    }

    #[test]
    fn test_fees_and_recipient_applied() {
        let left_fees = SideFees { maker_fee: Amount::from_u64(3), taker_fee: Amount::from_u64(4) };
        let right_fees = SideFees { maker_fee: Amount::from_u64(5), taker_fee: Amount::from_u64(6) };
        let (left, right) = build_complementary_pair(&params().with_fees(addr(0xfe), left_fees, right_fees)).unwrap();
        assert_eq!(left.fee_recipient, Some(addr(0xfe)));
        assert_eq!(right.fee_recipient, Some(addr(0xfe)));
        assert_eq!(left.maker_fee, Amount::from_u64(3));
        assert_eq!(right.taker_fee, Amount::from_u64(6));
    }

    #[test]
    fn test_zero_amounts_rejected() {
        let mut p = params();
        p.left_maker_amount = Amount::ZERO;
        assert!(matches!(build_complementary_pair(&p), Err(BuilderError::InvalidParams(_))));

        let mut p = params();
        p.left_taker_amount = Amount::ZERO;
        assert!(matches!(build_complementary_pair(&p), Err(BuilderError::InvalidParams(_))));

        let mut p = params();
        p.right_taker_amount = Amount::ZERO;
        assert!(matches!(build_complementary_pair(&p), Err(BuilderError::InvalidParams(_))));
    }

    #[test]
    fn test_identical_assets_rejected() {
        let mut p = params();
        p.left_taker_asset = p.left_maker_asset.clone();
        assert!(matches!(build_complementary_pair(&p), Err(BuilderError::InvalidParams(_))));
    }

    #[test]
    fn test_conflicting_senders_rejected() {
        let p = params().with_restrictions(
            SideRestrictions { taker: None, sender: Some(addr(0x10)) },
            SideRestrictions { taker: None, sender: Some(addr(0x11)) },
        );
        assert!(matches!(build_complementary_pair(&p), Err(BuilderError::InvalidParams(_))));

        let same = params().with_sender(addr(0x10));
        let (left, right) = build_complementary_pair(&same).unwrap();
        assert_eq!(left.sender_restriction(), Some(addr(0x10)));
        assert_eq!(right.sender_restriction(), Some(addr(0x10)));
    }

    #[test]
    fn test_unfillable_taker_restriction_rejected() {
        let p = params().with_restrictions(
            SideRestrictions { taker: Some(addr(0x33)), sender: None },
            SideRestrictions::default(),
        );
        assert!(matches!(build_complementary_pair(&p), Err(BuilderError::InvalidParams(_))));

        let ok = params().with_restrictions(
            SideRestrictions { taker: Some(addr(0x02)), sender: None },
            SideRestrictions { taker: Some(addr(0x01)), sender: None },
        );
        assert!(build_complementary_pair(&ok).is_ok());
    }

    #[test]
    fn test_unencodable_asset_rejected() {
        let mut p = params();
        p.left_taker_asset = AssetData::Custom { proxy_id: [1, 2, 3, 4], data: vec![] };
        assert_eq!(
            build_complementary_pair(&p),
            Err(BuilderError::Encoding(EncodingError::EmptyAssetData))
        );
    }
}
