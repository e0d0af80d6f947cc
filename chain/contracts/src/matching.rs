//! Matching engine
//!
//! Decides whether a left/right pair of signed orders can be settled against
//! each other by `matcher` at time `now`, and if so computes the settlement.
//! The engine is a pure function: it reads no ledger state and changes none.
//!
//! Checks run in a fixed order and the first failure is reported:
//! 1. signatures
//! 2. expiry (left, then right)
//! 3. asset complementarity
//! 4. sender restrictions, then taker restrictions
//! 5. price cross
//! 6. fill arithmetic
//! 7. full fill on both sides

use primitive_types::U512;
use tracing::{debug, info};
use types::ids::Address;
use types::order::{Order, SignedOrder};

use order_core::signing::{verify_signed_order, SigningError};

use crate::config::MatchConfig;
use crate::errors::MatchError;
use crate::settlement::{build_settlement, calculate_matched_fill_results, OrderSide, SettlementResult};

/// Validate a pair and compute its settlement.
pub fn match_orders(
    left: &SignedOrder,
    right: &SignedOrder,
    matcher: &Address,
    now: u64,
    config: &MatchConfig,
) -> Result<SettlementResult, MatchError> {
    match evaluate(left, right, matcher, now, config) {
        Ok(result) => {
            info!(
                left = %result.left_order_hash,
                right = %result.right_order_hash,
                matcher = %matcher,
                spread = %result.spread.amount,
                transfers = result.transfers.len(),
                "Orders matched"
            );
            Ok(result)
        }
        Err(err) => {
            debug!(matcher = %matcher, now, error = %err, "Match rejected");
            Err(err)
        }
    }
}

fn evaluate(
    left: &SignedOrder,
    right: &SignedOrder,
    matcher: &Address,
    now: u64,
    config: &MatchConfig,
) -> Result<SettlementResult, MatchError> {
    check_signature(left, OrderSide::Left)?;
    check_signature(right, OrderSide::Right)?;

    let (l, r) = (&left.order, &right.order);

    check_expiry(l, OrderSide::Left, now)?;
    check_expiry(r, OrderSide::Right, now)?;

    if !assets_complementary(l, r) {
        return Err(MatchError::AssetMismatch);
    }

    check_sender(l, OrderSide::Left, matcher)?;
    check_sender(r, OrderSide::Right, matcher)?;
    check_taker(l, OrderSide::Left, &r.maker)?;
    check_taker(r, OrderSide::Right, &l.maker)?;

    if !prices_cross(l, r) {
        return Err(MatchError::PricesDoNotCross);
    }

    let fills = calculate_matched_fill_results(l, r)?;
    if !fills.is_complete(l, r) {
        let (left_remaining, right_remaining) = fills.remaining(l, r);
        return Err(MatchError::PartialFillUnsupported {
            left_remaining,
            right_remaining,
        });
    }

    Ok(build_settlement(
        l,
        r,
        l.hash()?,
        r.hash()?,
        *matcher,
        &fills,
        &config.fee_asset,
    ))
}

fn check_signature(signed: &SignedOrder, side: OrderSide) -> Result<(), MatchError> {
    match verify_signed_order(signed) {
        Ok(true) => Ok(()),
        Ok(false) => Err(MatchError::InvalidSignature { side }),
        Err(SigningError::InvalidScheme { scheme_id }) => Err(MatchError::InvalidScheme { side, scheme_id }),
        Err(SigningError::Encoding(err)) => Err(MatchError::Encoding(err)),
        Err(SigningError::Signer(_)) | Err(SigningError::ForeignSignature { .. }) => {
            Err(MatchError::InvalidSignature { side })
        }
    }
}

fn check_expiry(order: &Order, side: OrderSide, now: u64) -> Result<(), MatchError> {
    if order.is_expired(now) {
        return Err(MatchError::OrderExpired {
            side,
            expiration: order.expiration,
            now,
        });
    }
    Ok(())
}

fn check_sender(order: &Order, side: OrderSide, matcher: &Address) -> Result<(), MatchError> {
    match order.sender_restriction() {
        Some(required) if required != *matcher => Err(MatchError::UnauthorizedSender {
            side,
            required,
            matcher: *matcher,
        }),
        _ => Ok(()),
    }
}

fn check_taker(order: &Order, side: OrderSide, counter_maker: &Address) -> Result<(), MatchError> {
    match order.taker_restriction() {
        Some(required) if required != *counter_maker => Err(MatchError::UnauthorizedTaker {
            side,
            required,
            counter_maker: *counter_maker,
        }),
        _ => Ok(()),
    }
}

/// Left sells what right buys and buys what right sells.
pub fn assets_complementary(left: &Order, right: &Order) -> bool {
    left.maker_asset == right.taker_asset && left.taker_asset == right.maker_asset
}

/// `left.taker * right.taker <= left.maker * right.maker`, exact in 512 bits.
///
/// True when the left maker accepts at least as little per unit as the right
/// maker pays.
pub fn prices_cross(left: &Order, right: &Order) -> bool {
    let asked: U512 = left.taker_asset_amount.full_mul(right.taker_asset_amount);
    let offered: U512 = left.maker_asset_amount.full_mul(right.maker_asset_amount);
    asked <= offered
}
