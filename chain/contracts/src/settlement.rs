//! Settlement arithmetic for a matched pair
//!
//! Given two orders that already passed validation, computes how much of
//! each is filled, the fees each party owes, the spread left over for the
//! matcher, and the ordered list of transfers a ledger must apply atomically.
//!
//! Fill rule:
//! - if the left order asks for at least what the right order offers, the
//!   right order fills completely and the left order fills at its own price
//!   (rounded down, in the left maker's favour);
//! - otherwise the left order fills completely and the right order pays at
//!   its own price (rounded up, in the right maker's favour).
//!
//! Spread = left maker asset filled − right taker asset filled. Fees are
//! charged pro rata to each order's taker fill.

use serde::{Deserialize, Serialize};
use std::fmt;
use types::asset::AssetData;
use types::ids::{Address, OrderHash};
use types::numeric::Amount;
use types::order::Order;

use crate::errors::MatchError;

/// Which order of the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Left,
    Right,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Left => f.write_str("left"),
            OrderSide::Right => f.write_str("right"),
        }
    }
}

/// Amounts filled and fees paid for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FillResults {
    pub maker_asset_filled: Amount,
    pub taker_asset_filled: Amount,
    pub maker_fee_paid: Amount,
    pub taker_fee_paid: Amount,
}

/// Fill results for both orders plus the spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedFillResults {
    pub left: FillResults,
    pub right: FillResults,
    /// Left maker asset left over after paying the right maker.
    pub left_maker_asset_spread: Amount,
}

impl MatchedFillResults {
    /// Taker amount each order still has open after this match.
    pub fn remaining(&self, left: &Order, right: &Order) -> (Amount, Amount) {
        (
            left.taker_asset_amount
                .checked_sub(self.left.taker_asset_filled)
                .unwrap_or(Amount::ZERO),
            right
                .taker_asset_amount
                .checked_sub(self.right.taker_asset_filled)
                .unwrap_or(Amount::ZERO),
        )
    }

    /// Both orders filled exactly in full.
    pub fn is_complete(&self, left: &Order, right: &Order) -> bool {
        self.left.maker_asset_filled == left.maker_asset_amount
            && self.left.taker_asset_filled == left.taker_asset_amount
            && self.right.maker_asset_filled == right.maker_asset_amount
            && self.right.taker_asset_filled == right.taker_asset_amount
    }
}

/// Why value moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Fill,
    Spread,
    MakerFee,
    TakerFee,
}

/// A single balance movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub asset: AssetData,
    pub amount: Amount,
    pub kind: TransferKind,
}

/// A fee owed by one party for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeDebit {
    pub side: OrderSide,
    pub payer: Address,
    pub recipient: Address,
    pub asset: AssetData,
    pub amount: Amount,
    pub kind: TransferKind,
}

/// Spread credited to the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadCredit {
    pub asset: AssetData,
    pub amount: Amount,
    pub recipient: Address,
}

/// Outcome of a successful match. Never mutated once computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub left_order_hash: OrderHash,
    pub right_order_hash: OrderHash,
    pub matcher: Address,
    pub left: FillResults,
    pub right: FillResults,
    pub spread: SpreadCredit,
    pub fees: Vec<FeeDebit>,
    /// Transfers in application order; zero amounts omitted.
    pub transfers: Vec<Transfer>,
}

impl SettlementResult {
    /// Total `asset` received by `party` across all transfers.
    pub fn credited(&self, party: &Address, asset: &AssetData) -> Option<Amount> {
        self.transfers
            .iter()
            .filter(|t| t.to == *party && t.asset == *asset)
            .try_fold(Amount::ZERO, |acc, t| acc.checked_add(t.amount))
    }

    /// Total `asset` paid by `party` across all transfers.
    pub fn debited(&self, party: &Address, asset: &AssetData) -> Option<Amount> {
        self.transfers
            .iter()
            .filter(|t| t.from == *party && t.asset == *asset)
            .try_fold(Amount::ZERO, |acc, t| acc.checked_add(t.amount))
    }
}

fn overflow(context: &'static str) -> MatchError {
    MatchError::ArithmeticOverflow { context }
}

fn fill_results(order: &Order, maker_filled: Amount, taker_filled: Amount) -> Result<FillResults, MatchError> {
    let maker_fee_paid = Amount::partial_amount_floor(taker_filled, order.taker_asset_amount, order.maker_fee)
        .ok_or_else(|| overflow("maker fee"))?;
    let taker_fee_paid = Amount::partial_amount_floor(taker_filled, order.taker_asset_amount, order.taker_fee)
        .ok_or_else(|| overflow("taker fee"))?;
    Ok(FillResults {
        maker_asset_filled: maker_filled,
        taker_asset_filled: taker_filled,
        maker_fee_paid,
        taker_fee_paid,
    })
}

/// Fill amounts, fees and spread for a crossing pair.
pub fn calculate_matched_fill_results(left: &Order, right: &Order) -> Result<MatchedFillResults, MatchError> {
    let (left_maker_filled, left_taker_filled, right_maker_filled, right_taker_filled) =
        if left.taker_asset_amount >= right.maker_asset_amount {
            let left_taker_filled = right.maker_asset_amount;
            let left_maker_filled = Amount::partial_amount_floor(
                left.maker_asset_amount,
                left.taker_asset_amount,
                left_taker_filled,
            )
            .ok_or_else(|| overflow("left maker fill"))?;
            (
                left_maker_filled,
                left_taker_filled,
                right.maker_asset_amount,
                right.taker_asset_amount,
            )
        } else {
            let right_maker_filled = left.taker_asset_amount;
            let right_taker_filled = Amount::partial_amount_ceil(
                right.taker_asset_amount,
                right.maker_asset_amount,
                right_maker_filled,
            )
            .ok_or_else(|| overflow("right taker fill"))?;
            (
                left.maker_asset_amount,
                left.taker_asset_amount,
                right_maker_filled,
                right_taker_filled,
            )
        };

    let left_maker_asset_spread = left_maker_filled
        .checked_sub(right_taker_filled)
        .ok_or_else(|| overflow("spread"))?;

    Ok(MatchedFillResults {
        left: fill_results(left, left_maker_filled, left_taker_filled)?,
        right: fill_results(right, right_maker_filled, right_taker_filled)?,
        left_maker_asset_spread,
    })
}

/// Assemble the settlement result for a validated pair.
pub(crate) fn build_settlement(
    left: &Order,
    right: &Order,
    left_order_hash: OrderHash,
    right_order_hash: OrderHash,
    matcher: Address,
    fills: &MatchedFillResults,
    fee_asset: &AssetData,
) -> SettlementResult {
    let mut transfers = Vec::with_capacity(7);
    let mut push = |from: Address, to: Address, asset: &AssetData, amount: Amount, kind: TransferKind| {
        if !amount.is_zero() {
            transfers.push(Transfer {
                from,
                to,
                asset: asset.clone(),
                amount,
                kind,
            });
        }
    };

    push(right.maker, left.maker, &right.maker_asset, fills.left.taker_asset_filled, TransferKind::Fill);
    push(left.maker, right.maker, &left.maker_asset, fills.right.taker_asset_filled, TransferKind::Fill);
    push(left.maker, matcher, &left.maker_asset, fills.left_maker_asset_spread, TransferKind::Spread);

    let mut fees = Vec::with_capacity(4);
    let fee_entries = [
        (OrderSide::Left, left, left.maker, fills.left.maker_fee_paid, TransferKind::MakerFee),
        (OrderSide::Right, right, right.maker, fills.right.maker_fee_paid, TransferKind::MakerFee),
        (OrderSide::Left, left, matcher, fills.left.taker_fee_paid, TransferKind::TakerFee),
        (OrderSide::Right, right, matcher, fills.right.taker_fee_paid, TransferKind::TakerFee),
    ];
    for (side, order, payer, amount, kind) in fee_entries {
        let Some(recipient) = order.fee_recipient_address() else {
            continue;
        };
        if amount.is_zero() {
            continue;
        }
        push(payer, recipient, fee_asset, amount, kind);
        fees.push(FeeDebit {
            side,
            payer,
            recipient,
            asset: fee_asset.clone(),
            amount,
            kind,
        });
    }

    SettlementResult {
        left_order_hash,
        right_order_hash,
        matcher,
        left: fills.left,
        right: fills.right,
        spread: SpreadCredit {
            asset: left.maker_asset.clone(),
            amount: fills.left_maker_asset_spread,
            recipient: matcher,
        },
        fees,
        transfers,
    }
}
