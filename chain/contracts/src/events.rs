//! Ledger events
//!
//! Immutable records appended by the reference ledger. Consumers read them
//! through `Exchange::events` or drain them from the vault.

use serde::{Deserialize, Serialize};
use types::asset::AssetData;
use types::ids::{Address, OrderHash};
use types::numeric::Amount;

use crate::settlement::TransferKind;

/// Balance credited from outside the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub owner: Address,
    pub asset: AssetData,
    pub amount: Amount,
}

/// Allowance granted to the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub owner: Address,
    pub asset: AssetData,
    /// `Amount::MAX` is unlimited.
    pub amount: Amount,
}

/// One applied transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferApplied {
    pub from: Address,
    pub to: Address,
    pub asset: AssetData,
    pub amount: Amount,
    pub kind: TransferKind,
}

/// One side of a settled match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    pub order_hash: OrderHash,
    pub maker: Address,
    pub matcher: Address,
    pub maker_asset_filled: Amount,
    pub taker_asset_filled: Amount,
    pub maker_fee_paid: Amount,
    pub taker_fee_paid: Amount,
}

/// Order cancelled by its maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancel {
    pub order_hash: OrderHash,
    pub maker: Address,
}

/// Enum wrapper for all ledger events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    Deposit(Deposit),
    Approval(Approval),
    Transfer(TransferApplied),
    Fill(Fill),
    Cancel(Cancel),
}
