//! Contract-specific error types
//!
//! Error taxonomy for pair matching, ledger submission and broadcasting.

use thiserror::Error;
use types::errors::EncodingError;
use types::ids::{Address, OrderHash};
use types::numeric::Amount;

use crate::settlement::OrderSide;

/// Reasons a left/right pair cannot be settled.
///
/// Reported in the fixed order the matching engine checks them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("Invalid signature on {side} order")]
    InvalidSignature { side: OrderSide },

    #[error("Unrecognised signature scheme 0x{scheme_id:02x} on {side} order")]
    InvalidScheme { side: OrderSide, scheme_id: u8 },

    #[error("Order encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("{side} order expired at {expiration} (now {now})")]
    OrderExpired {
        side: OrderSide,
        expiration: u64,
        now: u64,
    },

    #[error("Assets are not complementary")]
    AssetMismatch,

    #[error("{side} order may only be submitted by {required}, not {matcher}")]
    UnauthorizedSender {
        side: OrderSide,
        required: Address,
        matcher: Address,
    },

    #[error("{side} order may only be filled by {required}, not {counter_maker}")]
    UnauthorizedTaker {
        side: OrderSide,
        required: Address,
        counter_maker: Address,
    },

    #[error("Prices do not cross")]
    PricesDoNotCross,

    #[error("Arithmetic overflow computing {context}")]
    ArithmeticOverflow { context: &'static str },

    #[error("Partial fills unsupported: left remaining {left_remaining}, right remaining {right_remaining}")]
    PartialFillUnsupported {
        left_remaining: Amount,
        right_remaining: Amount,
    },
}

impl MatchError {
    /// Whether retrying with corrected orders can succeed.
    ///
    /// Overflow means the fixed-width representation was exceeded; the inputs
    /// need wider types, not another attempt.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MatchError::ArithmeticOverflow { .. })
    }
}

/// Broadcast-layer failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("Broadcast timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("Transaction reverted: {0}")]
    Reverted(Box<LedgerError>),
}

/// Settlement ledger failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance of {asset} for {owner}: required {required}, available {available}")]
    InsufficientBalance {
        owner: Address,
        asset: String,
        required: Amount,
        available: Amount,
    },

    #[error("Insufficient allowance of {asset} for {owner}: required {required}, available {available}")]
    InsufficientAllowance {
        owner: Address,
        asset: String,
        required: Amount,
        available: Amount,
    },

    #[error("Order already filled: {order_hash}")]
    OrderAlreadyFilled { order_hash: OrderHash },

    #[error("Order cancelled: {order_hash}")]
    OrderCancelled { order_hash: OrderHash },

    #[error("Order is for exchange {actual}, this is {expected}")]
    WrongExchange { expected: Address, actual: Address },

    #[error("Submitted settlement does not match recomputation: {reason}")]
    ResultMismatch { reason: String },

    #[error("Unauthorized: {caller}")]
    Unauthorized { caller: Address },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Rejected: {0}")]
    Rejected(#[from] MatchError),

    #[error("Broadcast failed: {0}")]
    Broadcast(#[from] BroadcastError),
}
