//! Exchange — reference settlement ledger
//!
//! Holds the vault plus per-order fill and cancel state, and settles matched
//! pairs submitted to it. A submission is re-validated against the
//! exchange's own clock and configuration before anything moves: the
//! submitted [`SettlementResult`] must equal what the exchange computes
//! itself, both orders must be open, and every transfer must succeed or none
//! is applied.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tokio::sync::Mutex;
use tracing::{info, warn};
use types::asset::AssetData;
use types::ids::{Address, OrderHash};
use types::numeric::Amount;
use types::order::{Order, SignedOrder};

use crate::config::MatchConfig;
use crate::errors::LedgerError;
use crate::events::{Cancel, ContractEvent, Fill};
use crate::matching::match_orders;
use crate::settlement::{FillResults, SettlementResult};
use crate::vault::Vault;

/// Proof that a settlement was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    /// Hex SHA-256 over sequence, order hashes and matcher.
    pub tx_id: String,
    pub sequence: u64,
    pub left_order_hash: OrderHash,
    pub right_order_hash: OrderHash,
    /// Events emitted by this settlement, in order.
    pub events: Vec<ContractEvent>,
}

/// Something that can settle a matched pair.
#[async_trait]
pub trait SettlementLedger: Send + Sync {
    async fn submit(
        &self,
        left: &SignedOrder,
        right: &SignedOrder,
        matcher: &Address,
        result: &SettlementResult,
    ) -> Result<TransactionReceipt, LedgerError>;
}

#[derive(Debug, Default)]
struct ExchangeState {
    vault: Vault,
    filled: HashSet<OrderHash>,
    cancelled: HashSet<OrderHash>,
    block_time: u64,
    sequence: u64,
}

/// In-memory exchange at a fixed address.
#[derive(Debug)]
pub struct Exchange {
    address: Address,
    config: MatchConfig,
    state: Mutex<ExchangeState>,
}

impl Exchange {
    pub fn new(address: Address, config: MatchConfig) -> Self {
        Self {
            address,
            config,
            state: Mutex::new(ExchangeState::default()),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Clock used to check expiry on submission (unix seconds).
    pub async fn set_block_time(&self, now: u64) {
        self.state.lock().await.block_time = now;
    }

    pub async fn block_time(&self) -> u64 {
        self.state.lock().await.block_time
    }

    // ───────────────────────── Custody ─────────────────────────

    pub async fn deposit(&self, owner: Address, asset: AssetData, amount: Amount) -> Result<(), LedgerError> {
        self.state.lock().await.vault.deposit(owner, asset, amount)?;
        Ok(())
    }

    pub async fn set_allowance(&self, owner: Address, asset: AssetData, amount: Amount) {
        self.state.lock().await.vault.set_allowance(owner, asset, amount);
    }

    pub async fn set_unlimited_allowance(&self, owner: Address, asset: AssetData) {
        self.state.lock().await.vault.set_unlimited_allowance(owner, asset);
    }

    pub async fn balance_of(&self, owner: &Address, asset: &AssetData) -> Amount {
        self.state.lock().await.vault.balance_of(owner, asset)
    }

    pub async fn allowance_of(&self, owner: &Address, asset: &AssetData) -> Amount {
        self.state.lock().await.vault.allowance_of(owner, asset)
    }

    pub async fn total_supply(&self, asset: &AssetData) -> Option<Amount> {
        self.state.lock().await.vault.total_supply(asset)
    }

    // ───────────────────────── Order state ─────────────────────────

    /// Cancel `order`. Only its maker may.
    pub async fn cancel_order(&self, caller: &Address, order: &Order) -> Result<OrderHash, LedgerError> {
        if *caller != order.maker {
            return Err(LedgerError::Unauthorized { caller: *caller });
        }
        let order_hash = order.hash().map_err(|e| LedgerError::Rejected(e.into()))?;

        let mut state = self.state.lock().await;
        if state.cancelled.insert(order_hash) {
            state.vault.record(ContractEvent::Cancel(Cancel {
                order_hash,
                maker: order.maker,
            }));
            info!(order_hash = %order_hash, maker = %order.maker, "Order cancelled");
        }
        Ok(order_hash)
    }

    pub async fn is_filled(&self, order_hash: &OrderHash) -> bool {
        self.state.lock().await.filled.contains(order_hash)
    }

    pub async fn is_cancelled(&self, order_hash: &OrderHash) -> bool {
        self.state.lock().await.cancelled.contains(order_hash)
    }

    pub async fn events(&self) -> Vec<ContractEvent> {
        self.state.lock().await.vault.events().to_vec()
    }

    // ───────────────────────── Settlement ─────────────────────────

    async fn settle(
        &self,
        left: &SignedOrder,
        right: &SignedOrder,
        matcher: &Address,
        result: &SettlementResult,
    ) -> Result<TransactionReceipt, LedgerError> {
        for order in [&left.order, &right.order] {
            if order.exchange != self.address {
                return Err(LedgerError::WrongExchange {
                    expected: self.address,
                    actual: order.exchange,
                });
            }
        }

        let mut state = self.state.lock().await;

        let expected = match_orders(left, right, matcher, state.block_time, &self.config)?;
        if expected != *result {
            return Err(LedgerError::ResultMismatch {
                reason: mismatch_reason(&expected, result).to_string(),
            });
        }

        for order_hash in [expected.left_order_hash, expected.right_order_hash] {
            if state.cancelled.contains(&order_hash) {
                return Err(LedgerError::OrderCancelled { order_hash });
            }
            if state.filled.contains(&order_hash) {
                return Err(LedgerError::OrderAlreadyFilled { order_hash });
            }
        }

        let first_event = state.vault.events().len();
        state.vault.apply_transfers(&expected.transfers)?;

        for (order, order_hash, fill) in [
            (&left.order, expected.left_order_hash, &expected.left),
            (&right.order, expected.right_order_hash, &expected.right),
        ] {
            state.filled.insert(order_hash);
            state.vault.record(fill_event(order, order_hash, *matcher, fill));
        }

        state.sequence += 1;
        let sequence = state.sequence;
        let tx_id = transaction_id(sequence, &expected.left_order_hash, &expected.right_order_hash, matcher);

        Ok(TransactionReceipt {
            tx_id,
            sequence,
            left_order_hash: expected.left_order_hash,
            right_order_hash: expected.right_order_hash,
            events: state.vault.events()[first_event..].to_vec(),
        })
    }
}

#[async_trait]
impl SettlementLedger for Exchange {
    async fn submit(
        &self,
        left: &SignedOrder,
        right: &SignedOrder,
        matcher: &Address,
        result: &SettlementResult,
    ) -> Result<TransactionReceipt, LedgerError> {
        match self.settle(left, right, matcher, result).await {
            Ok(receipt) => {
                info!(
                    tx_id = %receipt.tx_id,
                    sequence = receipt.sequence,
                    events = receipt.events.len(),
                    "Settlement applied"
                );
                Ok(receipt)
            }
            Err(err) => {
                warn!(matcher = %matcher, error = %err, "Settlement rejected");
                Err(err)
            }
        }
    }
}

fn fill_event(order: &Order, order_hash: OrderHash, matcher: Address, fill: &FillResults) -> ContractEvent {
    ContractEvent::Fill(Fill {
        order_hash,
        maker: order.maker,
        matcher,
        maker_asset_filled: fill.maker_asset_filled,
        taker_asset_filled: fill.taker_asset_filled,
        maker_fee_paid: fill.maker_fee_paid,
        taker_fee_paid: fill.taker_fee_paid,
    })
}

fn mismatch_reason(expected: &SettlementResult, submitted: &SettlementResult) -> &'static str {
    if expected.left_order_hash != submitted.left_order_hash || expected.right_order_hash != submitted.right_order_hash {
        "order hashes differ"
    } else if expected.matcher != submitted.matcher {
        "matcher differs"
    } else if expected.left != submitted.left || expected.right != submitted.right {
        "fill amounts differ"
    } else if expected.spread != submitted.spread {
        "spread differs"
    } else if expected.fees != submitted.fees {
        "fees differ"
    } else {
        "transfers differ"
    }
}

fn transaction_id(sequence: u64, left: &OrderHash, right: &OrderHash, matcher: &Address) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sequence.to_be_bytes());
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hasher.update(matcher.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::MatchError;
    use crate::settlement::TransferKind;
    use ed25519_dalek::SigningKey;
    use order_core::signing::{address_of, sign_order_with_key};
    use types::order::SignatureScheme;

    const NOW: u64 = 1_700_000_000;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn token(byte: u8) -> AssetData {
        AssetData::erc20(addr(byte))
    }

    struct Fixture {
        exchange: Exchange,
        left_key: SigningKey,
        right_key: SigningKey,
        matcher: Address,
    }

    impl Fixture {
        async fn new() -> Self {
            let exchange = Exchange::new(addr(0xee), MatchConfig::new(token(0xfe)));
            exchange.set_block_time(NOW).await;
            let fixture = Self {
                exchange,
                left_key: SigningKey::from_bytes(&[1; 32]),
                right_key: SigningKey::from_bytes(&[2; 32]),
                matcher: addr(0x99),
            };
            let (l, r) = (fixture.left(), fixture.right());
            fixture.exchange.deposit(l, token(0xa), Amount::from_u64(100)).await.unwrap();
            fixture.exchange.deposit(r, token(0xb), Amount::from_u64(4)).await.unwrap();
            fixture.exchange.set_unlimited_allowance(l, token(0xa)).await;
            fixture.exchange.set_unlimited_allowance(r, token(0xb)).await;
            fixture
        }

        fn left(&self) -> Address {
            address_of(&self.left_key)
        }

        fn right(&self) -> Address {
            address_of(&self.right_key)
        }

        fn order(&self, key: &SigningKey, maker_asset: u8, taker_asset: u8, maker: u64, taker: u64) -> SignedOrder {
            let order = Order {
                exchange: addr(0xee),
                maker: address_of(key),
                taker: None,
                sender: None,
                fee_recipient: None,
                maker_asset: token(maker_asset),
                taker_asset: token(taker_asset),
                maker_asset_amount: Amount::from_u64(maker),
                taker_asset_amount: Amount::from_u64(taker),
                maker_fee: Amount::ZERO,
                taker_fee: Amount::ZERO,
                expiration: NOW + 600,
                salt: Amount::from_u64(7),
            };
            let signature = sign_order_with_key(&order, key, SignatureScheme::Ed25519).unwrap();
            SignedOrder::new(order, signature)
        }

        fn pair(&self) -> (SignedOrder, SignedOrder) {
            (
                self.order(&self.left_key, 0xa, 0xb, 100, 4),
                self.order(&self.right_key, 0xb, 0xa, 4, 2),
            )
        }

        fn result(&self, left: &SignedOrder, right: &SignedOrder) -> SettlementResult {
            match_orders(left, right, &self.matcher, NOW, self.exchange.config()).unwrap()
        }
    }

    #[tokio::test]
    async fn test_submit_applies_transfers() {
        let fx = Fixture::new().await;
        let (left, right) = fx.pair();
        let result = fx.result(&left, &right);

        let receipt = fx.exchange.submit(&left, &right, &fx.matcher, &result).await.unwrap();
        assert_eq!(receipt.sequence, 1);
        assert_eq!(receipt.tx_id.len(), 64);
        assert_eq!(receipt.events.len(), 5); // 3 transfers + 2 fills

        assert_eq!(fx.exchange.balance_of(&fx.left(), &token(0xb)).await, Amount::from_u64(4));
        assert_eq!(fx.exchange.balance_of(&fx.right(), &token(0xa)).await, Amount::from_u64(2));
        assert_eq!(fx.exchange.balance_of(&fx.matcher, &token(0xa)).await, Amount::from_u64(98));
        assert_eq!(fx.exchange.balance_of(&fx.left(), &token(0xa)).await, Amount::ZERO);
        assert!(fx.exchange.is_filled(&result.left_order_hash).await);
        assert!(fx.exchange.is_filled(&result.right_order_hash).await);
    }

    #[tokio::test]
    async fn test_double_submission_rejected() {
        let fx = Fixture::new().await;
        let (left, right) = fx.pair();
        let result = fx.result(&left, &right);
        fx.exchange.submit(&left, &right, &fx.matcher, &result).await.unwrap();

        let err = fx.exchange.submit(&left, &right, &fx.matcher, &result).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::OrderAlreadyFilled {
                order_hash: result.left_order_hash
            }
        );
    }

    #[tokio::test]
    async fn test_cancelled_order_rejected() {
        let fx = Fixture::new().await;
        let (left, right) = fx.pair();
        let result = fx.result(&left, &right);

        let err = fx.exchange.cancel_order(&fx.left(), &right.order).await.unwrap_err();
        assert_eq!(err, LedgerError::Unauthorized { caller: fx.left() });

        fx.exchange.cancel_order(&fx.right(), &right.order).await.unwrap();
        assert!(fx.exchange.is_cancelled(&result.right_order_hash).await);

        let err = fx.exchange.submit(&left, &right, &fx.matcher, &result).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::OrderCancelled {
                order_hash: result.right_order_hash
            }
        );
        assert_eq!(fx.exchange.balance_of(&fx.left(), &token(0xa)).await, Amount::from_u64(100));
    }

    #[tokio::test]
    async fn test_tampered_result_rejected() {
        let fx = Fixture::new().await;
        let (left, right) = fx.pair();
        let mut result = fx.result(&left, &right);
        result.spread.amount = Amount::from_u64(99);
        result.transfers.retain(|t| t.kind != TransferKind::Spread);

        let err = fx.exchange.submit(&left, &right, &fx.matcher, &result).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::ResultMismatch {
                reason: "spread differs".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_expiry_checked_at_block_time() {
        let fx = Fixture::new().await;
        let (left, right) = fx.pair();
        let result = fx.result(&left, &right);
        fx.exchange.set_block_time(NOW + 600).await;

        let err = fx.exchange.submit(&left, &right, &fx.matcher, &result).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(MatchError::OrderExpired { .. })));
    }

    #[tokio::test]
    async fn test_wrong_exchange_rejected() {
        let fx = Fixture::new().await;
        let other = Exchange::new(addr(0xef), MatchConfig::new(token(0xfe)));
        let (left, right) = fx.pair();
        let result = fx.result(&left, &right);

        let err = other.submit(&left, &right, &fx.matcher, &result).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::WrongExchange {
                expected: addr(0xef),
                actual: addr(0xee)
            }
        );
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_state_untouched() {
        let fx = Fixture::new().await;
        let left = fx.order(&fx.left_key, 0xa, 0xb, 200, 8);
        let right = fx.order(&fx.right_key, 0xb, 0xa, 8, 4);
        let result = fx.result(&left, &right);

        let err = fx.exchange.submit(&left, &right, &fx.matcher, &result).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert!(!fx.exchange.is_filled(&result.left_order_hash).await);
        assert_eq!(fx.exchange.balance_of(&fx.left(), &token(0xa)).await, Amount::from_u64(100));
        assert_eq!(fx.exchange.balance_of(&fx.right(), &token(0xb)).await, Amount::from_u64(4));
    }
}
