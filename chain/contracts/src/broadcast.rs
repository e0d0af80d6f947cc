//! Broadcasting matched pairs to a ledger
//!
//! A [`Broadcaster`] delivers a [`MatchTransaction`] to wherever settlement
//! happens and reports the receipt. [`BroadcastLedger`] adapts any
//! broadcaster into a [`SettlementLedger`] with a per-submission timeout.
//! [`LocalBroadcaster`] mines directly into an in-process [`Exchange`] held
//! through an explicitly passed handle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use types::ids::Address;
use types::order::SignedOrder;

use crate::errors::{BroadcastError, LedgerError};
use crate::exchange::{Exchange, SettlementLedger, TransactionReceipt};
use crate::settlement::SettlementResult;

/// Everything a ledger needs to settle one pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchTransaction {
    pub left: SignedOrder,
    pub right: SignedOrder,
    pub matcher: Address,
    pub result: SettlementResult,
}

/// Delivers transactions to a ledger.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, tx: MatchTransaction) -> Result<TransactionReceipt, BroadcastError>;
}

/// Broadcaster that applies transactions to an in-process exchange.
#[derive(Debug, Clone)]
pub struct LocalBroadcaster {
    exchange: Arc<Exchange>,
}

impl LocalBroadcaster {
    pub fn new(exchange: Arc<Exchange>) -> Self {
        Self { exchange }
    }

    pub fn exchange(&self) -> &Arc<Exchange> {
        &self.exchange
    }
}

#[async_trait]
impl Broadcaster for LocalBroadcaster {
    async fn broadcast(&self, tx: MatchTransaction) -> Result<TransactionReceipt, BroadcastError> {
        self.exchange
            .submit(&tx.left, &tx.right, &tx.matcher, &tx.result)
            .await
            .map_err(|err| BroadcastError::Reverted(Box::new(err)))
    }
}

/// [`SettlementLedger`] over a broadcaster, bounded by `timeout`.
///
/// A revert surfaces as the ledger error that caused it; only a timeout is
/// reported as [`LedgerError::Broadcast`].
#[derive(Debug, Clone)]
pub struct BroadcastLedger<B> {
    broadcaster: B,
    timeout: Duration,
}

impl<B: Broadcaster> BroadcastLedger<B> {
    pub fn new(broadcaster: B, timeout: Duration) -> Self {
        Self { broadcaster, timeout }
    }

    pub fn broadcaster(&self) -> &B {
        &self.broadcaster
    }

    /// Timeout in whole milliseconds, saturating at `u64::MAX`.
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[async_trait]
impl<B: Broadcaster> SettlementLedger for BroadcastLedger<B> {
    async fn submit(
        &self,
        left: &SignedOrder,
        right: &SignedOrder,
        matcher: &Address,
        result: &SettlementResult,
    ) -> Result<TransactionReceipt, LedgerError> {
        let tx = MatchTransaction {
            left: left.clone(),
            right: right.clone(),
            matcher: *matcher,
            result: result.clone(),
        };

        match tokio::time::timeout(self.timeout, self.broadcaster.broadcast(tx)).await {
            Ok(Ok(receipt)) => {
                debug!(tx_id = %receipt.tx_id, "Broadcast confirmed");
                Ok(receipt)
            }
            Ok(Err(BroadcastError::Reverted(err))) => Err(*err),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                let after_ms = self.timeout_ms();
                warn!(after_ms, "Broadcast timed out");
                Err(BroadcastError::Timeout { after_ms }.into())
            }
        }
    }
}
