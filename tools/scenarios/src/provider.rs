//! Scoped provider engine
//!
//! Owns the connection to the ledger (an in-process exchange) and the key
//! ring for the scenario accounts. It is constructed explicitly and handed to
//! whatever needs it; dropping it stops it, so every exit path releases it.

use contracts::broadcast::{BroadcastLedger, LocalBroadcaster};
use contracts::config::MatchConfig;
use contracts::exchange::Exchange;
use order_core::signing::Keyring;
use rand::{CryptoRng, RngCore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use types::ids::Address;

use crate::ScenarioError;

/// Ledger handle plus signing accounts.
pub struct ProviderEngine {
    exchange: Arc<Exchange>,
    keyring: Keyring,
    accounts: Vec<Address>,
    running: Arc<AtomicBool>,
}

impl ProviderEngine {
    /// Start a provider over a fresh exchange at `exchange_address` with
    /// `account_count` generated accounts.
    pub fn start<R: RngCore + CryptoRng>(
        exchange_address: Address,
        config: MatchConfig,
        account_count: usize,
        rng: &mut R,
    ) -> Self {
        let mut keyring = Keyring::new();
        let accounts = (0..account_count).map(|_| keyring.generate(rng)).collect();
        info!(exchange = %exchange_address, accounts = account_count, "Provider engine started");
        Self {
            exchange: Arc::new(Exchange::new(exchange_address, config)),
            keyring,
            accounts,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Accounts in creation order.
    pub fn available_addresses(&self) -> Result<&[Address], ScenarioError> {
        self.ensure_running()?;
        Ok(&self.accounts)
    }

    pub fn exchange(&self) -> Result<&Arc<Exchange>, ScenarioError> {
        self.ensure_running()?;
        Ok(&self.exchange)
    }

    pub fn signer(&self) -> Result<&Keyring, ScenarioError> {
        self.ensure_running()?;
        Ok(&self.keyring)
    }

    /// Ledger submitting through a local broadcaster with `timeout`.
    pub fn ledger(&self, timeout: Duration) -> Result<BroadcastLedger<LocalBroadcaster>, ScenarioError> {
        self.ensure_running()?;
        Ok(BroadcastLedger::new(LocalBroadcaster::new(self.exchange.clone()), timeout))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Flag observers can keep after the engine is gone.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Stop the engine. Idempotent.
    pub fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!(exchange = %self.exchange.address(), "Provider engine stopped");
        }
    }

    fn ensure_running(&self) -> Result<(), ScenarioError> {
        if !self.is_running() {
            return Err(ScenarioError::ProviderStopped);
        }
        Ok(())
    }
}

impl Drop for ProviderEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
