//! Settlement Scenarios
//!
//! Runnable end-to-end scenarios for the settlement protocol against the
//! in-process reference exchange.
//!
//! # Modules
//! - `config` — Scenario parameters with defaults and JSON overrides
//! - `provider` — Scoped provider engine owning the ledger handle and keys
//! - `printing` — Balance, allowance, order and receipt tables
//! - `match_scenario` — The match-orders scenario

pub mod config;
pub mod match_scenario;
pub mod printing;
pub mod provider;

use contracts::errors::{LedgerError, MatchError};
use order_core::builder::BuilderError;
use order_core::signing::SigningError;
use types::errors::AmountError;

/// Crate version constant
pub const VERSION: &str = "1.0.0";

/// Scenario failures.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error("Provider engine stopped")]
    ProviderStopped,

    #[error("Building orders failed: {0}")]
    Builder(#[from] BuilderError),

    #[error("Signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("Orders did not match: {0}")]
    Match(#[from] MatchError),

    #[error("Settlement failed: {0}")]
    Ledger(#[from] LedgerError),
}
