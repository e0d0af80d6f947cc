//! Matching and Settlement
//!
//! This crate decides whether two signed orders can be settled against each
//! other and computes exactly what moves when they are, then carries the
//! result to a ledger.
//!
//! # Modules
//! - `settlement`: Fill arithmetic, fees, spread and the transfer list
//! - `matching`: Pair validation and the `match_orders` entry point
//! - `config`: Per-exchange matching parameters
//! - `errors`: Match, ledger and broadcast error types
//! - `events`: Ledger event records
//! - `vault`: Balance and allowance custody with atomic batch transfers
//! - `exchange`: `SettlementLedger` trait and the reference in-memory exchange
//! - `broadcast`: `Broadcaster` trait, local broadcaster and timeout adapter

pub mod broadcast;
pub mod config;
pub mod errors;
pub mod events;
pub mod exchange;
pub mod matching;
pub mod settlement;
pub mod vault;

/// Settlement semantics version — frozen after release
pub const SETTLEMENT_VERSION: &str = "1.0.0";
