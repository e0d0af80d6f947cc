//! Match-orders scenario
//!
//! The left maker signs an order selling the maker asset for the taker asset.
//! The right maker signs the mirrored order. The matcher submits both to the
//! exchange, pays the taker fee on both orders and receives the spread; each
//! maker pays its own maker fee.

use chrono::Utc;
use contracts::config::MatchConfig;
use contracts::errors::LedgerError;
use contracts::exchange::SettlementLedger;
use contracts::matching::match_orders;
use order_core::builder::{build_complementary_pair_with_rng, PairParams, SideFees};
use order_core::signing::sign_order;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;
use types::asset::AssetData;
use types::ids::{Address, OrderHash};
use types::numeric::Amount;

use crate::config::ScenarioConfig;
use crate::printing::{BalanceSnapshot, PrintUtils};
use crate::provider::ProviderEngine;
use crate::ScenarioError;

pub const LEFT_MAKER: &str = "leftMaker";
pub const RIGHT_MAKER: &str = "rightMaker";
pub const MATCHER: &str = "matcher";
pub const FEE_RECIPIENT: &str = "feeRecipient";

/// What the scenario did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub left_order_hash: OrderHash,
    pub right_order_hash: OrderHash,
    pub tx_id: String,
    pub spread: Amount,
    pub balances_before: BalanceSnapshot,
    pub balances_after: BalanceSnapshot,
}

/// Left-aligned ASCII name as a 32-byte address.
pub fn named_address(name: &str) -> Address {
    let mut bytes = [0u8; 32];
    let len = name.len().min(32);
    bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
    Address::from_bytes(bytes)
}

/// Run the match-orders scenario at the current wall-clock time.
pub async fn run(config: &ScenarioConfig) -> Result<ScenarioReport, ScenarioError> {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    run_at(config, now).await
}

/// Run the match-orders scenario with the ledger clock at `now`.
pub async fn run_at(config: &ScenarioConfig, now: u64) -> Result<ScenarioReport, ScenarioError> {
    config.validate()?;
    PrintUtils::print_scenario("Match Orders");

    let mut rng = match config.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let to_base = |value| Amount::from_units(value, config.decimals);
    let left_maker_amount = to_base(config.left_maker_amount)?;
    let left_taker_amount = to_base(config.left_taker_amount)?;
    let right_taker_amount = to_base(config.right_taker_amount)?;
    let fees = SideFees {
        maker_fee: to_base(config.maker_fee)?,
        taker_fee: to_base(config.taker_fee)?,
    };
    let charges_fees = !fees.maker_fee.is_zero() || !fees.taker_fee.is_zero();

    let maker_token = AssetData::erc20(named_address(&config.maker_asset_symbol));
    let taker_token = AssetData::erc20(named_address(&config.taker_asset_symbol));
    let exchange_address = named_address("exchange");

    let mut provider = ProviderEngine::start(
        exchange_address,
        MatchConfig::new(maker_token.clone()),
        if charges_fees { 4 } else { 3 },
        &mut rng,
    );
    let accounts = provider.available_addresses()?.to_vec();
    let (left_maker, right_maker, matcher) = (accounts[0], accounts[1], accounts[2]);
    let fee_recipient = accounts.get(3).copied();

    let mut labelled = vec![
        (LEFT_MAKER.to_string(), left_maker),
        (RIGHT_MAKER.to_string(), right_maker),
        (MATCHER.to_string(), matcher),
    ];
    if let Some(recipient) = fee_recipient {
        labelled.push((FEE_RECIPIENT.to_string(), recipient));
    }
    let printer = PrintUtils::new(
        labelled,
        vec![
            (config.maker_asset_symbol.clone(), maker_token.clone()),
            (config.taker_asset_symbol.clone(), taker_token.clone()),
        ],
        config.decimals,
    );
    printer.print_accounts();

    // Setup: approvals, then funding
    let exchange = provider.exchange()?.clone();
    let mut setup = Vec::new();
    for (label, owner, token, symbol) in [
        (LEFT_MAKER, left_maker, &maker_token, &config.maker_asset_symbol),
        (RIGHT_MAKER, right_maker, &maker_token, &config.maker_asset_symbol),
        (MATCHER, matcher, &maker_token, &config.maker_asset_symbol),
        (RIGHT_MAKER, right_maker, &taker_token, &config.taker_asset_symbol),
    ] {
        exchange.set_unlimited_allowance(owner, token.clone()).await;
        setup.push((format!("{} {} Approval", label, symbol), "unlimited".to_string()));
    }

    let taker_fees = fees.taker_fee.checked_add(fees.taker_fee).ok_or(LedgerError::Overflow)?;
    let left_funding = left_maker_amount.checked_add(fees.maker_fee).ok_or(LedgerError::Overflow)?;
    for (label, owner, token, symbol, amount) in [
        (LEFT_MAKER, left_maker, &maker_token, &config.maker_asset_symbol, left_funding),
        (RIGHT_MAKER, right_maker, &taker_token, &config.taker_asset_symbol, left_taker_amount),
        (RIGHT_MAKER, right_maker, &maker_token, &config.maker_asset_symbol, fees.maker_fee),
        (MATCHER, matcher, &maker_token, &config.maker_asset_symbol, taker_fees),
    ] {
        if amount.is_zero() {
            continue;
        }
        exchange.deposit(owner, token.clone(), amount).await?;
        setup.push((format!("{} {} Deposit", label, symbol), amount.to_string()));
    }
    PrintUtils::print_data("Setup", &setup);

    // Orders
    exchange.set_block_time(now).await;
    let expiration = now
        .checked_add(config.expiry_secs)
        .ok_or_else(|| ScenarioError::Config("expiry_secs overflows the expiration timestamp".to_string()))?;
    let mut params = PairParams::new(
        exchange_address,
        left_maker,
        right_maker,
        maker_token.clone(),
        taker_token.clone(),
        left_maker_amount,
        left_taker_amount,
        right_taker_amount,
        expiration,
    );
    if let Some(recipient) = fee_recipient {
        params = params.with_fees(recipient, fees, fees);
    }
    let (left_order, right_order) = build_complementary_pair_with_rng(&params, &mut rng)?;
    PrintUtils::print_order("Left Order", &left_order);
    PrintUtils::print_order("Right Order", &right_order);

    let signer = provider.signer()?;
    let left = sign_order(left_order, signer, config.scheme).await?;
    let right = sign_order(right_order, signer, config.scheme).await?;

    let allowances = printer.fetch_allowances(&exchange).await;
    printer.print_snapshot("Allowances", &allowances);
    let balances_before = printer.fetch_balances(&exchange).await;
    printer.print_snapshot("Balances", &balances_before);

    // Match and settle
    let result = match_orders(&left, &right, &matcher, now, exchange.config())?;
    let ledger = provider.ledger(Duration::from_millis(config.broadcast_timeout_ms))?;
    let receipt = ledger.submit(&left, &right, &matcher, &result).await?;
    printer.print_transaction(
        "matchOrders",
        &receipt,
        &[
            ("left orderHash".to_string(), result.left_order_hash.to_string()),
            ("right orderHash".to_string(), result.right_order_hash.to_string()),
        ],
    );

    let balances_after = printer.fetch_balances(&exchange).await;
    printer.print_snapshot("Balances", &balances_after);

    provider.stop();
    info!(tx_id = %receipt.tx_id, spread = %result.spread.amount, "Scenario complete");

    Ok(ScenarioReport {
        left_order_hash: result.left_order_hash,
        right_order_hash: result.right_order_hash,
        tx_id: receipt.tx_id,
        spread: result.spread.amount,
        balances_before,
        balances_after,
    })
}
