//! Scenario configuration
//!
//! Every field has a default reproducing the reference match: the left maker
//! sells 10 ZRX for 0.4 WETH, the right maker sells 0.4 WETH for 0.2 ZRX, no
//! fees, 18 decimals. A JSON file named by `SCENARIO_CONFIG` overrides any
//! subset of fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use types::order::SignatureScheme;

use crate::ScenarioError;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "SCENARIO_CONFIG";

/// Configuration for the match-orders scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Decimal places of both assets
    pub decimals: u32,
    /// Symbol of the asset the left maker sells (also the fee asset)
    pub maker_asset_symbol: String,
    /// Symbol of the asset the left maker buys
    pub taker_asset_symbol: String,
    /// Left maker sells this much of the maker asset
    pub left_maker_amount: Decimal,
    /// Left maker wants this much of the taker asset
    pub left_taker_amount: Decimal,
    /// Right maker wants this much of the maker asset
    pub right_taker_amount: Decimal,
    pub maker_fee: Decimal,
    pub taker_fee: Decimal,
    /// Orders expire this long after the scenario starts
    pub expiry_secs: u64,
    pub scheme: SignatureScheme,
    pub broadcast_timeout_ms: u64,
    /// Seeds keys and salts; `None` draws from the OS
    pub seed: Option<u64>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            decimals: 18,
            maker_asset_symbol: "ZRX".to_string(),
            taker_asset_symbol: "WETH".to_string(),
            left_maker_amount: Decimal::from(10),
            left_taker_amount: Decimal::new(4, 1),
            right_taker_amount: Decimal::new(2, 1),
            maker_fee: Decimal::ZERO,
            taker_fee: Decimal::ZERO,
            expiry_secs: 600,
            scheme: SignatureScheme::Ed25519Prefixed,
            broadcast_timeout_ms: 5_000,
            seed: None,
        }
    }
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ScenarioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScenarioError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Load from the file named by `SCENARIO_CONFIG`, or the defaults.
    pub fn from_env() -> Result<Self, ScenarioError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        for (name, value) in [
            ("left_maker_amount", self.left_maker_amount),
            ("left_taker_amount", self.left_taker_amount),
            ("right_taker_amount", self.right_taker_amount),
        ] {
            if value <= Decimal::ZERO {
                return Err(ScenarioError::Config(format!("{} must be positive", name)));
            }
        }
        if self.maker_fee < Decimal::ZERO || self.taker_fee < Decimal::ZERO {
            return Err(ScenarioError::Config("fees must not be negative".to_string()));
        }
        if self.maker_asset_symbol == self.taker_asset_symbol {
            return Err(ScenarioError::Config("asset symbols must differ".to_string()));
        }
        if self.maker_asset_symbol.len() > 32 || self.taker_asset_symbol.len() > 32 {
            return Err(ScenarioError::Config("asset symbols are limited to 32 bytes".to_string()));
        }
        if self.expiry_secs == 0 {
            return Err(ScenarioError::Config("expiry_secs must be positive".to_string()));
        }
        Ok(())
    }
}
