//! Matching configuration

use serde::{Deserialize, Serialize};
use types::asset::AssetData;

/// Parameters shared by every match settled on one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Asset all maker and taker fees are denominated in.
    pub fee_asset: AssetData,
}

impl MatchConfig {
    pub fn new(fee_asset: AssetData) -> Self {
        Self { fee_asset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Address;

    #[test]
    fn test_config_json() {
        let config = MatchConfig::new(AssetData::erc20(Address::from_bytes([7; 32])));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"fee_asset\""));
        let back: MatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
