//! Read-only order book projection
//!
//! Splits an externally supplied, unordered set of signed orders into bids and
//! asks for one base/quote pair, and filters by validity metadata computed
//! elsewhere. Nothing is cached: every call recomputes from its input, and
//! input order is preserved.
//!
//! - ask: sells `base` for `quote`
//! - bid: sells `quote` for `base`

use serde::{Deserialize, Serialize};
use types::asset::AssetData;
use types::numeric::Amount;
use types::order::SignedOrder;

/// Validity metadata attached by an external validator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderMetadata {
    pub is_valid: bool,
    /// Taker amount still fillable, when the validator knows it.
    pub remaining_fillable_taker_amount: Option<Amount>,
}

/// A signed order with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWithMetadata {
    pub order: SignedOrder,
    pub metadata: OrderMetadata,
}

impl OrderWithMetadata {
    pub fn new(order: SignedOrder, metadata: OrderMetadata) -> Self {
        Self { order, metadata }
    }
}

/// Base/quote convention for classifying orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    base: AssetData,
    quote: AssetData,
}

impl AssetPair {
    /// `None` when base and quote are the same asset.
    pub fn new(base: AssetData, quote: AssetData) -> Option<Self> {
        if base == quote {
            return None;
        }
        Some(Self { base, quote })
    }

    pub fn base(&self) -> &AssetData {
        &self.base
    }

    pub fn quote(&self) -> &AssetData {
        &self.quote
    }
}

/// Result of [`partition`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookSides<'a> {
    pub bids: Vec<&'a OrderWithMetadata>,
    pub asks: Vec<&'a OrderWithMetadata>,
}

/// Classify orders as bids or asks for `pair`. Orders on other pairs are dropped.
pub fn partition<'a>(orders: &'a [OrderWithMetadata], pair: &AssetPair) -> BookSides<'a> {
    let mut sides = BookSides::default();
    for entry in orders {
        let order = &entry.order.order;
        if order.maker_asset == pair.base && order.taker_asset == pair.quote {
            sides.asks.push(entry);
        } else if order.maker_asset == pair.quote && order.taker_asset == pair.base {
            sides.bids.push(entry);
        }
    }
    sides
}

/// Keep only entries marked valid.
pub fn filter_valid<'a, I>(orders: I) -> Vec<&'a OrderWithMetadata>
where
    I: IntoIterator<Item = &'a OrderWithMetadata>,
{
    orders.into_iter().filter(|o| o.metadata.is_valid).collect()
}

/// Valid bids for `pair`.
pub fn valid_bids<'a>(orders: &'a [OrderWithMetadata], pair: &AssetPair) -> Vec<&'a OrderWithMetadata> {
    filter_valid(partition(orders, pair).bids)
}

/// Valid asks for `pair`.
pub fn valid_asks<'a>(orders: &'a [OrderWithMetadata], pair: &AssetPair) -> Vec<&'a OrderWithMetadata> {
    filter_valid(partition(orders, pair).asks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Address;
    use types::order::{Order, Signature, SignatureScheme};

    fn asset(byte: u8) -> AssetData {
        AssetData::erc20(Address::from_bytes([byte; 32]))
    }

    fn entry(maker_asset: u8, taker_asset: u8, salt: u64, is_valid: bool) -> OrderWithMetadata {
        let order = Order {
            exchange: Address::ZERO,
            maker: Address::from_bytes([1; 32]),
            taker: None,
            sender: None,
            fee_recipient: None,
            maker_asset: asset(maker_asset),
            taker_asset: asset(taker_asset),
            maker_asset_amount: Amount::from_u64(1),
            taker_asset_amount: Amount::from_u64(1),
            maker_fee: Amount::ZERO,
            taker_fee: Amount::ZERO,
            expiration: 0,
            salt: Amount::from_u64(salt),
        };
        OrderWithMetadata::new(
            SignedOrder::new(order, Signature::new(SignatureScheme::Ed25519, vec![])),
            OrderMetadata { is_valid, remaining_fillable_taker_amount: None },
        )
    }

    fn salts(entries: &[&OrderWithMetadata]) -> Vec<u64> {
        entries
            .iter()
            .map(|e| e.order.order.salt.as_u256().low_u64())
            .collect()
    }

    #[test]
    fn test_asset_pair_rejects_identical_assets() {
        assert!(AssetPair::new(asset(1), asset(1)).is_none());
        assert!(AssetPair::new(asset(1), asset(2)).is_some());
    }

    #[test]
    fn test_partition_by_pair() {
        // base = 0xa, quote = 0xb
        let orders = vec![
            entry(0xa, 0xb, 1, true),  // ask
            entry(0xb, 0xa, 2, true),  // bid
            entry(0xa, 0xc, 3, true),  // other pair
            entry(0xa, 0xb, 4, false), // ask
            entry(0xb, 0xa, 5, true),  // bid
        ];
        let pair = AssetPair::new(asset(0xa), asset(0xb)).unwrap();
        let sides = partition(&orders, &pair);
        assert_eq!(salts(&sides.asks), vec![1, 4]);
        assert_eq!(salts(&sides.bids), vec![2, 5]);
    }

    #[test]
    fn test_filter_valid_preserves_order() {
        let orders = vec![
            entry(0xa, 0xb, 1, true),
            entry(0xa, 0xb, 2, false),
            entry(0xa, 0xb, 3, true),
        ];
        assert_eq!(salts(&filter_valid(&orders)), vec![1, 3]);
    }

    #[test]
    fn test_valid_sides() {
        let orders = vec![
            entry(0xa, 0xb, 1, false),
            entry(0xa, 0xb, 2, true),
            entry(0xb, 0xa, 3, false),
        ];
        let pair = AssetPair::new(asset(0xa), asset(0xb)).unwrap();
        assert_eq!(salts(&valid_asks(&orders, &pair)), vec![2]);
        assert!(valid_bids(&orders, &pair).is_empty());
    }

    #[test]
    fn test_metadata_json_shape() {
        let original = entry(0xa, 0xb, 9, true);
        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(json["metadata"]["is_valid"], true);
        assert!(json["metadata"]["remaining_fillable_taker_amount"].is_null());
        let back: OrderWithMetadata = serde_json::from_value(json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_empty_input() {
        let pair = AssetPair::new(asset(0xa), asset(0xb)).unwrap();
        let sides = partition(&[], &pair);
        assert!(sides.bids.is_empty());
        assert!(sides.asks.is_empty());
    }
}
