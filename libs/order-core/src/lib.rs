//! Order Core — maker-side computation layer
//!
//! Provides deterministic order handling for makers and matchers:
//! - Order signing and verification behind an external `Signer` capability
//! - Complementary (left/right) order pair construction
//! - Bid/ask projection of order collections for display
//!
//! # Determinism
//! Everything except salt generation and the signer boundary is a pure
//! function of its inputs.

pub mod signing;
pub mod builder;
pub mod order_book;

/// Crate version constant
pub const ORDER_CORE_VERSION: &str = "1.0.0";
