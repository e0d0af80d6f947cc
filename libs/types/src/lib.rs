//! Types library for peer-to-peer order settlement
//!
//! Immutable order model shared by makers, matchers and the settlement ledger.
//!
//! # Modules
//! - `ids`: 32-byte identities (`Address`) and digests (`OrderHash`)
//! - `numeric`: 256-bit base-unit amounts with widened products
//! - `asset`: asset descriptors and their canonical bytes
//! - `order`: `Order`, `Signature`, `SignedOrder` and the order hash
//! - `errors`: error taxonomy

pub mod ids;
pub mod numeric;
pub mod asset;
pub mod order;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::asset::*;
    pub use crate::order::*;
    pub use crate::errors::*;
}
