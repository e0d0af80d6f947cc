//! Asset descriptors
//!
//! An asset is identified by a 4-byte proxy id (the token standard) followed
//! by standard-specific parameters. The canonical byte form is what orders
//! commit to, so two descriptors are the same asset exactly when their
//! canonical bytes are equal.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::errors::EncodingError;
use crate::ids::Address;
use crate::numeric::Amount;

/// Proxy id of fungible (ERC-20 style) tokens.
pub const ERC20_PROXY_ID: [u8; 4] = [0xf4, 0x72, 0x61, 0xb0];

/// Proxy id of non-fungible (ERC-721 style) tokens.
pub const ERC721_PROXY_ID: [u8; 4] = [0x02, 0x57, 0x17, 0x92];

/// Upper bound on the payload of a custom descriptor.
pub const MAX_ASSET_DATA_LEN: usize = 1024;

/// Asset descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "standard", rename_all = "snake_case")]
pub enum AssetData {
    /// Fungible token identified by its contract.
    Erc20 { token: Address },
    /// Single non-fungible token.
    Erc721 { token: Address, token_id: Amount },
    /// Any other standard, carried as raw parameters.
    Custom {
        #[serde(with = "hex::serde")]
        proxy_id: [u8; 4],
        #[serde(with = "hex::serde")]
        data: Vec<u8>,
    },
}

impl AssetData {
    pub fn erc20(token: Address) -> Self {
        AssetData::Erc20 { token }
    }

    pub fn erc721(token: Address, token_id: Amount) -> Self {
        AssetData::Erc721 { token, token_id }
    }

    pub fn proxy_id(&self) -> [u8; 4] {
        match self {
            AssetData::Erc20 { .. } => ERC20_PROXY_ID,
            AssetData::Erc721 { .. } => ERC721_PROXY_ID,
            AssetData::Custom { proxy_id, .. } => *proxy_id,
        }
    }

    /// Canonical byte form: `proxy_id ‖ parameters`.
    pub fn encode(&self) -> Result<Vec<u8>, EncodingError> {
        match self {
            AssetData::Erc20 { token } => {
                let mut out = Vec::with_capacity(4 + 32);
                out.extend_from_slice(&ERC20_PROXY_ID);
                out.extend_from_slice(token.as_bytes());
                Ok(out)
            }
            AssetData::Erc721 { token, token_id } => {
                let mut out = Vec::with_capacity(4 + 64);
                out.extend_from_slice(&ERC721_PROXY_ID);
                out.extend_from_slice(token.as_bytes());
                out.extend_from_slice(&token_id.to_be_bytes());
                Ok(out)
            }
            AssetData::Custom { proxy_id, data } => {
                if *proxy_id == ERC20_PROXY_ID || *proxy_id == ERC721_PROXY_ID {
                    return Err(EncodingError::ReservedProxyId {
                        proxy_id: hex::encode(proxy_id),
                    });
                }
                if data.is_empty() {
                    return Err(EncodingError::EmptyAssetData);
                }
                if data.len() > MAX_ASSET_DATA_LEN {
                    return Err(EncodingError::AssetDataTooLong {
                        len: data.len(),
                        max: MAX_ASSET_DATA_LEN,
                    });
                }
                let mut out = Vec::with_capacity(4 + data.len());
                out.extend_from_slice(proxy_id);
                out.extend_from_slice(data);
                Ok(out)
            }
        }
    }

    /// SHA-256 of the canonical bytes; the fixed-width form embedded in order hashes.
    pub fn digest(&self) -> Result<[u8; 32], EncodingError> {
        Ok(Sha256::digest(self.encode()?).into())
    }
}

impl fmt::Display for AssetData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetData::Erc20 { token } => write!(f, "erc20:{}", token),
            AssetData::Erc721 { token, token_id } => write!(f, "erc721:{}#{}", token, token_id),
            AssetData::Custom { proxy_id, data } => {
                write!(f, "0x{}:0x{}", hex::encode(proxy_id), hex::encode(data))
            }
        }
    }
}
