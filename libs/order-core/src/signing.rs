//! Signing Module — order signing and verification
//!
//! Binds a maker's identity to an order hash. Two Ed25519 schemes exist:
//! signing the raw 32-byte order hash, or signing a personal-message digest
//! wrapping it (what interactive wallets produce). The scheme id travels with
//! the signature so verification knows how to interpret the bytes.
//!
//! Private keys never enter the core: signing goes through the [`Signer`]
//! capability. [`Keyring`] is the in-process implementation used by tests and
//! the scenario tool.

use async_trait::async_trait;
use ed25519_dalek::{Signature as Ed25519Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;
use types::errors::EncodingError;
use types::ids::{Address, OrderHash};
use types::order::{Order, Signature, SignatureScheme, SignedOrder};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Prefix of the personal-message form (`Ed25519Prefixed`).
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Signed Order Hash:\n32";

/// Ed25519 signature length in bytes.
const SIGNATURE_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Signer capability
// ---------------------------------------------------------------------------

/// External key-material capability.
///
/// Implementations may prompt a user or talk to a device, hence async.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign `digest` as `identity` using `scheme`.
    async fn sign_digest(
        &self,
        digest: &OrderHash,
        identity: &Address,
        scheme: SignatureScheme,
    ) -> Result<Signature, SignerError>;
}

/// In-process key ring keyed by address.
#[derive(Clone, Default)]
pub struct Keyring {
    keys: BTreeMap<Address, SigningKey>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, returning the identity it signs for.
    pub fn insert(&mut self, key: SigningKey) -> Address {
        let address = address_of(&key);
        self.keys.insert(address, key);
        address
    }

    /// Add a key derived from a fixed seed (repeatable accounts).
    pub fn insert_seed(&mut self, seed: [u8; 32]) -> Address {
        self.insert(SigningKey::from_bytes(&seed))
    }

    /// Generate and add a fresh key.
    pub fn generate<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Address {
        self.insert(SigningKey::generate(rng))
    }

    pub fn contains(&self, identity: &Address) -> bool {
        self.keys.contains_key(identity)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.keys.keys()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("identities", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl Signer for Keyring {
    async fn sign_digest(
        &self,
        digest: &OrderHash,
        identity: &Address,
        scheme: SignatureScheme,
    ) -> Result<Signature, SignerError> {
        let key = self
            .keys
            .get(identity)
            .ok_or(SignerError::KeyUnavailable { identity: *identity })?;
        Ok(sign_digest_with_key(digest, key, scheme))
    }
}

// ---------------------------------------------------------------------------
// Signing / Verification
// ---------------------------------------------------------------------------

/// Identity of an Ed25519 key: its verifying key bytes.
pub fn address_of(key: &SigningKey) -> Address {
    Address::from_bytes(key.verifying_key().to_bytes())
}

/// The 32 bytes actually fed to Ed25519 under `scheme`.
pub fn signing_message(digest: &OrderHash, scheme: SignatureScheme) -> [u8; 32] {
    match scheme {
        SignatureScheme::Ed25519 => digest.to_bytes(),
        SignatureScheme::Ed25519Prefixed => {
            let mut hasher = Sha256::new();
            hasher.update(PERSONAL_MESSAGE_PREFIX);
            hasher.update(digest.as_bytes());
            hasher.finalize().into()
        }
    }
}

/// Sign an order hash directly with key material.
pub fn sign_digest_with_key(digest: &OrderHash, key: &SigningKey, scheme: SignatureScheme) -> Signature {
    let message = signing_message(digest, scheme);
    let signature = key.sign(&message);
    Signature::new(scheme, signature.to_bytes().to_vec())
}

/// Hash and sign an order with key material.
pub fn sign_order_with_key(
    order: &Order,
    key: &SigningKey,
    scheme: SignatureScheme,
) -> Result<Signature, SigningError> {
    let hash = order.hash()?;
    Ok(sign_digest_with_key(&hash, key, scheme))
}

/// Sign an order for its maker through the external signer.
///
/// The returned signature is checked before the `SignedOrder` is built, so a
/// signer answering with the wrong key is reported rather than passed on.
pub async fn sign_order(
    order: Order,
    signer: &dyn Signer,
    scheme: SignatureScheme,
) -> Result<SignedOrder, SigningError> {
    let hash = order.hash()?;
    let signature = signer.sign_digest(&hash, &order.maker, scheme).await?;
    if !verify_digest_signature(&hash, &signature, &order.maker)? {
        return Err(SigningError::ForeignSignature { identity: order.maker });
    }
    debug!(order_hash = %hash, maker = %order.maker, scheme = ?scheme, "Signed order");
    Ok(SignedOrder::new(order, signature))
}

/// Verify a signature over an order hash.
///
/// `Err(InvalidScheme)` for unrecognised scheme ids. Malformed signature bytes,
/// a claimed identity that is not a valid key, and plain mismatches all give
/// `Ok(false)`.
pub fn verify_digest_signature(
    digest: &OrderHash,
    signature: &Signature,
    claimed_signer: &Address,
) -> Result<bool, SigningError> {
    let scheme = signature
        .scheme()
        .map_err(|scheme_id| SigningError::InvalidScheme { scheme_id })?;

    let Ok(sig_bytes) = <[u8; SIGNATURE_LEN]>::try_from(signature.bytes.as_slice()) else {
        return Ok(false);
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(claimed_signer.as_bytes()) else {
        return Ok(false);
    };
    let ed_signature = Ed25519Signature::from_bytes(&sig_bytes);
    let message = signing_message(digest, scheme);
    Ok(verifying_key.verify(&message, &ed_signature).is_ok())
}

/// Recompute the order hash and verify `signature` against `claimed_signer`.
pub fn verify_order_signature(
    order: &Order,
    signature: &Signature,
    claimed_signer: &Address,
) -> Result<bool, SigningError> {
    let hash = order.hash()?;
    verify_digest_signature(&hash, signature, claimed_signer)
}

/// Verify a signed order against its own maker.
pub fn verify_signed_order(signed: &SignedOrder) -> Result<bool, SigningError> {
    verify_order_signature(&signed.order, &signed.signature, &signed.order.maker)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the external signer capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    #[error("No key available for {identity}")]
    KeyUnavailable { identity: Address },

    #[error("Signing request rejected for {identity}")]
    UserRejected { identity: Address },
}

/// Signing module errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("Unrecognised signature scheme id 0x{scheme_id:02x}")]
    InvalidScheme { scheme_id: u8 },

    #[error("Order encoding failed: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("Signer returned a signature that does not verify for {identity}")]
    ForeignSignature { identity: Address },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use types::asset::AssetData;
    use types::numeric::Amount;

    fn test_keypair() -> SigningKey {
        // Deterministic seed for repeatable test vectors
        let seed: [u8; 32] = [
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
            0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10,
            0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18,
            0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, 0x20,
        ];
        SigningKey::from_bytes(&seed)
    }

    fn sample_order(maker: Address) -> Order {
        Order {
            exchange: Address::from_bytes([0xee; 32]),
            maker,
            taker: None,
            sender: None,
            fee_recipient: None,
            maker_asset: AssetData::erc20(Address::from_bytes([0xa0; 32])),
            taker_asset: AssetData::erc20(Address::from_bytes([0xb0; 32])),
            maker_asset_amount: Amount::from_u64(10),
            taker_asset_amount: Amount::from_u64(4),
            maker_fee: Amount::ZERO,
            taker_fee: Amount::ZERO,
            expiration: 2_000_000_000,
            salt: Amount::from_u64(1),
        }
    }

    #[test]
    fn test_sign_and_verify_both_schemes() {
        let key = test_keypair();
        let maker = address_of(&key);
        let order = sample_order(maker);
        for scheme in [SignatureScheme::Ed25519, SignatureScheme::Ed25519Prefixed] {
            let sig = sign_order_with_key(&order, &key, scheme).unwrap();
            assert_eq!(sig.scheme_id, scheme.id());
            assert_eq!(verify_order_signature(&order, &sig, &maker), Ok(true));
        }
    }

    #[test]
    fn test_schemes_sign_different_messages() {
        let key = test_keypair();
        let order = sample_order(address_of(&key));
        let raw = sign_order_with_key(&order, &key, SignatureScheme::Ed25519).unwrap();
        let prefixed = sign_order_with_key(&order, &key, SignatureScheme::Ed25519Prefixed).unwrap();
        assert_ne!(raw.bytes, prefixed.bytes);

        // Relabelling the scheme breaks verification
        let relabelled = Signature { scheme_id: SignatureScheme::Ed25519Prefixed.id(), ..raw };
        assert_eq!(
            verify_order_signature(&order, &relabelled, &order.maker),
            Ok(false)
        );
    }

    #[test]
    fn test_verify_wrong_signer_fails() {
        let key = test_keypair();
        let order = sample_order(address_of(&key));
        let sig = sign_order_with_key(&order, &key, SignatureScheme::Ed25519).unwrap();
        let other = address_of(&SigningKey::generate(&mut OsRng));
        assert_eq!(verify_order_signature(&order, &sig, &other), Ok(false));
    }

    #[test]
    fn test_verify_tampered_order_fails() {
        let key = test_keypair();
        let order = sample_order(address_of(&key));
        let sig = sign_order_with_key(&order, &key, SignatureScheme::Ed25519).unwrap();
        let mut tampered = order.clone();
        tampered.taker_asset_amount = Amount::from_u64(5);
        assert_eq!(verify_order_signature(&tampered, &sig, &order.maker), Ok(false));
    }

    #[test]
    fn test_malformed_signature_bytes_return_false() {
        let key = test_keypair();
        let order = sample_order(address_of(&key));
        let short = Signature::new(SignatureScheme::Ed25519, vec![0u8; 10]);
        assert_eq!(verify_order_signature(&order, &short, &order.maker), Ok(false));
        let empty = Signature::new(SignatureScheme::Ed25519, Vec::new());
        assert_eq!(verify_order_signature(&order, &empty, &order.maker), Ok(false));
    }

    #[test]
    fn test_unknown_scheme_is_an_error() {
        let key = test_keypair();
        let order = sample_order(address_of(&key));
        let mut sig = sign_order_with_key(&order, &key, SignatureScheme::Ed25519).unwrap();
        sig.scheme_id = 0x7f;
        assert_eq!(
            verify_order_signature(&order, &sig, &order.maker),
            Err(SigningError::InvalidScheme { scheme_id: 0x7f })
        );
    }

    #[test]
    fn test_signature_deterministic_with_fixed_key() {
        let key = test_keypair();
        let order = sample_order(address_of(&key));
        let a = sign_order_with_key(&order, &key, SignatureScheme::Ed25519).unwrap();
        let b = sign_order_with_key(&order, &key, SignatureScheme::Ed25519).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.bytes.len(), 64);
    }

    #[test]
    fn test_unencodable_order_cannot_be_signed() {
        let key = test_keypair();
        let mut order = sample_order(address_of(&key));
        order.maker_asset = AssetData::Custom { proxy_id: [1, 1, 1, 1], data: vec![] };
        assert_eq!(
            sign_order_with_key(&order, &key, SignatureScheme::Ed25519),
            Err(SigningError::Encoding(EncodingError::EmptyAssetData))
        );
    }

    #[tokio::test]
    async fn test_keyring_signs_for_maker() {
        let mut keyring = Keyring::new();
        let maker = keyring.insert(test_keypair());
        let signed = sign_order(sample_order(maker), &keyring, SignatureScheme::Ed25519Prefixed)
            .await
            .unwrap();
        assert_eq!(verify_signed_order(&signed), Ok(true));
    }

    #[tokio::test]
    async fn test_keyring_missing_key() {
        let keyring = Keyring::new();
        let maker = address_of(&test_keypair());
        let err = sign_order(sample_order(maker), &keyring, SignatureScheme::Ed25519)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SigningError::Signer(SignerError::KeyUnavailable { identity: maker })
        );
    }

    struct RejectingSigner;

    #[async_trait]
    impl Signer for RejectingSigner {
        async fn sign_digest(
            &self,
            _digest: &OrderHash,
            identity: &Address,
            _scheme: SignatureScheme,
        ) -> Result<Signature, SignerError> {
            Err(SignerError::UserRejected { identity: *identity })
        }
    }

    #[tokio::test]
    async fn test_user_rejection_propagates() {
        let maker = address_of(&test_keypair());
        let err = sign_order(sample_order(maker), &RejectingSigner, SignatureScheme::Ed25519)
            .await
            .unwrap_err();
        assert!(matches!(err, SigningError::Signer(SignerError::UserRejected { .. })));
    }

    /// Signs with whatever key it holds, regardless of the identity asked for.
    struct WrongKeySigner(SigningKey);

    #[async_trait]
    impl Signer for WrongKeySigner {
        async fn sign_digest(
            &self,
            digest: &OrderHash,
            _identity: &Address,
            scheme: SignatureScheme,
        ) -> Result<Signature, SignerError> {
            Ok(sign_digest_with_key(digest, &self.0, scheme))
        }
    }

    #[tokio::test]
    async fn test_foreign_signature_rejected() {
        let maker = address_of(&test_keypair());
        let signer = WrongKeySigner(SigningKey::generate(&mut OsRng));
        let err = sign_order(sample_order(maker), &signer, SignatureScheme::Ed25519)
            .await
            .unwrap_err();
        assert_eq!(err, SigningError::ForeignSignature { identity: maker });
    }

    #[test]
    fn test_keyring_debug_hides_keys() {
        let mut keyring = Keyring::new();
        keyring.insert(test_keypair());
        let rendered = format!("{:?}", keyring);
        assert!(rendered.contains("identities"));
        assert!(!rendered.contains("SigningKey"));
    }
}
