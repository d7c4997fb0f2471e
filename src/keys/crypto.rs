//! Key material for document owners and issuers.
//!
//! # Algorithms
//!
//! - **Signing**: Ed25519 (detached document signatures)
//! - **Encryption**: X25519 (recipient key for sealed documents)
//!
//! Both halves are generated together and travel as one bundle so a single
//! owner identity can both receive sealed documents and sign them.
//!
//! # Wire format
//!
//! - Public bundle: `ed25519_public (32) || x25519_public (32)`, base64
//! - Private bundle: `ed25519_seed (32) || x25519_secret (32)`, base64

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::types::{Result, TrustError};

// =============================================================================
// Constants
// =============================================================================

/// Length of each individual key half (Ed25519 and X25519 alike)
pub const KEY_HALF_LEN: usize = 32;

/// Encoded public bundle length (signing + encryption)
pub const PUBLIC_BUNDLE_LEN: usize = KEY_HALF_LEN * 2;

/// Encoded private bundle length (signing seed + encryption secret)
pub const PRIVATE_BUNDLE_LEN: usize = KEY_HALF_LEN * 2;

// =============================================================================
// Public Key Bundle
// =============================================================================

/// Public half of an owner's key pair.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKeyBundle {
    signing: VerifyingKey,
    encryption: X25519PublicKey,
}

impl PublicKeyBundle {
    /// Parse a bundle from its 64 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_BUNDLE_LEN {
            return Err(TrustError::InvalidKeyFormat(format!(
                "public key must be {} bytes, got {}",
                PUBLIC_BUNDLE_LEN,
                bytes.len()
            )));
        }

        let mut signing = [0u8; KEY_HALF_LEN];
        signing.copy_from_slice(&bytes[..KEY_HALF_LEN]);
        let mut encryption = [0u8; KEY_HALF_LEN];
        encryption.copy_from_slice(&bytes[KEY_HALF_LEN..]);

        let signing = VerifyingKey::from_bytes(&signing).map_err(|_| {
            TrustError::InvalidKeyFormat("signing half is not a valid Ed25519 point".into())
        })?;

        Ok(Self {
            signing,
            encryption: X25519PublicKey::from(encryption),
        })
    }

    /// Parse a base64-encoded bundle.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|_| TrustError::InvalidKeyFormat("public key is not valid base64".into()))?;
        Self::from_bytes(&bytes)
    }

    /// Raw 64-byte form.
    pub fn to_bytes(&self) -> [u8; PUBLIC_BUNDLE_LEN] {
        let mut out = [0u8; PUBLIC_BUNDLE_LEN];
        out[..KEY_HALF_LEN].copy_from_slice(self.signing.as_bytes());
        out[KEY_HALF_LEN..].copy_from_slice(self.encryption.as_bytes());
        out
    }

    /// Base64 form used in records and API payloads.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// Ed25519 key that verifies this owner's signatures.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.signing
    }

    /// X25519 key that documents are sealed to.
    pub fn encryption_key(&self) -> &X25519PublicKey {
        &self.encryption
    }

    /// Short non-secret identifier for logs (first 8 bytes of SHA-256, hex).
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.to_bytes());
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for PublicKeyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKeyBundle({})", self.fingerprint())
    }
}

impl TryFrom<String> for PublicKeyBundle {
    type Error = TrustError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_base64(&value)
    }
}

impl From<PublicKeyBundle> for String {
    fn from(bundle: PublicKeyBundle) -> Self {
        bundle.to_base64()
    }
}

// =============================================================================
// Private Key Bundle
// =============================================================================

/// Private half of an owner's key pair.
///
/// Zeroized on drop. Not serializable and never persisted server-side.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKeyBundle {
    signing_seed: [u8; KEY_HALF_LEN],
    encryption_secret: [u8; KEY_HALF_LEN],
}

impl PrivateKeyBundle {
    /// Generate fresh key material from the OS random number generator.
    pub fn generate() -> Self {
        let signing = SigningKey::generate(&mut OsRng);
        let encryption = StaticSecret::random_from_rng(OsRng);
        Self {
            signing_seed: signing.to_bytes(),
            encryption_secret: encryption.to_bytes(),
        }
    }

    /// Parse a bundle from its 64 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PRIVATE_BUNDLE_LEN {
            return Err(TrustError::InvalidKeyFormat(format!(
                "private key must be {} bytes, got {}",
                PRIVATE_BUNDLE_LEN,
                bytes.len()
            )));
        }

        let mut bundle = Self {
            signing_seed: [0u8; KEY_HALF_LEN],
            encryption_secret: [0u8; KEY_HALF_LEN],
        };
        bundle.signing_seed.copy_from_slice(&bytes[..KEY_HALF_LEN]);
        bundle
            .encryption_secret
            .copy_from_slice(&bytes[KEY_HALF_LEN..]);
        Ok(bundle)
    }

    /// Parse a base64-encoded bundle.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = Zeroizing::new(
            BASE64
                .decode(encoded.trim())
                .map_err(|_| TrustError::InvalidKeyFormat("private key is not valid base64".into()))?,
        );
        Self::from_bytes(&bytes)
    }

    /// Base64 form handed to the owner exactly once.
    ///
    /// # Security
    ///
    /// The returned string holds the secret; it is zeroized when dropped.
    pub fn to_base64(&self) -> Zeroizing<String> {
        let mut raw = Zeroizing::new([0u8; PRIVATE_BUNDLE_LEN]);
        raw[..KEY_HALF_LEN].copy_from_slice(&self.signing_seed);
        raw[KEY_HALF_LEN..].copy_from_slice(&self.encryption_secret);
        Zeroizing::new(BASE64.encode(raw.as_slice()))
    }

    /// Ed25519 signing key.
    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.signing_seed)
    }

    /// X25519 static secret used to open sealed documents.
    pub fn encryption_secret(&self) -> StaticSecret {
        StaticSecret::from(self.encryption_secret)
    }

    /// Derive the matching public bundle.
    pub fn public_key(&self) -> PublicKeyBundle {
        let secret = self.encryption_secret();
        PublicKeyBundle {
            signing: self.signing_key().verifying_key(),
            encryption: X25519PublicKey::from(&secret),
        }
    }
}

impl fmt::Debug for PrivateKeyBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKeyBundle([REDACTED])")
    }
}

// =============================================================================
// Randomness
// =============================================================================

/// Generate cryptographically secure random bytes.
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_bundle_halves_match() {
        let private = PrivateKeyBundle::generate();
        let public = private.public_key();

        assert_eq!(&private.signing_key().verifying_key(), public.verifying_key());
        assert_eq!(
            &X25519PublicKey::from(&private.encryption_secret()),
            public.encryption_key()
        );
    }

    #[test]
    fn test_public_bundle_base64_roundtrip() {
        let public = PrivateKeyBundle::generate().public_key();
        let decoded = PublicKeyBundle::from_base64(&public.to_base64()).unwrap();
        assert_eq!(decoded, public);
    }

    #[test]
    fn test_private_bundle_reloads_to_same_public_key() {
        let private = PrivateKeyBundle::generate();
        let encoded = private.to_base64();
        let reloaded = PrivateKeyBundle::from_base64(&encoded).unwrap();
        assert_eq!(reloaded.public_key(), private.public_key());
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = PublicKeyBundle::from_bytes(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, TrustError::InvalidKeyFormat(_)));

        let err = PrivateKeyBundle::from_bytes(&[0u8; 63]).unwrap_err();
        assert!(matches!(err, TrustError::InvalidKeyFormat(_)));
    }

    #[test]
    fn test_rejects_bad_base64() {
        let err = PublicKeyBundle::from_base64("not base64!!").unwrap_err();
        assert!(matches!(err, TrustError::InvalidKeyFormat(_)));
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let private = PrivateKeyBundle::generate();
        assert_eq!(format!("{:?}", private), "PrivateKeyBundle([REDACTED])");
    }

    #[test]
    fn test_serde_uses_base64_string() {
        let public = PrivateKeyBundle::generate().public_key();
        let json = serde_json::to_string(&public).unwrap();
        assert_eq!(json, format!("\"{}\"", public.to_base64()));

        let back: PublicKeyBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, public);
    }

    #[test]
    fn test_random_bytes() {
        let a: [u8; 16] = generate_random_bytes();
        let b: [u8; 16] = generate_random_bytes();
        assert_ne!(a, b);
    }
}
