//! Hybrid sealing of document payloads.
//!
//! # Construction
//!
//! - Fresh X25519 ephemeral key per payload
//! - Content key = HKDF-SHA256 over the X25519 shared secret, salted with
//!   both public keys
//! - Payload encrypted with ChaCha20-Poly1305; the envelope header is bound
//!   as associated data
//!
//! # Layout
//!
//! ```text
//! version (1) || ephemeral_public (32) || nonce (12) || ciphertext + tag
//! ```
//!
//! The whole envelope is transported as standard base64.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::{
    aead::{Aead, Payload},
    ChaCha20Poly1305, Key, KeyInit, Nonce,
};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey};
use zeroize::Zeroizing;

use crate::keys::{generate_random_bytes, PrivateKeyBundle, PublicKeyBundle};
use crate::types::{Result, TrustError};

// =============================================================================
// Constants
// =============================================================================

/// Current envelope version byte
pub const ENVELOPE_VERSION: u8 = 0x01;

/// Nonce length for ChaCha20-Poly1305 (12 bytes)
pub const NONCE_LEN: usize = 12;

/// ChaCha20-Poly1305 auth tag length (16 bytes)
pub const AUTH_TAG_LEN: usize = 16;

/// X25519 public key length
pub const EPHEMERAL_KEY_LEN: usize = 32;

/// Bytes preceding the AEAD ciphertext
pub const HEADER_LEN: usize = 1 + EPHEMERAL_KEY_LEN;

/// Smallest well-formed envelope (empty payload)
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + NONCE_LEN + AUTH_TAG_LEN;

/// HKDF info label
const KDF_INFO: &[u8] = b"notary/document-cipher/v1";

// =============================================================================
// Key Derivation
// =============================================================================

fn derive_content_key(
    shared_secret: &[u8; 32],
    ephemeral_public: &[u8; EPHEMERAL_KEY_LEN],
    recipient_public: &[u8; 32],
) -> Result<Zeroizing<[u8; 32]>> {
    let mut salt = [0u8; EPHEMERAL_KEY_LEN + 32];
    salt[..EPHEMERAL_KEY_LEN].copy_from_slice(ephemeral_public);
    salt[EPHEMERAL_KEY_LEN..].copy_from_slice(recipient_public);

    let hkdf = Hkdf::<Sha256>::new(Some(&salt), shared_secret);
    let mut key = Zeroizing::new([0u8; 32]);
    hkdf.expand(KDF_INFO, key.as_mut_slice())
        .map_err(|_| TrustError::Internal("HKDF output length rejected".into()))?;
    Ok(key)
}

// =============================================================================
// Seal / Open
// =============================================================================

/// Seal `payload` to `recipient`, enforcing `max_payload_bytes`.
///
/// Oversized payloads are rejected, never truncated.
pub fn seal(payload: &[u8], recipient: &PublicKeyBundle, max_payload_bytes: usize) -> Result<String> {
    if payload.len() > max_payload_bytes {
        return Err(TrustError::PayloadTooLarge {
            size: payload.len(),
            max: max_payload_bytes,
        });
    }

    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral);
    let recipient_public = recipient.encryption_key();
    let shared = ephemeral.diffie_hellman(recipient_public);

    let content_key = derive_content_key(
        shared.as_bytes(),
        ephemeral_public.as_bytes(),
        recipient_public.as_bytes(),
    )?;

    let mut header = [0u8; HEADER_LEN];
    header[0] = ENVELOPE_VERSION;
    header[1..].copy_from_slice(ephemeral_public.as_bytes());

    let nonce: [u8; NONCE_LEN] = generate_random_bytes();
    let cipher = ChaCha20Poly1305::new(Key::from_slice(content_key.as_slice()));
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: payload,
                aad: &header,
            },
        )
        .map_err(|e| TrustError::Internal(format!("Encryption failed: {e}")))?;

    let mut envelope = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
    envelope.extend_from_slice(&header);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(envelope))
}

/// Open an envelope produced by [`seal`].
///
/// Every failure mode returns [`TrustError::DecryptionFailed`].
pub fn open(envelope: &str, recipient: &PrivateKeyBundle) -> Result<Vec<u8>> {
    let bytes = BASE64
        .decode(envelope.trim())
        .map_err(|_| TrustError::DecryptionFailed)?;

    if bytes.len() < MIN_ENVELOPE_LEN || bytes[0] != ENVELOPE_VERSION {
        return Err(TrustError::DecryptionFailed);
    }

    let (header, rest) = bytes.split_at(HEADER_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let mut ephemeral_public = [0u8; EPHEMERAL_KEY_LEN];
    ephemeral_public.copy_from_slice(&header[1..]);

    let secret = recipient.encryption_secret();
    let recipient_public = X25519PublicKey::from(&secret);
    let shared = secret.diffie_hellman(&X25519PublicKey::from(ephemeral_public));

    let content_key = derive_content_key(
        shared.as_bytes(),
        &ephemeral_public,
        recipient_public.as_bytes(),
    )
    .map_err(|_| TrustError::DecryptionFailed)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(content_key.as_slice()));
    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| TrustError::DecryptionFailed)
}

// =============================================================================
// Tests
// =============================================================================
