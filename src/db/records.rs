//! Records the trust core persists through its storage collaborator.
//!
//! These are backend-neutral; the MongoDB schemas in [`super::schemas`]
//! convert to and from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keys::PublicKeyBundle;
use crate::signing::ContentHash;

/// Public half of a generated key pair. The private half is never recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub public_key: PublicKeyBundle,
    pub created_at: DateTime<Utc>,
}

/// A one-time passcode bound to `(email, document_id)`.
///
/// Only a digest of the code is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpTokenRecord {
    pub id: Uuid,
    pub email: String,
    pub document_id: String,
    pub code_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl OtpTokenRecord {
    /// Unused and not past `expires_at`.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now <= self.expires_at
    }
}

/// Bearer access token, keyed by the SHA-256 of the token value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    pub token_hash: String,
    pub document_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Detached signature over a document's canonical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub document_id: String,
    pub content_hash: ContentHash,
    /// Base64 Ed25519 signature over the canonical bytes
    pub signature: String,
    pub signed_by: String,
    pub signed_at: DateTime<Utc>,
}

/// Document sealed to an owner's public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub document_id: String,
    /// Base64 hybrid envelope
    pub ciphertext: String,
    /// Owner whose key the payload was sealed to
    pub encrypted_under: String,
    pub created_at: DateTime<Utc>,
}

/// Rows removed by a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeCounts {
    pub otp_tokens: u64,
    pub access_tokens: u64,
}
