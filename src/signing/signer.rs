//! Document signer service
//!
//! Signs canonical content bytes with an issuer's Ed25519 key. The content
//! hash is a fingerprint for fast comparison and for verification links;
//! verification always recomputes the canonical bytes and never trusts a
//! stored hash.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signature, Signer, Verifier};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use super::canonical::{canonicalize, ContentHash};
use crate::db::{SignatureRecord, TrustStore};
use crate::keys::{KeyVault, PrivateKeyBundle, PublicKeyBundle};
use crate::time::Clock;
use crate::types::{Result, TrustError};

/// Raw Ed25519 signature length
pub const SIGNATURE_LEN: usize = 64;

/// Output of [`DocumentSigner::sign`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedContent {
    pub content_hash: ContentHash,
    /// Base64 Ed25519 signature over the canonical bytes
    pub signature: String,
}

/// Outcome of checking a stored signature against presented content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVerification {
    pub document_id: String,
    pub signed_by: String,
    /// Hash of the content as presented
    pub content_hash: ContentHash,
    /// Whether the presented content hashes to the recorded fingerprint
    pub hash_matches_record: bool,
    /// Whether the signature verifies under one of the issuer's keys
    pub valid: bool,
}

fn decode_signature(signature: &str) -> Result<Signature> {
    let bytes = BASE64
        .decode(signature.trim())
        .map_err(|_| TrustError::InvalidSignatureFormat("signature is not valid base64".into()))?;

    let raw: [u8; SIGNATURE_LEN] = bytes.as_slice().try_into().map_err(|_| {
        TrustError::InvalidSignatureFormat(format!(
            "signature must be {} bytes, got {}",
            SIGNATURE_LEN,
            bytes.len()
        ))
    })?;

    Ok(Signature::from_bytes(&raw))
}

/// Produces and checks detached document signatures.
pub struct DocumentSigner {
    store: Arc<dyn TrustStore>,
    vault: Arc<KeyVault>,
    clock: Arc<dyn Clock>,
}

impl DocumentSigner {
    pub fn new(store: Arc<dyn TrustStore>, vault: Arc<KeyVault>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            vault,
            clock,
        }
    }

    /// Sign the canonical form of `content`.
    pub fn sign(&self, content: &JsonValue, issuer_key: &PrivateKeyBundle) -> Result<SignedContent> {
        let canonical = canonicalize(content)?;
        let signature = issuer_key.signing_key().sign(&canonical);

        Ok(SignedContent {
            content_hash: ContentHash::of_canonical(&canonical),
            signature: BASE64.encode(signature.to_bytes()),
        })
    }

    /// Check `signature` over the canonical form of `content`.
    ///
    /// A mismatch is `Ok(false)`; only malformed material is an error.
    pub fn verify(
        &self,
        content: &JsonValue,
        signature: &str,
        issuer_key: &PublicKeyBundle,
    ) -> Result<bool> {
        let signature = decode_signature(signature)?;
        let canonical = canonicalize(content)?;
        Ok(issuer_key
            .verifying_key()
            .verify(&canonical, &signature)
            .is_ok())
    }

    /// [`Self::verify`] with the issuer key in its base64 transport form.
    pub fn verify_encoded(
        &self,
        content: &JsonValue,
        signature: &str,
        issuer_key: &str,
    ) -> Result<bool> {
        let issuer_key = PublicKeyBundle::from_base64(issuer_key)?;
        self.verify(content, signature, &issuer_key)
    }

    /// Sign `content` as `issuer_id` and record the signature for `document_id`.
    ///
    /// The key must belong to the issuer: its public half has to be one of
    /// the issuer's recorded keys.
    pub async fn sign_document(
        &self,
        document_id: &str,
        issuer_id: &str,
        content: &JsonValue,
        issuer_key: &PrivateKeyBundle,
    ) -> Result<SignatureRecord> {
        if document_id.trim().is_empty() {
            return Err(TrustError::InvalidInput("document id must not be empty".into()));
        }

        let public = issuer_key.public_key();
        let registered = self.vault.list_public_keys(issuer_id).await?;
        if !registered.contains(&public) {
            warn!(issuer_id, fingerprint = %public.fingerprint(), "Signing key not registered to issuer");
            return Err(TrustError::InvalidInput(
                "signing key is not registered to this issuer".into(),
            ));
        }

        let signed = self.sign(content, issuer_key)?;
        let record = SignatureRecord {
            document_id: document_id.to_string(),
            content_hash: signed.content_hash,
            signature: signed.signature,
            signed_by: issuer_id.to_string(),
            signed_at: self.clock.now(),
        };
        self.store.put_signature(record.clone()).await?;

        info!(
            document_id,
            issuer_id,
            content_hash = %record.content_hash,
            "Signed document"
        );
        Ok(record)
    }

    /// The stored signature record for `document_id`.
    pub async fn get_signature(&self, document_id: &str) -> Result<SignatureRecord> {
        self.store
            .get_signature(document_id)
            .await?
            .ok_or_else(|| TrustError::NotFound(format!("no signature for {document_id}")))
    }

    /// Check presented `content` against the signature stored for `document_id`.
    ///
    /// Tries each of the issuer's keys, newest first, so documents signed
    /// before a key rotation still verify.
    pub async fn verify_document(
        &self,
        document_id: &str,
        content: &JsonValue,
    ) -> Result<DocumentVerification> {
        let record = self.get_signature(document_id).await?;
        let signature = decode_signature(&record.signature)?;

        let canonical = canonicalize(content)?;
        let content_hash = ContentHash::of_canonical(&canonical);

        let keys = self.vault.list_public_keys(&record.signed_by).await?;
        let valid = keys
            .iter()
            .any(|key| key.verifying_key().verify(&canonical, &signature).is_ok());

        debug!(
            document_id,
            signed_by = %record.signed_by,
            keys_tried = keys.len(),
            valid,
            "Verified stored signature"
        );

        Ok(DocumentVerification {
            document_id: document_id.to_string(),
            signed_by: record.signed_by,
            hash_matches_record: content_hash == record.content_hash,
            content_hash,
            valid,
        })
    }
}
