//! Document cipher service

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::envelope::{open, seal};
use crate::db::{EncryptedPayload, TrustStore};
use crate::keys::{KeyVault, PrivateKeyBundle, PublicKeyBundle};
use crate::time::Clock;
use crate::types::{Result, TrustError};

/// Default payload ceiling (25 MB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Seals payloads to owners and opens them with caller-supplied keys.
pub struct DocumentCipher {
    store: Arc<dyn TrustStore>,
    vault: Arc<KeyVault>,
    clock: Arc<dyn Clock>,
    max_payload_bytes: usize,
}

impl DocumentCipher {
    pub fn new(
        store: Arc<dyn TrustStore>,
        vault: Arc<KeyVault>,
        clock: Arc<dyn Clock>,
        max_payload_bytes: usize,
    ) -> Self {
        Self {
            store,
            vault,
            clock,
            max_payload_bytes,
        }
    }

    /// Largest payload [`Self::encrypt`] accepts.
    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Seal `payload` to `recipient`. Returns the base64 envelope.
    pub fn encrypt(&self, payload: &[u8], recipient: &PublicKeyBundle) -> Result<String> {
        seal(payload, recipient, self.max_payload_bytes)
    }

    /// Open a base64 envelope with the recipient's private key.
    pub fn decrypt(&self, ciphertext: &str, private_key: &PrivateKeyBundle) -> Result<Vec<u8>> {
        open(ciphertext, private_key)
    }

    /// Seal `payload` to `owner_id`'s active key and store it under `document_id`.
    pub async fn seal_document(
        &self,
        document_id: &str,
        owner_id: &str,
        payload: &[u8],
    ) -> Result<EncryptedPayload> {
        if document_id.trim().is_empty() {
            return Err(TrustError::InvalidInput("document id must not be empty".into()));
        }

        let recipient = self.vault.get_active_public_key(owner_id).await?;
        let ciphertext = self.encrypt(payload, &recipient)?;

        let record = EncryptedPayload {
            document_id: document_id.to_string(),
            ciphertext,
            encrypted_under: owner_id.to_string(),
            created_at: self.clock.now(),
        };
        self.store.put_encrypted_payload(record.clone()).await?;

        info!(
            document_id,
            owner_id,
            fingerprint = %recipient.fingerprint(),
            bytes = payload.len(),
            "Sealed document"
        );
        Ok(record)
    }

    /// Load the payload stored for `document_id` and open it.
    pub async fn open_document(
        &self,
        document_id: &str,
        private_key: &PrivateKeyBundle,
    ) -> Result<Vec<u8>> {
        let record = self
            .store
            .get_encrypted_payload(document_id)
            .await?
            .ok_or_else(|| TrustError::NotFound(format!("no sealed payload for {document_id}")))?;

        debug!(document_id, owner_id = %record.encrypted_under, "Opening sealed document");

        self.decrypt(&record.ciphertext, private_key).inspect_err(|_| {
            warn!(document_id, "Sealed document could not be opened");
        })
    }
}
