//! Key vault service
//!
//! Generates key pairs, records their public halves and answers
//! active-key lookups.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use super::crypto::{PrivateKeyBundle, PublicKeyBundle};
use crate::db::{KeyRecord, TrustStore};
use crate::time::Clock;
use crate::types::{Result, TrustError};

/// Longest accepted owner identifier
pub const MAX_OWNER_ID_LEN: usize = 256;

/// A freshly generated key pair.
///
/// This is the only value that ever carries the private bundle out of the
/// vault.
#[derive(Debug)]
pub struct KeyPair {
    pub owner_id: String,
    pub public_key: PublicKeyBundle,
    pub private_key: PrivateKeyBundle,
    pub created_at: DateTime<Utc>,
}

/// Service for generating and looking up owner keys.
pub struct KeyVault {
    store: Arc<dyn TrustStore>,
    clock: Arc<dyn Clock>,
}

impl KeyVault {
    pub fn new(store: Arc<dyn TrustStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Generate a key pair for `owner_id` and record its public half.
    ///
    /// The new pair becomes the owner's active key.
    pub async fn generate_key_pair(&self, owner_id: &str) -> Result<KeyPair> {
        validate_owner_id(owner_id)?;

        let private_key = PrivateKeyBundle::generate();
        let public_key = private_key.public_key();
        let created_at = self.clock.now();

        self.store
            .put_key_record(KeyRecord {
                id: Uuid::new_v4(),
                owner_id: owner_id.to_string(),
                public_key,
                created_at,
            })
            .await?;

        info!(
            owner_id,
            fingerprint = %public_key.fingerprint(),
            "Generated key pair"
        );

        Ok(KeyPair {
            owner_id: owner_id.to_string(),
            public_key,
            private_key,
            created_at,
        })
    }

    /// The most recently created public key for `owner_id`.
    pub async fn get_active_public_key(&self, owner_id: &str) -> Result<PublicKeyBundle> {
        let record = self
            .store
            .latest_public_key(owner_id)
            .await?
            .ok_or_else(|| TrustError::NotFound(format!("no key registered for {owner_id}")))?;

        debug!(owner_id, fingerprint = %record.public_key.fingerprint(), "Active key lookup");
        Ok(record.public_key)
    }

    /// Every public key recorded for `owner_id`, newest first.
    pub async fn list_public_keys(&self, owner_id: &str) -> Result<Vec<PublicKeyBundle>> {
        Ok(self
            .store
            .list_public_keys(owner_id)
            .await?
            .into_iter()
            .map(|record| record.public_key)
            .collect())
    }
}

fn validate_owner_id(owner_id: &str) -> Result<()> {
    if owner_id.trim().is_empty() {
        return Err(TrustError::InvalidInput("owner id must not be empty".into()));
    }
    if owner_id.len() > MAX_OWNER_ID_LEN {
        return Err(TrustError::InvalidInput(format!(
            "owner id exceeds {MAX_OWNER_ID_LEN} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::time::ManualClock;
    use chrono::Duration;

    fn vault() -> (KeyVault, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        (KeyVault::new(Arc::new(MemoryStore::new()), clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_generated_pair_becomes_active() {
        let (vault, _) = vault();
        let pair = vault.generate_key_pair("issuer-1").await.unwrap();

        assert_eq!(pair.private_key.public_key(), pair.public_key);
        assert_eq!(
            vault.get_active_public_key("issuer-1").await.unwrap(),
            pair.public_key
        );
    }

    #[tokio::test]
    async fn test_newest_pair_wins() {
        let (vault, clock) = vault();
        let first = vault.generate_key_pair("issuer-1").await.unwrap();
        clock.advance(Duration::seconds(5));
        let second = vault.generate_key_pair("issuer-1").await.unwrap();

        assert_eq!(
            vault.get_active_public_key("issuer-1").await.unwrap(),
            second.public_key
        );
        assert_eq!(
            vault.list_public_keys("issuer-1").await.unwrap(),
            vec![second.public_key, first.public_key]
        );
    }

    #[tokio::test]
    async fn test_unknown_owner_is_not_found() {
        let (vault, _) = vault();
        let err = vault.get_active_public_key("ghost").await.unwrap_err();
        assert!(matches!(err, TrustError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_blank_owner() {
        let (vault, _) = vault();
        let err = vault.generate_key_pair("  ").await.unwrap_err();
        assert!(matches!(err, TrustError::InvalidInput(_)));
    }
}
