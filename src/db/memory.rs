//! In-process [`TrustStore`] for tests, development mode and single-node use.
//!
//! OTP records are grouped per `(email, document_id)` so the consume step
//! runs entirely under that entry's write lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use super::records::{
    AccessTokenRecord, EncryptedPayload, KeyRecord, OtpTokenRecord, PurgeCounts, SignatureRecord,
};
use super::store::TrustStore;
use crate::types::Result;

type OtpKey = (String, String);

/// `dashmap`-backed store.
#[derive(Default)]
pub struct MemoryStore {
    keys: DashMap<String, Vec<KeyRecord>>,
    otps: DashMap<OtpKey, Vec<OtpTokenRecord>>,
    access_tokens: DashMap<String, AccessTokenRecord>,
    signatures: DashMap<String, SignatureRecord>,
    payloads: DashMap<String, EncryptedPayload>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn otp_key(email: &str, document_id: &str) -> OtpKey {
        (email.to_string(), document_id.to_string())
    }

    /// Number of OTP records held for a pair, used and unused.
    pub fn otp_count(&self, email: &str, document_id: &str) -> usize {
        self.otps
            .get(&Self::otp_key(email, document_id))
            .map(|entry| entry.len())
            .unwrap_or(0)
    }

    /// Number of live access-token records.
    pub fn access_token_count(&self) -> usize {
        self.access_tokens.len()
    }
}

#[async_trait]
impl TrustStore for MemoryStore {
    async fn put_key_record(&self, record: KeyRecord) -> Result<()> {
        self.keys
            .entry(record.owner_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn latest_public_key(&self, owner_id: &str) -> Result<Option<KeyRecord>> {
        // max_by_key keeps the last maximum, so equal timestamps resolve to the latest insert
        Ok(self.keys.get(owner_id).and_then(|records| {
            records
                .iter()
                .max_by_key(|record| record.created_at)
                .cloned()
        }))
    }

    async fn list_public_keys(&self, owner_id: &str) -> Result<Vec<KeyRecord>> {
        let mut records = self
            .keys
            .get(owner_id)
            .map(|records| records.value().clone())
            .unwrap_or_default();
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn put_otp_token(&self, record: OtpTokenRecord) -> Result<()> {
        self.otps
            .entry(Self::otp_key(&record.email, &record.document_id))
            .or_default()
            .push(record);
        Ok(())
    }

    async fn consume_usable_otp(
        &self,
        email: &str,
        document_id: &str,
        code_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpTokenRecord>> {
        let Some(mut records) = self.otps.get_mut(&Self::otp_key(email, document_id)) else {
            return Ok(None);
        };

        let consumed = records
            .iter_mut()
            .find(|record| record.code_digest == code_digest && record.is_usable(now))
            .map(|record| {
                let before = record.clone();
                record.used = true;
                before
            });

        Ok(consumed)
    }

    async fn invalidate_outstanding_otps(
        &self,
        email: &str,
        document_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let Some(mut records) = self.otps.get_mut(&Self::otp_key(email, document_id)) else {
            return Ok(0);
        };

        let mut changed = 0;
        for record in records.iter_mut().filter(|record| record.is_usable(now)) {
            record.used = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn put_access_token(&self, record: AccessTokenRecord) -> Result<()> {
        self.access_tokens.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn get_access_token(&self, token_hash: &str) -> Result<Option<AccessTokenRecord>> {
        Ok(self
            .access_tokens
            .get(token_hash)
            .map(|record| record.value().clone()))
    }

    async fn delete_access_token(&self, token_hash: &str) -> Result<bool> {
        Ok(self.access_tokens.remove(token_hash).is_some())
    }

    async fn put_signature(&self, record: SignatureRecord) -> Result<()> {
        self.signatures.insert(record.document_id.clone(), record);
        Ok(())
    }

    async fn get_signature(&self, document_id: &str) -> Result<Option<SignatureRecord>> {
        Ok(self.signatures.get(document_id).map(|record| record.value().clone()))
    }

    async fn put_encrypted_payload(&self, payload: EncryptedPayload) -> Result<()> {
        self.payloads.insert(payload.document_id.clone(), payload);
        Ok(())
    }

    async fn get_encrypted_payload(&self, document_id: &str) -> Result<Option<EncryptedPayload>> {
        Ok(self.payloads.get(document_id).map(|payload| payload.value().clone()))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeCounts> {
        let mut counts = PurgeCounts::default();

        for mut entry in self.otps.iter_mut() {
            let before = entry.len();
            entry.retain(|record| record.expires_at >= now);
            counts.otp_tokens += (before - entry.len()) as u64;
        }
        self.otps.retain(|_, records| !records.is_empty());

        let before = self.access_tokens.len();
        self.access_tokens.retain(|_, record| !record.is_expired(now));
        counts.access_tokens = (before - self.access_tokens.len()) as u64;

        debug!(
            otp_tokens = counts.otp_tokens,
            access_tokens = counts.access_tokens,
            "Purged expired records from memory store"
        );

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::PrivateKeyBundle;
    use chrono::Duration;
    use uuid::Uuid;

    fn otp(email: &str, doc: &str, digest: &str, expires_at: DateTime<Utc>) -> OtpTokenRecord {
        OtpTokenRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            document_id: doc.to_string(),
            code_digest: digest.to_string(),
            created_at: Utc::now(),
            expires_at,
            used: false,
        }
    }

    #[tokio::test]
    async fn test_latest_public_key_prefers_newest() {
        let store = MemoryStore::new();
        let now = Utc::now();

        let older = KeyRecord {
            id: Uuid::new_v4(),
            owner_id: "issuer-1".into(),
            public_key: PrivateKeyBundle::generate().public_key(),
            created_at: now - Duration::days(1),
        };
        let newer = KeyRecord {
            id: Uuid::new_v4(),
            owner_id: "issuer-1".into(),
            public_key: PrivateKeyBundle::generate().public_key(),
            created_at: now,
        };

        // Insert newest first to prove ordering is by timestamp, not insertion
        store.put_key_record(newer.clone()).await.unwrap();
        store.put_key_record(older.clone()).await.unwrap();

        let latest = store.latest_public_key("issuer-1").await.unwrap().unwrap();
        assert_eq!(latest.id, newer.id);

        let all = store.list_public_keys("issuer-1").await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        assert!(store.latest_public_key("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_consume_flips_used_once() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .put_otp_token(otp("a@b.io", "doc-1", "d1", now + Duration::minutes(10)))
            .await
            .unwrap();

        let first = store.consume_usable_otp("a@b.io", "doc-1", "d1", now).await.unwrap();
        assert!(first.is_some());
        assert!(!first.unwrap().used);

        let second = store.consume_usable_otp("a@b.io", "doc-1", "d1", now).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_consume_ignores_expired_and_other_pairs() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .put_otp_token(otp("a@b.io", "doc-1", "d1", now - Duration::seconds(1)))
            .await
            .unwrap();

        assert!(store
            .consume_usable_otp("a@b.io", "doc-1", "d1", now)
            .await
            .unwrap()
            .is_none());
        assert!(store
            .consume_usable_otp("a@b.io", "doc-2", "d1", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_invalidate_outstanding() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for digest in ["d1", "d2"] {
            store
                .put_otp_token(otp("a@b.io", "doc-1", digest, now + Duration::minutes(10)))
                .await
                .unwrap();
        }

        let changed = store
            .invalidate_outstanding_otps("a@b.io", "doc-1", now)
            .await
            .unwrap();
        assert_eq!(changed, 2);
        assert!(store
            .consume_usable_otp("a@b.io", "doc-1", "d2", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .put_otp_token(otp("a@b.io", "doc-1", "old", now - Duration::minutes(1)))
            .await
            .unwrap();
        store
            .put_otp_token(otp("a@b.io", "doc-1", "new", now + Duration::minutes(1)))
            .await
            .unwrap();
        store
            .put_access_token(AccessTokenRecord {
                token_hash: "h".into(),
                document_id: "doc-1".into(),
                email: "a@b.io".into(),
                created_at: now - Duration::days(2),
                expires_at: now - Duration::days(1),
            })
            .await
            .unwrap();

        let counts = store.purge_expired(now).await.unwrap();
        assert_eq!(
            counts,
            PurgeCounts {
                otp_tokens: 1,
                access_tokens: 1
            }
        );
        assert_eq!(store.otp_count("a@b.io", "doc-1"), 1);
        assert_eq!(store.access_token_count(), 0);
    }
}
