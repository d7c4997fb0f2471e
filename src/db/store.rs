//! Storage collaborator contract.
//!
//! The trust core never talks to a database directly; each component is
//! constructed with an `Arc<dyn TrustStore>`. Implementations must make
//! [`TrustStore::consume_usable_otp`] a single atomic conditional update so
//! that two concurrent verifications of one code cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::records::{
    AccessTokenRecord, EncryptedPayload, KeyRecord, OtpTokenRecord, PurgeCounts, SignatureRecord,
};
use crate::types::Result;

#[async_trait]
pub trait TrustStore: Send + Sync {
    // --- key pairs -----------------------------------------------------------

    async fn put_key_record(&self, record: KeyRecord) -> Result<()>;

    /// Newest record for `owner_id` by `created_at`.
    async fn latest_public_key(&self, owner_id: &str) -> Result<Option<KeyRecord>>;

    /// All records for `owner_id`, newest first.
    async fn list_public_keys(&self, owner_id: &str) -> Result<Vec<KeyRecord>>;

    // --- one-time passcodes --------------------------------------------------

    async fn put_otp_token(&self, record: OtpTokenRecord) -> Result<()>;

    /// Find an unused, unexpired record matching the digest and flip it to
    /// used in the same step. Returns the record as it was consumed.
    async fn consume_usable_otp(
        &self,
        email: &str,
        document_id: &str,
        code_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpTokenRecord>>;

    /// Mark every outstanding record for the pair as used. Returns how many changed.
    async fn invalidate_outstanding_otps(
        &self,
        email: &str,
        document_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64>;

    // --- access tokens -------------------------------------------------------

    async fn put_access_token(&self, record: AccessTokenRecord) -> Result<()>;

    async fn get_access_token(&self, token_hash: &str) -> Result<Option<AccessTokenRecord>>;

    /// Returns whether a record was removed.
    async fn delete_access_token(&self, token_hash: &str) -> Result<bool>;

    // --- signatures ----------------------------------------------------------

    /// Insert or replace the signature for `record.document_id`.
    async fn put_signature(&self, record: SignatureRecord) -> Result<()>;

    async fn get_signature(&self, document_id: &str) -> Result<Option<SignatureRecord>>;

    // --- sealed payloads -----------------------------------------------------

    /// Insert or replace the payload for `payload.document_id`.
    async fn put_encrypted_payload(&self, payload: EncryptedPayload) -> Result<()>;

    async fn get_encrypted_payload(&self, document_id: &str) -> Result<Option<EncryptedPayload>>;

    // --- housekeeping --------------------------------------------------------

    /// Drop OTP and access-token records whose `expires_at` is before `now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeCounts>;
}
