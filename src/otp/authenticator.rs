//! OTP issuance and verification

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::code::{code_digest, generate_code, is_well_formed_code, normalize_email};
use super::OtpPolicy;
use crate::access::{AccessToken, AccessTokenLedger};
use crate::db::{OtpTokenRecord, TrustStore};
use crate::logging::mask_email;
use crate::notify::{OtpDelivery, OtpNotifier};
use crate::time::Clock;
use crate::types::{Result, TrustError};

/// Default code lifetime (10 minutes)
pub const DEFAULT_OTP_TTL_SECS: i64 = 10 * 60;

/// Longest accepted document identifier
pub const MAX_DOCUMENT_ID_LEN: usize = 256;

/// Acknowledgement of a code request. Never carries the code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpIssued {
    pub expires_at: DateTime<Utc>,
}

/// Issues passcodes and exchanges them for access tokens.
pub struct OtpAuthenticator {
    store: Arc<dyn TrustStore>,
    ledger: Arc<AccessTokenLedger>,
    notifier: Arc<dyn OtpNotifier>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    policy: OtpPolicy,
}

impl OtpAuthenticator {
    pub fn new(
        store: Arc<dyn TrustStore>,
        ledger: Arc<AccessTokenLedger>,
        notifier: Arc<dyn OtpNotifier>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
        policy: OtpPolicy,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
            clock,
            ttl,
            policy,
        }
    }

    pub fn policy(&self) -> OtpPolicy {
        self.policy
    }

    /// Issue a code for `(email, document_id)` and hand it to the notifier.
    pub async fn request_code(&self, email: &str, document_id: &str) -> Result<OtpIssued> {
        let email = normalize_email(email)?;
        validate_document_id(document_id)?;

        let now = self.clock.now();
        if self.policy == OtpPolicy::LatestOnly {
            let invalidated = self
                .store
                .invalidate_outstanding_otps(&email, document_id, now)
                .await?;
            if invalidated > 0 {
                debug!(
                    recipient = %mask_email(&email),
                    document_id,
                    invalidated,
                    "Invalidated earlier outstanding codes"
                );
            }
        }

        let code = generate_code();
        let expires_at = now + self.ttl;

        self.store
            .put_otp_token(OtpTokenRecord {
                id: Uuid::new_v4(),
                email: email.clone(),
                document_id: document_id.to_string(),
                code_digest: code_digest(&email, document_id, &code),
                created_at: now,
                expires_at,
                used: false,
            })
            .await?;

        self.notifier
            .deliver(OtpDelivery {
                email: email.clone(),
                document_id: document_id.to_string(),
                code,
                expires_at,
            })
            .await
            .map_err(|e| {
                warn!(recipient = %mask_email(&email), document_id, error = %e, "OTP delivery failed");
                match e {
                    TrustError::Unavailable(_) => e,
                    other => TrustError::Unavailable(format!("OTP delivery failed: {other}")),
                }
            })?;

        info!(
            recipient = %mask_email(&email),
            document_id,
            %expires_at,
            "Issued one-time code"
        );

        Ok(OtpIssued { expires_at })
    }

    /// Consume a presented code and mint an access token.
    ///
    /// The consume step is a single conditional update in the store, so two
    /// concurrent calls with the same code cannot both succeed.
    pub async fn verify_code(
        &self,
        email: &str,
        document_id: &str,
        code: &str,
    ) -> Result<AccessToken> {
        let email = normalize_email(email)?;
        validate_document_id(document_id)?;

        let code = code.trim();
        if !is_well_formed_code(code) {
            warn!(recipient = %mask_email(&email), document_id, "Rejected malformed code");
            return Err(TrustError::InvalidOrExpiredCode);
        }

        let digest = code_digest(&email, document_id, code);
        let consumed = self
            .store
            .consume_usable_otp(&email, document_id, &digest, self.clock.now())
            .await?;

        let Some(record) = consumed else {
            warn!(recipient = %mask_email(&email), document_id, "Rejected one-time code");
            return Err(TrustError::InvalidOrExpiredCode);
        };

        debug!(otp_id = %record.id, document_id, "Consumed one-time code");

        let token = self.ledger.issue(document_id, &email).await?;
        info!(
            recipient = %mask_email(&email),
            document_id,
            "Verified one-time code"
        );
        Ok(token)
    }
}

fn validate_document_id(document_id: &str) -> Result<()> {
    if document_id.trim().is_empty() {
        return Err(TrustError::InvalidInput("document id must not be empty".into()));
    }
    if document_id.len() > MAX_DOCUMENT_ID_LEN {
        return Err(TrustError::InvalidInput(format!(
            "document id exceeds {MAX_DOCUMENT_ID_LEN} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DEFAULT_ACCESS_TOKEN_TTL_SECS;
    use crate::db::MemoryStore;
    use crate::time::ManualClock;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingNotifier {
        codes: Mutex<Vec<String>>,
    }

    impl CapturingNotifier {
        fn last(&self) -> String {
            self.codes.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl OtpNotifier for CapturingNotifier {
        async fn deliver(&self, delivery: OtpDelivery) -> Result<()> {
            self.codes.lock().unwrap().push(delivery.code.to_string());
            Ok(())
        }
    }

    struct FailingNotifier;

    #[async_trait]
    impl OtpNotifier for FailingNotifier {
        async fn deliver(&self, _delivery: OtpDelivery) -> Result<()> {
            Err(TrustError::Internal("smtp down".into()))
        }
    }

    struct Harness {
        otp: OtpAuthenticator,
        ledger: Arc<AccessTokenLedger>,
        notifier: Arc<CapturingNotifier>,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    }

    fn harness(policy: OtpPolicy) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::starting_now());
        let notifier = Arc::new(CapturingNotifier::default());
        let ledger = Arc::new(AccessTokenLedger::new(
            store.clone(),
            clock.clone(),
            Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
        ));
        let otp = OtpAuthenticator::new(
            store.clone(),
            ledger.clone(),
            notifier.clone(),
            clock.clone(),
            Duration::seconds(DEFAULT_OTP_TTL_SECS),
            policy,
        );
        Harness {
            otp,
            ledger,
            notifier,
            store,
            clock,
        }
    }

    #[tokio::test]
    async fn test_request_then_verify() {
        let h = harness(OtpPolicy::AnyOutstanding);
        let issued = h.otp.request_code("viewer@example.com", "doc-1").await.unwrap();
        assert_eq!(issued.expires_at, h.clock.now() + Duration::minutes(10));

        let token = h
            .otp
            .verify_code("viewer@example.com", "doc-1", &h.notifier.last())
            .await
            .unwrap();
        assert_eq!(token.document_id, "doc-1");

        let grant = h.ledger.validate(&token.token).await.unwrap();
        assert_eq!(grant.email, "viewer@example.com");
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let h = harness(OtpPolicy::AnyOutstanding);
        h.otp.request_code("v@example.com", "doc-1").await.unwrap();
        let code = h.notifier.last();

        h.otp.verify_code("v@example.com", "doc-1", &code).await.unwrap();
        assert!(matches!(
            h.otp.verify_code("v@example.com", "doc-1", &code).await,
            Err(TrustError::InvalidOrExpiredCode)
        ));
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let h = harness(OtpPolicy::AnyOutstanding);
        h.otp.request_code("v@example.com", "doc-1").await.unwrap();
        let code = h.notifier.last();

        h.clock.advance(Duration::minutes(10) + Duration::seconds(1));
        assert!(matches!(
            h.otp.verify_code("v@example.com", "doc-1", &code).await,
            Err(TrustError::InvalidOrExpiredCode)
        ));

        h.otp.request_code("v@example.com", "doc-1").await.unwrap();
        let code = h.notifier.last();
        h.clock.advance(Duration::minutes(10));
        h.otp.verify_code("v@example.com", "doc-1", &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_code_allows_retry() {
        let h = harness(OtpPolicy::AnyOutstanding);
        h.otp.request_code("v@example.com", "doc-1").await.unwrap();
        let code = h.notifier.last();
        let wrong = if code == "999999" { "100000" } else { "999999" };

        assert!(matches!(
            h.otp.verify_code("v@example.com", "doc-1", wrong).await,
            Err(TrustError::InvalidOrExpiredCode)
        ));
        h.otp.verify_code("v@example.com", "doc-1", &code).await.unwrap();
    }

    #[tokio::test]
    async fn test_code_bound_to_pair() {
        let h = harness(OtpPolicy::AnyOutstanding);
        h.otp.request_code("v@example.com", "doc-1").await.unwrap();
        let code = h.notifier.last();

        for (email, doc) in [("v@example.com", "doc-2"), ("w@example.com", "doc-1")] {
            assert!(matches!(
                h.otp.verify_code(email, doc, &code).await,
                Err(TrustError::InvalidOrExpiredCode)
            ));
        }
    }

    #[tokio::test]
    async fn test_email_is_normalised() {
        let h = harness(OtpPolicy::AnyOutstanding);
        h.otp.request_code(" Viewer@Example.com", "doc-1").await.unwrap();
        let token = h
            .otp
            .verify_code("viewer@example.COM", "doc-1", &h.notifier.last())
            .await
            .unwrap();
        assert_eq!(token.email, "viewer@example.com");
    }

    #[tokio::test]
    async fn test_any_outstanding_accepts_earlier_code() {
        let h = harness(OtpPolicy::AnyOutstanding);
        h.otp.request_code("v@example.com", "doc-1").await.unwrap();
        let first = h.notifier.last();
        h.otp.request_code("v@example.com", "doc-1").await.unwrap();

        h.otp.verify_code("v@example.com", "doc-1", &first).await.unwrap();
    }

    #[tokio::test]
    async fn test_latest_only_invalidates_earlier_code() {
        let h = harness(OtpPolicy::LatestOnly);
        h.otp.request_code("v@example.com", "doc-1").await.unwrap();
        let first = h.notifier.last();
        h.otp.request_code("v@example.com", "doc-1").await.unwrap();
        let second = h.notifier.last();

        if first != second {
            assert!(matches!(
                h.otp.verify_code("v@example.com", "doc-1", &first).await,
                Err(TrustError::InvalidOrExpiredCode)
            ));
        }
        h.otp.verify_code("v@example.com", "doc-1", &second).await.unwrap();
        assert_eq!(h.store.otp_count("v@example.com", "doc-1"), 2);
    }

    #[tokio::test]
    async fn test_malformed_code_rejected_without_lookup() {
        let h = harness(OtpPolicy::AnyOutstanding);
        for code in ["", "12345", "abcdef", "1234567"] {
            assert!(matches!(
                h.otp.verify_code("v@example.com", "doc-1", code).await,
                Err(TrustError::InvalidOrExpiredCode)
            ));
        }
    }

    #[tokio::test]
    async fn test_invalid_request_shape() {
        let h = harness(OtpPolicy::AnyOutstanding);
        assert!(matches!(
            h.otp.request_code("not-an-email", "doc-1").await,
            Err(TrustError::InvalidInput(_))
        ));
        assert!(matches!(
            h.otp.request_code("v@example.com", "  ").await,
            Err(TrustError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_unavailable() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::starting_now());
        let ledger = Arc::new(AccessTokenLedger::new(
            store.clone(),
            clock.clone(),
            Duration::hours(24),
        ));
        let otp = OtpAuthenticator::new(
            store,
            ledger,
            Arc::new(FailingNotifier),
            clock,
            Duration::minutes(10),
            OtpPolicy::default(),
        );

        assert!(matches!(
            otp.request_code("v@example.com", "doc-1").await,
            Err(TrustError::Unavailable(_))
        ));
    }
}
