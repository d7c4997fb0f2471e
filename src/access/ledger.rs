//! Access token ledger

use std::fmt;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine as _};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::db::{AccessTokenRecord, PurgeCounts, TrustStore};
use crate::keys::generate_random_bytes;
use crate::logging::mask_email;
use crate::time::Clock;
use crate::types::{Result, TrustError};

/// Default token lifetime (24 hours)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Random bytes per token (256 bits)
pub const TOKEN_BYTES: usize = 32;

/// Encoded token length (unpadded base64url of 32 bytes)
pub const TOKEN_ENCODED_LEN: usize = 43;

/// Storage key for a bearer token.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// A freshly minted bearer token, returned once to the verified viewer.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub token: String,
    pub document_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("document_id", &self.document_id)
            .field("email", &mask_email(&self.email))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What a valid token grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub document_id: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues, validates and revokes access tokens.
pub struct AccessTokenLedger {
    store: Arc<dyn TrustStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl AccessTokenLedger {
    pub fn new(store: Arc<dyn TrustStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token for `(document_id, email)`.
    ///
    /// Only the OTP flow calls this, after a code has been consumed.
    pub(crate) async fn issue(&self, document_id: &str, email: &str) -> Result<AccessToken> {
        let token = BASE64_URL.encode(generate_random_bytes::<TOKEN_BYTES>());
        let now = self.clock.now();
        let expires_at = now + self.ttl;

        self.store
            .put_access_token(AccessTokenRecord {
                token_hash: hash_token(&token),
                document_id: document_id.to_string(),
                email: email.to_string(),
                created_at: now,
                expires_at,
            })
            .await?;

        info!(
            document_id,
            recipient = %mask_email(email),
            %expires_at,
            "Issued access token"
        );

        Ok(AccessToken {
            token,
            document_id: document_id.to_string(),
            email: email.to_string(),
            expires_at,
        })
    }

    /// Resolve a presented token to its grant.
    ///
    /// Malformed, unknown and expired tokens all fail with
    /// [`TrustError::TokenInvalid`].
    pub async fn validate(&self, token: &str) -> Result<AccessGrant> {
        if token.len() != TOKEN_ENCODED_LEN {
            debug!("Rejected access token with unexpected length");
            return Err(TrustError::TokenInvalid);
        }

        let record = self
            .store
            .get_access_token(&hash_token(token))
            .await?
            .ok_or(TrustError::TokenInvalid)?;

        if record.is_expired(self.clock.now()) {
            warn!(document_id = %record.document_id, "Rejected expired access token");
            return Err(TrustError::TokenInvalid);
        }

        Ok(AccessGrant {
            document_id: record.document_id,
            email: record.email,
            expires_at: record.expires_at,
        })
    }

    /// Withdraw a token before it expires. Revoking an unknown token is not an error.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let removed = self.store.delete_access_token(&hash_token(token)).await?;
        if removed {
            info!("Revoked access token");
        }
        Ok(removed)
    }

    /// Drop expired OTP and access-token records.
    pub async fn purge_expired(&self) -> Result<PurgeCounts> {
        self.store.purge_expired(self.clock.now()).await
    }
}

/// Spawn a background task that periodically purges expired records
pub fn spawn_sweeper_task(
    ledger: Arc<AccessTokenLedger>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "Expiry sweeper started");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match ledger.purge_expired().await {
                Ok(counts) if counts.otp_tokens + counts.access_tokens > 0 => {
                    info!(
                        otp_tokens = counts.otp_tokens,
                        access_tokens = counts.access_tokens,
                        "Purged expired records"
                    );
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Expiry sweep failed"),
            }
        }
    })
}
