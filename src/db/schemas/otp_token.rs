//! OTP token document schema
//!
//! Codes are short-lived (10 minutes by default) and single-use. The code
//! itself is never stored, only its digest.

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::mongo::IntoIndexes;
use crate::db::records::OtpTokenRecord;
use crate::types::{Result, TrustError};

/// Collection name for OTP tokens
pub const OTP_TOKEN_COLLECTION: &str = "otp_tokens";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpTokenDoc {
    #[serde(rename = "_id")]
    pub id: String,

    pub email: String,

    pub document_id: String,

    pub code_digest: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,

    /// Whether the code has been consumed or invalidated
    #[serde(default)]
    pub used: bool,
}

impl From<OtpTokenRecord> for OtpTokenDoc {
    fn from(record: OtpTokenRecord) -> Self {
        Self {
            id: record.id.to_string(),
            email: record.email,
            document_id: record.document_id,
            code_digest: record.code_digest,
            created_at: record.created_at,
            expires_at: record.expires_at,
            used: record.used,
        }
    }
}

impl TryFrom<OtpTokenDoc> for OtpTokenRecord {
    type Error = TrustError;

    fn try_from(doc: OtpTokenDoc) -> Result<Self> {
        let id = Uuid::parse_str(&doc.id)
            .map_err(|e| TrustError::Internal(format!("Stored OTP id is not a UUID: {e}")))?;
        Ok(Self {
            id,
            email: doc.email,
            document_id: doc.document_id,
            code_digest: doc.code_digest,
            created_at: doc.created_at,
            expires_at: doc.expires_at,
            used: doc.used,
        })
    }
}

impl IntoIndexes for OtpTokenDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Consume lookup
            (
                doc! { "email": 1, "document_id": 1, "code_digest": 1 },
                Some(
                    IndexOptions::builder()
                        .name("pair_code_index".to_string())
                        .build(),
                ),
            ),
            // TTL index for automatic expiration cleanup
            (
                doc! { "expires_at": 1 },
                Some(
                    IndexOptions::builder()
                        .expire_after(std::time::Duration::from_secs(0))
                        .name("expires_at_ttl".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
