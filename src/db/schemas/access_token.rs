//! Access token document schema
//!
//! Stores the SHA-256 of each bearer token, never the token itself.

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::records::AccessTokenRecord;

/// Collection name for access tokens
pub const ACCESS_TOKEN_COLLECTION: &str = "access_tokens";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenDoc {
    /// Hex SHA-256 of the bearer value
    #[serde(rename = "_id")]
    pub token_hash: String,

    pub document_id: String,

    pub email: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl From<AccessTokenRecord> for AccessTokenDoc {
    fn from(record: AccessTokenRecord) -> Self {
        Self {
            token_hash: record.token_hash,
            document_id: record.document_id,
            email: record.email,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

impl From<AccessTokenDoc> for AccessTokenRecord {
    fn from(doc: AccessTokenDoc) -> Self {
        Self {
            token_hash: doc.token_hash,
            document_id: doc.document_id,
            email: doc.email,
            created_at: doc.created_at,
            expires_at: doc.expires_at,
        }
    }
}

impl IntoIndexes for AccessTokenDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "expires_at": 1 },
                Some(
                    IndexOptions::builder()
                        .expire_after(std::time::Duration::from_secs(0))
                        .name("expires_at_ttl".to_string())
                        .build(),
                ),
            ),
            // Listing grants per document
            (
                doc! { "document_id": 1 },
                Some(
                    IndexOptions::builder()
                        .name("document_id_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
