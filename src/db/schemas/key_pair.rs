//! Key pair document schema
//!
//! Only the public bundle is stored. Private keys leave the service once,
//! in the response that created them.

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::mongo::IntoIndexes;
use crate::db::records::KeyRecord;
use crate::keys::PublicKeyBundle;
use crate::types::{Result, TrustError};

/// Collection name for public key records
pub const KEY_PAIR_COLLECTION: &str = "key_pairs";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPairDoc {
    /// Record UUID (string form)
    #[serde(rename = "_id")]
    pub id: String,

    pub owner_id: String,

    /// Base64 public bundle
    pub public_key: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl From<KeyRecord> for KeyPairDoc {
    fn from(record: KeyRecord) -> Self {
        Self {
            id: record.id.to_string(),
            owner_id: record.owner_id,
            public_key: record.public_key.to_base64(),
            created_at: record.created_at,
        }
    }
}

impl TryFrom<KeyPairDoc> for KeyRecord {
    type Error = TrustError;

    fn try_from(doc: KeyPairDoc) -> Result<Self> {
        let id = Uuid::parse_str(&doc.id)
            .map_err(|e| TrustError::Internal(format!("Stored key id is not a UUID: {e}")))?;
        Ok(Self {
            id,
            owner_id: doc.owner_id,
            public_key: PublicKeyBundle::from_base64(&doc.public_key)?,
            created_at: doc.created_at,
        })
    }
}

impl IntoIndexes for KeyPairDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Latest-key lookup: owner, newest first
            (
                doc! { "owner_id": 1, "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("owner_created_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
