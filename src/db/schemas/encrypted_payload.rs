//! Sealed document payload schema

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::records::EncryptedPayload;

/// Collection name for sealed payloads
pub const ENCRYPTED_PAYLOAD_COLLECTION: &str = "encrypted_payloads";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayloadDoc {
    #[serde(rename = "_id")]
    pub document_id: String,

    /// Base64 hybrid envelope
    pub ciphertext: String,

    pub encrypted_under: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl From<EncryptedPayload> for EncryptedPayloadDoc {
    fn from(payload: EncryptedPayload) -> Self {
        Self {
            document_id: payload.document_id,
            ciphertext: payload.ciphertext,
            encrypted_under: payload.encrypted_under,
            created_at: payload.created_at,
        }
    }
}

impl From<EncryptedPayloadDoc> for EncryptedPayload {
    fn from(doc: EncryptedPayloadDoc) -> Self {
        Self {
            document_id: doc.document_id,
            ciphertext: doc.ciphertext,
            encrypted_under: doc.encrypted_under,
            created_at: doc.created_at,
        }
    }
}

impl IntoIndexes for EncryptedPayloadDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "encrypted_under": 1 },
            Some(
                IndexOptions::builder()
                    .name("encrypted_under_index".to_string())
                    .build(),
            ),
        )]
    }
}
