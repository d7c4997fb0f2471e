//! Signature document schema

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::db::records::SignatureRecord;
use crate::signing::ContentHash;
use crate::types::{Result, TrustError};

/// Collection name for document signatures
pub const SIGNATURE_COLLECTION: &str = "signatures";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureDoc {
    /// One signature per document
    #[serde(rename = "_id")]
    pub document_id: String,

    pub content_hash: String,

    pub signature: String,

    pub signed_by: String,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub signed_at: DateTime<Utc>,
}

impl From<SignatureRecord> for SignatureDoc {
    fn from(record: SignatureRecord) -> Self {
        Self {
            document_id: record.document_id,
            content_hash: record.content_hash.to_string(),
            signature: record.signature,
            signed_by: record.signed_by,
            signed_at: record.signed_at,
        }
    }
}

impl TryFrom<SignatureDoc> for SignatureRecord {
    type Error = TrustError;

    fn try_from(doc: SignatureDoc) -> Result<Self> {
        let content_hash = ContentHash::parse(&doc.content_hash)
            .map_err(|_| TrustError::Internal("Stored content hash is malformed".into()))?;
        Ok(Self {
            document_id: doc.document_id,
            content_hash,
            signature: doc.signature,
            signed_by: doc.signed_by,
            signed_at: doc.signed_at,
        })
    }
}

impl IntoIndexes for SignatureDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Reverse lookup from a scanned verification link
            (
                doc! { "content_hash": 1 },
                Some(
                    IndexOptions::builder()
                        .name("content_hash_index".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "signed_by": 1 },
                Some(
                    IndexOptions::builder()
                        .name("signed_by_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
