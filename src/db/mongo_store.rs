//! MongoDB-backed [`TrustStore`].
//!
//! The OTP consume step is a single `findOneAndUpdate` whose filter includes
//! `used: false`, so the server serialises concurrent verifications of one
//! code and only one of them gets the document back.

use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use tracing::debug;

use super::mongo::{retry_once, MongoClient, MongoCollection};
use super::records::{
    AccessTokenRecord, EncryptedPayload, KeyRecord, OtpTokenRecord, PurgeCounts, SignatureRecord,
};
use super::schemas::{
    AccessTokenDoc, EncryptedPayloadDoc, KeyPairDoc, OtpTokenDoc, SignatureDoc,
    ACCESS_TOKEN_COLLECTION, ENCRYPTED_PAYLOAD_COLLECTION, KEY_PAIR_COLLECTION,
    OTP_TOKEN_COLLECTION, SIGNATURE_COLLECTION,
};
use super::store::TrustStore;
use crate::types::Result;

fn bson_time(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(at)
}

/// Store backed by five MongoDB collections.
pub struct MongoTrustStore {
    key_pairs: MongoCollection<KeyPairDoc>,
    otp_tokens: MongoCollection<OtpTokenDoc>,
    access_tokens: MongoCollection<AccessTokenDoc>,
    signatures: MongoCollection<SignatureDoc>,
    payloads: MongoCollection<EncryptedPayloadDoc>,
}

impl MongoTrustStore {
    /// Open all collections and apply their indexes.
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            key_pairs: client.collection(KEY_PAIR_COLLECTION).await?,
            otp_tokens: client.collection(OTP_TOKEN_COLLECTION).await?,
            access_tokens: client.collection(ACCESS_TOKEN_COLLECTION).await?,
            signatures: client.collection(SIGNATURE_COLLECTION).await?,
            payloads: client.collection(ENCRYPTED_PAYLOAD_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl TrustStore for MongoTrustStore {
    async fn put_key_record(&self, record: KeyRecord) -> Result<()> {
        let doc = KeyPairDoc::from(record);
        let (coll, doc) = (self.key_pairs.inner(), &doc);
        retry_once("put_key_record", move || async move {
            coll.insert_one(doc).await.map(|_| ())
        })
        .await
    }

    async fn latest_public_key(&self, owner_id: &str) -> Result<Option<KeyRecord>> {
        let coll = self.key_pairs.inner();
        let found = retry_once("latest_public_key", move || async move {
            coll.find_one(doc! { "owner_id": owner_id })
                .sort(doc! { "created_at": -1 })
                .await
        })
        .await?;

        found.map(KeyRecord::try_from).transpose()
    }

    async fn list_public_keys(&self, owner_id: &str) -> Result<Vec<KeyRecord>> {
        let coll = self.key_pairs.inner();
        let docs: Vec<KeyPairDoc> = retry_once("list_public_keys", move || async move {
            coll.find(doc! { "owner_id": owner_id })
                .sort(doc! { "created_at": -1 })
                .await?
                .try_collect()
                .await
        })
        .await?;

        docs.into_iter().map(KeyRecord::try_from).collect()
    }

    async fn put_otp_token(&self, record: OtpTokenRecord) -> Result<()> {
        let doc = OtpTokenDoc::from(record);
        let (coll, doc) = (self.otp_tokens.inner(), &doc);
        retry_once("put_otp_token", move || async move {
            coll.insert_one(doc).await.map(|_| ())
        })
        .await
    }

    async fn consume_usable_otp(
        &self,
        email: &str,
        document_id: &str,
        code_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpTokenRecord>> {
        let filter = doc! {
            "email": email,
            "document_id": document_id,
            "code_digest": code_digest,
            "used": false,
            "expires_at": { "$gte": bson_time(now) },
        };
        let update = doc! { "$set": { "used": true } };

        let (coll, filter, update) = (self.otp_tokens.inner(), &filter, &update);
        let consumed = retry_once("consume_usable_otp", move || async move {
            coll.find_one_and_update(filter.clone(), update.clone())
                .return_document(ReturnDocument::Before)
                .await
        })
        .await?;

        consumed.map(OtpTokenRecord::try_from).transpose()
    }

    async fn invalidate_outstanding_otps(
        &self,
        email: &str,
        document_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let filter = doc! {
            "email": email,
            "document_id": document_id,
            "used": false,
            "expires_at": { "$gte": bson_time(now) },
        };
        let update = doc! { "$set": { "used": true } };

        let (coll, filter, update) = (self.otp_tokens.inner(), &filter, &update);
        let result = retry_once("invalidate_outstanding_otps", move || async move {
            coll.update_many(filter.clone(), update.clone()).await
        })
        .await?;

        Ok(result.modified_count)
    }

    async fn put_access_token(&self, record: AccessTokenRecord) -> Result<()> {
        let doc = AccessTokenDoc::from(record);
        let (coll, doc) = (self.access_tokens.inner(), &doc);
        retry_once("put_access_token", move || async move {
            coll.insert_one(doc).await.map(|_| ())
        })
        .await
    }

    async fn get_access_token(&self, token_hash: &str) -> Result<Option<AccessTokenRecord>> {
        let coll = self.access_tokens.inner();
        let found = retry_once("get_access_token", move || async move {
            coll.find_one(doc! { "_id": token_hash }).await
        })
        .await?;

        Ok(found.map(AccessTokenRecord::from))
    }

    async fn delete_access_token(&self, token_hash: &str) -> Result<bool> {
        let coll = self.access_tokens.inner();
        let result = retry_once("delete_access_token", move || async move {
            coll.delete_one(doc! { "_id": token_hash }).await
        })
        .await?;

        Ok(result.deleted_count > 0)
    }

    async fn put_signature(&self, record: SignatureRecord) -> Result<()> {
        let doc = SignatureDoc::from(record);
        let (coll, doc) = (self.signatures.inner(), &doc);
        retry_once("put_signature", move || async move {
            coll.replace_one(doc! { "_id": &doc.document_id }, doc)
                .upsert(true)
                .await
                .map(|_| ())
        })
        .await
    }

    async fn get_signature(&self, document_id: &str) -> Result<Option<SignatureRecord>> {
        let coll = self.signatures.inner();
        let found = retry_once("get_signature", move || async move {
            coll.find_one(doc! { "_id": document_id }).await
        })
        .await?;

        found.map(SignatureRecord::try_from).transpose()
    }

    async fn put_encrypted_payload(&self, payload: EncryptedPayload) -> Result<()> {
        let doc = EncryptedPayloadDoc::from(payload);
        let (coll, doc) = (self.payloads.inner(), &doc);
        retry_once("put_encrypted_payload", move || async move {
            coll.replace_one(doc! { "_id": &doc.document_id }, doc)
                .upsert(true)
                .await
                .map(|_| ())
        })
        .await
    }

    async fn get_encrypted_payload(&self, document_id: &str) -> Result<Option<EncryptedPayload>> {
        let coll = self.payloads.inner();
        let found = retry_once("get_encrypted_payload", move || async move {
            coll.find_one(doc! { "_id": document_id }).await
        })
        .await?;

        Ok(found.map(EncryptedPayload::from))
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<PurgeCounts> {
        let filter = doc! { "expires_at": { "$lt": bson_time(now) } };

        let (otps, filter_ref) = (self.otp_tokens.inner(), &filter);
        let otp_result = retry_once("purge_expired_otps", move || async move {
            otps.delete_many(filter_ref.clone()).await
        })
        .await?;

        let tokens = self.access_tokens.inner();
        let token_result = retry_once("purge_expired_access_tokens", move || async move {
            tokens.delete_many(filter_ref.clone()).await
        })
        .await?;

        let counts = PurgeCounts {
            otp_tokens: otp_result.deleted_count,
            access_tokens: token_result.deleted_count,
        };
        debug!(
            otp_tokens = counts.otp_tokens,
            access_tokens = counts.access_tokens,
            "Purged expired records from MongoDB"
        );
        Ok(counts)
    }
}
