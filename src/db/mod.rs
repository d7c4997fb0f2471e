//! Storage collaborator for the trust core
//!
//! - [`TrustStore`]: the contract every component is constructed with
//! - [`MemoryStore`]: `dashmap`-backed, for tests and development mode
//! - [`MongoTrustStore`]: MongoDB collections with TTL indexes

pub mod memory;
pub mod mongo;
pub mod mongo_store;
pub mod records;
pub mod schemas;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::{MongoClient, MongoCollection};
pub use mongo_store::MongoTrustStore;
pub use records::{
    AccessTokenRecord, EncryptedPayload, KeyRecord, OtpTokenRecord, PurgeCounts, SignatureRecord,
};
pub use store::TrustStore;
