//! MongoDB document schemas for trust core records
//!
//! Each schema mirrors a record in [`crate::db::records`] and declares its
//! own indexes. Timestamps are stored as BSON dates so TTL indexes and range
//! filters work server-side.

mod access_token;
mod encrypted_payload;
mod key_pair;
mod otp_token;
mod signature;

pub use access_token::{AccessTokenDoc, ACCESS_TOKEN_COLLECTION};
pub use encrypted_payload::{EncryptedPayloadDoc, ENCRYPTED_PAYLOAD_COLLECTION};
pub use key_pair::{KeyPairDoc, KEY_PAIR_COLLECTION};
pub use otp_token::{OtpTokenDoc, OTP_TOKEN_COLLECTION};
pub use signature::{SignatureDoc, SIGNATURE_COLLECTION};
