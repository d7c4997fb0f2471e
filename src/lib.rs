//! Notary - document trust core
//!
//! Key custody, sealed documents, detached signatures and OTP step-up access
//! for shared documents.
//!
//! ## Components
//!
//! - **KeyVault**: per-owner signing and encryption key pairs
//! - **DocumentCipher**: hybrid sealing of payloads to an owner's key
//! - **DocumentSigner**: canonical content hashing and Ed25519 signatures
//! - **OtpAuthenticator**: single-use passcodes bound to an email and document
//! - **AccessTokenLedger**: bearer tokens minted after a verified passcode
//! - **VerificationLinker**: hash-bearing verification URLs for QR codes

pub mod access;
pub mod cipher;
pub mod config;
pub mod db;
pub mod keys;
pub mod links;
pub mod logging;
pub mod nats;
pub mod notify;
pub mod otp;
pub mod signing;
pub mod time;
pub mod trust;
pub mod types;

#[cfg(test)]
mod proptests;

pub use config::Args;
pub use trust::{CoreSettings, TrustCore};
pub use types::{Result, TrustError};
