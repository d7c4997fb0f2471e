//! Key custody for document owners and issuers
//!
//! Each owner gets a bundled key pair at registration:
//! - Ed25519 half signs documents the owner issues
//! - X25519 half receives documents sealed to the owner
//!
//! Only the public bundle is recorded. The private bundle is returned once to
//! the caller and is not retained server-side. The newest key for an owner is
//! the active one; older keys stay on record for opening older payloads and
//! verifying older signatures.

pub mod crypto;
pub mod vault;

pub use crypto::{generate_random_bytes, PrivateKeyBundle, PublicKeyBundle};
pub use vault::{KeyPair, KeyVault};
