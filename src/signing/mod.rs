//! Detached document signatures
//!
//! Content is canonicalized, hashed with SHA-256 for a fingerprint, and the
//! canonical bytes are signed with the issuer's Ed25519 key.

pub mod canonical;
pub mod signer;

pub use canonical::{canonicalize, ContentHash};
pub use signer::{DocumentSigner, DocumentVerification, SignedContent};
