//! Document sealing
//!
//! Documents are sealed to a recipient's public key with a hybrid scheme
//! (X25519 key agreement, HKDF-SHA256, ChaCha20-Poly1305), so payload size is
//! bounded only by the configured limit rather than by an asymmetric block
//! size. Opening requires the recipient's private key, supplied per call.

pub mod envelope;
pub mod service;

pub use envelope::{open, seal, ENVELOPE_VERSION};
pub use service::{DocumentCipher, DEFAULT_MAX_PAYLOAD_BYTES};
