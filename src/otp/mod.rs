//! One-time passcodes bound to `(email, document_id)`
//!
//! A code is issued, delivered out of band, and exchanged exactly once for
//! an access token. Mismatched, used and expired codes are indistinguishable
//! to the caller.

pub mod authenticator;
pub mod code;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub use authenticator::{OtpAuthenticator, OtpIssued, DEFAULT_OTP_TTL_SECS};
pub use code::{code_digest, generate_code, is_well_formed_code, normalize_email, CODE_LEN};

/// Which outstanding codes a verification may match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtpPolicy {
    /// Any unexpired, unused code for the pair
    #[default]
    AnyOutstanding,
    /// Issuing a code invalidates every earlier outstanding code for the pair
    LatestOnly,
}
