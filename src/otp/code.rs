//! Code generation, digesting and input normalisation.

use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::types::{Result, TrustError};

/// Digits per code
pub const CODE_LEN: usize = 6;

/// Longest accepted email address
pub const MAX_EMAIL_LEN: usize = 254;

const DIGEST_DOMAIN: &[u8] = b"notary/otp/v1";

/// Uniform 6-digit code in `100000..=999999`.
pub fn generate_code() -> Zeroizing<String> {
    let value: u32 = OsRng.gen_range(100_000..=999_999);
    Zeroizing::new(value.to_string())
}

/// Storage digest of a code, bound to the pair it was issued for.
pub fn code_digest(email: &str, document_id: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(DIGEST_DOMAIN);
    hasher.update(email.as_bytes());
    hasher.update([0u8]);
    hasher.update(document_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

/// Exactly six ASCII digits.
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Trim and lowercase an address, rejecting anything without a
/// `local@domain` shape.
pub fn normalize_email(email: &str) -> Result<String> {
    let normalized = email.trim().to_ascii_lowercase();

    let valid = normalized.len() <= MAX_EMAIL_LEN
        && !normalized.chars().any(char::is_whitespace)
        && matches!(
            normalized.split_once('@'),
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        );

    if !valid {
        return Err(TrustError::InvalidInput("invalid email address".into()));
    }
    Ok(normalized)
}
