//! Error types for the trust core
//!
//! Callers match on the variant, never on the message. Messages never carry
//! key material, passcodes or bearer tokens.

/// Main error type for trust core operations
#[derive(Debug, thiserror::Error)]
pub enum TrustError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload too large: {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { size: usize, max: usize },

    /// Malformed ciphertext, wrong key and tag failure all land here.
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Code mismatch, already-used and expired codes are indistinguishable.
    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    /// Unknown, revoked and expired tokens are indistinguishable.
    #[error("Access token invalid")]
    TokenInvalid,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrustError {
    /// Whether the failure was caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Unavailable(_) | Self::Config(_) | Self::Internal(_)
        )
    }
}

impl From<mongodb::error::Error> for TrustError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Unavailable(format!("database: {}", err))
    }
}

impl From<serde_json::Error> for TrustError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("JSON error: {}", err))
    }
}

/// Result type alias for trust core operations
pub type Result<T> = std::result::Result<T, TrustError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapsed_errors_carry_no_detail() {
        assert_eq!(TrustError::DecryptionFailed.to_string(), "Decryption failed");
        assert_eq!(
            TrustError::InvalidOrExpiredCode.to_string(),
            "Invalid or expired code"
        );
        assert_eq!(TrustError::TokenInvalid.to_string(), "Access token invalid");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(TrustError::InvalidOrExpiredCode.is_client_error());
        assert!(TrustError::PayloadTooLarge { size: 2, max: 1 }.is_client_error());
        assert!(!TrustError::Unavailable("down".into()).is_client_error());
    }
}
