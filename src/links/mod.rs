//! Verification links
//!
//! Turns a content hash into the public URL a QR code points at. The hash
//! is carried verbatim as the `hash` query parameter.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signing::ContentHash;
use crate::types::{Result, TrustError};

/// Path appended to the base URL
pub const VERIFY_PATH: &str = "/verify";

/// A shareable pointer to a document's verification page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReference {
    pub document_hash: ContentHash,
    pub verification_url: String,
}

/// Builds verification references against a fixed base URL.
#[derive(Debug, Clone)]
pub struct VerificationLinker {
    base_url: String,
}

impl VerificationLinker {
    /// Validate and store the base URL. A bad base URL is a startup error.
    pub fn new(base_url: &str) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');

        let host = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(|| {
                TrustError::Config(format!(
                    "verification base URL must start with http:// or https://, got {base_url:?}"
                ))
            })?;

        if host.is_empty() || host.contains(['?', '#']) || host.chars().any(char::is_whitespace) {
            return Err(TrustError::Config(format!(
                "verification base URL is not usable: {base_url:?}"
            )));
        }

        debug!(base_url = trimmed, "Verification linker configured");
        Ok(Self {
            base_url: trimmed.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/verify?hash=<hex>`. Pure: equal hashes give equal URLs.
    pub fn build_reference(&self, document_hash: &ContentHash) -> VerificationReference {
        let verification_url = format!(
            "{}{}?hash={}",
            self.base_url,
            VERIFY_PATH,
            urlencoding::encode(document_hash.as_str())
        );

        VerificationReference {
            document_hash: document_hash.clone(),
            verification_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hash() -> ContentHash {
        ContentHash::of_content(&json!({})).unwrap()
    }

    #[test]
    fn test_build_reference() {
        let linker = VerificationLinker::new("https://notary.example.org").unwrap();
        let reference = linker.build_reference(&hash());
        assert_eq!(
            reference.verification_url,
            "https://notary.example.org/verify?hash=44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
        assert_eq!(reference.document_hash, hash());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let a = VerificationLinker::new("https://notary.example.org/").unwrap();
        let b = VerificationLinker::new("https://notary.example.org").unwrap();
        assert_eq!(
            a.build_reference(&hash()).verification_url,
            b.build_reference(&hash()).verification_url
        );
    }

    #[test]
    fn test_base_path_preserved() {
        let linker = VerificationLinker::new("http://localhost:8080/docs").unwrap();
        assert!(linker
            .build_reference(&hash())
            .verification_url
            .starts_with("http://localhost:8080/docs/verify?hash="));
    }

    #[test]
    fn test_deterministic() {
        let linker = VerificationLinker::new("https://notary.example.org").unwrap();
        assert_eq!(linker.build_reference(&hash()), linker.build_reference(&hash()));
    }

    #[test]
    fn test_bad_base_urls() {
        for base in ["", "notary.example.org", "ftp://x", "https://", "https://x?y=1"] {
            assert!(
                matches!(VerificationLinker::new(base), Err(TrustError::Config(_))),
                "{base:?} should be rejected"
            );
        }
    }
}
