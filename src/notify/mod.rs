//! OTP delivery hand-off
//!
//! The trust core does not send email. It hands each fresh code to an
//! [`OtpNotifier`], which forwards it to whatever delivers mail. That channel
//! is the only place a clear-text code leaves the core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use zeroize::Zeroizing;

use crate::logging::mask_email;
use crate::types::Result;

/// A code ready for delivery to its recipient.
#[derive(Serialize)]
pub struct OtpDelivery {
    pub email: String,
    pub document_id: String,
    #[serde(serialize_with = "serialize_code")]
    pub code: Zeroizing<String>,
    pub expires_at: DateTime<Utc>,
}

fn serialize_code<S: serde::Serializer>(
    code: &Zeroizing<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(code.as_str())
}

impl std::fmt::Debug for OtpDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OtpDelivery")
            .field("email", &mask_email(&self.email))
            .field("document_id", &self.document_id)
            .field("code", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Forwards codes to the delivery service.
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn deliver(&self, delivery: OtpDelivery) -> Result<()>;
}

/// Drops every delivery. Development mode only.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardNotifier;

#[async_trait]
impl OtpNotifier for DiscardNotifier {
    async fn deliver(&self, delivery: OtpDelivery) -> Result<()> {
        info!(
            recipient = %mask_email(&delivery.email),
            document_id = %delivery.document_id,
            "Discarding OTP delivery (development mode)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> OtpDelivery {
        OtpDelivery {
            email: "signer@example.com".into(),
            document_id: "doc-1".into(),
            code: Zeroizing::new("123456".into()),
            expires_at: Utc::now(),
        }
    }

    #[test]
    fn test_debug_hides_code_and_address() {
        let rendered = format!("{:?}", delivery());
        assert!(!rendered.contains("123456"));
        assert!(!rendered.contains("signer@"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_wire_form_carries_code() {
        let json = serde_json::to_value(delivery()).unwrap();
        assert_eq!(json["code"], "123456");
        assert_eq!(json["email"], "signer@example.com");
    }

    #[tokio::test]
    async fn test_discard_notifier_accepts() {
        DiscardNotifier.deliver(delivery()).await.unwrap();
    }
}
