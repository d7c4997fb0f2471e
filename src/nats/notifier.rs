//! Publishes OTP deliveries for the mail service to pick up.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::client::NatsClient;
use crate::logging::mask_email;
use crate::notify::{OtpDelivery, OtpNotifier};
use crate::types::{Result, TrustError};

/// Default subject for OTP deliveries
pub const DEFAULT_OTP_SUBJECT: &str = "notary.otp.deliver";

/// [`OtpNotifier`] that publishes JSON deliveries on a NATS subject.
pub struct NatsOtpNotifier {
    client: NatsClient,
    subject: String,
}

impl NatsOtpNotifier {
    pub fn new(client: NatsClient, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }
}

#[async_trait]
impl OtpNotifier for NatsOtpNotifier {
    async fn deliver(&self, delivery: OtpDelivery) -> Result<()> {
        let payload = serde_json::to_vec(&delivery)
            .map_err(|e| TrustError::Internal(format!("Failed to encode OTP delivery: {e}")))?;

        self.client
            .publish(&self.subject, Bytes::from(payload))
            .await?;

        debug!(
            subject = %self.subject,
            recipient = %mask_email(&delivery.email),
            "Published OTP delivery"
        );
        Ok(())
    }
}
