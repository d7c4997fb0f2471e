//! NATS messaging
//!
//! Connection management and the OTP delivery publisher.

pub mod client;
pub mod notifier;

pub use client::NatsClient;
pub use notifier::{NatsOtpNotifier, DEFAULT_OTP_SUBJECT};
