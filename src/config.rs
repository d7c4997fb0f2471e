//! Configuration for the notary
//!
//! CLI arguments and environment variable handling using clap.

use chrono::Duration;
use clap::Parser;

use crate::cipher::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::links::VerificationLinker;
use crate::nats::DEFAULT_OTP_SUBJECT;
use crate::otp::OtpPolicy;
use crate::types::{Result, TrustError};

/// Verification base URL used in development mode when none is configured
pub const DEV_VERIFY_BASE_URL: &str = "http://localhost:8080";

/// Shared settings for every `notary` command
#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// Enable development mode (in-memory store and discarded OTP deliveries
    /// when MongoDB or NATS are unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false", global = true)]
    pub dev_mode: bool,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017", global = true)]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "notary", global = true)]
    pub mongodb_db: String,

    /// NATS configuration
    #[command(flatten)]
    pub nats: NatsArgs,

    /// Subject OTP deliveries are published on
    #[arg(long, env = "OTP_SUBJECT", default_value = DEFAULT_OTP_SUBJECT, global = true)]
    pub otp_subject: String,

    /// Base URL of the public verification page
    #[arg(long, env = "VERIFY_BASE_URL", global = true)]
    pub verify_base_url: Option<String>,

    /// One-time code lifetime in seconds
    #[arg(long, env = "OTP_TTL_SECONDS", default_value = "600", global = true)]
    pub otp_ttl_seconds: u64,

    /// Access token lifetime in seconds
    #[arg(long, env = "ACCESS_TOKEN_TTL_SECONDS", default_value = "86400", global = true)]
    pub access_token_ttl_seconds: u64,

    /// Largest payload accepted for encryption, in bytes
    #[arg(long, env = "MAX_PAYLOAD_BYTES", default_value_t = DEFAULT_MAX_PAYLOAD_BYTES, global = true)]
    pub max_payload_bytes: usize,

    /// Which outstanding codes a verification may match
    #[arg(long, env = "OTP_POLICY", value_enum, default_value_t = OtpPolicy::AnyOutstanding, global = true)]
    pub otp_policy: OtpPolicy,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false", global = true)]
    pub log_json: bool,
}

/// NATS connection configuration
#[derive(Parser, Debug, Clone)]
pub struct NatsArgs {
    /// NATS server URL
    #[arg(long, env = "NATS_URL", default_value = "nats://127.0.0.1:4222", global = true)]
    pub nats_url: String,

    /// NATS username (optional)
    #[arg(long, env = "NATS_USER", global = true)]
    pub nats_user: Option<String>,

    /// NATS password (optional)
    #[arg(long, env = "NATS_PASSWORD", global = true)]
    pub nats_password: Option<String>,
}

impl Args {
    /// Get effective verification base URL (uses a localhost default in dev mode)
    pub fn verify_base_url(&self) -> Result<&str> {
        match (&self.verify_base_url, self.dev_mode) {
            (Some(url), _) => Ok(url.as_str()),
            (None, true) => Ok(DEV_VERIFY_BASE_URL),
            (None, false) => Err(TrustError::Config(
                "VERIFY_BASE_URL is required in production mode".into(),
            )),
        }
    }

    pub fn otp_ttl(&self) -> Duration {
        Duration::seconds(self.otp_ttl_seconds as i64)
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::seconds(self.access_token_ttl_seconds as i64)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.otp_ttl_seconds == 0 {
            return Err(TrustError::Config("OTP_TTL_SECONDS must be greater than 0".into()));
        }
        if self.access_token_ttl_seconds == 0 {
            return Err(TrustError::Config(
                "ACCESS_TOKEN_TTL_SECONDS must be greater than 0".into(),
            ));
        }
        // Keep both within what chrono can add to a timestamp
        let max_ttl = i64::MAX as u64 / 1000;
        if self.otp_ttl_seconds > max_ttl || self.access_token_ttl_seconds > max_ttl {
            return Err(TrustError::Config("TTL is out of range".into()));
        }
        if self.max_payload_bytes == 0 {
            return Err(TrustError::Config("MAX_PAYLOAD_BYTES must be greater than 0".into()));
        }

        VerificationLinker::new(self.verify_base_url()?)?;
        Ok(())
    }
}
