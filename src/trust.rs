//! Component wiring
//!
//! Every component receives the same store and clock. [`TrustCore::connect`]
//! picks the backends from configuration; [`TrustCore::new`] takes them
//! injected, which is what tests use.

use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};

use crate::access::{AccessTokenLedger, DEFAULT_ACCESS_TOKEN_TTL_SECS};
use crate::cipher::{DocumentCipher, DEFAULT_MAX_PAYLOAD_BYTES};
use crate::config::{Args, DEV_VERIFY_BASE_URL};
use crate::db::{MemoryStore, MongoClient, MongoTrustStore, TrustStore};
use crate::keys::KeyVault;
use crate::links::VerificationLinker;
use crate::nats::{NatsClient, NatsOtpNotifier};
use crate::notify::{DiscardNotifier, OtpNotifier};
use crate::otp::{OtpAuthenticator, OtpPolicy, DEFAULT_OTP_TTL_SECS};
use crate::signing::DocumentSigner;
use crate::time::{Clock, SystemClock};
use crate::types::Result;

/// Tunables shared by the components.
#[derive(Debug, Clone)]
pub struct CoreSettings {
    pub otp_ttl: Duration,
    pub access_token_ttl: Duration,
    pub max_payload_bytes: usize,
    pub otp_policy: OtpPolicy,
    pub verify_base_url: String,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::seconds(DEFAULT_OTP_TTL_SECS),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            otp_policy: OtpPolicy::default(),
            verify_base_url: DEV_VERIFY_BASE_URL.to_string(),
        }
    }
}

impl CoreSettings {
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            otp_ttl: args.otp_ttl(),
            access_token_ttl: args.access_token_ttl(),
            max_payload_bytes: args.max_payload_bytes,
            otp_policy: args.otp_policy,
            verify_base_url: args.verify_base_url()?.to_string(),
        })
    }
}

/// All trust components over one store.
#[derive(Clone)]
pub struct TrustCore {
    pub store: Arc<dyn TrustStore>,
    pub clock: Arc<dyn Clock>,
    pub vault: Arc<KeyVault>,
    pub cipher: Arc<DocumentCipher>,
    pub signer: Arc<DocumentSigner>,
    pub ledger: Arc<AccessTokenLedger>,
    pub otp: Arc<OtpAuthenticator>,
    pub linker: Arc<VerificationLinker>,
}

impl TrustCore {
    /// Wire components over injected collaborators.
    pub fn new(
        settings: &CoreSettings,
        store: Arc<dyn TrustStore>,
        notifier: Arc<dyn OtpNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let linker = Arc::new(VerificationLinker::new(&settings.verify_base_url)?);
        let vault = Arc::new(KeyVault::new(store.clone(), clock.clone()));
        let cipher = Arc::new(DocumentCipher::new(
            store.clone(),
            vault.clone(),
            clock.clone(),
            settings.max_payload_bytes,
        ));
        let signer = Arc::new(DocumentSigner::new(store.clone(), vault.clone(), clock.clone()));
        let ledger = Arc::new(AccessTokenLedger::new(
            store.clone(),
            clock.clone(),
            settings.access_token_ttl,
        ));
        let otp = Arc::new(OtpAuthenticator::new(
            store.clone(),
            ledger.clone(),
            notifier,
            clock.clone(),
            settings.otp_ttl,
            settings.otp_policy,
        ));

        Ok(Self {
            store,
            clock,
            vault,
            cipher,
            signer,
            ledger,
            otp,
            linker,
        })
    }

    /// Connect the configured backends and wire the components.
    ///
    /// In dev mode an unreachable MongoDB falls back to the in-memory store
    /// and an unreachable NATS to discarding OTP deliveries.
    pub async fn connect(args: &Args) -> Result<Self> {
        args.validate()?;
        let settings = CoreSettings::from_args(args)?;

        let store: Arc<dyn TrustStore> =
            match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
                Ok(client) => {
                    info!("MongoDB connected successfully");
                    Arc::new(MongoTrustStore::new(&client).await?)
                }
                Err(e) if args.dev_mode => {
                    warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                    Arc::new(MemoryStore::new())
                }
                Err(e) => {
                    error!("MongoDB connection failed: {}", e);
                    return Err(e);
                }
            };

        let notifier: Arc<dyn OtpNotifier> = match NatsClient::new(&args.nats, "notary").await {
            Ok(client) => {
                info!("NATS connected successfully");
                Arc::new(NatsOtpNotifier::new(client, args.otp_subject.clone()))
            }
            Err(e) if args.dev_mode => {
                warn!("NATS connection failed (dev mode, discarding OTP deliveries): {}", e);
                Arc::new(DiscardNotifier)
            }
            Err(e) => {
                error!("NATS connection failed: {}", e);
                return Err(e);
            }
        };

        Self::new(&settings, store, notifier, Arc::new(SystemClock))
    }
}
