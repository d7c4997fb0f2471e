//! Notary - document trust core
//!
//! Operator CLI over the configured store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, info};
use zeroize::Zeroizing;

use notary::{
    access::spawn_sweeper_task,
    config::Args,
    keys::PrivateKeyBundle,
    logging,
    signing::ContentHash,
    TrustCore,
};

/// Notary - key custody, sealed documents, signatures and OTP access
#[derive(Parser, Debug)]
#[command(name = "notary")]
#[command(about = "Document trust core: key custody, sealing, signing and OTP step-up access")]
struct Cli {
    #[command(flatten)]
    args: Args,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a key pair for an owner and print it once
    Keygen {
        #[arg(long)]
        owner: String,
    },

    /// Show an owner's active public key
    PublicKey {
        #[arg(long)]
        owner: String,
        /// List every recorded key, newest first
        #[arg(long)]
        all: bool,
    },

    /// Seal a file to an owner's active key and store it
    Encrypt {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        document: String,
        /// File with the payload bytes
        #[arg(long)]
        input: PathBuf,
    },

    /// Open a stored document with a private key
    Decrypt {
        #[arg(long)]
        document: String,
        /// File holding the base64 private key bundle
        #[arg(long)]
        private_key_file: PathBuf,
        /// Write the payload here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Sign JSON content as an issuer and record the signature
    Sign {
        #[arg(long)]
        issuer: String,
        #[arg(long)]
        document: String,
        /// File with the JSON content
        #[arg(long)]
        input: PathBuf,
        /// File holding the base64 private key bundle
        #[arg(long)]
        private_key_file: PathBuf,
    },

    /// Check JSON content against a document's recorded signature
    Verify {
        #[arg(long)]
        document: String,
        /// File with the JSON content
        #[arg(long)]
        input: PathBuf,
    },

    /// Build the verification URL for a content hash
    Link {
        #[arg(long)]
        hash: String,
    },

    /// Issue a one-time code for an email and document
    OtpRequest {
        #[arg(long)]
        email: String,
        #[arg(long)]
        document: String,
    },

    /// Exchange a one-time code for an access token
    OtpVerify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        document: String,
        #[arg(long)]
        code: String,
    },

    /// Resolve an access token to its grant
    TokenValidate {
        #[arg(long)]
        token: String,
    },

    /// Revoke an access token
    TokenRevoke {
        #[arg(long)]
        token: String,
    },

    /// Purge expired codes and tokens
    Sweep {
        /// Keep running, sweeping every N seconds
        #[arg(long)]
        every: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(&cli.args.log_level, cli.args.log_json);

    if let Err(e) = cli.args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Mode: {}", if cli.args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });

    let core = TrustCore::connect(&cli.args).await?;
    run(core, cli.command).await
}

async fn run(core: TrustCore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Keygen { owner } => {
            let pair = core.vault.generate_key_pair(&owner).await?;
            let private_key = pair.private_key.to_base64();
            print_json(&serde_json::json!({
                "owner_id": pair.owner_id,
                "public_key": pair.public_key,
                "private_key": private_key.as_str(),
                "created_at": pair.created_at,
            }))?;
        }
        Command::PublicKey { owner, all } => {
            if all {
                print_json(&core.vault.list_public_keys(&owner).await?)?;
            } else {
                print_json(&core.vault.get_active_public_key(&owner).await?)?;
            }
        }
        Command::Encrypt {
            owner,
            document,
            input,
        } => {
            let payload = tokio::fs::read(&input).await?;
            let sealed = core.cipher.seal_document(&document, &owner, &payload).await?;
            print_json(&sealed)?;
        }
        Command::Decrypt {
            document,
            private_key_file,
            output,
        } => {
            let key = read_private_key(&private_key_file).await?;
            let payload = Zeroizing::new(core.cipher.open_document(&document, &key).await?);
            match output {
                Some(path) => tokio::fs::write(path, payload.as_slice()).await?,
                None => println!("{}", String::from_utf8_lossy(&payload)),
            }
        }
        Command::Sign {
            issuer,
            document,
            input,
            private_key_file,
        } => {
            let content = read_json(&input).await?;
            let key = read_private_key(&private_key_file).await?;
            let record = core
                .signer
                .sign_document(&document, &issuer, &content, &key)
                .await?;
            let reference = core.linker.build_reference(&record.content_hash);
            print_json(&serde_json::json!({
                "signature": record,
                "reference": reference,
            }))?;
        }
        Command::Verify { document, input } => {
            let content = read_json(&input).await?;
            print_json(&core.signer.verify_document(&document, &content).await?)?;
        }
        Command::Link { hash } => {
            let hash = ContentHash::parse(&hash)?;
            print_json(&core.linker.build_reference(&hash))?;
        }
        Command::OtpRequest { email, document } => {
            print_json(&core.otp.request_code(&email, &document).await?)?;
        }
        Command::OtpVerify {
            email,
            document,
            code,
        } => {
            print_json(&core.otp.verify_code(&email, &document, &code).await?)?;
        }
        Command::TokenValidate { token } => {
            print_json(&core.ledger.validate(&token).await?)?;
        }
        Command::TokenRevoke { token } => {
            let revoked = core.ledger.revoke(&token).await?;
            print_json(&serde_json::json!({ "revoked": revoked }))?;
        }
        Command::Sweep { every } => match every {
            Some(secs) => {
                let interval = Duration::from_secs(secs.max(1));
                spawn_sweeper_task(core.ledger.clone(), interval).await?;
            }
            None => print_json(&core.ledger.purge_expired().await?)?,
        },
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn read_json(path: &Path) -> anyhow::Result<JsonValue> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_private_key(path: &Path) -> anyhow::Result<PrivateKeyBundle> {
    let encoded = Zeroizing::new(tokio::fs::read_to_string(path).await?);
    Ok(PrivateKeyBundle::from_base64(encoded.trim())?)
}
