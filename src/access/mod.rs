//! Access tokens for gated document viewing
//!
//! A token is minted only after a successful OTP verification. It is a
//! bearer credential: whoever presents it may view the bound document until
//! it expires. Only the SHA-256 of the token is stored.

pub mod ledger;

pub use ledger::{
    hash_token, spawn_sweeper_task, AccessGrant, AccessToken, AccessTokenLedger,
    DEFAULT_ACCESS_TOKEN_TTL_SECS,
};
