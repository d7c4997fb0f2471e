//! Shared types for the trust core

mod error;

pub use error::{Result, TrustError};
