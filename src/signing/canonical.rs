//! Canonical serialization and content hashing.
//!
//! Identical logical content must always produce identical bytes, otherwise
//! signatures break on re-serialization. Rules:
//!
//! - object keys sorted by UTF-8 byte order, at every depth
//! - no whitespace between tokens
//! - strings escaped exactly as `serde_json` escapes them
//! - integers in plain decimal; non-integer numbers are rejected
//!   (decimal amounts travel as strings)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::types::{Result, TrustError};

/// Hex length of a SHA-256 digest
pub const CONTENT_HASH_HEX_LEN: usize = 64;

/// Maximum nesting depth accepted for canonicalization
pub const MAX_DEPTH: usize = 64;

/// Serialize `content` into its canonical byte form.
pub fn canonicalize(content: &JsonValue) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_value(content, &mut out, 0)?;
    Ok(out)
}

fn write_value(value: &JsonValue, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(TrustError::InvalidInput(format!(
            "content nests deeper than {MAX_DEPTH} levels"
        )));
    }

    match value {
        JsonValue::Null => out.extend_from_slice(b"null"),
        JsonValue::Bool(true) => out.extend_from_slice(b"true"),
        JsonValue::Bool(false) => out.extend_from_slice(b"false"),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                out.extend_from_slice(i.to_string().as_bytes());
            } else if let Some(u) = n.as_u64() {
                out.extend_from_slice(u.to_string().as_bytes());
            } else {
                return Err(TrustError::InvalidInput(
                    "non-integer numbers cannot be canonicalized; encode them as strings".into(),
                ));
            }
        }
        JsonValue::String(s) => write_string(s, out)?,
        JsonValue::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(item, out, depth + 1)?;
            }
            out.push(b']');
        }
        JsonValue::Object(map) => {
            let mut entries: Vec<(&String, &JsonValue)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_string(key, out)?;
                out.push(b':');
                write_value(item, out, depth + 1)?;
            }
            out.push(b'}');
        }
    }
    Ok(())
}

fn write_string(s: &str, out: &mut Vec<u8>) -> Result<()> {
    serde_json::to_writer(&mut *out, s)
        .map_err(|e| TrustError::Internal(format!("string encoding failed: {e}")))
}

// =============================================================================
// Content Hash
// =============================================================================

/// Lowercase hex SHA-256 of canonical content.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash canonical bytes.
    pub fn of_canonical(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Canonicalize and hash `content`.
    pub fn of_content(content: &JsonValue) -> Result<Self> {
        Ok(Self::of_canonical(&canonicalize(content)?))
    }

    /// Parse a 64-character hex digest. Uppercase input is normalised.
    pub fn parse(hex_digest: &str) -> Result<Self> {
        let trimmed = hex_digest.trim();
        if trimmed.len() != CONTENT_HASH_HEX_LEN
            || !trimmed.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(TrustError::InvalidInput(
                "content hash must be 64 hex characters".into(),
            ));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.0)
    }
}

impl FromStr for ContentHash {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = TrustError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}
