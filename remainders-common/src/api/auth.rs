//! Shared-secret request signing
//!
//! Every protected request carries `timestamp` (Unix epoch ms) and `hash`
//! query parameters. The hash is SHA-256 over the canonical JSON of
//! `{"hash": <64 zeros>, "timestamp": <ts>}` followed by the shared secret in
//! decimal, hex encoded. Timestamps are accepted up to 1000 ms in the past and
//! 1 ms in the future. A shared secret of 0 disables the check.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Accepted request age
pub const MAX_PAST_MS: i64 = 1000;

/// Accepted clock skew into the future
pub const MAX_FUTURE_MS: i64 = 1;

const HASH_PLACEHOLDER: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Authentication failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    #[error("Invalid timestamp: {reason}")]
    InvalidTimestamp { timestamp: i64, now: i64, reason: String },

    #[error("Invalid hash")]
    InvalidHash { provided: String, calculated: String },

    #[error("Missing timestamp field")]
    MissingTimestamp,

    #[error("Missing hash field")]
    MissingHash,
}

/// Authentication query parameters of a GET request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignedQuery {
    /// Unix epoch time in milliseconds
    pub timestamp: i64,

    /// SHA-256 hash (64 hex chars)
    pub hash: String,
}

impl SignedQuery {
    /// Sign `timestamp` with `shared_secret` (client side, and tests)
    pub fn sign(timestamp: i64, shared_secret: i64) -> Self {
        Self {
            timestamp,
            hash: request_hash(timestamp, shared_secret),
        }
    }

    /// Verify against the current clock
    pub fn verify(&self, shared_secret: i64) -> Result<(), ApiAuthError> {
        verify_timestamp(self.timestamp, now_millis())?;
        verify_hash(&self.hash, self.timestamp, shared_secret)
    }
}

/// Current Unix time in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Check `timestamp` against `now` using the accepted window
pub fn verify_timestamp(timestamp: i64, now: i64) -> Result<(), ApiAuthError> {
    let age = now - timestamp;

    if age > MAX_PAST_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!("Timestamp {}ms too old (max {}ms past)", age, MAX_PAST_MS),
        });
    }
    if age < -MAX_FUTURE_MS {
        return Err(ApiAuthError::InvalidTimestamp {
            timestamp,
            now,
            reason: format!(
                "Timestamp {}ms in future (max {}ms future)",
                -age, MAX_FUTURE_MS
            ),
        });
    }
    Ok(())
}

/// Expected hash for a signed GET request
pub fn request_hash(timestamp: i64, shared_secret: i64) -> String {
    let body = json!({
        "timestamp": timestamp,
        "hash": HASH_PLACEHOLDER,
    });

    let mut hasher = Sha256::new();
    hasher.update(to_canonical_json(&body).as_bytes());
    hasher.update(shared_secret.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compare a provided hash with the expected one
pub fn verify_hash(provided: &str, timestamp: i64, shared_secret: i64) -> Result<(), ApiAuthError> {
    let calculated = request_hash(timestamp, shared_secret);
    if provided != calculated {
        return Err(ApiAuthError::InvalidHash {
            provided: provided.to_string(),
            calculated,
        });
    }
    Ok(())
}

/// JSON with object keys sorted and no whitespace
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), to_canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        other => other.to_string(),
    }
}
