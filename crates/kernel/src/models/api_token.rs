//! API tokens for bearer authentication.
//!
//! Only the SHA-256 hash of a token is ever stored. The raw value is handed
//! to the caller once, at issue time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// API token record (never contains the raw token).
#[derive(Debug, Clone, Serialize)]
pub struct ApiToken {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip)]
    pub token_hash: String,
    pub created: DateTime<Utc>,
}

impl ApiToken {
    /// Mint a token for a user. Returns the record and the raw token.
    pub fn issue(user_id: Uuid, now: DateTime<Utc>) -> (Self, String) {
        let raw = generate_token();
        let record = Self {
            id: Uuid::now_v7(),
            user_id,
            token_hash: hash_token(&raw),
            created: now,
        };
        (record, raw)
    }
}

/// Generate a 32-byte random hex token.
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// SHA-256 hash a token for storage.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
