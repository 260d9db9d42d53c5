//! Saved listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A (user, listing) pair, unique per pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WishlistEntry {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "ad")]
    pub ad_id: Uuid,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWishlistEntry {
    #[serde(alias = "ad_id")]
    pub ad: Uuid,
}

impl WishlistEntry {
    pub fn new(user_id: Uuid, ad_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            ad_id,
            added_at: now,
        }
    }
}
