use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sync state for a product mirrored to an Etsy listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtsyProduct {
    pub product_id: i64,
    pub listing_id: i64,
    pub shop_id: String,
    pub sync_state: String,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Sync state for an Etsy receipt imported as a local order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtsyReceipt {
    pub receipt_id: i64,
    pub shop_id: String,
    /// Local order number once the receipt has been imported.
    pub order_number: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// OAuth token material for one Etsy shop.
///
/// Upserted: replacing a token keeps the original `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtsyOauthToken {
    pub shop_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-shop sync configuration. Upserted like the token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtsySyncConfig {
    pub shop_id: String,
    pub sync_enabled: bool,
    pub sync_interval_minutes: i64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
