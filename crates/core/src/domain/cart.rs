use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A shopping cart.
///
/// Carts belong to either an anonymous session or a signed-in user (or both,
/// after sign-in). Abandoned carts expire via the store's TTL mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Unix seconds after which the store purges the cart.
    pub expires_at: Option<i64>,
}

/// A line item inside a cart.
///
/// One line per (product, variant) pair; adding the same pair again merges
/// quantities into the existing line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub cart_id: Uuid,
    pub product_id: i64,
    pub variant_id: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of a best-effort multi-item operation (cart merge, bulk update).
///
/// Multi-step workflows here are not transactional: the caller learns how
/// many sub-operations applied and decides whether to reconcile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub applied: usize,
    pub failed: usize,
}
