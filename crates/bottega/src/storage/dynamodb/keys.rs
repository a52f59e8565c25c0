//! Composite-key generation functions.
//!
//! Pure functions for generating partition and sort keys following the
//! single-table design. All functions are sync and have no side effects.
//!
//! Singleton entity records use `SK = "METADATA"`; sub-items (variants,
//! cart lines, per-user notifications) use a typed SK prefix under the
//! owning partition.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

// ============================================================================
// Key prefixes
// ============================================================================

pub const PRODUCT_PREFIX: &str = "PRODUCT#";
pub const VARIANT_PREFIX: &str = "VARIANT#";
pub const ORDER_PREFIX: &str = "ORDER#";
pub const CART_PREFIX: &str = "CART#";
pub const CART_ITEM_PREFIX: &str = "ITEM#";
pub const DISCOUNT_PREFIX: &str = "DISCOUNT#";
pub const NOTIFICATION_PREFIX: &str = "NOTIFICATION#";
pub const NOTIF_ITEM_PREFIX: &str = "NOTIF#";
pub const AUDIT_PREFIX: &str = "AUDIT#";
pub const ETSY_PRODUCT_PREFIX: &str = "ETSY_PRODUCT#";
pub const ETSY_RECEIPT_PREFIX: &str = "ETSY_RECEIPT#";
pub const ETSY_TOKEN_PREFIX: &str = "ETSY_TOKEN#";
pub const ETSY_SYNC_CONFIG_PREFIX: &str = "ETSY_SYNC_CONFIG#";
pub const PERSONAGGIO_PREFIX: &str = "PERSONAGGIO#";

pub const COUNTER_PK: &str = "COUNTER";
pub const METADATA_SK: &str = "METADATA";

// ============================================================================
// Index names
// ============================================================================

pub const GSI1: &str = "GSI1";
pub const GSI2: &str = "GSI2";
pub const GSI3: &str = "GSI3";

// ============================================================================
// Product keys
// ============================================================================

/// Pattern: `PRODUCT#<id>`
pub fn product_pk(id: i64) -> String {
    format!("{PRODUCT_PREFIX}{id}")
}

/// GSI1 partition key for slug lookup.
///
/// Pattern: `PRODUCT_SLUG#<slug>`
pub fn product_gsi1_pk(slug: &str) -> String {
    format!("PRODUCT_SLUG#{slug}")
}

/// GSI2 partition key for status listing.
///
/// Pattern: `PRODUCT_STATUS#<status>`
pub fn product_gsi2_pk(status: &str) -> String {
    format!("PRODUCT_STATUS#{status}")
}

/// GSI3 partition key for character association (sparse).
///
/// Pattern: `CHARACTER#<personaggio_id>`
pub fn product_gsi3_pk(personaggio_id: i64) -> String {
    format!("CHARACTER#{personaggio_id}")
}

/// Pattern: `VARIANT#<variant_id>`
pub fn variant_sk(variant_id: &str) -> String {
    format!("{VARIANT_PREFIX}{variant_id}")
}

// ============================================================================
// Order keys
// ============================================================================

/// Pattern: `ORDER#<order_number>`
pub fn order_pk(order_number: &str) -> String {
    format!("{ORDER_PREFIX}{order_number}")
}

/// GSI1 partition for a user's orders. Sparse: guest orders carry no user
/// and never appear on this index.
pub fn order_gsi1_pk(user_id: &str) -> String {
    format!("ORDER_USER#{user_id}")
}

// ============================================================================
// Cart keys
// ============================================================================

/// Pattern: `CART#<cart_id>`
pub fn cart_pk(cart_id: Uuid) -> String {
    format!("{CART_PREFIX}{cart_id}")
}

/// Cart line sort key.
///
/// Pattern: `ITEM#<product_id>#<variant_id>`; variant-less lines use `BASE`
/// so one (product, variant) pair always maps to exactly one line.
pub fn cart_item_sk(product_id: i64, variant_id: Option<&str>) -> String {
    format!(
        "{CART_ITEM_PREFIX}{product_id}#{}",
        variant_id.unwrap_or("BASE")
    )
}

/// GSI1 partition key for session lookup.
///
/// Pattern: `CART_SESSION#<session_id>`
pub fn cart_gsi1_pk(session_id: &str) -> String {
    format!("CART_SESSION#{session_id}")
}

/// GSI2 partition key for user lookup (sparse).
///
/// Pattern: `CART_USER#<user_id>`
pub fn cart_gsi2_pk(user_id: &str) -> String {
    format!("CART_USER#{user_id}")
}

// ============================================================================
// Discount keys
// ============================================================================

/// Pattern: `DISCOUNT#<id>`
pub fn discount_pk(id: i64) -> String {
    format!("{DISCOUNT_PREFIX}{id}")
}

/// GSI1 partition key for code lookup.
///
/// Pattern: `DISCOUNT_CODE#<code>`
pub fn discount_gsi1_pk(code: &str) -> String {
    format!("DISCOUNT_CODE#{code}")
}

/// GSI2 partition key for active listing.
///
/// Pattern: `DISCOUNT_ACTIVE#<bool>`
pub fn discount_gsi2_pk(active: bool) -> String {
    format!("DISCOUNT_ACTIVE#{active}")
}

// ============================================================================
// Notification keys
// ============================================================================

/// Notifications are partitioned per user.
///
/// Pattern: `NOTIFICATION#<user_id>`
pub fn notification_pk(user_id: &str) -> String {
    format!("{NOTIFICATION_PREFIX}{user_id}")
}

/// Notification sort key, creation-time ordered within the partition.
///
/// Pattern: `NOTIF#<rfc3339 created_at>#<id>`
pub fn notification_sk(created_at: DateTime<Utc>, id: Uuid) -> String {
    format!("{NOTIF_ITEM_PREFIX}{}#{id}", created_at.to_rfc3339())
}

/// GSI1 partition key for read-state lookup.
///
/// Pattern: `NOTIFICATION_READ#<bool>`
pub fn notification_gsi1_pk(read: bool) -> String {
    format!("NOTIFICATION_READ#{read}")
}

// ============================================================================
// Audit keys
// ============================================================================

/// Audit rows are partitioned by the UTC calendar date of their creation.
///
/// Pattern: `AUDIT#<YYYY-MM-DD>`
pub fn audit_pk(date: NaiveDate) -> String {
    format!("{AUDIT_PREFIX}{}", date.format("%Y-%m-%d"))
}

/// Audit sort key, creation-time ordered within the day partition.
///
/// Pattern: `<rfc3339 created_at>#<id>`
pub fn audit_sk(created_at: DateTime<Utc>, id: Uuid) -> String {
    format!("{}#{id}", created_at.to_rfc3339())
}

/// GSI1 partition key for entity-history lookup.
///
/// Pattern: `AUDIT_ENTITY#<entity_type>#<entity_id>`
pub fn audit_gsi1_pk(entity_type: &str, entity_id: &str) -> String {
    format!("AUDIT_ENTITY#{entity_type}#{entity_id}")
}

/// GSI2 partition key for actor-history lookup.
///
/// Pattern: `AUDIT_USER#<user_id>`
pub fn audit_gsi2_pk(user_id: &str) -> String {
    format!("AUDIT_USER#{user_id}")
}

// ============================================================================
// Etsy keys
// ============================================================================

/// Pattern: `ETSY_PRODUCT#<product_id>`
pub fn etsy_product_pk(product_id: i64) -> String {
    format!("{ETSY_PRODUCT_PREFIX}{product_id}")
}

/// GSI1 partition key for listing lookup.
///
/// Pattern: `ETSY_LISTING#<listing_id>`
pub fn etsy_product_gsi1_pk(listing_id: i64) -> String {
    format!("ETSY_LISTING#{listing_id}")
}

/// Pattern: `ETSY_RECEIPT#<receipt_id>`
pub fn etsy_receipt_pk(receipt_id: i64) -> String {
    format!("{ETSY_RECEIPT_PREFIX}{receipt_id}")
}

/// GSI1 partition key for receipt-by-order lookup.
///
/// Pattern: `ETSY_ORDER#<receipt_id>`
pub fn etsy_receipt_gsi1_pk(receipt_id: i64) -> String {
    format!("ETSY_ORDER#{receipt_id}")
}

/// Pattern: `ETSY_TOKEN#<shop_id>`
pub fn etsy_token_pk(shop_id: &str) -> String {
    format!("{ETSY_TOKEN_PREFIX}{shop_id}")
}

/// Pattern: `ETSY_SYNC_CONFIG#<shop_id>`
pub fn etsy_sync_config_pk(shop_id: &str) -> String {
    format!("{ETSY_SYNC_CONFIG_PREFIX}{shop_id}")
}

// ============================================================================
// Personaggio keys
// ============================================================================

/// Pattern: `PERSONAGGIO#<id>`
pub fn personaggio_pk(id: i64) -> String {
    format!("{PERSONAGGIO_PREFIX}{id}")
}

/// GSI1 partition key for position lookup.
///
/// Pattern: `PERSONAGGIO_ORDER#<position>` (zero-padded to keep the index
/// keys lexicographically ordered).
pub fn personaggio_gsi1_pk(position: i64) -> String {
    format!("PERSONAGGIO_ORDER#{position:04}")
}

/// GSI2 partition key: one constant partition holding every personaggio,
/// sorted by position for the ordered listing.
pub fn personaggio_gsi2_pk() -> &'static str {
    "PERSONAGGIO"
}

/// GSI2 sort key.
///
/// Pattern: `<position zero-padded>#<id>`
pub fn personaggio_gsi2_sk(position: i64, id: i64) -> String {
    format!("{position:04}#{id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_product_keys() {
        assert_eq!(product_pk(42), "PRODUCT#42");
        assert_eq!(product_gsi1_pk("red-mug"), "PRODUCT_SLUG#red-mug");
        assert_eq!(product_gsi2_pk("active"), "PRODUCT_STATUS#active");
        assert_eq!(product_gsi3_pk(7), "CHARACTER#7");
        assert_eq!(variant_sk("xl-blue"), "VARIANT#xl-blue");
    }

    #[test]
    fn test_order_key() {
        assert_eq!(order_pk("ORD-20240115-0042"), "ORDER#ORD-20240115-0042");
    }

    #[test]
    fn test_cart_keys() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap();
        assert_eq!(cart_pk(id), "CART#550e8400-e29b-41d4-a716-446655440001");
        assert_eq!(cart_item_sk(3, Some("small")), "ITEM#3#small");
        assert_eq!(cart_item_sk(3, None), "ITEM#3#BASE");
        assert_eq!(cart_gsi1_pk("sess-abc"), "CART_SESSION#sess-abc");
        assert_eq!(cart_gsi2_pk("user-9"), "CART_USER#user-9");
    }

    #[test]
    fn test_discount_keys() {
        assert_eq!(discount_pk(5), "DISCOUNT#5");
        assert_eq!(discount_gsi1_pk("SAVE20"), "DISCOUNT_CODE#SAVE20");
        assert_eq!(discount_gsi2_pk(true), "DISCOUNT_ACTIVE#true");
        assert_eq!(discount_gsi2_pk(false), "DISCOUNT_ACTIVE#false");
    }

    #[test]
    fn test_notification_keys() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440002").unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(notification_pk("user-9"), "NOTIFICATION#user-9");
        assert_eq!(
            notification_sk(at, id),
            "NOTIF#2024-01-15T10:30:00+00:00#550e8400-e29b-41d4-a716-446655440002"
        );
        assert_eq!(notification_gsi1_pk(false), "NOTIFICATION_READ#false");
    }

    #[test]
    fn test_audit_keys() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(audit_pk(date), "AUDIT#2024-01-15");
        assert_eq!(audit_gsi1_pk("product", "42"), "AUDIT_ENTITY#product#42");
        assert_eq!(audit_gsi2_pk("user-9"), "AUDIT_USER#user-9");
    }

    #[test]
    fn test_audit_sk_sorts_by_creation_time() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440003").unwrap();
        let earlier = audit_sk(Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(), id);
        let later = audit_sk(Utc.with_ymd_and_hms(2024, 1, 15, 17, 0, 0).unwrap(), id);
        assert!(earlier < later);
    }

    #[test]
    fn test_etsy_keys() {
        assert_eq!(etsy_product_pk(42), "ETSY_PRODUCT#42");
        assert_eq!(etsy_product_gsi1_pk(998877), "ETSY_LISTING#998877");
        assert_eq!(etsy_receipt_pk(1234), "ETSY_RECEIPT#1234");
        assert_eq!(etsy_receipt_gsi1_pk(1234), "ETSY_ORDER#1234");
        assert_eq!(etsy_token_pk("shop-1"), "ETSY_TOKEN#shop-1");
        assert_eq!(etsy_sync_config_pk("shop-1"), "ETSY_SYNC_CONFIG#shop-1");
    }

    #[test]
    fn test_personaggio_keys() {
        assert_eq!(personaggio_pk(3), "PERSONAGGIO#3");
        assert_eq!(personaggio_gsi1_pk(12), "PERSONAGGIO_ORDER#0012");
        assert_eq!(personaggio_gsi2_sk(12, 3), "0012#3");
    }

    #[test]
    fn test_personaggio_positions_order_lexicographically() {
        assert!(personaggio_gsi1_pk(2) < personaggio_gsi1_pk(10));
        assert!(personaggio_gsi2_sk(2, 1) < personaggio_gsi2_sk(10, 1));
    }
}
