//! Monotonic sequence allocation.
//!
//! Numeric entity identifiers and order numbers come from named counter
//! items under a single `COUNTER` partition. Each allocation is one atomic
//! increment, so concurrent allocators never observe the same value. Gaps
//! can appear when a caller aborts after allocating, which is acceptable.

use chrono::{DateTime, Utc};

use bottega_core::storage::Result;

use super::client::DynamoClient;
use super::keys;

/// Counter names, one per sequence.
pub const COUNTER_PRODUCT_ID: &str = "product_id";
pub const COUNTER_DISCOUNT_ID: &str = "discount_id";
pub const COUNTER_PERSONAGGIO_ID: &str = "personaggio_id";
pub const COUNTER_ORDER_NUMBER: &str = "order_number";

/// Hands out values from named counters stored in the table itself.
#[derive(Debug, Clone)]
pub struct SequenceAllocator {
    client: DynamoClient,
}

impl SequenceAllocator {
    pub fn new(client: DynamoClient) -> Self {
        Self { client }
    }

    /// Allocate the next value of the named sequence.
    ///
    /// A counter that does not exist yet starts at zero, so the first
    /// allocated value is 1.
    pub async fn next_value(&self, name: &str) -> Result<i64> {
        let value = self
            .client
            .increment(keys::COUNTER_PK, name, "value", 1)
            .await?;
        Ok(value)
    }
}

/// Format an order number from a sequence value and the order's creation
/// time: `ORD-YYYYMMDD-NNNN`.
///
/// The date stamp reflects when the order was placed; the sequence is a
/// single global counter and does not reset per day, so numbers stay unique
/// across date boundaries without coordination.
pub fn format_order_number(sequence: i64, at: DateTime<Utc>) -> String {
    format!("ORD-{}-{:04}", at.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_order_number() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_order_number(42, at), "ORD-20240115-0042");
    }

    #[test]
    fn test_format_order_number_pads_to_four_digits() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(format_order_number(7, at), "ORD-20240301-0007");
        assert_eq!(format_order_number(12345, at), "ORD-20240301-12345");
    }

    #[test]
    fn test_format_order_number_keeps_global_sequence_across_days() {
        let monday = Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 0).unwrap();
        let tuesday = Utc.with_ymd_and_hms(2024, 1, 16, 0, 1, 0).unwrap();
        assert_eq!(format_order_number(99, monday), "ORD-20240115-0099");
        assert_eq!(format_order_number(100, tuesday), "ORD-20240116-0100");
    }
}
