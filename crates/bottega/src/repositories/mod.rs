//! Entity repositories.
//!
//! One repository per aggregate, all built on the same
//! [`DynamoClient`](crate::storage::dynamodb::DynamoClient). Repositories own
//! the conditional-write discipline: creates guard on key absence, updates on
//! key existence, and a failed precondition on a read-modify path surfaces as
//! `Ok(None)` rather than an error, so callers can treat "wasn't there" and
//! "condition lost" uniformly.

pub mod audit;
pub mod cart;
pub mod discount;
pub mod etsy;
pub mod notification;
pub mod order;
pub mod personaggio;
pub mod product;

pub use audit::{AuditLogRepository, AuditPage};
pub use cart::CartRepository;
pub use discount::DiscountRepository;
pub use etsy::EtsyRepository;
pub use notification::NotificationRepository;
pub use order::OrderRepository;
pub use personaggio::{PersonaggioRepository, PositionMove};
pub use product::{ProductRepository, ProductUpdate};

use bottega_core::storage::{ErrorKind, StoreError};

/// Collapses a lost conditional write into `None`.
///
/// Every other error propagates untouched.
pub(crate) fn none_if_condition_failed<T>(
    result: Result<T, StoreError>,
) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.kind == ErrorKind::ConditionFailed => Ok(None),
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_failed_becomes_none() {
        let result: Result<i64, StoreError> =
            Err(StoreError::new(ErrorKind::ConditionFailed, "lost the race"));
        assert_eq!(none_if_condition_failed(result).unwrap(), None);
    }

    #[test]
    fn test_other_errors_propagate() {
        let result: Result<i64, StoreError> =
            Err(StoreError::new(ErrorKind::Throttled, "slow down"));
        assert!(none_if_condition_failed(result).is_err());
    }

    #[test]
    fn test_success_becomes_some() {
        let result: Result<i64, StoreError> = Ok(7);
        assert_eq!(none_if_condition_failed(result).unwrap(), Some(7));
    }
}
