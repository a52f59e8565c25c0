//! Discount code repository.
//!
//! Codes are normalized to uppercase and validated before any store call.
//! Redemption accounting is a single conditional write that folds the usage
//! cap, active flag, and soft-delete check into one precondition, so the
//! counter can never pass the cap no matter how many callers race.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};

use bottega_core::domain::{DiscountCode, DiscountKind};
use bottega_core::storage::{ErrorKind, RepositoryError, Result};

use crate::storage::dynamodb::{
    discount_to_item, item_to_discount, keys, Condition, DynamoClient, QueryPage, QueryRequest,
    ReadConsistency, SequenceAllocator, COUNTER_DISCOUNT_ID,
};

use super::none_if_condition_failed;

const CODE_MIN_LEN: usize = 3;
const CODE_MAX_LEN: usize = 32;

/// Validates a normalized code: `[A-Z0-9_-]{3,32}`.
fn validate_code(code: &str) -> Result<()> {
    let len_ok = (CODE_MIN_LEN..=CODE_MAX_LEN).contains(&code.len());
    let chars_ok = code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if len_ok && chars_ok {
        Ok(())
    } else {
        Err(RepositoryError::Validation(format!(
            "Invalid discount code: {code}"
        )))
    }
}

#[derive(Debug, Clone)]
pub struct DiscountRepository {
    client: DynamoClient,
    allocator: SequenceAllocator,
}

impl DiscountRepository {
    pub fn new(client: DynamoClient) -> Self {
        let allocator = SequenceAllocator::new(client.clone());
        Self { client, allocator }
    }

    /// Creates a code. `AlreadyExists` when the code is already taken.
    ///
    /// The code-uniqueness check reads the GSI before the write; two
    /// simultaneous creates of the same code can both pass it, in which case
    /// `find_by_code` resolves to one winner and the loser's row is inert.
    pub async fn create(
        &self,
        code: &str,
        kind: DiscountKind,
        value: i64,
        max_uses: Option<i64>,
        valid_from: Option<DateTime<Utc>>,
        valid_until: Option<DateTime<Utc>>,
    ) -> Result<DiscountCode> {
        let code = code.to_ascii_uppercase();
        validate_code(&code)?;
        if value <= 0 {
            return Err(RepositoryError::Validation(format!(
                "Discount value must be positive, got {value}"
            )));
        }
        if self.find_by_code(&code).await?.is_some() {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "DiscountCode",
                id: code,
            });
        }
        let id = self.allocator.next_value(COUNTER_DISCOUNT_ID).await?;
        let now = Utc::now();
        let discount = DiscountCode {
            id,
            code,
            kind,
            value,
            active: true,
            times_used: 0,
            max_uses,
            valid_from,
            valid_until,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.client
            .put(discount_to_item(&discount), Some(&Condition::item_absent()))
            .await
            .map_err(|error| {
                if error.kind == ErrorKind::ConditionFailed {
                    RepositoryError::AlreadyExists {
                        entity_type: "DiscountCode",
                        id: discount.code.clone(),
                    }
                } else {
                    error.into()
                }
            })?;
        Ok(discount)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<DiscountCode>> {
        let item = self
            .client
            .get(
                &keys::discount_pk(id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_discount).transpose()
    }

    /// Code lookup via GSI1. The code is normalized before the query, so
    /// lookups are case-insensitive.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<DiscountCode>> {
        let code = code.to_ascii_uppercase();
        validate_code(&code)?;
        let page = self
            .client
            .query(
                QueryRequest::new("GSI1PK = :pk")
                    .on_index(keys::GSI1)
                    .value(":pk", AttributeValue::S(keys::discount_gsi1_pk(&code)))
                    .filter("attribute_not_exists(deleted_at)")
                    .limit(1),
            )
            .await?;
        page.items.first().map(item_to_discount).transpose()
    }

    /// Lists currently active codes, newest first.
    ///
    /// Active here means the `active` flag; callers still need
    /// [`DiscountCode::is_redeemable`] to check validity windows and caps.
    pub async fn list_active(
        &self,
        limit: Option<i32>,
        cursor: Option<crate::storage::dynamodb::Item>,
    ) -> Result<QueryPage<DiscountCode>> {
        let mut request = QueryRequest::new("GSI2PK = :pk")
            .on_index(keys::GSI2)
            .value(":pk", AttributeValue::S(keys::discount_gsi2_pk(true)))
            .filter("attribute_not_exists(deleted_at)")
            .newest_first()
            .start_key(cursor);
        if let Some(limit) = limit {
            request = request.limit(limit);
        }
        let page = self.client.query(request).await?;
        page.try_map(item_to_discount)
    }

    /// Whether a code would be accepted right now: present, active, not
    /// deleted, inside its validity window, under its usage cap.
    ///
    /// Advisory only; [`increment_usage`](Self::increment_usage) re-checks
    /// everything atomically at redemption time.
    pub async fn is_valid(&self, code: &str) -> Result<bool> {
        let discount = self.find_by_code(code).await?;
        Ok(discount.is_some_and(|d| d.is_redeemable(Utc::now())))
    }

    /// Consumes one use of the code.
    ///
    /// One conditional write: the precondition requires active, not deleted,
    /// and `times_used < max_uses` when a cap exists, so the counter stops
    /// exactly at the cap. `Ok(None)` means the code was not redeemable or a
    /// concurrent redemption took the last use.
    pub async fn increment_usage(&self, code: &str) -> Result<Option<DiscountCode>> {
        let Some(discount) = self.find_by_code(code).await? else {
            return Ok(None);
        };
        let condition = Condition::new(
            "#active = :true AND attribute_not_exists(deleted_at) \
             AND (attribute_not_exists(max_uses) OR times_used < max_uses)",
        )
        .name("#active", "active")
        .value(":true", AttributeValue::Bool(true));
        let result = self
            .client
            .update_with_expression(
                &keys::discount_pk(discount.id),
                keys::METADATA_SK,
                "SET times_used = times_used + :one, updated_at = :now",
                vec![
                    (":one".to_string(), AttributeValue::N("1".to_string())),
                    (
                        ":now".to_string(),
                        AttributeValue::S(Utc::now().to_rfc3339()),
                    ),
                ],
                Some(&condition),
            )
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_discount)
            .transpose()
    }

    /// Turns a code off. `Ok(None)` when absent. The GSI active projection
    /// moves in the same write.
    pub async fn deactivate(&self, code: &str) -> Result<Option<DiscountCode>> {
        let Some(discount) = self.find_by_code(code).await? else {
            return Ok(None);
        };
        let result = self
            .client
            .update(
                &keys::discount_pk(discount.id),
                keys::METADATA_SK,
                vec![
                    ("active".to_string(), AttributeValue::Bool(false)),
                    (
                        "GSI2PK".to_string(),
                        AttributeValue::S(keys::discount_gsi2_pk(false)),
                    ),
                    (
                        "updated_at".to_string(),
                        AttributeValue::S(Utc::now().to_rfc3339()),
                    ),
                ],
                &[],
                Some(&Condition::item_exists()),
            )
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_discount)
            .transpose()
    }

    /// Soft-deletes a code by id.
    pub async fn soft_delete(&self, id: i64, actor: Option<&str>) -> Result<Option<DiscountCode>> {
        let result = self
            .client
            .soft_delete(&keys::discount_pk(id), keys::METADATA_SK, actor)
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_discount)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_code_accepts_expected_shapes() {
        assert!(validate_code("SAVE20").is_ok());
        assert!(validate_code("ABC").is_ok());
        assert!(validate_code("BLACK-FRIDAY_2024").is_ok());
        assert!(validate_code(&"A".repeat(32)).is_ok());
    }

    #[test]
    fn test_validate_code_rejects_bad_shapes() {
        assert!(validate_code("AB").is_err());
        assert!(validate_code(&"A".repeat(33)).is_err());
        assert!(validate_code("save20").is_err());
        assert!(validate_code("SAVE 20").is_err());
        assert!(validate_code("SAVE%20").is_err());
        assert!(validate_code("").is_err());
    }
}
