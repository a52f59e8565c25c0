//! Order repository.
//!
//! Orders are keyed by their formatted order number, minted from the global
//! `order_number` sequence at creation time. The number's date stamp is the
//! creation date; the sequence itself never resets, so numbers are unique
//! without any per-day coordination.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;

use bottega_core::domain::{Order, OrderItem, OrderStatus};
use bottega_core::storage::{ErrorKind, RepositoryError, Result};

use crate::storage::dynamodb::{
    format_order_number, item_to_order, keys, order_to_item, Condition, DynamoClient, Item,
    QueryPage, QueryRequest, ReadConsistency, SequenceAllocator, COUNTER_ORDER_NUMBER,
};

use super::none_if_condition_failed;

#[derive(Debug, Clone)]
pub struct OrderRepository {
    client: DynamoClient,
    allocator: SequenceAllocator,
}

impl OrderRepository {
    pub fn new(client: DynamoClient) -> Self {
        let allocator = SequenceAllocator::new(client.clone());
        Self { client, allocator }
    }

    /// Places an order, consuming one value from the order-number sequence.
    ///
    /// An aborted create leaves a gap in the sequence, never a duplicate.
    pub async fn create(
        &self,
        user_id: Option<String>,
        items: Vec<OrderItem>,
        total_cents: i64,
        discount_code: Option<String>,
    ) -> Result<Order> {
        if items.is_empty() {
            return Err(RepositoryError::Validation(
                "An order needs at least one item".to_string(),
            ));
        }
        let now = Utc::now();
        let sequence = self.allocator.next_value(COUNTER_ORDER_NUMBER).await?;
        let order = Order {
            order_number: format_order_number(sequence, now),
            user_id,
            items,
            total_cents,
            discount_code,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let item = order_to_item(&order)?;
        self.client
            .put(item, Some(&Condition::item_absent()))
            .await
            .map_err(|error| {
                if error.kind == ErrorKind::ConditionFailed {
                    RepositoryError::AlreadyExists {
                        entity_type: "Order",
                        id: order.order_number.clone(),
                    }
                } else {
                    error.into()
                }
            })?;
        Ok(order)
    }

    pub async fn find_by_order_number(&self, order_number: &str) -> Result<Option<Order>> {
        let item = self
            .client
            .get(
                &keys::order_pk(order_number),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_order).transpose()
    }

    /// Moves an order to a new status. `Ok(None)` when the order is absent
    /// or soft-deleted.
    pub async fn update_status(
        &self,
        order_number: &str,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let result = self
            .client
            .update(
                &keys::order_pk(order_number),
                keys::METADATA_SK,
                vec![
                    (
                        "status".to_string(),
                        AttributeValue::S(status.as_str().to_string()),
                    ),
                    (
                        "updated_at".to_string(),
                        AttributeValue::S(Utc::now().to_rfc3339()),
                    ),
                ],
                &[],
                Some(&Condition::exists_and_not_deleted()),
            )
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_order)
            .transpose()
    }

    /// Lists a user's orders, paginated, excluding soft-deleted.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: Option<i32>,
        cursor: Option<Item>,
    ) -> Result<QueryPage<Order>> {
        let mut request = QueryRequest::new("GSI1PK = :pk")
            .on_index(keys::GSI1)
            .value(":pk", AttributeValue::S(keys::order_gsi1_pk(user_id)))
            .filter("attribute_not_exists(deleted_at)")
            .newest_first()
            .start_key(cursor);
        if let Some(limit) = limit {
            request = request.limit(limit);
        }
        let page = self.client.query(request).await?;
        page.try_map(item_to_order)
    }

    /// Soft-deletes an order (kept addressable for bookkeeping).
    pub async fn soft_delete(
        &self,
        order_number: &str,
        actor: Option<&str>,
    ) -> Result<Option<Order>> {
        let result = self
            .client
            .soft_delete(&keys::order_pk(order_number), keys::METADATA_SK, actor)
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_order)
            .transpose()
    }
}
