//! Shopping cart repository.
//!
//! A cart partition holds a `METADATA` singleton plus one `ITEM#` row per
//! (product, variant) line. Adding a pair that already has a line merges
//! quantities into it instead of creating a second line. Carts are the one
//! place hard deletes happen: expired or merged-away rows are removed, and
//! abandoned carts fall to the store's TTL purge.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use futures_util::future::join_all;
use uuid::Uuid;

use bottega_core::domain::{BulkOutcome, Cart, CartItem};
use bottega_core::storage::{calculate_ttl, RepositoryError, Result};

use crate::storage::dynamodb::{
    cart_item_to_item, cart_to_item, item_to_cart, item_to_cart_item, keys, Condition,
    DynamoClient, QueryRequest, ReadConsistency,
};

use super::none_if_condition_failed;

/// Days before an untouched cart expires via TTL.
const CART_TTL_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct CartRepository {
    client: DynamoClient,
}

impl CartRepository {
    pub fn new(client: DynamoClient) -> Self {
        Self { client }
    }

    /// Creates an empty cart for a session, a user, or both.
    pub async fn create(
        &self,
        session_id: Option<String>,
        user_id: Option<String>,
    ) -> Result<Cart> {
        if session_id.is_none() && user_id.is_none() {
            return Err(RepositoryError::Validation(
                "A cart needs a session or a user".to_string(),
            ));
        }
        let now = Utc::now();
        let cart = Cart {
            id: Uuid::new_v4(),
            session_id,
            user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            expires_at: Some(calculate_ttl(now, CART_TTL_DAYS)),
        };
        self.client
            .put(cart_to_item(&cart), Some(&Condition::item_absent()))
            .await?;
        Ok(cart)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Cart>> {
        let item = self
            .client
            .get(
                &keys::cart_pk(id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_cart).transpose()
    }

    /// Session lookup over the sparse GSI1; carts without a session never
    /// appear on this index.
    pub async fn find_by_session(&self, session_id: &str) -> Result<Option<Cart>> {
        let page = self
            .client
            .query(
                QueryRequest::new("GSI1PK = :pk")
                    .on_index(keys::GSI1)
                    .value(":pk", AttributeValue::S(keys::cart_gsi1_pk(session_id)))
                    .filter("attribute_not_exists(deleted_at)")
                    .limit(1),
            )
            .await?;
        page.items.first().map(item_to_cart).transpose()
    }

    /// User lookup over the sparse GSI2.
    pub async fn find_by_user(&self, user_id: &str) -> Result<Option<Cart>> {
        let page = self
            .client
            .query(
                QueryRequest::new("GSI2PK = :pk")
                    .on_index(keys::GSI2)
                    .value(":pk", AttributeValue::S(keys::cart_gsi2_pk(user_id)))
                    .filter("attribute_not_exists(deleted_at)")
                    .limit(1),
            )
            .await?;
        page.items.first().map(item_to_cart).transpose()
    }

    /// Adds a line to the cart, merging into an existing line for the same
    /// (product, variant) pair: adding 3 to an existing quantity of 2 leaves
    /// one line of 5.
    pub async fn add_item(
        &self,
        cart_id: Uuid,
        product_id: i64,
        variant_id: Option<&str>,
        quantity: i64,
        unit_price_cents: i64,
    ) -> Result<CartItem> {
        if quantity <= 0 {
            return Err(RepositoryError::Validation(format!(
                "Quantity must be positive, got {quantity}"
            )));
        }
        let pk = keys::cart_pk(cart_id);
        let sk = keys::cart_item_sk(product_id, variant_id);

        // Try to merge first. Losing the condition means the line does not
        // exist yet; then try a guarded insert, and if that in turn loses to
        // a concurrent insert, merge into the winner.
        let merged = none_if_condition_failed(
            self.client
                .update_with_expression(
                    &pk,
                    &sk,
                    "SET quantity = quantity + :qty, updated_at = :now",
                    vec![
                        (":qty".to_string(), AttributeValue::N(quantity.to_string())),
                        (
                            ":now".to_string(),
                            AttributeValue::S(Utc::now().to_rfc3339()),
                        ),
                    ],
                    Some(&Condition::item_exists()),
                )
                .await,
        )?;
        if let Some(item) = merged {
            return item_to_cart_item(&item);
        }

        let now = Utc::now();
        let line = CartItem {
            cart_id,
            product_id,
            variant_id: variant_id.map(|v| v.to_string()),
            quantity,
            unit_price_cents,
            created_at: now,
            updated_at: now,
        };
        let inserted = none_if_condition_failed(
            self.client
                .put(cart_item_to_item(&line), Some(&Condition::item_absent()))
                .await,
        )?;
        if inserted.is_some() {
            return Ok(line);
        }

        let item = self
            .client
            .update_with_expression(
                &pk,
                &sk,
                "SET quantity = quantity + :qty, updated_at = :now",
                vec![
                    (":qty".to_string(), AttributeValue::N(quantity.to_string())),
                    (
                        ":now".to_string(),
                        AttributeValue::S(Utc::now().to_rfc3339()),
                    ),
                ],
                Some(&Condition::item_exists()),
            )
            .await?;
        item_to_cart_item(&item)
    }

    /// Sets an existing line's quantity. `Ok(None)` when the line is absent.
    pub async fn update_item_quantity(
        &self,
        cart_id: Uuid,
        product_id: i64,
        variant_id: Option<&str>,
        quantity: i64,
    ) -> Result<Option<CartItem>> {
        if quantity <= 0 {
            return Err(RepositoryError::Validation(format!(
                "Quantity must be positive, got {quantity}"
            )));
        }
        let result = self
            .client
            .update(
                &keys::cart_pk(cart_id),
                &keys::cart_item_sk(product_id, variant_id),
                vec![
                    (
                        "quantity".to_string(),
                        AttributeValue::N(quantity.to_string()),
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
            .map(item_to_cart_item)
            .transpose()
    }

    /// Hard-deletes one line; removing an absent line is a no-op.
    pub async fn remove_item(
        &self,
        cart_id: Uuid,
        product_id: i64,
        variant_id: Option<&str>,
    ) -> Result<()> {
        self.client
            .delete(
                &keys::cart_pk(cart_id),
                &keys::cart_item_sk(product_id, variant_id),
                None,
            )
            .await?;
        Ok(())
    }

    /// All lines of a cart, by SK prefix within its partition.
    pub async fn get_items(&self, cart_id: Uuid) -> Result<Vec<CartItem>> {
        let page = self
            .client
            .query(
                QueryRequest::new("PK = :pk AND begins_with(SK, :prefix)")
                    .value(":pk", AttributeValue::S(keys::cart_pk(cart_id)))
                    .value(
                        ":prefix",
                        AttributeValue::S(keys::CART_ITEM_PREFIX.to_string()),
                    )
                    .strong(),
            )
            .await?;
        page.items.iter().map(item_to_cart_item).collect()
    }

    /// Merges the source cart's lines into the target, line by line.
    ///
    /// Not transactional: each line is one merge write, issued concurrently,
    /// and a line that fails stays in the source cart. Source lines that
    /// merged are deleted best-effort afterwards. The outcome reports how
    /// many lines applied and how many failed; callers reconcile or retry.
    pub async fn merge_carts(&self, source: Uuid, target: Uuid) -> Result<BulkOutcome> {
        let lines = self.get_items(source).await?;
        let merges = lines.iter().map(|line| async move {
            let result = self
                .add_item(
                    target,
                    line.product_id,
                    line.variant_id.as_deref(),
                    line.quantity,
                    line.unit_price_cents,
                )
                .await;
            (line, result)
        });
        let mut outcome = BulkOutcome::default();
        for (line, result) in join_all(merges).await {
            match result {
                Ok(_) => {
                    outcome.applied += 1;
                    if let Err(error) = self
                        .remove_item(source, line.product_id, line.variant_id.as_deref())
                        .await
                    {
                        tracing::warn!(
                            cart = %source,
                            product_id = line.product_id,
                            %error,
                            "merged cart line left behind in source"
                        );
                    }
                }
                Err(error) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        cart = %source,
                        product_id = line.product_id,
                        %error,
                        "cart line failed to merge"
                    );
                }
            }
        }
        Ok(outcome)
    }

    /// Hard-deletes a cart and all of its lines.
    pub async fn delete(&self, cart_id: Uuid) -> Result<()> {
        use crate::storage::dynamodb::WriteOp;

        let lines = self.get_items(cart_id).await?;
        let pk = keys::cart_pk(cart_id);
        let mut ops: Vec<WriteOp> = lines
            .iter()
            .map(|line| WriteOp::Delete {
                pk: pk.clone(),
                sk: keys::cart_item_sk(line.product_id, line.variant_id.as_deref()),
            })
            .collect();
        ops.push(WriteOp::Delete {
            pk,
            sk: keys::METADATA_SK.to_string(),
        });
        let output = self.client.batch_write(ops).await?;
        if !output.unprocessed.is_empty() {
            tracing::warn!(
                cart = %cart_id,
                unprocessed = output.unprocessed.len(),
                "cart delete left unprocessed rows"
            );
        }
        Ok(())
    }
}
