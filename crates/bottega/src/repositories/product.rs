//! Product catalog repository.
//!
//! Products are singleton items (`PK=PRODUCT#<id>`, `SK=METADATA`) with
//! variants stored as sub-items in the same partition. Slug, status, and
//! character lookups go through GSI projections that are recomputed inside
//! the same write that changes their source attributes.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;

use bottega_core::domain::{Product, ProductStatus, ProductVariant};
use bottega_core::storage::{ErrorKind, RepositoryError, Result};

use crate::storage::dynamodb::{
    build_projection, get_i64, item_to_product, item_to_variant, keys, product_to_item,
    variant_to_item, Condition, DynamoClient, Item, QueryPage, QueryRequest, ReadConsistency,
    SequenceAllocator, COUNTER_PRODUCT_ID,
};

use super::none_if_condition_failed;

/// Fields a caller may change on an existing product.
///
/// `None` leaves the field untouched; `personaggio_id` uses a double option
/// so "clear the association" and "leave it alone" stay distinct.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub status: Option<ProductStatus>,
    pub personaggio_id: Option<Option<i64>>,
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    client: DynamoClient,
    allocator: SequenceAllocator,
}

impl ProductRepository {
    pub fn new(client: DynamoClient) -> Self {
        let allocator = SequenceAllocator::new(client.clone());
        Self { client, allocator }
    }

    /// Creates a product with an allocator-minted id.
    ///
    /// The conditional put guards against the allocator being wound back by
    /// an operator; a collision surfaces as `AlreadyExists`.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        slug: String,
        name: String,
        description: Option<String>,
        price_cents: i64,
        stock: i64,
        status: ProductStatus,
        personaggio_id: Option<i64>,
    ) -> Result<Product> {
        let id = self.allocator.next_value(COUNTER_PRODUCT_ID).await?;
        let now = Utc::now();
        let product = Product {
            id,
            slug,
            name,
            description,
            price_cents,
            stock,
            status,
            personaggio_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let item = product_to_item(&product);
        self.client
            .put(item, Some(&Condition::item_absent()))
            .await
            .map_err(|error| {
                if error.kind == ErrorKind::ConditionFailed {
                    RepositoryError::AlreadyExists {
                        entity_type: "Product",
                        id: id.to_string(),
                    }
                } else {
                    error.into()
                }
            })?;
        Ok(product)
    }

    /// Strongly consistent lookup by id. Returns soft-deleted products too;
    /// callers that care check `deleted_at`.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Product>> {
        let item = self
            .client
            .get(
                &keys::product_pk(id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_product).transpose()
    }

    /// Fetches many products by id in one batched read.
    ///
    /// Missing ids are simply absent from the result. Keys the store could
    /// not serve this round are logged and skipped; callers needing them
    /// retry the whole read.
    pub async fn find_many(&self, ids: &[i64]) -> Result<Vec<Product>> {
        let read_keys: Vec<Item> = ids
            .iter()
            .map(|id| {
                let mut key = Item::new();
                key.insert("PK".to_string(), AttributeValue::S(keys::product_pk(*id)));
                key.insert(
                    "SK".to_string(),
                    AttributeValue::S(keys::METADATA_SK.to_string()),
                );
                key
            })
            .collect();
        let output = self
            .client
            .batch_get(read_keys, ReadConsistency::Eventual)
            .await?;
        if !output.unprocessed_keys.is_empty() {
            tracing::warn!(
                unprocessed = output.unprocessed_keys.len(),
                "batched product read left keys unserved"
            );
        }
        output.items.iter().map(item_to_product).collect()
    }

    /// Reads just the stock counter, skipping the rest of the item.
    pub async fn current_stock(&self, id: i64) -> Result<Option<i64>> {
        let projection = build_projection(&["stock"]);
        let item = self
            .client
            .get(
                &keys::product_pk(id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                Some(&projection),
            )
            .await?;
        item.as_ref().map(|item| get_i64(item, "stock")).transpose()
    }

    /// Slug lookup via GSI1. Eventually consistent, excludes soft-deleted.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let page = self
            .client
            .query(
                QueryRequest::new("GSI1PK = :pk")
                    .on_index(keys::GSI1)
                    .value(":pk", AttributeValue::S(keys::product_gsi1_pk(slug)))
                    .filter("attribute_not_exists(deleted_at)")
                    .limit(1),
            )
            .await?;
        page.items.first().map(item_to_product).transpose()
    }

    /// Lists products in a status, oldest first, excluding soft-deleted.
    pub async fn list_by_status(
        &self,
        status: ProductStatus,
        limit: Option<i32>,
        cursor: Option<crate::storage::dynamodb::Item>,
    ) -> Result<QueryPage<Product>> {
        let mut request = QueryRequest::new("GSI2PK = :pk")
            .on_index(keys::GSI2)
            .value(
                ":pk",
                AttributeValue::S(keys::product_gsi2_pk(status.as_str())),
            )
            .filter("attribute_not_exists(deleted_at)")
            .start_key(cursor);
        if let Some(limit) = limit {
            request = request.limit(limit);
        }
        let page = self.client.query(request).await?;
        page.try_map(item_to_product)
    }

    /// Lists products associated with a character, via the sparse GSI3.
    /// Unassociated products never appear here.
    pub async fn list_by_personaggio(&self, personaggio_id: i64) -> Result<QueryPage<Product>> {
        let page = self
            .client
            .query(
                QueryRequest::new("GSI3PK = :pk")
                    .on_index(keys::GSI3)
                    .value(
                        ":pk",
                        AttributeValue::S(keys::product_gsi3_pk(personaggio_id)),
                    )
                    .filter("attribute_not_exists(deleted_at)"),
            )
            .await?;
        page.try_map(item_to_product)
    }

    /// Partial update. Index projections whose source fields change are
    /// recomputed in the same write. Returns `Ok(None)` when the product
    /// does not exist.
    pub async fn update(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>> {
        let mut sets: Vec<(String, AttributeValue)> = Vec::new();
        let mut removes: Vec<String> = Vec::new();

        if let Some(name) = update.name {
            sets.push(("name".to_string(), AttributeValue::S(name)));
        }
        if let Some(description) = update.description {
            sets.push(("description".to_string(), AttributeValue::S(description)));
        }
        if let Some(price_cents) = update.price_cents {
            sets.push((
                "price_cents".to_string(),
                AttributeValue::N(price_cents.to_string()),
            ));
        }
        if let Some(stock) = update.stock {
            sets.push(("stock".to_string(), AttributeValue::N(stock.to_string())));
        }
        if let Some(status) = update.status {
            sets.push((
                "status".to_string(),
                AttributeValue::S(status.as_str().to_string()),
            ));
            sets.push((
                "GSI2PK".to_string(),
                AttributeValue::S(keys::product_gsi2_pk(status.as_str())),
            ));
        }
        if let Some(personaggio_id) = update.personaggio_id {
            match personaggio_id {
                Some(personaggio_id) => {
                    sets.push((
                        "personaggio_id".to_string(),
                        AttributeValue::N(personaggio_id.to_string()),
                    ));
                    sets.push((
                        "GSI3PK".to_string(),
                        AttributeValue::S(keys::product_gsi3_pk(personaggio_id)),
                    ));
                    sets.push((
                        "GSI3SK".to_string(),
                        AttributeValue::S(keys::product_pk(id)),
                    ));
                }
                None => {
                    removes.push("personaggio_id".to_string());
                    removes.push("GSI3PK".to_string());
                    removes.push("GSI3SK".to_string());
                }
            }
        }
        if sets.is_empty() && removes.is_empty() {
            return self.find_by_id(id).await;
        }
        sets.push((
            "updated_at".to_string(),
            AttributeValue::S(Utc::now().to_rfc3339()),
        ));

        let result = self
            .client
            .update(
                &keys::product_pk(id),
                keys::METADATA_SK,
                sets,
                &removes,
                Some(&Condition::item_exists()),
            )
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_product)
            .transpose()
    }

    /// Soft-deletes; `Ok(None)` when absent or already deleted.
    pub async fn soft_delete(&self, id: i64, actor: Option<&str>) -> Result<Option<Product>> {
        let result = self
            .client
            .soft_delete(&keys::product_pk(id), keys::METADATA_SK, actor)
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_product)
            .transpose()
    }

    /// Clears a soft delete. `Ok(None)` when the product is absent or not
    /// deleted.
    pub async fn restore(&self, id: i64) -> Result<Option<Product>> {
        let result = self
            .client
            .update(
                &keys::product_pk(id),
                keys::METADATA_SK,
                vec![(
                    "updated_at".to_string(),
                    AttributeValue::S(Utc::now().to_rfc3339()),
                )],
                &["deleted_at".to_string(), "deleted_by".to_string()],
                Some(&Condition::item_exists().and("attribute_exists(deleted_at)")),
            )
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_product)
            .transpose()
    }

    /// Reserves stock in a single conditional write.
    ///
    /// The precondition folds availability and liveness into one round trip,
    /// so oversell and sell-from-deleted are impossible regardless of
    /// concurrency. `Ok(None)` means insufficient stock, deleted, or absent.
    pub async fn decrement_stock(&self, id: i64, quantity: i64) -> Result<Option<Product>> {
        if quantity <= 0 {
            return Err(RepositoryError::Validation(format!(
                "Stock decrement must be positive, got {quantity}"
            )));
        }
        let condition = Condition::new("stock >= :qty AND attribute_not_exists(deleted_at)");
        let result = self
            .client
            .update_with_expression(
                &keys::product_pk(id),
                keys::METADATA_SK,
                "SET stock = stock - :qty, updated_at = :now",
                vec![
                    (":qty".to_string(), AttributeValue::N(quantity.to_string())),
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
            .map(item_to_product)
            .transpose()
    }

    /// Returns stock (restock or release), unconditionally on liveness but
    /// conditional on existence.
    pub async fn increment_stock(&self, id: i64, quantity: i64) -> Result<Option<Product>> {
        if quantity <= 0 {
            return Err(RepositoryError::Validation(format!(
                "Stock increment must be positive, got {quantity}"
            )));
        }
        let result = self
            .client
            .update_with_expression(
                &keys::product_pk(id),
                keys::METADATA_SK,
                "SET stock = stock + :qty, updated_at = :now",
                vec![
                    (":qty".to_string(), AttributeValue::N(quantity.to_string())),
                    (
                        ":now".to_string(),
                        AttributeValue::S(Utc::now().to_rfc3339()),
                    ),
                ],
                Some(&Condition::item_exists()),
            )
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_product)
            .transpose()
    }

    // ========================================================================
    // Variants
    // ========================================================================

    /// Adds a variant under the product partition. `AlreadyExists` when the
    /// variant id is taken.
    pub async fn create_variant(
        &self,
        product_id: i64,
        variant_id: String,
        name: String,
        price_cents: Option<i64>,
        stock: i64,
    ) -> Result<ProductVariant> {
        let now = Utc::now();
        let variant = ProductVariant {
            product_id,
            variant_id: variant_id.clone(),
            name,
            price_cents,
            stock,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let item = variant_to_item(&variant);
        self.client
            .put(item, Some(&Condition::item_absent()))
            .await
            .map_err(|error| {
                if error.kind == ErrorKind::ConditionFailed {
                    RepositoryError::AlreadyExists {
                        entity_type: "ProductVariant",
                        id: format!("{product_id}/{variant_id}"),
                    }
                } else {
                    error.into()
                }
            })?;
        Ok(variant)
    }

    pub async fn find_variant(
        &self,
        product_id: i64,
        variant_id: &str,
    ) -> Result<Option<ProductVariant>> {
        let item = self
            .client
            .get(
                &keys::product_pk(product_id),
                &keys::variant_sk(variant_id),
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_variant).transpose()
    }

    /// Lists a product's variants by SK prefix within its partition.
    pub async fn list_variants(&self, product_id: i64) -> Result<QueryPage<ProductVariant>> {
        let page = self
            .client
            .query(
                QueryRequest::new("PK = :pk AND begins_with(SK, :prefix)")
                    .value(":pk", AttributeValue::S(keys::product_pk(product_id)))
                    .value(
                        ":prefix",
                        AttributeValue::S(keys::VARIANT_PREFIX.to_string()),
                    )
                    .filter("attribute_not_exists(deleted_at)"),
            )
            .await?;
        page.try_map(item_to_variant)
    }

    /// Reserves variant stock with the same one-round-trip recipe as
    /// [`decrement_stock`](Self::decrement_stock).
    pub async fn decrement_variant_stock(
        &self,
        product_id: i64,
        variant_id: &str,
        quantity: i64,
    ) -> Result<Option<ProductVariant>> {
        if quantity <= 0 {
            return Err(RepositoryError::Validation(format!(
                "Stock decrement must be positive, got {quantity}"
            )));
        }
        let condition = Condition::new("stock >= :qty AND attribute_not_exists(deleted_at)");
        let result = self
            .client
            .update_with_expression(
                &keys::product_pk(product_id),
                &keys::variant_sk(variant_id),
                "SET stock = stock - :qty, updated_at = :now",
                vec![
                    (":qty".to_string(), AttributeValue::N(quantity.to_string())),
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
            .map(item_to_variant)
            .transpose()
    }

    pub async fn delete_variant(&self, product_id: i64, variant_id: &str) -> Result<()> {
        self.client
            .delete(
                &keys::product_pk(product_id),
                &keys::variant_sk(variant_id),
                None,
            )
            .await?;
        Ok(())
    }
}
