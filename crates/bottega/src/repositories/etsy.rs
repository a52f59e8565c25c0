//! Etsy sync-state repository.
//!
//! Stores the marketplace linkage state only: listing mappings, imported
//! receipts, the per-shop OAuth token, and the sync schedule. The API calls
//! that produce this state live elsewhere. Token and config writes are
//! upserts that keep the original `created_at` across replacement.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};

use bottega_core::domain::{EtsyOauthToken, EtsyProduct, EtsyReceipt, EtsySyncConfig};
use bottega_core::storage::{ErrorKind, RepositoryError, Result};

use crate::storage::dynamodb::{
    etsy_product_to_item, etsy_receipt_to_item, etsy_sync_config_to_item, etsy_token_to_item,
    item_to_etsy_product, item_to_etsy_receipt, item_to_etsy_sync_config, item_to_etsy_token,
    keys, Condition, DynamoClient, QueryRequest, ReadConsistency,
};

use super::none_if_condition_failed;

#[derive(Debug, Clone)]
pub struct EtsyRepository {
    client: DynamoClient,
}

impl EtsyRepository {
    pub fn new(client: DynamoClient) -> Self {
        Self { client }
    }

    // ========================================================================
    // Listing mappings
    // ========================================================================

    /// Links a product to an Etsy listing. `AlreadyExists` when the product
    /// is already linked.
    pub async fn create_product_link(
        &self,
        product_id: i64,
        listing_id: i64,
        shop_id: String,
        sync_state: String,
    ) -> Result<EtsyProduct> {
        let now = Utc::now();
        let link = EtsyProduct {
            product_id,
            listing_id,
            shop_id,
            sync_state,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.client
            .put(etsy_product_to_item(&link), Some(&Condition::item_absent()))
            .await
            .map_err(|error| {
                if error.kind == ErrorKind::ConditionFailed {
                    RepositoryError::AlreadyExists {
                        entity_type: "EtsyProduct",
                        id: product_id.to_string(),
                    }
                } else {
                    error.into()
                }
            })?;
        Ok(link)
    }

    pub async fn find_product_link(&self, product_id: i64) -> Result<Option<EtsyProduct>> {
        let item = self
            .client
            .get(
                &keys::etsy_product_pk(product_id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_etsy_product).transpose()
    }

    /// Reverse lookup: which product backs an Etsy listing.
    pub async fn find_by_listing(&self, listing_id: i64) -> Result<Option<EtsyProduct>> {
        let page = self
            .client
            .query(
                QueryRequest::new("GSI1PK = :pk")
                    .on_index(keys::GSI1)
                    .value(
                        ":pk",
                        AttributeValue::S(keys::etsy_product_gsi1_pk(listing_id)),
                    )
                    .filter("attribute_not_exists(deleted_at)")
                    .limit(1),
            )
            .await?;
        page.items.first().map(item_to_etsy_product).transpose()
    }

    /// Records a sync attempt's outcome. `Ok(None)` when the link is absent.
    pub async fn update_sync_state(
        &self,
        product_id: i64,
        sync_state: String,
        last_synced_at: Option<DateTime<Utc>>,
    ) -> Result<Option<EtsyProduct>> {
        let mut sets = vec![
            ("sync_state".to_string(), AttributeValue::S(sync_state)),
            (
                "updated_at".to_string(),
                AttributeValue::S(Utc::now().to_rfc3339()),
            ),
        ];
        if let Some(last_synced_at) = last_synced_at {
            sets.push((
                "last_synced_at".to_string(),
                AttributeValue::S(last_synced_at.to_rfc3339()),
            ));
        }
        let result = self
            .client
            .update(
                &keys::etsy_product_pk(product_id),
                keys::METADATA_SK,
                sets,
                &[],
                Some(&Condition::item_exists()),
            )
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_etsy_product)
            .transpose()
    }

    // ========================================================================
    // Receipts
    // ========================================================================

    /// Imports a receipt. `AlreadyExists` keeps re-imports idempotent.
    pub async fn create_receipt(
        &self,
        receipt_id: i64,
        shop_id: String,
        order_number: Option<String>,
        status: String,
    ) -> Result<EtsyReceipt> {
        let now = Utc::now();
        let receipt = EtsyReceipt {
            receipt_id,
            shop_id,
            order_number,
            status,
            created_at: now,
            updated_at: now,
        };
        self.client
            .put(
                etsy_receipt_to_item(&receipt),
                Some(&Condition::item_absent()),
            )
            .await
            .map_err(|error| {
                if error.kind == ErrorKind::ConditionFailed {
                    RepositoryError::AlreadyExists {
                        entity_type: "EtsyReceipt",
                        id: receipt_id.to_string(),
                    }
                } else {
                    error.into()
                }
            })?;
        Ok(receipt)
    }

    pub async fn find_by_receipt(&self, receipt_id: i64) -> Result<Option<EtsyReceipt>> {
        let item = self
            .client
            .get(
                &keys::etsy_receipt_pk(receipt_id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_etsy_receipt).transpose()
    }

    // ========================================================================
    // Token and schedule upserts
    // ========================================================================

    /// Stores the shop's OAuth token, replacing any existing one but keeping
    /// the original `created_at` when a token was already stored.
    pub async fn upsert_token(
        &self,
        shop_id: String,
        access_token: String,
        refresh_token: String,
        token_expires_at: DateTime<Utc>,
    ) -> Result<EtsyOauthToken> {
        let existing = self.get_token(&shop_id).await?;
        let now = Utc::now();
        let token = EtsyOauthToken {
            shop_id,
            access_token,
            refresh_token,
            token_expires_at,
            created_at: existing.map(|t| t.created_at).unwrap_or(now),
            updated_at: now,
        };
        self.client.put(etsy_token_to_item(&token), None).await?;
        Ok(token)
    }

    pub async fn get_token(&self, shop_id: &str) -> Result<Option<EtsyOauthToken>> {
        let item = self
            .client
            .get(
                &keys::etsy_token_pk(shop_id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_etsy_token).transpose()
    }

    /// Stores the shop's sync schedule with the same created-at-preserving
    /// upsert as [`upsert_token`](Self::upsert_token).
    pub async fn upsert_sync_config(
        &self,
        shop_id: String,
        sync_enabled: bool,
        sync_interval_minutes: i64,
        last_run_at: Option<DateTime<Utc>>,
    ) -> Result<EtsySyncConfig> {
        if sync_interval_minutes <= 0 {
            return Err(RepositoryError::Validation(format!(
                "Sync interval must be positive, got {sync_interval_minutes}"
            )));
        }
        let existing = self.get_sync_config(&shop_id).await?;
        let now = Utc::now();
        let config = EtsySyncConfig {
            shop_id,
            sync_enabled,
            sync_interval_minutes,
            last_run_at,
            created_at: existing.map(|c| c.created_at).unwrap_or(now),
            updated_at: now,
        };
        self.client
            .put(etsy_sync_config_to_item(&config), None)
            .await?;
        Ok(config)
    }

    pub async fn get_sync_config(&self, shop_id: &str) -> Result<Option<EtsySyncConfig>> {
        let item = self
            .client
            .get(
                &keys::etsy_sync_config_pk(shop_id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_etsy_sync_config).transpose()
    }
}
