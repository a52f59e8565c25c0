//! Character (personaggio) repository.
//!
//! Characters carry an explicit display position. A position lookup goes
//! through `PERSONAGGIO_ORDER#<pos>` on GSI1; the full ordered listing is
//! one query over a constant GSI2 partition whose sort key is the
//! zero-padded position. Both projections move in the same write as the
//! position itself.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;

use bottega_core::domain::{BulkOutcome, Personaggio};
use bottega_core::storage::{ErrorKind, RepositoryError, Result};

use crate::storage::dynamodb::{
    item_to_personaggio, keys, personaggio_to_item, Condition, DynamoClient, QueryPage,
    QueryRequest, ReadConsistency, SequenceAllocator, COUNTER_PERSONAGGIO_ID,
};

use super::none_if_condition_failed;

/// One requested position change.
#[derive(Debug, Clone, Copy)]
pub struct PositionMove {
    pub id: i64,
    pub position: i64,
}

#[derive(Debug, Clone)]
pub struct PersonaggioRepository {
    client: DynamoClient,
    allocator: SequenceAllocator,
}

impl PersonaggioRepository {
    pub fn new(client: DynamoClient) -> Self {
        let allocator = SequenceAllocator::new(client.clone());
        Self { client, allocator }
    }

    /// Creates a character at the end of the display order: both the id and
    /// the position come from the allocator.
    pub async fn create(&self, name: String, description: Option<String>) -> Result<Personaggio> {
        let id = self.allocator.next_value(COUNTER_PERSONAGGIO_ID).await?;
        let now = Utc::now();
        let personaggio = Personaggio {
            id,
            name,
            description,
            position: id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.client
            .put(
                personaggio_to_item(&personaggio),
                Some(&Condition::item_absent()),
            )
            .await
            .map_err(|error| {
                if error.kind == ErrorKind::ConditionFailed {
                    RepositoryError::AlreadyExists {
                        entity_type: "Personaggio",
                        id: id.to_string(),
                    }
                } else {
                    error.into()
                }
            })?;
        Ok(personaggio)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Personaggio>> {
        let item = self
            .client
            .get(
                &keys::personaggio_pk(id),
                keys::METADATA_SK,
                ReadConsistency::Strong,
                None,
            )
            .await?;
        item.as_ref().map(item_to_personaggio).transpose()
    }

    /// Who sits at a display position.
    pub async fn find_by_order(&self, position: i64) -> Result<Option<Personaggio>> {
        let page = self
            .client
            .query(
                QueryRequest::new("GSI1PK = :pk")
                    .on_index(keys::GSI1)
                    .value(":pk", AttributeValue::S(keys::personaggio_gsi1_pk(position)))
                    .filter("attribute_not_exists(deleted_at)")
                    .limit(1),
            )
            .await?;
        page.items.first().map(item_to_personaggio).transpose()
    }

    /// All characters in display order, one query over the constant GSI2
    /// partition.
    pub async fn list_ordered(&self) -> Result<QueryPage<Personaggio>> {
        let page = self
            .client
            .query(
                QueryRequest::new("GSI2PK = :pk")
                    .on_index(keys::GSI2)
                    .value(
                        ":pk",
                        AttributeValue::S(keys::personaggio_gsi2_pk().to_string()),
                    )
                    .filter("attribute_not_exists(deleted_at)"),
            )
            .await?;
        page.try_map(item_to_personaggio)
    }

    /// Applies a batch of position changes, one conditional update each.
    ///
    /// Not transactional: a concurrent delete or a missing id fails that
    /// move and the rest proceed. The outcome reports how many applied.
    pub async fn reorder(&self, moves: &[PositionMove]) -> Result<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for update in moves {
            let result = self
                .client
                .update(
                    &keys::personaggio_pk(update.id),
                    keys::METADATA_SK,
                    vec![
                        (
                            "position".to_string(),
                            AttributeValue::N(update.position.to_string()),
                        ),
                        (
                            "GSI1PK".to_string(),
                            AttributeValue::S(keys::personaggio_gsi1_pk(update.position)),
                        ),
                        (
                            "GSI2SK".to_string(),
                            AttributeValue::S(keys::personaggio_gsi2_sk(
                                update.position,
                                update.id,
                            )),
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
            match none_if_condition_failed(result) {
                Ok(Some(_)) => outcome.applied += 1,
                Ok(None) => {
                    outcome.failed += 1;
                    tracing::warn!(id = update.id, "position move skipped a missing character");
                }
                Err(error) => {
                    outcome.failed += 1;
                    tracing::warn!(id = update.id, %error, "position move failed");
                }
            }
        }
        Ok(outcome)
    }

    pub async fn soft_delete(&self, id: i64, actor: Option<&str>) -> Result<Option<Personaggio>> {
        let result = self
            .client
            .soft_delete(&keys::personaggio_pk(id), keys::METADATA_SK, actor)
            .await;
        none_if_condition_failed(result)?
            .as_ref()
            .map(item_to_personaggio)
            .transpose()
    }

    pub async fn restore(&self, id: i64) -> Result<Option<Personaggio>> {
        let result = self
            .client
            .update(
                &keys::personaggio_pk(id),
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
            .map(item_to_personaggio)
            .transpose()
    }
}
