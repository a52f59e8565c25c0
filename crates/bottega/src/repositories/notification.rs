//! Notification repository.
//!
//! Notifications live in a per-user partition with a time-ordered sort key,
//! so a user's feed is one query, newest first. Read state is projected onto
//! GSI1 for the unread view. Rows expire via TTL after 90 days.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::Utc;
use futures_util::future::join_all;
use uuid::Uuid;

use bottega_core::domain::{BulkOutcome, Notification};
use bottega_core::storage::{calculate_ttl, Result};

use crate::storage::dynamodb::{
    item_to_notification, keys, notification_to_item, Condition, DynamoClient, Item, QueryPage,
    QueryRequest,
};

use super::none_if_condition_failed;

/// Days before a notification expires via TTL.
const NOTIFICATION_TTL_DAYS: i64 = 90;

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    client: DynamoClient,
}

impl NotificationRepository {
    pub fn new(client: DynamoClient) -> Self {
        Self { client }
    }

    pub async fn create(
        &self,
        user_id: String,
        title: String,
        body: Option<String>,
    ) -> Result<Notification> {
        let now = Utc::now();
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            title,
            body,
            read: false,
            created_at: now,
            updated_at: now,
            expires_at: Some(calculate_ttl(now, NOTIFICATION_TTL_DAYS)),
        };
        self.client
            .put(
                notification_to_item(&notification),
                Some(&Condition::item_absent()),
            )
            .await?;
        Ok(notification)
    }

    /// A user's feed, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: Option<i32>,
        cursor: Option<Item>,
    ) -> Result<QueryPage<Notification>> {
        let mut request = QueryRequest::new("PK = :pk AND begins_with(SK, :prefix)")
            .value(":pk", AttributeValue::S(keys::notification_pk(user_id)))
            .value(
                ":prefix",
                AttributeValue::S(keys::NOTIF_ITEM_PREFIX.to_string()),
            )
            .newest_first()
            .start_key(cursor);
        if let Some(limit) = limit {
            request = request.limit(limit);
        }
        let page = self.client.query(request).await?;
        page.try_map(item_to_notification)
    }

    /// A user's unread notifications, via the read-state index.
    pub async fn list_unread(&self, user_id: &str) -> Result<Vec<Notification>> {
        let page = self
            .client
            .query(
                QueryRequest::new("GSI1PK = :pk")
                    .on_index(keys::GSI1)
                    .value(":pk", AttributeValue::S(keys::notification_gsi1_pk(false)))
                    .filter("user_id = :user")
                    .value(":user", AttributeValue::S(user_id.to_string()))
                    .newest_first(),
            )
            .await?;
        page.items.iter().map(item_to_notification).collect()
    }

    /// Marks one notification read, moving its read-state projection in the
    /// same write. `Ok(None)` when the row is absent.
    pub async fn mark_read(&self, notification: &Notification) -> Result<Option<Notification>> {
        let result = self
            .client
            .update(
                &keys::notification_pk(&notification.user_id),
                &keys::notification_sk(notification.created_at, notification.id),
                vec![
                    ("read".to_string(), AttributeValue::Bool(true)),
                    (
                        "GSI1PK".to_string(),
                        AttributeValue::S(keys::notification_gsi1_pk(true)),
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
            .map(item_to_notification)
            .transpose()
    }

    /// Marks everything unread for a user as read.
    ///
    /// Non-transactional fan-out: one update per row, issued concurrently.
    /// A row that fails stays unread and counts as failed; the caller can
    /// simply run the operation again.
    pub async fn mark_all_read(&self, user_id: &str) -> Result<BulkOutcome> {
        let unread = self.list_unread(user_id).await?;
        let updates = unread.iter().map(|notification| self.mark_read(notification));
        let mut outcome = BulkOutcome::default();
        for (notification, result) in unread.iter().zip(join_all(updates).await) {
            match result {
                Ok(_) => outcome.applied += 1,
                Err(error) => {
                    outcome.failed += 1;
                    tracing::warn!(
                        user_id,
                        notification = %notification.id,
                        %error,
                        "notification failed to mark read"
                    );
                }
            }
        }
        Ok(outcome)
    }
}
