use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An in-app notification for a user.
///
/// Notifications are partitioned by user and expire via TTL; unread ones are
/// additionally visible through the read-state index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub body: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Unix seconds after which the store purges the notification.
    pub expires_at: Option<i64>,
}
