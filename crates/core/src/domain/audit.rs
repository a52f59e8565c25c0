use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An append-only audit record.
///
/// Audit rows are partitioned by the UTC calendar date of `created_at`; the
/// range scanner depends on that date matching the key the row was written
/// under, so the write path derives both from the same timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub user_id: Option<String>,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    /// Unix seconds after which the store purges the record.
    pub expires_at: Option<i64>,
}
