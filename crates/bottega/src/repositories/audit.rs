//! Audit log repository and the date-partitioned range scanner.
//!
//! Audit rows are partitioned by UTC day (`PK=AUDIT#YYYY-MM-DD`) so a time
//! range never scans the table: the range is validated up front, each day
//! partition is queried independently (and concurrently), and the merged
//! result is sorted and cursor-paginated in memory. Rows expire via TTL
//! after a year.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use uuid::Uuid;

use bottega_core::domain::AuditLog;
use bottega_core::storage::{calculate_ttl, AuditRange, RepositoryError, Result};

use crate::storage::dynamodb::{
    audit_to_item, item_to_audit, keys, Condition, DynamoClient, Item, QueryRequest,
};

/// Days before an audit row expires via TTL.
const AUDIT_TTL_DAYS: i64 = 365;

/// One page of a merged range scan.
///
/// The cursor encodes the page's last item as `created_at|id`; passing it
/// back resumes strictly after that item in sort order, so rows sharing a
/// timestamp are never skipped. Being positional rather than an offset, it
/// stays stable while new rows are appended.
#[derive(Debug, Clone)]
pub struct AuditPage {
    pub items: Vec<AuditLog>,
    pub cursor: Option<String>,
}

fn format_cursor(log: &AuditLog) -> String {
    format!("{}|{}", log.created_at.to_rfc3339(), log.id)
}

fn parse_cursor(cursor: &str) -> Result<(DateTime<Utc>, Uuid)> {
    let (timestamp, id) = cursor
        .split_once('|')
        .ok_or_else(|| RepositoryError::Validation(format!("Invalid cursor: {cursor:?}")))?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Validation(format!("Invalid cursor timestamp: {e}")))?;
    let id = Uuid::parse_str(id)
        .map_err(|e| RepositoryError::Validation(format!("Invalid cursor id: {e}")))?;
    Ok((timestamp, id))
}

/// Whether `log` sorts strictly after the cursor position under the
/// newest-first, id-ascending order used by the range scanner.
fn is_after_cursor(log: &AuditLog, cursor: &(DateTime<Utc>, Uuid)) -> bool {
    log.created_at < cursor.0 || (log.created_at == cursor.0 && log.id > cursor.1)
}

#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    client: DynamoClient,
}

impl AuditLogRepository {
    pub fn new(client: DynamoClient) -> Self {
        Self { client }
    }

    /// Appends an audit row. The day partition derives from `created_at`,
    /// so a row is always found by the range scanner that covers its
    /// timestamp.
    pub async fn record(
        &self,
        entity_type: String,
        entity_id: String,
        action: String,
        user_id: Option<String>,
        detail: Option<serde_json::Value>,
    ) -> Result<AuditLog> {
        if entity_type.is_empty() || entity_id.is_empty() || action.is_empty() {
            return Err(RepositoryError::Validation(
                "Audit rows need entity_type, entity_id, and action".to_string(),
            ));
        }
        let now = Utc::now();
        let log = AuditLog {
            id: Uuid::new_v4(),
            entity_type,
            entity_id,
            action,
            user_id,
            detail,
            created_at: now,
            expires_at: Some(calculate_ttl(now, AUDIT_TTL_DAYS)),
        };
        let item = audit_to_item(&log)?;
        self.client.put(item, Some(&Condition::item_absent())).await?;
        Ok(log)
    }

    /// A single entity's trail, newest first.
    pub async fn list_by_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
        limit: Option<i32>,
    ) -> Result<Vec<AuditLog>> {
        let mut request = QueryRequest::new("GSI1PK = :pk")
            .on_index(keys::GSI1)
            .value(
                ":pk",
                AttributeValue::S(keys::audit_gsi1_pk(entity_type, entity_id)),
            )
            .newest_first();
        if let Some(limit) = limit {
            request = request.limit(limit);
        }
        let page = self.client.query(request).await?;
        page.items.iter().map(item_to_audit).collect()
    }

    /// Everything one user did, newest first, via the sparse user index.
    pub async fn list_by_user(&self, user_id: &str, limit: Option<i32>) -> Result<Vec<AuditLog>> {
        let mut request = QueryRequest::new("GSI2PK = :pk")
            .on_index(keys::GSI2)
            .value(":pk", AttributeValue::S(keys::audit_gsi2_pk(user_id)))
            .newest_first();
        if let Some(limit) = limit {
            request = request.limit(limit);
        }
        let page = self.client.query(request).await?;
        page.items.iter().map(item_to_audit).collect()
    }

    /// Scans a validated time range across its day partitions.
    ///
    /// Validation happens before any store call; a bad range costs nothing.
    /// Days are fetched concurrently, each paginated to completion within
    /// its partition, then merged and sorted newest first. `cursor` is the
    /// position of the previous page's last item (`created_at|id`).
    pub async fn query_range(
        &self,
        range: &AuditRange,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<AuditPage> {
        let cursor = cursor.map(parse_cursor).transpose()?;

        let scans = range.days().into_iter().map(|day| self.scan_day(day));
        let mut logs: Vec<AuditLog> = Vec::new();
        for day_logs in join_all(scans).await {
            logs.extend(day_logs?);
        }

        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        if let Some(cursor) = cursor {
            logs.retain(|log| is_after_cursor(log, &cursor));
        }
        logs.truncate(limit);

        let cursor = if logs.len() == limit {
            logs.last().map(format_cursor)
        } else {
            None
        };
        Ok(AuditPage { items: logs, cursor })
    }

    /// Drains one day partition, following the store's pagination until the
    /// day is exhausted.
    async fn scan_day(&self, day: chrono::NaiveDate) -> Result<Vec<AuditLog>> {
        let pk = keys::audit_pk(day);
        let mut logs = Vec::new();
        let mut start_key: Option<Item> = None;
        loop {
            let page = self
                .client
                .query(
                    QueryRequest::new("PK = :pk")
                        .value(":pk", AttributeValue::S(pk.clone()))
                        .newest_first()
                        .start_key(start_key.take()),
                )
                .await?;
            for item in &page.items {
                logs.push(item_to_audit(item)?);
            }
            match page.last_evaluated_key {
                Some(key) => start_key = Some(key),
                None => break,
            }
        }
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn log_at(minute: u32) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4(),
            entity_type: "product".to_string(),
            entity_id: "42".to_string(),
            action: "update".to_string(),
            user_id: None,
            detail: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap(),
            expires_at: None,
        }
    }

    fn sort_newest_first(logs: &mut [AuditLog]) {
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    }

    #[test]
    fn test_cursor_pagination_is_stable_under_append() {
        // Simulate the in-memory tail of query_range: sort desc, cut at the
        // cursor, take the page.
        let mut logs: Vec<AuditLog> = (0..6).map(log_at).collect();
        sort_newest_first(&mut logs);

        let cursor = parse_cursor(&format_cursor(&logs[2])).unwrap();

        // New rows appended after page one do not shift page two.
        let mut grown = logs.clone();
        grown.push(log_at(59));
        sort_newest_first(&mut grown);
        grown.retain(|log| is_after_cursor(log, &cursor));

        let expected: Vec<_> = logs
            .iter()
            .filter(|log| is_after_cursor(log, &cursor))
            .cloned()
            .collect();
        assert_eq!(grown, expected);
    }

    #[test]
    fn test_cursor_keeps_rows_sharing_a_timestamp() {
        // Five rows at the identical instant; a page size of two must walk
        // all of them across three pages with nothing skipped or repeated.
        let mut logs: Vec<AuditLog> = (0..5).map(|_| log_at(30)).collect();
        sort_newest_first(&mut logs);

        let mut seen: Vec<Uuid> = Vec::new();
        let mut cursor: Option<(DateTime<Utc>, Uuid)> = None;
        loop {
            let mut page: Vec<_> = logs
                .iter()
                .filter(|log| cursor.as_ref().is_none_or(|c| is_after_cursor(log, c)))
                .cloned()
                .collect();
            page.truncate(2);
            if page.is_empty() {
                break;
            }
            seen.extend(page.iter().map(|log| log.id));
            cursor = Some(parse_cursor(&format_cursor(page.last().unwrap())).unwrap());
        }

        let expected: Vec<Uuid> = logs.iter().map(|log| log.id).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_cursor_round_trip_and_rejects_garbage() {
        let log = log_at(5);
        let (timestamp, id) = parse_cursor(&format_cursor(&log)).unwrap();
        assert_eq!(timestamp, log.created_at);
        assert_eq!(id, log.id);

        assert!(parse_cursor("2024-01-15T10:05:00+00:00").is_err());
        assert!(parse_cursor("yesterday|not-a-uuid").is_err());
    }
}
