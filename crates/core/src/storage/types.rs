use chrono::{DateTime, Duration, NaiveDate, Utc};

use super::RepositoryError;

/// Maximum number of UTC calendar days an audit range query may span.
///
/// Each day in the range becomes one partition query, so this bounds the
/// fan-out of a single logical range scan.
pub const MAX_AUDIT_RANGE_DAYS: usize = 90;

/// A validated audit-log query range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl AuditRange {
    /// Creates a range, validating ordering and the fan-out bound.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, RepositoryError> {
        if start > end {
            return Err(RepositoryError::Validation(
                "range start must be before or equal to range end".to_string(),
            ));
        }
        let range = Self { start, end };
        let days = range.day_count();
        if days > MAX_AUDIT_RANGE_DAYS {
            return Err(RepositoryError::Validation(format!(
                "range spans {days} days, maximum is {MAX_AUDIT_RANGE_DAYS}"
            )));
        }
        Ok(range)
    }

    /// Parses two ISO-8601 timestamps into a validated range.
    pub fn parse(start: &str, end: &str) -> Result<Self, RepositoryError> {
        let start = parse_timestamp(start)?;
        let end = parse_timestamp(end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Every UTC calendar date touched by the range, oldest first.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(self.day_count());
        let mut day = self.start.date_naive();
        let last = self.end.date_naive();
        while day <= last {
            days.push(day);
            day += Duration::days(1);
        }
        days
    }

    fn day_count(&self) -> usize {
        (self.end.date_naive() - self.start.date_naive()).num_days() as usize + 1
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Validation(format!("invalid timestamp {s:?}: {e}")))
}

/// Computes the TTL attribute value for an item created at `created_at`.
///
/// Returns Unix seconds, `days` whole days after creation. Pure: the same
/// inputs always produce the same expiry.
pub fn calculate_ttl(created_at: DateTime<Utc>, days: i64) -> i64 {
    (created_at.timestamp_millis() + days * 86_400_000) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_valid_range_construction() {
        let range = AuditRange::new(ts("2024-01-01T00:00:00Z"), ts("2024-01-31T23:59:59Z")).unwrap();
        assert_eq!(range.days().len(), 31);
    }

    #[test]
    fn test_same_day_range_is_one_day() {
        let range = AuditRange::new(ts("2024-06-15T08:00:00Z"), ts("2024-06-15T20:00:00Z")).unwrap();
        assert_eq!(range.days().len(), 1);
        assert_eq!(
            range.days(),
            vec![NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()]
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = AuditRange::new(ts("2024-02-01T00:00:00Z"), ts("2024-01-01T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
    }

    #[test]
    fn test_ninety_day_range_accepted() {
        // 2024-01-01 through 2024-03-30 inclusive is exactly 90 days.
        let range = AuditRange::new(ts("2024-01-01T00:00:00Z"), ts("2024-03-30T23:59:59Z")).unwrap();
        assert_eq!(range.days().len(), 90);
    }

    #[test]
    fn test_ninety_one_day_range_rejected() {
        let err = AuditRange::new(ts("2024-01-01T00:00:00Z"), ts("2024-03-31T00:00:00Z"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AuditRange::parse("yesterday", "2024-01-01T00:00:00Z").is_err());
        assert!(AuditRange::parse("2024-01-01T00:00:00Z", "2024-01-02").is_err());
    }

    #[test]
    fn test_days_cross_month_boundary() {
        let range = AuditRange::new(ts("2024-02-28T12:00:00Z"), ts("2024-03-01T12:00:00Z")).unwrap();
        assert_eq!(
            range.days(),
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_ttl_is_pure_and_exact() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let expected = (created.timestamp_millis() + 365 * 86_400_000) / 1000;
        assert_eq!(calculate_ttl(created, 365), expected);
        assert_eq!(calculate_ttl(created, 365), calculate_ttl(created, 365));
        // 2024 is a leap year, so 365 days lands on 2024-12-31T00:00:00Z.
        assert_eq!(calculate_ttl(created, 365), ts("2024-12-31T00:00:00Z").timestamp());
    }
}
