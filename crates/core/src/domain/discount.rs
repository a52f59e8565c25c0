use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a discount applies to an order total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    /// Percentage off, `value` in whole percent (20 = 20% off).
    Percentage,
    /// Fixed amount off, `value` in cents.
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(DiscountKind::Percentage),
            "fixed" => Some(DiscountKind::Fixed),
            _ => None,
        }
    }
}

/// A redeemable discount code.
///
/// The human-facing `code` is unique and looked up through a secondary
/// index; `times_used` only moves through the conditional increment path, so
/// it can never exceed `max_uses` when a cap is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountCode {
    pub id: i64,
    pub code: String,
    pub kind: DiscountKind,
    pub value: i64,
    pub active: bool,
    pub times_used: i64,
    pub max_uses: Option<i64>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl DiscountCode {
    /// Whether the code is redeemable at instant `now`.
    ///
    /// Checks the same invariants the conditional increment re-checks
    /// server-side: active, not soft-deleted, inside the validity window,
    /// and under the usage cap.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        if !self.active || self.deleted_at.is_some() {
            return false;
        }
        if let Some(from) = self.valid_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        match self.max_uses {
            Some(max) => self.times_used < max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DiscountCode {
        DiscountCode {
            id: 1,
            code: "SAVE20".to_string(),
            kind: DiscountKind::Percentage,
            value: 20,
            active: true,
            times_used: 0,
            max_uses: None,
            valid_from: None,
            valid_until: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_redeemable_without_expiry() {
        let code = sample();
        assert!(code.is_redeemable(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_not_redeemable_when_inactive_or_deleted() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut code = sample();
        code.active = false;
        assert!(!code.is_redeemable(now));

        let mut code = sample();
        code.deleted_at = Some(now);
        assert!(!code.is_redeemable(now));
    }

    #[test]
    fn test_usage_cap() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut code = sample();
        code.max_uses = Some(1);
        assert!(code.is_redeemable(now));
        code.times_used = 1;
        assert!(!code.is_redeemable(now));
    }

    #[test]
    fn test_validity_window() {
        let mut code = sample();
        code.valid_from = Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        code.valid_until = Some(Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap());

        assert!(!code.is_redeemable(Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap()));
        assert!(code.is_redeemable(Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()));
        assert!(!code.is_redeemable(Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()));
    }
}
