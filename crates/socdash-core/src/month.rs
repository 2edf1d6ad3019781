//! Calendar-month keys and the per-month metric record.

use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A calendar month, stored as its first day.
///
/// This is the upsert key of `monthly_social_stats`, so every date that
/// enters the persistence layer is normalized through [`MonthKey::of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    /// Returns `None` when `month` is outside `1..=12` or the year is out of range.
    #[must_use]
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    /// The month containing today's UTC date.
    #[must_use]
    pub fn current() -> Self {
        Self::of(Utc::now().date_naive())
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    /// All twelve months of `year`, January first.
    #[must_use]
    pub fn months_of_year(year: i32) -> Option<Vec<Self>> {
        (1..=12).map(|m| Self::new(year, m)).collect()
    }

    /// Key used by the save-marker store: `YYYY-MM`.
    #[must_use]
    pub fn marker_key(self) -> String {
        format!("{:04}-{:02}", self.year(), self.month())
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// True when `date` is the final day of its calendar month.
#[must_use]
pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt()
        .is_none_or(|next| next.month() != date.month())
}

/// The six numbers persisted for one month.
///
/// Missing platform data is recorded as zero, not as unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyMetrics {
    pub instagram_followers: i64,
    pub instagram_likes: i64,
    pub facebook_followers: i64,
    pub facebook_likes: i64,
    pub linkedin_followers: i64,
    pub linkedin_likes: i64,
}

impl MonthlyMetrics {
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// One persisted month of statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: MonthKey,
    #[serde(flatten)]
    pub metrics: MonthlyMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn of_normalizes_to_first_day() {
        let key = MonthKey::of(date(2025, 3, 17));
        assert_eq!(key.first_day(), date(2025, 3, 1));
        assert_eq!(key.year(), 2025);
        assert_eq!(key.month(), 3);
    }

    #[test]
    fn new_rejects_invalid_month() {
        assert!(MonthKey::new(2025, 0).is_none());
        assert!(MonthKey::new(2025, 13).is_none());
        assert_eq!(MonthKey::new(2025, 12), Some(MonthKey::of(date(2025, 12, 31))));
    }

    #[test]
    fn months_of_year_yields_twelve_in_order() {
        let months = MonthKey::months_of_year(2024).expect("valid year");
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].first_day(), date(2024, 1, 1));
        assert_eq!(months[11].first_day(), date(2024, 12, 1));
    }

    #[test]
    fn marker_key_is_zero_padded() {
        assert_eq!(MonthKey::of(date(2025, 7, 4)).marker_key(), "2025-07");
        assert_eq!(MonthKey::of(date(2025, 7, 4)).to_string(), "2025-07");
    }

    #[test]
    fn last_day_of_month_detection() {
        assert!(is_last_day_of_month(date(2025, 1, 31)));
        assert!(!is_last_day_of_month(date(2025, 1, 30)));
        assert!(is_last_day_of_month(date(2025, 4, 30)));
        assert!(is_last_day_of_month(date(2025, 12, 31)));
    }

    #[test]
    fn last_day_of_february_respects_leap_years() {
        assert!(is_last_day_of_month(date(2023, 2, 28)));
        assert!(!is_last_day_of_month(date(2024, 2, 28)));
        assert!(is_last_day_of_month(date(2024, 2, 29)));
    }

    #[test]
    fn monthly_stats_serializes_flat() {
        let stats = MonthlyStats {
            month: MonthKey::of(date(2025, 5, 9)),
            metrics: MonthlyMetrics {
                instagram_likes: 12,
                ..MonthlyMetrics::default()
            },
        };
        let json = serde_json::to_value(stats).expect("serialize");
        assert_eq!(json["month"], "2025-05-01");
        assert_eq!(json["instagram_likes"], 12);
        assert_eq!(json["linkedin_followers"], 0);
    }
}
