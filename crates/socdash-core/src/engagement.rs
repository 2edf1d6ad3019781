//! Monthly like totals over loosely-typed platform posts.
//!
//! Every platform reports a post date and a like count, but under different
//! names and nesting. Rather than one calculator per platform, a single
//! [`monthly_engagement`] walks the JSON paths described by an
//! [`EngagementFields`] strategy.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::month::MonthKey;

/// Where a platform keeps the post date and the engagement count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementFields {
    pub platform: &'static str,
    pub date_path: &'static [&'static str],
    pub count_path: &'static [&'static str],
}

pub const INSTAGRAM: EngagementFields = EngagementFields {
    platform: "instagram",
    date_path: &["timestamp"],
    count_path: &["like_count"],
};

pub const FACEBOOK: EngagementFields = EngagementFields {
    platform: "facebook",
    date_path: &["created_time"],
    count_path: &["totalCount"],
};

pub const LINKEDIN: EngagementFields = EngagementFields {
    platform: "linkedin",
    date_path: &["posted_at", "date"],
    count_path: &["stats", "like"],
};

impl EngagementFields {
    /// Parsed post date, or `None` when the field is missing or unreadable.
    #[must_use]
    pub fn post_date(&self, post: &Value) -> Option<NaiveDate> {
        lookup(post, self.date_path).and_then(parse_post_date)
    }

    /// Engagement count of one post; anything non-numeric counts as zero.
    #[must_use]
    pub fn post_engagement(&self, post: &Value) -> i64 {
        lookup(post, self.count_path).map_or(0, count_from_value)
    }
}

/// Sum the engagement of posts dated within `month`.
///
/// Posts whose date is missing or cannot be parsed are excluded.
#[must_use]
pub fn monthly_engagement(posts: &[Value], fields: &EngagementFields, month: MonthKey) -> i64 {
    posts
        .iter()
        .filter(|post| {
            fields
                .post_date(post)
                .is_some_and(|date| MonthKey::of(date) == month)
        })
        .map(|post| fields.post_engagement(post))
        .fold(0_i64, i64::saturating_add)
}

/// [`monthly_engagement`] for the current UTC month.
#[must_use]
pub fn current_month_engagement(posts: &[Value], fields: &EngagementFields) -> i64 {
    monthly_engagement(posts, fields, MonthKey::current())
}

/// Parse a post timestamp into a calendar date.
///
/// Accepts RFC 3339, Graph-API style `+0000` offsets, naive date-times,
/// bare `YYYY-MM-DD` dates, and epoch milliseconds. Offset-aware values are
/// converted to UTC first.
#[must_use]
pub fn parse_post_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(raw) => parse_date_str(raw),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    }
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

/// Lenient non-negative count: integers as-is, floats truncated, else zero.
#[allow(clippy::cast_possible_truncation)] // truncation is the intended float handling
pub(crate) fn count_from_value(value: &Value) -> i64 {
    let Value::Number(n) = value else {
        return 0;
    };
    let count = if let Some(i) = n.as_i64() {
        i
    } else if let Some(u) = n.as_u64() {
        i64::try_from(u).unwrap_or(i64::MAX)
    } else {
        n.as_f64()
            .filter(|f| f.is_finite())
            .map_or(0, |f| f as i64)
    };
    count.max(0)
}
