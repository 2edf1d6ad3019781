//! Database operations for the `monthly_social_stats` table.

use chrono::{DateTime, NaiveDate, Utc};
use socdash_core::{MonthKey, MonthlyMetrics, MonthlyStats};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `monthly_social_stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonthlyStatsRow {
    pub id: i64,
    pub month: NaiveDate,
    pub instagram_followers: i64,
    pub instagram_likes: i64,
    pub facebook_followers: i64,
    pub facebook_likes: i64,
    pub linkedin_followers: i64,
    pub linkedin_likes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyStatsRow {
    #[must_use]
    pub fn metrics(&self) -> MonthlyMetrics {
        MonthlyMetrics {
            instagram_followers: self.instagram_followers,
            instagram_likes: self.instagram_likes,
            facebook_followers: self.facebook_followers,
            facebook_likes: self.facebook_likes,
            linkedin_followers: self.linkedin_followers,
            linkedin_likes: self.linkedin_likes,
        }
    }
}

impl From<MonthlyStatsRow> for MonthlyStats {
    fn from(row: MonthlyStatsRow) -> Self {
        Self {
            month: MonthKey::of(row.month),
            metrics: row.metrics(),
        }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, month, instagram_followers, instagram_likes, \
     facebook_followers, facebook_likes, linkedin_followers, linkedin_likes, \
     created_at, updated_at \
     FROM monthly_social_stats";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert or overwrite the statistics row for `month`.
///
/// The month is the conflict key, so saving the same month twice leaves one
/// row holding the latest values.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_monthly_stats(
    pool: &PgPool,
    month: MonthKey,
    metrics: &MonthlyMetrics,
) -> Result<MonthlyStatsRow, DbError> {
    let row = sqlx::query_as::<_, MonthlyStatsRow>(
        "INSERT INTO monthly_social_stats \
             (month, instagram_followers, instagram_likes, facebook_followers, \
              facebook_likes, linkedin_followers, linkedin_likes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (month) DO UPDATE SET \
             instagram_followers = EXCLUDED.instagram_followers, \
             instagram_likes = EXCLUDED.instagram_likes, \
             facebook_followers = EXCLUDED.facebook_followers, \
             facebook_likes = EXCLUDED.facebook_likes, \
             linkedin_followers = EXCLUDED.linkedin_followers, \
             linkedin_likes = EXCLUDED.linkedin_likes, \
             updated_at = NOW() \
         RETURNING id, month, instagram_followers, instagram_likes, \
             facebook_followers, facebook_likes, linkedin_followers, linkedin_likes, \
             created_at, updated_at",
    )
    .bind(month.first_day())
    .bind(metrics.instagram_followers)
    .bind(metrics.instagram_likes)
    .bind(metrics.facebook_followers)
    .bind(metrics.facebook_likes)
    .bind(metrics.linkedin_followers)
    .bind(metrics.linkedin_likes)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// List rows whose month falls within `[from, to]`, ordered by month ascending.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_monthly_stats_between(
    pool: &PgPool,
    from: MonthKey,
    to: MonthKey,
) -> Result<Vec<MonthlyStatsRow>, DbError> {
    let rows = sqlx::query_as::<_, MonthlyStatsRow>(&format!(
        "{SELECT_COLUMNS} WHERE month BETWEEN $1 AND $2 ORDER BY month ASC"
    ))
    .bind(from.first_day())
    .bind(to.first_day())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List every stored month of `year`, January first.
///
/// # Errors
///
/// Returns [`DbError::InvalidYear`] if `year` is outside the calendar range,
/// or [`DbError::Sqlx`] if the query fails.
pub async fn list_monthly_stats_for_year(
    pool: &PgPool,
    year: i32,
) -> Result<Vec<MonthlyStatsRow>, DbError> {
    let (Some(from), Some(to)) = (MonthKey::new(year, 1), MonthKey::new(year, 12)) else {
        return Err(DbError::InvalidYear(year));
    };
    list_monthly_stats_between(pool, from, to).await
}

/// Fetch the row for a single month.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists for `month`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_monthly_stats(pool: &PgPool, month: MonthKey) -> Result<MonthlyStatsRow, DbError> {
    sqlx::query_as::<_, MonthlyStatsRow>(&format!("{SELECT_COLUMNS} WHERE month = $1"))
        .bind(month.first_day())
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}
