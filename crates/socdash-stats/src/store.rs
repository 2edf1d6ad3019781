//! Persistence seam for monthly statistics.

use async_trait::async_trait;
use socdash_core::{MonthKey, MonthlyMetrics, MonthlyStats};
use socdash_db::DbError;
use sqlx::PgPool;

/// Upsert-by-month and per-year reads over the monthly statistics table.
#[async_trait]
pub trait MonthlyStatsStore: Send + Sync {
    async fn upsert(&self, month: MonthKey, metrics: &MonthlyMetrics) -> Result<(), DbError>;

    /// Stored months of `year`, ordered by month.
    async fn list_year(&self, year: i32) -> Result<Vec<MonthlyStats>, DbError>;
}

/// [`MonthlyStatsStore`] over the `monthly_social_stats` Postgres table.
#[derive(Debug, Clone)]
pub struct PgStatsStore {
    pool: PgPool,
}

impl PgStatsStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MonthlyStatsStore for PgStatsStore {
    async fn upsert(&self, month: MonthKey, metrics: &MonthlyMetrics) -> Result<(), DbError> {
        socdash_db::upsert_monthly_stats(&self.pool, month, metrics).await?;
        Ok(())
    }

    async fn list_year(&self, year: i32) -> Result<Vec<MonthlyStats>, DbError> {
        let rows = socdash_db::list_monthly_stats_for_year(&self.pool, year).await?;
        Ok(rows.into_iter().map(MonthlyStats::from).collect())
    }
}
