//! The statistics aggregator: snapshot → monthly totals → store → series.
//!
//! Every operation here logs and swallows failures. The dashboard keeps
//! rendering whatever data is available and the scheduler keeps ticking.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use socdash_core::{is_last_day_of_month, CachedSnapshot, CurrentStats, MonthKey, MonthlyMetrics};
use socdash_db::DbError;
use sqlx::PgPool;

use crate::markers::{MemoryMarkers, SaveMarkers};
use crate::source::{FileSnapshotSource, SnapshotError, SnapshotSource};
use crate::store::{MonthlyStatsStore, PgStatsStore};

/// What a debounced update ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    AlreadySavedToday,
    NoSnapshot,
    Failed,
}

/// Where a series slot's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesSource {
    Persisted,
    Live,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub month: MonthKey,
    pub source: SeriesSource,
    #[serde(flatten)]
    pub metrics: MonthlyMetrics,
}

pub struct StatsAggregator {
    source: Arc<dyn SnapshotSource>,
    store: Arc<dyn MonthlyStatsStore>,
    markers: Arc<dyn SaveMarkers>,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        store: Arc<dyn MonthlyStatsStore>,
        markers: Arc<dyn SaveMarkers>,
    ) -> Self {
        Self {
            source,
            store,
            markers,
        }
    }

    /// Production wiring: file-backed snapshot, Postgres store, in-memory markers.
    #[must_use]
    pub fn with_postgres(pool: PgPool, snapshot_path: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(FileSnapshotSource::new(snapshot_path)),
            Arc::new(PgStatsStore::new(pool)),
            Arc::new(MemoryMarkers::new()),
        )
    }

    /// Read and decode the cached snapshot.
    ///
    /// Returns `None` when nothing is cached or the blob cannot be decoded.
    /// Read failures are logged, never propagated.
    pub async fn current_snapshot(&self) -> Option<CurrentStats> {
        let raw = match self.source.read_raw().await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "stats: failed to read cached snapshot");
                return None;
            }
        };

        match serde_json::from_str::<CachedSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot.stats),
            Err(e) => {
                tracing::warn!(error = %SnapshotError::Parse(e), "stats: ignoring cached snapshot");
                None
            }
        }
    }

    /// Live totals for `month` computed from the cached snapshot.
    pub async fn live_metrics(&self, month: MonthKey) -> Option<MonthlyMetrics> {
        self.current_snapshot()
            .await
            .map(|stats| stats.metrics_for(month))
    }

    /// Upsert `metrics` for the month containing `date`.
    ///
    /// Any existing row for that month is overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store rejects the write.
    pub async fn save_month(
        &self,
        date: NaiveDate,
        metrics: &MonthlyMetrics,
    ) -> Result<MonthKey, DbError> {
        let month = MonthKey::of(date);
        self.store.upsert(month, metrics).await?;
        tracing::info!(month = %month, "stats: saved monthly statistics");
        Ok(month)
    }

    /// Save the current month's totals at most once per day.
    ///
    /// Skips when today's marker is already set, unless `force` is true.
    /// The marker is only advanced after a successful write.
    pub async fn update_if_due(&self, today: NaiveDate, force: bool) -> SaveOutcome {
        let month = MonthKey::of(today);
        let marker_key = month.marker_key();
        let today_marker = today.format("%Y-%m-%d").to_string();

        if !force
            && self.markers.get(&marker_key).await.as_deref() == Some(today_marker.as_str())
        {
            tracing::debug!(month = %month, "stats: already saved today; skipping");
            return SaveOutcome::AlreadySavedToday;
        }

        let Some(stats) = self.current_snapshot().await else {
            tracing::info!(month = %month, "stats: no cached snapshot; nothing to save");
            return SaveOutcome::NoSnapshot;
        };

        let metrics = stats.metrics_for(month);
        match self.save_month(today, &metrics).await {
            Ok(_) => {
                self.markers.set(&marker_key, today_marker).await;
                SaveOutcome::Saved
            }
            Err(e) => {
                tracing::error!(month = %month, force, error = %e, "stats: failed to save monthly statistics");
                SaveOutcome::Failed
            }
        }
    }

    /// Force a save when `today` is the last day of its month.
    ///
    /// Returns `None` on any other day.
    pub async fn month_end_check(&self, today: NaiveDate) -> Option<SaveOutcome> {
        if !is_last_day_of_month(today) {
            return None;
        }
        tracing::info!(date = %today, "stats: last day of month; forcing save");
        Some(self.update_if_due(today, true).await)
    }

    /// Build the 12-month series for `year`.
    ///
    /// Each slot is the stored row if one exists, else live snapshot totals
    /// when the slot is `today`'s month, else zeros. Runs the debounced
    /// update afterwards. Returns an empty series only for years outside the
    /// calendar range.
    pub async fn build_series(&self, today: NaiveDate, year: i32) -> Vec<SeriesPoint> {
        let Some(months) = MonthKey::months_of_year(year) else {
            tracing::warn!(year, "stats: year out of range; no series built");
            return Vec::new();
        };

        let stored = match self.store.list_year(year).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!(year, error = %e, "stats: failed to load stored months");
                Vec::new()
            }
        };

        let current = MonthKey::of(today);
        let live = if months.contains(&current) {
            self.live_metrics(current).await
        } else {
            None
        };

        let series = months
            .into_iter()
            .map(|month| {
                if let Some(row) = stored.iter().find(|row| row.month == month) {
                    SeriesPoint {
                        month,
                        source: SeriesSource::Persisted,
                        metrics: row.metrics,
                    }
                } else if let Some(metrics) = live.filter(|_| month == current) {
                    SeriesPoint {
                        month,
                        source: SeriesSource::Live,
                        metrics,
                    }
                } else {
                    SeriesPoint {
                        month,
                        source: SeriesSource::Empty,
                        metrics: MonthlyMetrics::default(),
                    }
                }
            })
            .collect();

        self.update_if_due(today, false).await;
        series
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
