//! Scheduled jobs for the monthly statistics aggregator.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use socdash_stats::{SaveOutcome, SeriesSource, StatsAggregator};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Register the periodic refresh job.
///
/// Runs hourly by default (`0 0 * * * *`, `SOCDASH_REFRESH_CRON`): re-reads
/// the cached snapshot and rebuilds the current year's series, which also
/// runs the debounced daily save.
pub(super) async fn register_refresh_job(
    scheduler: &JobScheduler,
    stats: Arc<StatsAggregator>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let stats = Arc::clone(&stats);

        Box::pin(async move {
            tracing::info!("scheduler: starting stats refresh");
            run_refresh(&stats, Utc::now().date_naive()).await;
            tracing::info!("scheduler: stats refresh complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered stats refresh job");
    Ok(())
}

/// Register the daily month-end job.
///
/// Runs at 23:55 UTC by default (`0 55 23 * * *`, `SOCDASH_MONTH_END_CRON`)
/// and forces a save on the last calendar day of the month.
pub(super) async fn register_month_end_job(
    scheduler: &JobScheduler,
    stats: Arc<StatsAggregator>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let stats = Arc::clone(&stats);

        Box::pin(async move {
            run_month_end(&stats, Utc::now().date_naive()).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered month-end job");
    Ok(())
}

/// Rebuild `today`'s year and log how each slot was filled.
pub(super) async fn run_refresh(stats: &StatsAggregator, today: NaiveDate) {
    let series = stats.build_series(today, today.year()).await;

    let persisted = series
        .iter()
        .filter(|p| p.source == SeriesSource::Persisted)
        .count();
    let live = series
        .iter()
        .filter(|p| p.source == SeriesSource::Live)
        .count();
    tracing::info!(
        year = today.year(),
        months = series.len(),
        persisted,
        live,
        "scheduler: series rebuilt"
    );
}

pub(super) async fn run_month_end(stats: &StatsAggregator, today: NaiveDate) -> Option<SaveOutcome> {
    let outcome = stats.month_end_check(today).await;
    match outcome {
        None => tracing::debug!(date = %today, "scheduler: not month end; skipping"),
        Some(SaveOutcome::Saved) => {
            tracing::info!(date = %today, "scheduler: month-end save complete");
        }
        Some(other) => {
            tracing::warn!(date = %today, outcome = ?other, "scheduler: month-end save did not complete");
        }
    }
    outcome
}
