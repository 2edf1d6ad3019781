//! Background job scheduler.
//!
//! Builds the monthly series once at startup, then registers the recurring
//! stats jobs on a [`JobScheduler`].

mod stats_jobs;

use std::sync::Arc;

use chrono::Utc;
use socdash_stats::StatsAggregator;
use tokio_cron_scheduler::{JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`]; call `shutdown` on it during
/// graceful shutdown.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, a
/// cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    stats: Arc<StatsAggregator>,
    config: Arc<socdash_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    tracing::info!("scheduler: initial series build");
    stats_jobs::run_refresh(&stats, Utc::now().date_naive()).await;

    stats_jobs::register_refresh_job(&scheduler, Arc::clone(&stats), &config.refresh_cron).await?;
    stats_jobs::register_month_end_job(&scheduler, stats, &config.month_end_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}
