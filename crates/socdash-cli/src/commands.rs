//! Command handlers. Each one connects what it needs, does one thing, and
//! prints its result to stdout; logs go to stderr.

use chrono::{Datelike, Utc};
use socdash_core::{AppConfig, MonthKey};
use socdash_rehost::ImageRehoster;
use socdash_stats::{SaveOutcome, StatsAggregator};

async fn connect_aggregator(config: &AppConfig) -> anyhow::Result<StatsAggregator> {
    let pool_config = socdash_db::PoolConfig::from_app_config(config);
    let pool = socdash_db::connect_pool(&config.database_url, pool_config).await?;
    socdash_db::run_migrations(&pool).await?;
    Ok(StatsAggregator::with_postgres(
        pool,
        config.snapshot_path.clone(),
    ))
}

/// Run the debounced update for today.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the save failed.
pub(crate) async fn run_save(config: &AppConfig, force: bool) -> anyhow::Result<()> {
    let stats = connect_aggregator(config).await?;
    let today = Utc::now().date_naive();

    let outcome = stats.update_if_due(today, force).await;
    println!("{}: {}", MonthKey::of(today), serde_json::to_string(&outcome)?);

    if outcome == SaveOutcome::Failed {
        anyhow::bail!("saving monthly statistics failed; see logs");
    }
    Ok(())
}

/// Print the 12-month series for `year` (default: current year).
///
/// # Errors
///
/// Returns an error if the database is unreachable or the year is out of range.
pub(crate) async fn run_series(config: &AppConfig, year: Option<i32>) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let year = year.unwrap_or_else(|| today.year());
    if !(1..=9999).contains(&year) {
        anyhow::bail!("year must be between 1 and 9999, got {year}");
    }

    let stats = connect_aggregator(config).await?;
    let series = stats.build_series(today, year).await;
    println!("{}", serde_json::to_string_pretty(&series)?);
    Ok(())
}

/// Re-host `url` and print the resulting public URL.
///
/// # Errors
///
/// Returns an error if object storage is not configured or the rehost fails.
pub(crate) async fn run_rehost(config: &AppConfig, url: &str) -> anyhow::Result<()> {
    let rehoster = ImageRehoster::from_app_config(config)?.ok_or_else(|| {
        anyhow::anyhow!("image storage is not configured; set STORAGE_URL and STORAGE_SERVICE_KEY")
    })?;

    let public_url = rehoster.rehost(url).await.map_err(|e| match e.details() {
        Some(details) => anyhow::anyhow!("{e}: {details}"),
        None => anyhow::Error::new(e),
    })?;
    println!("{public_url}");
    Ok(())
}
