//! Shared configuration and domain types for socdash.
//!
//! Holds the env-driven [`AppConfig`], the shape of the cached social
//! snapshot ([`CurrentStats`]), the per-platform engagement strategies, and
//! the calendar-month helpers used by the aggregator and the database layer.

mod app_config;
mod config;
pub mod engagement;
pub mod month;
pub mod snapshot;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use engagement::{
    current_month_engagement, monthly_engagement, parse_post_date, EngagementFields, FACEBOOK,
    INSTAGRAM, LINKEDIN,
};
pub use month::{is_last_day_of_month, MonthKey, MonthlyMetrics, MonthlyStats};
pub use snapshot::{CachedSnapshot, CurrentStats, PlatformSnapshot};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
