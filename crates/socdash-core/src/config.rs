use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing is decoupled from the process environment so tests can drive it
/// from a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("SOCDASH_ENV", "development"));
    let bind_addr = parse_addr("SOCDASH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("SOCDASH_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("SOCDASH_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("SOCDASH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SOCDASH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let snapshot_path = PathBuf::from(or_default(
        "SOCDASH_SNAPSHOT_PATH",
        "./data/current_stats.json",
    ));
    let refresh_cron = or_default("SOCDASH_REFRESH_CRON", "0 0 * * * *");
    let month_end_cron = or_default("SOCDASH_MONTH_END_CRON", "0 55 23 * * *");

    let storage_url = optional("STORAGE_URL").map(|u| u.trim_end_matches('/').to_string());
    let storage_service_key = optional("STORAGE_SERVICE_KEY");
    let image_bucket = or_default("SOCDASH_IMAGE_BUCKET", "rehosted-images");
    let rehost_timeout_secs = parse_u64("SOCDASH_REHOST_TIMEOUT_SECS", "10")?;
    if rehost_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SOCDASH_REHOST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let rehost_max_bytes = parse_u64("SOCDASH_REHOST_MAX_BYTES", "5242880")?;
    let user_agent = or_default("SOCDASH_USER_AGENT", "socdash/0.1 (image-rehost)");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        snapshot_path,
        refresh_cron,
        month_end_cron,
        storage_url,
        storage_service_key,
        image_bucket,
        rehost_timeout_secs,
        rehost_max_bytes,
        user_agent,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
