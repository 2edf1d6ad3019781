use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// JSON file holding the collector's latest `{ "stats": ... }` snapshot.
    pub snapshot_path: PathBuf,
    pub refresh_cron: String,
    pub month_end_cron: String,
    pub storage_url: Option<String>,
    pub storage_service_key: Option<String>,
    pub image_bucket: String,
    pub rehost_timeout_secs: u64,
    pub rehost_max_bytes: u64,
    pub user_agent: String,
}

impl AppConfig {
    /// Object-store base URL and service key, when both are configured.
    #[must_use]
    pub fn storage_credentials(&self) -> Option<(&str, &str)> {
        match (&self.storage_url, &self.storage_service_key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("snapshot_path", &self.snapshot_path)
            .field("refresh_cron", &self.refresh_cron)
            .field("month_end_cron", &self.month_end_cron)
            .field("storage_url", &self.storage_url)
            .field(
                "storage_service_key",
                &self.storage_service_key.as_ref().map(|_| "[redacted]"),
            )
            .field("image_bucket", &self.image_bucket)
            .field("rehost_timeout_secs", &self.rehost_timeout_secs)
            .field("rehost_max_bytes", &self.rehost_max_bytes)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
