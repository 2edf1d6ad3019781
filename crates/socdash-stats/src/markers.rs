//! Per-month "already saved today" markers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

/// Small string key-value store holding the date of the last automatic save.
///
/// Keys are `YYYY-MM`, values `YYYY-MM-DD`.
#[async_trait]
pub trait SaveMarkers: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String);
}

/// Process-local marker store. Markers reset on restart.
#[derive(Debug, Default)]
pub struct MemoryMarkers {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryMarkers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SaveMarkers for MemoryMarkers {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) {
        self.entries.lock().await.insert(key.to_string(), value);
    }
}
