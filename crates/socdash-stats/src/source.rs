//! Read access to the collector's cached snapshot.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot cache {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("snapshot cache is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only view of the local key-value cache holding the latest snapshot.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// The raw cached blob, or `Ok(None)` when nothing has been cached yet.
    async fn read_raw(&self) -> Result<Option<String>, SnapshotError>;
}

/// Snapshot cache backed by a single JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileSnapshotSource {
    path: PathBuf,
}

impl FileSnapshotSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn read_raw(&self) -> Result<Option<String>, SnapshotError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(None),
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SnapshotError::Io {
                path: self.path.display().to_string(),
                source,
            }),
        }
    }
}
