use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use uuid::Uuid;

use crate::error::RehostError;
use crate::fetch::{extension_for, fetch_image, parse_image_url};
use crate::storage::{BucketSpec, ObjectStore, StorageClient, StorageError};

/// Payload and per-object ceiling: 5 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct RehostConfig {
    pub bucket: String,
    /// Upper bound on the whole upstream fetch, headers and body.
    pub timeout: Duration,
    pub max_bytes: u64,
    pub user_agent: String,
}

impl RehostConfig {
    #[must_use]
    pub fn from_app_config(config: &socdash_core::AppConfig) -> Self {
        Self {
            bucket: config.image_bucket.clone(),
            timeout: Duration::from_secs(config.rehost_timeout_secs),
            max_bytes: config.rehost_max_bytes,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl Default for RehostConfig {
    fn default() -> Self {
        Self {
            bucket: "rehosted-images".to_string(),
            timeout: Duration::from_secs(10),
            max_bytes: DEFAULT_MAX_BYTES,
            user_agent: "socdash/0.1 (image-rehost)".to_string(),
        }
    }
}

/// Downloads remote images and re-uploads them to a public bucket.
pub struct ImageRehoster {
    client: Client,
    store: Arc<dyn ObjectStore>,
    config: RehostConfig,
}

impl ImageRehoster {
    /// # Errors
    ///
    /// Returns [`RehostError::Fetch`] if the HTTP client cannot be built.
    pub fn new(store: Arc<dyn ObjectStore>, config: RehostConfig) -> Result<Self, RehostError> {
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(RehostError::Fetch)?;
        Ok(Self {
            client,
            store,
            config,
        })
    }

    /// Wire a [`StorageClient`]-backed rehoster from application config.
    ///
    /// Returns `Ok(None)` when the object store credentials are not set.
    ///
    /// # Errors
    ///
    /// Returns [`RehostError`] if either HTTP client cannot be built.
    pub fn from_app_config(config: &socdash_core::AppConfig) -> Result<Option<Self>, RehostError> {
        let Some((base_url, service_key)) = config.storage_credentials() else {
            return Ok(None);
        };
        let store = StorageClient::new(
            base_url,
            service_key,
            config.rehost_timeout_secs,
            &config.user_agent,
        )?;
        Self::new(Arc::new(store), RehostConfig::from_app_config(config)).map(Some)
    }

    #[must_use]
    pub fn config(&self) -> &RehostConfig {
        &self.config
    }

    /// Re-host the image at `raw_url` and return its new public URL.
    ///
    /// Validation (URL, status, content type, size) completes before any
    /// storage call, so a rejected request never leaves an object behind.
    ///
    /// # Errors
    ///
    /// Any [`RehostError`]; see the variants for the taxonomy.
    pub async fn rehost(&self, raw_url: &str) -> Result<String, RehostError> {
        let url = parse_image_url(raw_url)?;
        let image =
            fetch_image(&self.client, &url, self.config.timeout, self.config.max_bytes).await?;

        self.ensure_bucket().await?;

        let name = object_name(&image.content_type);
        let size = image.bytes.len();
        self.store
            .upload(&self.config.bucket, &name, &image.content_type, image.bytes)
            .await?;

        let public_url = self
            .store
            .public_url(&self.config.bucket, &name)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| StorageError::PublicUrl { name: name.clone() })?;

        tracing::info!(
            source = %url,
            object = %name,
            content_type = %image.content_type,
            bytes = size,
            "rehost: stored image"
        );
        Ok(public_url)
    }

    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        let buckets = self.store.list_buckets().await?;
        if buckets.iter().any(|b| b == &self.config.bucket) {
            return Ok(());
        }

        tracing::info!(bucket = %self.config.bucket, "rehost: creating missing bucket");
        self.store
            .create_bucket(&BucketSpec {
                name: self.config.bucket.clone(),
                public: true,
                file_size_limit: self.config.max_bytes,
            })
            .await
    }
}

/// Fresh object name: random UUID plus an extension matching the content type.
fn object_name(content_type: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension_for(content_type))
}
