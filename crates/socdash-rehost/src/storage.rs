//! Object storage seam and the Supabase-compatible REST client behind it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to list buckets: {0}")]
    BucketList(String),

    #[error("failed to create bucket {bucket}: {reason}")]
    BucketCreate { bucket: String, reason: String },

    #[error("object {name} already exists in bucket {bucket}")]
    AlreadyExists { bucket: String, name: String },

    #[error("upload of {name} failed: {reason}")]
    Upload { name: String, reason: String },

    #[error("could not produce a public URL for {name}")]
    PublicUrl { name: String },

    #[error("storage HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Settings for a bucket created on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpec {
    pub name: String,
    pub public: bool,
    pub file_size_limit: u64,
}

/// Bucket-based object store: list, create, upload, public URL.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<String>, StorageError>;

    /// Create a bucket. Creating a bucket that already exists is not an error.
    async fn create_bucket(&self, spec: &BucketSpec) -> Result<(), StorageError>;

    /// Upload a new object. Fails with [`StorageError::AlreadyExists`] rather
    /// than overwriting an existing object of the same name.
    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError>;

    fn public_url(&self, bucket: &str, name: &str) -> Option<String>;
}

#[derive(Deserialize)]
struct BucketEntry {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Serialize)]
struct CreateBucketBody<'a> {
    id: &'a str,
    name: &'a str,
    public: bool,
    file_size_limit: u64,
}

/// Client for a Supabase-Storage-compatible REST API.
///
/// Requests authenticate with the service key as both `apikey` and bearer
/// token.
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl StorageClient {
    /// # Errors
    ///
    /// Returns [`StorageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        service_key: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/storage/v1/{path}", self.base_url)
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

/// Storage APIs report duplicates either as 409 or as a 400 whose body says so.
fn is_duplicate(status: StatusCode, body: &str) -> bool {
    status == StatusCode::CONFLICT
        || body.contains("Duplicate")
        || body.contains("already exists")
}

#[async_trait]
impl ObjectStore for StorageClient {
    async fn list_buckets(&self) -> Result<Vec<String>, StorageError> {
        let response = self
            .authed(self.client.get(self.endpoint("bucket")))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::BucketList(format!("HTTP {status}: {body}")));
        }
        let buckets: Vec<BucketEntry> = response
            .json()
            .await
            .map_err(|e| StorageError::BucketList(e.to_string()))?;
        Ok(buckets
            .into_iter()
            .filter_map(|b| b.name.or(b.id))
            .collect())
    }

    async fn create_bucket(&self, spec: &BucketSpec) -> Result<(), StorageError> {
        let response = self
            .authed(self.client.post(self.endpoint("bucket")))
            .json(&CreateBucketBody {
                id: &spec.name,
                name: &spec.name,
                public: spec.public,
                file_size_limit: spec.file_size_limit,
            })
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if is_duplicate(status, &body) {
            tracing::debug!(bucket = %spec.name, "storage: bucket created concurrently");
            return Ok(());
        }
        Err(StorageError::BucketCreate {
            bucket: spec.name.clone(),
            reason: format!("HTTP {status}: {body}"),
        })
    }

    async fn upload(
        &self,
        bucket: &str,
        name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), StorageError> {
        let response = self
            .authed(
                self.client
                    .post(self.endpoint(&format!("object/{bucket}/{name}"))),
            )
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        if is_duplicate(status, &body) {
            return Err(StorageError::AlreadyExists {
                bucket: bucket.to_string(),
                name: name.to_string(),
            });
        }
        Err(StorageError::Upload {
            name: name.to_string(),
            reason: format!("HTTP {status}: {body}"),
        })
    }

    fn public_url(&self, bucket: &str, name: &str) -> Option<String> {
        let base = reqwest::Url::parse(&format!("{}/", self.base_url)).ok()?;
        base.join(&format!("storage/v1/object/public/{bucket}/{name}"))
            .ok()
            .map(String::from)
    }
}
