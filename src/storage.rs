use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Lifetime of a presigned resume upload URL.
pub const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    #[error("object key is empty after sanitization")]
    InvalidKey,

    #[error("presign request failed: {0}")]
    Presign(String),
}

/// StorageService
///
/// Artifact storage used for application resumes. Students upload directly to the bucket
/// through a presigned URL; the application only ever stores the object key.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if missing. Only called for the local MinIO setup.
    async fn ensure_bucket_exists(&self);

    /// Returns a time-limited PUT URL for `key`, bound to `content_type`.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError>;
}

/// S3StorageClient
///
/// S3-compatible implementation (MinIO locally, any S3 endpoint in production).
/// Path-style addressing is forced for MinIO compatibility.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket fails harmlessly when the bucket is already there.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, "create_bucket skipped: {}", e);
        }
    }

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError> {
        let key = sanitize_key(key);
        if key.is_empty() {
            return Err(StorageError::InvalidKey);
        }

        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }
}

/// Drops empty, `.` and `..` segments so a key can never climb out of its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// In-memory stand-in for tests: returns a deterministic URL, or fails on demand.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn presign_upload(&self, key: &str, _content_type: &str) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Presign("simulated storage outage".to_string()));
        }

        let key = sanitize_key(key);
        if key.is_empty() {
            return Err(StorageError::InvalidKey);
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            key
        ))
    }
}

/// StorageState
///
/// Shared handle to the storage collaborator held in `AppState`.
pub type StorageState = Arc<dyn StorageService>;
