//! Presigned URL generation for uploads and downloads.
//!
//! Object keys are syllabus ids. Upload URLs carry the client's CRC32
//! checksum, so object storage rejects a body that does not match what the
//! client declared at intake.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::ChecksumAlgorithm;
use aws_sdk_s3::Client;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for storage signer failures.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// The signer could not be configured (bad credentials pair, bad TTL, ...).
    #[error("Storage configuration error: {0}")]
    Config(String),

    /// The SDK failed to produce a presigned request.
    #[error("Presign failed: {0}")]
    Presign(String),
}

// ---------------------------------------------------------------------------
// Presigner trait
// ---------------------------------------------------------------------------

/// Produces time-limited URLs that let clients talk to object storage
/// directly.
#[async_trait]
pub trait Presigner: Send + Sync {
    /// URL for a single PUT of `object_key` with the given content type and
    /// base64 CRC32 checksum.
    async fn presign_upload(
        &self,
        object_key: &str,
        content_type: &str,
        checksum: &str,
        ttl_secs: u64,
    ) -> Result<String, CloudError>;

    /// URL for a GET of `object_key`.
    async fn presign_download(&self, object_key: &str, ttl_secs: u64)
        -> Result<String, CloudError>;
}

// ---------------------------------------------------------------------------
// S3Config
// ---------------------------------------------------------------------------

/// Default region when `S3_REGION` is not set.
const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for the S3 bucket holding syllabus files.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services. `None` means AWS.
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Path-style URLs (`endpoint/bucket/key`), required by MinIO.
    pub force_path_style: bool,
}

impl S3Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable               | Required | Default     |
    /// |------------------------|----------|-------------|
    /// | `S3_BUCKET`            | yes      |             |
    /// | `S3_REGION`            | no       | `us-east-1` |
    /// | `S3_ENDPOINT`          | no       |             |
    /// | `S3_ACCESS_KEY_ID`     | no       |             |
    /// | `S3_SECRET_ACCESS_KEY` | no       |             |
    /// | `S3_FORCE_PATH_STYLE`  | no       | `false`     |
    ///
    /// # Panics
    ///
    /// Panics if `S3_BUCKET` is not set.
    pub fn from_env() -> Self {
        let bucket = std::env::var("S3_BUCKET").expect("S3_BUCKET must be set");
        Self {
            bucket,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            endpoint: std::env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            access_key_id: std::env::var("S3_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("S3_SECRET_ACCESS_KEY").ok(),
            force_path_style: std::env::var("S3_FORCE_PATH_STYLE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

/// Prepend `http://` to bare `host:port` endpoints such as `minio:9000`.
fn normalize_endpoint(endpoint: &str) -> String {
    let lower = endpoint.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

fn presigning_config(ttl_secs: u64) -> Result<PresigningConfig, CloudError> {
    PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
        .map_err(|e| CloudError::Config(e.to_string()))
}

// ---------------------------------------------------------------------------
// S3Presigner
// ---------------------------------------------------------------------------

/// [`Presigner`] backed by the AWS SDK.
pub struct S3Presigner {
    client: Client,
    bucket: String,
}

impl std::fmt::Debug for S3Presigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Presigner")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3Presigner {
    /// Build a presigner from configuration.
    ///
    /// Explicit credentials are used when both halves are set; otherwise the
    /// ambient AWS credential chain (env, profile, instance role) is loaded.
    pub async fn new(config: S3Config) -> Result<Self, CloudError> {
        if config.access_key_id.is_some() ^ config.secret_access_key.is_some() {
            return Err(CloudError::Config(
                "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together".to_string(),
            ));
        }

        let region = aws_config::Region::new(config.region.clone());
        let mut builder = match (config.access_key_id, config.secret_access_key) {
            (Some(key_id), Some(secret)) => aws_sdk_s3::config::Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(Credentials::new(key_id, secret, None, None, "syllabi-config")),
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
        };

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(normalize_endpoint(endpoint));
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        tracing::info!(bucket = %config.bucket, region = %config.region, "S3 presigner ready");

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
        })
    }
}

#[async_trait]
impl Presigner for S3Presigner {
    async fn presign_upload(
        &self,
        object_key: &str,
        content_type: &str,
        checksum: &str,
        ttl_secs: u64,
    ) -> Result<String, CloudError> {
        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(object_key)
            .content_type(content_type)
            .checksum_algorithm(ChecksumAlgorithm::Crc32)
            .checksum_crc32(checksum)
            .presigned(presigning_config(ttl_secs)?)
            .await
            .map_err(|e| CloudError::Presign(e.to_string()))?;

        Ok(request.uri().to_string())
    }

    async fn presign_download(
        &self,
        object_key: &str,
        ttl_secs: u64,
    ) -> Result<String, CloudError> {
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(object_key)
            .presigned(presigning_config(ttl_secs)?)
            .await
            .map_err(|e| CloudError::Presign(e.to_string()))?;

        Ok(request.uri().to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
