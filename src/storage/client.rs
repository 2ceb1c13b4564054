use async_trait::async_trait;
use url::Url;

use crate::error::AppError;

/// Object storage for uploaded images.
///
/// Abstracted as a trait so tests can use a mock without a real S3 instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `content` under `key` and return the URL it is publicly readable at.
    async fn store(&self, key: &str, content_type: &str, content: Vec<u8>) -> Result<String, AppError>;
}

/// S3 implementation of BlobStore.
///
/// Objects are written to one bucket; the returned URL is `key` resolved
/// against the configured public base URL (a CDN or the bucket website).
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base: Url,
}

impl S3BlobStore {
    /// Create an S3 blob store from the standard AWS environment.
    ///
    /// `endpoint` overrides the S3 endpoint (MinIO, LocalStack, ...) and
    /// switches to path-style addressing.
    pub async fn connect(bucket: String, endpoint: Option<&str>, public_base: Url) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(endpoint) = endpoint {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let sdk_config = config_loader.load().await;
        let client = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(endpoint.is_some())
                .build(),
        );

        Self::new(client, bucket, public_base)
    }

    /// Create with explicit values (useful for testing / DI).
    pub fn new(client: aws_sdk_s3::Client, bucket: String, public_base: Url) -> Self {
        Self {
            client,
            bucket,
            public_base: with_trailing_slash(public_base),
        }
    }

    /// Public URL of the object stored under `key`.
    pub fn public_url(&self, key: &str) -> Result<String, AppError> {
        self.public_base
            .join(key)
            .map(String::from)
            .map_err(|e| AppError::Storage(format!("Cannot build public URL for '{key}': {e}")))
    }
}

/// `Url::join` replaces the last path segment unless the base ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn store(&self, key: &str, content_type: &str, content: Vec<u8>) -> Result<String, AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(content.into())
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to put object '{}': {}", key, e)))?;

        self.public_url(key)
    }
}
