//! S3-compatible storage backend.
//!
//! APTrust receives bags through per-institution S3 buckets, one for the
//! demo environment and one for production.
//!
//! # Credentials
//!
//! Credentials are supplied explicitly by the caller and held in memory only.
//! Nothing is read from, or written to, `~/.aws`.

use crate::{
    StorageBackend,
    error::{ErrorKind, Result},
    validate_path,
};
use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    config::{BehaviorVersion, Credentials, Region, retry::RetryConfig},
    primitives::ByteStream,
};
use exn::{OptionExt, ResultExt};
use std::path::Path;

/// S3-compatible storage backend.
///
/// Stores objects in a bucket, optionally under a key prefix.
///
/// # Examples
///
/// ```no_run
/// use sipkit_storage::backend::S3Backend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = S3Backend::new(
///     "demo",
///     "aptrust.receiving.test.example.edu",
///     None,
///     "us-east-1",
///     None::<String>,
///     "access_key_id",
///     "secret_access_key",
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct S3Backend {
    name: String,
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3Backend {
    /// Create a new S3 storage backend.
    ///
    /// # Arguments
    /// * `name` - A name for this backend (used in logging)
    /// * `bucket` - S3 bucket name
    /// * `prefix` - Optional key prefix (acts as virtual directory)
    /// * `region` - AWS region
    /// * `endpoint` - Custom endpoint URL for S3-compatible services
    /// * `key_id` - Access key ID
    /// * `key_secret` - Secret access key
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        prefix: Option<String>,
        region: impl Into<String>,
        endpoint: Option<impl Into<String>>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix
            .map(validate_path)
            .transpose()?
            .map(|p| p.to_str().map(|s| s.to_string()).ok_or_raise(|| ErrorKind::InvalidPath(p)))
            .transpose()?;
        let credentials = Credentials::new(key_id, key_secret, None, None, "sipkit");
        let mut config_builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            // 1 initial attempt + 3 retries with exponential backoff
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            .force_path_style(true);
        if let Some(endpoint_url) = endpoint {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }
        Ok(Self {
            name: name.into(),
            client: Client::from_conf(config_builder.build()),
            bucket: bucket.into(),
            prefix,
        })
    }

    /// Construct the full S3 key from a relative key path.
    fn full_key(&self, key: &Path) -> Result<String> {
        let validated = validate_path(key)?;
        let key = validated.to_str().ok_or_raise(|| ErrorKind::InvalidPath(validated.clone()))?;
        Ok(join_key(self.prefix.as_deref(), key))
    }
}

fn join_key(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), key),
        None => key.to_string(),
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &Path) -> Result<bool> {
        let full_key = self.full_key(key)?;
        match self.client.head_object().bucket(&self.bucket).key(&full_key).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(e).or_raise(|| ErrorKind::Network(format!("HEAD {}/{full_key}", self.bucket))),
        }
    }

    // TODO: Switch to multipart uploads for archives over the 5 GB single PUT limit.
    async fn upload(&self, key: &Path, local: &Path) -> Result<u64> {
        let full_key = self.full_key(key)?;
        let size = tokio::fs::metadata(local).await.map_err(ErrorKind::Io)?.len();
        let body = ByteStream::from_path(local)
            .await
            .or_raise(|| ErrorKind::BackendError(format!("could not read {}", local.display())))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .content_length(i64::try_from(size).unwrap_or(i64::MAX))
            .body(body)
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("PUT {}/{full_key}", self.bucket)))?;
        tracing::debug!(bucket = %self.bucket, key = %full_key, size, "object uploaded");
        Ok(size)
    }

    async fn delete(&self, key: &Path) -> Result<()> {
        let full_key = self.full_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .or_raise(|| ErrorKind::Network(format!("DELETE {}/{full_key}", self.bucket)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_key_without_prefix() {
        assert_eq!(join_key(None, "ITEM.tar.gz"), "ITEM.tar.gz");
    }

    #[test]
    fn test_full_key_with_trailing_slash_prefix() {
        assert_eq!(join_key(Some("incoming/"), "ITEM.tar.gz"), "incoming/ITEM.tar.gz");
    }

    #[test]
    fn test_traversal_rejected() {
        let backend = S3Backend::new("demo", "bucket", None, "us-east-1", None::<String>, "id", "secret").unwrap();
        assert!(backend.full_key(Path::new("../ITEM.tar")).is_err());
        assert_eq!(backend.full_key(Path::new("./ITEM.tar")).unwrap(), "ITEM.tar");
    }
}
