//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, the single interface the
//! upload batch talks to, whether the target is a local staging folder or an
//! S3 receiving bucket.

mod local;
#[cfg(feature = "s3")]
mod s3;

pub use self::local::LocalBackend;
#[cfg(feature = "s3")]
pub use self::s3::S3Backend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for upload targets.
///
/// # Key Handling
/// Keys are relative to the backend root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations
/// enforce this validation.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use sipkit_storage::{backend::StorageBackend, error::Result};
///
/// async fn upload_once(backend: &dyn StorageBackend, archive: &Path) -> Result<bool> {
///     let key = Path::new("AAAA_BBB000001.tar.gz");
///     if backend.exists(key).await? {
///         return Ok(false);
///     }
///     backend.upload(key, archive).await?;
///     Ok(true)
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the backend, used for logging only.
    fn name(&self) -> &str;

    /// Check if an object exists under `key`.
    async fn exists(&self, key: &Path) -> Result<bool>;

    /// Store the local file at `local` under `key`, replacing any existing
    /// object. Returns the number of bytes sent.
    async fn upload(&self, key: &Path, local: &Path) -> Result<u64>;

    /// Delete the object stored under `key`.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) when there
    /// is nothing to delete, where the backend can tell.
    async fn delete(&self, key: &Path) -> Result<()>;
}
