//! Local filesystem storage backend.
//!
//! Uploads are plain copies into a configured directory, done with
//! `tokio::fs` for async I/O.

use crate::error::ErrorKind;
use crate::{StorageBackend, error::Result, path::validate as validate_path};
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem storage backend.
///
/// All keys are relative to the configured root directory.
///
/// # Examples
///
/// ```no_run
/// use sipkit_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("staging", "/absolute/path/to/staging")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}

impl LocalBackend {
    /// Create a new local filesystem backend, creating `root` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute or is not a directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Non-async: it happens once, and keeps the constructor sync.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    /// Validate `key` and join it onto the root directory.
    fn absolute_path(&self, key: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(key.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, key: &Path) -> Result<bool> {
        let path = self.absolute_path(key)?;
        Ok(fs::try_exists(&path).await.map_err(|e| Self::map_io_error(e, &path))?)
    }

    async fn upload(&self, key: &Path, local: &Path) -> Result<u64> {
        let path = self.absolute_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, parent))?;
        }
        Ok(fs::copy(local, &path).await.map_err(|e| Self::map_io_error(e, local))?)
    }

    async fn delete(&self, key: &Path) -> Result<()> {
        let path = self.absolute_path(key)?;
        fs::remove_file(&path).await.map_err(|e| Self::map_io_error(e, &path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_root_rejected() {
        let err = LocalBackend::new("name", "relative/root").unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPath(_)));
    }

    #[tokio::test]
    async fn test_upload_creates_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("ITEM.tar.gz");
        std::fs::write(&source, b"archive").unwrap();
        let backend = LocalBackend::new("name", temp_dir.path().join("bucket")).unwrap();
        let sent = backend.upload(Path::new("a/b/ITEM.tar.gz"), &source).await.unwrap();
        assert_eq!(sent, 7);
        assert!(backend.exists(Path::new("a/b/ITEM.tar.gz")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("file.tar");
        std::fs::write(&source, b"data").unwrap();
        let backend = LocalBackend::new("name", temp_dir.path().join("bucket")).unwrap();
        backend.upload(Path::new("file.tar"), &source).await.unwrap();
        backend.delete(Path::new("file.tar")).await.unwrap();
        assert!(!backend.exists(Path::new("file.tar")).await.unwrap());
        // Deleting nonexistent file returns error
        let err = backend.delete(Path::new("file.tar")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("name", temp_dir.path().join("bucket")).unwrap();
        let err = backend.upload(Path::new("x.tar"), &temp_dir.path().join("missing.tar")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_path_security() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("file.tar");
        std::fs::write(&source, b"data").unwrap();
        let backend = LocalBackend::new("name", temp_dir.path().join("bucket")).unwrap();
        // Attempts to escape the root should fail
        assert!(backend.upload(Path::new("../escaped.tar"), &source).await.is_err());
        assert!(backend.exists(Path::new("a/../../b")).await.is_err());
        assert!(backend.delete(Path::new("../../file")).await.is_err());
    }
}
