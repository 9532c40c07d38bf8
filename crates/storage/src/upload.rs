use crate::backend::StorageBackend;
use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub found: usize,
    pub uploaded: usize,
    pub failed: Vec<PathBuf>,
}

/// Attempts per file when the failure is transient.
const UPLOAD_ATTEMPTS: usize = 2;

async fn upload_with_retry(backend: &dyn StorageBackend, key: &Path, file: &Path) -> Result<u64> {
    let mut attempt = 1;
    loop {
        match backend.upload(key, file).await {
            Err(e) if attempt < UPLOAD_ATTEMPTS && e.is_retryable() => {
                tracing::warn!(file = %key.display(), attempt, error = ?e, "upload failed, retrying");
                attempt += 1;
            },
            result => return result,
        }
    }
}

/// Upload every visible regular file directly inside `dir`, keyed by its
/// file name. Subfolders are not descended into. A transient failure is
/// retried once; a file that still fails is logged and recorded and the rest
/// of the batch carries on.
#[instrument(skip(backend), fields(destination = backend.name(), dir = %dir.display()))]
pub async fn upload_dir(backend: &dyn StorageBackend, dir: &Path) -> Result<UploadReport> {
    let mut entries = fs::read_dir(dir).await.map_err(ErrorKind::Io)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(ErrorKind::Io)? {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if entry.file_type().await.map_err(ErrorKind::Io)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut report = UploadReport { found: files.len(), ..UploadReport::default() };
    for file in files {
        let Some(key) = file.file_name().map(Path::new) else {
            continue;
        };
        match upload_with_retry(backend, key, &file).await {
            Ok(bytes) => {
                tracing::info!(file = %key.display(), bytes, "upload successful");
                report.uploaded += 1;
            },
            Err(e) => {
                tracing::error!(file = %key.display(), error = ?e, "upload failed");
                report.failed.push(file);
            },
        }
    }
    tracing::info!(found = report.found, uploaded = report.uploaded, "upload batch complete");
    Ok(report)
}
