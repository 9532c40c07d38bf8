use crate::error::{ErrorKind, Result};
use crate::util::{name_of, sorted_entries};
use exn::ResultExt;
use sipkit_compress::Compression;
use sipkit_compress::archive::pack_dir;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TarReport {
    pub out_dir: PathBuf,
    pub created: usize,
    /// Archives already present in the output folder, left untouched.
    pub existing: usize,
    /// Plain files in the items folder, ignored.
    pub not_folders: usize,
    pub failed: usize,
}

impl fmt::Display for TarReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "created {} tar archives", self.created)?;
        if self.existing > 0 {
            write!(f, " ({} already existed)", self.existing)?;
        }
        if self.failed > 0 {
            write!(f, " ({} failed)", self.failed)?;
        }
        Ok(())
    }
}

/// Archive each item folder into `out_dir/<item><ext>`.
#[instrument(fields(items_dir = %items_dir.display(), out_dir = %out_dir.display(), %compression))]
pub fn tar_items(items_dir: &Path, out_dir: &Path, compression: Compression) -> Result<TarReport> {
    if !items_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(items_dir.to_path_buf()));
    }
    fs::create_dir_all(out_dir).or_raise(|| ErrorKind::Io(out_dir.to_path_buf()))?;
    let mut report = TarReport { out_dir: out_dir.to_path_buf(), ..TarReport::default() };
    for item in sorted_entries(items_dir).or_raise(|| ErrorKind::Io(items_dir.to_path_buf()))? {
        if !item.is_dir() {
            report.not_folders += 1;
            continue;
        }
        let stem = item.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| name_of(&item));
        let archive = out_dir.join(format!("{stem}{}", compression.archive_extension()));
        if archive.exists() {
            tracing::warn!(archive = %archive.display(), "archive already exists, not recreated");
            report.existing += 1;
            continue;
        }
        match pack_dir(&item, &archive, compression) {
            Ok(()) => {
                tracing::info!(archive = %archive.display(), "archived");
                report.created += 1;
            },
            Err(e) => {
                tracing::error!(item = %item.display(), error = ?e, "could not archive");
                report.failed += 1;
            },
        }
    }
    Ok(report)
}
