//! Per-file metadata as recorded in manifests.

use crate::stamp;
use std::fs::Metadata;
use std::path::Path;

const SIZE_UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

/// Decimal (base-1000) human readable size rounded to two places with
/// trailing zeros dropped, keeping at least one: `0B`, `999.0B`, `1.5KB`,
/// `1.23MB`.
#[must_use]
pub fn human_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1000.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }
    let mut number = format!("{:.2}", (scaled * 100.0).round() / 100.0);
    while number.ends_with('0') && !number.ends_with(".0") {
        number.pop();
    }
    format!("{number}{}", SIZE_UNITS[unit])
}

/// Everything a manifest row records about a file apart from checksums.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub mime: String,
    /// Status change time on Unix, creation time elsewhere.
    pub changed: String,
    pub modified: String,
    pub accessed: String,
    pub mode: String,
    pub inode: String,
    pub device: String,
    pub nlink: String,
    pub uid: String,
    pub gid: String,
}

impl FileStat {
    pub fn from_metadata(path: &Path, metadata: &Metadata) -> Self {
        let mime = mime_guess::from_path(path).first_raw().unwrap_or_default().to_string();
        let mut stat = Self {
            size: metadata.len(),
            mime,
            modified: metadata.modified().map(stamp::display_system).unwrap_or_default(),
            accessed: metadata.accessed().map(stamp::display_system).unwrap_or_default(),
            ..Self::default()
        };
        stat.fill_platform(metadata);
        stat
    }

    #[must_use]
    pub fn human_size(&self) -> String {
        human_size(self.size)
    }

    #[cfg(unix)]
    fn fill_platform(&mut self, metadata: &Metadata) {
        use std::os::unix::fs::MetadataExt;
        use time::OffsetDateTime;

        let changed = OffsetDateTime::from_unix_timestamp(metadata.ctime())
            .map(|t| stamp::display_system(t.into()))
            .unwrap_or_default();
        self.changed = changed;
        self.mode = metadata.mode().to_string();
        self.inode = metadata.ino().to_string();
        self.device = metadata.dev().to_string();
        self.nlink = metadata.nlink().to_string();
        self.uid = metadata.uid().to_string();
        self.gid = metadata.gid().to_string();
    }

    #[cfg(not(unix))]
    fn fill_platform(&mut self, metadata: &Metadata) {
        self.changed = metadata.created().map(stamp::display_system).unwrap_or_default();
    }
}
