//! CSV loaders: the hand-edited metadata sheet that ties institutional
//! values to each item folder.

use crate::error::{ErrorKind, Result};
use crate::util::{item_folders, name_of};
use exn::ResultExt;
use sipkit_config::{Folders, LoaderDefaults};
use sipkit_inventory::{csv_writer, stamp};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Exact header of a loader. Later stages refuse any other layout.
pub const LOADER_HEADER: [&str; 6] =
    ["System UUID", "Local ID", "Responsible Org", "Collection", "Item Type", "Packaged By"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderReport {
    pub path: PathBuf,
    pub rows: usize,
}

/// Write `csv_loaders/csv_loader<timestamp>.csv` with one row per item
/// folder in `ready_to_package`.
#[instrument(skip(folders, defaults), fields(processing = %processing.display()))]
pub fn write_loader(processing: &Path, folders: &Folders, defaults: &LoaderDefaults) -> Result<LoaderReport> {
    let objects = processing.join(&folders.ready_to_package);
    if !objects.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(objects));
    }
    let out_dir = processing.join(&folders.csv_loaders);
    fs::create_dir_all(&out_dir).or_raise(|| ErrorKind::Io(out_dir.clone()))?;
    let path = out_dir.join(format!("csv_loader{}.csv", stamp::file_stamp(stamp::now())));

    let fail = || ErrorKind::Csv(path.clone());
    let mut writer = csv_writer(&path).or_raise(fail)?;
    writer.write_record(LOADER_HEADER).or_raise(fail)?;
    let mut rows = 0;
    for folder in item_folders(&objects).or_raise(|| ErrorKind::Io(objects.clone()))? {
        writer
            .write_record([
                "",
                name_of(&folder).as_str(),
                defaults.responsible_org.as_str(),
                defaults.collection.as_str(),
                defaults.item_type.as_str(),
                defaults.packaged_by.as_str(),
            ])
            .or_raise(fail)?;
        rows += 1;
    }
    writer.flush().or_raise(fail)?;
    tracing::info!(path = %path.display(), rows, "wrote CSV loader");
    Ok(LoaderReport { path, rows })
}

/// A parsed loader with a verified header.
#[derive(Debug, Clone)]
pub struct Loader {
    header: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl Loader {
    #[must_use]
    pub fn header(&self) -> &csv::StringRecord {
        &self.header
    }

    #[must_use]
    pub fn rows(&self) -> &[csv::StringRecord] {
        &self.rows
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }
}

pub fn read_loader(path: &Path) -> Result<Loader> {
    let fail = || ErrorKind::Csv(path.to_path_buf());
    let mut reader = csv::ReaderBuilder::new().flexible(false).from_path(path).or_raise(fail)?;
    let header = reader.headers().or_raise(fail)?.clone();
    if !header.iter().eq(LOADER_HEADER) {
        tracing::warn!(found = ?header, "loader header mismatch");
        exn::bail!(ErrorKind::InvalidHeader(path.to_path_buf()));
    }
    let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>().or_raise(fail)?;
    Ok(Loader { header, rows })
}
