use crate::error::{ErrorKind, Result};
use crate::loader::read_loader;
use crate::operator::{Operator, Prompt};
use exn::{OptionExt, ResultExt};
use sipkit_bag::is_bag;
use sipkit_inventory::csv_writer;
use std::fmt;
use std::path::{Component, Path};
use tracing::instrument;

pub const METADATA_CSV: &str = "metadata.csv";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetadataReport {
    pub written: usize,
    /// Rows left alone: bags the operator skipped, or existing files kept.
    pub skipped: usize,
    /// Rows whose ID names no folder in the items directory.
    pub missing: usize,
}

impl fmt::Display for MetadataReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "created {} 'metadata.csv' files ({} skipped, {} not found)", self.written, self.skipped, self.missing)
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}

/// Write a one-row `metadata.csv` into each item folder named by the loader's
/// `id_column`.
#[instrument(skip(operator), fields(items_dir = %items_dir.display(), csv = %csv.display()))]
pub fn stamp_metadata(
    items_dir: &Path,
    csv: &Path,
    id_column: &str,
    operator: &mut dyn Operator,
) -> Result<MetadataReport> {
    if !items_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(items_dir.to_path_buf()));
    }
    let loader = read_loader(csv)?;
    let column = loader.column(id_column).ok_or_raise(|| ErrorKind::UnknownColumn(id_column.to_string()))?;

    let mut report = MetadataReport::default();
    let mut overwrite_all: Option<bool> = None;
    for row in loader.rows() {
        let id = row.get(column).unwrap_or_default().trim();
        let folder = items_dir.join(id);
        if !is_plain_name(id) || !folder.is_dir() {
            tracing::warn!(id, "no item folder for row");
            report.missing += 1;
            continue;
        }
        if is_bag(&folder) && operator.confirm(&Prompt::SkipBag { item: id.to_string() }) {
            report.skipped += 1;
            continue;
        }
        let target = folder.join(METADATA_CSV);
        if target.exists() && !*overwrite_all.get_or_insert_with(|| operator.confirm(&Prompt::OverwriteAllMetadata)) {
            report.skipped += 1;
            continue;
        }

        let fail = || ErrorKind::Csv(target.clone());
        let mut writer = csv_writer(&target).or_raise(fail)?;
        writer.write_record(loader.header()).or_raise(fail)?;
        writer.write_record(row).or_raise(fail)?;
        writer.flush().or_raise(fail)?;
        tracing::debug!(item = id, "metadata written");
        report.written += 1;
    }
    tracing::info!(written = report.written, skipped = report.skipped, missing = report.missing, "metadata stamped");
    Ok(report)
}
