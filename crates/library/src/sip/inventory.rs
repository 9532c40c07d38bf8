use crate::error::{ErrorKind, Result};
use crate::operator::{Operator, Prompt};
use crate::util::{name_of, sorted_entries};
use exn::ResultExt;
use sipkit_bag::is_bag;
use sipkit_inventory::{Layout, Options, generate};
use std::fmt;
use std::path::Path;
use tracing::instrument;

pub const MANIFEST_CSV: &str = "manifest.csv";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventoryReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for InventoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "created {} 'manifest.csv' files ({} skipped, {} failed)", self.written, self.skipped, self.failed)
    }
}

/// Write `<item>/manifest.csv` for every item folder that does not have one.
///
/// Pre-bagged items are inventoried from `<item>/<item>`, so the manifest
/// describes the payload and not the metadata files next to it.
#[instrument(skip(operator), fields(items_dir = %items_dir.display()))]
pub fn inventory_items(items_dir: &Path, operator: &mut dyn Operator) -> Result<InventoryReport> {
    if !items_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(items_dir.to_path_buf()));
    }
    let options = Options { purge_ds_store: true };
    let mut report = InventoryReport::default();
    for item in sorted_entries(items_dir).or_raise(|| ErrorKind::Io(items_dir.to_path_buf()))? {
        if !item.is_dir() {
            continue;
        }
        let name = name_of(&item);
        if is_bag(&item) && operator.confirm(&Prompt::SkipBag { item: name.clone() }) {
            report.skipped += 1;
            continue;
        }
        let manifest = item.join(MANIFEST_CSV);
        if manifest.exists() {
            tracing::warn!(item = %name, "manifest.csv already exists, skipping inventory");
            report.skipped += 1;
            continue;
        }
        let nested = item.join(&name);
        let root = if nested.is_dir() { nested } else { item.clone() };
        let written = generate(&root, Layout::Item, &options).and_then(|inventory| inventory.write_csv(&manifest));
        match written {
            Ok(()) => {
                tracing::info!(item = %name, "inventoried");
                report.written += 1;
            },
            Err(e) => {
                tracing::error!(item = %name, error = ?e, "inventory failed");
                report.failed += 1;
            },
        }
    }
    Ok(report)
}
