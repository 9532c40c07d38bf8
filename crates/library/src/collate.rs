//! Gathering flat scanner output into one folder per item.

use crate::error::{ErrorKind, Result};
use crate::naming::validate_batch;
use crate::operator::{Conflict, Operator};
use crate::util::{copy_file, is_hidden, name_of, sorted_entries};
use exn::ResultExt;
use sipkit_config::Config;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollateReport {
    /// Item folders created (or recreated) and filled.
    pub items: usize,
    /// Page files copied.
    pub copied: usize,
    /// Items left alone because their folder already existed.
    pub skipped_items: usize,
    /// Page files that could not be copied.
    pub failed: usize,
    /// Entries in the input folder that are not page files.
    pub ignored: usize,
    /// The operator stopped the batch part-way.
    pub quit: bool,
}

/// Copy every page file in `input` into
/// `<processing>/ready_to_package/<item id>/`.
///
/// All candidate names are validated before anything is created, so a single
/// misnamed file leaves the processing folder untouched.
#[instrument(skip(config, operator), fields(input = %input.display(), processing = %processing.display()))]
pub fn collate(input: &Path, processing: &Path, config: &Config, operator: &mut dyn Operator) -> Result<CollateReport> {
    if !input.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(input.to_path_buf()));
    }
    let mut report = CollateReport::default();
    let mut candidates: Vec<(String, PathBuf)> = Vec::new();
    for path in sorted_entries(input).or_raise(|| ErrorKind::Io(input.to_path_buf()))? {
        let name = name_of(&path);
        if path.is_file() && !is_hidden(&name) && config.collate.accepts(&path) {
            candidates.push((name, path));
        } else {
            tracing::debug!(path = %path.display(), "ignored");
            report.ignored += 1;
        }
    }
    let pages = validate_batch(candidates.iter().map(|(name, _)| name.as_str()))?;

    let mut items: BTreeMap<String, Vec<(String, PathBuf)>> = BTreeMap::new();
    for (page, candidate) in pages.into_iter().zip(candidates) {
        items.entry(page.item_id).or_default().push(candidate);
    }

    let objects = processing.join(&config.folders.ready_to_package);
    fs::create_dir_all(&objects).or_raise(|| ErrorKind::Io(objects.clone()))?;

    for (item_id, files) in items {
        let folder = objects.join(&item_id);
        if folder.exists() {
            match operator.conflict(&folder) {
                Conflict::Overwrite => {
                    fs::remove_dir_all(&folder).or_raise(|| ErrorKind::Io(folder.clone()))?;
                },
                Conflict::Skip => {
                    report.skipped_items += 1;
                    continue;
                },
                Conflict::Quit => {
                    tracing::warn!(item = %item_id, "collation stopped by operator");
                    report.quit = true;
                    break;
                },
            }
        }
        fs::create_dir(&folder).or_raise(|| ErrorKind::Io(folder.clone()))?;
        report.items += 1;
        for (name, source) in files {
            match copy_file(&source, &folder.join(&name)) {
                Ok(_) => report.copied += 1,
                Err(e) => {
                    tracing::error!(file = %name, error = %e, "could not copy");
                    report.failed += 1;
                },
            }
        }
        tracing::info!(item = %item_id, "collated");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Unattended;
    use crate::operator::tests::Scripted;

    fn scans(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
    }

    #[test]
    fn groups_pages_by_item() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("Output");
        scans(
            &output,
            &[
                "AAAA_BBB000001_0001a.tif",
                "AAAA_BBB000001_0001b.tif",
                "AAAA_BBB000002_0001a.tif",
                ".AAAA_BBB000003_0001a.tif",
                "Thumbs.db",
            ],
        );
        let report = collate(&output, tmp.path(), &Config::default(), &mut Unattended).unwrap();
        assert_eq!(report, CollateReport { items: 2, copied: 3, ignored: 2, ..CollateReport::default() });
        let objects = tmp.path().join("ready_to_package");
        assert!(objects.join("AAAA_BBB000001/AAAA_BBB000001_0001b.tif").is_file());
        assert_eq!(fs::read_dir(objects.join("AAAA_BBB000002")).unwrap().count(), 1);
    }

    #[test]
    fn misnamed_file_aborts_before_any_change() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("Output");
        scans(&output, &["AAAA_BBB000001_0001a.tif", "scan 12.tif"]);
        let err = collate(&output, tmp.path(), &Config::default(), &mut Unattended).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidName("scan 12.tif".into()));
        assert!(!tmp.path().join("ready_to_package").exists());
    }

    #[rstest::rstest]
    #[case(Conflict::Overwrite, 1, 0, false)]
    #[case(Conflict::Skip, 0, 1, false)]
    #[case(Conflict::Quit, 0, 0, true)]
    fn existing_item_folder(#[case] choice: Conflict, #[case] items: usize, #[case] skipped: usize, #[case] quit: bool) {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("Output");
        scans(&output, &["AAAA_BBB000001_0001a.tif"]);
        let existing = tmp.path().join("ready_to_package/AAAA_BBB000001");
        fs::create_dir_all(&existing).unwrap();
        fs::write(existing.join("stale.tif"), b"old").unwrap();

        let mut operator = Scripted::resolving(&[choice]);
        let report = collate(&output, tmp.path(), &Config::default(), &mut operator).unwrap();
        assert_eq!((report.items, report.skipped_items, report.quit), (items, skipped, quit));
        assert_eq!(existing.join("stale.tif").exists(), choice != Conflict::Overwrite);
    }
}
