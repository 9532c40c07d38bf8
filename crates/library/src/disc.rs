//! Inventories of optical disc captures.

use crate::error::{ErrorKind, Result};
use crate::util::{copy_tree, name_of};
use derive_more::Display;
use exn::ResultExt;
use sipkit_inventory::{Layout, Options, generate, stamp};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Display, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    #[display("csv")]
    Csv,
    #[display("xlsx")]
    Xlsx,
}

/// What was written on the disc sleeve, and who captured it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscLabel {
    pub label: String,
    /// Archives (collection) name.
    pub archive: String,
    pub number: String,
    pub operator: String,
}

impl DiscLabel {
    /// `<archive>_<number>`, reduced to characters safe in a folder name.
    #[must_use]
    pub fn accession(&self) -> String {
        let raw = format!("{}_{}", self.archive.trim(), self.number.trim());
        raw.chars()
            .map(|c| match c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                true => c,
                false => '_',
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscReport {
    pub path: PathBuf,
    pub rows: usize,
    pub ds_store: usize,
    pub hidden: usize,
    pub unreadable: usize,
    /// Destination and file count of the accession copy, when requested.
    pub copied: Option<(PathBuf, usize)>,
}

/// Inventory the captured disc contents in `input` and write
/// `Inventory_<input name>_<timestamp>.<format>` to `output_dir`.
///
/// With `copy_to`, the tree is also copied into `<copy_to>/<accession>`,
/// which must not exist yet. `.DS_Store` files are counted, never deleted.
#[instrument(skip(label), fields(input = %input.display(), accession = %label.accession()))]
pub fn inventory_disc(
    input: &Path,
    output_dir: &Path,
    label: &DiscLabel,
    format: Format,
    copy_to: Option<&Path>,
) -> Result<DiscReport> {
    if !input.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(input.to_path_buf()));
    }
    let destination = copy_to.map(|dir| dir.join(label.accession()));
    if let Some(destination) = &destination
        && destination.exists()
    {
        exn::bail!(ErrorKind::AlreadyExists(destination.clone()));
    }

    let inventory = generate(input, Layout::Disc, &Options::default()).or_raise(|| ErrorKind::Inventory)?;
    fs::create_dir_all(output_dir).or_raise(|| ErrorKind::Io(output_dir.to_path_buf()))?;
    let path = output_dir.join(format!("Inventory_{}_{}.{format}", name_of(input), stamp::file_stamp(stamp::now())));
    match format {
        Format::Csv => inventory.write_csv(&path),
        Format::Xlsx => inventory.write_xlsx(&path),
    }
    .or_raise(|| ErrorKind::Inventory)?;
    tracing::info!(
        path = %path.display(),
        rows = inventory.rows.len(),
        label = %label.label,
        operator = %label.operator,
        "disc inventory written"
    );
    if inventory.ds_store > 0 {
        tracing::info!(count = inventory.ds_store, "skipped '.DS_Store' files");
    }

    let copied = match destination {
        Some(destination) => {
            let files = copy_tree(input, &destination).or_raise(|| ErrorKind::Io(destination.clone()))?;
            tracing::info!(destination = %destination.display(), files, "disc contents copied");
            Some((destination, files))
        },
        None => None,
    };
    Ok(DiscReport {
        path,
        rows: inventory.rows.len(),
        ds_store: inventory.ds_store,
        hidden: inventory.hidden,
        unreadable: inventory.unreadable,
        copied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn label() -> DiscLabel {
        DiscLabel {
            label: "Family photos 1998".into(),
            archive: "UAB Archives".into(),
            number: "12".into(),
            operator: "tester".into(),
        }
    }

    fn disc(root: &Path) -> PathBuf {
        let input = root.join("DISC01");
        fs::create_dir_all(input.join("DCIM")).unwrap();
        fs::write(input.join("DCIM/b.jpg"), b"b").unwrap();
        fs::write(input.join("a.jpg"), b"a").unwrap();
        fs::write(input.join(".DS_Store"), b"").unwrap();
        input
    }

    #[rstest]
    #[case("UAB Archives", "12", "UAB_Archives_12")]
    #[case(" MSS/4 ", "0003", "MSS_4_0003")]
    fn accession_is_folder_safe(#[case] archive: &str, #[case] number: &str, #[case] expected: &str) {
        let label = DiscLabel { archive: archive.into(), number: number.into(), ..DiscLabel::default() };
        assert_eq!(label.accession(), expected);
    }

    #[test]
    fn writes_numbered_csv_inventory() {
        let tmp = tempfile::tempdir().unwrap();
        let input = disc(tmp.path());
        let out = tmp.path().join("out");

        let report = inventory_disc(&input, &out, &label(), Format::Csv, None).unwrap();
        assert_eq!((report.rows, report.ds_store), (2, 1));
        assert!(input.join(".DS_Store").exists());
        assert!(name_of(&report.path).starts_with("Inventory_DISC01_"));

        let text = fs::read_to_string(&report.path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("No.,Filename,RelPath"));
        assert!(lines[1].starts_with("1,b.jpg,DISC01/DCIM/b.jpg,"));
        assert!(lines[2].starts_with("2,a.jpg,DISC01/a.jpg,"));
    }

    #[test]
    fn copies_into_accession_folder_once() {
        let tmp = tempfile::tempdir().unwrap();
        let input = disc(tmp.path());
        let vault = tmp.path().join("vault");
        fs::create_dir(&vault).unwrap();

        let report = inventory_disc(&input, &tmp.path().join("out"), &label(), Format::Xlsx, Some(&vault)).unwrap();
        assert!(name_of(&report.path).ends_with(".xlsx"));
        let (destination, _) = report.copied.unwrap();
        assert_eq!(destination, vault.join("UAB_Archives_12"));
        assert_eq!(fs::read(destination.join("DCIM/b.jpg")).unwrap(), b"b");

        let err = inventory_disc(&input, &tmp.path().join("out"), &label(), Format::Csv, Some(&vault)).unwrap_err();
        assert_eq!(*err, ErrorKind::AlreadyExists(vault.join("UAB_Archives_12")));
    }
}
