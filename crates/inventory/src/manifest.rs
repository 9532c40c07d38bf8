//! Directory inventories.
//!
//! [`generate`] walks a tree, hashes and stats every visible file, then sorts
//! the rows by relative path and numbers them from 1. Walk order is whatever
//! the filesystem returns, so nothing is written until the walk is complete.

use crate::error::{ErrorKind, Result};
use crate::hash::{Algorithm, Digests, hash_file};
use crate::stamp;
use crate::stat::FileStat;
use exn::ResultExt;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::instrument;
use walkdir::WalkDir;

/// Recorded in place of a digest when the file could not be read.
pub const HASH_FAILED: &str = "OS Error";
pub const DS_STORE: &str = ".DS_Store";

const ITEM_HEADER: [&str; 16] = [
    "Filename",
    "Relative Path",
    "Filesize",
    "Filetype",
    "C-Time",
    "Modified",
    "Accessed",
    "MD5",
    "SHA256",
    "ChecksumDateTime",
    "mode",
    "inode",
    "device",
    "enlink",
    "user",
    "group",
];

const DISC_HEADER: [&str; 19] = [
    "No.",
    "Filename",
    "RelPath",
    "Filesize",
    "Filetype",
    "C-Time",
    "Modified",
    "Accessed",
    "MD5",
    "MD5-Time",
    "SHA3_256",
    "SHA3-Time",
    "=>",
    "mode",
    "inode",
    "device",
    "enlink",
    "user",
    "group",
];

/// Column layout of the written inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Per-item `manifest.csv` inside a SIP: MD5 + SHA-256.
    Item,
    /// Optical disc inventory: numbered rows, MD5 + SHA3-256 each with its
    /// own timestamp.
    Disc,
}

impl Layout {
    #[must_use]
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Layout::Item => &ITEM_HEADER,
            Layout::Disc => &DISC_HEADER,
        }
    }

    #[must_use]
    pub fn algorithms(&self) -> [Algorithm; 2] {
        match self {
            Layout::Item => [Algorithm::Md5, Algorithm::Sha256],
            Layout::Disc => [Algorithm::Md5, Algorithm::Sha3_256],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Delete `.DS_Store` files found during the walk instead of just
    /// counting them.
    pub purge_ds_store: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub number: usize,
    pub filename: String,
    /// `/`-separated, relative to the parent of the inventoried folder so the
    /// folder's own name leads every path.
    pub relative_path: String,
    pub stat: FileStat,
    /// `None` when the file could not be read.
    pub digests: Option<Digests>,
    /// When each of the layout's two digests finished, in
    /// [`Layout::algorithms`] order.
    pub hashed_at: [String; 2],
}

impl Row {
    fn digest(&self, algorithm: Algorithm) -> String {
        self.digests
            .as_ref()
            .and_then(|d| d.get(algorithm))
            .unwrap_or(HASH_FAILED)
            .to_string()
    }

    #[must_use]
    pub fn record(&self, layout: Layout) -> Vec<String> {
        let s = &self.stat;
        let [first, second] = layout.algorithms();
        let mut record = Vec::with_capacity(layout.header().len());
        if layout == Layout::Disc {
            record.push(self.number.to_string());
        }
        record.extend([
            self.filename.clone(),
            self.relative_path.clone(),
            s.human_size(),
            s.mime.clone(),
            s.changed.clone(),
            s.modified.clone(),
            s.accessed.clone(),
        ]);
        match layout {
            Layout::Item => {
                record.extend([self.digest(first), self.digest(second), self.hashed_at[1].clone()]);
            },
            Layout::Disc => record.extend([
                self.digest(first),
                self.hashed_at[0].clone(),
                self.digest(second),
                self.hashed_at[1].clone(),
                " ".to_string(),
            ]),
        }
        record.extend([s.mode.clone(), s.inode.clone(), s.device.clone(), s.nlink.clone(), s.uid.clone(), s.gid.clone()]);
        record
    }
}

#[derive(Debug, Clone)]
pub struct Inventory {
    pub layout: Layout,
    pub rows: Vec<Row>,
    /// `.DS_Store` files skipped (and deleted when purging).
    pub ds_store: usize,
    /// Other hidden files skipped.
    pub hidden: usize,
    /// Files whose checksums could not be computed.
    pub unreadable: usize,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn relative_display(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/")
}

/// Inventory every visible regular file under `root`.
///
/// Hidden files (leading `.`) are skipped. Hidden folders are still entered
/// and the visible files inside them inventoried.
/// Unreadable files still get a row with [`HASH_FAILED`] in place of the
/// digests; walk errors are counted as unreadable and skipped.
#[instrument(skip(options), fields(root = %root.display(), rows))]
pub fn generate(root: &Path, layout: Layout, options: &Options) -> Result<Inventory> {
    if !root.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(root.to_path_buf()));
    }
    let base = root.parent().unwrap_or(root).to_path_buf();
    let mut inventory = Inventory { layout, rows: Vec::new(), ds_store: 0, hidden: 0, unreadable: 0 };

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable entry");
                inventory.unreadable += 1;
                continue;
            },
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == DS_STORE {
            inventory.ds_store += 1;
            if options.purge_ds_store
                && let Err(e) = std::fs::remove_file(entry.path())
            {
                tracing::warn!(path = %entry.path().display(), error = %e, "could not delete .DS_Store");
            }
            continue;
        }
        if is_hidden(&name) {
            inventory.hidden += 1;
            continue;
        }
        inventory.rows.push(inventory_file(entry.path(), name, &base, layout, &mut inventory.unreadable));
    }

    inventory.rows.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    for (index, row) in inventory.rows.iter_mut().enumerate() {
        row.number = index + 1;
    }
    tracing::Span::current().record("rows", inventory.rows.len());
    if inventory.ds_store > 0 {
        tracing::info!(count = inventory.ds_store, "skipped .DS_Store files");
    }
    Ok(inventory)
}

/// Item manifests take both digests in one read. Disc inventories take them
/// one after the other and stamp each as it finishes.
fn hash_stamped(path: &Path, layout: Layout) -> Result<(Digests, [String; 2])> {
    let algorithms = layout.algorithms();
    match layout {
        Layout::Item => {
            let digests = hash_file(path, &algorithms)?;
            let done = stamp::display(stamp::now());
            Ok((digests, [done.clone(), done]))
        },
        Layout::Disc => {
            let mut digests = hash_file(path, &algorithms[..1])?;
            let first = stamp::display(stamp::now());
            digests.merge(hash_file(path, &algorithms[1..])?);
            Ok((digests, [first, stamp::display(stamp::now())]))
        },
    }
}

fn inventory_file(path: &Path, filename: String, base: &Path, layout: Layout, unreadable: &mut usize) -> Row {
    let stat = match std::fs::symlink_metadata(path) {
        Ok(metadata) => FileStat::from_metadata(path, &metadata),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not stat file");
            FileStat::default()
        },
    };
    let (digests, hashed_at) = match hash_stamped(path, layout) {
        Ok((digests, hashed_at)) => (Some(digests), hashed_at),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = ?e, "could not hash file");
            *unreadable += 1;
            let failed_at = stamp::display(stamp::now());
            (None, [failed_at.clone(), failed_at])
        },
    };
    tracing::debug!(path = %path.display(), "inventoried");
    Row { number: 0, filename, relative_path: relative_display(path, base), stat, digests, hashed_at }
}

/// CSV writer shared by every tool: UTF-8, `\n` line endings on all
/// platforms.
pub fn csv_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .or_raise(|| ErrorKind::Write(path.to_path_buf()))
}

impl Inventory {
    #[instrument(skip(self), fields(path = %path.display(), rows = self.rows.len()))]
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let fail = || ErrorKind::Write(path.to_path_buf());
        let mut writer = csv_writer(path)?;
        writer.write_record(self.layout.header()).or_raise(fail)?;
        for row in &self.rows {
            writer.write_record(row.record(self.layout)).or_raise(fail)?;
        }
        writer.flush().or_raise(fail)?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path.display(), rows = self.rows.len()))]
    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        let fail = || ErrorKind::Write(path.to_path_buf());
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Inventory").or_raise(fail)?;
        for (col, title) in self.layout.header().iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, &bold).or_raise(fail)?;
        }
        for (index, row) in self.rows.iter().enumerate() {
            for (col, value) in row.record(self.layout).into_iter().enumerate() {
                sheet.write_string(index as u32 + 1, col as u16, value).or_raise(fail)?;
            }
        }
        workbook.save(path).or_raise(fail)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn fixture(root: &Path) -> PathBuf {
        let item = root.join("AAAA_BBB123456");
        fs::create_dir_all(item.join("AAAA_BBB123456/sub")).unwrap();
        fs::create_dir_all(item.join(".hidden_dir")).unwrap();
        fs::write(item.join("AAAA_BBB123456/AAAA_BBB123456_0002a.tif"), b"two").unwrap();
        fs::write(item.join("AAAA_BBB123456/AAAA_BBB123456_0001a.tif"), b"one").unwrap();
        fs::write(item.join("AAAA_BBB123456/sub/notes.txt"), b"notes").unwrap();
        fs::write(item.join("AAAA_BBB123456/.DS_Store"), b"junk").unwrap();
        fs::write(item.join("AAAA_BBB123456/._AAAA_BBB123456_0001a.tif"), b"fork").unwrap();
        fs::write(item.join(".hidden_dir/secret.txt"), b"x").unwrap();
        item
    }

    #[test]
    fn rows_sorted_numbered_and_hidden_files_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let item = fixture(tmp.path());
        let inventory = generate(&item, Layout::Disc, &Options::default()).unwrap();

        let paths: Vec<_> = inventory.rows.iter().map(|r| r.relative_path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "AAAA_BBB123456/.hidden_dir/secret.txt",
                "AAAA_BBB123456/AAAA_BBB123456/AAAA_BBB123456_0001a.tif",
                "AAAA_BBB123456/AAAA_BBB123456/AAAA_BBB123456_0002a.tif",
                "AAAA_BBB123456/AAAA_BBB123456/sub/notes.txt",
            ]
        );
        let numbers: Vec<_> = inventory.rows.iter().map(|r| r.number).collect();
        assert_eq!(numbers, [1, 2, 3, 4]);
        assert_eq!(inventory.ds_store, 1);
        assert_eq!(inventory.hidden, 1);
        assert_eq!(inventory.unreadable, 0);
        assert!(item.join("AAAA_BBB123456/.DS_Store").exists());
    }

    #[test]
    fn files_inside_hidden_folders_are_inventoried() {
        let tmp = tempfile::tempdir().unwrap();
        let item = tmp.path().join("AAAA_BBB123456");
        fs::create_dir_all(item.join(".cache")).unwrap();
        fs::write(item.join(".cache/page.tif"), b"cached").unwrap();
        fs::write(item.join("a.tif"), b"a").unwrap();
        let inventory = generate(&item, Layout::Item, &Options::default()).unwrap();

        let paths: Vec<_> = inventory.rows.iter().map(|r| r.relative_path.as_str()).collect();
        assert_eq!(paths, ["AAAA_BBB123456/.cache/page.tif", "AAAA_BBB123456/a.tif"]);
        assert_eq!(inventory.hidden, 0);
    }

    #[test]
    fn purge_deletes_ds_store() {
        let tmp = tempfile::tempdir().unwrap();
        let item = fixture(tmp.path());
        let inventory = generate(&item, Layout::Item, &Options { purge_ds_store: true }).unwrap();
        assert_eq!(inventory.ds_store, 1);
        assert!(!item.join("AAAA_BBB123456/.DS_Store").exists());
    }

    #[test]
    fn item_csv_has_item_header_and_digests() {
        let tmp = tempfile::tempdir().unwrap();
        let item = fixture(tmp.path());
        let inventory = generate(&item.join("AAAA_BBB123456"), Layout::Item, &Options::default()).unwrap();
        let out = tmp.path().join("manifest.csv");
        inventory.write_csv(&out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), ITEM_HEADER.join(","));
        let first: Vec<_> = lines.next().unwrap().split(',').collect();
        assert_eq!(first[0], "AAAA_BBB123456_0001a.tif");
        assert_eq!(first[1], "AAAA_BBB123456/AAAA_BBB123456_0001a.tif");
        assert_eq!(first[2], "3.0B");
        assert_eq!(first[7], format!("{:x}", md5::compute(b"one")));
        assert!(!text.contains('\r'));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn disc_record_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let item = fixture(tmp.path());
        let inventory = generate(&item, Layout::Disc, &Options::default()).unwrap();
        let record = inventory.rows[0].record(Layout::Disc);
        assert_eq!(record.len(), DISC_HEADER.len());
        assert_eq!(record[0], "1");
        assert_eq!(record[12], " ");
        assert_eq!(record[10].len(), 64);
    }

    #[test]
    fn disc_digests_carry_their_own_stamps() {
        let tmp = tempfile::tempdir().unwrap();
        let item = fixture(tmp.path());
        let inventory = generate(&item, Layout::Disc, &Options::default()).unwrap();
        for row in &inventory.rows {
            let record = row.record(Layout::Disc);
            let (md5_time, sha3_time) = (&record[9], &record[11]);
            assert_eq!(md5_time, &row.hashed_at[0]);
            assert_eq!(sha3_time, &row.hashed_at[1]);
            assert_eq!(md5_time.len(), "2024.03.05 14:22:33".len());
            assert!(md5_time <= sha3_time);
        }
    }

    #[test]
    fn unreadable_digest_placeholder() {
        let row = Row {
            number: 1,
            filename: "x.tif".into(),
            relative_path: "item/x.tif".into(),
            stat: FileStat::default(),
            digests: None,
            hashed_at: [String::new(), String::new()],
        };
        assert_eq!(row.record(Layout::Item)[7], HASH_FAILED);
        assert_eq!(row.record(Layout::Item)[8], HASH_FAILED);
    }

    #[test]
    fn xlsx_is_written() {
        let tmp = tempfile::tempdir().unwrap();
        let item = fixture(tmp.path());
        let inventory = generate(&item, Layout::Disc, &Options::default()).unwrap();
        let out = tmp.path().join("inventory.xlsx");
        inventory.write_xlsx(&out).unwrap();
        assert!(fs::metadata(&out).unwrap().len() > 0);
    }

    #[test]
    fn rejects_missing_root() {
        let err = generate(Path::new("/no/such/dir"), Layout::Item, &Options::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
    }
}
