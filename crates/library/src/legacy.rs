//! One-off batch utilities for legacy deliveries: extracting returned tar
//! files, renaming superseded archives and reshaping old two-sided scans.

use crate::error::{ErrorKind, Result};
use crate::util::{is_hidden, name_of, sorted_entries};
use exn::ResultExt;
use sipkit_bag::unused_name;
use sipkit_compress::archive::{archive_stem, is_archive_name, unpack};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::instrument;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UntarReport {
    pub archives: usize,
    pub extracted: usize,
    pub errors: usize,
}

impl UntarReport {
    /// Nothing went wrong; un-bagging may follow.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.errors == 0
    }
}

/// Extract every archive in `dir` into `dir` itself.
///
/// Each archive is unpacked into a hidden temporary folder first and its
/// top-level entries are then moved up. An entry whose name is already taken
/// in `dir` is left in the temporary folder and counted as an error. The
/// archives themselves are kept.
#[instrument(fields(dir = %dir.display()))]
pub fn untar_all(dir: &Path) -> Result<UntarReport> {
    if !dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(dir.to_path_buf()));
    }
    let mut report = UntarReport::default();
    for archive in sorted_entries(dir).or_raise(|| ErrorKind::Io(dir.to_path_buf()))? {
        let name = name_of(&archive);
        if !archive.is_file() || is_hidden(&name) || !is_archive_name(&name) {
            continue;
        }
        report.archives += 1;
        let temp = unused_name(dir, &format!(".{}.untar", archive_stem(&name)));
        let unpacked = fs::create_dir(&temp)
            .or_raise(|| ErrorKind::Io(temp.clone()))
            .and_then(|()| unpack(&archive, &temp).or_raise(|| ErrorKind::Archive));
        if let Err(e) = unpacked {
            tracing::error!(archive = %name, error = ?e, "extraction failed");
            if temp.exists()
                && let Err(e) = fs::remove_dir_all(&temp)
            {
                tracing::warn!(path = %temp.display(), error = %e, "could not remove partial extraction");
            }
            report.errors += 1;
            continue;
        }

        let mut clean = true;
        for entry in sorted_entries(&temp).or_raise(|| ErrorKind::Io(temp.clone()))? {
            let target = dir.join(name_of(&entry));
            if target.exists() {
                tracing::error!(target = %target.display(), kept_in = %temp.display(), "already exists, not replaced");
                clean = false;
                continue;
            }
            if let Err(e) = fs::rename(&entry, &target) {
                tracing::error!(entry = %entry.display(), error = %e, "could not move extracted entry");
                clean = false;
            }
        }
        if clean {
            fs::remove_dir(&temp).or_raise(|| ErrorKind::Io(temp.clone()))?;
            tracing::info!(archive = %name, "extracted");
            report.extracted += 1;
        } else {
            report.errors += 1;
        }
    }
    tracing::info!(extracted = report.extracted, errors = report.errors, "untar complete");
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameReport {
    pub renamed: usize,
    /// Files whose new name was already taken.
    pub skipped: usize,
}

const OLD_SUFFIX: &str = "_old.tar.gz";

fn old_name(stem_source: &str) -> String {
    let stem = stem_source.split('.').next().unwrap_or(stem_source);
    format!("{stem}{OLD_SUFFIX}")
}

fn rename_into(file: &Path, target: &Path, report: &mut RenameReport) -> Result<()> {
    if target.exists() {
        tracing::warn!(file = %file.display(), target = %target.display(), "target exists, not renamed");
        report.skipped += 1;
        return Ok(());
    }
    fs::rename(file, target).or_raise(|| ErrorKind::Io(file.to_path_buf()))?;
    tracing::debug!(from = %file.display(), to = %target.display(), "renamed");
    report.renamed += 1;
    Ok(())
}

fn plain_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    Ok(sorted_entries(dir)
        .or_raise(|| ErrorKind::Io(dir.to_path_buf()))?
        .into_iter()
        .filter(|p| p.is_file() && !is_hidden(&name_of(p)) && !name_of(p).ends_with(OLD_SUFFIX))
        .collect())
}

/// Rename every file in `dir` to `<name up to the first dot>_old.tar.gz`.
#[instrument(fields(dir = %dir.display()))]
pub fn rename_tars(dir: &Path) -> Result<RenameReport> {
    if !dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(dir.to_path_buf()));
    }
    let mut report = RenameReport::default();
    for file in plain_files(dir)? {
        let target = dir.join(old_name(&name_of(&file)));
        rename_into(&file, &target, &mut report)?;
    }
    tracing::info!(renamed = report.renamed, "renamed tar files");
    Ok(report)
}

/// Like [`rename_tars`] for the files inside each child folder of `dir`,
/// named after that folder instead.
#[instrument(fields(dir = %dir.display()))]
pub fn rename_tars_nested(dir: &Path) -> Result<RenameReport> {
    if !dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(dir.to_path_buf()));
    }
    let mut report = RenameReport::default();
    for folder in sorted_entries(dir).or_raise(|| ErrorKind::Io(dir.to_path_buf()))? {
        if !folder.is_dir() || is_hidden(&name_of(&folder)) {
            continue;
        }
        let target = folder.join(old_name(&name_of(&folder)));
        for file in plain_files(&folder)? {
            rename_into(&file, &target, &mut report)?;
        }
    }
    tracing::info!(renamed = report.renamed, "renamed tar files");
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitReport {
    pub items: usize,
    /// Items fully split; their original folders were removed.
    pub moved_items: usize,
}

const SIDES: [char; 2] = ['a', 'b'];

/// Move one side's TIFFs from `<item>/<side>/` into the sibling
/// `<item><side>/`. Returns whether every step succeeded.
fn move_side(batch: &Path, item: &Path, side: char) -> bool {
    let source = item.join(side.to_string());
    if !source.is_dir() {
        tracing::error!(folder = %source.display(), "side folder missing");
        return false;
    }
    let dest = batch.join(format!("{}{side}", name_of(item)));
    if let Err(e) = fs::create_dir(&dest) {
        tracing::error!(folder = %dest.display(), error = %e, "could not create side folder");
        return false;
    }
    let entries = match sorted_entries(&source) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(folder = %source.display(), error = %e, "could not read side folder");
            return false;
        },
    };
    let suffix = format!("{side}.tif");
    let mut ok = true;
    for tif in entries {
        let name = name_of(&tif);
        if is_hidden(&name) || !name.ends_with(&suffix) {
            continue;
        }
        if let Err(e) = fs::rename(&tif, dest.join(&name)) {
            tracing::error!(file = %name, error = %e, "could not move");
            ok = false;
        }
    }
    ok
}

/// Split legacy items holding `a/` and `b/` subfolders into sibling
/// `<item>a/` and `<item>b/` folders. The original item folder is removed
/// only when every move for that item succeeded. Items missing either side
/// are left untouched, and folders already ending in a side letter are the
/// output of an earlier run.
#[instrument(fields(batch = %batch.display()))]
pub fn split_sides(batch: &Path) -> Result<SplitReport> {
    if !batch.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(batch.to_path_buf()));
    }
    let mut report = SplitReport::default();
    let items: Vec<_> = sorted_entries(batch)
        .or_raise(|| ErrorKind::Io(batch.to_path_buf()))?
        .into_iter()
        .filter(|p| {
            let name = name_of(p);
            p.is_dir() && !is_hidden(&name) && !name.ends_with(SIDES)
        })
        .collect();
    for item in items {
        report.items += 1;
        if let Some(side) = SIDES.into_iter().find(|side| !item.join(side.to_string()).is_dir()) {
            tracing::warn!(item = %item.display(), side = %side, "item has no side folder, left in place");
            continue;
        }
        if SIDES.map(|side| move_side(batch, &item, side)) == [true, true] {
            fs::remove_dir_all(&item).or_raise(|| ErrorKind::Io(item.clone()))?;
            report.moved_items += 1;
        } else {
            tracing::warn!(item = %item.display(), "item not fully split, left in place");
        }
    }
    tracing::info!(items = report.items, moved = report.moved_items, "split complete");
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZipReport {
    pub folders: usize,
    pub zipped: usize,
}

fn zip_dir(folder: &Path, dest: &Path) -> Result<()> {
    let file = File::create(dest).or_raise(|| ErrorKind::Io(dest.to_path_buf()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for entry in WalkDir::new(folder).min_depth(1).sort_by_file_name() {
        let entry = entry.or_raise(|| ErrorKind::Io(folder.to_path_buf()))?;
        let relative = entry.path().strip_prefix(folder).unwrap_or(entry.path());
        let name = relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options).or_raise(|| ErrorKind::Archive)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options).or_raise(|| ErrorKind::Archive)?;
            let mut source = File::open(entry.path()).or_raise(|| ErrorKind::Io(entry.path().to_path_buf()))?;
            io::copy(&mut source, &mut zip).or_raise(|| ErrorKind::Archive)?;
        }
    }
    zip.finish().or_raise(|| ErrorKind::Archive)?;
    Ok(())
}

/// Zip every `*b` folder of `batch` into `<folder>.zip` beside it, then
/// remove the folder.
#[instrument(fields(batch = %batch.display()))]
pub fn zip_b_folders(batch: &Path) -> Result<ZipReport> {
    if !batch.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(batch.to_path_buf()));
    }
    let mut report = ZipReport::default();
    for folder in sorted_entries(batch).or_raise(|| ErrorKind::Io(batch.to_path_buf()))? {
        let name = name_of(&folder);
        if !folder.is_dir() || is_hidden(&name) || !name.ends_with('b') {
            continue;
        }
        report.folders += 1;
        let dest = batch.join(format!("{name}.zip"));
        if dest.exists() {
            tracing::warn!(zip = %dest.display(), "zip already exists, folder kept");
            continue;
        }
        match zip_dir(&folder, &dest) {
            Ok(()) => {
                fs::remove_dir_all(&folder).or_raise(|| ErrorKind::Io(folder.clone()))?;
                report.zipped += 1;
            },
            Err(e) => {
                tracing::error!(folder = %name, error = ?e, "could not zip");
                if dest.exists()
                    && let Err(e) = fs::remove_file(&dest)
                {
                    tracing::warn!(zip = %dest.display(), error = %e, "could not remove partial zip");
                }
            },
        }
    }
    tracing::info!(folders = report.folders, zipped = report.zipped, "zipping complete");
    Ok(report)
}
