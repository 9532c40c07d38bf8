use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sipkit_inventory::stamp;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnzipReport {
    pub out_dir: PathBuf,
    pub zips: usize,
    pub unzipped: usize,
}

/// Extract `archive` into `dest`. Entries that would land outside `dest`
/// are skipped.
fn extract_zip(archive: &Path, dest: &Path) -> Result<usize> {
    let fail = || ErrorKind::Zip(archive.to_path_buf());
    let file = File::open(archive).or_raise(fail)?;
    let mut zip = zip::ZipArchive::new(file).or_raise(fail)?;
    let mut files = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).or_raise(fail)?;
        let Some(outpath) = entry.enclosed_name().map(|p| dest.join(p)) else {
            tracing::warn!(entry = entry.name(), "skipping entry outside the extraction folder");
            continue;
        };
        if entry.is_dir() {
            fs::create_dir_all(&outpath).or_raise(fail)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent).or_raise(fail)?;
        }
        let mut outfile = File::create(&outpath).or_raise(fail)?;
        io::copy(&mut entry, &mut outfile).or_raise(fail)?;
        files += 1;
    }
    Ok(files)
}

/// Extract every `.zip` in `zips_dir` into a new sibling folder
/// `ETDs_unzipped<timestamp>`, one subfolder per zip named after its stem.
/// A zip that fails to extract is logged and counted, not fatal.
#[instrument(fields(zips_dir = %zips_dir.display()))]
pub fn unzip_all(zips_dir: &Path) -> Result<UnzipReport> {
    if !zips_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(zips_dir.to_path_buf()));
    }
    let parent = zips_dir.parent().unwrap_or(zips_dir);
    let out_dir = parent.join(format!("ETDs_unzipped{}", stamp::file_stamp(stamp::now())));
    if out_dir.exists() {
        exn::bail!(ErrorKind::AlreadyExists(out_dir));
    }
    fs::create_dir(&out_dir).or_raise(|| ErrorKind::Write(out_dir.clone()))?;

    let mut zips: Vec<PathBuf> = fs::read_dir(zips_dir)
        .or_raise(|| ErrorKind::Read(zips_dir.to_path_buf()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e.eq_ignore_ascii_case("zip")))
        .collect();
    zips.sort();

    let mut report = UnzipReport { out_dir: out_dir.clone(), zips: zips.len(), unzipped: 0 };
    for archive in &zips {
        let stem = archive.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        match extract_zip(archive, &out_dir.join(&stem)) {
            Ok(files) => {
                tracing::debug!(zip = %archive.display(), files, "unzipped");
                report.unzipped += 1;
            },
            Err(e) => tracing::error!(zip = %archive.display(), error = ?e, "could not unzip, skipping"),
        }
    }
    tracing::info!(zips = report.zips, unzipped = report.unzipped, "unzip complete");
    Ok(report)
}
