use crate::error::{ErrorKind, Result};
use crate::util::{name_of, sorted_entries};
use exn::ResultExt;
use sipkit_compress::archive::is_archive_name;
use sipkit_inventory::{Algorithm, csv_writer, hash_file, stamp};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub path: PathBuf,
    pub archives: usize,
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transfer manifest created for {} tar files", self.archives)
    }
}

/// Write `out_dir/transfer_<timestamp>.csv` listing `name,md5,sha256` for
/// every archive in `source_dir`, sorted by name, without a header row.
#[instrument(fields(source_dir = %source_dir.display(), out_dir = %out_dir.display()))]
pub fn transfer_manifest(source_dir: &Path, out_dir: &Path) -> Result<TransferReport> {
    if !source_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(source_dir.to_path_buf()));
    }
    let archives: Vec<PathBuf> = sorted_entries(source_dir)
        .or_raise(|| ErrorKind::Io(source_dir.to_path_buf()))?
        .into_iter()
        .filter(|p| p.is_file() && is_archive_name(&name_of(p)))
        .collect();
    fs::create_dir_all(out_dir).or_raise(|| ErrorKind::Io(out_dir.to_path_buf()))?;
    let path = out_dir.join(format!("transfer_{}.csv", stamp::file_stamp(stamp::now())));

    let fail = || ErrorKind::Csv(path.clone());
    let mut writer = csv_writer(&path).or_raise(fail)?;
    for archive in &archives {
        let digests = hash_file(archive, &[Algorithm::Md5, Algorithm::Sha256]).or_raise(fail)?;
        writer
            .write_record([
                name_of(archive).as_str(),
                digests.get(Algorithm::Md5).unwrap_or_default(),
                digests.get(Algorithm::Sha256).unwrap_or_default(),
            ])
            .or_raise(fail)?;
        tracing::debug!(archive = %archive.display(), "hashed");
    }
    writer.flush().or_raise(fail)?;
    tracing::info!(path = %path.display(), archives = archives.len(), "transfer manifest written");
    Ok(TransferReport { path, archives: archives.len() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_archives_with_checksums() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("ready_to_transfer");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("B.tar.gz"), b"b").unwrap();
        fs::write(source.join("A.tar"), b"a").unwrap();
        fs::write(source.join("notes.txt"), b"n").unwrap();

        let report = transfer_manifest(&source, &tmp.path().join("transfer_manifests")).unwrap();
        assert_eq!(report.archives, 2);
        let name = name_of(&report.path);
        assert!(name.starts_with("transfer_") && name.ends_with(".csv"));

        let text = fs::read_to_string(&report.path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[0],
            format!("A.tar,{:x},ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb", md5::compute(b"a"))
        );
        assert!(lines[1].starts_with("B.tar.gz,"));
    }
}
