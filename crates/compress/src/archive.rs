//! Tar archives of item folders.
//!
//! An item folder `ITEM/` packs into `ITEM.tar.gz` with `ITEM/` as the only
//! root entry, so unpacking into any directory recreates the folder by name.

use crate::Compression;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter};
use std::path::Path;
use tracing::instrument;

const ARCHIVE_SUFFIXES: [&str; 5] = [".tar.gz", ".tar.bz2", ".tgz", ".tbz2", ".tar"];

fn matching_suffix(name: &str) -> Option<&'static str> {
    ARCHIVE_SUFFIXES.into_iter().find(|suffix| {
        name.len() > suffix.len()
            && name.is_char_boundary(name.len() - suffix.len())
            && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
    })
}

/// Returns `true` for file names that look like tarballs this crate can read.
#[must_use]
pub fn is_archive_name(name: &str) -> bool {
    matching_suffix(name).is_some()
}

/// The archive name without its tarball suffix: `ITEM.tar.gz` becomes `ITEM`.
/// Names without a recognised suffix are returned unchanged.
#[must_use]
pub fn archive_stem(name: &str) -> &str {
    match matching_suffix(name) {
        Some(suffix) => &name[..name.len() - suffix.len()],
        None => name,
    }
}

/// Pack `source` into the archive file at `dest`, rooted at the source
/// folder's name. Refuses to overwrite an existing archive; a partially
/// written archive is removed on failure.
#[instrument(skip_all, fields(source = %source.display(), dest = %dest.display(), format = %compression))]
pub fn pack_dir(source: &Path, dest: &Path, compression: Compression) -> Result<()> {
    if !source.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(source.to_path_buf()));
    }
    if dest.exists() {
        exn::bail!(ErrorKind::AlreadyExists(dest.to_path_buf()));
    }
    let root = source.file_name().ok_or_raise(|| ErrorKind::NotADirectory(source.to_path_buf()))?;
    let result = write_archive(source, root, dest, compression);
    if result.is_err()
        && dest.exists()
        && let Err(e) = fs::remove_file(dest)
    {
        tracing::warn!(path = %dest.display(), error = %e, "could not remove partial archive");
    }
    result
}

fn write_archive(source: &Path, root: &std::ffi::OsStr, dest: &Path, compression: Compression) -> Result<()> {
    let file = File::create(dest).or_raise(|| ErrorKind::Io)?;
    let mut builder = tar::Builder::new(compression.wrap_writer(BufWriter::new(file)));
    builder.follow_symlinks(false);
    builder.append_dir_all(root, source).or_raise(|| ErrorKind::Io)?;
    let encoder = builder.into_inner().or_raise(|| ErrorKind::Io)?;
    let writer = encoder.finish()?;
    writer.into_inner().map_err(|e| e.into_error()).or_raise(|| ErrorKind::Io)?;
    Ok(())
}

/// Unpack `archive` into `dest`, detecting the codec from the file's magic
/// bytes rather than its name. A name promising a codec whose magic bytes are
/// missing (an empty or truncated `.tar.gz`) is rejected before anything is
/// written. Entries that would escape `dest` are skipped by the tar reader.
#[instrument(skip_all, fields(archive = %archive.display(), dest = %dest.display()))]
pub fn unpack(archive: &Path, dest: &Path) -> Result<Compression> {
    let file = File::open(archive).or_raise(|| ErrorKind::Io)?;
    let mut reader = BufReader::new(file);
    let compression = Compression::from_magic_bytes(reader.fill_buf().or_raise(|| ErrorKind::Io)?);
    let named = Compression::from_path(archive);
    if named != compression {
        if compression == Compression::None {
            tracing::warn!(named = %named, "archive does not start with the codec its name promises");
            exn::bail!(ErrorKind::InvalidData);
        }
        tracing::debug!(named = %named, detected = %compression, "archive name and content disagree, using content");
    }
    fs::create_dir_all(dest).or_raise(|| ErrorKind::Io)?;
    let mut tar = tar::Archive::new(compression.wrap_reader(reader));
    tar.set_preserve_mtime(true);
    tar.unpack(dest).or_raise(|| ErrorKind::InvalidData)?;
    tracing::debug!(format = %compression, "unpacked archive");
    Ok(compression)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn fixture_item(root: &Path) -> std::path::PathBuf {
        let item = root.join("AAAA_BBB123456");
        fs::create_dir_all(item.join("AAAA_BBB123456")).unwrap();
        fs::write(item.join("AAAA_BBB123456/AAAA_BBB123456_0001a.tif"), b"front").unwrap();
        fs::write(item.join("AAAA_BBB123456/AAAA_BBB123456_0001b.tif"), b"back").unwrap();
        fs::write(item.join("manifest.csv"), b"Filename\n").unwrap();
        item
    }

    #[rstest]
    #[case(Compression::Gzip)]
    #[case(Compression::Bzip2)]
    #[case(Compression::None)]
    fn pack_then_unpack_preserves_tree(#[case] compression: Compression) {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let item = fixture_item(src.path());
        let archive = out.path().join(format!("AAAA_BBB123456{}", compression.archive_extension()));

        pack_dir(&item, &archive, compression).unwrap();
        let restored = tempfile::tempdir().unwrap();
        assert_eq!(unpack(&archive, restored.path()).unwrap(), compression);

        let base = restored.path().join("AAAA_BBB123456");
        assert_eq!(fs::read(base.join("AAAA_BBB123456/AAAA_BBB123456_0001a.tif")).unwrap(), b"front");
        assert_eq!(fs::read(base.join("AAAA_BBB123456/AAAA_BBB123456_0001b.tif")).unwrap(), b"back");
        assert_eq!(fs::read(base.join("manifest.csv")).unwrap(), b"Filename\n");
    }

    #[test]
    fn empty_gzip_archive_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = tmp.path().join("AAAA_BBB123456.tar.gz");
        fs::write(&archive, b"").unwrap();
        let dest = tmp.path().join("out");
        let err = unpack(&archive, &dest).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData);
        assert!(!dest.exists());
    }

    #[test]
    fn content_wins_over_misleading_name() {
        let src = tempfile::tempdir().unwrap();
        let item = fixture_item(src.path());
        let archive = src.path().join("AAAA_BBB123456.tar");
        pack_dir(&item, &archive, Compression::Bzip2).unwrap();
        let restored = tempfile::tempdir().unwrap();
        assert_eq!(unpack(&archive, restored.path()).unwrap(), Compression::Bzip2);
        assert!(restored.path().join("AAAA_BBB123456/manifest.csv").is_file());
    }

    #[test]
    fn pack_refuses_existing_archive() {
        let src = tempfile::tempdir().unwrap();
        let item = fixture_item(src.path());
        let archive = src.path().join("AAAA_BBB123456.tar.gz");
        fs::write(&archive, b"already here").unwrap();
        let err = pack_dir(&item, &archive, Compression::Gzip).unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
        assert_eq!(fs::read(&archive).unwrap(), b"already here");
    }

    #[test]
    fn pack_rejects_missing_source() {
        let tmp = tempfile::tempdir().unwrap();
        let err = pack_dir(&tmp.path().join("missing"), &tmp.path().join("x.tar.gz"), Compression::Gzip).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotADirectory(_)));
        assert!(!tmp.path().join("x.tar.gz").exists());
    }

    #[rstest]
    #[case("ITEM.tar.gz", true, "ITEM")]
    #[case("ITEM.TAR.BZ2", true, "ITEM")]
    #[case("ITEM.tgz", true, "ITEM")]
    #[case("ITEM.tar", true, "ITEM")]
    #[case("ITEM_old.tar.gz", true, "ITEM_old")]
    #[case("manifest.csv", false, "manifest.csv")]
    #[case(".tar.gz", false, ".tar.gz")]
    fn archive_names(#[case] name: &str, #[case] is_archive: bool, #[case] stem: &str) {
        assert_eq!(is_archive_name(name), is_archive);
        assert_eq!(archive_stem(name), stem);
    }
}
