//! Object key validation.
//!
//! Keys name archives relative to a backend root: usually a bare tarball
//! name, sometimes under a batch prefix. They must stay inside the root and
//! must not name the hidden work files (`.item.tar.gz.tmp` and friends) that
//! packaging leaves next to finished archives.

use crate::error::{ErrorKind, Result};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

fn acceptable(segment: &OsStr) -> bool {
    let bytes = segment.as_encoded_bytes();
    // NUL survives `Path::components()` on Unix but truncates in syscalls.
    !bytes.contains(&0) && !bytes.starts_with(b".")
}

/// Normalize `key` and check it stays inside the backend root.
///
/// `.` segments, repeated and trailing separators are dropped and `..` is
/// resolved against the segments before it. The key is rejected with
/// [`InvalidPath`](crate::error::ErrorKind::InvalidPath) if it climbs out of
/// the root, resolves to nothing, carries a drive prefix, contains a NUL
/// byte or has a hidden segment.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use sipkit_storage::validate_path;
///
/// assert_eq!(validate_path("AAAA_BBB000001.tar.gz").unwrap(), Path::new("AAAA_BBB000001.tar.gz"));
/// assert_eq!(validate_path("/batch//./AAAA_BBB000001.tar/").unwrap(), Path::new("batch/AAAA_BBB000001.tar"));
/// assert!(validate_path("../AAAA_BBB000001.tar.gz").is_err());
/// assert!(validate_path(".AAAA_BBB000001.tar.gz.tmp").is_err());
/// ```
pub fn validate(key: impl AsRef<Path>) -> Result<PathBuf> {
    let key = key.as_ref();
    let invalid = || ErrorKind::InvalidPath(key.to_path_buf());
    let mut segments: Vec<&OsStr> = Vec::new();
    for component in key.components() {
        match component {
            Component::Normal(segment) if acceptable(segment) => segments.push(segment),
            Component::Normal(_) | Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if segments.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
            Component::CurDir | Component::RootDir => {},
        }
    }
    if segments.is_empty() {
        exn::bail!(invalid());
    }
    Ok(segments.into_iter().collect())
}
