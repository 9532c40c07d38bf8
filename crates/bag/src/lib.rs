//! Minimal BagIt (v0.97) support for APTrust submission packages.
//!
//! A bag is a folder holding a `data/` payload plus tag files: `bagit.txt`,
//! `bag-info.txt`, one `manifest-<algo>.txt` per checksum algorithm and the
//! matching `tagmanifest-<algo>.txt` files. [`BagBuilder`] turns a folder into
//! a bag in place, [`Bag::validate`] re-checks one, and [`unbag`] reverses the
//! process.

mod aptrust;
pub mod error;
mod make;
mod unbag;
mod validate;

pub use crate::aptrust::{AptrustInfo, title_for};
pub use crate::make::BagBuilder;
pub use crate::unbag::{Flavor, UnbagReport, Unbagged, unbag, unbag_all};
pub use crate::validate::Validation;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
pub use sipkit_inventory::Algorithm;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DATA_DIR: &str = "data";
pub const BAGIT_TXT: &str = "bagit.txt";
pub const BAG_INFO_TXT: &str = "bag-info.txt";
pub const APTRUST_INFO_TXT: &str = "aptrust-info.txt";
pub const BAGIT_VERSION: &str = "0.97";

#[must_use]
pub fn manifest_name(algorithm: Algorithm) -> String {
    format!("manifest-{algorithm}.txt")
}

#[must_use]
pub fn tagmanifest_name(algorithm: Algorithm) -> String {
    format!("tagmanifest-{algorithm}.txt")
}

/// A folder counts as a bag as soon as it has a `data/` directory; every
/// batch tool uses this to avoid processing the same item twice.
#[must_use]
pub fn is_bag(dir: &Path) -> bool {
    dir.join(DATA_DIR).is_dir()
}

/// An existing bag on disk.
#[derive(Debug, Clone)]
pub struct Bag {
    path: PathBuf,
    algorithms: Vec<Algorithm>,
    info: Vec<(String, String)>,
}

impl Bag {
    /// Open a bag, discovering its checksum algorithms from the payload
    /// manifests present.
    pub fn open(path: &Path) -> Result<Self> {
        if !is_bag(path) {
            exn::bail!(ErrorKind::NotABag(path.to_path_buf()));
        }
        if !path.join(BAGIT_TXT).is_file() {
            exn::bail!(ErrorKind::MalformedTag(path.join(BAGIT_TXT)));
        }
        let mut algorithms = Vec::new();
        for entry in std::fs::read_dir(path).or_raise(|| ErrorKind::Io(path.to_path_buf()))? {
            let entry = entry.or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(algorithm) = name
                .strip_prefix("manifest-")
                .and_then(|rest| rest.strip_suffix(".txt"))
                .and_then(|algo| algo.parse::<Algorithm>().ok())
            {
                algorithms.push(algorithm);
            }
        }
        if algorithms.is_empty() {
            exn::bail!(ErrorKind::MalformedTag(path.join("manifest-md5.txt")));
        }
        algorithms.sort();
        let info_path = path.join(BAG_INFO_TXT);
        let info = match info_path.is_file() {
            true => parse_tag_file(&info_path)?,
            false => Vec::new(),
        };
        Ok(Self { path: path.to_path_buf(), algorithms, info })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    #[must_use]
    pub fn info(&self) -> &[(String, String)] {
        &self.info
    }

    #[must_use]
    pub fn info_value(&self, key: &str) -> Option<&str> {
        self.info.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
    }
}

/// Parse `Key: value` lines; indented lines continue the previous value.
pub(crate) fn parse_tag_file(path: &Path) -> Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path).or_raise(|| ErrorKind::MalformedTag(path.to_path_buf()))?;
    let mut fields: Vec<(String, String)> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with([' ', '\t']) {
            match fields.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(line.trim());
                },
                None => exn::bail!(ErrorKind::MalformedTag(path.to_path_buf())),
            }
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => fields.push((key.trim().to_string(), value.trim().to_string())),
            None => exn::bail!(ErrorKind::MalformedTag(path.to_path_buf())),
        }
    }
    Ok(fields)
}

/// Percent-encode the characters BagIt forbids raw in manifest paths.
pub(crate) fn encode_path(path: &str) -> String {
    path.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

pub(crate) fn decode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(index) = rest.find('%') {
        out.push_str(&rest[..index]);
        let code = rest.get(index + 1..index + 3).map(str::to_ascii_uppercase);
        match code.as_deref() {
            Some("25") => out.push('%'),
            Some("0A") => out.push('\n'),
            Some("0D") => out.push('\r'),
            _ => {
                out.push('%');
                rest = &rest[index + 1..];
                continue;
            },
        }
        rest = &rest[index + 3..];
    }
    out.push_str(rest);
    out
}

/// Every regular file under `data/`, as (`data/`-prefixed `/`-separated
/// path, absolute path), sorted by the former.
pub(crate) fn payload_files(bag: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(bag.join(DATA_DIR)).follow_links(false) {
        let entry = entry.or_raise(|| ErrorKind::Io(bag.join(DATA_DIR)))?;
        if !entry.file_type().is_file() {
            if entry.file_type().is_symlink() {
                tracing::warn!(path = %entry.path().display(), "symlink left out of payload manifest");
            }
            continue;
        }
        let relative = entry.path().strip_prefix(bag).unwrap_or(entry.path());
        let display =
            relative.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        files.push((display, entry.path().to_path_buf()));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// First `{prefix}{n}` (n from 1) that does not exist in `dir`. Used for the
/// hidden work folders that items are staged through.
#[must_use]
pub fn unused_name(dir: &Path, prefix: &str) -> PathBuf {
    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{prefix}{n}"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
