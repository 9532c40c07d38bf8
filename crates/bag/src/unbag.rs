//! Reversing bags back into plain item folders.

use crate::error::{ErrorKind, Result};
use crate::{APTRUST_INFO_TXT, BAG_INFO_TXT, BAGIT_TXT, DATA_DIR, is_bag};
use exn::{OptionExt, ResultExt};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Metadata the DnD workflow stamps into an item before bagging.
const DND_METADATA_FILES: [&str; 5] = [APTRUST_INFO_TXT, "metadata.csv", "manifest.csv", "metadata.xml", "metadata.json"];

/// How the payload sits inside `data/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// `data/` itself is the item's content.
    Standard,
    /// Pre-bagged DnD items: the content is `data/<bag name>/`, next to the
    /// stamped metadata files, which are discarded.
    Dnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unbagged {
    /// No `data/` folder: nothing was touched.
    NotABag,
    Unbagged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnbagReport {
    /// Candidate folders (no `.` in the name) found.
    pub folders: usize,
    pub bags: usize,
    pub failed: usize,
}

fn is_dnd_metadata(name: &str) -> bool {
    DND_METADATA_FILES.iter().any(|m| *m == name)
}

fn is_tag_file(name: &str) -> bool {
    name == BAGIT_TXT
        || name == BAG_INFO_TXT
        || ((name.starts_with("manifest-") || name.starts_with("tagmanifest-")) && name.ends_with(".txt"))
}

fn sibling_temp(bag: &Path) -> Result<PathBuf> {
    let parent = bag.parent().ok_or_raise(|| ErrorKind::Io(bag.to_path_buf()))?;
    let name = bag.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let mut n = 1;
    loop {
        let candidate = parent.join(format!(".{name}.unbag{n}"));
        if !candidate.exists() {
            return Ok(candidate);
        }
        n += 1;
    }
}

fn remove_files(dir: &Path, matches: impl Fn(&str) -> bool) -> Result<()> {
    for entry in fs::read_dir(dir).or_raise(|| ErrorKind::Io(dir.to_path_buf()))? {
        let entry = entry.or_raise(|| ErrorKind::Io(dir.to_path_buf()))?;
        let path = entry.path();
        if path.is_file() && matches(&entry.file_name().to_string_lossy()) {
            fs::remove_file(&path).or_raise(|| ErrorKind::Io(path.clone()))?;
        }
    }
    Ok(())
}

/// Strip a bag's tag files and promote its payload to take the bag's place.
///
/// The payload is first moved to a hidden sibling, the bag shell removed,
/// and the sibling renamed to the original name, so a payload folder that
/// shares the bag's name never collides with it. A DnD bag whose `data/`
/// holds anything besides the nested item folder and known metadata files
/// is refused before anything is changed.
#[instrument(fields(bag = %bag.display()))]
pub fn unbag(bag: &Path, flavor: Flavor) -> Result<Unbagged> {
    if !is_bag(bag) {
        return Ok(Unbagged::NotABag);
    }
    let data = bag.join(DATA_DIR);
    let payload = match flavor {
        Flavor::Standard => data.clone(),
        Flavor::Dnd => {
            let name = bag.file_name().ok_or_raise(|| ErrorKind::NotABag(bag.to_path_buf()))?;
            let nested = data.join(name);
            let mut strays = Vec::new();
            for entry in fs::read_dir(&data).or_raise(|| ErrorKind::Io(data.clone()))? {
                let entry = entry.or_raise(|| ErrorKind::Io(data.clone()))?;
                let entry_name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_name().as_os_str() != name && !is_dnd_metadata(&entry_name) {
                    strays.push(entry_name);
                }
            }
            if !nested.is_dir() || !strays.is_empty() {
                strays.sort();
                exn::bail!(ErrorKind::UnexpectedPayload { bag: bag.to_path_buf(), names: strays });
            }
            remove_files(&data, is_dnd_metadata)?;
            nested
        },
    };
    remove_files(bag, |n| is_tag_file(n) || (flavor == Flavor::Dnd && n == APTRUST_INFO_TXT))?;

    let temp = sibling_temp(bag)?;
    fs::rename(&payload, &temp).or_raise(|| ErrorKind::Io(payload.clone()))?;
    fs::remove_dir_all(bag).or_raise(|| ErrorKind::Io(bag.to_path_buf()))?;
    fs::rename(&temp, bag).or_raise(|| ErrorKind::Io(temp.clone()))?;
    tracing::info!("unbagged");
    Ok(Unbagged::Unbagged)
}

/// Un-bag every extension-less folder in `dir`. Failures are logged and
/// counted; the remaining folders are still processed.
#[instrument(fields(dir = %dir.display()))]
pub fn unbag_all(dir: &Path, flavor: Flavor) -> Result<UnbagReport> {
    if !dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(dir.to_path_buf()));
    }
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .or_raise(|| ErrorKind::Io(dir.to_path_buf()))?
        .filter_map(|e| e.ok())
        .filter(|e| !e.file_name().to_string_lossy().contains('.'))
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    candidates.sort();

    let mut report = UnbagReport { folders: candidates.len(), ..UnbagReport::default() };
    for candidate in candidates {
        match unbag(&candidate, flavor) {
            Ok(Unbagged::Unbagged) => report.bags += 1,
            Ok(Unbagged::NotABag) => tracing::debug!(path = %candidate.display(), "not a bag"),
            Err(e) => {
                tracing::error!(path = %candidate.display(), error = ?e, "could not unbag");
                report.failed += 1;
            },
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BagBuilder;

    fn dnd_bag(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(dir.join(name)).unwrap();
        fs::write(dir.join(name).join("page_0001a.tif"), b"scan").unwrap();
        fs::write(dir.join("metadata.csv"), b"meta").unwrap();
        fs::write(dir.join("manifest.csv"), b"manifest").unwrap();
        BagBuilder::new().tag_file(APTRUST_INFO_TXT, "Title: x\n").build(&dir).unwrap();
        dir
    }

    #[test]
    fn dnd_unbag_restores_item_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = dnd_bag(tmp.path(), "AAAA_BBB123456");
        assert_eq!(unbag(&dir, Flavor::Dnd).unwrap(), Unbagged::Unbagged);
        assert!(dir.join("page_0001a.tif").is_file());
        assert!(!dir.join(DATA_DIR).exists());
        assert!(!dir.join(BAGIT_TXT).exists());
        assert!(!dir.join("metadata.csv").exists());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    }

    #[test]
    fn standard_unbag_promotes_data() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = dnd_bag(tmp.path(), "ITEM");
        assert_eq!(unbag(&dir, Flavor::Standard).unwrap(), Unbagged::Unbagged);
        assert!(dir.join("ITEM/page_0001a.tif").is_file());
        assert!(dir.join("metadata.csv").is_file());
        assert!(!dir.join("manifest-md5.txt").exists());
    }

    #[test]
    fn unbag_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = dnd_bag(tmp.path(), "ITEM");
        unbag(&dir, Flavor::Standard).unwrap();
        let before: Vec<_> = fs::read_dir(&dir).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(unbag(&dir, Flavor::Standard).unwrap(), Unbagged::NotABag);
        let after: Vec<_> = fs::read_dir(&dir).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(before.len(), after.len());
    }

    #[test]
    fn dnd_refuses_unexpected_payload_siblings() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = dnd_bag(tmp.path(), "ITEM");
        fs::write(dir.join("data/extra.pdf"), b"keep me").unwrap();
        let err = unbag(&dir, Flavor::Dnd).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnexpectedPayload { names, .. } if names == &["extra.pdf"]));
        assert!(dir.join(BAGIT_TXT).is_file());
        assert!(dir.join("data/metadata.csv").is_file());
    }

    #[test]
    fn batch_counts_folders_and_bags() {
        let tmp = tempfile::tempdir().unwrap();
        dnd_bag(tmp.path(), "ONE");
        dnd_bag(tmp.path(), "TWO");
        fs::create_dir(tmp.path().join("PLAIN")).unwrap();
        fs::write(tmp.path().join("notes.txt"), b"x").unwrap();
        let report = unbag_all(tmp.path(), Flavor::Dnd).unwrap();
        assert_eq!(report, UnbagReport { folders: 3, bags: 2, failed: 0 });
        assert!(tmp.path().join("ONE/page_0001a.tif").is_file());
    }
}
