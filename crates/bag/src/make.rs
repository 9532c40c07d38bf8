use crate::error::{ErrorKind, Result};
use crate::{
    Algorithm, BAG_INFO_TXT, BAGIT_TXT, BAGIT_VERSION, Bag, DATA_DIR, encode_path, manifest_name, payload_files,
    tagmanifest_name, unused_name,
};
use exn::ResultExt;
use sipkit_inventory::{hash_file, stamp};
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use tracing::instrument;

const SOFTWARE_AGENT: &str = concat!("sipkit ", env!("CARGO_PKG_VERSION"));

/// Builds a bag in place: the folder's current contents become the payload.
///
/// ```no_run
/// use sipkit_bag::{Algorithm, BagBuilder};
/// # fn main() -> sipkit_bag::error::Result<()> {
/// let bag = BagBuilder::new()
///     .algorithms(&[Algorithm::Md5, Algorithm::Sha256])
///     .info("Source-Organization", "University of Alabama at Birmingham")
///     .tag_file("aptrust-info.txt", "Title: AAAA_BBB123456\n")
///     .build(std::path::Path::new("/batch/AAAA_BBB123456"))?;
/// assert!(bag.validate()?.is_valid());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BagBuilder {
    algorithms: Vec<Algorithm>,
    info: Vec<(String, String)>,
    tag_files: Vec<(String, String)>,
}

impl Default for BagBuilder {
    fn default() -> Self {
        Self { algorithms: vec![Algorithm::Md5, Algorithm::Sha256], info: Vec::new(), tag_files: Vec::new() }
    }
}

impl BagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithms(mut self, algorithms: &[Algorithm]) -> Self {
        let mut algorithms = algorithms.to_vec();
        algorithms.sort();
        algorithms.dedup();
        self.algorithms = algorithms;
        self
    }

    /// Add a `bag-info.txt` field. Empty values are written as `Key: `.
    pub fn info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.push((key.into(), value.into()));
        self
    }

    /// Add an extra top-level tag file, covered by the tag manifests.
    pub fn tag_file(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.tag_files.push((name.into(), contents.into()));
        self
    }

    #[instrument(skip(self), fields(dir = %dir.display(), files, bytes))]
    pub fn build(self, dir: &Path) -> Result<Bag> {
        if !dir.is_dir() {
            exn::bail!(ErrorKind::NotADirectory(dir.to_path_buf()));
        }
        if self.algorithms.is_empty() {
            exn::bail!(ErrorKind::NoAlgorithms);
        }
        move_into_payload(dir)?;

        let mut manifests: Vec<(Algorithm, String)> = self.algorithms.iter().map(|a| (*a, String::new())).collect();
        let (mut bytes, mut count) = (0u64, 0u64);
        for (relative, absolute) in payload_files(dir)? {
            let digests = hash_file(&absolute, &self.algorithms).or_raise(|| ErrorKind::Checksum)?;
            bytes += fs::metadata(&absolute).or_raise(|| ErrorKind::Io(absolute.clone()))?.len();
            count += 1;
            for (algorithm, manifest) in manifests.iter_mut() {
                let digest = digests.get(*algorithm).unwrap_or_default();
                manifest.push_str(&format!("{digest}  {}\n", encode_path(&relative)));
            }
        }
        tracing::Span::current().record("files", count).record("bytes", bytes);

        for (algorithm, manifest) in &manifests {
            write_tag(&dir.join(manifest_name(*algorithm)), manifest)?;
        }
        write_tag(
            &dir.join(BAGIT_TXT),
            &format!("BagIt-Version: {BAGIT_VERSION}\nTag-File-Character-Encoding: UTF-8\n"),
        )?;
        write_tag(&dir.join(BAG_INFO_TXT), &self.render_info(bytes, count))?;
        for (name, contents) in &self.tag_files {
            write_tag(&dir.join(name), contents)?;
        }
        self.write_tag_manifests(dir)?;
        Bag::open(dir)
    }

    fn render_info(&self, bytes: u64, count: u64) -> String {
        let date = stamp::now().format(format_description!("[year]-[month]-[day]")).unwrap_or_default();
        let mut info = String::new();
        for (key, value) in &self.info {
            info.push_str(&format!("{key}: {value}\n"));
        }
        info.push_str(&format!("Bagging-Date: {date}\n"));
        info.push_str(&format!("Bag-Software-Agent: {SOFTWARE_AGENT}\n"));
        info.push_str(&format!("Payload-Oxum: {bytes}.{count}\n"));
        info
    }

    fn write_tag_manifests(&self, dir: &Path) -> Result<()> {
        let mut tag_names = vec![BAGIT_TXT.to_string(), BAG_INFO_TXT.to_string()];
        tag_names.extend(self.algorithms.iter().map(|a| manifest_name(*a)));
        tag_names.extend(self.tag_files.iter().map(|(name, _)| name.clone()));
        tag_names.sort();
        tag_names.dedup();
        for algorithm in &self.algorithms {
            let mut manifest = String::new();
            for name in &tag_names {
                let digests = hash_file(&dir.join(name), &[*algorithm]).or_raise(|| ErrorKind::Checksum)?;
                manifest.push_str(&format!("{}  {}\n", digests.get(*algorithm).unwrap_or_default(), encode_path(name)));
            }
            write_tag(&dir.join(tagmanifest_name(*algorithm)), &manifest)?;
        }
        Ok(())
    }
}

fn write_tag(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).or_raise(|| ErrorKind::Io(path.to_path_buf()))
}

/// Move everything in `dir` into `dir/data`, going through a temporary
/// folder so an existing entry called `data` is moved like any other.
/// Entries already moved are put back if a move fails.
fn move_into_payload(dir: &Path) -> Result<()> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .or_raise(|| ErrorKind::Io(dir.to_path_buf()))?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<_>>()
        .or_raise(|| ErrorKind::Io(dir.to_path_buf()))?;
    let temp = unused_name(dir, ".bagit-payload");
    fs::create_dir(&temp).or_raise(|| ErrorKind::Io(temp.clone()))?;

    let mut moved: Vec<(PathBuf, PathBuf)> = Vec::new();
    for entry in entries {
        let Some(name) = entry.file_name() else { continue };
        let target = temp.join(name);
        if let Err(e) = fs::rename(&entry, &target) {
            roll_back(&moved, &temp);
            return Err(e).or_raise(|| ErrorKind::Io(entry.clone()));
        }
        moved.push((entry, target));
    }
    let data = dir.join(DATA_DIR);
    fs::rename(&temp, &data).or_raise(|| ErrorKind::Io(data.clone()))
}

/// Put moved entries back where they were and drop the temporary folder.
/// Anything that cannot be restored is logged and left for the operator.
fn roll_back(moved: &[(PathBuf, PathBuf)], temp: &Path) {
    for (from, to) in moved.iter().rev() {
        if let Err(e) = fs::rename(to, from) {
            tracing::warn!(from = %to.display(), to = %from.display(), error = %e, "could not restore payload entry");
        }
    }
    if let Err(e) = fs::remove_dir(temp) {
        tracing::warn!(path = %temp.display(), error = %e, "could not remove temporary payload folder");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{APTRUST_INFO_TXT, parse_tag_file};

    fn item(root: &Path) -> PathBuf {
        let item = root.join("AAAA_BBB123456");
        fs::create_dir_all(item.join("AAAA_BBB123456")).unwrap();
        fs::write(item.join("AAAA_BBB123456/AAAA_BBB123456_0001a.tif"), b"front").unwrap();
        fs::write(item.join("AAAA_BBB123456/AAAA_BBB123456_0001b.tif"), b"back!").unwrap();
        fs::write(item.join("metadata.csv"), b"System UUID\n").unwrap();
        item
    }

    #[test]
    fn builds_bag_with_manifests_and_info() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = item(tmp.path());
        let bag = BagBuilder::new()
            .algorithms(&[Algorithm::Sha256, Algorithm::Md5, Algorithm::Md5])
            .info("Source-Organization", "University of Alabama at Birmingham")
            .info("Bag-Count", "")
            .tag_file(APTRUST_INFO_TXT, "Title: AAAA_BBB123456\n")
            .build(&dir)
            .unwrap();

        assert_eq!(bag.algorithms(), [Algorithm::Md5, Algorithm::Sha256]);
        assert!(dir.join("data/AAAA_BBB123456/AAAA_BBB123456_0001a.tif").is_file());
        assert!(dir.join("data/metadata.csv").is_file());
        assert!(!dir.join("metadata.csv").exists());

        let md5 = fs::read_to_string(dir.join("manifest-md5.txt")).unwrap();
        let lines: Vec<_> = md5.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], format!("{:x}  data/AAAA_BBB123456/AAAA_BBB123456_0001a.tif", md5::compute(b"front")));

        assert_eq!(bag.info_value("Payload-Oxum"), Some("22.3"));
        assert_eq!(bag.info_value("bag-count"), Some(""));
        let tags = fs::read_to_string(dir.join("tagmanifest-sha256.txt")).unwrap();
        assert!(tags.contains(APTRUST_INFO_TXT));
        assert!(tags.contains("manifest-md5.txt"));
        let bagit = parse_tag_file(&dir.join(BAGIT_TXT)).unwrap();
        assert_eq!(bagit[0], ("BagIt-Version".to_string(), BAGIT_VERSION.to_string()));
    }

    #[test]
    fn existing_data_folder_is_nested_not_merged() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("ITEM");
        fs::create_dir_all(dir.join("data")).unwrap();
        fs::write(dir.join("data/file.txt"), b"x").unwrap();
        BagBuilder::new().build(&dir).unwrap();
        assert!(dir.join("data/data/file.txt").is_file());
    }

    #[test]
    fn roll_back_restores_what_it_can() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = item(tmp.path());
        let temp = unused_name(&dir, ".bagit-payload");
        fs::create_dir(&temp).unwrap();
        let kept = (dir.join("metadata.csv"), temp.join("metadata.csv"));
        fs::rename(&kept.0, &kept.1).unwrap();
        let lost = (dir.join("gone.txt"), temp.join("gone.txt"));

        roll_back(&[kept.clone(), lost], &temp);
        assert!(kept.0.is_file());
        assert!(!temp.exists());
        assert!(!dir.join("gone.txt").exists());
    }

    #[test]
    fn requires_an_algorithm() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = item(tmp.path());
        let err = BagBuilder::new().algorithms(&[]).build(&dir).unwrap_err();
        assert_eq!(*err, ErrorKind::NoAlgorithms);
        assert!(dir.join("metadata.csv").is_file());
    }
}
