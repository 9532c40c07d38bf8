use crate::error::{ErrorKind, Result};
use crate::{Algorithm, Bag, decode_path, manifest_name, payload_files, tagmanifest_name};
use exn::ResultExt;
use sipkit_inventory::hash_file;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::instrument;

/// Outcome of checking a bag against its manifests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    /// Listed in a payload manifest but absent from `data/`.
    pub missing: Vec<String>,
    /// Present in `data/` but listed in no payload manifest.
    pub untracked: Vec<String>,
    /// Payload files whose digest differs from at least one manifest.
    pub mismatched: Vec<String>,
    /// Tag files missing or differing from a tag manifest.
    pub tag_mismatched: Vec<String>,
    /// `Payload-Oxum` present in `bag-info.txt` and wrong.
    pub oxum_mismatch: bool,
}

impl Validation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing.is_empty()
            && self.untracked.is_empty()
            && self.mismatched.is_empty()
            && self.tag_mismatched.is_empty()
            && !self.oxum_mismatch
    }
}

type Manifest = BTreeMap<String, String>;

fn read_manifest(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path).or_raise(|| ErrorKind::MalformedTag(path.to_path_buf()))?;
    let mut manifest = Manifest::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match line.split_once(char::is_whitespace) {
            Some((digest, file)) => manifest.insert(decode_path(file.trim_start()), digest.to_lowercase()),
            None => exn::bail!(ErrorKind::MalformedTag(path.to_path_buf())),
        };
    }
    Ok(manifest)
}

impl Bag {
    /// Recompute every payload and tag digest and compare against the
    /// manifests on disk.
    #[instrument(skip(self), fields(bag = %self.path().display(), valid))]
    pub fn validate(&self) -> Result<Validation> {
        let mut validation = Validation::default();
        let mut manifests: Vec<(Algorithm, Manifest)> = Vec::new();
        for algorithm in self.algorithms() {
            manifests.push((*algorithm, read_manifest(&self.path().join(manifest_name(*algorithm)))?));
        }

        let on_disk: BTreeMap<String, std::path::PathBuf> = payload_files(self.path())?.into_iter().collect();
        let listed: BTreeSet<&String> = manifests.iter().flat_map(|(_, m)| m.keys()).collect();
        let (mut bytes, mut count) = (0u64, 0u64);
        for (relative, absolute) in &on_disk {
            bytes += std::fs::metadata(absolute).or_raise(|| ErrorKind::Io(absolute.clone()))?.len();
            count += 1;
            if !listed.contains(&relative) {
                validation.untracked.push(relative.clone());
            }
        }
        for relative in &listed {
            let Some(absolute) = on_disk.get(*relative) else {
                validation.missing.push((*relative).clone());
                continue;
            };
            let expected: Vec<(Algorithm, &String)> =
                manifests.iter().filter_map(|(a, m)| m.get(*relative).map(|d| (*a, d))).collect();
            let algorithms: Vec<Algorithm> = expected.iter().map(|(a, _)| *a).collect();
            let actual = hash_file(absolute, &algorithms).or_raise(|| ErrorKind::Checksum)?;
            if expected.iter().any(|(a, digest)| actual.get(*a) != Some(digest.as_str())) {
                validation.mismatched.push((*relative).clone());
            }
        }

        if let Some(oxum) = self.info_value("Payload-Oxum") {
            validation.oxum_mismatch = oxum != format!("{bytes}.{count}");
        }
        self.check_tag_manifests(&mut validation)?;

        let valid = validation.is_valid();
        tracing::Span::current().record("valid", valid);
        if !valid {
            tracing::warn!(?validation, "bag failed validation");
        }
        Ok(validation)
    }

    fn check_tag_manifests(&self, validation: &mut Validation) -> Result<()> {
        for algorithm in self.algorithms() {
            let path = self.path().join(tagmanifest_name(*algorithm));
            if !path.is_file() {
                continue;
            }
            for (name, digest) in read_manifest(&path)? {
                let file = self.path().join(&name);
                let matches = file.is_file()
                    && hash_file(&file, &[*algorithm])
                        .or_raise(|| ErrorKind::Checksum)?
                        .get(*algorithm)
                        .is_some_and(|actual| actual == digest);
                if !matches && !validation.tag_mismatched.contains(&name) {
                    validation.tag_mismatched.push(name);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BagBuilder;
    use std::fs;

    fn bagged(root: &Path) -> Bag {
        let dir = root.join("ITEM");
        fs::create_dir_all(dir.join("ITEM/sub")).unwrap();
        fs::write(dir.join("ITEM/a.tif"), b"aaaa").unwrap();
        fs::write(dir.join("ITEM/sub/b.tif"), b"bbbb").unwrap();
        BagBuilder::new().info("Source-Organization", "UAB").build(&dir).unwrap()
    }

    #[test]
    fn fresh_bag_is_valid() {
        let tmp = tempfile::tempdir().unwrap();
        let validation = bagged(tmp.path()).validate().unwrap();
        assert!(validation.is_valid(), "{validation:?}");
    }

    #[test]
    fn detects_changed_missing_and_untracked_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let bag = bagged(tmp.path());
        fs::write(bag.path().join("data/ITEM/a.tif"), b"AAAA").unwrap();
        fs::remove_file(bag.path().join("data/ITEM/sub/b.tif")).unwrap();
        fs::write(bag.path().join("data/ITEM/new.tif"), b"new").unwrap();

        let validation = bag.validate().unwrap();
        assert!(!validation.is_valid());
        assert_eq!(validation.mismatched, ["data/ITEM/a.tif"]);
        assert_eq!(validation.missing, ["data/ITEM/sub/b.tif"]);
        assert_eq!(validation.untracked, ["data/ITEM/new.tif"]);
        assert!(validation.oxum_mismatch);
    }

    #[test]
    fn detects_edited_tag_file() {
        let tmp = tempfile::tempdir().unwrap();
        let bag = bagged(tmp.path());
        fs::write(bag.path().join("bag-info.txt"), "Source-Organization: Someone else\n").unwrap();
        let validation = bag.validate().unwrap();
        assert_eq!(validation.tag_mismatched, ["bag-info.txt"]);
    }
}
