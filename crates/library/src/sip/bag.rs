use crate::error::{ErrorKind, Result};
use crate::operator::{Operator, Prompt};
use crate::util::{name_of, sorted_entries};
use exn::ResultExt;
use sipkit_bag::{AptrustInfo, BagBuilder, is_bag, title_for};
use sipkit_config::BagConfig;
use std::fmt;
use std::path::Path;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BagReport {
    pub total: usize,
    pub valid: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for BagReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "created {} bags, of which {} are valid", self.total, self.valid)?;
        if self.failed > 0 {
            write!(f, " ({} failed)", self.failed)?;
        }
        Ok(())
    }
}

/// The APTrust bag builder for one item folder.
pub fn aptrust_builder(item: &Path, config: &BagConfig) -> BagBuilder {
    let info = AptrustInfo {
        title: title_for(item),
        access: config.access.clone(),
        description: config.description.clone(),
        storage_option: config.storage_option.clone(),
    };
    BagBuilder::new()
        .algorithms(&config.algorithms)
        .info("Bag-Count", "")
        .info("Bag-Group-Identifier", "")
        .info("BagIt-Profile-Identifier", &config.profile_identifier)
        .info("Internal-Sender-Description", "")
        .info("Internal-Sender-Identifier", "")
        .info("Source-Organization", &config.source_organization)
        .tag_file(AptrustInfo::FILE_NAME, info.render())
}

/// Bag every item folder in place and validate the result.
#[instrument(skip(config, operator), fields(items_dir = %items_dir.display()))]
pub fn bag_items(items_dir: &Path, config: &BagConfig, operator: &mut dyn Operator) -> Result<BagReport> {
    if !items_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(items_dir.to_path_buf()));
    }
    let mut report = BagReport::default();
    for item in sorted_entries(items_dir).or_raise(|| ErrorKind::Io(items_dir.to_path_buf()))? {
        if !item.is_dir() {
            continue;
        }
        let name = name_of(&item);
        if is_bag(&item) && !operator.confirm(&Prompt::BagAnyway { item: name.clone() }) {
            report.skipped += 1;
            continue;
        }
        let bagged = aptrust_builder(&item, config).build(&item).and_then(|bag| bag.validate());
        match bagged {
            Ok(validation) => {
                report.total += 1;
                if validation.is_valid() {
                    report.valid += 1;
                } else {
                    tracing::warn!(item = %name, "bag is not valid");
                }
            },
            Err(e) => {
                tracing::error!(item = %name, error = ?e, "bagging failed");
                report.failed += 1;
            },
        }
    }
    tracing::info!(total = report.total, valid = report.valid, "bagging complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::tests::Scripted;
    use sipkit_bag::{APTRUST_INFO_TXT, Bag};
    use std::fs;

    #[test]
    fn bags_each_item_with_aptrust_info() {
        let tmp = tempfile::tempdir().unwrap();
        for id in ["AAAA_BBB000001", "AAAA_BBB000002"] {
            fs::create_dir_all(tmp.path().join(id).join(id)).unwrap();
            fs::write(tmp.path().join(id).join(id).join("p.tif"), id.as_bytes()).unwrap();
        }
        fs::write(tmp.path().join("stray.txt"), b"").unwrap();

        let report = bag_items(tmp.path(), &BagConfig::default(), &mut Scripted::default()).unwrap();
        assert_eq!(report, BagReport { total: 2, valid: 2, skipped: 0, failed: 0 });

        let dir = tmp.path().join("AAAA_BBB000001");
        let aptrust = fs::read_to_string(dir.join(APTRUST_INFO_TXT)).unwrap();
        assert!(aptrust.ends_with("Title: AAAA_BBB000001\n"));
        let bag = Bag::open(&dir).unwrap();
        assert_eq!(bag.info_value("Source-Organization"), Some("University of Alabama at Birmingham"));
        assert_eq!(bag.info_value("Bag-Count"), Some(""));
        assert!(dir.join("data/AAAA_BBB000001/p.tif").is_file());
    }

    #[test]
    fn existing_bag_skipped_by_default() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("AAAA_BBB000001/data")).unwrap();
        let mut operator = Scripted::default();
        let report = bag_items(tmp.path(), &BagConfig::default(), &mut operator).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(operator.asked, vec![Prompt::BagAnyway { item: "AAAA_BBB000001".into() }]);
    }
}
