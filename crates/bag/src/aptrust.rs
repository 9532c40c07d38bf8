use crate::APTRUST_INFO_TXT;
use std::path::Path;

/// Contents of `aptrust-info.txt`, the APTrust-specific tag file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AptrustInfo {
    pub title: String,
    pub access: String,
    pub description: String,
    pub storage_option: String,
}

impl AptrustInfo {
    pub const FILE_NAME: &'static str = APTRUST_INFO_TXT;

    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "Access: {}\nDescription: {}\nStorage-Option: {}\nTitle: {}\n",
            self.access, self.description, self.storage_option, self.title
        )
    }
}

/// Bag title derived from its folder: the name up to the first `.`.
#[must_use]
pub fn title_for(dir: &Path) -> String {
    let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    match name.split_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => name,
    }
}
