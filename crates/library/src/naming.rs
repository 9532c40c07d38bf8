//! Item and page naming convention.
//!
//! Item IDs are four letters, an underscore, three letters and six digits
//! (`AAAA_BBB123456`). Page files append `_NNNN` and a side flag `a`/`b` to
//! the ID before the extension (`AAAA_BBB123456_0001a.tif`).

use crate::error::{ErrorKind, Result};
use derive_more::Display;
use exn::ResultExt;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(ITEM_FILE_REGEX, r"^[A-Z]{4}_[A-Z]{3}[0-9]{6}_[0-9]{4}[ab]$");
regex!(ITEM_ID_REGEX, r"^[A-Z]{4}_[A-Z]{3}[0-9]{6}$");

const ID_LEN: usize = 14;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    #[display("a")]
    A,
    #[display("b")]
    B,
}

/// A parsed page file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageName {
    pub item_id: String,
    pub page: u16,
    pub side: Side,
}

/// Parse a page file name. Only the stem is checked; the extension is
/// filtered separately by the collation settings.
pub fn validate_file_name(name: &str) -> Result<PageName> {
    let stem = Path::new(name).file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if !ITEM_FILE_REGEX.is_match(stem) {
        exn::bail!(ErrorKind::InvalidName(name.to_string()));
    }
    // The pattern is ASCII-only, so byte offsets are character offsets.
    let page = stem[ID_LEN + 1..ID_LEN + 5].parse::<u16>().or_raise(|| ErrorKind::InvalidName(name.to_string()))?;
    let side = match &stem[ID_LEN + 5..] {
        "a" => Side::A,
        _ => Side::B,
    };
    Ok(PageName { item_id: stem[..ID_LEN].to_string(), page, side })
}

pub fn validate_item_id(id: &str) -> Result<()> {
    match ITEM_ID_REGEX.is_match(id) {
        true => Ok(()),
        false => exn::bail!(ErrorKind::InvalidName(id.to_string())),
    }
}

/// Validate a whole batch, stopping at the first non-conforming name.
pub fn validate_batch<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<Vec<PageName>> {
    names.into_iter().map(validate_file_name).collect()
}
