//! ProQuest ETD deliveries to Digital Commons batch loaders.
//!
//! A delivery is a folder of zips, one per thesis, each holding the PDF and a
//! `*_DATA.xml` metadata file. [`unzip_all`] unpacks them, [`build_loader`]
//! turns the metadata into a spreadsheet and [`write_log`] records which
//! folder holds which PDF.

mod consts;
pub mod error;
mod extract;
mod loader;
mod row;
mod unzip;

use exn::ResultExt;
use std::path::Path;
use tracing::instrument;

pub use crate::consts::{DATA_XML_SUFFIX, ETD_COLUMNS, MAX_COMMITTEE};
use crate::error::{ErrorKind, Result};
pub use crate::extract::Extractor;
pub use crate::loader::{LoaderReport, LogReport, build_loader, find_xml, write_log};
pub use crate::row::EtdRow;
pub use crate::unzip::{UnzipReport, unzip_all};

/// Easy, top-level entrypoint: read one metadata file and build its row.
///
/// The file must be UTF-8; anything else is reported as malformed rather
/// than decoded lossily.
#[instrument(fields(path = %path.display()))]
pub fn extract_file(path: &Path) -> Result<EtdRow> {
    let bytes = std::fs::read(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let xml = match String::from_utf8(bytes) {
        Ok(xml) => xml,
        Err(e) => exn::bail!(ErrorKind::MalformedXml(e.to_string())),
    };
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    Ok(Extractor::from_xml(&xml)?.row(&name))
}
