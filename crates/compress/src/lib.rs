//! Compression and tar archiving for transfer packages.
//!
//! [`Compression`] picks the stream codec wrapped around a tar archive
//! (`.tar.gz` by default, `.tar.bz2` when configured) and detects it again
//! when reading, either from the file name ([`Compression::from_path`]) or
//! from the leading magic bytes ([`Compression::from_magic_bytes`]).
//!
//! The [`archive`] module packs an item folder into a single archive whose
//! root entry is the folder name, and unpacks archives back onto disk.

pub mod archive;
mod construct;
pub mod error;
mod ops;
mod util;

/// A supported compression format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum Compression {
    /// Uncompressed
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz)
    #[default]
    Gzip,
}
