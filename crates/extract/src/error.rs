//! Extraction Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// The output folder exists already. Remove or rename it and run again.
    #[display("already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// The file is not well-formed XML, or not UTF-8.
    #[display("malformed XML: {_0}")]
    MalformedXml(#[error(not(source))] String),
    /// Well-formed XML, but not a ProQuest submission.
    #[display("not a ProQuest DISS_submission document")]
    InvalidDocument,
    /// A zip file could not be opened or extracted.
    #[display("could not extract {}", _0.display())]
    Zip(#[error(not(source))] PathBuf),
    #[display("could not read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    #[display("could not write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
}
