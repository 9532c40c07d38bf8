//! Inventory Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An inventory error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for inventory operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The directory to inventory does not exist or is not a directory.
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// A file could not be read while hashing.
    #[display("could not read {}", _0.display())]
    Read(#[error(not(source))] PathBuf),
    /// Writing the CSV or spreadsheet output failed.
    #[display("could not write {}", _0.display())]
    Write(#[error(not(source))] PathBuf),
    /// An algorithm name was not recognised.
    #[display("unknown checksum algorithm: {_0}")]
    UnknownAlgorithm(#[error(not(source))] String),
}
