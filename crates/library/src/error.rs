//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A file or folder name does not follow the item naming convention.
    /// Nothing has been changed on disk.
    #[display("name does not follow the item naming convention: {_0}")]
    InvalidName(#[error(not(source))] String),
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// A required input (folder, CSV file, column) was not supplied.
    #[display("missing required input: {_0}")]
    MissingInput(#[error(not(source))] &'static str),
    /// An input file does not exist.
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// No pipeline stage was selected.
    #[display("no stage selected")]
    NothingSelected,
    /// A CSV header does not match the loader layout exactly.
    #[display("unexpected CSV header in {}", _0.display())]
    InvalidHeader(#[error(not(source))] PathBuf),
    /// The requested ID column is not part of the CSV header.
    #[display("column not found in CSV header: {_0}")]
    UnknownColumn(#[error(not(source))] String),
    /// Reading or writing a CSV file failed.
    #[display("CSV error in {}", _0.display())]
    Csv(#[error(not(source))] PathBuf),
    /// A target already exists and will not be overwritten.
    #[display("already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// Creating, moving or deleting files failed.
    #[display("filesystem operation failed: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    #[display("inventory failed")]
    Inventory,
    #[display("bagging failed")]
    Bag,
    #[display("archive operation failed")]
    Archive,
}
