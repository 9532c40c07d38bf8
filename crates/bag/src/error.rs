//! Bag Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A bagging error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for bag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    /// The folder has no `data/` payload directory.
    #[display("not a bag: {}", _0.display())]
    NotABag(#[error(not(source))] PathBuf),
    /// A tag file is missing or cannot be parsed.
    #[display("malformed tag file: {}", _0.display())]
    MalformedTag(#[error(not(source))] PathBuf),
    /// No checksum algorithm was requested.
    #[display("at least one checksum algorithm is required")]
    NoAlgorithms,
    /// The payload cannot be promoted without losing files next to it.
    #[display("payload of {} has unexpected siblings: {}", bag.display(), names.join(", "))]
    UnexpectedPayload {
        bag: PathBuf,
        names: Vec<String>,
    },
    /// Moving, writing or deleting files failed part-way.
    #[display("filesystem operation failed: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// Hashing the payload failed.
    #[display("could not checksum payload")]
    Checksum,
}
