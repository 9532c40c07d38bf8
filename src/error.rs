//! CLI Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    /// A subcommand failed; the wrapped tree says why.
    #[display("{_0} failed")]
    Command(#[error(not(source))] &'static str),
    /// The value can only be asked for interactively, and `--yes` was given.
    #[display("{_0} is required when running with --yes")]
    MissingArgument(#[error(not(source))] &'static str),
    #[display("not a directory: {}", _0.display())]
    NotADirectory(#[error(not(source))] PathBuf),
    #[display("not a file: {}", _0.display())]
    NotAFile(#[error(not(source))] PathBuf),
    #[display("could not read from the terminal")]
    Prompt,
    #[display("could not start the async runtime")]
    Runtime,
    /// The binary was built without the requested upload target.
    #[display("unsupported upload target: {_0}")]
    Unsupported(#[error(not(source))] &'static str),
}
