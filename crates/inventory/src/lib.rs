//! Fixity inventories for digitized material.
//!
//! - [`hash`]: single-pass MD5 / SHA-2 / SHA3 digests of files and streams
//! - [`stat`]: file metadata and human readable sizes
//! - [`manifest`]: sorted, numbered inventories written as CSV or XLSX
//! - [`stamp`]: local timestamps for rows and output file names

pub mod error;
pub mod hash;
pub mod manifest;
pub mod stamp;
pub mod stat;

pub use crate::hash::{Algorithm, Digests, hash_file};
pub use crate::manifest::{Inventory, Layout, Options, Row, csv_writer, generate};
