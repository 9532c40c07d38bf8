//! Where finished archives go.
//!
//! A [`StorageBackend`] accepts local files under validated keys. The
//! receiving bucket is the S3 backend (feature `s3`); the local backend
//! stages into a folder instead, which is also what the tests use.

pub mod backend;
pub mod error;
mod path;
mod upload;

pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
pub use crate::upload::{UploadReport, upload_dir};
