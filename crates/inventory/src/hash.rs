//! Single-pass streaming checksums.
//!
//! Every requested digest is fed from the same read buffer, so hashing a
//! multi-gigabyte scan for both MD5 and SHA-256 reads it from disk once.

use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use sha2::{Digest, Sha256, Sha512};
use sha3::Sha3_256;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum Algorithm {
    Md5,
    Sha256,
    Sha512,
    Sha3_256,
}

impl Algorithm {
    /// Lowercase name as used in BagIt manifest file names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
            Algorithm::Sha3_256 => "sha3_256",
        }
    }

    fn hasher(&self) -> Hasher {
        match self {
            Algorithm::Md5 => Hasher::Md5(md5::Context::new()),
            Algorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            Algorithm::Sha512 => Hasher::Sha512(Sha512::new()),
            Algorithm::Sha3_256 => Hasher::Sha3_256(Sha3_256::new()),
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "md5" => Ok(Algorithm::Md5),
            "sha256" => Ok(Algorithm::Sha256),
            "sha512" => Ok(Algorithm::Sha512),
            "sha3_256" | "sha3256" => Ok(Algorithm::Sha3_256),
            _ => exn::bail!(ErrorKind::UnknownAlgorithm(s.to_string())),
        }
    }
}

enum Hasher {
    Md5(md5::Context),
    Sha256(Sha256),
    Sha512(Sha512),
    Sha3_256(Sha3_256),
}

impl Hasher {
    fn update(&mut self, chunk: &[u8]) {
        match self {
            Hasher::Md5(h) => h.consume(chunk),
            Hasher::Sha256(h) => h.update(chunk),
            Hasher::Sha512(h) => h.update(chunk),
            Hasher::Sha3_256(h) => h.update(chunk),
        }
    }

    fn finish(self) -> String {
        match self {
            Hasher::Md5(h) => format!("{:x}", h.compute()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
            Hasher::Sha512(h) => hex::encode(h.finalize()),
            Hasher::Sha3_256(h) => hex::encode(h.finalize()),
        }
    }
}

/// Lowercase hex digests keyed by algorithm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digests(BTreeMap<Algorithm, String>);

impl Digests {
    #[must_use]
    pub fn get(&self, algorithm: Algorithm) -> Option<&str> {
        self.0.get(&algorithm).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Algorithm, &str)> {
        self.0.iter().map(|(a, d)| (*a, d.as_str()))
    }

    /// Add digests taken in a separate pass.
    pub fn merge(&mut self, other: Digests) {
        self.0.extend(other.0);
    }
}

/// Hash everything `reader` yields, returning the byte count alongside the
/// digests.
pub fn hash_reader<R: Read>(mut reader: R, algorithms: &[Algorithm]) -> io::Result<(u64, Digests)> {
    let mut hashers: Vec<(Algorithm, Hasher)> = algorithms.iter().map(|a| (*a, a.hasher())).collect();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        total += read as u64;
        for (_, hasher) in hashers.iter_mut() {
            hasher.update(&buffer[..read]);
        }
    }
    let digests = hashers.into_iter().map(|(a, h)| (a, h.finish())).collect();
    Ok((total, Digests(digests)))
}

pub fn hash_file(path: &Path, algorithms: &[Algorithm]) -> Result<Digests> {
    let file = File::open(path).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    let (_, digests) = hash_reader(file, algorithms).or_raise(|| ErrorKind::Read(path.to_path_buf()))?;
    Ok(digests)
}
