//! Configuration for the packaging tools.
//!
//! Values are layered with [`figment`]: built-in defaults, then an optional
//! file (TOML, YAML or JSON, picked by extension), then `SIPKIT_`-prefixed
//! environment variables where `__` separates nested keys, e.g.
//! `SIPKIT_BAG__SOURCE_ORGANIZATION`.
//!
//! The defaults reproduce the folder names and APTrust values downstream
//! ingest expects, so most installs never need a file at all.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use sipkit_compress::Compression;
use sipkit_inventory::hash::Algorithm;
use std::path::{Path, PathBuf};
use tracing::instrument;

const ENV_PREFIX: &str = "SIPKIT_";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub folders: Folders,
    pub collate: Collate,
    pub naming: Naming,
    pub loader: LoaderDefaults,
    pub bag: BagConfig,
    pub transfer: Transfer,
    /// Codec wrapped around each item tarball.
    pub compression: Compression,
}

/// Names of the shared output folders created under a processing folder.
/// Downstream manual steps look for these exact names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Folders {
    pub ready_to_package: String,
    pub csv_loaders: String,
    pub ready_to_transfer: String,
    pub transfer_manifests: String,
}

impl Default for Folders {
    fn default() -> Self {
        Self {
            ready_to_package: "ready_to_package".into(),
            csv_loaders: "csv_loaders".into(),
            ready_to_transfer: "ready_to_transfer".into(),
            transfer_manifests: "transfer_manifests".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Collate {
    /// Lowercase extensions (without the dot) picked up from scanner output.
    pub accepted_extensions: Vec<String>,
}

impl Default for Collate {
    fn default() -> Self {
        Self { accepted_extensions: ["tif", "pdf", "xml", "txt", "jp2"].into_iter().map(String::from).collect() }
    }
}

impl Collate {
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.accepted_extensions.iter().any(|a| a.eq_ignore_ascii_case(ext)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Naming {
    /// Reject batches whose file or folder names break the local ID
    /// convention before touching anything on disk.
    pub enforce: bool,
}

impl Default for Naming {
    fn default() -> Self {
        Self { enforce: true }
    }
}

/// Column values written into every row of a new CSV loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderDefaults {
    pub responsible_org: String,
    pub collection: String,
    pub item_type: String,
    pub packaged_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BagConfig {
    pub source_organization: String,
    pub profile_identifier: String,
    /// `Access` in `aptrust-info.txt`: Consortia, Institution or Restricted.
    pub access: String,
    pub storage_option: String,
    pub description: String,
    pub algorithms: Vec<Algorithm>,
}

impl Default for BagConfig {
    fn default() -> Self {
        Self {
            source_organization: "University of Alabama at Birmingham".into(),
            profile_identifier: "https://raw.githubusercontent.com/APTrust/preservation-services/master/profiles/aptrust-v2.2.json".into(),
            access: "Institution".into(),
            storage_option: "Standard".into(),
            description: "University of Alabama at Birmingham".into(),
            algorithms: vec![Algorithm::Md5, Algorithm::Sha256],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transfer {
    pub demo_bucket: String,
    pub production_bucket: String,
    pub region: String,
    /// Override for S3-compatible services; AWS is used when unset.
    pub endpoint: Option<String>,
}

impl Default for Transfer {
    fn default() -> Self {
        Self {
            demo_bucket: "aptrust.receiving.test.uab.edu".into(),
            production_bucket: "aptrust.receiving.uab.edu".into(),
            region: "us-east-1".into(),
            endpoint: None,
        }
    }
}

impl Config {
    /// Default location of the configuration file for the current user.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("edu", "UAB Libraries", "sipkit").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Load configuration. An explicit `path` must exist; the default path
    /// is used only when present.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) if !p.is_file() => exn::bail!(ErrorKind::NotFound(p.to_path_buf())),
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.is_file()),
        };
        let figment = Self::figment(file.as_deref());
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(file = ?file, "configuration loaded");
        Ok(config)
    }

    fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            let ext = file.extension().and_then(|e| e.to_str()).map(str::to_lowercase);
            figment = match ext.as_deref() {
                Some("yaml" | "yml") => figment.merge(Yaml::file(file)),
                Some("json") => figment.merge(Json::file(file)),
                _ => figment.merge(Toml::file(file)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<()> {
        let folders = [
            ("folders.ready_to_package", &self.folders.ready_to_package),
            ("folders.csv_loaders", &self.folders.csv_loaders),
            ("folders.ready_to_transfer", &self.folders.ready_to_transfer),
            ("folders.transfer_manifests", &self.folders.transfer_manifests),
        ];
        for (field, name) in folders {
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                exn::bail!(ErrorKind::InvalidValue { field, reason: format!("`{name}` is not a plain folder name") });
            }
        }
        if self.bag.algorithms.is_empty() {
            exn::bail!(ErrorKind::InvalidValue {
                field: "bag.algorithms",
                reason: "at least one checksum algorithm is required".into(),
            });
        }
        if self.collate.accepted_extensions.is_empty() {
            exn::bail!(ErrorKind::InvalidValue {
                field: "collate.accepted_extensions",
                reason: "no file extensions would be collated".into(),
            });
        }
        Ok(())
    }
}
