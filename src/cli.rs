use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sipkit_compress::Compression;
use sipkit_library::sip::Stage;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "sipkit",
    version,
    about = "Collate, package, inventory and transfer digitized collections"
)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "SIPKIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log more; repeat for trace output
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Never prompt: take the default answer to every question
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Collate scanned pages into item folders, then write a CSV loader
    Collate(CollateArgs),
    /// Write a CSV loader for the item folders already in ready_to_package
    Loader(LoaderArgs),
    /// Run the SIP packaging stages over a folder of items
    Sip(SipArgs),
    /// Inventory the files captured from an optical disc
    Inventory(InventoryArgs),
    /// Turn every bag in a folder back into a plain item folder
    Unbag(UnbagArgs),
    /// Extract every tarball in a folder, then un-bag the results
    Untar(UntarArgs),
    /// Rename tarballs to <name>_old.tar.gz
    RenameTars(RenameTarsArgs),
    /// Split two-sided scans into <item>a and <item>b folders
    SplitSides(SplitSidesArgs),
    /// Build a Digital Commons loader from a ProQuest ETD delivery
    Etd(EtdArgs),
    /// Upload the tarballs in a folder to an APTrust receiving bucket
    Upload(UploadArgs),
}

#[derive(Debug, Args)]
pub struct CollateArgs {
    /// Folder of scanner output
    pub input: Option<PathBuf>,

    /// Processing folder receiving ready_to_package and csv_loaders
    pub processing: Option<PathBuf>,

    /// Only collate; do not write a CSV loader
    #[arg(long)]
    pub no_loader: bool,
}

#[derive(Debug, Args)]
pub struct LoaderArgs {
    /// Processing folder holding ready_to_package
    pub processing: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StageArg {
    PreBag,
    Metadata,
    Inventory,
    Bag,
    Tar,
    TransferManifest,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::PreBag => Stage::PreBag,
            StageArg::Metadata => Stage::Metadata,
            StageArg::Inventory => Stage::Inventory,
            StageArg::Bag => Stage::Bag,
            StageArg::Tar => Stage::Tar,
            StageArg::TransferManifest => Stage::TransferManifest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CompressionArg {
    None,
    Bzip2,
    Gzip,
}

impl From<CompressionArg> for Compression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => Compression::None,
            CompressionArg::Bzip2 => Compression::Bzip2,
            CompressionArg::Gzip => Compression::Gzip,
        }
    }
}

#[derive(Debug, Args)]
pub struct SipArgs {
    /// Folder holding one subfolder per item
    pub items: Option<PathBuf>,

    /// Stages to run, comma separated; all of them when omitted
    #[arg(long, value_enum, value_delimiter = ',')]
    pub stages: Vec<StageArg>,

    /// Processing folder receiving ready_to_transfer and transfer_manifests
    #[arg(long)]
    pub processing: Option<PathBuf>,

    /// CSV loader to split into per-item metadata.csv files
    #[arg(long)]
    pub metadata_csv: Option<PathBuf>,

    /// Loader column holding the item folder names
    #[arg(long, default_value = "Local ID")]
    pub id_column: String,

    /// Folder of archives to list in the transfer manifest
    #[arg(long)]
    pub transfer_source: Option<PathBuf>,

    /// Archive compression, overriding the configuration
    #[arg(long, value_enum)]
    pub compression: Option<CompressionArg>,

    /// Run every stage without asking to continue in between
    #[arg(long)]
    pub no_pause: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Csv,
    Xlsx,
}

#[derive(Debug, Args)]
pub struct InventoryArgs {
    /// Folder holding the files copied off the disc
    pub input: Option<PathBuf>,

    /// Folder receiving the inventory file
    pub output: Option<PathBuf>,

    /// Text written on the disc
    #[arg(long)]
    pub label: Option<String>,

    /// Archives (collection) the disc belongs to
    #[arg(long)]
    pub archive: Option<String>,

    /// Disc number within the archive
    #[arg(long)]
    pub number: Option<String>,

    /// Person capturing the disc
    #[arg(long, env = "USER")]
    pub operator: Option<String>,

    #[arg(long, value_enum, default_value = "csv")]
    pub format: FormatArg,

    /// Also copy the disc contents into <COPY_TO>/<archive>_<number>
    #[arg(long)]
    pub copy_to: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlavorArg {
    /// Payload directly under data/
    Standard,
    /// Payload under data/<bag name>/ next to stamped metadata
    Dnd,
}

#[derive(Debug, Args)]
pub struct UnbagArgs {
    /// Folder of bags
    pub dir: Option<PathBuf>,

    /// Bag layout; asked for when omitted
    #[arg(long, value_enum)]
    pub flavor: Option<FlavorArg>,
}

#[derive(Debug, Args)]
pub struct UntarArgs {
    /// Folder of tarballs
    pub dir: Option<PathBuf>,

    /// Bag layout of the extracted folders; asked for when omitted
    #[arg(long, value_enum)]
    pub flavor: Option<FlavorArg>,

    /// Only extract; leave the bags as they are
    #[arg(long)]
    pub no_unbag: bool,
}

#[derive(Debug, Args)]
pub struct RenameTarsArgs {
    /// Folder of tarballs
    pub dir: Option<PathBuf>,

    /// Tarballs sit one folder down and take that folder's name
    #[arg(long)]
    pub nested: bool,
}

#[derive(Debug, Args)]
pub struct SplitSidesArgs {
    /// Batch folder of two-sided items
    pub batch: Option<PathBuf>,

    /// Keep the <item>b folders instead of zipping them
    #[arg(long)]
    pub no_zip: bool,
}

#[derive(Debug, Args)]
pub struct EtdArgs {
    /// Folder of ProQuest zips, or of unzipped ETDs with --unzipped
    pub input: Option<PathBuf>,

    /// Folder receiving the Excel loader; defaults to the unzipped folder
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// The input is already unzipped
    #[arg(long)]
    pub unzipped: bool,

    /// Do not write the folder/PDF log
    #[arg(long)]
    pub no_log: bool,

    /// Do not write the Excel loader
    #[arg(long)]
    pub no_excel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Demo,
    Production,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Folder of tarballs to upload
    pub dir: Option<PathBuf>,

    /// Receiving bucket; asked for when omitted
    #[arg(long, value_enum)]
    pub environment: Option<Environment>,

    /// Copy into this local folder instead of uploading to S3
    #[arg(long)]
    pub local: Option<PathBuf>,

    #[arg(long, env = "SIPKIT_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    #[arg(long, env = "SIPKIT_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_stage_list() {
        let cli = Cli::try_parse_from(["sipkit", "-y", "sip", "/items", "--stages", "bag,tar"]).unwrap();
        assert!(cli.yes);
        let Commands::Sip(args) = cli.command else {
            panic!("expected the sip subcommand");
        };
        assert_eq!(args.items, Some(PathBuf::from("/items")));
        assert_eq!(args.stages, vec![StageArg::Bag, StageArg::Tar]);
        assert_eq!(args.id_column, "Local ID");
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from(["sipkit", "unbag", "/bags", "--flavor", "dnd", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Unbag(UnbagArgs { flavor: Some(FlavorArg::Dnd), .. })));
    }
}
