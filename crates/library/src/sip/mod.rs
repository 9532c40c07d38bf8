//! Submission Information Package (SIP) preparation.
//!
//! A batch of item folders goes through up to six stages, always in this
//! order: pre-bag, metadata, inventory, bag, tar and transfer manifest. Each
//! stage is a plain function usable on its own; [`Pipeline`] chains the
//! selected ones, checks every input up front and asks the operator between
//! stages.

mod bag;
mod inventory;
mod metadata;
mod prebag;
mod tar;
mod transfer;

pub use self::bag::{BagReport, aptrust_builder, bag_items};
pub use self::inventory::{InventoryReport, MANIFEST_CSV, inventory_items};
pub use self::metadata::{METADATA_CSV, MetadataReport, stamp_metadata};
pub use self::prebag::prebag;
pub use self::tar::{TarReport, tar_items};
pub use self::transfer::{TransferReport, transfer_manifest};
use crate::error::{ErrorKind, Result};
use crate::loader::read_loader;
use crate::naming::validate_item_id;
use crate::operator::{Operator, Prompt};
use crate::util::{item_folders, name_of};
use derive_more::Display;
use exn::{OptionExt, ResultExt};
use sipkit_config::Config;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    #[display("pre-bag")]
    PreBag,
    #[display("metadata")]
    Metadata,
    #[display("inventory")]
    Inventory,
    #[display("bag")]
    Bag,
    #[display("tar")]
    Tar,
    #[display("transfer manifest")]
    TransferManifest,
}

impl Stage {
    pub const ALL: [Stage; 6] =
        [Stage::PreBag, Stage::Metadata, Stage::Inventory, Stage::Bag, Stage::Tar, Stage::TransferManifest];
}

/// The stages to run. Iteration always follows pipeline order, whatever
/// order they were selected in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<Stage>);

impl Selection {
    #[must_use]
    pub fn all() -> Self {
        Self(Stage::ALL.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, stage: Stage) -> bool {
        self.0.contains(&stage)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.0.iter().copied()
    }

    /// Every stage except the transfer manifest works on the items folder.
    #[must_use]
    pub fn needs_items_dir(&self) -> bool {
        self.0.iter().any(|s| *s != Stage::TransferManifest)
    }

    #[must_use]
    pub fn needs_processing_dir(&self) -> bool {
        self.contains(Stage::Tar) || self.contains(Stage::TransferManifest)
    }
}

impl FromIterator<Stage> for Selection {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inputs {
    /// Folder holding one subfolder per item.
    pub items_dir: Option<PathBuf>,
    /// Folder under which `ready_to_transfer` and `transfer_manifests` live.
    pub processing_dir: Option<PathBuf>,
    pub metadata_csv: Option<PathBuf>,
    /// Loader column holding the item folder names.
    pub id_column: Option<String>,
    /// Archives listed by the transfer manifest. Defaults to the processing
    /// folder's `ready_to_transfer`.
    pub transfer_source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    PreBag(usize),
    Metadata(MetadataReport),
    Inventory(InventoryReport),
    Bag(BagReport),
    Tar(TarReport),
    TransferManifest(TransferReport),
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreBag(moved) => write!(f, "pre-bagged {moved} items"),
            Self::Metadata(report) => report.fmt(f),
            Self::Inventory(report) => report.fmt(f),
            Self::Bag(report) => report.fmt(f),
            Self::Tar(report) => report.fmt(f),
            Self::TransferManifest(report) => report.fmt(f),
        }
    }
}

#[derive(Debug)]
pub struct StageRun {
    pub stage: Stage,
    pub outcome: Result<StageOutcome>,
}

#[derive(Debug, Default)]
pub struct PipelineReport {
    pub runs: Vec<StageRun>,
    /// The operator declined to continue after a stage.
    pub stopped_by_operator: bool,
}

impl PipelineReport {
    /// The stage that failed and stopped the run, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&StageRun> {
        self.runs.iter().find(|run| run.outcome.is_err())
    }
}

/// Inputs after validation, resolved to concrete paths.
struct Resolved<'i> {
    items_dir: Option<&'i Path>,
    processing_dir: Option<&'i Path>,
    metadata: Option<(&'i Path, &'i str)>,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    prompt_between: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, prompt_between: true }
    }

    /// Ask the operator before each stage after the first. On by default.
    pub fn prompt_between(mut self, prompt: bool) -> Self {
        self.prompt_between = prompt;
        self
    }

    fn resolve<'i>(&self, selection: &Selection, inputs: &'i Inputs) -> Result<Resolved<'i>> {
        if selection.is_empty() {
            exn::bail!(ErrorKind::NothingSelected);
        }
        let items_dir = match selection.needs_items_dir() {
            true => Some(existing_dir(inputs.items_dir.as_deref(), "items folder")?),
            false => None,
        };
        let processing_dir = match selection.needs_processing_dir() {
            true => Some(existing_dir(inputs.processing_dir.as_deref(), "processing folder")?),
            false => None,
        };
        let metadata = match selection.contains(Stage::Metadata) {
            true => {
                let csv = inputs.metadata_csv.as_deref().ok_or_raise(|| ErrorKind::MissingInput("metadata CSV"))?;
                if !csv.is_file() {
                    exn::bail!(ErrorKind::NotFound(csv.to_path_buf()));
                }
                let column = inputs.id_column.as_deref().ok_or_raise(|| ErrorKind::MissingInput("ID column"))?;
                let loader = read_loader(csv)?;
                if loader.column(column).is_none() {
                    exn::bail!(ErrorKind::UnknownColumn(column.to_string()));
                }
                Some((csv, column))
            },
            false => None,
        };
        if self.config.naming.enforce
            && let Some(items_dir) = items_dir
        {
            for item in item_folders(items_dir).or_raise(|| ErrorKind::Io(items_dir.to_path_buf()))? {
                validate_item_id(&name_of(&item))?;
            }
        }
        Ok(Resolved { items_dir, processing_dir, metadata })
    }

    /// Run the selected stages in order. Inputs are validated before any
    /// stage starts; a failing stage stops the run since later stages build
    /// on its output.
    #[instrument(skip_all)]
    pub fn run(&self, selection: &Selection, inputs: &Inputs, operator: &mut dyn Operator) -> Result<PipelineReport> {
        let resolved = self.resolve(selection, inputs)?;
        let stages: Vec<Stage> = selection.stages().collect();
        let mut report = PipelineReport::default();
        for (index, stage) in stages.iter().copied().enumerate() {
            tracing::info!(%stage, "starting stage");
            let outcome = self.run_stage(stage, &resolved, inputs, operator);
            let summary = match &outcome {
                Ok(outcome) => Some(outcome.to_string()),
                Err(e) => {
                    tracing::error!(%stage, error = ?e, "stage failed, stopping");
                    None
                },
            };
            report.runs.push(StageRun { stage, outcome });
            let Some(summary) = summary else { break };
            tracing::info!(%stage, %summary, "stage finished");
            let more = index + 1 < stages.len();
            if more && self.prompt_between && !operator.confirm(&Prompt::Continue { finished: stage, summary }) {
                report.stopped_by_operator = true;
                break;
            }
        }
        Ok(report)
    }

    fn run_stage(
        &self,
        stage: Stage,
        resolved: &Resolved<'_>,
        inputs: &Inputs,
        operator: &mut dyn Operator,
    ) -> Result<StageOutcome> {
        let folders = &self.config.folders;
        let items = || resolved.items_dir.ok_or_raise(|| ErrorKind::MissingInput("items folder"));
        let processing = || resolved.processing_dir.ok_or_raise(|| ErrorKind::MissingInput("processing folder"));
        match stage {
            Stage::PreBag => prebag(items()?).map(StageOutcome::PreBag),
            Stage::Metadata => {
                let (csv, column) = resolved.metadata.ok_or_raise(|| ErrorKind::MissingInput("metadata CSV"))?;
                stamp_metadata(items()?, csv, column, operator).map(StageOutcome::Metadata)
            },
            Stage::Inventory => inventory_items(items()?, operator).map(StageOutcome::Inventory),
            Stage::Bag => bag_items(items()?, &self.config.bag, operator).map(StageOutcome::Bag),
            Stage::Tar => {
                let out_dir = processing()?.join(&folders.ready_to_transfer);
                tar_items(items()?, &out_dir, self.config.compression).map(StageOutcome::Tar)
            },
            Stage::TransferManifest => {
                let processing = processing()?;
                let source = match &inputs.transfer_source {
                    Some(source) => source.clone(),
                    None => processing.join(&folders.ready_to_transfer),
                };
                transfer_manifest(&source, &processing.join(&folders.transfer_manifests))
                    .map(StageOutcome::TransferManifest)
            },
        }
    }
}

fn existing_dir<'i>(dir: Option<&'i Path>, what: &'static str) -> Result<&'i Path> {
    let dir = dir.ok_or_raise(|| ErrorKind::MissingInput(what))?;
    if !dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(dir.to_path_buf()));
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::LOADER_HEADER;
    use crate::operator::Unattended;
    use crate::operator::tests::Scripted;
    use std::fs;

    const IDS: [&str; 2] = ["AAAA_BBB000001", "AAAA_BBB000002"];

    fn batch(root: &Path) -> Inputs {
        let items = root.join("ready_to_package");
        for id in IDS {
            fs::create_dir_all(items.join(id)).unwrap();
            fs::write(items.join(id).join(format!("{id}_0001a.tif")), id.as_bytes()).unwrap();
        }
        let csv = root.join("loader.csv");
        let mut text = LOADER_HEADER.join(",") + "\n";
        for id in IDS {
            text.push_str(&format!(",{id},UAB,Coll,Image,me\n"));
        }
        fs::write(&csv, text).unwrap();
        Inputs {
            items_dir: Some(items),
            processing_dir: Some(root.to_path_buf()),
            metadata_csv: Some(csv),
            id_column: Some("Local ID".into()),
            transfer_source: None,
        }
    }

    #[test]
    fn full_run_produces_transfer_ready_archives() {
        let tmp = tempfile::tempdir().unwrap();
        let inputs = batch(tmp.path());
        let config = Config::default();
        let report = Pipeline::new(&config).run(&Selection::all(), &inputs, &mut Unattended).unwrap();

        assert!(report.failure().is_none());
        assert!(!report.stopped_by_operator);
        let stages: Vec<Stage> = report.runs.iter().map(|r| r.stage).collect();
        assert_eq!(stages, Stage::ALL);

        let item = tmp.path().join("ready_to_package/AAAA_BBB000001");
        assert!(item.join("data/AAAA_BBB000001/AAAA_BBB000001_0001a.tif").is_file());
        assert!(item.join("data/metadata.csv").is_file());
        assert!(item.join("data/manifest.csv").is_file());
        assert!(tmp.path().join("ready_to_transfer/AAAA_BBB000002.tar.gz").is_file());

        let manifests: Vec<_> = fs::read_dir(tmp.path().join("transfer_manifests")).unwrap().collect();
        assert_eq!(manifests.len(), 1);
        match &report.runs[5].outcome {
            Ok(StageOutcome::TransferManifest(t)) => assert_eq!(t.archives, 2),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn stages_run_in_pipeline_order() {
        let selection: Selection = [Stage::Tar, Stage::PreBag].into_iter().collect();
        assert_eq!(selection.stages().collect::<Vec<_>>(), [Stage::PreBag, Stage::Tar]);
        assert!(selection.needs_processing_dir());
    }

    #[test]
    fn operator_can_stop_between_stages() {
        let tmp = tempfile::tempdir().unwrap();
        let inputs = batch(tmp.path());
        let config = Config::default();
        let mut operator = Scripted::answering(&[false]);
        let selection: Selection = [Stage::PreBag, Stage::Inventory].into_iter().collect();
        let report = Pipeline::new(&config).run(&selection, &inputs, &mut operator).unwrap();
        assert!(report.stopped_by_operator);
        assert_eq!(report.runs.len(), 1);
        assert!(matches!(operator.asked[0], Prompt::Continue { finished: Stage::PreBag, .. }));
        assert!(!tmp.path().join("ready_to_package/AAAA_BBB000001/manifest.csv").exists());
    }

    #[test]
    fn misnamed_item_folder_stops_before_any_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let inputs = batch(tmp.path());
        fs::create_dir(tmp.path().join("ready_to_package/not_an_id")).unwrap();
        let config = Config::default();
        let err = Pipeline::new(&config).run(&Selection::all(), &inputs, &mut Unattended).unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidName("not_an_id".into()));
        assert!(!tmp.path().join("ready_to_package/AAAA_BBB000001/AAAA_BBB000001").exists());
    }

    #[test]
    fn bad_loader_header_stops_before_any_stage() {
        let tmp = tempfile::tempdir().unwrap();
        let inputs = batch(tmp.path());
        fs::write(inputs.metadata_csv.as_ref().unwrap(), "ID,Title\nAAAA_BBB000001,x\n").unwrap();
        let config = Config::default();
        let err = Pipeline::new(&config).run(&Selection::all(), &inputs, &mut Unattended).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidHeader(_)));
        assert!(!tmp.path().join("ready_to_package/AAAA_BBB000001/AAAA_BBB000001").exists());
    }

    #[test]
    fn transfer_manifest_alone_needs_no_items_folder() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("ready_to_transfer")).unwrap();
        fs::write(tmp.path().join("ready_to_transfer/X.tar.gz"), b"x").unwrap();
        let inputs = Inputs { processing_dir: Some(tmp.path().to_path_buf()), ..Inputs::default() };
        let selection: Selection = [Stage::TransferManifest].into_iter().collect();
        let config = Config::default();
        let report = Pipeline::new(&config).run(&selection, &inputs, &mut Unattended).unwrap();
        assert!(report.failure().is_none());
    }

    #[rstest::rstest]
    #[case(Selection::default(), ErrorKind::NothingSelected)]
    #[case(Selection::all(), ErrorKind::MissingInput("items folder"))]
    fn missing_inputs(#[case] selection: Selection, #[case] expected: ErrorKind) {
        let config = Config::default();
        let err = Pipeline::new(&config).run(&selection, &Inputs::default(), &mut Unattended).unwrap_err();
        assert_eq!(*err, expected);
    }
}
