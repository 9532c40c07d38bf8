use crate::cli::SipArgs;
use crate::error::{ErrorKind, Result};
use crate::prompt::Asker;
use exn::ResultExt;
use sipkit_config::Config;
use sipkit_library::sip::{Inputs, Pipeline, Selection, Stage};
use tracing::{error, info, warn};

pub fn run(args: SipArgs, config: &Config, asker: &Asker) -> Result<()> {
    let selection = match args.stages.is_empty() {
        true => Selection::all(),
        false => args.stages.iter().copied().map(Stage::from).collect(),
    };
    let mut config = config.clone();
    if let Some(compression) = args.compression {
        config.compression = compression.into();
    }

    let items_dir = match selection.needs_items_dir() {
        true => Some(asker.dir(args.items, "items folder")?),
        false => None,
    };
    let processing_dir = match selection.needs_processing_dir() {
        true => Some(asker.dir(args.processing, "processing folder")?),
        false => None,
    };
    let metadata_csv = match selection.contains(Stage::Metadata) {
        true => Some(asker.file(args.metadata_csv, "metadata CSV")?),
        false => None,
    };
    let inputs = Inputs {
        items_dir,
        processing_dir,
        metadata_csv,
        id_column: Some(args.id_column),
        transfer_source: args.transfer_source,
    };

    let mut operator = asker.operator();
    let pipeline = Pipeline::new(&config).prompt_between(!args.no_pause && !asker.unattended());
    let report = pipeline.run(&selection, &inputs, operator.as_mut()).or_raise(|| ErrorKind::Command("sip"))?;

    let stopped = report.stopped_by_operator;
    let mut failure = None;
    for run in report.runs {
        match run.outcome {
            Ok(outcome) => info!(stage = %run.stage, %outcome, "stage complete"),
            Err(e) => {
                error!(stage = %run.stage, "stage failed");
                failure = Some(e);
            },
        }
    }
    if let Some(e) = failure {
        return Err(e).or_raise(|| ErrorKind::Command("sip"));
    }
    if stopped {
        warn!("stopped by the operator before the remaining stages");
    }
    Ok(())
}
