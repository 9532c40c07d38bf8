use crate::cli::{CollateArgs, LoaderArgs};
use crate::error::{ErrorKind, Result};
use crate::prompt::Asker;
use exn::ResultExt;
use sipkit_config::Config;
use sipkit_library::collate::collate;
use sipkit_library::loader::write_loader;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: CollateArgs, config: &Config, asker: &Asker) -> Result<()> {
    let input = asker.dir(args.input, "scanner output folder")?;
    let processing = asker.dir(args.processing, "processing folder")?;
    let mut operator = asker.operator();
    let report = collate(&input, &processing, config, operator.as_mut()).or_raise(|| ErrorKind::Command("collate"))?;
    info!(
        items = report.items,
        copied = report.copied,
        skipped_items = report.skipped_items,
        failed = report.failed,
        ignored = report.ignored,
        "collation finished"
    );
    if report.quit {
        warn!("collation stopped by the operator, no CSV loader written");
        return Ok(());
    }
    if !args.no_loader {
        write(&processing, config)?;
    }
    Ok(())
}

pub fn loader(args: LoaderArgs, config: &Config, asker: &Asker) -> Result<()> {
    let processing = asker.dir(args.processing, "processing folder")?;
    write(&processing, config)
}

fn write(processing: &Path, config: &Config) -> Result<()> {
    let report =
        write_loader(processing, &config.folders, &config.loader).or_raise(|| ErrorKind::Command("loader"))?;
    info!(path = %report.path.display(), rows = report.rows, "CSV loader written");
    Ok(())
}
