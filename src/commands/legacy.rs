use crate::cli::{RenameTarsArgs, SplitSidesArgs};
use crate::error::{ErrorKind, Result};
use crate::prompt::Asker;
use exn::ResultExt;
use sipkit_library::legacy::{rename_tars_nested, split_sides as split, zip_b_folders};
use tracing::info;

pub fn rename_tars(args: RenameTarsArgs, asker: &Asker) -> Result<()> {
    let dir = asker.dir(args.dir, "folder of tarballs")?;
    let report = match args.nested {
        true => rename_tars_nested(&dir),
        false => sipkit_library::legacy::rename_tars(&dir),
    }
    .or_raise(|| ErrorKind::Command("rename-tars"))?;
    info!(renamed = report.renamed, skipped = report.skipped, "tarballs renamed");
    Ok(())
}

pub fn split_sides(args: SplitSidesArgs, asker: &Asker) -> Result<()> {
    let batch = asker.dir(args.batch, "batch folder")?;
    let report = split(&batch).or_raise(|| ErrorKind::Command("split-sides"))?;
    info!(items = report.items, moved_items = report.moved_items, "sides split");
    if !args.no_zip {
        let report = zip_b_folders(&batch).or_raise(|| ErrorKind::Command("split-sides"))?;
        info!(folders = report.folders, zipped = report.zipped, "b folders zipped");
    }
    Ok(())
}
