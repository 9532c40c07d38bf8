use crate::cli::EtdArgs;
use crate::error::{ErrorKind, Result};
use crate::prompt::Asker;
use exn::ResultExt;
use sipkit_extract::{build_loader, unzip_all, write_log};
use tracing::{info, warn};

pub fn run(args: EtdArgs, asker: &Asker) -> Result<()> {
    let fail = || ErrorKind::Command("etd");
    let unzipped = match args.unzipped {
        true => asker.dir(args.input, "unzipped ETD folder")?,
        false => {
            let zips = asker.dir(args.input, "folder of ETD zips")?;
            let report = unzip_all(&zips).or_raise(fail)?;
            info!(out_dir = %report.out_dir.display(), zips = report.zips, unzipped = report.unzipped, "ETDs unzipped");
            report.out_dir
        },
    };
    if !args.no_log {
        let report = write_log(&unzipped).or_raise(fail)?;
        info!(path = %report.path.display(), folders = report.folders, pdfs = report.pdfs, "ETD log written");
    }
    if !args.no_excel {
        let out = match args.out {
            Some(out) => asker.dir(Some(out), "loader output folder")?,
            None => unzipped.clone(),
        };
        let report = build_loader(&unzipped, &out).or_raise(fail)?;
        for bad in &report.bad_files {
            warn!(path = %bad.display(), "metadata file skipped");
        }
        info!(path = %report.path.display(), found = report.found, rows = report.rows, "ETD loader written");
    }
    Ok(())
}
