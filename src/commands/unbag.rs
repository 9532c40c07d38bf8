use crate::cli::{FlavorArg, UnbagArgs, UntarArgs};
use crate::error::{ErrorKind, Result};
use crate::prompt::Asker;
use exn::ResultExt;
use sipkit_bag::{Flavor, unbag_all};
use sipkit_library::legacy::untar_all;
use std::path::Path;
use tracing::{info, warn};

/// DnD is the usual layout, so it is the default answer.
fn flavor(asker: &Asker, given: Option<FlavorArg>) -> Flavor {
    match given {
        Some(FlavorArg::Standard) => Flavor::Standard,
        Some(FlavorArg::Dnd) => Flavor::Dnd,
        None => match asker.confirm("Are these bags in the DnD format?", true) {
            true => Flavor::Dnd,
            false => Flavor::Standard,
        },
    }
}

pub fn unbag(args: UnbagArgs, asker: &Asker) -> Result<()> {
    let dir = asker.dir(args.dir, "folder of bags")?;
    let flavor = flavor(asker, args.flavor);
    run_unbag(&dir, flavor)
}

pub fn untar(args: UntarArgs, asker: &Asker) -> Result<()> {
    let dir = asker.dir(args.dir, "folder of tarballs")?;
    let flavor = (!args.no_unbag).then(|| flavor(asker, args.flavor));
    let report = untar_all(&dir).or_raise(|| ErrorKind::Command("untar"))?;
    info!(archives = report.archives, extracted = report.extracted, errors = report.errors, "extraction finished");
    if !report.ok() {
        warn!("extraction had errors, not un-bagging");
        return Ok(());
    }
    match flavor {
        Some(flavor) => run_unbag(&dir, flavor),
        None => Ok(()),
    }
}

fn run_unbag(dir: &Path, flavor: Flavor) -> Result<()> {
    let report = unbag_all(dir, flavor).or_raise(|| ErrorKind::Command("unbag"))?;
    info!(folders = report.folders, bags = report.bags, failed = report.failed, "un-bagging finished");
    Ok(())
}
