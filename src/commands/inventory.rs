use crate::cli::{FormatArg, InventoryArgs};
use crate::error::{ErrorKind, Result};
use crate::prompt::Asker;
use exn::ResultExt;
use sipkit_library::disc::{DiscLabel, Format, inventory_disc};
use tracing::info;

pub fn run(args: InventoryArgs, asker: &Asker) -> Result<()> {
    let input = asker.dir(args.input, "disc contents folder")?;
    let output = asker.dir(args.output, "inventory output folder")?;
    let label = DiscLabel {
        label: asker.text(args.label, "Disc label", "")?,
        archive: asker.text(args.archive, "Archives name", "")?,
        number: asker.text(args.number, "Disc number", "")?,
        operator: asker.text(args.operator, "Operator", "")?,
    };
    let format = match args.format {
        FormatArg::Csv => Format::Csv,
        FormatArg::Xlsx => Format::Xlsx,
    };
    let report = inventory_disc(&input, &output, &label, format, args.copy_to.as_deref())
        .or_raise(|| ErrorKind::Command("inventory"))?;
    info!(
        path = %report.path.display(),
        rows = report.rows,
        ds_store = report.ds_store,
        hidden = report.hidden,
        unreadable = report.unreadable,
        "inventory written"
    );
    if let Some((destination, files)) = &report.copied {
        info!(destination = %destination.display(), files, "disc contents copied");
    }
    Ok(())
}
