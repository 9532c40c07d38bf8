use crate::error::{ErrorKind, Result};
use crate::util::{item_folders, name_of};
use exn::ResultExt;
use sipkit_bag::unused_name;
use std::fs;
use std::path::Path;
use tracing::instrument;

/// Nest each item's contents one level down, in `<item>/<item>/`, so the
/// departmental folder structure survives bagging. Items already nested are
/// left alone. Returns the number of items moved.
#[instrument(fields(items_dir = %items_dir.display()))]
pub fn prebag(items_dir: &Path) -> Result<usize> {
    if !items_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(items_dir.to_path_buf()));
    }
    let mut moved = 0;
    for item in item_folders(items_dir).or_raise(|| ErrorKind::Io(items_dir.to_path_buf()))? {
        let name = name_of(&item);
        if item.join(&name).exists() {
            continue;
        }
        let temp = unused_name(items_dir, &format!(".{name}.prebag"));
        fs::create_dir(&temp).or_raise(|| ErrorKind::Io(temp.clone()))?;
        fs::rename(&item, temp.join(&name)).or_raise(|| ErrorKind::Io(item.clone()))?;
        fs::rename(&temp, &item).or_raise(|| ErrorKind::Io(temp.clone()))?;
        tracing::debug!(item = %name, "pre-bagged");
        moved += 1;
    }
    tracing::info!(moved, "pre-bag complete");
    Ok(moved)
}
