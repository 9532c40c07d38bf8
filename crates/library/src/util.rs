use std::fs::{self, File, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub(crate) fn name_of(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Entries of `dir`, sorted by path.
pub(crate) fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?.map(|e| e.map(|e| e.path())).collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

/// Child folders whose names contain no `.`, the shape of an item folder.
pub(crate) fn item_folders(dir: &Path) -> io::Result<Vec<PathBuf>> {
    Ok(sorted_entries(dir)?.into_iter().filter(|p| p.is_dir() && !name_of(p).contains('.')).collect())
}

/// Copy a file, keeping its permissions and access/modification times.
pub(crate) fn copy_file(from: &Path, to: &Path) -> io::Result<u64> {
    let metadata = fs::metadata(from)?;
    let mut source = File::open(from)?;
    let mut dest = File::create(to)?;
    let bytes = io::copy(&mut source, &mut dest)?;
    // Times first: the copied permissions may make the file read-only.
    dest.set_times(FileTimes::new().set_accessed(metadata.accessed()?).set_modified(metadata.modified()?))?;
    drop(dest);
    fs::set_permissions(to, metadata.permissions())?;
    Ok(bytes)
}

/// Copy a directory tree into `to` (created), returning the number of files
/// copied. Symlinks are not followed.
pub(crate) fn copy_tree(from: &Path, to: &Path) -> io::Result<usize> {
    let mut files = 0;
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            copy_file(entry.path(), &target)?;
            files += 1;
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn copy_keeps_modification_time() {
        let tmp = tempfile::tempdir().unwrap();
        let from = tmp.path().join("a.tif");
        fs::write(&from, b"scan").unwrap();
        let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000_000);
        File::options().write(true).open(&from).unwrap().set_modified(past).unwrap();

        let to = tmp.path().join("b.tif");
        assert_eq!(copy_file(&from, &to).unwrap(), 4);
        assert_eq!(fs::metadata(&to).unwrap().modified().unwrap(), past);
    }

    #[test]
    fn copies_nested_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("disc");
        fs::create_dir_all(src.join("VIDEO_TS")).unwrap();
        fs::write(src.join("VIDEO_TS/VTS_01_1.VOB"), b"video").unwrap();
        fs::write(src.join("readme.txt"), b"hi").unwrap();
        let dest = tmp.path().join("copy");
        assert_eq!(copy_tree(&src, &dest).unwrap(), 2);
        assert_eq!(fs::read(dest.join("VIDEO_TS/VTS_01_1.VOB")).unwrap(), b"video");
    }

    #[test]
    fn item_folders_skip_files_and_dotted_names() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("ITEM")).unwrap();
        fs::create_dir(tmp.path().join("ITEM.old")).unwrap();
        fs::write(tmp.path().join("FILE"), b"").unwrap();
        let found = item_folders(tmp.path()).unwrap();
        assert_eq!(found, vec![tmp.path().join("ITEM")]);
    }
}
