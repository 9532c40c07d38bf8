use crate::consts::ETD_COLUMNS;
use crate::error::{ErrorKind, Result};
use crate::extract_file;
use exn::ResultExt;
use rust_xlsxwriter::{Format, Workbook};
use sipkit_inventory::{csv_writer, stamp};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderReport {
    pub path: PathBuf,
    /// XML files found one level below the unzipped folder.
    pub found: usize,
    pub rows: usize,
    /// Files that were not UTF-8 or not a ProQuest submission.
    pub bad_files: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogReport {
    pub path: PathBuf,
    pub folders: usize,
    pub pdfs: usize,
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>> {
    let fail = || ErrorKind::Read(dir.to_path_buf());
    let mut entries = fs::read_dir(dir)
        .or_raise(fail)?
        .map(|e| e.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .or_raise(fail)?;
    entries.sort();
    Ok(entries)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Metadata files of every unzipped submission: `*.xml` one level deep.
pub fn find_xml(unzipped_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for folder in sorted_children(unzipped_dir)? {
        if !folder.is_dir() {
            continue;
        }
        found.extend(sorted_children(&folder)?.into_iter().filter(|p| p.is_file() && has_extension(p, "xml")));
    }
    Ok(found)
}

/// Write `out_dir/ETD_loader<timestamp>.xlsx` with one row per submission.
/// Unreadable metadata files are skipped and reported, never fatal.
#[instrument(fields(unzipped_dir = %unzipped_dir.display(), out_dir = %out_dir.display()))]
pub fn build_loader(unzipped_dir: &Path, out_dir: &Path) -> Result<LoaderReport> {
    if !unzipped_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(unzipped_dir.to_path_buf()));
    }
    let xml_files = find_xml(unzipped_dir)?;
    let mut rows = Vec::with_capacity(xml_files.len());
    let mut bad_files = Vec::new();
    for xml in &xml_files {
        match extract_file(xml) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(file = %xml.display(), error = ?e, "skipping metadata file");
                bad_files.push(xml.clone());
            },
        }
    }

    fs::create_dir_all(out_dir).or_raise(|| ErrorKind::Write(out_dir.to_path_buf()))?;
    let path = out_dir.join(format!("ETD_loader{}.xlsx", stamp::file_stamp(stamp::now())));
    let fail = || ErrorKind::Write(path.clone());
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1").or_raise(fail)?;
    for (col, title) in ETD_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold).or_raise(fail)?;
    }
    for (index, row) in rows.iter().enumerate() {
        for (col, value) in row.record().into_iter().enumerate() {
            sheet.write_string(index as u32 + 1, col as u16, value).or_raise(fail)?;
        }
    }
    workbook.save(&path).or_raise(fail)?;
    tracing::info!(path = %path.display(), found = xml_files.len(), rows = rows.len(), "ETD loader written");
    Ok(LoaderReport { path, found: xml_files.len(), rows: rows.len(), bad_files })
}

/// Write `unzipped_dir/etds_log<timestamp>.csv`: each submission folder with
/// its PDF name, or `unknown` when it has none.
#[instrument(fields(unzipped_dir = %unzipped_dir.display()))]
pub fn write_log(unzipped_dir: &Path) -> Result<LogReport> {
    if !unzipped_dir.is_dir() {
        exn::bail!(ErrorKind::NotADirectory(unzipped_dir.to_path_buf()));
    }
    let path = unzipped_dir.join(format!("etds_log{}.csv", stamp::file_stamp(stamp::now())));
    let fail = || ErrorKind::Write(path.clone());
    let mut writer = csv_writer(&path).or_raise(fail)?;
    let mut report = LogReport { path: path.clone(), folders: 0, pdfs: 0 };
    for folder in sorted_children(unzipped_dir)? {
        if !folder.is_dir() {
            continue;
        }
        let pdf = sorted_children(&folder)?.into_iter().find(|p| p.is_file() && has_extension(p, "pdf"));
        let pdf_name = match &pdf {
            Some(pdf) => pdf.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            None => "unknown".to_string(),
        };
        let folder_name = folder.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        writer.write_record([folder_name, pdf_name]).or_raise(fail)?;
        report.folders += 1;
        report.pdfs += usize::from(pdf.is_some());
    }
    writer.flush().or_raise(fail)?;
    tracing::info!(folders = report.folders, pdfs = report.pdfs, "ETD log written");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::SUBMISSION;

    fn unzipped(root: &Path) -> PathBuf {
        let dir = root.join("ETDs_unzipped");
        fs::create_dir_all(dir.join("etdadmin_upload_1")).unwrap();
        fs::create_dir_all(dir.join("etdadmin_upload_2")).unwrap();
        fs::create_dir_all(dir.join("etdadmin_upload_3")).unwrap();
        fs::write(dir.join("etdadmin_upload_1/Doe_DATA.xml"), SUBMISSION).unwrap();
        fs::write(dir.join("etdadmin_upload_1/Doe.pdf"), b"%PDF").unwrap();
        fs::write(dir.join("etdadmin_upload_2/Roe_DATA.XML"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(dir.join("etdadmin_upload_3/notes.txt"), b"").unwrap();
        fs::write(dir.join("stray.xml"), SUBMISSION).unwrap();
        dir
    }

    #[test]
    fn loader_skips_bad_files_without_failing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = unzipped(tmp.path());
        let report = build_loader(&dir, &tmp.path().join("excel")).unwrap();
        assert_eq!(report.found, 2);
        assert_eq!(report.rows, 1);
        assert_eq!(report.bad_files, vec![dir.join("etdadmin_upload_2/Roe_DATA.XML")]);
        let name = report.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("ETD_loader") && name.ends_with(".xlsx"));
        assert!(report.path.is_file());
    }

    #[test]
    fn log_lists_every_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = unzipped(tmp.path());
        let report = write_log(&dir).unwrap();
        assert_eq!((report.folders, report.pdfs), (3, 1));
        let text = fs::read_to_string(&report.path).unwrap();
        assert_eq!(text, "etdadmin_upload_1,Doe.pdf\netdadmin_upload_2,unknown\netdadmin_upload_3,unknown\n");
    }
}
