//! Conversion of one file on disk.
//!
//! The rewritten package is built in a temporary file next to the original,
//! flushed and synced, then renamed over the original. Until that rename
//! the original file is never opened for writing.

use crate::container::open_archive;
use crate::context::ConversionContext;
use crate::error::{Error, Result};
use crate::xlsx::{transcode, TranscodeReport};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

/// Outcome of converting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionReport {
    /// The converted file
    pub path: PathBuf,
    /// Whether the rewritten package replaced the original
    pub committed: bool,
    /// What was changed
    #[serde(flatten)]
    pub summary: TranscodeReport,
}

/// Convert a spreadsheet in place.
///
/// On any error the original file is left untouched and no temporary file
/// remains. Errors carry the file path.
///
/// # Example
///
/// ```no_run
/// use refont::{process_file, ConversionContext};
///
/// let ctx = ConversionContext::new().with_unprotect(true);
/// let report = process_file("budget.xlsx", &ctx)?;
/// println!("{} font(s) replaced", report.summary.fonts_replaced);
/// # Ok::<(), refont::Error>(())
/// ```
pub fn process_file(path: impl AsRef<Path>, ctx: &ConversionContext) -> Result<ConversionReport> {
    let path = path.as_ref();
    convert_in_place(path, ctx).map_err(|e| e.in_file(path))
}

/// Report what [`process_file`] would change without writing anything.
pub fn preview_file(path: impl AsRef<Path>, ctx: &ConversionContext) -> Result<ConversionReport> {
    let path = path.as_ref();
    convert_in_memory(path, ctx).map_err(|e| e.in_file(path))
}

fn convert_in_place(path: &Path, ctx: &ConversionContext) -> Result<ConversionReport> {
    let mut archive = open_archive(path)?;

    // Same directory as the original so the final rename never crosses devices.
    let dir = parent_dir_or_dot(path);
    let mut tmp = tempfile::Builder::new()
        .prefix(".refont-")
        .suffix(".xlsx")
        .tempfile_in(dir)
        .map_err(Error::TempFile)?;
    debug!("{}: writing {}", path.display(), tmp.path().display());

    // `tmp` deletes itself if anything below fails before `persist`.
    let summary = transcode(&mut archive, tmp.as_file_mut(), ctx)?;
    drop(archive);

    tmp.as_file_mut().flush()?;
    tmp.as_file().sync_all()?;

    match fs::metadata(path) {
        Ok(meta) => {
            if let Err(e) = fs::set_permissions(tmp.path(), meta.permissions()) {
                warn!("Failed to copy permissions to '{}': {}", tmp.path().display(), e);
            }
        }
        Err(e) => warn!("Failed to read permissions of '{}': {}", path.display(), e),
    }

    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    if let Err(e) = sync_parent_dir(path) {
        debug!("{}: directory sync skipped: {}", path.display(), e);
    }

    info!(
        "{}: {} font(s) replaced, {} protection element(s) removed",
        path.display(),
        summary.fonts_replaced,
        summary.protections_removed
    );

    Ok(ConversionReport {
        path: path.to_path_buf(),
        committed: true,
        summary,
    })
}

fn convert_in_memory(path: &Path, ctx: &ConversionContext) -> Result<ConversionReport> {
    let mut archive = open_archive(path)?;
    let summary = transcode(&mut archive, Cursor::new(Vec::new()), ctx)?;

    Ok(ConversionReport {
        path: path.to_path_buf(),
        committed: false,
        summary,
    })
}

fn parent_dir_or_dot(path: &Path) -> &Path {
    // `Path::parent` returns `Some("")` for bare file names like `book.xlsx`.
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    // Opening a directory as a file is not supported everywhere.
    File::open(parent_dir_or_dot(path))?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::read_archive;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_package(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn read_entry(path: &Path, name: &str) -> String {
        let mut archive = read_archive(File::open(path).unwrap()).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut data = String::new();
        entry.read_to_string(&mut data).unwrap();
        data
    }

    fn dir_listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    const STYLES: &str = r#"<styleSheet><fonts><font><name val="Geneva"/></font></fonts></styleSheet>"#;

    #[test]
    fn test_parent_dir_or_dot() {
        assert_eq!(parent_dir_or_dot(Path::new("book.xlsx")), Path::new("."));
        assert_eq!(parent_dir_or_dot(Path::new("a/book.xlsx")), Path::new("a"));
    }

    #[test]
    fn test_process_file_commits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        write_package(&path, &[("xl/styles.xml", STYLES)]);

        let report = process_file(&path, &ConversionContext::new()).unwrap();
        assert!(report.committed);
        assert_eq!(report.summary.fonts_replaced, 1);
        assert!(read_entry(&path, "xl/styles.xml").contains(r#"<name val="Arial"/>"#));
        assert_eq!(dir_listing(dir.path()), vec!["book.xlsx"]);
    }

    #[test]
    fn test_failure_leaves_original_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        write_package(
            &path,
            &[
                ("[Content_Types].xml", "<Types/>"),
                ("xl/workbook.xml", "<workbook/>"),
                ("xl/styles.xml", "<styleSheet><fonts></styleSheet>"),
            ],
        );
        let before = fs::read(&path).unwrap();

        let err = process_file(&path, &ConversionContext::new()).unwrap_err();
        assert!(matches!(err, Error::File { .. }));
        assert!(err.to_string().contains("xl/styles.xml"));

        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(dir_listing(dir.path()), vec!["book.xlsx"]);
    }

    #[test]
    fn test_not_an_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        fs::write(&path, b"plain text").unwrap();

        let err = process_file(&path, &ConversionContext::new()).unwrap_err();
        match err {
            Error::File { path: p, source } => {
                assert_eq!(p, path);
                assert!(matches!(*source, Error::ArchiveOpen(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(fs::read(&path).unwrap(), b"plain text");
        assert_eq!(dir_listing(dir.path()), vec!["book.xlsx"]);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = process_file(dir.path().join("absent.xlsx"), &ConversionContext::new())
            .unwrap_err();
        match err {
            Error::File { source, .. } => assert!(matches!(*source, Error::Io(_))),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(dir_listing(dir.path()).is_empty());
    }

    #[test]
    fn test_preview_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        write_package(&path, &[("xl/styles.xml", STYLES)]);
        let before = fs::read(&path).unwrap();

        let report = preview_file(&path, &ConversionContext::new()).unwrap();
        assert!(!report.committed);
        assert_eq!(report.summary.fonts_replaced, 1);
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(dir_listing(dir.path()), vec!["book.xlsx"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.xlsx");
        write_package(&path, &[("xl/styles.xml", STYLES)]);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        process_file(&path, &ConversionContext::new()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_report_json() {
        let report = ConversionReport {
            path: PathBuf::from("book.xlsx"),
            committed: true,
            summary: TranscodeReport {
                entries: 4,
                parts_patched: 1,
                fonts_replaced: 2,
                protections_removed: 0,
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["path"], "book.xlsx");
        assert_eq!(json["fonts_replaced"], 2);
        assert_eq!(json["entries"], 4);
    }
}
