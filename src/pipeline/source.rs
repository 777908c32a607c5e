//! Source resolution: classify an uploaded file and load its bytes.
//!
//! The type check runs before anything is read or parsed. A declared MIME
//! type outside the CSV/Excel set is rejected with
//! [`ReportError::UnsupportedFileType`] straight away, whatever the file is
//! called, the same way the upload widget refuses it before handing it to a
//! parser. The extension only decides when no type was declared.

use crate::error::ReportError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MIME_CSV: &str = "text/csv";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_XLS: &str = "application/vnd.ms-excel";

/// The two parser families the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadsheetKind {
    Csv,
    Workbook,
}

/// A classified file held in memory, ready for parsing.
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    /// Display name (file name without directories).
    pub name: String,
    pub kind: SpreadsheetKind,
    pub bytes: Vec<u8>,
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Decide how to parse `name`, given an optional declared MIME type.
///
/// A declared type must be one of the supported ones; the extension is
/// consulted only when the type is absent or blank. Browsers on Windows
/// declare `.csv` files as `application/vnd.ms-excel`, so that MIME type
/// still parses as CSV when the extension says so.
pub fn detect_kind(name: &str, mime: Option<&str>) -> Result<SpreadsheetKind, ReportError> {
    let ext = extension_of(name);
    let mime = mime
        .map(|m| {
            m.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
        .filter(|m| !m.is_empty());

    let kind = match mime.as_deref() {
        Some(MIME_CSV) => Some(SpreadsheetKind::Csv),
        Some(MIME_XLSX) => Some(SpreadsheetKind::Workbook),
        Some(MIME_XLS) if ext.as_deref() == Some("csv") => Some(SpreadsheetKind::Csv),
        Some(MIME_XLS) => Some(SpreadsheetKind::Workbook),
        Some(other) => {
            debug!("Declared type {} of {} is not a spreadsheet", other, name);
            None
        }
        None => match ext.as_deref() {
            Some("csv") => Some(SpreadsheetKind::Csv),
            Some("xlsx") | Some("xls") => Some(SpreadsheetKind::Workbook),
            _ => None,
        },
    };

    kind.ok_or_else(|| ReportError::UnsupportedFileType {
        name: name.to_string(),
    })
}

/// Classify in-memory bytes. Nothing is parsed here.
pub fn from_bytes(
    name: &str,
    mime: Option<&str>,
    bytes: Vec<u8>,
) -> Result<ResolvedSource, ReportError> {
    let kind = detect_kind(name, mime)?;
    Ok(ResolvedSource {
        name: display_name(name),
        kind,
        bytes,
    })
}

/// Classify a local file, then read it.
///
/// The type check happens first so unsupported files are never opened.
pub fn resolve_local(path: &Path, mime: Option<&str>) -> Result<ResolvedSource, ReportError> {
    let name = display_name(&path.to_string_lossy());
    let kind = detect_kind(&name, mime)?;

    if !path.exists() {
        return Err(ReportError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let bytes = match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut buf = Vec::new();
            f.read_to_end(&mut buf)
                .map_err(|e| ReportError::CorruptSpreadsheet {
                    name: name.clone(),
                    detail: e.to_string(),
                })?;
            buf
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ReportError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ReportError::FileNotFound {
                path: PathBuf::from(path),
            });
        }
    };

    debug!("Resolved {:?} spreadsheet: {} ({} bytes)", kind, path.display(), bytes.len());
    Ok(ResolvedSource { name, kind, bytes })
}

fn display_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_by_extension() {
        assert_eq!(detect_kind("roster.csv", None).unwrap(), SpreadsheetKind::Csv);
        assert_eq!(detect_kind("ROSTER.XLSX", None).unwrap(), SpreadsheetKind::Workbook);
        assert_eq!(detect_kind("old.xls", None).unwrap(), SpreadsheetKind::Workbook);
    }

    #[test]
    fn detects_by_mime() {
        assert_eq!(
            detect_kind("upload", Some("text/csv; charset=utf-8")).unwrap(),
            SpreadsheetKind::Csv
        );
        assert_eq!(
            detect_kind("upload", Some(MIME_XLSX)).unwrap(),
            SpreadsheetKind::Workbook
        );
    }

    #[test]
    fn ms_excel_mime_with_csv_extension_is_csv() {
        assert_eq!(
            detect_kind("marks.csv", Some(MIME_XLS)).unwrap(),
            SpreadsheetKind::Csv
        );
    }

    #[test]
    fn rejects_other_types() {
        for (name, mime) in [
            ("notes.docx", None),
            ("photo.png", Some("image/png")),
            ("noext", None),
            ("report.pdf", Some("application/pdf")),
            ("photo.csv", Some("image/png")),
            ("marks.xlsx", Some("text/plain")),
        ] {
            let err = detect_kind(name, mime).unwrap_err();
            assert!(
                matches!(err, ReportError::UnsupportedFileType { .. }),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn blank_mime_falls_back_to_extension() {
        assert_eq!(detect_kind("roster.csv", Some("")).unwrap(), SpreadsheetKind::Csv);
        assert_eq!(
            detect_kind("roster.xlsx", Some("  ")).unwrap(),
            SpreadsheetKind::Workbook
        );
    }

    #[test]
    fn declared_type_is_checked_before_opening() {
        let err = resolve_local(Path::new("/definitely/missing/roster.csv"), Some("image/png"))
            .unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedFileType { .. }));
    }

    #[test]
    fn unsupported_file_is_rejected_before_opening() {
        // The path does not exist; the type check must fire first.
        let err = resolve_local(Path::new("/definitely/missing/notes.txt"), None).unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedFileType { .. }));
    }

    #[test]
    fn missing_supported_file_is_not_found() {
        let err = resolve_local(Path::new("/definitely/missing/roster.csv"), None).unwrap_err();
        assert!(matches!(err, ReportError::FileNotFound { .. }));
    }

    #[test]
    fn from_bytes_strips_directories() {
        let src = from_bytes("uploads/2024/roster.csv", None, b"a,b\n".to_vec()).unwrap();
        assert_eq!(src.name, "roster.csv");
        assert_eq!(src.kind, SpreadsheetKind::Csv);
    }
}
