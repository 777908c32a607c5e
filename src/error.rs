//! Error types for the mentoring-report library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ReportError`] is **fatal**: the operation cannot proceed at all
//!   (unsupported file, empty workbook, form not ready, PDF export failed).
//!   Returned as `Err(ReportError)` from ingestion, assembly and export.
//!
//! * [`RowParseError`] is **non-fatal**: a single spreadsheet row could not be
//!   parsed but every other row is fine. Stored inside
//!   [`crate::ingest::IngestOutput::warnings`] so callers can surface a
//!   warning while the valid rows still reach the report.

use crate::model::{InputMethod, MetadataField};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the mentoring-report library.
#[derive(Debug, Error)]
pub enum ReportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// File type is neither CSV nor an Excel workbook.
    #[error("Unsupported file type '{name}': please upload only CSV or Excel files (.csv, .xlsx, .xls)")]
    UnsupportedFileType { name: String },

    /// Input file was not found at the given path.
    #[error("Spreadsheet not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The workbook's first sheet has a header row but no data rows.
    #[error("Empty file: '{name}' has no data rows below the header")]
    EmptyWorkbook { name: String },

    /// The file claims a supported type but could not be opened as one.
    #[error("Could not read '{name}': {detail}")]
    CorruptSpreadsheet { name: String, detail: String },

    // ── Form errors ───────────────────────────────────────────────────────
    /// A required field of a manual entry or of the metadata form is blank.
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    /// The readiness gate refused to assemble a document.
    #[error("Report is not ready: {missing}")]
    NotReady { missing: MissingRequirements },

    /// A value does not name one of the fixed report types.
    #[error("Unknown report type '{0}'")]
    UnknownReportType(String),

    /// A name does not match any academic metadata field.
    #[error("Unknown metadata field '{0}'")]
    UnknownMetadataField(String),

    // ── Export errors ─────────────────────────────────────────────────────
    /// PDF serialisation or the surrounding assemble-and-write step failed.
    #[error("Failed to generate PDF: {detail}")]
    ExportFailure { detail: String },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/dir/containing/libpdfium, or install pdfium\n\
into a directory on the system library search path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Config / profile errors ───────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The local profile file could not be read or written.
    #[error("Profile store error at '{path}': {detail}")]
    ProfileStore { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReportError {
    /// Short, user-actionable wording for a notification body.
    ///
    /// Export failures whose cause was never classified collapse into the
    /// generic retry message the dashboard has always shown.
    pub fn user_message(&self) -> String {
        match self {
            ReportError::UnsupportedFileType { .. } => {
                "Please upload only CSV or Excel files".to_string()
            }
            ReportError::EmptyWorkbook { .. } => {
                "The uploaded file has no data rows".to_string()
            }
            ReportError::ExportFailure { .. } | ReportError::Internal(_) => {
                "Failed to generate PDF. Please try again.".to_string()
            }
            ReportError::NotReady { missing } => missing.user_message(),
            other => other.to_string(),
        }
    }
}

/// A non-fatal error for a single spreadsheet row.
///
/// The row is skipped; ingestion of every other row continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("Row {line}: {detail}")]
pub struct RowParseError {
    /// 1-indexed line in the source file (the header is line 1).
    pub line: u64,
    pub detail: String,
}

/// One unmet precondition of the readiness gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// No report type selected.
    ReportType,
    /// These metadata fields are empty.
    Metadata(Vec<MetadataField>),
    /// The active input method has produced no rows.
    Rows(InputMethod),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::ReportType => write!(f, "report type not selected"),
            Requirement::Metadata(fields) => {
                let names: Vec<&str> = fields.iter().map(|m| m.label()).collect();
                write!(f, "academic metadata missing ({})", names.join(", "))
            }
            Requirement::Rows(InputMethod::File) => write!(f, "no rows from uploaded file"),
            Requirement::Rows(InputMethod::Manual) => write!(f, "no manual student entries"),
        }
    }
}

/// Every unmet precondition, in the order the form presents them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissingRequirements(pub Vec<Requirement>);

impl MissingRequirements {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.0.iter()
    }

    /// The first unmet requirement phrased the way the form's toast does.
    pub fn user_message(&self) -> String {
        match self.0.first() {
            None => String::new(),
            Some(Requirement::ReportType) => "Please select a report type".to_string(),
            Some(Requirement::Metadata(_)) => {
                "Please fill all academic metadata fields".to_string()
            }
            Some(Requirement::Rows(InputMethod::File)) => "Please upload a file".to_string(),
            Some(Requirement::Rows(InputMethod::Manual)) => {
                "Please add at least one student entry".to_string()
            }
        }
    }
}

impl fmt::Display for MissingRequirements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_type_display_names_file() {
        let e = ReportError::UnsupportedFileType {
            name: "notes.docx".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("notes.docx"), "got: {msg}");
        assert_eq!(e.user_message(), "Please upload only CSV or Excel files");
    }

    #[test]
    fn empty_workbook_is_distinct_from_unsupported() {
        let e = ReportError::EmptyWorkbook {
            name: "roster.xlsx".into(),
        };
        assert!(e.to_string().starts_with("Empty file"));
        assert_ne!(
            e.user_message(),
            ReportError::UnsupportedFileType { name: "x".into() }.user_message()
        );
    }

    #[test]
    fn export_failure_reports_generically() {
        let e = ReportError::ExportFailure {
            detail: "FPDF_SaveAsCopy returned false".into(),
        };
        assert_eq!(e.user_message(), "Failed to generate PDF. Please try again.");
        assert!(e.to_string().contains("FPDF_SaveAsCopy"));
    }

    #[test]
    fn missing_requirements_enumerate_categories() {
        let missing = MissingRequirements(vec![
            Requirement::ReportType,
            Requirement::Metadata(vec![MetadataField::Semester]),
        ]);
        let msg = missing.to_string();
        assert!(msg.contains("report type"), "got: {msg}");
        assert!(msg.contains("Semester"), "got: {msg}");
        assert_eq!(missing.user_message(), "Please select a report type");
    }

    #[test]
    fn row_parse_error_display() {
        let e = RowParseError {
            line: 4,
            detail: "found 2 fields, expected 3".into(),
        };
        assert_eq!(e.to_string(), "Row 4: found 2 fields, expected 3");
    }
}
