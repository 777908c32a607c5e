//! PDF export: render an assembled document and write it to the output
//! directory under the report's file name.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::{ReportDocument, ReportType};
use crate::pipeline::pdf::PdfEngine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

static RE_WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_PATH_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[/\\]").unwrap());

/// What an export produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutput {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: usize,
    pub rows: usize,
    pub duration_ms: u64,
}

/// `{report type}_{batch}_{timestamp}.pdf` with whitespace runs collapsed to
/// `_`. Path separators in the batch become `-` so the name stays a single
/// path component.
pub fn export_file_name(report_type: ReportType, batch: &str, timestamp_ms: i64) -> String {
    let report = RE_WHITESPACE_RUN.replace_all(report_type.slug(), "_");
    let batch = RE_PATH_SEPARATOR.replace_all(batch.trim(), "-");
    let batch = RE_WHITESPACE_RUN.replace_all(&batch, "_");
    format!("{report}_{batch}_{timestamp_ms}.pdf")
}

/// Render `doc` and write it to `config.output_dir`.
///
/// Rendering failures surface as [`ReportError::ExportFailure`]; file system
/// failures as [`ReportError::OutputWriteFailed`]. Nothing is left behind in
/// the output directory when either happens.
pub fn export_pdf(
    engine: &PdfEngine,
    doc: &ReportDocument,
    config: &ReportConfig,
) -> Result<ExportOutput, ReportError> {
    let start = Instant::now();
    let bytes = engine.render(doc, &config.pdf)?;

    let file_name = export_file_name(
        doc.report_type(),
        &doc.metadata().batch,
        chrono::Utc::now().timestamp_millis(),
    );
    let path = write_atomic(&config.output_dir, &file_name, &bytes)?;

    let out = ExportOutput {
        path,
        file_name,
        bytes: bytes.len(),
        rows: doc.rows().len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Exported {} ({} rows, {} bytes) in {}ms",
        out.path.display(),
        out.rows,
        out.bytes,
        out.duration_ms
    );
    Ok(out)
}

/// Write `bytes` to `dir/file_name` via a temp file in the same directory.
///
/// The temp file is removed on drop if it was never persisted.
pub fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, ReportError> {
    let path = dir.join(file_name);
    let write_err = |source: std::io::Error| ReportError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    debug!("Writing {} bytes via {}", bytes.len(), tmp.path().display());
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;
    Ok(path)
}
