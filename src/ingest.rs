//! Ingestion entry points: a spreadsheet (or typed entries) in, normalized
//! rows out.
//!
//! Parsing is CPU-bound, so the async entry points hand the work to
//! `spawn_blocking` and await it. [`ingest_sync`] is for callers without a
//! runtime.

use crate::error::{ReportError, RowParseError};
use crate::model::{ManualEntry, NormalizedRow};
use crate::pipeline::parse::{self, RawRecord};
use crate::pipeline::source::{self, ResolvedSource, SpreadsheetKind};
use crate::pipeline::normalize;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters for one ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Data records seen below the header, including skipped ones.
    pub records_seen: usize,
    pub rows_produced: usize,
    pub rows_skipped: usize,
    pub duration_ms: u64,
}

/// Result of ingesting one file.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutput {
    /// Display name of the file the rows came from.
    pub source_name: String,
    pub kind: SpreadsheetKind,
    pub rows: Vec<NormalizedRow>,
    /// Rows that were skipped, with the reason. Never fatal.
    pub warnings: Vec<RowParseError>,
    pub stats: IngestStats,
}

impl IngestOutput {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Ingest a file on disk.
///
/// `mime` is the declared type when one is known (an upload's content type);
/// otherwise the extension decides.
pub async fn ingest_file(
    path: impl AsRef<Path>,
    mime: Option<&str>,
) -> Result<IngestOutput, ReportError> {
    let path = path.as_ref().to_path_buf();
    let mime = mime.map(str::to_string);
    info!("Ingesting {}", path.display());
    tokio::task::spawn_blocking(move || {
        let resolved = source::resolve_local(&path, mime.as_deref())?;
        ingest_resolved(resolved)
    })
    .await
    .map_err(|e| ReportError::Internal(format!("ingest task panicked: {e}")))?
}

/// Ingest an in-memory upload.
pub async fn ingest_bytes(
    name: impl Into<String>,
    mime: Option<&str>,
    bytes: Vec<u8>,
) -> Result<IngestOutput, ReportError> {
    let name = name.into();
    let resolved = source::from_bytes(&name, mime, bytes)?;
    tokio::task::spawn_blocking(move || ingest_resolved(resolved))
        .await
        .map_err(|e| ReportError::Internal(format!("ingest task panicked: {e}")))?
}

/// Blocking variant of [`ingest_file`].
pub fn ingest_sync(path: impl AsRef<Path>, mime: Option<&str>) -> Result<IngestOutput, ReportError> {
    let resolved = source::resolve_local(path.as_ref(), mime)?;
    ingest_resolved(resolved)
}

/// Normalize typed entries. Entries are validated when they are added, so
/// this cannot fail.
pub fn ingest_manual<'a>(entries: impl IntoIterator<Item = &'a ManualEntry>) -> Vec<NormalizedRow> {
    normalize::from_manual(entries)
}

/// Parse and normalize a classified source.
pub fn ingest_resolved(resolved: ResolvedSource) -> Result<IngestOutput, ReportError> {
    let start = Instant::now();
    let ResolvedSource { name, kind, bytes } = resolved;

    let (records, warnings): (Vec<RawRecord>, Vec<RowParseError>) = match kind {
        SpreadsheetKind::Csv => parse::parse_csv(&name, &bytes)?,
        SpreadsheetKind::Workbook => (parse::parse_workbook(&name, &bytes)?, Vec::new()),
    };

    let rows = normalize::from_records(&records);
    let stats = IngestStats {
        records_seen: records.len() + warnings.len(),
        rows_produced: rows.len(),
        rows_skipped: warnings.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    if rows.is_empty() {
        warn!("{} produced no rows", name);
    }
    if !warnings.is_empty() {
        debug!("{} row(s) of {} skipped", warnings.len(), name);
    }
    info!(
        "Ingested {}: {} rows in {}ms",
        name, stats.rows_produced, stats.duration_ms
    );

    Ok(IngestOutput {
        source_name: name,
        kind,
        rows,
        warnings,
        stats,
    })
}
