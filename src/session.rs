//! The report form: single owner of everything the teacher has entered.
//!
//! A [`Session`] holds the selected report type, the academic metadata, the
//! active input method and both row sources (the uploaded file and the
//! manual entry list). Every mutation goes through `&mut self`, so there is
//! exactly one writer and no locking. Uploads parse on a blocking worker and
//! replace the previous upload when they complete.
//!
//! Each user-visible outcome is reported to the injected
//! [`NotificationSink`](crate::notify::NotificationSink) as well as returned.

use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::export::{self, ExportOutput};
use crate::ingest::{self, IngestOutput};
use crate::model::{
    self, AcademicMetadata, EntryId, InputMethod, ManualEntry, ManualEntryList, MetadataField,
    NormalizedRow, ReportType,
};
use crate::notify::{NoopSink, Notification, SharedSink};
use crate::pipeline::assemble::{self, Readiness, ReportRequest};
use crate::pipeline::pdf::PdfEngine;
use crate::pipeline::preview::{self, Preview};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub const MSG_FILE_UPLOADED: &str = "File uploaded successfully!";
pub const MSG_ENTRY_INCOMPLETE: &str = "Please fill student name and roll number";
pub const MSG_ENTRY_ADDED: &str = "Student entry added successfully!";
pub const MSG_PDF_EXPORTED: &str = "PDF report downloaded successfully!";
pub const MSG_PDF_FAILED: &str = "Failed to generate PDF. Please try again.";

/// Builder for [`Session`].
#[derive(Default)]
pub struct SessionBuilder {
    config: Option<ReportConfig>,
    sink: Option<SharedSink>,
}

impl SessionBuilder {
    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Session {
        Session {
            config: self.config.unwrap_or_default(),
            sink: self.sink.unwrap_or_else(|| Arc::new(NoopSink)),
            report_type: None,
            metadata: AcademicMetadata::default(),
            input_method: InputMethod::default(),
            upload: None,
            manual: ManualEntryList::new(),
        }
    }
}

pub struct Session {
    config: ReportConfig,
    sink: SharedSink,
    report_type: Option<ReportType>,
    metadata: AcademicMetadata,
    input_method: InputMethod,
    upload: Option<IngestOutput>,
    manual: ManualEntryList,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("report_type", &self.report_type)
            .field("metadata", &self.metadata)
            .field("input_method", &self.input_method)
            .field("upload", &self.upload.as_ref().map(|u| &u.source_name))
            .field("manual_entries", &self.manual.len())
            .finish()
    }
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    fn notify(&self, n: Notification) {
        self.sink.notify(&n);
    }

    // ── Report type and metadata ─────────────────────────────────────────

    pub fn select_report_type(&mut self, report_type: ReportType) {
        debug!("Report type: {}", report_type);
        self.report_type = Some(report_type);
    }

    pub fn clear_report_type(&mut self) {
        self.report_type = None;
    }

    pub fn report_type(&self) -> Option<ReportType> {
        self.report_type
    }

    /// Label of the manual entry details field for the current selection.
    pub fn details_label(&self) -> &'static str {
        model::details_label(self.report_type)
    }

    pub fn set_metadata_field(&mut self, field: MetadataField, value: impl Into<String>) {
        self.metadata.set(field, value);
    }

    pub fn set_metadata(&mut self, metadata: AcademicMetadata) {
        self.metadata = metadata;
    }

    pub fn metadata(&self) -> &AcademicMetadata {
        &self.metadata
    }

    // ── Input method and row sources ─────────────────────────────────────

    /// Switch the active row source. The inactive source keeps its data.
    pub fn set_input_method(&mut self, method: InputMethod) {
        debug!("Input method: {}", method);
        self.input_method = method;
    }

    pub fn input_method(&self) -> InputMethod {
        self.input_method
    }

    /// Parse a local file and make it the uploaded file.
    ///
    /// On failure the previous upload, if any, is kept.
    pub async fn attach_file(
        &mut self,
        path: impl AsRef<Path>,
        mime: Option<&str>,
    ) -> Result<&IngestOutput, ReportError> {
        let result = ingest::ingest_file(path, mime).await;
        self.accept_upload(result)
    }

    /// Parse an in-memory upload and make it the uploaded file.
    pub async fn attach_bytes(
        &mut self,
        name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<&IngestOutput, ReportError> {
        let result = ingest::ingest_bytes(name, mime, bytes).await;
        self.accept_upload(result)
    }

    fn accept_upload(
        &mut self,
        result: Result<IngestOutput, ReportError>,
    ) -> Result<&IngestOutput, ReportError> {
        let output = match result {
            Ok(output) => output,
            Err(e) => {
                self.notify(Notification::error(e.user_message()));
                return Err(e);
            }
        };

        self.notify(Notification::success(MSG_FILE_UPLOADED));
        if output.has_warnings() {
            self.notify(Notification::warning(format!(
                "{} row(s) could not be read and were skipped",
                output.warnings.len()
            )));
        }
        if let Some(previous) = &self.upload {
            info!("Replacing upload {} with {}", previous.source_name, output.source_name);
        }
        let stored: &IngestOutput = self.upload.insert(output);
        Ok(stored)
    }

    /// Forget the uploaded file.
    pub fn detach_file(&mut self) -> Option<IngestOutput> {
        self.upload.take()
    }

    pub fn uploaded(&self) -> Option<&IngestOutput> {
        self.upload.as_ref()
    }

    /// Validate and append a manual entry.
    pub fn add_manual_entry(&mut self, entry: ManualEntry) -> Result<EntryId, ReportError> {
        match self.manual.add(entry) {
            Ok(id) => {
                self.notify(Notification::success(MSG_ENTRY_ADDED));
                Ok(id)
            }
            Err(e) => {
                self.notify(Notification::error(MSG_ENTRY_INCOMPLETE));
                Err(e)
            }
        }
    }

    pub fn remove_manual_entry(&mut self, id: EntryId) -> Option<ManualEntry> {
        self.manual.remove(id)
    }

    pub fn manual_entries(&self) -> &ManualEntryList {
        &self.manual
    }

    /// Rows of the active input method, numbered from 1.
    pub fn current_rows(&self) -> Vec<NormalizedRow> {
        match self.input_method {
            InputMethod::File => self
                .upload
                .as_ref()
                .map(|u| u.rows.clone())
                .unwrap_or_default(),
            InputMethod::Manual => ingest::ingest_manual(self.manual.entries()),
        }
    }

    // ── Readiness, preview, export ───────────────────────────────────────

    fn request<'a>(&'a self, rows: &'a [NormalizedRow]) -> ReportRequest<'a> {
        ReportRequest {
            report_type: self.report_type,
            metadata: &self.metadata,
            input_method: self.input_method,
            rows,
        }
    }

    pub fn readiness(&self) -> Readiness {
        let rows = self.current_rows();
        assemble::check_readiness(&self.request(&rows))
    }

    /// The preview pane. Fails with [`ReportError::NotReady`] unless only
    /// rows are missing, in which case the empty state is returned.
    pub fn preview(&self) -> Result<Preview, ReportError> {
        let rows = self.current_rows();
        preview::build(&self.request(&rows), &self.config.header())
    }

    /// Assemble, render and write the PDF.
    ///
    /// An unready form fails with [`ReportError::NotReady`] and the toast for
    /// the first missing requirement. Any later failure is reported as
    /// [`ReportError::ExportFailure`] with the generic retry message.
    pub fn export_pdf(&self, engine: &PdfEngine) -> Result<ExportOutput, ReportError> {
        let rows = self.current_rows();
        let request = self.request(&rows);

        if let Err(e) = assemble::check_readiness(&request).into_result() {
            self.notify(Notification::error(e.user_message()));
            return Err(e);
        }

        let result = assemble::assemble(&request, &self.config.header())
            .and_then(|doc| export::export_pdf(engine, &doc, &self.config));

        match result {
            Ok(out) => {
                self.notify(Notification::success(MSG_PDF_EXPORTED));
                Ok(out)
            }
            Err(e) => {
                self.notify(Notification::error(MSG_PDF_FAILED));
                Err(match e {
                    ReportError::ExportFailure { .. } => e,
                    other => ReportError::ExportFailure {
                        detail: other.to_string(),
                    },
                })
            }
        }
    }
}
