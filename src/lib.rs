//! # mentoring-report
//!
//! Turn a class spreadsheet, or students typed in by hand, into a mentoring
//! report: an on-screen preview and an A4 PDF with the department header,
//! the academic metadata block and a striped student table.
//!
//! ## Pipeline Overview
//!
//! ```text
//! CSV / XLSX / XLS ─┐
//!                   ├─ 1. Source     classify by MIME type and extension
//!                   ├─ 2. Parse      csv / calamine into raw records
//!                   ├─ 3. Normalize  positional columns → name, roll, details
//! manual entries ───┘
//!                     4. Assemble   readiness gate → ReportDocument
//!                     5. Output     HTML / text preview, or PDF via pdfium
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mentoring_report::{
//!     InputMethod, ManualEntry, MetadataField, PdfEngine, ReportType, Session,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::builder().build();
//!     session.select_report_type(ReportType::SubjectAttendance);
//!     for (field, value) in [
//!         (MetadataField::Program, "be-cse-ai"),
//!         (MetadataField::Batch, "2023"),
//!         (MetadataField::AcademicYear, "2023-2024"),
//!         (MetadataField::Group, "4A"),
//!         (MetadataField::Session, "jan-june-2024"),
//!         (MetadataField::Semester, "3"),
//!     ] {
//!         session.set_metadata_field(field, value);
//!     }
//!     session.set_input_method(InputMethod::Manual);
//!     session.add_manual_entry(ManualEntry::new("Alice", "101").details("92%"))?;
//!
//!     let engine = PdfEngine::bind()?;
//!     let out = session.export_pdf(&engine)?;
//!     println!("wrote {}", out.path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `mentor-report` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! mentoring-report = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod profile;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PdfLayout, ReportConfig, ReportConfigBuilder};
pub use error::{MissingRequirements, ReportError, Requirement, RowParseError};
pub use export::{export_file_name, export_pdf, ExportOutput};
pub use ingest::{ingest_bytes, ingest_file, ingest_manual, ingest_sync, IngestOutput, IngestStats};
pub use model::{
    AcademicMetadata, EntryId, InputMethod, InstitutionHeader, ManualEntry, ManualEntryList,
    MetadataField, NormalizedRow, ReportDocument, ReportType, TABLE_COLUMNS,
};
pub use notify::{NoopSink, Notification, NotificationSink, Severity, SharedSink, TracingSink};
pub use pipeline::assemble::{assemble, check_readiness, Readiness, ReportRequest};
pub use pipeline::pdf::{PdfEngine, TextRun};
pub use pipeline::preview::{render_html, render_text, Preview};
pub use profile::{Profile, ProfileStore};
pub use session::{Session, SessionBuilder};
