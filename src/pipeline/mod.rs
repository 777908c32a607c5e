//! Pipeline stages for turning spreadsheets or typed entries into a report.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! source ──▶ parse ──▶ normalize ──▶ assemble ──┬──▶ preview (HTML / text)
//! (classify) (csv/xlsx) (positional)  (gate)     └──▶ pdf     (pdfium)
//!                          ▲
//!            manual entries┘
//! ```
//!
//! 1. [`source`]    classify a file by MIME type and extension, load bytes
//! 2. [`parse`]     CSV via `csv`, workbooks via `calamine`, into raw records
//! 3. [`normalize`] positional mapping to four-field rows, 1-based numbering
//! 4. [`assemble`]  readiness gate and [`crate::model::ReportDocument`] build
//! 5. [`preview`]   on-screen table or the explicit empty state
//! 6. [`pdf`]       A4 layout, pagination and pdfium drawing

pub mod assemble;
pub mod normalize;
pub mod parse;
pub mod pdf;
pub mod preview;
pub mod source;
