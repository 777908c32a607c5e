//! Configuration types for report assembly and export.
//!
//! All rendering and export behaviour is controlled through [`ReportConfig`],
//! built via its [`ReportConfigBuilder`]. One struct holds every knob so the
//! CLI, the session and the tests all render with the same settings.

use crate::error::ReportError;
use crate::model::{InstitutionHeader, DEPARTMENT, INSTITUTION};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for assembling and exporting a report.
///
/// Built via [`ReportConfig::builder()`] or using [`ReportConfig::default()`].
///
/// # Example
/// ```rust
/// use mentoring_report::ReportConfig;
///
/// let config = ReportConfig::builder()
///     .body_font_size(9.0)
///     .output_dir("reports")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Department line printed at the top of every report.
    pub department: String,

    /// Institution line printed under the department.
    pub institution: String,

    /// PDF page geometry and table styling.
    pub pdf: PdfLayout,

    /// Directory the exported PDF is written to. Default: current directory.
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            department: DEPARTMENT.to_string(),
            institution: INSTITUTION.to_string(),
            pdf: PdfLayout::default(),
            output_dir: PathBuf::from("."),
        }
    }
}

impl ReportConfig {
    /// Create a new builder for `ReportConfig`.
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            config: Self::default(),
        }
    }

    pub fn header(&self) -> InstitutionHeader {
        InstitutionHeader {
            department: self.department.clone(),
            institution: self.institution.clone(),
        }
    }

    /// Load a config from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReportError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ReportConfig = serde_json::from_str(&text).map_err(|e| {
            ReportError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the header text and PDF geometry.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.department.trim().is_empty() || self.institution.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "department and institution must not be empty".into(),
            ));
        }
        let pdf = &self.pdf;
        if !(6.0..=16.0).contains(&pdf.body_font_size) {
            return Err(ReportError::InvalidConfig(format!(
                "body font size must be 6–16 pt, got {}",
                pdf.body_font_size
            )));
        }
        if pdf.margin_mm * 2.0 >= PdfLayout::PAGE_WIDTH_MM {
            return Err(ReportError::InvalidConfig(format!(
                "margin {} mm leaves no room for the table",
                pdf.margin_mm
            )));
        }
        Ok(())
    }
}

/// Builder for [`ReportConfig`].
#[derive(Debug)]
pub struct ReportConfigBuilder {
    config: ReportConfig,
}

impl ReportConfigBuilder {
    pub fn department(mut self, text: impl Into<String>) -> Self {
        self.config.department = text.into();
        self
    }

    pub fn institution(mut self, text: impl Into<String>) -> Self {
        self.config.institution = text.into();
        self
    }

    pub fn header_fill(mut self, rgb: [u8; 3]) -> Self {
        self.config.pdf.header_fill = rgb;
        self
    }

    pub fn stripe_fill(mut self, rgb: [u8; 3]) -> Self {
        self.config.pdf.stripe_fill = rgb;
        self
    }

    pub fn body_font_size(mut self, pt: f32) -> Self {
        self.config.pdf.body_font_size = pt.clamp(6.0, 16.0);
        self
    }

    pub fn cell_padding_mm(mut self, mm: f32) -> Self {
        self.config.pdf.cell_padding_mm = mm.max(0.0);
        self
    }

    pub fn margin_mm(mut self, mm: f32) -> Self {
        self.config.pdf.margin_mm = mm.max(0.0);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReportConfig, ReportError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

// ── PDF layout ───────────────────────────────────────────────────────────

/// Page geometry and table styling for the exported PDF.
///
/// Coordinates are millimetres from the top-left corner of an A4 page; the
/// renderer converts them to PDF points (origin bottom-left).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfLayout {
    /// Department line size. Default: 16 pt.
    pub title_font_size: f32,
    /// Institution line size. Default: 14 pt.
    pub subtitle_font_size: f32,
    /// Metadata block size. Default: 12 pt.
    pub metadata_font_size: f32,
    /// Table body size. Default: 10 pt.
    pub body_font_size: f32,
    /// Table header fill. Default: RGB(41, 128, 185).
    pub header_fill: [u8; 3],
    /// Header text colour. Default: white.
    pub header_text: [u8; 3],
    /// Fill of every other body row. Default: RGB(245, 245, 245).
    pub stripe_fill: [u8; 3],
    /// Left/right/bottom page margin for the table. Default: 14 mm.
    pub margin_mm: f32,
    /// Top margin of continuation pages. Default: 15 mm.
    pub continuation_top_mm: f32,
    /// Inner cell padding. Default: 1.76 mm.
    pub cell_padding_mm: f32,
    /// First table row's top edge on page one. Default: 100 mm.
    pub table_start_mm: f32,
}

impl PdfLayout {
    pub const PAGE_WIDTH_MM: f32 = 210.0;
    pub const PAGE_HEIGHT_MM: f32 = 297.0;
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self {
            title_font_size: 16.0,
            subtitle_font_size: 14.0,
            metadata_font_size: 12.0,
            body_font_size: 10.0,
            header_fill: [41, 128, 185],
            header_text: [255, 255, 255],
            stripe_fill: [245, 245, 245],
            margin_mm: 14.0,
            continuation_top_mm: 15.0,
            cell_padding_mm: 1.76,
            table_start_mm: 100.0,
        }
    }
}
