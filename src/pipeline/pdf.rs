//! PDF rendering: lay the report out on A4 pages and draw it via pdfium.
//!
//! Rendering is split in two passes. [`layout_document`] is pure: it turns a
//! [`ReportDocument`] into per-page [`DrawOp`]s in millimetres from the
//! top-left corner, handling wrapping, striping and pagination. The pdfium
//! pass in [`PdfEngine::render`] then converts millimetres to points (origin
//! bottom-left) and emits text and rectangle objects. Layout is testable
//! without a pdfium library on the machine.
//!
//! [`table_cells`] runs the table pass backwards from text positions, so a
//! rendered PDF can be compared cell for cell with the preview.
//!
//! pdfium may only be bound once per process, so [`PdfEngine`] is created by
//! the caller and borrowed by every render and read-back.

use crate::config::PdfLayout;
use crate::error::ReportError;
use crate::model::{ReportDocument, TABLE_COLUMNS};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const MM_PER_PT: f32 = 25.4 / 72.0;
const LINE_HEIGHT_FACTOR: f32 = 1.15;

/// Left edge of the title block and left metadata column.
const LEFT_X_MM: f32 = 20.0;
/// Left edge of the right metadata column.
const RIGHT_X_MM: f32 = 120.0;
const DEPARTMENT_Y_MM: f32 = 20.0;
const INSTITUTION_Y_MM: f32 = 30.0;
const LEFT_META_Y_MM: [f32; 4] = [50.0, 60.0, 70.0, 80.0];
const RIGHT_META_Y_MM: [f32; 3] = [60.0, 70.0, 80.0];

/// Fixed widths of S.No., Student Name and Roll Number; Details takes the rest.
const FIXED_COLUMN_MM: [f32; 3] = [14.0, 56.0, 38.0];

// ── Layout pass ──────────────────────────────────────────────────────────

/// One primitive on a page. Coordinates are millimetres from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x_mm: f32,
        baseline_mm: f32,
        size_pt: f32,
        bold: bool,
        color: [u8; 3],
        text: String,
    },
    FillRect {
        left_mm: f32,
        top_mm: f32,
        width_mm: f32,
        height_mm: f32,
        color: [u8; 3],
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    /// Text of every text op, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::FillRect { .. } => None,
        })
    }

    /// Text ops as positioned runs, in draw order.
    pub fn text_runs(&self) -> Vec<TextRun> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text {
                    x_mm,
                    baseline_mm,
                    text,
                    ..
                } => Some(TextRun {
                    text: text.clone(),
                    x_mm: *x_mm,
                    baseline_mm: *baseline_mm,
                }),
                DrawOp::FillRect { .. } => None,
            })
            .collect()
    }
}

/// Column widths in millimetres for the printable width of `layout`.
pub fn column_widths(layout: &PdfLayout) -> [f32; 4] {
    let usable = PdfLayout::PAGE_WIDTH_MM - 2.0 * layout.margin_mm;
    let fixed: f32 = FIXED_COLUMN_MM.iter().sum();
    let scale = if fixed >= usable * 0.8 {
        usable * 0.6 / fixed
    } else {
        1.0
    };
    let [a, b, c] = FIXED_COLUMN_MM.map(|w| w * scale);
    [a, b, c, usable - (a + b + c)]
}

/// Approximate Helvetica advance width in ems.
fn glyph_em(c: char) -> f32 {
    match c {
        ' ' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' | 'i' | 'j' | 'l' => 0.278,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '-' | '/' => 0.333,
        'm' | 'w' | 'M' | 'W' | '@' => 0.833,
        'A'..='Z' => 0.667,
        '0'..='9' => 0.556,
        _ => 0.5,
    }
}

/// Estimated rendered width of `text` in millimetres.
pub fn text_width_mm(text: &str, size_pt: f32, bold: bool) -> f32 {
    let em: f32 = text.chars().map(glyph_em).sum();
    let factor = if bold { 1.06 } else { 1.0 };
    em * size_pt * MM_PER_PT * factor
}

/// Split `text` into words, each paired with the whitespace that follows it.
///
/// Leading whitespace comes back as a pair with an empty word.
fn words_with_gaps(text: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let word_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (word, after) = rest.split_at(word_end);
        let gap_end = after
            .find(|c: char| !c.is_whitespace())
            .unwrap_or(after.len());
        let (gap, next) = after.split_at(gap_end);
        out.push((word, gap));
        rest = next;
    }
    out
}

/// Greedy word wrap to `max_mm`. Words wider than a line are split by char.
///
/// The lines concatenate back to `text` exactly: whitespace at a break stays
/// at the end of the line before it and does not count against the width.
/// Always returns at least one (possibly empty) line.
pub fn wrap_text(text: &str, max_mm: f32, size_pt: f32, bold: bool) -> Vec<String> {
    let fits = |s: &str| text_width_mm(s, size_pt, bold) <= max_mm;
    let mut lines = Vec::new();
    let mut current = String::new();

    for (word, gap) in words_with_gaps(text) {
        if fits(&format!("{current}{word}")) {
            current.push_str(word);
            current.push_str(gap);
            continue;
        }
        if !current.trim().is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for c in word.chars() {
            current.push(c);
            if !fits(&current) && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
        current.push_str(gap);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn line_height_mm(size_pt: f32) -> f32 {
    size_pt * LINE_HEIGHT_FACTOR * MM_PER_PT
}

/// Wrap each cell to its column. The S.No. cell always stays on one line.
fn wrap_cells(cells: &[String; 4], widths: &[f32; 4], layout: &PdfLayout, bold: bool) -> Vec<Vec<String>> {
    let pad = layout.cell_padding_mm;
    cells
        .iter()
        .zip(widths.iter())
        .enumerate()
        .map(|(i, (c, w))| match i {
            0 => vec![c.clone()],
            _ => wrap_text(c, w - 2.0 * pad, layout.body_font_size, bold),
        })
        .collect()
}

fn line_count(wrapped: &[Vec<String>]) -> usize {
    wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1)
}

fn row_height(wrapped: &[Vec<String>], layout: &PdfLayout) -> f32 {
    line_count(wrapped) as f32 * line_height_mm(layout.body_font_size)
        + 2.0 * layout.cell_padding_mm
}

fn header_height(widths: &[f32; 4], layout: &PdfLayout) -> f32 {
    let cells = TABLE_COLUMNS.map(str::to_string);
    row_height(&wrap_cells(&cells, widths, layout, true), layout)
}

/// Cut every column after its first `n` lines and return the cut-off tails.
fn split_lines(wrapped: &mut [Vec<String>], n: usize) -> Vec<Vec<String>> {
    wrapped
        .iter_mut()
        .map(|lines| lines.split_off(n.min(lines.len())))
        .collect()
}

struct TableCursor<'l> {
    layout: &'l PdfLayout,
    widths: [f32; 4],
    header_mm: f32,
    pages: Vec<PageLayout>,
    y_mm: f32,
}

impl TableCursor<'_> {
    fn page(&mut self) -> &mut PageLayout {
        // `pages` starts non-empty and only grows.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn bottom_limit(&self) -> f32 {
        PdfLayout::PAGE_HEIGHT_MM - self.layout.margin_mm
    }

    /// Whole body lines that fit in `room_mm` of table height.
    fn lines_in(&self, room_mm: f32) -> usize {
        let room = room_mm - 2.0 * self.layout.cell_padding_mm;
        if room <= 0.0 {
            return 0;
        }
        (room / line_height_mm(self.layout.body_font_size) + 1e-4).floor() as usize
    }

    fn lines_left(&self) -> usize {
        self.lines_in(self.bottom_limit() - self.y_mm)
    }

    fn lines_on_fresh_page(&self) -> usize {
        self.lines_in(self.bottom_limit() - self.layout.continuation_top_mm - self.header_mm)
    }

    fn wrap_row(&self, cells: &[String; 4], bold: bool) -> Vec<Vec<String>> {
        wrap_cells(cells, &self.widths, self.layout, bold)
    }

    fn draw_row(&mut self, wrapped: &[Vec<String>], fill: Option<[u8; 3]>, text: [u8; 3], bold: bool) {
        let height = row_height(wrapped, self.layout);
        let left = self.layout.margin_mm;
        let top = self.y_mm;
        let width: f32 = self.widths.iter().sum();
        let size = self.layout.body_font_size;
        let pad = self.layout.cell_padding_mm;
        let lh = line_height_mm(size);
        let widths = self.widths;

        let page = self.page();
        if let Some(color) = fill {
            page.ops.push(DrawOp::FillRect {
                left_mm: left,
                top_mm: top,
                width_mm: width,
                height_mm: height,
                color,
            });
        }
        let mut x = left;
        for (lines, w) in wrapped.iter().zip(widths.iter()) {
            for (k, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                page.ops.push(DrawOp::Text {
                    x_mm: x + pad,
                    baseline_mm: top + pad + k as f32 * lh + lh * 0.78,
                    size_pt: size,
                    bold,
                    color: text,
                    text: line.clone(),
                });
            }
            x += w;
        }
        self.y_mm += height;
    }

    fn draw_header(&mut self) {
        let cells = TABLE_COLUMNS.map(str::to_string);
        let wrapped = self.wrap_row(&cells, true);
        let (fill, text) = (self.layout.header_fill, self.layout.header_text);
        self.draw_row(&wrapped, Some(fill), text, true);
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.y_mm = self.layout.continuation_top_mm;
        self.draw_header();
    }
}

/// Lay out the whole report: title block, metadata block, paginated table.
///
/// A row that does not fit below the previous one moves to the next page. A
/// row taller than a whole page is split between lines instead, and carries
/// on under the repeated header of the next page, so no text is ever placed
/// below the bottom margin.
pub fn layout_document(doc: &ReportDocument, layout: &PdfLayout) -> Vec<PageLayout> {
    let mut first = PageLayout::default();
    let black = [0, 0, 0];
    let text = |x_mm: f32, baseline_mm: f32, size_pt: f32, text: String| DrawOp::Text {
        x_mm,
        baseline_mm,
        size_pt,
        bold: false,
        color: black,
        text,
    };

    let header = doc.header();
    first.ops.push(text(
        LEFT_X_MM,
        DEPARTMENT_Y_MM,
        layout.title_font_size,
        header.department.clone(),
    ));
    first.ops.push(text(
        LEFT_X_MM,
        INSTITUTION_Y_MM,
        layout.subtitle_font_size,
        header.institution.clone(),
    ));

    let (left, right) = doc.metadata_columns();
    for ((label, value), y) in left.iter().zip(LEFT_META_Y_MM) {
        first.ops.push(text(LEFT_X_MM, y, layout.metadata_font_size, format!("{label}: {value}")));
    }
    for ((label, value), y) in right.iter().zip(RIGHT_META_Y_MM) {
        first.ops.push(text(RIGHT_X_MM, y, layout.metadata_font_size, format!("{label}: {value}")));
    }

    let widths = column_widths(layout);
    let mut cursor = TableCursor {
        layout,
        widths,
        header_mm: header_height(&widths, layout),
        pages: vec![first],
        y_mm: layout.table_start_mm,
    };
    cursor.draw_header();

    let mut on_page = 0usize;
    for (i, row) in doc.rows().iter().enumerate() {
        let fill = (i % 2 == 0).then_some(layout.stripe_fill);
        let mut rest = cursor.wrap_row(&row.cells(), false);

        let needed = line_count(&rest);
        if on_page > 0 && needed > cursor.lines_left() && needed <= cursor.lines_on_fresh_page() {
            cursor.new_page();
            on_page = 0;
        }

        loop {
            let mut fit = cursor.lines_left();
            if fit == 0 && on_page == 0 {
                // A page always takes at least one line.
                fit = 1;
            }
            if line_count(&rest) <= fit {
                cursor.draw_row(&rest, fill, black, false);
                on_page += 1;
                break;
            }
            if fit > 0 {
                let tail = split_lines(&mut rest, fit);
                cursor.draw_row(&rest, fill, black, false);
                rest = tail;
            }
            cursor.new_page();
            on_page = 0;
        }
    }

    debug!(
        "Laid out {} rows on {} page(s)",
        doc.rows().len(),
        cursor.pages.len()
    );
    cursor.pages
}

// ── Read-back ────────────────────────────────────────────────────────────

/// A text object on a page, positioned in millimetres from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x_mm: f32,
    pub baseline_mm: f32,
}

/// Rebuild the table body from the text runs of each page, in draw order.
///
/// A run's column comes from its x position. Each S.No. run opens a row and
/// every later run belongs to that row until the next one, including lines
/// carried over to the following page. Lines of a cell are concatenated, so
/// an empty cell comes back as `""` and wrapped text comes back whole.
pub fn table_cells(pages: &[Vec<TextRun>], layout: &PdfLayout) -> Vec<[String; 4]> {
    let widths = column_widths(layout);
    let header_mm = header_height(&widths, layout);
    let mut edges = [0.0f32; 4];
    let mut x = layout.margin_mm;
    for (edge, w) in edges.iter_mut().zip(widths) {
        *edge = x;
        x += w;
    }

    let mut rows: Vec<[String; 4]> = Vec::new();
    for (n, runs) in pages.iter().enumerate() {
        let table_top = if n == 0 {
            layout.table_start_mm
        } else {
            layout.continuation_top_mm
        };
        let body_top = table_top + header_mm;
        for run in runs
            .iter()
            .filter(|r| r.baseline_mm > body_top && r.x_mm + 0.01 >= layout.margin_mm)
        {
            let col = edges
                .iter()
                .rposition(|edge| run.x_mm + 0.01 >= *edge)
                .unwrap_or(0);
            if col == 0 {
                rows.push(Default::default());
            }
            if let Some(row) = rows.last_mut() {
                row[col].push_str(&run.text);
            }
        }
    }
    rows
}

// ── pdfium pass ──────────────────────────────────────────────────────────

#[cfg(target_os = "macos")]
const PDFIUM_LIB_NAME: &str = "libpdfium.dylib";
#[cfg(target_os = "windows")]
const PDFIUM_LIB_NAME: &str = "pdfium.dll";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PDFIUM_LIB_NAME: &str = "libpdfium.so";

/// A bound pdfium library.
pub struct PdfEngine {
    pdfium: Pdfium,
}

impl PdfEngine {
    /// Bind to pdfium.
    ///
    /// Resolution order: `PDFIUM_LIB_PATH` (the library file or its
    /// directory), the current directory, then the system library path.
    pub fn bind() -> Result<Self, ReportError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(env_path) = std::env::var("PDFIUM_LIB_PATH") {
            let p = PathBuf::from(env_path);
            if p.is_dir() {
                candidates.push(p.join(PDFIUM_LIB_NAME));
            } else {
                candidates.push(p);
            }
        }
        candidates.push(PathBuf::from(".").join(PDFIUM_LIB_NAME));

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::bind_to(path) {
                Ok(engine) => return Ok(engine),
                Err(e) => warn!("{}", e),
            }
        }

        let bindings = Pdfium::bind_to_system_library()
            .map_err(|e| ReportError::PdfiumBindingFailed(e.to_string()))?;
        info!("Bound pdfium from the system library path");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Bind to a pdfium library at an explicit path.
    pub fn bind_to(path: &Path) -> Result<Self, ReportError> {
        let bindings = Pdfium::bind_to_library(path).map_err(|e| {
            ReportError::PdfiumBindingFailed(format!("{}: {}", path.display(), e))
        })?;
        info!("Bound pdfium from {}", path.display());
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Render `doc` to PDF bytes.
    pub fn render(&self, doc: &ReportDocument, layout: &PdfLayout) -> Result<Vec<u8>, ReportError> {
        let pages = layout_document(doc, layout);
        let fail = |stage: &str, e: PdfiumError| ReportError::ExportFailure {
            detail: format!("{stage}: {e}"),
        };

        let mut document = self
            .pdfium
            .create_new_pdf()
            .map_err(|e| fail("create document", e))?;
        let regular = document.fonts_mut().helvetica();
        let bold = document.fonts_mut().helvetica_bold();

        for (n, ops) in pages.iter().enumerate() {
            let mut page = document
                .pages_mut()
                .create_page_at_end(PdfPagePaperSize::a4())
                .map_err(|e| fail("add page", e))?;

            for op in &ops.ops {
                match op {
                    DrawOp::FillRect {
                        left_mm,
                        top_mm,
                        width_mm,
                        height_mm,
                        color,
                    } => {
                        let rect = PdfRect::new_from_values(
                            to_pdf_y(top_mm + height_mm),
                            to_pt(*left_mm),
                            to_pdf_y(*top_mm),
                            to_pt(left_mm + width_mm),
                        );
                        page.objects_mut()
                            .create_path_object_rect(rect, None, None, Some(rgb(*color)))
                            .map_err(|e| fail("draw rectangle", e))?;
                    }
                    DrawOp::Text {
                        x_mm,
                        baseline_mm,
                        size_pt,
                        bold: is_bold,
                        color,
                        text,
                    } => {
                        let font = if *is_bold { bold } else { regular };
                        let mut object = page
                            .objects_mut()
                            .create_text_object(
                                PdfPoints::new(to_pt(*x_mm)),
                                PdfPoints::new(to_pdf_y(*baseline_mm)),
                                text,
                                font,
                                PdfPoints::new(*size_pt),
                            )
                            .map_err(|e| fail("draw text", e))?;
                        if *color != [0, 0, 0] {
                            object
                                .set_fill_color(rgb(*color))
                                .map_err(|e| fail("set text colour", e))?;
                        }
                    }
                }
            }
            page.regenerate_content()
                .map_err(|e| fail("write page content", e))?;
            debug!("Drew page {} ({} ops)", n + 1, ops.ops.len());
        }

        let bytes = document
            .save_to_bytes()
            .map_err(|e| fail("serialise", e))?;
        info!(
            "Rendered {} rows to {} page(s), {} bytes",
            doc.rows().len(),
            pages.len(),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Every text object, page by page, in content-stream order, with the
    /// position it was drawn at.
    pub fn extract_positioned_runs(&self, bytes: &[u8]) -> Result<Vec<Vec<TextRun>>, ReportError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ReportError::ExportFailure {
                detail: format!("cannot reopen PDF: {e}"),
            })?;

        let mut pages = Vec::new();
        for page in document.pages().iter() {
            let runs: Vec<TextRun> = page
                .objects()
                .iter()
                .filter_map(|object| {
                    object.as_text_object().map(|t| {
                        let (x, y) = t.get_translation();
                        TextRun {
                            text: t.text(),
                            x_mm: x.value * MM_PER_PT,
                            baseline_mm: PdfLayout::PAGE_HEIGHT_MM - y.value * MM_PER_PT,
                        }
                    })
                })
                .collect();
            pages.push(runs);
        }
        Ok(pages)
    }

    /// Text of every text object, page by page, in content-stream order.
    pub fn extract_text_runs(&self, bytes: &[u8]) -> Result<Vec<Vec<String>>, ReportError> {
        Ok(self
            .extract_positioned_runs(bytes)?
            .into_iter()
            .map(|runs| runs.into_iter().map(|r| r.text).collect())
            .collect())
    }

    /// The table body of a rendered report, one `[S.No., name, roll, details]`
    /// per row, rebuilt from text positions with [`table_cells`].
    pub fn extract_table_cells(
        &self,
        bytes: &[u8],
        layout: &PdfLayout,
    ) -> Result<Vec<[String; 4]>, ReportError> {
        Ok(table_cells(&self.extract_positioned_runs(bytes)?, layout))
    }
}

fn to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

fn to_pdf_y(mm_from_top: f32) -> f32 {
    to_pt(PdfLayout::PAGE_HEIGHT_MM - mm_from_top)
}

fn rgb([r, g, b]: [u8; 3]) -> PdfColor {
    PdfColor::new(r, g, b, 255)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AcademicMetadata, InputMethod, InstitutionHeader, ManualEntry, MetadataField, ReportType,
    };
    use crate::pipeline::assemble::{assemble, ReportRequest};
    use crate::pipeline::normalize;

    fn doc_with(entries: &[ManualEntry]) -> ReportDocument {
        let metadata = AcademicMetadata::default()
            .with(MetadataField::Program, "be-cse-general")
            .with(MetadataField::Batch, "2022")
            .with(MetadataField::AcademicYear, "2022-2023")
            .with(MetadataField::Group, "4B")
            .with(MetadataField::Session, "jan-june-2025")
            .with(MetadataField::Semester, "6");
        let rows = normalize::from_manual(entries);
        assemble(
            &ReportRequest {
                report_type: Some(ReportType::SubjectAttendance),
                metadata: &metadata,
                input_method: InputMethod::Manual,
                rows: &rows,
            },
            &InstitutionHeader::default(),
        )
        .unwrap()
    }

    fn students(n: usize) -> Vec<ManualEntry> {
        (1..=n)
            .map(|i| ManualEntry::new(format!("Student {i}"), format!("{}", 2200 + i)).details("Present"))
            .collect()
    }

    #[test]
    fn columns_fill_printable_width() {
        let layout = PdfLayout::default();
        let w = column_widths(&layout);
        let total: f32 = w.iter().sum();
        assert!((total - 182.0).abs() < 0.01, "{total}");
        assert!(w[3] > 50.0);
    }

    #[test]
    fn header_block_sits_at_fixed_coordinates() {
        let pages = layout_document(&doc_with(&students(1)), &PdfLayout::default());
        let texts: Vec<(f32, f32, f32, &str)> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x_mm, baseline_mm, size_pt, text, .. } => {
                    Some((*x_mm, *baseline_mm, *size_pt, text.as_str()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(texts[0].0, 20.0);
        assert_eq!(texts[0].1, 20.0);
        assert_eq!(texts[0].2, 16.0);
        assert_eq!(texts[1].2, 14.0);
        assert!(texts.contains(&(20.0, 50.0, 12.0, "Report Type: subject-attendance")));
        assert!(texts.contains(&(120.0, 80.0, 12.0, "Semester: 6")));
    }

    #[test]
    fn header_row_uses_theme_fill() {
        let pages = layout_document(&doc_with(&students(2)), &PdfLayout::default());
        let first_rect = pages[0].ops.iter().find_map(|op| match op {
            DrawOp::FillRect { top_mm, color, .. } => Some((*top_mm, *color)),
            _ => None,
        });
        assert_eq!(first_rect, Some((100.0, [41, 128, 185])));
    }

    #[test]
    fn body_rows_are_striped_even_first() {
        let pages = layout_document(&doc_with(&students(4)), &PdfLayout::default());
        let stripes = pages[0]
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::FillRect { color, .. } if *color == [245, 245, 245]))
            .count();
        assert_eq!(stripes, 2);
    }

    #[test]
    fn long_tables_paginate_and_repeat_header() {
        let pages = layout_document(&doc_with(&students(60)), &PdfLayout::default());
        assert!(pages.len() >= 2, "expected pagination, got {} page", pages.len());
        for page in &pages {
            let texts: Vec<&str> = page.texts().collect();
            assert!(texts.contains(&"S.No."), "header missing on a page");
        }
        let all: Vec<&str> = pages.iter().flat_map(|p| p.texts()).collect();
        assert!(all.contains(&"Student 60"));
        assert_eq!(all.iter().filter(|t| **t == "Student 1").count(), 1);
    }

    #[test]
    fn no_row_crosses_bottom_margin() {
        let layout = PdfLayout::default();
        let pages = layout_document(&doc_with(&students(80)), &layout);
        for page in &pages {
            for op in &page.ops {
                if let DrawOp::FillRect { top_mm, height_mm, .. } = op {
                    assert!(top_mm + height_mm <= PdfLayout::PAGE_HEIGHT_MM - layout.margin_mm + 0.01);
                }
            }
        }
    }

    #[test]
    fn wrap_breaks_on_words_and_long_tokens() {
        let lines = wrap_text("alpha beta gamma delta", 20.0, 10.0, false);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "alpha beta gamma delta");
        assert!(lines.iter().all(|l| !l.starts_with(' ')), "{lines:?}");

        let long = "x".repeat(200);
        let lines = wrap_text(&long, 20.0, 10.0, false);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), long);

        assert_eq!(wrap_text("", 20.0, 10.0, false), vec![String::new()]);
    }

    #[test]
    fn wrap_keeps_whitespace_runs() {
        assert_eq!(wrap_text("Asha  Rao", 100.0, 10.0, false), vec!["Asha  Rao"]);

        let text = "met  twice   in week one, then    weekly";
        let lines = wrap_text(text, 15.0, 10.0, false);
        assert!(lines.len() > 2, "{lines:?}");
        assert_eq!(lines.concat(), text);
    }

    fn bottom_limit(layout: &PdfLayout) -> f32 {
        PdfLayout::PAGE_HEIGHT_MM - layout.margin_mm
    }

    fn assert_inside_margins(pages: &[PageLayout], layout: &PdfLayout) {
        let limit = bottom_limit(layout) + 0.01;
        for (n, page) in pages.iter().enumerate() {
            for op in &page.ops {
                match op {
                    DrawOp::Text { baseline_mm, text, .. } => {
                        assert!(*baseline_mm <= limit, "page {n}: '{text}' at {baseline_mm}mm")
                    }
                    DrawOp::FillRect { top_mm, height_mm, .. } => {
                        assert!(top_mm + height_mm <= limit, "page {n}: fill ends at {}", top_mm + height_mm)
                    }
                }
            }
        }
    }

    fn runs(pages: &[PageLayout]) -> Vec<Vec<TextRun>> {
        pages.iter().map(PageLayout::text_runs).collect()
    }

    #[test]
    fn oversized_cells_continue_on_following_pages() {
        let layout = PdfLayout::default();
        let long = "word ".repeat(1500);
        let doc = doc_with(&[
            ManualEntry::new("A", "1").details(long.clone()),
            ManualEntry::new("B", "2").details(long),
        ]);
        let pages = layout_document(&doc, &layout);

        assert!(pages.len() >= 4, "got {} page(s)", pages.len());
        assert_inside_margins(&pages, &layout);
        for page in &pages {
            assert_eq!(page.texts().filter(|t| *t == "S.No.").count(), 1);
        }

        let expected: Vec<[String; 4]> = doc.rows().iter().map(|r| r.cells()).collect();
        assert_eq!(table_cells(&runs(&pages), &layout), expected);
    }

    #[test]
    fn row_that_fits_a_fresh_page_is_not_split() {
        let layout = PdfLayout::default();
        let medium = "attended every lab and mentoring session this term ".repeat(12);
        let mut entries = students(55);
        entries.push(ManualEntry::new("Late", "9999").details(medium));
        let pages = layout_document(&doc_with(&entries), &layout);

        assert_inside_margins(&pages, &layout);
        let pages_with_late = pages
            .iter()
            .filter(|p| p.texts().any(|t| t == "Late"))
            .count();
        assert_eq!(pages_with_late, 1);
        let last: Vec<&str> = pages.last().unwrap().texts().collect();
        assert!(last.contains(&"Late"), "{last:?}");
    }

    #[test]
    fn table_read_back_matches_row_cells() {
        let layout = PdfLayout::default();
        let doc = doc_with(&[
            ManualEntry::new("Asha  Rao", "7"),
            ManualEntry::new("Ravi", "8").details(
                "Presented the capstone design review and led two peer study groups before the exam",
            ),
            ManualEntry::new("Meera", "9").details("Needs  follow-up"),
        ]);
        let cells = table_cells(&runs(&layout_document(&doc, &layout)), &layout);
        assert_eq!(
            cells,
            doc.rows().iter().map(|r| r.cells()).collect::<Vec<_>>()
        );
        assert_eq!(cells[0][3], "");
        assert_eq!(cells[0][1], "Asha  Rao");
    }

    #[test]
    fn wrapped_cell_grows_row() {
        let layout = PdfLayout::default();
        let long = "attended every lab session and submitted all assignments on time ".repeat(3);
        let pages = layout_document(&doc_with(&[ManualEntry::new("Asha", "7").details(long)]), &layout);
        let heights: Vec<f32> = pages[0]
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::FillRect { height_mm, .. } => Some(*height_mm),
                _ => None,
            })
            .collect();
        assert_eq!(heights.len(), 2);
        assert!(heights[1] > heights[0] * 1.5, "{heights:?}");
    }
}
