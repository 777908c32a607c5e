//! On-screen preview: HTML for a browser pane and plain text for a terminal.
//!
//! A preview with no rows is its own state, [`Preview::Empty`], rendered
//! with an explicit "no student rows" notice. It never borrows a sample
//! student to fill the table.

use crate::error::ReportError;
use crate::model::{
    AcademicMetadata, InstitutionHeader, ReportDocument, ReportType, TABLE_COLUMNS,
};
use crate::pipeline::assemble::{self, ReportRequest};
use std::fmt::Write as _;

/// A `label: value` line of the metadata header.
pub type MetadataLine = (&'static str, String);

/// Heading block shared by both preview states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHeading {
    pub header: InstitutionHeader,
    /// Report Type, Program, Batch, Academic Year.
    pub left: Vec<MetadataLine>,
    /// Group, Session, Semester.
    pub right: Vec<MetadataLine>,
}

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRow {
    pub cells: [String; 4],
    /// Even (0-based) rows are shaded.
    pub shaded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTable {
    pub heading: PreviewHeading,
    pub columns: [&'static str; 4],
    pub rows: Vec<PreviewRow>,
}

/// What the preview pane shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Table(PreviewTable),
    Empty(PreviewHeading),
}

impl Preview {
    /// Table view of an assembled document.
    pub fn from_document(doc: &ReportDocument) -> Self {
        let (left, right) = doc.metadata_columns();
        let rows = doc
            .rows()
            .iter()
            .enumerate()
            .map(|(i, r)| PreviewRow {
                cells: r.cells(),
                shaded: i % 2 == 0,
            })
            .collect();
        Preview::Table(PreviewTable {
            heading: PreviewHeading {
                header: doc.header().clone(),
                left,
                right,
            },
            columns: TABLE_COLUMNS,
            rows,
        })
    }

    /// Every table cell, row by row. Empty for [`Preview::Empty`].
    pub fn cell_text(&self) -> Vec<[String; 4]> {
        match self {
            Preview::Table(t) => t.rows.iter().map(|r| r.cells.clone()).collect(),
            Preview::Empty(_) => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Preview::Empty(_))
    }
}

/// Build the preview for the current form.
///
/// A fully ready form yields a table. A form that is complete except for
/// rows yields [`Preview::Empty`]. Anything else is refused with
/// [`ReportError::NotReady`].
pub fn build(
    request: &ReportRequest<'_>,
    header: &InstitutionHeader,
) -> Result<Preview, ReportError> {
    let readiness = assemble::check_readiness(request);
    if readiness.only_rows_missing() {
        if let Some(report_type) = request.report_type {
            return Ok(Preview::Empty(empty_heading(
                header,
                report_type,
                request.metadata,
            )));
        }
    }
    let doc = assemble::assemble(request, header)?;
    Ok(Preview::from_document(&doc))
}

fn empty_heading(
    header: &InstitutionHeader,
    report_type: ReportType,
    m: &AcademicMetadata,
) -> PreviewHeading {
    PreviewHeading {
        header: header.clone(),
        left: vec![
            ("Report Type", report_type.slug().to_string()),
            ("Program", m.program.clone()),
            ("Batch", m.batch.clone()),
            ("Academic Year", m.academic_year.clone()),
        ],
        right: vec![
            ("Group", m.group.clone()),
            ("Session", m.session.clone()),
            ("Semester", m.semester.clone()),
        ],
    }
}

// ── HTML ─────────────────────────────────────────────────────────────────

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn heading_html(h: &PreviewHeading, out: &mut String) {
    out.push_str("<div class=\"report-header\">\n");
    let _ = writeln!(out, "  <h2>{}</h2>", escape_html(&h.header.department));
    let _ = writeln!(out, "  <h3>{}</h3>", escape_html(&h.header.institution));
    out.push_str("</div>\n<div class=\"report-meta\">\n");
    for column in [&h.left, &h.right] {
        out.push_str("  <div class=\"meta-column\">\n");
        for (label, value) in column {
            let _ = writeln!(
                out,
                "    <p><strong>{}:</strong> {}</p>",
                label,
                escape_html(value)
            );
        }
        out.push_str("  </div>\n");
    }
    out.push_str("</div>\n");
}

/// Render a self-contained HTML fragment.
pub fn render_html(preview: &Preview) -> String {
    let mut out = String::from("<section class=\"report-preview\">\n");
    match preview {
        Preview::Table(t) => {
            heading_html(&t.heading, &mut out);
            out.push_str("<table class=\"report-table\">\n  <thead>\n    <tr>");
            for c in t.columns {
                let _ = write!(out, "<th>{}</th>", escape_html(c));
            }
            out.push_str("</tr>\n  </thead>\n  <tbody>\n");
            for row in &t.rows {
                let class = if row.shaded { "row-even" } else { "row-odd" };
                let _ = write!(out, "    <tr class=\"{class}\">");
                for cell in &row.cells {
                    let _ = write!(out, "<td>{}</td>", escape_html(cell));
                }
                out.push_str("</tr>\n");
            }
            out.push_str("  </tbody>\n</table>\n");
        }
        Preview::Empty(h) => {
            heading_html(h, &mut out);
            out.push_str(
                "<p class=\"empty-preview\">No student rows yet. Upload a file or add entries to fill the table.</p>\n",
            );
        }
    }
    out.push_str("</section>\n");
    out
}

// ── Plain text ───────────────────────────────────────────────────────────

fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    format!("{}{}", s, " ".repeat(width.saturating_sub(len)))
}

fn heading_text(h: &PreviewHeading, out: &mut String) {
    out.push_str(&h.header.department);
    out.push('\n');
    out.push_str(&h.header.institution);
    out.push_str("\n\n");

    let left: Vec<String> = h.left.iter().map(|(l, v)| format!("{l}: {v}")).collect();
    let right: Vec<String> = h.right.iter().map(|(l, v)| format!("{l}: {v}")).collect();
    let width = left.iter().map(|s| s.chars().count()).max().unwrap_or(0) + 4;
    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).map(String::as_str).unwrap_or("");
        match right.get(i) {
            Some(r) => {
                let _ = writeln!(out, "{}{}", pad(l, width), r);
            }
            None => {
                let _ = writeln!(out, "{l}");
            }
        }
    }
    out.push('\n');
}

/// Render an aligned text table for terminal output.
pub fn render_text(preview: &Preview) -> String {
    let mut out = String::new();
    match preview {
        Preview::Table(t) => {
            heading_text(&t.heading, &mut out);
            let mut widths: Vec<usize> = t.columns.iter().map(|c| c.chars().count()).collect();
            for row in &t.rows {
                for (w, cell) in widths.iter_mut().zip(row.cells.iter()) {
                    *w = (*w).max(cell.chars().count());
                }
            }
            let line = |cells: Vec<&str>| -> String {
                cells
                    .iter()
                    .zip(widths.iter())
                    .map(|(c, w)| pad(c, *w))
                    .collect::<Vec<_>>()
                    .join(" | ")
                    .trim_end()
                    .to_string()
            };
            out.push_str(&line(t.columns.to_vec()));
            out.push('\n');
            out.push_str(
                &widths
                    .iter()
                    .map(|w| "-".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("-+-"),
            );
            out.push('\n');
            for row in &t.rows {
                out.push_str(&line(row.cells.iter().map(String::as_str).collect()));
                out.push('\n');
            }
        }
        Preview::Empty(h) => {
            heading_text(h, &mut out);
            out.push_str("(no student rows yet)\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InputMethod, ManualEntry, MetadataField, NormalizedRow};
    use crate::pipeline::normalize;

    fn metadata() -> AcademicMetadata {
        AcademicMetadata::default()
            .with(MetadataField::Program, "be-cse-ml")
            .with(MetadataField::Batch, "2024")
            .with(MetadataField::AcademicYear, "2024-2025")
            .with(MetadataField::Group, "4C")
            .with(MetadataField::Session, "july-dec-2024")
            .with(MetadataField::Semester, "1")
    }

    fn request<'a>(m: &'a AcademicMetadata, rows: &'a [NormalizedRow]) -> ReportRequest<'a> {
        ReportRequest {
            report_type: Some(ReportType::StudentAchievement),
            metadata: m,
            input_method: InputMethod::Manual,
            rows,
        }
    }

    #[test]
    fn table_rows_are_striped_from_zero() {
        let m = metadata();
        let rows = normalize::from_manual(&[
            ManualEntry::new("A", "1"),
            ManualEntry::new("B", "2"),
            ManualEntry::new("C", "3"),
        ]);
        let preview = build(&request(&m, &rows), &InstitutionHeader::default()).unwrap();
        let Preview::Table(t) = &preview else {
            panic!("expected table");
        };
        let shading: Vec<bool> = t.rows.iter().map(|r| r.shaded).collect();
        assert_eq!(shading, vec![true, false, true]);
        assert_eq!(t.columns, ["S.No.", "Student Name", "Roll Number", "Details"]);
        assert_eq!(t.heading.left.len(), 4);
        assert_eq!(t.heading.right.len(), 3);
    }

    #[test]
    fn no_rows_gives_empty_state_not_sample_row() {
        let m = metadata();
        let preview = build(&request(&m, &[]), &InstitutionHeader::default()).unwrap();
        assert!(preview.is_empty());
        let html = render_html(&preview);
        assert!(html.contains("empty-preview"));
        assert!(!html.contains("Sample Student"));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn incomplete_metadata_refuses_preview() {
        let m = metadata().with(MetadataField::Group, "");
        let err = build(&request(&m, &[]), &InstitutionHeader::default()).unwrap_err();
        assert!(matches!(err, ReportError::NotReady { .. }));
    }

    #[test]
    fn html_escapes_cell_text() {
        let m = metadata();
        let rows = normalize::from_manual(&[
            ManualEntry::new("<b>Eve</b>", "9").details("R&D club")
        ]);
        let html = render_html(&build(&request(&m, &rows), &InstitutionHeader::default()).unwrap());
        assert!(html.contains("&lt;b&gt;Eve&lt;/b&gt;"));
        assert!(html.contains("R&amp;D club"));
        assert!(html.contains("Engineering &amp; Technology"));
    }

    #[test]
    fn text_table_lines_up_columns() {
        let m = metadata();
        let rows = normalize::from_manual(&[
            ManualEntry::new("Alice", "101").details("GoodWork"),
            ManualEntry::new("Bob", "102").details("NeedsHelp"),
        ]);
        let text = render_text(&build(&request(&m, &rows), &InstitutionHeader::default()).unwrap());
        assert!(text.contains("S.No. | Student Name | Roll Number | Details"), "{text}");
        assert!(text.contains("1     | Alice        | 101         | GoodWork"), "{text}");
        assert!(text.contains("Report Type: student-achievement"));
    }
}
