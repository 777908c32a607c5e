//! PDF export integration tests.
//!
//! pdfium may be bound only once per process, so every PDF check lives in a
//! single test function sharing one engine. The test is skipped when no
//! pdfium library can be found.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium cargo test --test pdf_export -- --nocapture

use mentoring_report::{
    AcademicMetadata, InputMethod, ManualEntry, MetadataField, PdfEngine, ReportConfig,
    ReportError, ReportType, Session, TABLE_COLUMNS,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

macro_rules! skip_unless_pdfium {
    () => {{
        match PdfEngine::bind() {
            Ok(engine) => engine,
            Err(e) => {
                println!("SKIP: pdfium not available ({e})");
                return;
            }
        }
    }};
}

fn metadata() -> AcademicMetadata {
    AcademicMetadata::default()
        .with(MetadataField::Program, "be-cse-ml")
        .with(MetadataField::Batch, "2023")
        .with(MetadataField::AcademicYear, "2023-2024")
        .with(MetadataField::Group, "4C")
        .with(MetadataField::Session, "jan-june-2024")
        .with(MetadataField::Semester, "4")
}

fn session_in(dir: &std::path::Path) -> Session {
    let config = ReportConfig::builder().output_dir(dir).build().unwrap();
    let mut session = Session::builder().config(config).build();
    session.set_metadata(metadata());
    session
}

/// True when the header cells appear as consecutive runs somewhere in `runs`.
fn contains_header(runs: &[String]) -> bool {
    runs.windows(4)
        .any(|w| w.iter().map(String::as_str).eq(TABLE_COLUMNS.iter().copied()))
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn pdf_export_end_to_end() {
    let engine = skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();

    // PDF cell text matches the preview, including an empty details cell, a
    // wrapped cell and a doubled space.
    let mut session = session_in(dir.path());
    session.select_report_type(ReportType::StudentAchievement);
    tokio_test::block_on(session.attach_bytes(
        "achievements.csv",
        Some("text/csv"),
        b"name,roll,details\n\
Asha  Rao,101,\n\
Bob,102,Led the robotics club to the regional finals and mentored three junior teams\n\
Cara,103,TopScorer\n"
            .to_vec(),
    ))
    .unwrap();

    let preview_cells = session.preview().unwrap().cell_text();
    assert_eq!(preview_cells.len(), 3);
    assert_eq!(preview_cells[0][1], "Asha  Rao");
    assert_eq!(preview_cells[0][3], "");

    let out = session.export_pdf(&engine).unwrap();
    assert!(out.file_name.starts_with("student-achievement_2023_"));
    assert!(out.file_name.ends_with(".pdf"));
    assert_eq!(out.rows, 3);

    let bytes = std::fs::read(&out.path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));

    let pages = engine.extract_text_runs(&bytes).unwrap();
    assert_eq!(pages.len(), 1);
    let runs = &pages[0];
    assert!(runs.iter().any(|r| r == "Department of Computer Science and Engineering"));
    assert!(runs.iter().any(|r| r == "Report Type: student-achievement"));
    assert!(runs.iter().any(|r| r == "Group: 4C"));
    assert!(contains_header(runs), "header row missing: {runs:?}");

    let pdf_cells = engine
        .extract_table_cells(&bytes, &session.config().pdf)
        .unwrap();
    assert_eq!(pdf_cells, preview_cells);

    // Long manual reports paginate with the header on every page.
    let mut session = session_in(dir.path());
    session.select_report_type(ReportType::SubjectAttendance);
    session.set_input_method(InputMethod::Manual);
    for i in 1..=70 {
        session
            .add_manual_entry(ManualEntry::new(format!("Student{i}"), format!("R{i}")).details("Present"))
            .unwrap();
    }
    let out = session.export_pdf(&engine).unwrap();
    let pages = engine
        .extract_text_runs(&std::fs::read(&out.path).unwrap())
        .unwrap();
    assert!(pages.len() >= 2, "expected pagination, got {} page(s)", pages.len());
    for runs in &pages {
        assert!(contains_header(runs));
    }
    let pdf_cells = engine
        .extract_table_cells(&std::fs::read(&out.path).unwrap(), &session.config().pdf)
        .unwrap();
    assert_eq!(pdf_cells, session.preview().unwrap().cell_text());
    assert_eq!(pdf_cells[69][1], "Student70");

    // An unready form writes nothing.
    let empty_dir = tempfile::tempdir().unwrap();
    let session = session_in(empty_dir.path());
    let err = session.export_pdf(&engine).unwrap_err();
    assert!(matches!(err, ReportError::NotReady { .. }));
    assert_eq!(err.user_message(), "Please select a report type");
    assert_eq!(std::fs::read_dir(empty_dir.path()).unwrap().count(), 0);
}
