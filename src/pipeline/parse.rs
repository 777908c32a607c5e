//! Spreadsheet parsing: CSV text or the first worksheet of a workbook into
//! schema-less [`RawRecord`]s.
//!
//! Uploaded files follow no fixed schema, so a record keeps its columns in
//! file order and callers read them positionally through [`column_at`].
//!
//! CSV and workbooks fail differently on purpose. A malformed CSV row is
//! skipped and reported as a [`RowParseError`] while the rest of the file
//! proceeds; a workbook with nothing below its header aborts ingestion with
//! [`ReportError::EmptyWorkbook`].

use crate::error::{ReportError, RowParseError};
use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Reader};
use chrono::NaiveTime;
use std::io::Cursor;
use tracing::{debug, warn};

/// One spreadsheet data row: `(column name, value)` pairs in column order.
///
/// Duplicate or blank header names are kept as-is (blank ones are replaced by
/// their 1-based position) so no value is lost to a key collision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    columns: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Value of the column named `name`, first match wins.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, v)| v.as_str())
    }

    fn is_blank(&self) -> bool {
        self.values().all(|v| v.trim().is_empty())
    }
}

/// The value at `index` in column order, if the record is that wide.
pub fn column_at(record: &RawRecord, index: usize) -> Option<&str> {
    record.columns.get(index).map(|(_, v)| v.as_str())
}

fn header_name(raw: &str, index: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        (index + 1).to_string()
    } else {
        trimmed.to_string()
    }
}

// ── CSV ──────────────────────────────────────────────────────────────────

/// Parse CSV bytes with a significant header row.
///
/// Empty lines are skipped, as are rows whose every field is blank. A line of
/// only spaces is a one-field row, so under a multi-column header it is
/// reported like any other short row. Rows whose field count does not match
/// the header, or that are not valid UTF-8, are dropped and returned as
/// warnings; every other row is kept in file order.
pub fn parse_csv(
    name: &str,
    bytes: &[u8],
) -> Result<(Vec<RawRecord>, Vec<RowParseError>), ReportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReportError::CorruptSpreadsheet {
            name: name.to_string(),
            detail: format!("cannot read CSV header: {e}"),
        })?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(h, i))
        .collect();

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (i, result) in reader.records().enumerate() {
        match result {
            Ok(row) => {
                let record = RawRecord::new(
                    headers
                        .iter()
                        .cloned()
                        .zip(row.iter().map(str::to_string))
                        .collect(),
                );
                if record.is_blank() {
                    continue;
                }
                records.push(record);
            }
            Err(e) => {
                // Header is line 1, so the i-th record sits on line i + 2 unless
                // the reader tells us better.
                let line = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(i as u64 + 2);
                let detail = csv_error_detail(&e);
                warn!("Skipping CSV row at line {} of {}: {}", line, name, detail);
                warnings.push(RowParseError { line, detail });
            }
        }
    }

    debug!(
        "Parsed CSV {}: {} records, {} skipped",
        name,
        records.len(),
        warnings.len()
    );
    Ok((records, warnings))
}

fn csv_error_detail(e: &csv::Error) -> String {
    match e.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("found {len} fields, expected {expected_len}"),
        csv::ErrorKind::Utf8 { .. } => "row is not valid UTF-8".to_string(),
        _ => e.to_string(),
    }
}

// ── Workbooks ────────────────────────────────────────────────────────────

/// Parse the first worksheet of an `.xlsx`/`.xls` workbook.
///
/// Row 0 holds the headers; each later row is zipped against them
/// positionally with missing cells read as `""`. Any further sheets are
/// ignored.
pub fn parse_workbook(name: &str, bytes: &[u8]) -> Result<Vec<RawRecord>, ReportError> {
    let corrupt = |detail: String| ReportError::CorruptSpreadsheet {
        name: name.to_string(),
        detail,
    };

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| corrupt(format!("cannot open workbook: {e}")))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(e)) => return Err(corrupt(format!("cannot read first sheet: {e}"))),
        None => {
            return Err(ReportError::EmptyWorkbook {
                name: name.to_string(),
            })
        }
    };

    let grid: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    records_from_grid(name, grid)
}

/// Zip each data row of a header-first grid against the header row.
///
/// Rows shorter than the header are padded with `""`; cells beyond the
/// header's width are dropped. Blank rows are skipped. Fails with
/// [`ReportError::EmptyWorkbook`] when no data row remains.
pub fn records_from_grid(
    name: &str,
    grid: Vec<Vec<String>>,
) -> Result<Vec<RawRecord>, ReportError> {
    let mut rows = grid.into_iter();
    let headers: Vec<String> = match rows.next() {
        Some(h) => h.iter().enumerate().map(|(i, c)| header_name(c, i)).collect(),
        None => {
            return Err(ReportError::EmptyWorkbook {
                name: name.to_string(),
            })
        }
    };

    let records: Vec<RawRecord> = rows
        .map(|row| {
            RawRecord::new(
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.clone(), row.get(i).cloned().unwrap_or_default()))
                    .collect(),
            )
        })
        .filter(|r| !r.is_blank())
        .collect();

    if records.is_empty() {
        return Err(ReportError::EmptyWorkbook {
            name: name.to_string(),
        });
    }

    debug!("Parsed workbook {}: {} records", name, records.len());
    Ok(records)
}

/// Render a workbook cell the way it reads in a spreadsheet UI.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            // Roll numbers arrive as floats; drop the ".0".
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                format!("{}", f)
            }
        }
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => excel_date_to_string(dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}

/// Serial of 9999-12-31, the last day Excel can display.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// A date cell as `YYYY-MM-DD` (plus `HH:MM:SS` when not midnight), or a
/// duration cell as `H:MM:SS`.
///
/// calamine applies the workbook's 1900 or 1904 date system. Serials outside
/// Excel's displayable range are written as plain numbers.
fn excel_date_to_string(dt: &ExcelDateTime) -> String {
    let serial = dt.as_f64();
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return serial.to_string();
    }

    if dt.is_duration() {
        let secs = dt.as_duration().map(|d| d.num_seconds()).unwrap_or_default();
        return format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60);
    }

    match dt.as_datetime() {
        Some(at) if at.time() == NaiveTime::MIN => at.format("%Y-%m-%d").to_string(),
        Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => serial.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::ExcelDateTimeType;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn csv_keeps_header_names_and_order() {
        let (records, warnings) =
            parse_csv("r.csv", b"name,roll,details\nAlice,101,GoodWork\nBob,102,NeedsHelp\n")
                .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("roll"), Some("101"));
        assert_eq!(column_at(&records[1], 0), Some("Bob"));
        assert_eq!(column_at(&records[1], 3), None);
    }

    #[test]
    fn csv_skips_blank_lines() {
        let (records, warnings) =
            parse_csv("r.csv", b"name,roll\n\nAlice,101\n\n\nBob,102\n").unwrap();
        assert!(warnings.is_empty());
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn csv_bad_row_is_skipped_with_warning() {
        let (records, warnings) =
            parse_csv("r.csv", b"name,roll,details\nAlice,101,ok\nBroken,row\nBob,102,ok\n")
                .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(column_at(&records[1], 0), Some("Bob"));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 3);
        assert!(warnings[0].detail.contains("expected 3"), "{}", warnings[0].detail);
    }

    #[test]
    fn csv_invalid_utf8_row_is_skipped() {
        let mut data = b"name,roll\nAlice,101\n".to_vec();
        data.extend_from_slice(&[0xff, 0xfe, b',', b'9', b'\n']);
        data.extend_from_slice(b"Bob,102\n");
        let (records, warnings) = parse_csv("r.csv", &data).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn csv_header_only_is_empty_not_error() {
        let (records, warnings) = parse_csv("r.csv", b"name,roll,details\n").unwrap();
        assert!(records.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn grid_pads_missing_cells() {
        let records = records_from_grid(
            "w.xlsx",
            grid(&[&["Name", "Roll", "Marks"], &["Asha", "7"], &["Dev", "8", "91"]]),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Marks"), Some(""));
        assert_eq!(records[1].get("Marks"), Some("91"));
    }

    #[test]
    fn grid_drops_cells_beyond_header() {
        let records =
            records_from_grid("w.xlsx", grid(&[&["Name"], &["Asha", "extra"]])).unwrap();
        assert_eq!(records[0].len(), 1);
    }

    #[test]
    fn grid_with_only_header_is_empty_workbook() {
        let err = records_from_grid("w.xlsx", grid(&[&["Name", "Roll"]])).unwrap_err();
        assert!(matches!(err, ReportError::EmptyWorkbook { .. }));
        let err = records_from_grid("w.xlsx", Vec::new()).unwrap_err();
        assert!(matches!(err, ReportError::EmptyWorkbook { .. }));
    }

    #[test]
    fn grid_blank_rows_do_not_count_as_data() {
        let err =
            records_from_grid("w.xlsx", grid(&[&["Name", "Roll"], &["", ""], &[" "]])).unwrap_err();
        assert!(matches!(err, ReportError::EmptyWorkbook { .. }));
    }

    #[test]
    fn blank_headers_become_positions() {
        let records = records_from_grid("w.xlsx", grid(&[&["Name", ""], &["Asha", "7"]])).unwrap();
        assert_eq!(records[0].get("2"), Some("7"));
    }

    #[test]
    fn garbage_workbook_is_corrupt() {
        let err = parse_workbook("w.xlsx", b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ReportError::CorruptSpreadsheet { .. }), "{err}");
    }

    #[test]
    fn cell_formatting() {
        assert_eq!(cell_to_string(&Data::Float(101.0)), "101");
        assert_eq!(cell_to_string(&Data::Float(7.5)), "7.5");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
        assert_eq!(cell_to_string(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }

    fn date(serial: f64, is_1904: bool) -> String {
        cell_to_string(&Data::DateTime(ExcelDateTime::new(
            serial,
            ExcelDateTimeType::DateTime,
            is_1904,
        )))
    }

    #[test]
    fn excel_serial_dates() {
        assert_eq!(date(45292.0, false), "2024-01-01");
        assert_eq!(date(45292.5, false), "2024-01-01 12:00:00");
    }

    #[test]
    fn workbook_1904_dates_use_their_own_epoch() {
        assert_eq!(date(0.0, true), "1904-01-01");
        assert_eq!(date(43830.0, true), date(45292.0, false));
    }

    #[test]
    fn out_of_range_serials_stay_numbers() {
        assert_eq!(date(1e300, false), 1e300.to_string());
        assert_eq!(date(-1e300, false), (-1e300).to_string());
        assert_eq!(date(f64::NAN, false), "NaN");
    }

    #[test]
    fn duration_cells() {
        let cell = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_to_string(&cell), "36:00:00");
    }

    #[test]
    fn csv_space_only_line_under_wide_header_is_a_warning() {
        let (records, warnings) = parse_csv("r.csv", b"name,roll
Alice,101
   
Bob,102
").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].line, 3);
    }
}
