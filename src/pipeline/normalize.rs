//! Row normalization: raw records or manual entries → [`NormalizedRow`]s.
//!
//! Uploaded files have no enforced schema, so file rows are mapped by column
//! position rather than by name:
//!
//! | position | becomes     |
//! |----------|-------------|
//! | 0        | name        |
//! | 1        | roll number |
//! | 2..      | details (joined with `", "`) |
//!
//! Sequence numbers are always 1-based positions in the final order and are
//! recomputed on every call; nothing stores them.

use crate::model::{ManualEntry, NormalizedRow};
use crate::pipeline::parse::{column_at, RawRecord};

const DETAILS_SEPARATOR: &str = ", ";

/// Map one record to a row with the given sequence number.
pub fn row_from_record(sequence_number: usize, record: &RawRecord) -> NormalizedRow {
    let name = column_at(record, 0).unwrap_or("").trim();
    let roll = column_at(record, 1).unwrap_or("").trim();
    let details = (2..record.len())
        .filter_map(|i| column_at(record, i))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(DETAILS_SEPARATOR);
    NormalizedRow::new(sequence_number, name, roll, details)
}

/// Normalize records in input order, numbering from 1.
pub fn from_records(records: &[RawRecord]) -> Vec<NormalizedRow> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| row_from_record(i + 1, r))
        .collect()
}

/// Normalize accepted manual entries in list order, numbering from 1.
///
/// Remarks stay on the entry; they are not part of the report.
pub fn from_manual<'a>(entries: impl IntoIterator<Item = &'a ManualEntry>) -> Vec<NormalizedRow> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| {
            NormalizedRow::new(
                i + 1,
                e.student_name.trim(),
                e.roll_number.trim(),
                e.details.trim(),
            )
        })
        .collect()
}

/// Re-derive sequence numbers after rows were dropped or reordered.
pub fn renumber(rows: impl IntoIterator<Item = NormalizedRow>) -> Vec<NormalizedRow> {
    rows.into_iter()
        .enumerate()
        .map(|(i, r)| NormalizedRow::new(i + 1, r.name(), r.roll_number(), r.details()))
        .collect()
}
