//! Domain types shared by every pipeline stage.
//!
//! [`NormalizedRow`] is the hinge of the crate: both the preview and the PDF
//! renderer consume it, and it is only ever produced by
//! [`crate::pipeline::normalize`]. Everything upstream of it (raw records,
//! manual entries) is schema-less or user-typed; everything downstream can
//! rely on four string-valued columns and a 1-based sequence number.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Report type ──────────────────────────────────────────────────────────

/// The seven report kinds a teacher can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportType {
    StudentParticipation,
    StudentAchievement,
    CallRecord,
    IssueRaised,
    StudentComplete,
    SubjectAttendance,
    SubjectMarks,
}

impl ReportType {
    pub const ALL: [ReportType; 7] = [
        ReportType::StudentParticipation,
        ReportType::StudentAchievement,
        ReportType::CallRecord,
        ReportType::IssueRaised,
        ReportType::StudentComplete,
        ReportType::SubjectAttendance,
        ReportType::SubjectMarks,
    ];

    /// The slug used in forms, file names and the PDF header.
    pub fn slug(self) -> &'static str {
        match self {
            ReportType::StudentParticipation => "student-participation",
            ReportType::StudentAchievement => "student-achievement",
            ReportType::CallRecord => "call-record",
            ReportType::IssueRaised => "issue-raised",
            ReportType::StudentComplete => "student-complete",
            ReportType::SubjectAttendance => "subject-attendance",
            ReportType::SubjectMarks => "subject-marks",
        }
    }

    /// Human-readable name shown in the report type picker.
    pub fn label(self) -> &'static str {
        match self {
            ReportType::StudentParticipation => "Student Participation Details",
            ReportType::StudentAchievement => "Student Achievement Detail",
            ReportType::CallRecord => "Call Record",
            ReportType::IssueRaised => "Issue Raised",
            ReportType::StudentComplete => "Student Complete Detail",
            ReportType::SubjectAttendance => "Subject Wise Attendance",
            ReportType::SubjectMarks => "Subject Wise FA/ST Marks",
        }
    }

    /// Label of the free-text details field when entering students by hand.
    pub fn details_label(self) -> &'static str {
        match self {
            ReportType::StudentParticipation => "Participation Details",
            ReportType::StudentAchievement => "Achievement Details",
            ReportType::CallRecord => "Call Details",
            ReportType::IssueRaised => "Issue Description",
            ReportType::StudentComplete => "Complete Details",
            ReportType::SubjectAttendance => "Attendance Details",
            ReportType::SubjectMarks => "Marks Details",
        }
    }
}

/// Details label for an optional selection; "Details" before a type is chosen.
pub fn details_label(report_type: Option<ReportType>) -> &'static str {
    report_type.map(ReportType::details_label).unwrap_or("Details")
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ReportType {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ReportType::ALL
            .into_iter()
            .find(|t| t.slug() == s)
            .ok_or_else(|| ReportError::UnknownReportType(s.to_string()))
    }
}

// ── Academic metadata ────────────────────────────────────────────────────

/// Fixed department line printed above every report.
pub const DEPARTMENT: &str = "Department of Computer Science and Engineering";

/// Fixed institution line printed above every report.
pub const INSTITUTION: &str = "Chitkara University Institute of Engineering & Technology";

/// The six user-selected classification fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataField {
    Program,
    Batch,
    AcademicYear,
    Group,
    Session,
    Semester,
}

impl MetadataField {
    pub const ALL: [MetadataField; 6] = [
        MetadataField::Program,
        MetadataField::Batch,
        MetadataField::AcademicYear,
        MetadataField::Group,
        MetadataField::Session,
        MetadataField::Semester,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetadataField::Program => "Program",
            MetadataField::Batch => "Batch",
            MetadataField::AcademicYear => "Academic Year",
            MetadataField::Group => "Group",
            MetadataField::Session => "Session",
            MetadataField::Semester => "Semester",
        }
    }

    /// The key used in forms and JSON (`academicYear`, …).
    pub fn key(self) -> &'static str {
        match self {
            MetadataField::Program => "program",
            MetadataField::Batch => "batch",
            MetadataField::AcademicYear => "academicYear",
            MetadataField::Group => "group",
            MetadataField::Session => "session",
            MetadataField::Semester => "semester",
        }
    }

    /// `(value, label)` pairs offered by the metadata form.
    pub fn options(self) -> &'static [(&'static str, &'static str)] {
        match self {
            MetadataField::Program => &[
                ("be-cse-ai", "B.E. CSE (AI)"),
                ("be-cse-ml", "B.E. CSE (ML)"),
                ("be-cse-general", "B.E. CSE (General)"),
            ],
            MetadataField::Batch => &[
                ("2022", "2022"),
                ("2023", "2023"),
                ("2024", "2024"),
                ("2025", "2025"),
            ],
            MetadataField::AcademicYear => &[
                ("2022-2023", "2022–2023"),
                ("2023-2024", "2023–2024"),
                ("2024-2025", "2024–2025"),
            ],
            MetadataField::Group => &[("4A", "4A"), ("4B", "4B"), ("4C", "4C")],
            MetadataField::Session => &[
                ("jan-june-2024", "Jan–June 2024"),
                ("july-dec-2024", "July–Dec 2024"),
                ("jan-june-2025", "Jan–June 2025"),
            ],
            MetadataField::Semester => &[
                ("1", "1st Semester"),
                ("2", "2nd Semester"),
                ("3", "3rd Semester"),
                ("4", "4th Semester"),
                ("5", "5th Semester"),
                ("6", "6th Semester"),
                ("7", "7th Semester"),
                ("8", "8th Semester"),
            ],
        }
    }

    /// Whether `value` is one of the catalogued options.
    pub fn is_known_value(self, value: &str) -> bool {
        self.options().iter().any(|(v, _)| *v == value)
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetadataField {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], "").to_ascii_lowercase();
        MetadataField::ALL
            .into_iter()
            .find(|f| f.key().to_ascii_lowercase() == wanted)
            .ok_or_else(|| ReportError::UnknownMetadataField(s.trim().to_string()))
    }
}

/// Program, batch, academic year, group, session and semester.
///
/// Department and institution are constants ([`DEPARTMENT`],
/// [`INSTITUTION`]), overridable through [`crate::config::ReportConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcademicMetadata {
    pub program: String,
    pub batch: String,
    pub academic_year: String,
    pub group: String,
    pub session: String,
    pub semester: String,
}

impl AcademicMetadata {
    pub fn get(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Program => &self.program,
            MetadataField::Batch => &self.batch,
            MetadataField::AcademicYear => &self.academic_year,
            MetadataField::Group => &self.group,
            MetadataField::Session => &self.session,
            MetadataField::Semester => &self.semester,
        }
    }

    pub fn set(&mut self, field: MetadataField, value: impl Into<String>) {
        let slot = match field {
            MetadataField::Program => &mut self.program,
            MetadataField::Batch => &mut self.batch,
            MetadataField::AcademicYear => &mut self.academic_year,
            MetadataField::Group => &mut self.group,
            MetadataField::Session => &mut self.session,
            MetadataField::Semester => &mut self.semester,
        };
        *slot = value.into();
    }

    /// Builder-style variant of [`AcademicMetadata::set`].
    pub fn with(mut self, field: MetadataField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Fields that are empty or whitespace-only, in form order.
    pub fn missing_fields(&self) -> Vec<MetadataField> {
        MetadataField::ALL
            .into_iter()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

// ── Input ────────────────────────────────────────────────────────────────

/// Which of the two data sources feeds the report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    #[default]
    File,
    Manual,
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMethod::File => f.write_str("file"),
            InputMethod::Manual => f.write_str("manual"),
        }
    }
}

/// One student typed in by hand.
///
/// `remarks` is shown in the entry list only; it never reaches the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualEntry {
    pub student_name: String,
    pub roll_number: String,
    pub details: String,
    pub remarks: String,
}

impl ManualEntry {
    pub fn new(student_name: impl Into<String>, roll_number: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            roll_number: roll_number.into(),
            ..Self::default()
        }
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    /// Reject entries without a name or roll number.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.student_name.trim().is_empty() {
            return Err(ReportError::MissingRequiredField {
                field: "studentName".into(),
            });
        }
        if self.roll_number.trim().is_empty() {
            return Err(ReportError::MissingRequiredField {
                field: "rollNumber".into(),
            });
        }
        Ok(())
    }
}

/// Stable handle for removing a manual entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

/// Append-only list of accepted manual entries.
///
/// Positions are never stored: sequence numbers come from iteration order
/// whenever rows are derived, so removal needs no renumbering pass.
#[derive(Debug, Clone, Default)]
pub struct ManualEntryList {
    next_id: u64,
    entries: Vec<(EntryId, ManualEntry)>,
}

impl ManualEntryList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append. A rejected entry leaves the list untouched.
    pub fn add(&mut self, entry: ManualEntry) -> Result<EntryId, ReportError> {
        entry.validate()?;
        self.next_id += 1;
        let id = EntryId(self.next_id);
        self.entries.push((id, entry));
        Ok(id)
    }

    /// Remove by id; returns the removed entry if it existed.
    pub fn remove(&mut self, id: EntryId) -> Option<ManualEntry> {
        let pos = self.entries.iter().position(|(eid, _)| *eid == id)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(EntryId, ManualEntry)> {
        self.entries.iter()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ManualEntry> {
        self.entries.iter().map(|(_, e)| e)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ── Normalized rows and the document ─────────────────────────────────────

/// The uniform four-column record rendered by preview and PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    sequence_number: usize,
    name: String,
    roll_number: String,
    details: String,
}

impl NormalizedRow {
    pub(crate) fn new(
        sequence_number: usize,
        name: impl Into<String>,
        roll_number: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        debug_assert!(sequence_number >= 1);
        Self {
            sequence_number,
            name: name.into(),
            roll_number: roll_number.into(),
            details: details.into(),
        }
    }

    pub fn sequence_number(&self) -> usize {
        self.sequence_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roll_number(&self) -> &str {
        &self.roll_number
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    /// The four table cells in column order.
    pub fn cells(&self) -> [String; 4] {
        [
            self.sequence_number.to_string(),
            self.name.clone(),
            self.roll_number.clone(),
            self.details.clone(),
        ]
    }
}

/// Table column headings, identical in preview and PDF.
pub const TABLE_COLUMNS: [&str; 4] = ["S.No.", "Student Name", "Roll Number", "Details"];

/// Department and institution lines printed above the metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstitutionHeader {
    pub department: String,
    pub institution: String,
}

impl Default for InstitutionHeader {
    fn default() -> Self {
        Self {
            department: DEPARTMENT.to_string(),
            institution: INSTITUTION.to_string(),
        }
    }
}

/// Everything a renderer needs, built fresh per preview or export.
///
/// Only [`crate::pipeline::assemble::assemble`] constructs one, and only
/// after the readiness gate passes, so `rows` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub(crate) header: InstitutionHeader,
    pub(crate) metadata: AcademicMetadata,
    pub(crate) report_type: ReportType,
    pub(crate) rows: Vec<NormalizedRow>,
}

impl ReportDocument {
    pub fn header(&self) -> &InstitutionHeader {
        &self.header
    }

    pub fn metadata(&self) -> &AcademicMetadata {
        &self.metadata
    }

    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    /// Metadata lines for the left and right header columns.
    pub fn metadata_columns(&self) -> (Vec<(&'static str, String)>, Vec<(&'static str, String)>) {
        let m = &self.metadata;
        let left = vec![
            ("Report Type", self.report_type.slug().to_string()),
            ("Program", m.program.clone()),
            ("Batch", m.batch.clone()),
            ("Academic Year", m.academic_year.clone()),
        ];
        let right = vec![
            ("Group", m.group.clone()),
            ("Session", m.session.clone()),
            ("Semester", m.semester.clone()),
        ];
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_type_slug_round_trips() {
        for t in ReportType::ALL {
            assert_eq!(t.slug().parse::<ReportType>().unwrap(), t);
        }
        assert!("".parse::<ReportType>().is_err());
        assert!("weekly-digest".parse::<ReportType>().is_err());
    }

    #[test]
    fn details_label_defaults_without_type() {
        assert_eq!(details_label(None), "Details");
        assert_eq!(
            details_label(Some(ReportType::IssueRaised)),
            "Issue Description"
        );
    }

    #[test]
    fn metadata_field_parses_loose_keys() {
        assert_eq!(
            "academic-year".parse::<MetadataField>().unwrap(),
            MetadataField::AcademicYear
        );
        assert_eq!(
            "academicYear".parse::<MetadataField>().unwrap(),
            MetadataField::AcademicYear
        );
        let err = "department".parse::<MetadataField>().unwrap_err();
        assert!(matches!(err, ReportError::UnknownMetadataField(ref f) if f == "department"));
        assert_eq!(err.to_string(), "Unknown metadata field 'department'");
    }

    #[test]
    fn whitespace_metadata_counts_as_missing() {
        let m = AcademicMetadata::default()
            .with(MetadataField::Program, "be-cse-ai")
            .with(MetadataField::Batch, "   ");
        let missing = m.missing_fields();
        assert_eq!(missing.len(), 5);
        assert!(missing.contains(&MetadataField::Batch));
        assert!(!m.is_complete());
    }

    #[test]
    fn semester_catalogue_has_eight_options() {
        assert_eq!(MetadataField::Semester.options().len(), 8);
        assert!(MetadataField::Group.is_known_value("4B"));
        assert!(!MetadataField::Group.is_known_value("5Z"));
    }

    #[test]
    fn rejected_entry_leaves_list_unchanged() {
        let mut list = ManualEntryList::new();
        list.add(ManualEntry::new("Alice", "101")).unwrap();
        assert!(list.add(ManualEntry::new("", "102")).is_err());
        assert!(list.add(ManualEntry::new("Bob", " ")).is_err());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn remove_by_id() {
        let mut list = ManualEntryList::new();
        let a = list.add(ManualEntry::new("Alice", "101")).unwrap();
        let b = list.add(ManualEntry::new("Bob", "102")).unwrap();
        assert_ne!(a, b);
        assert_eq!(list.remove(a).map(|e| e.student_name), Some("Alice".into()));
        assert!(list.remove(a).is_none());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn manual_entry_json_uses_camel_case() {
        let e: ManualEntry =
            serde_json::from_str(r#"{"studentName":"Ravi","rollNumber":"2210"}"#).unwrap();
        assert_eq!(e.student_name, "Ravi");
        assert_eq!(e.details, "");
    }
}
