//! Readiness gate and document assembly.
//!
//! Neither preview nor export may run until a report type is chosen, all six
//! metadata fields are filled, and the active input method has produced at
//! least one row. [`check_readiness`] reports *every* unmet requirement so a
//! caller can tell the teacher exactly what is missing; [`assemble`] refuses
//! to build a [`ReportDocument`] unless the list is empty.

use crate::error::{MissingRequirements, ReportError, Requirement};
use crate::model::{
    AcademicMetadata, InputMethod, InstitutionHeader, NormalizedRow, ReportDocument, ReportType,
};

/// A snapshot of the form: what the teacher has selected right now.
#[derive(Debug, Clone, Copy)]
pub struct ReportRequest<'a> {
    pub report_type: Option<ReportType>,
    pub metadata: &'a AcademicMetadata,
    pub input_method: InputMethod,
    /// Rows produced by the active input method only.
    pub rows: &'a [NormalizedRow],
}

/// Outcome of the readiness gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readiness {
    missing: MissingRequirements,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn missing(&self) -> &MissingRequirements {
        &self.missing
    }

    /// True when rows are the only thing missing.
    pub fn only_rows_missing(&self) -> bool {
        matches!(self.missing.0.as_slice(), [Requirement::Rows(_)])
    }

    /// Human-readable list of the missing categories, empty when ready.
    pub fn message(&self) -> String {
        self.missing.to_string()
    }

    pub fn into_result(self) -> Result<(), ReportError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ReportError::NotReady {
                missing: self.missing,
            })
        }
    }
}

/// Evaluate every readiness rule, in form order.
pub fn check_readiness(request: &ReportRequest<'_>) -> Readiness {
    let mut missing = Vec::new();

    if request.report_type.is_none() {
        missing.push(Requirement::ReportType);
    }

    let empty_fields = request.metadata.missing_fields();
    if !empty_fields.is_empty() {
        missing.push(Requirement::Metadata(empty_fields));
    }

    if request.rows.is_empty() {
        missing.push(Requirement::Rows(request.input_method));
    }

    Readiness {
        missing: MissingRequirements(missing),
    }
}

/// Build a fresh document from the current form, if it is ready.
pub fn assemble(
    request: &ReportRequest<'_>,
    header: &InstitutionHeader,
) -> Result<ReportDocument, ReportError> {
    check_readiness(request).into_result()?;
    let report_type = request
        .report_type
        .ok_or_else(|| ReportError::Internal("readiness passed without a report type".into()))?;

    Ok(ReportDocument {
        header: header.clone(),
        metadata: request.metadata.clone(),
        report_type,
        rows: request.rows.to_vec(),
    })
}
