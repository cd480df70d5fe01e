pub mod csv;
pub mod json;
pub mod table;

use berkas_core::diagnosis::ExtractedDiagnosis;
use berkas_core::verdict::{OverallStatus, VerificationVerdict};

pub(crate) const NOT_FOUND: &str = "not found";

pub(crate) fn format_diagnosis(extracted: &ExtractedDiagnosis) -> String {
    match (&extracted.code, &extracted.description) {
        (Some(code), Some(desc)) if !desc.is_empty() => format!("{code} - {desc}"),
        (Some(code), _) => code.clone(),
        (None, Some(desc)) => desc.clone(),
        (None, None) => NOT_FOUND.to_string(),
    }
}

/// Compact rule-validation summary, shared by the table and CSV views.
pub(crate) fn rule_summary(verdict: &VerificationVerdict) -> String {
    match verdict.overall_status {
        OverallStatus::Pass => "PASS".to_string(),
        OverallStatus::Fail => format!("FAIL ({})", verdict.message),
        OverallStatus::SkippedIrrelevant => "SKIPPED".to_string(),
        OverallStatus::Aborted => format!("ABORTED ({})", verdict.message),
        OverallStatus::Error => format!("ERROR ({})", verdict.message),
    }
}

pub(crate) fn file_name(verdict: &VerificationVerdict) -> String {
    verdict
        .document_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| verdict.document_path.display().to_string())
}
