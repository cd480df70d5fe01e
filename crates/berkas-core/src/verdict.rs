use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnosis::ExtractedDiagnosis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every matching rule's keyword was found (vacuously true when no
    /// rule matched).
    Pass,
    /// At least one matching rule's keyword is missing.
    Fail,
    /// Diagnosis code missing or covered by no rule while rules exist;
    /// keyword verification was intentionally skipped.
    SkippedIrrelevant,
    /// No boundary phrase found; nothing else was checked.
    Aborted,
    Error,
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Pass => write!(f, "PASS"),
            OverallStatus::Fail => write!(f, "FAIL"),
            OverallStatus::SkippedIrrelevant => write!(f, "SKIPPED"),
            OverallStatus::Aborted => write!(f, "ABORTED"),
            OverallStatus::Error => write!(f, "ERROR"),
        }
    }
}

/// Outcome of one display label's scan. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerLabelResult {
    pub label: String,
    pub found: bool,
    pub first_page: Option<usize>,
}

/// Outcome of one matching validation rule. Page numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub required_keyword: String,
    pub satisfied: bool,
    pub page: Option<usize>,
}

/// Per-document result record. Created fresh on every run and never
/// mutated after the orchestrator emits it; a re-run replaces it
/// entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub document_path: PathBuf,
    pub boundary_found: bool,
    pub extracted: ExtractedDiagnosis,
    pub per_label_results: Vec<PerLabelResult>,
    pub rule_checks: Vec<RuleCheck>,
    pub overall_status: OverallStatus,
    /// User-facing detail: abort reason, missing keywords, or error text.
    pub message: String,
}

impl VerificationVerdict {
    /// Terminal ERROR verdict. The worker boundary uses this so a failed
    /// document still yields exactly one result row.
    pub fn error(path: &Path, message: String) -> Self {
        Self {
            document_path: path.to_path_buf(),
            boundary_found: false,
            extracted: ExtractedDiagnosis::default(),
            per_label_results: Vec::new(),
            rule_checks: Vec::new(),
            overall_status: OverallStatus::Error,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(OverallStatus::Pass.to_string(), "PASS");
        assert_eq!(OverallStatus::SkippedIrrelevant.to_string(), "SKIPPED");
    }

    #[test]
    fn test_error_verdict_is_empty_apart_from_message() {
        let v = VerificationVerdict::error(Path::new("a.pdf"), "boom".into());
        assert_eq!(v.overall_status, OverallStatus::Error);
        assert!(v.per_label_results.is_empty());
        assert!(v.rule_checks.is_empty());
        assert!(!v.boundary_found);
        assert_eq!(v.message, "boom");
    }
}
