pub mod batch;
pub mod boundary;
pub mod diagnosis;
pub mod error;
pub mod extraction;
pub mod keywords;
pub mod rules;
pub mod verdict;

use std::path::Path;

use batch::{BatchObserver, CancelToken};
use boundary::{BoundaryConfig, BoundaryLocator, ScanMode};
use diagnosis::{DiagnosisExtractor, ExtractedDiagnosis, LineExtractor, FINAL_KEYWORD};
use error::BerkasError;
use extraction::{PageCache, PageTextProvider};
use keywords::KeywordSpec;
use rules::evaluate::RuleSet;
use rules::schema::ValidationRule;
use verdict::{OverallStatus, VerificationVerdict};

/// Everything a worker needs to verify one document. Read-only for the
/// duration of a batch run; edits are only permitted between runs.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub keywords: Vec<KeywordSpec>,
    pub rules: Vec<ValidationRule>,
    pub boundary: BoundaryConfig,
}

/// Verify a single document end to end: boundary scan, diagnosis
/// extraction, keyword matching, rule evaluation.
///
/// Fatal errors bubble up; the batch layer folds them into an ERROR
/// verdict so the document still yields a result row. Boundary-not-found
/// and irrelevant-code outcomes are verdicts, not errors.
pub fn verify_document(
    path: &Path,
    provider: &mut dyn PageTextProvider,
    options: &VerifyOptions,
    cancel: &CancelToken,
    observer: &dyn BatchObserver,
) -> Result<VerificationVerdict, BerkasError> {
    let locator = BoundaryLocator::new(&options.boundary)?;
    let ruleset = RuleSet::compile(&options.rules)?;
    let mut cache = PageCache::new(provider);

    let window = locator.locate(&mut cache, cancel)?;
    if matches!(options.boundary.mode, ScanMode::ForwardTrigger) && !window.boundary_found {
        tracing::debug!(path = %path.display(), "no boundary phrase, aborting document");
        return Ok(VerificationVerdict {
            document_path: path.to_path_buf(),
            boundary_found: false,
            extracted: ExtractedDiagnosis::default(),
            per_label_results: Vec::new(),
            rule_checks: Vec::new(),
            overall_status: OverallStatus::Aborted,
            message: format!(
                "no boundary phrase found (looked for: {})",
                options.boundary.trigger_phrases.join(", ")
            ),
        });
    }

    let extracted = extract_diagnosis(&options.boundary.mode, &window.pages, &mut cache)?;

    // With rules configured, a document whose code is missing or covered
    // by no rule skips the keyword scan cost entirely.
    if !ruleset.is_empty() {
        let relevant = extracted
            .code
            .as_deref()
            .map(|code| ruleset.matches_any(code))
            .unwrap_or(false);
        if !relevant {
            return Ok(VerificationVerdict {
                document_path: path.to_path_buf(),
                boundary_found: window.boundary_found,
                extracted,
                per_label_results: Vec::new(),
                rule_checks: Vec::new(),
                overall_status: OverallStatus::SkippedIrrelevant,
                message: "diagnosis code not covered by the rule table".into(),
            });
        }
    }

    let groups = keywords::group_by_label(&options.keywords);
    let mut on_match = |label: &str, page: usize| observer.on_match_found(path, label, page);
    let per_label_results =
        keywords::match_keywords(&groups, &window.pages, &mut cache, cancel, &mut on_match)?;

    let rule_checks = match extracted.code.as_deref() {
        Some(code) => rules::evaluate::evaluate(
            &ruleset,
            code,
            &per_label_results,
            &mut cache,
            cancel,
        )?,
        None => Vec::new(),
    };

    let missing: Vec<&str> = rule_checks
        .iter()
        .filter(|check| !check.satisfied)
        .map(|check| check.required_keyword.as_str())
        .collect();
    let (overall_status, message) = if missing.is_empty() {
        (OverallStatus::Pass, String::new())
    } else {
        (
            OverallStatus::Fail,
            format!("missing required keyword(s): {}", missing.join(", ")),
        )
    };

    Ok(VerificationVerdict {
        document_path: path.to_path_buf(),
        boundary_found: window.boundary_found,
        extracted,
        per_label_results,
        rule_checks,
        overall_status,
        message,
    })
}

/// Forward mode reads the diagnosis block from the first page; reverse
/// mode extracts the "Diagnosa Akhir" line from the accumulated window
/// and then applies the code/description split to it.
fn extract_diagnosis(
    mode: &ScanMode,
    window: &[usize],
    cache: &mut PageCache<'_>,
) -> Result<ExtractedDiagnosis, BerkasError> {
    let extractor = DiagnosisExtractor::new();
    match mode {
        ScanMode::ForwardTrigger => {
            if cache.page_count() == 0 {
                return Ok(ExtractedDiagnosis::default());
            }
            Ok(extractor.extract(cache.text(0)?))
        }
        ScanMode::ReverseAccumulate { .. } => {
            let mut buffer = String::new();
            for &page in window {
                buffer.push_str(cache.text(page)?);
                buffer.push('\n');
            }
            match LineExtractor::new(FINAL_KEYWORD)?.extract(&buffer) {
                Some(line) => Ok(extractor.split_block(line.trim())),
                None => Ok(ExtractedDiagnosis::default()),
            }
        }
    }
}
