//! Rule evaluation against an extracted diagnosis code.

use regex::Regex;

use crate::batch::CancelToken;
use crate::error::BerkasError;
use crate::extraction::PageCache;
use crate::rules::schema::ValidationRule;
use crate::verdict::{PerLabelResult, RuleCheck};

/// A rule table with its code patterns compiled, built once per run.
pub struct RuleSet {
    compiled: Vec<(ValidationRule, Regex)>,
}

impl RuleSet {
    pub fn compile(rules: &[ValidationRule]) -> Result<Self, BerkasError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = crate::rules::compile_pattern(&rule.code_pattern)?;
            compiled.push((rule.clone(), regex));
        }
        Ok(Self { compiled })
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Rules whose pattern matches the code, in table order. Every match
    /// is evaluated, not just the first.
    pub fn matching<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ValidationRule> {
        self.compiled
            .iter()
            .filter(move |(_, regex)| regex.is_match(code))
            .map(|(rule, _)| rule)
    }

    pub fn matches_any(&self, code: &str) -> bool {
        self.matching(code).next().is_some()
    }
}

/// Evaluate every rule matching `code`. A rule whose required keyword is
/// also a display label reuses the keyword matcher's answer; otherwise
/// the document is scanned back to front for the keyword.
pub fn evaluate(
    ruleset: &RuleSet,
    code: &str,
    label_results: &[PerLabelResult],
    cache: &mut PageCache<'_>,
    cancel: &CancelToken,
) -> Result<Vec<RuleCheck>, BerkasError> {
    let mut checks = Vec::new();
    for rule in ruleset.matching(code) {
        let keyword_lower = rule.required_keyword.to_lowercase();
        let from_labels = label_results
            .iter()
            .find(|r| r.label.to_lowercase() == keyword_lower);

        let (satisfied, page) = match from_labels {
            Some(result) => (result.found, result.first_page),
            None => match find_keyword_reverse(rule, cache, cancel)? {
                Some(page) => (true, Some(page)),
                None => (false, None),
            },
        };

        checks.push(RuleCheck {
            required_keyword: rule.required_keyword.clone(),
            satisfied,
            page,
        });
    }
    Ok(checks)
}

/// Last page to first; returns the 1-based page of the first hit.
fn find_keyword_reverse(
    rule: &ValidationRule,
    cache: &mut PageCache<'_>,
    cancel: &CancelToken,
) -> Result<Option<usize>, BerkasError> {
    let needles: Vec<String> = rule
        .keyword_alternatives()
        .map(|alt| alt.to_lowercase())
        .collect();

    for page in (0..cache.page_count()).rev() {
        if cancel.is_cancelled() {
            return Err(BerkasError::Cancelled);
        }
        let text = cache.text(page)?.to_lowercase();
        if needles.iter().any(|needle| text.contains(needle)) {
            return Ok(Some(page + 1));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PageTextProvider;

    struct PagesProvider {
        pages: Vec<String>,
    }

    impl PagesProvider {
        fn new(pages: &[&str]) -> Self {
            Self {
                pages: pages.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl PageTextProvider for PagesProvider {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&mut self, page_index: usize) -> Result<String, BerkasError> {
            Ok(self.pages[page_index].clone())
        }
    }

    fn heart_rules() -> RuleSet {
        RuleSet::compile(&[
            ValidationRule::new("i50.*|i11.0|i13.2|i13.0", "echo|echocardiography"),
            ValidationRule::new("j44.*", "spirometri"),
        ])
        .unwrap()
    }

    #[test]
    fn test_matching_is_unanchored_and_case_insensitive() {
        let rules = heart_rules();
        assert!(rules.matches_any("I50.2"));
        assert!(rules.matches_any("i50"));
        assert!(!rules.matches_any("E11.9"));
    }

    #[test]
    fn test_all_matching_rules_evaluated() {
        let rules = RuleSet::compile(&[
            ValidationRule::new("i50.*", "echo"),
            ValidationRule::new("i5.*", "thorax"),
        ])
        .unwrap();
        let mut provider = PagesProvider::new(&["echo dan thorax"]);
        let mut cache = PageCache::new(&mut provider);
        let checks = evaluate(&rules, "I50.2", &[], &mut cache, &CancelToken::new()).unwrap();
        assert_eq!(checks.len(), 2);
    }

    #[test]
    fn test_reverse_scan_finds_last_page_first() {
        let rules = heart_rules();
        let mut provider = PagesProvider::new(&[
            "hasil echocardiography awal",
            "halaman kosong",
            "terlampir echo kontrol",
        ]);
        let mut cache = PageCache::new(&mut provider);
        let checks = evaluate(&rules, "I50.2", &[], &mut cache, &CancelToken::new()).unwrap();
        assert_eq!(checks.len(), 1);
        assert!(checks[0].satisfied);
        // Scanned last to first, so page 3 wins over page 1.
        assert_eq!(checks[0].page, Some(3));
    }

    #[test]
    fn test_missing_keyword_fails_check() {
        let rules = heart_rules();
        let mut provider = PagesProvider::new(&["tidak ada pemeriksaan jantung"]);
        let mut cache = PageCache::new(&mut provider);
        let checks = evaluate(&rules, "I50.2", &[], &mut cache, &CancelToken::new()).unwrap();
        assert!(!checks[0].satisfied);
        assert_eq!(checks[0].page, None);
        assert_eq!(checks[0].required_keyword, "echo|echocardiography");
    }

    #[test]
    fn test_label_result_reused_over_page_scan() {
        let rules = RuleSet::compile(&[ValidationRule::new("j1[3-8].*", "thorax")]).unwrap();
        // The keyword appears on pages 2 and 5; the matcher already
        // answered with page 2, so no reverse scan may override it.
        let mut provider =
            PagesProvider::new(&["x", "foto thorax", "x", "x", "thorax ulang"]);
        let mut cache = PageCache::new(&mut provider);
        let labels = vec![PerLabelResult {
            label: "Thorax".into(),
            found: true,
            first_page: Some(2),
        }];
        let checks = evaluate(&rules, "J18.9", &labels, &mut cache, &CancelToken::new()).unwrap();
        assert_eq!(checks[0].page, Some(2));
    }

    #[test]
    fn test_keyword_alternatives_any_hit_satisfies() {
        let rules = heart_rules();
        let mut provider = PagesProvider::new(&["echo jantung normal"]);
        let mut cache = PageCache::new(&mut provider);
        let checks = evaluate(&rules, "i11.0", &[], &mut cache, &CancelToken::new()).unwrap();
        assert!(checks[0].satisfied);
    }

    #[test]
    fn test_non_matching_code_produces_no_checks() {
        let rules = heart_rules();
        let mut provider = PagesProvider::new(&["echo"]);
        let mut cache = PageCache::new(&mut provider);
        let checks = evaluate(&rules, "E11.9", &[], &mut cache, &CancelToken::new()).unwrap();
        assert!(checks.is_empty());
    }
}
