//! Keyword configuration and per-label matching.
//!
//! The keyword list is an ordered sequence of (search text, display
//! label) pairs, persisted as JSON pairs. Several search texts may share
//! one display label; the distinct labels, in first-seen order, are the
//! columns of the verification table.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::batch::CancelToken;
use crate::error::BerkasError;
use crate::extraction::PageCache;
use crate::verdict::PerLabelResult;

/// One search entry: the text looked for in the document and the label
/// it reports under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct KeywordSpec {
    pub search_text: String,
    pub display_label: String,
}

impl KeywordSpec {
    pub fn new(search_text: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            display_label: display_label.into(),
        }
    }
}

impl From<(String, String)> for KeywordSpec {
    fn from((search_text, display_label): (String, String)) -> Self {
        Self {
            search_text,
            display_label,
        }
    }
}

impl From<KeywordSpec> for (String, String) {
    fn from(spec: KeywordSpec) -> Self {
        (spec.search_text, spec.display_label)
    }
}

/// Load the keyword list. A missing file is an empty list; a corrupt
/// file is an error naming the path.
pub fn load_keywords(path: &Path) -> Result<Vec<KeywordSpec>, BerkasError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| BerkasError::KeywordLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let keywords: Vec<KeywordSpec> =
        serde_json::from_str(&content).map_err(|e| BerkasError::KeywordLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_keywords(&keywords)?;
    Ok(keywords)
}

/// Rewrite the keyword list file.
pub fn save_keywords(path: &Path, keywords: &[KeywordSpec]) -> Result<(), BerkasError> {
    let json = serde_json::to_string_pretty(keywords)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Search texts must be case-insensitively unique. Enforced here, at
/// load/edit time, never during matching.
pub fn validate_keywords(keywords: &[KeywordSpec]) -> Result<(), BerkasError> {
    let mut seen = HashSet::new();
    for kw in keywords {
        if kw.search_text.trim().is_empty() || kw.display_label.trim().is_empty() {
            return Err(BerkasError::KeywordInvalid(
                "search text and display label must not be empty".into(),
            ));
        }
        if !seen.insert(kw.search_text.to_lowercase()) {
            return Err(BerkasError::KeywordInvalid(format!(
                "duplicate search text '{}'",
                kw.search_text
            )));
        }
    }
    Ok(())
}

/// Append a keyword, rejecting a search text already in the list.
pub fn add_keyword(keywords: &mut Vec<KeywordSpec>, spec: KeywordSpec) -> Result<(), BerkasError> {
    if spec.search_text.trim().is_empty() || spec.display_label.trim().is_empty() {
        return Err(BerkasError::KeywordInvalid(
            "search text and display label must not be empty".into(),
        ));
    }
    let lowered = spec.search_text.to_lowercase();
    if keywords
        .iter()
        .any(|k| k.search_text.to_lowercase() == lowered)
    {
        return Err(BerkasError::KeywordInvalid(format!(
            "search text '{}' already present",
            spec.search_text
        )));
    }
    keywords.push(spec);
    Ok(())
}

/// Distinct display labels in first-seen order.
pub fn display_labels(keywords: &[KeywordSpec]) -> Vec<String> {
    let mut labels = Vec::new();
    let mut seen = HashSet::new();
    for kw in keywords {
        if seen.insert(kw.display_label.clone()) {
            labels.push(kw.display_label.clone());
        }
    }
    labels
}

/// Search texts grouped under their shared display label, label order
/// preserved.
#[derive(Debug, Clone)]
pub struct LabelGroup {
    pub label: String,
    pub search_texts: Vec<String>,
}

pub fn group_by_label(keywords: &[KeywordSpec]) -> Vec<LabelGroup> {
    let mut groups: Vec<LabelGroup> = Vec::new();
    for kw in keywords {
        match groups.iter_mut().find(|g| g.label == kw.display_label) {
            Some(group) => group.search_texts.push(kw.search_text.clone()),
            None => groups.push(LabelGroup {
                label: kw.display_label.clone(),
                search_texts: vec![kw.search_text.clone()],
            }),
        }
    }
    groups
}

/// Scan the window once per label, stopping at the first page where any
/// of the label's search texts occurs as a case-insensitive substring.
/// `on_match` fires once per label, when it is first satisfied.
pub fn match_keywords(
    groups: &[LabelGroup],
    window: &[usize],
    cache: &mut PageCache<'_>,
    cancel: &CancelToken,
    on_match: &mut dyn FnMut(&str, usize),
) -> Result<Vec<PerLabelResult>, BerkasError> {
    let mut results = Vec::with_capacity(groups.len());
    for group in groups {
        let needles: Vec<String> = group
            .search_texts
            .iter()
            .map(|s| s.to_lowercase())
            .collect();

        let mut result = PerLabelResult {
            label: group.label.clone(),
            found: false,
            first_page: None,
        };
        for &page in window {
            if cancel.is_cancelled() {
                return Err(BerkasError::Cancelled);
            }
            let text = cache.text(page)?.to_lowercase();
            if needles.iter().any(|needle| text.contains(needle)) {
                result.found = true;
                result.first_page = Some(page + 1);
                on_match(&group.label, page + 1);
                break;
            }
        }
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::PageTextProvider;

    struct PagesProvider {
        pages: Vec<String>,
    }

    impl PageTextProvider for PagesProvider {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&mut self, page_index: usize) -> Result<String, BerkasError> {
            Ok(self.pages[page_index].clone())
        }
    }

    fn specs() -> Vec<KeywordSpec> {
        vec![
            KeywordSpec::new("Prosedur Non-Bedah", "Non-Bedah"),
            KeywordSpec::new("tindakan non bedah", "Non-Bedah"),
            KeywordSpec::new("hasil laboratorium", "Lab"),
        ]
    }

    #[test]
    fn test_display_labels_first_seen_order() {
        assert_eq!(display_labels(&specs()), vec!["Non-Bedah", "Lab"]);
    }

    #[test]
    fn test_group_by_label_collects_shared_labels() {
        let groups = group_by_label(&specs());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].search_texts.len(), 2);
        assert_eq!(groups[1].search_texts, vec!["hasil laboratorium"]);
    }

    #[test]
    fn test_validate_rejects_case_insensitive_duplicate() {
        let mut list = specs();
        list.push(KeywordSpec::new("PROSEDUR NON-BEDAH", "Other"));
        assert!(validate_keywords(&list).is_err());
    }

    #[test]
    fn test_add_rejects_duplicate_search_text() {
        let mut list = specs();
        let err = add_keyword(&mut list, KeywordSpec::new("HASIL LABORATORIUM", "Lab2"));
        assert!(err.is_err());
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_add_rejects_empty_fields() {
        let mut list = Vec::new();
        assert!(add_keyword(&mut list, KeywordSpec::new("  ", "Label")).is_err());
        assert!(add_keyword(&mut list, KeywordSpec::new("text", "")).is_err());
    }

    #[test]
    fn test_serde_round_trips_as_pairs() {
        let json = r#"[["Prosedur Non-Bedah", "Non-Bedah"]]"#;
        let list: Vec<KeywordSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(list[0].search_text, "Prosedur Non-Bedah");
        assert_eq!(list[0].display_label, "Non-Bedah");

        let back = serde_json::to_string(&list).unwrap();
        assert_eq!(back, r#"[["Prosedur Non-Bedah","Non-Bedah"]]"#);
    }

    #[test]
    fn test_match_stops_at_first_page_per_label() {
        let mut provider = PagesProvider {
            pages: vec![
                "nothing".into(),
                "PROSEDUR NON-BEDAH dilakukan".into(),
                "tindakan non bedah lagi, hasil laboratorium".into(),
            ],
        };
        let mut cache = PageCache::new(&mut provider);
        let groups = group_by_label(&specs());
        let mut notifications = Vec::new();
        let results = match_keywords(
            &groups,
            &[0, 1, 2],
            &mut cache,
            &CancelToken::new(),
            &mut |label, page| notifications.push((label.to_string(), page)),
        )
        .unwrap();

        assert_eq!(results[0].first_page, Some(2));
        assert_eq!(results[1].first_page, Some(3));
        assert_eq!(
            notifications,
            vec![("Non-Bedah".to_string(), 2), ("Lab".to_string(), 3)]
        );
    }

    #[test]
    fn test_match_respects_window() {
        let mut provider = PagesProvider {
            pages: vec!["hasil laboratorium".into(), "nothing".into()],
        };
        let mut cache = PageCache::new(&mut provider);
        let groups = group_by_label(&specs());
        // Window starts after the only matching page.
        let results = match_keywords(
            &groups,
            &[1],
            &mut cache,
            &CancelToken::new(),
            &mut |_, _| {},
        )
        .unwrap();
        assert!(!results[1].found);
        assert_eq!(results[1].first_page, None);
    }

    #[test]
    fn test_load_missing_file_is_empty_list() {
        let list = load_keywords(Path::new("/nonexistent/keywords.json")).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        save_keywords(&path, &specs()).unwrap();
        let loaded = load_keywords(&path).unwrap();
        assert_eq!(loaded, specs());
    }
}
