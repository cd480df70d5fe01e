//! Scan-window establishment: which pages of a document the keyword and
//! rule checks are allowed to look at.

use regex::{Regex, RegexBuilder};

use crate::batch::CancelToken;
use crate::error::BerkasError;
use crate::extraction::PageCache;

/// Default forward-trigger phrases marking the start of the clinically
/// relevant region (the inpatient admission request and its aliases, as
/// the forms spell them).
pub const DEFAULT_TRIGGER_PHRASES: &[&str] = &[
    "kriteria discharge planing",
    "rm 29",
    "permintaan rawat inap",
    "discharge planing",
];

/// Default stop keyword for reverse-accumulate scans.
pub const DEFAULT_STOP_KEYWORD: &str = "SEP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMode {
    /// Scan pages front to back; the first page matching a trigger phrase
    /// starts the window. No trigger means the document is aborted.
    ForwardTrigger,
    /// Accumulate pages until the stop keyword is seen; the keyword's
    /// page is still part of the window. `from_bottom` selects whether
    /// pages are visited last-to-first.
    ReverseAccumulate { from_bottom: bool },
}

#[derive(Debug, Clone)]
pub struct BoundaryConfig {
    pub mode: ScanMode,
    pub trigger_phrases: Vec<String>,
    pub stop_keyword: String,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::ForwardTrigger,
            trigger_phrases: DEFAULT_TRIGGER_PHRASES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            stop_keyword: DEFAULT_STOP_KEYWORD.to_string(),
        }
    }
}

/// The pages selected for matching, always in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWindow {
    /// Zero-based page indices.
    pub pages: Vec<usize>,
    pub boundary_found: bool,
    /// Zero-based page where the trigger or stop keyword was seen.
    pub boundary_page: Option<usize>,
}

#[derive(Debug)]
pub struct BoundaryLocator {
    mode: ScanMode,
    trigger: Regex,
    stop_keyword: String,
}

impl BoundaryLocator {
    pub fn new(config: &BoundaryConfig) -> Result<Self, BerkasError> {
        Ok(Self {
            mode: config.mode.clone(),
            trigger: compile_trigger(&config.trigger_phrases)?,
            stop_keyword: config.stop_keyword.to_lowercase(),
        })
    }

    pub fn locate(
        &self,
        cache: &mut PageCache<'_>,
        cancel: &CancelToken,
    ) -> Result<ScanWindow, BerkasError> {
        match self.mode {
            ScanMode::ForwardTrigger => self.locate_forward(cache, cancel),
            ScanMode::ReverseAccumulate { from_bottom } => {
                self.accumulate(cache, from_bottom, cancel)
            }
        }
    }

    fn locate_forward(
        &self,
        cache: &mut PageCache<'_>,
        cancel: &CancelToken,
    ) -> Result<ScanWindow, BerkasError> {
        for page in 0..cache.page_count() {
            if cancel.is_cancelled() {
                return Err(BerkasError::Cancelled);
            }
            if self.trigger.is_match(cache.text(page)?) {
                return Ok(ScanWindow {
                    pages: (page..cache.page_count()).collect(),
                    boundary_found: true,
                    boundary_page: Some(page),
                });
            }
        }
        Ok(ScanWindow {
            pages: Vec::new(),
            boundary_found: false,
            boundary_page: None,
        })
    }

    fn accumulate(
        &self,
        cache: &mut PageCache<'_>,
        from_bottom: bool,
        cancel: &CancelToken,
    ) -> Result<ScanWindow, BerkasError> {
        let count = cache.page_count();
        let order: Vec<usize> = if from_bottom {
            (0..count).rev().collect()
        } else {
            (0..count).collect()
        };

        let mut pages = Vec::new();
        let mut stop_page = None;
        for page in order {
            if cancel.is_cancelled() {
                return Err(BerkasError::Cancelled);
            }
            let text = cache.text(page)?;
            // Whitespace-only pages are skipped but never halt the scan.
            if text.trim().is_empty() {
                continue;
            }
            pages.push(page);
            if text.to_lowercase().contains(&self.stop_keyword) {
                stop_page = Some(page);
                break;
            }
        }

        pages.sort_unstable();
        Ok(ScanWindow {
            pages,
            boundary_found: stop_page.is_some(),
            boundary_page: stop_page,
        })
    }
}

/// One alternation of word-bounded phrases; whitespace inside a phrase
/// matches any run of whitespace.
fn compile_trigger(phrases: &[String]) -> Result<Regex, BerkasError> {
    let alternatives: Vec<String> = phrases
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| {
            p.split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect();

    if alternatives.is_empty() {
        return Err(BerkasError::BoundaryPhrase(
            "no trigger phrases configured".into(),
        ));
    }

    let pattern = format!(r"\b(?:{})\b", alternatives.join("|"));
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| BerkasError::BoundaryPhrase(e.to_string()))
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

    fn forward_locator() -> BoundaryLocator {
        BoundaryLocator::new(&BoundaryConfig::default()).unwrap()
    }

    fn reverse_locator(from_bottom: bool) -> BoundaryLocator {
        BoundaryLocator::new(&BoundaryConfig {
            mode: ScanMode::ReverseAccumulate { from_bottom },
            ..BoundaryConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_forward_trigger_starts_window() {
        let mut provider = PagesProvider::new(&[
            "cover sheet",
            "Formulir PERMINTAAN RAWAT INAP pasien",
            "resume medis",
        ]);
        let mut cache = PageCache::new(&mut provider);
        let window = forward_locator()
            .locate(&mut cache, &CancelToken::new())
            .unwrap();
        assert!(window.boundary_found);
        assert_eq!(window.boundary_page, Some(1));
        assert_eq!(window.pages, vec![1, 2]);
    }

    #[test]
    fn test_forward_trigger_whitespace_variation() {
        let mut provider =
            PagesProvider::new(&["permintaan\n   rawat\trangap? no", "permintaan\n rawat\t inap"]);
        let mut cache = PageCache::new(&mut provider);
        let window = forward_locator()
            .locate(&mut cache, &CancelToken::new())
            .unwrap();
        assert_eq!(window.boundary_page, Some(1));
    }

    #[test]
    fn test_forward_no_trigger_means_no_window() {
        let mut provider = PagesProvider::new(&["nothing here", "or here"]);
        let mut cache = PageCache::new(&mut provider);
        let window = forward_locator()
            .locate(&mut cache, &CancelToken::new())
            .unwrap();
        assert!(!window.boundary_found);
        assert!(window.pages.is_empty());
    }

    #[test]
    fn test_reverse_from_bottom_stops_at_keyword_page() {
        let mut provider = PagesProvider::new(&[
            "front matter",
            "lembar SEP nomor 123",
            "lab results",
            "resume",
        ]);
        let mut cache = PageCache::new(&mut provider);
        let window = reverse_locator(true)
            .locate(&mut cache, &CancelToken::new())
            .unwrap();
        assert!(window.boundary_found);
        assert_eq!(window.boundary_page, Some(1));
        // Stop page included, pages in document order.
        assert_eq!(window.pages, vec![1, 2, 3]);
    }

    #[test]
    fn test_reverse_skips_blank_pages_without_halting() {
        let mut provider =
            PagesProvider::new(&["data SEP here", "   \n\t  ", "more data", "last page"]);
        let mut cache = PageCache::new(&mut provider);
        let window = reverse_locator(true)
            .locate(&mut cache, &CancelToken::new())
            .unwrap();
        assert_eq!(window.pages, vec![0, 2, 3]);
        assert_eq!(window.boundary_page, Some(0));
    }

    #[test]
    fn test_reverse_top_down_direction() {
        let mut provider = PagesProvider::new(&["first", "has SEP", "never scanned"]);
        let mut cache = PageCache::new(&mut provider);
        let window = reverse_locator(false)
            .locate(&mut cache, &CancelToken::new())
            .unwrap();
        assert_eq!(window.pages, vec![0, 1]);
    }

    #[test]
    fn test_reverse_without_stop_keyword_takes_everything() {
        let mut provider = PagesProvider::new(&["a", "b", "c"]);
        let mut cache = PageCache::new(&mut provider);
        let window = reverse_locator(true)
            .locate(&mut cache, &CancelToken::new())
            .unwrap();
        assert!(!window.boundary_found);
        assert_eq!(window.pages, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_phrase_list_rejected() {
        let err = BoundaryLocator::new(&BoundaryConfig {
            trigger_phrases: vec!["   ".into()],
            ..BoundaryConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, BerkasError::BoundaryPhrase(_)));
    }

    #[test]
    fn test_cancel_aborts_scan() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut provider = PagesProvider::new(&["page"]);
        let mut cache = PageCache::new(&mut provider);
        let err = forward_locator().locate(&mut cache, &cancel).unwrap_err();
        assert!(matches!(err, BerkasError::Cancelled));
    }
}
