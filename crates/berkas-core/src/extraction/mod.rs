pub mod ocr;
pub mod poppler;

use crate::error::BerkasError;

/// Trait for page-level text sources.
///
/// Best-effort contract: a page with nothing readable on it comes back
/// as an empty string, never as an error. Errors are reserved for the
/// document or the engines being broken.
pub trait PageTextProvider: Send {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Plain text of a zero-based page, from the embedded text layer if
    /// present, otherwise from OCR.
    fn page_text(&mut self, page_index: usize) -> Result<String, BerkasError>;
}

/// Memoizing wrapper around a provider so the boundary scan, keyword
/// matching and rule checks never pay for the same page twice.
pub struct PageCache<'a> {
    provider: &'a mut dyn PageTextProvider,
    pages: Vec<Option<String>>,
}

impl<'a> PageCache<'a> {
    pub fn new(provider: &'a mut dyn PageTextProvider) -> Self {
        let count = provider.page_count();
        Self {
            provider,
            pages: vec![None; count],
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of a zero-based page, fetched at most once.
    pub fn text(&mut self, page_index: usize) -> Result<&str, BerkasError> {
        if self.pages[page_index].is_none() {
            let text = self.provider.page_text(page_index)?;
            self.pages[page_index] = Some(text);
        }
        Ok(self.pages[page_index].as_deref().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingProvider {
        calls: usize,
    }

    impl PageTextProvider for CountingProvider {
        fn page_count(&self) -> usize {
            2
        }

        fn page_text(&mut self, page_index: usize) -> Result<String, BerkasError> {
            self.calls += 1;
            Ok(format!("page {}", page_index))
        }
    }

    #[test]
    fn test_cache_fetches_each_page_once() {
        let mut provider = CountingProvider { calls: 0 };
        let mut cache = PageCache::new(&mut provider);
        assert_eq!(cache.text(0).unwrap(), "page 0");
        assert_eq!(cache.text(0).unwrap(), "page 0");
        assert_eq!(cache.text(1).unwrap(), "page 1");
        assert_eq!(cache.provider.page_count(), 2);
    }

    #[test]
    fn test_cache_call_count() {
        let mut provider = CountingProvider { calls: 0 };
        {
            let mut cache = PageCache::new(&mut provider);
            cache.text(1).unwrap();
            cache.text(1).unwrap();
            cache.text(0).unwrap();
        }
        assert_eq!(provider.calls, 2);
    }
}
