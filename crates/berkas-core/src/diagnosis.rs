//! Diagnosis code/description extraction.
//!
//! The discharge forms print the primary diagnosis after a "Diagnosa"
//! heading whose spelling varies ("Diagnosa Utama", "Diagnosa 1.", a
//! bare "Diagnosa"). The code token in front of the description is
//! optional and irregular, so extraction is layered: stage one isolates
//! the block of text after the heading, stage two tries to peel an
//! ICD-style code off its front. A failing stage two must not discard
//! the description stage one already found.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::BerkasError;

/// Heading that opens the primary-diagnosis block.
pub const PRIMARY_KEYWORD: &str = "Diagnosa";

/// Heading used by the reverse-accumulate mode's line extraction.
pub const FINAL_KEYWORD: &str = "Diagnosa Akhir";

/// Code and free-text description pulled from a document. `None` means
/// "not found"; a missing code never invalidates a found description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDiagnosis {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Two-stage extractor for the primary diagnosis.
pub struct DiagnosisExtractor {
    start: Regex,
    terminator: Regex,
    split: Regex,
}

impl Default for DiagnosisExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisExtractor {
    pub fn new() -> Self {
        // Heading with its optional "Utama"/list-number suffix and the
        // punctuation that may follow it.
        let start = RegexBuilder::new(r"Diagnosa(?:\s*Utama|\s*\d\.?)?\s*[:;,-]?\s*")
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .expect("builtin pattern compiles");

        // The block ends at the next member of the heading family, the
        // validation footer, or end of text.
        let terminator = RegexBuilder::new(r"Diagnosa(?:\s*Sekunder|\s*\d\.?)?|Validasi hasil")
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .expect("builtin pattern compiles");

        // ICD-style code: one letter, two digits, optional ".d" or ".dd"
        // suffix, optionally separated from the description by a dash.
        // The description runs to the end of the line.
        let split = RegexBuilder::new(r"^\s*([a-zA-Z]\d{2}(?:\.\d{1,2})?)(?:\s*-\s*|\s*)(.*)")
            .case_insensitive(true)
            .build()
            .expect("builtin pattern compiles");

        Self {
            start,
            terminator,
            split,
        }
    }

    /// Run both stages over the extraction page's text.
    pub fn extract(&self, text: &str) -> ExtractedDiagnosis {
        match self.primary_block(text) {
            Some(block) => self.split_block(block.trim()),
            None => ExtractedDiagnosis::default(),
        }
    }

    /// Stage two alone, for text isolated by other means (the reverse
    /// mode's line extraction).
    pub fn split_block(&self, block: &str) -> ExtractedDiagnosis {
        if block.is_empty() {
            return ExtractedDiagnosis::default();
        }
        match self.split.captures(block) {
            Some(caps) => ExtractedDiagnosis {
                code: Some(caps[1].trim().to_string()),
                description: Some(caps[2].trim().to_string()),
            },
            // No code token up front: the whole block is the description.
            None => ExtractedDiagnosis {
                code: None,
                description: Some(block.to_string()),
            },
        }
    }

    /// Stage one: the text between the first heading occurrence and the
    /// next terminator (or end of text).
    fn primary_block<'t>(&self, text: &'t str) -> Option<&'t str> {
        let heading = self.start.find(text)?;
        let rest = &text[heading.end()..];
        match self.terminator.find(rest) {
            Some(stop) => Some(&rest[..stop.start()]),
            None => Some(rest),
        }
    }
}

/// Single-stage variant: the text after `keyword` up to the end of its
/// line.
pub struct LineExtractor {
    pattern: Regex,
}

impl LineExtractor {
    pub fn new(keyword: &str) -> Result<Self, BerkasError> {
        let pattern = RegexBuilder::new(&format!(
            r"{}\s*[:;,-]?\s*(.*?)(?:\n|$)",
            regex::escape(keyword)
        ))
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| BerkasError::ExtractionKeyword {
            keyword: keyword.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        self.pattern
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
    }
}
