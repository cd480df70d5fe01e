use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BerkasError {
    #[error("failed to open PDF {path}: {reason}")]
    DocumentOpen { path: PathBuf, reason: String },

    #[error("poppler not found. Install poppler-utils: apt install poppler-utils (Linux) or brew install poppler (macOS)")]
    PopplerNotFound,

    #[error("tesseract not found. Install tesseract-ocr or point --tesseract at the binary")]
    TesseractNotFound,

    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("OCR failed on page {page}: {reason}")]
    PageOcr { page: usize, reason: String },

    #[error("failed to load keyword list from {path}: {reason}")]
    KeywordLoad { path: PathBuf, reason: String },

    #[error("invalid keyword list: {0}")]
    KeywordInvalid(String),

    #[error("failed to load rule list from {path}: {reason}")]
    RuleLoad { path: PathBuf, reason: String },

    #[error("invalid rule list: {0}")]
    RuleInvalid(String),

    #[error("invalid boundary phrases: {0}")]
    BoundaryPhrase(String),

    #[error("invalid extraction keyword '{keyword}': {reason}")]
    ExtractionKeyword { keyword: String, reason: String },

    #[error("OCR render DPI must be a positive integer")]
    InvalidDpi,

    #[error("run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
