use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::error::BerkasError;
use crate::extraction::ocr::OcrEngine;
use crate::extraction::PageTextProvider;

/// Page text source backed by pdftotext (from poppler-utils), with OCR
/// fallback for pages that carry no embedded text layer.
///
/// Each instance owns one document exclusively; workers never share a
/// provider.
#[derive(Debug)]
pub struct PdfTextProvider {
    path: PathBuf,
    page_count: usize,
    dpi: u32,
    ocr: Option<Arc<OcrEngine>>,
}

impl PdfTextProvider {
    /// Open a document, reading its page count via pdfinfo. A missing or
    /// unreadable file fails here, before any page work starts.
    pub fn open(
        path: &Path,
        dpi: u32,
        ocr: Option<Arc<OcrEngine>>,
    ) -> Result<Self, BerkasError> {
        if dpi == 0 {
            return Err(BerkasError::InvalidDpi);
        }

        let output = Command::new("pdfinfo").arg(path).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BerkasError::PopplerNotFound
            } else {
                BerkasError::Io(e)
            }
        })?;

        if !output.status.success() {
            return Err(BerkasError::DocumentOpen {
                path: path.to_path_buf(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let page_count =
            parse_page_count(&stdout).ok_or_else(|| BerkasError::DocumentOpen {
                path: path.to_path_buf(),
                reason: "pdfinfo reported no page count".into(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            page_count,
            dpi,
            ocr,
        })
    }

    /// Check if the poppler tools are available on the system.
    pub fn is_available() -> bool {
        which::which("pdftotext").is_ok() && which::which("pdfinfo").is_ok()
    }

    fn text_layer(&self, page_index: usize) -> Result<String, BerkasError> {
        let page = (page_index + 1).to_string();
        let output = Command::new("pdftotext")
            .args(["-f", &page, "-l", &page])
            .arg(&self.path)
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BerkasError::PopplerNotFound
                } else {
                    BerkasError::Io(e)
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            return Err(BerkasError::ToolFailed {
                tool: "pdftotext",
                code,
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl PageTextProvider for PdfTextProvider {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text(&mut self, page_index: usize) -> Result<String, BerkasError> {
        let from_layer = self.text_layer(page_index)?;
        if !from_layer.trim().is_empty() {
            return Ok(from_layer);
        }

        match &self.ocr {
            Some(engine) => {
                tracing::debug!(
                    page = page_index + 1,
                    dpi = self.dpi,
                    "no text layer, falling back to OCR"
                );
                engine.recognize_page(&self.path, page_index, self.dpi)
            }
            // No engine configured: image-only pages read as blank.
            None => Ok(String::new()),
        }
    }
}

fn parse_page_count(pdfinfo_output: &str) -> Option<usize> {
    pdfinfo_output.lines().find_map(|line| {
        let rest = line.strip_prefix("Pages:")?;
        rest.trim().parse().ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_count() {
        let out = "Title:          Resume Medis\nPages:          12\nEncrypted:      no\n";
        assert_eq!(parse_page_count(out), Some(12));
    }

    #[test]
    fn test_parse_page_count_missing() {
        assert_eq!(parse_page_count("Title: x\nEncrypted: no\n"), None);
    }

    #[test]
    fn test_zero_dpi_rejected() {
        let err = PdfTextProvider::open(Path::new("x.pdf"), 0, None).unwrap_err();
        assert!(matches!(err, BerkasError::InvalidDpi));
    }
}
