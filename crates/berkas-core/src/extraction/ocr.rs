//! OCR fallback via the tesseract command line, with orientation
//! auto-correction.
//!
//! A page is rendered to PNG with pdftoppm at the requested DPI, its
//! orientation is detected with tesseract's OSD mode, the image is
//! rotated if needed, and the corrected image is recognized with a
//! mixed English/Indonesian language pack.

use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;

use crate::error::BerkasError;

/// Languages passed to tesseract; the documents mix Indonesian and
/// English.
pub const DEFAULT_LANGUAGES: &str = "eng+ind";

/// Tesseract output fragments that mean "nothing usable on this page",
/// not a real failure. Pages producing these are treated as blank.
const RECOVERABLE_MARKERS: &[&str] = &[
    "Too few characters",
    "Invalid resolution",
    "Error during processing.",
];

enum OsdOutcome {
    Angle(u32),
    /// Too little on the page to orient; there is nothing to read either.
    Unreadable,
}

/// Handle to a resolved tesseract binary. Resolved once per process and
/// shared by every worker; the engine itself is stateless.
#[derive(Debug)]
pub struct OcrEngine {
    tesseract: PathBuf,
    languages: String,
    rotate_pattern: Regex,
}

impl OcrEngine {
    /// Resolve the tesseract binary: an explicit path if given, otherwise
    /// a PATH lookup.
    pub fn resolve(explicit: Option<&Path>, languages: &str) -> Result<Self, BerkasError> {
        let tesseract = match explicit {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(_) => return Err(BerkasError::TesseractNotFound),
            None => which::which("tesseract").map_err(|_| BerkasError::TesseractNotFound)?,
        };

        Ok(Self {
            tesseract,
            languages: languages.to_string(),
            rotate_pattern: Regex::new(r"Rotate:\s*(\d+)").expect("builtin pattern compiles"),
        })
    }

    /// Check if tesseract is available on PATH.
    pub fn is_available() -> bool {
        which::which("tesseract").is_ok()
    }

    /// Render a page and recognize its text. Blank or noise-only pages
    /// come back as an empty string; real OCR failures carry the page
    /// number.
    pub fn recognize_page(
        &self,
        pdf: &Path,
        page_index: usize,
        dpi: u32,
    ) -> Result<String, BerkasError> {
        let page_number = page_index + 1;
        let scratch = tempfile::TempDir::new()?;
        let image_path = render_page(pdf, page_number, dpi, scratch.path())?;

        let image_path = match self.detect_rotation(&image_path, page_number)? {
            OsdOutcome::Unreadable => return Ok(String::new()),
            OsdOutcome::Angle(0) => image_path,
            OsdOutcome::Angle(angle) => rotate_image(&image_path, angle, page_number)?,
        };

        let output = self.run_tesseract(&image_path, &["-l", &self.languages, "--psm", "3"])?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if is_recoverable(&stderr) {
            tracing::warn!(page = page_number, "OCR noise treated as blank page");
            return Ok(String::new());
        }
        Err(BerkasError::PageOcr {
            page: page_number,
            reason: stderr.trim().to_string(),
        })
    }

    fn detect_rotation(
        &self,
        image: &Path,
        page_number: usize,
    ) -> Result<OsdOutcome, BerkasError> {
        let output = self.run_tesseract(image, &["--psm", "0"])?;
        if output.status.success() {
            let osd = String::from_utf8_lossy(&output.stdout);
            let angle = self
                .rotate_pattern
                .captures(&osd)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(0);
            return Ok(OsdOutcome::Angle(angle));
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if is_recoverable(&stderr) {
            return Ok(OsdOutcome::Unreadable);
        }
        Err(BerkasError::PageOcr {
            page: page_number,
            reason: format!("orientation detection failed: {}", stderr.trim()),
        })
    }

    fn run_tesseract(
        &self,
        image: &Path,
        args: &[&str],
    ) -> Result<std::process::Output, BerkasError> {
        Command::new(&self.tesseract)
            .arg(image)
            .arg("stdout")
            .args(args)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BerkasError::TesseractNotFound
                } else {
                    BerkasError::Io(e)
                }
            })
    }
}

/// Convert one PDF page to a PNG using pdftoppm.
fn render_page(
    pdf: &Path,
    page_number: usize,
    dpi: u32,
    scratch: &Path,
) -> Result<PathBuf, BerkasError> {
    let page = page_number.to_string();
    let prefix = scratch.join("page");

    let output = Command::new("pdftoppm")
        .args(["-png", "-r", &dpi.to_string(), "-f", &page, "-l", &page])
        .arg(pdf)
        .arg(&prefix)
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
            tool: "pdftoppm",
            code,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    find_page_image(scratch, page_number).ok_or_else(|| BerkasError::PageOcr {
        page: page_number,
        reason: "pdftoppm produced no image".into(),
    })
}

/// pdftoppm pads the page number to the document's width (page-1.png,
/// page-01.png, ...).
fn find_page_image(dir: &Path, page_number: usize) -> Option<PathBuf> {
    for digits in 1..=4 {
        let candidate = dir.join(format!("page-{:0width$}.png", page_number, width = digits));
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Rotate clockwise by the OSD-reported angle. Tesseract only reports
/// right angles.
fn rotate_image(path: &Path, angle: u32, page_number: usize) -> Result<PathBuf, BerkasError> {
    let img = image::open(path).map_err(|e| BerkasError::PageOcr {
        page: page_number,
        reason: format!("failed to decode rendered page: {e}"),
    })?;

    let rotated = match angle % 360 {
        90 => img.rotate90(),
        180 => img.rotate180(),
        270 => img.rotate270(),
        _ => return Ok(path.to_path_buf()),
    };

    let out = path.with_file_name(format!("page-{page_number}-rotated.png"));
    rotated.save(&out).map_err(|e| BerkasError::PageOcr {
        page: page_number,
        reason: format!("failed to save rotated page: {e}"),
    })?;
    tracing::debug!(page = page_number, angle, "corrected page rotation");
    Ok(out)
}

fn is_recoverable(stderr: &str) -> bool {
    RECOVERABLE_MARKERS.iter().any(|m| stderr.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_recoverable_markers() {
        assert!(is_recoverable("Too few characters. Skipping this page."));
        assert!(is_recoverable("Invalid resolution 0 dpi. Using 70 instead."));
        assert!(!is_recoverable("Error opening data file eng.traineddata"));
    }

    #[test]
    fn test_rotate_pattern_parses_osd() {
        let re = Regex::new(r"Rotate:\s*(\d+)").unwrap();
        let osd = "Page number: 0\nOrientation in degrees: 270\nRotate: 90\n";
        let caps = re.captures(osd).unwrap();
        assert_eq!(&caps[1], "90");
    }

    #[test]
    fn test_find_page_image_not_found() {
        let temp = TempDir::new().unwrap();
        assert!(find_page_image(temp.path(), 1).is_none());
    }

    #[test]
    fn test_find_page_image_with_padding() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("page-03.png");
        std::fs::write(&path, b"fake png").unwrap();

        let found = find_page_image(temp.path(), 3);
        assert_eq!(found, Some(path));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let err = OcrEngine::resolve(Some(Path::new("/nonexistent/tesseract")), DEFAULT_LANGUAGES)
            .unwrap_err();
        assert!(matches!(err, BerkasError::TesseractNotFound));
    }
}
