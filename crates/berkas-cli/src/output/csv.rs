//! CSV export of the verification table.
//!
//! One row per document: fixed metadata columns, then one column per
//! display label. Rows are appended when the target file already
//! exists; the header row is only written for a new file.

use std::io::Write;
use std::path::Path;

use berkas_core::error::BerkasError;
use berkas_core::verdict::VerificationVerdict;

use crate::output;

pub fn export(
    path: &Path,
    verdicts: &[VerificationVerdict],
    labels: &[String],
) -> Result<(), BerkasError> {
    let new_file = !path.exists();
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    if new_file {
        let mut header = vec![
            "file".to_string(),
            "diagnosis_code".to_string(),
            "diagnosis_description".to_string(),
            "rule_validation".to_string(),
            "boundary_found".to_string(),
        ];
        header.extend(labels.iter().cloned());
        writeln!(file, "{}", encode_row(&header))?;
    }

    for verdict in verdicts {
        let mut row = vec![
            output::file_name(verdict),
            verdict
                .extracted
                .code
                .clone()
                .unwrap_or_else(|| output::NOT_FOUND.to_string()),
            verdict
                .extracted
                .description
                .clone()
                .unwrap_or_else(|| output::NOT_FOUND.to_string()),
            output::rule_summary(verdict),
            if verdict.boundary_found { "yes" } else { "no" }.to_string(),
        ];
        for label in labels {
            row.push(label_cell(verdict, label));
        }
        writeln!(file, "{}", encode_row(&row))?;
    }
    Ok(())
}

fn label_cell(verdict: &VerificationVerdict, label: &str) -> String {
    match verdict
        .per_label_results
        .iter()
        .find(|result| result.label == label)
    {
        Some(result) if result.found => match result.first_page {
            Some(page) => format!("page {page}"),
            None => "found".to_string(),
        },
        Some(_) => "no".to_string(),
        // Aborted, skipped and errored documents never ran the scan.
        None => "-".to_string(),
    }
}

/// Minimal CSV quoting: fields containing commas, quotes or newlines
/// are quoted, with embedded quotes doubled.
fn encode_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|field| encode_field(field))
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_field(field: &str) -> String {
    if field.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berkas_core::diagnosis::ExtractedDiagnosis;
    use berkas_core::verdict::{OverallStatus, PerLabelResult};
    use std::path::PathBuf;

    fn verdict() -> VerificationVerdict {
        VerificationVerdict {
            document_path: PathBuf::from("/scans/pasien_01.pdf"),
            boundary_found: true,
            extracted: ExtractedDiagnosis {
                code: Some("I50.2".into()),
                description: Some("Gagal jantung".into()),
            },
            per_label_results: vec![PerLabelResult {
                label: "Resume".into(),
                found: true,
                first_page: Some(3),
            }],
            rule_checks: Vec::new(),
            overall_status: OverallStatus::Pass,
            message: String::new(),
        }
    }

    #[test]
    fn test_encode_field_quotes_when_needed() {
        assert_eq!(encode_field("plain"), "plain");
        assert_eq!(encode_field("a,b"), "\"a,b\"");
        assert_eq!(encode_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_new_file_gets_header_append_does_not() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let labels = vec!["Resume".to_string()];

        export(&path, &[verdict()], &labels).unwrap();
        export(&path, &[verdict()], &labels).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("file,diagnosis_code"));
        assert_eq!(lines[1], lines[2]);
        assert!(lines[1].contains("pasien_01.pdf"));
        assert!(lines[1].contains("page 3"));
    }

    #[test]
    fn test_unchecked_labels_render_as_dash() {
        let mut aborted = verdict();
        aborted.per_label_results.clear();
        aborted.overall_status = OverallStatus::Aborted;
        aborted.boundary_found = false;
        aborted.message = "no boundary phrase found".into();

        let cell = label_cell(&aborted, "Resume");
        assert_eq!(cell, "-");
    }
}
