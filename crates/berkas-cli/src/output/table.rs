use berkas_core::verdict::{OverallStatus, VerificationVerdict};

use crate::output;

pub fn print(verdicts: &[VerificationVerdict], labels: &[String]) {
    for (i, verdict) in verdicts.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("=== {} ===\n", output::file_name(verdict));

        let status = match verdict.message.as_str() {
            "" => verdict.overall_status.to_string(),
            message => format!("{} ({})", verdict.overall_status, message),
        };
        println!("  Status:    {status}");
        println!(
            "  Diagnosis: {}",
            output::format_diagnosis(&verdict.extracted)
        );
        println!(
            "  Boundary:  {}",
            if verdict.boundary_found {
                "found"
            } else {
                "not found"
            }
        );

        if !verdict.per_label_results.is_empty() {
            println!("  Keywords:");
            let width = verdict
                .per_label_results
                .iter()
                .map(|r| r.label.len())
                .max()
                .unwrap_or(10);
            for result in &verdict.per_label_results {
                match result.first_page {
                    Some(page) => println!(
                        "    {:<width$}  \u{2713} (page {})",
                        result.label,
                        page,
                        width = width
                    ),
                    None => println!("    {:<width$}  \u{2717}", result.label, width = width),
                }
            }
        } else if !labels.is_empty()
            && matches!(
                verdict.overall_status,
                OverallStatus::Aborted | OverallStatus::SkippedIrrelevant | OverallStatus::Error
            )
        {
            println!("  Keywords:  not checked");
        }

        if !verdict.rule_checks.is_empty() {
            println!("  Rule checks:");
            let width = verdict
                .rule_checks
                .iter()
                .map(|c| c.required_keyword.len())
                .max()
                .unwrap_or(10);
            for check in &verdict.rule_checks {
                match (check.satisfied, check.page) {
                    (true, Some(page)) => println!(
                        "    {:<width$}  \u{2713} (page {})",
                        check.required_keyword,
                        page,
                        width = width
                    ),
                    (true, None) => println!(
                        "    {:<width$}  \u{2713}",
                        check.required_keyword,
                        width = width
                    ),
                    (false, _) => println!(
                        "    {:<width$}  \u{2717} missing",
                        check.required_keyword,
                        width = width
                    ),
                }
            }
        }
    }
}
