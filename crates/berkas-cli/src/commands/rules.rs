use std::path::Path;

use berkas_core::error::BerkasError;
use berkas_core::rules;

pub fn list(file: &Path) -> Result<(), BerkasError> {
    let active = rules::load_rules_or_builtin(file)?;
    if file.exists() {
        println!("Rules from {}:\n", file.display());
    } else {
        println!("Builtin default rules (no {} found):\n", file.display());
    }

    let width = active
        .iter()
        .map(|rule| rule.code_pattern.len())
        .max()
        .unwrap_or(20);
    println!(
        "  {:<width$}  Required keyword",
        "Code pattern",
        width = width
    );
    for rule in &active {
        println!(
            "  {:<width$}  {}",
            rule.code_pattern,
            rule.required_keyword,
            width = width
        );
    }
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), BerkasError> {
    let rules = rules::load_rules(file)?;
    println!("Rule file is valid: {} rule(s).", rules.len());
    for rule in &rules {
        let alternatives = rule.keyword_alternatives().count();
        if alternatives > 1 {
            println!(
                "  {} -> any of {} keyword alternatives",
                rule.code_pattern, alternatives
            );
        }
    }
    Ok(())
}

pub fn schema() -> Result<(), BerkasError> {
    print!(
        r#"JSON Rule Format
================

A rule file is an ordered list of two-element string pairs:

  [diagnosis code pattern, required keyword]

Code pattern:
  A regular expression matched case-insensitively and unanchored
  against the extracted diagnosis code. "i50.*" matches I50, I50.2
  and so on; alternatives are separated with "|".

Required keyword:
  Text that must occur somewhere in the document when the pattern
  matches. "|" separates alternatives; any one of them satisfies the
  rule. When the keyword equals a display label from the keyword
  list, that label's scan result is reused; otherwise the document
  is searched last page to first.

Every rule whose pattern matches is checked, not just the first.
Documents whose code matches no rule are skipped, not failed.

Example:

[
    ["i50.*|i11.0|i13.2|i13.0", "echo|echocardiography"],
    ["j44.*", "spirometri"],
    ["g40.*|g41.*", "eeg"]
]
"#
    );
    Ok(())
}
