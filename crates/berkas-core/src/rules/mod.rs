pub mod builtin;
pub mod evaluate;
pub mod schema;

use std::path::Path;

use regex::{Regex, RegexBuilder};
use schema::ValidationRule;

use crate::error::BerkasError;

/// Load rules from a JSON file, strictly. Used by the editing commands,
/// where a broken file must surface rather than be papered over.
pub fn load_rules(path: &Path) -> Result<Vec<ValidationRule>, BerkasError> {
    let content = std::fs::read_to_string(path).map_err(|e| BerkasError::RuleLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_rules(&content, path)
}

/// Parse rules from a JSON string.
pub fn parse_rules(json: &str, source: &Path) -> Result<Vec<ValidationRule>, BerkasError> {
    let rules: Vec<ValidationRule> =
        serde_json::from_str(json).map_err(|e| BerkasError::RuleLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_rules(&rules)?;
    Ok(rules)
}

/// Parse rules from a JSON string (no file path context).
pub fn parse_rules_str(json: &str) -> Result<Vec<ValidationRule>, BerkasError> {
    let rules: Vec<ValidationRule> = serde_json::from_str(json).map_err(BerkasError::Json)?;
    validate_rules(&rules)?;
    Ok(rules)
}

/// Rewrite the rule list file.
pub fn save_rules(path: &Path, rules: &[ValidationRule]) -> Result<(), BerkasError> {
    let json = serde_json::to_string_pretty(rules)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load rules with the fallback policy of a batch run: no file, or a
/// file that cannot be parsed, means the builtin defaults.
pub fn load_rules_or_builtin(path: &Path) -> Result<Vec<ValidationRule>, BerkasError> {
    if !path.exists() {
        return builtin::default_rules();
    }
    match load_rules(path) {
        Ok(rules) => Ok(rules),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "rule file unusable, using builtin defaults"
            );
            builtin::default_rules()
        }
    }
}

/// Validate that a rule list is well-formed: both sides non-empty and
/// every code pattern compiling.
pub fn validate_rules(rules: &[ValidationRule]) -> Result<(), BerkasError> {
    for rule in rules {
        if rule.code_pattern.trim().is_empty() || rule.required_keyword.trim().is_empty() {
            return Err(BerkasError::RuleInvalid(
                "code pattern and required keyword must not be empty".into(),
            ));
        }
        compile_pattern(&rule.code_pattern)?;
    }
    Ok(())
}

/// Case-insensitive, unanchored compilation of a diagnosis-code pattern.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, BerkasError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| BerkasError::RuleInvalid(format!("pattern '{pattern}' does not compile: {e}")))
}
