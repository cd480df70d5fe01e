use crate::error::BerkasError;
use crate::rules::schema::ValidationRule;

const DEFAULT_RULES_JSON: &str = include_str!("../../../../rules/default-rules.json");

/// The builtin rule table, used whenever no rule file exists or the
/// configured file cannot be read.
pub fn default_rules() -> Result<Vec<ValidationRule>, BerkasError> {
    let rules: Vec<ValidationRule> = serde_json::from_str(DEFAULT_RULES_JSON)?;
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_load() {
        let rules = default_rules().unwrap();
        assert_eq!(rules.len(), 5);
    }

    #[test]
    fn test_heart_failure_rule_present() {
        let rules = default_rules().unwrap();
        let echo = &rules[0];
        assert!(echo.code_pattern.contains("i50"));
        assert_eq!(echo.required_keyword, "echo|echocardiography");
    }

    #[test]
    fn test_default_rules_validate() {
        let rules = default_rules().unwrap();
        crate::rules::validate_rules(&rules).unwrap();
    }
}
