use serde::{Deserialize, Serialize};

/// One validation rule: a document whose diagnosis code matches
/// `code_pattern` (case-insensitive, unanchored) must also contain
/// `required_keyword` somewhere in its pages.
///
/// `required_keyword` may carry `|`-separated alternatives; any one of
/// them satisfies the rule. Persisted as a JSON pair, like the keyword
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ValidationRule {
    pub code_pattern: String,
    pub required_keyword: String,
}

impl ValidationRule {
    pub fn new(code_pattern: impl Into<String>, required_keyword: impl Into<String>) -> Self {
        Self {
            code_pattern: code_pattern.into(),
            required_keyword: required_keyword.into(),
        }
    }

    /// The `|`-separated alternatives of the required keyword.
    pub fn keyword_alternatives(&self) -> impl Iterator<Item = &str> {
        self.required_keyword
            .split('|')
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
    }
}

impl From<(String, String)> for ValidationRule {
    fn from((code_pattern, required_keyword): (String, String)) -> Self {
        Self {
            code_pattern,
            required_keyword,
        }
    }
}

impl From<ValidationRule> for (String, String) {
    fn from(rule: ValidationRule) -> Self {
        (rule.code_pattern, rule.required_keyword)
    }
}
