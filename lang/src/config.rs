// lang/src/config.rs
use serde::Deserialize;

/// Comparison policy record. External callers hand this in as JSON with
/// camelCase keys; all fields are optional and default to the
/// conservative grading policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompareConfig {
    /// Class and method names are part of the tested contract and stay
    /// untouched; set to false to alpha-rename them positionally too.
    pub preserve_top_level_names: bool,
    /// A widening with no truncation (int to long) is not a reported
    /// difference unless this is set.
    pub treat_widening_as_difference: bool,
    /// Sort runs of adjacent independent simple assignments into a
    /// canonical order.
    pub reorder_independent_statements: bool,
    /// Unreachable code is surfaced as an informational diff by default;
    /// set to make it count against equivalence.
    pub unreachable_code_is_error: bool,
    /// Flatten redundant nested blocks before reordering, so a statement
    /// hoisted out of a bare block still aligns. Conservative default:
    /// reordering never crosses block boundaries.
    pub cross_block_reordering: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            preserve_top_level_names: true,
            treat_widening_as_difference: false,
            reorder_independent_statements: true,
            unreachable_code_is_error: false,
            cross_block_reordering: false,
        }
    }
}

impl CompareConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = CompareConfig::default();
        assert!(config.preserve_top_level_names);
        assert!(!config.treat_widening_as_difference);
        assert!(config.reorder_independent_statements);
        assert!(!config.unreachable_code_is_error);
        assert!(!config.cross_block_reordering);
    }

    #[test]
    fn partial_json_overrides() {
        let config = CompareConfig::from_json(r#"{"treatWideningAsDifference": true}"#).unwrap();
        assert!(config.treat_widening_as_difference);
        assert!(config.preserve_top_level_names);
    }

    #[test]
    fn empty_json_is_default() {
        let config = CompareConfig::from_json("{}").unwrap();
        assert!(!config.unreachable_code_is_error);
    }
}
