//! Stored rule definitions
//!
//! These are the shapes hosts persist per tenant and object type. The engine
//! only cares about the condition expression; what a matching rule means
//! (required fields, owner assignment) is decided by the host.

use serde::{Deserialize, Serialize};

/// Validation rule: when `if` holds, the listed fields must be present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationRule {
    #[serde(rename = "if", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub then_required: Vec<String>,
}

/// Assignment rule: when `when` holds, apply `assign` to the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssignmentRule {
    #[serde(rename = "when", default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub assign: serde_json::Map<String, serde_json::Value>,
}

/// Anything carrying an optional condition expression.
pub trait Conditional {
    /// The expression to evaluate, or `None` when the rule always applies.
    fn condition(&self) -> Option<&str>;
}

impl Conditional for ValidationRule {
    fn condition(&self) -> Option<&str> {
        non_blank(self.condition.as_deref())
    }
}

impl Conditional for AssignmentRule {
    fn condition(&self) -> Option<&str> {
        non_blank(self.condition.as_deref())
    }
}

fn non_blank(expr: Option<&str>) -> Option<&str> {
    expr.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_rule_from_json() {
        let rule: ValidationRule = serde_json::from_value(json!({
            "if": "amount >= 50000",
            "then_required": ["description"]
        }))
        .unwrap();
        assert_eq!(rule.condition(), Some("amount >= 50000"));
        assert_eq!(rule.then_required, vec!["description".to_string()]);
    }

    #[test]
    fn test_assignment_rule_without_condition() {
        let rule: AssignmentRule = serde_json::from_value(json!({
            "assign": { "ownerId": "u-1" }
        }))
        .unwrap();
        assert_eq!(rule.condition(), None);
        assert_eq!(rule.assign["ownerId"], json!("u-1"));
    }

    #[test]
    fn test_blank_condition_is_none() {
        let rule = ValidationRule {
            condition: Some("   ".to_string()),
            then_required: vec![],
        };
        assert_eq!(rule.condition(), None);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result: Result<ValidationRule, _> = serde_json::from_value(json!({
            "if": "x == 1",
            "then": ["y"]
        }));
        assert!(result.is_err());
    }
}
