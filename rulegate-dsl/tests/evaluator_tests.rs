//! End-to-end tests: source text plus record snapshots to a boolean verdict.

use rulegate_core::{AssignmentRule, Decimal, Record, ValidationRule, Value};
use rulegate_dsl::{
    evaluate, parse, EngineConfig, EvaluateOptions, EvaluationContext, FieldAllowlist,
    FieldNotAllowed, RuleEngine, RuleError, RuleResult, SemanticError,
};
use rulegate_test_utils::assertions::{
    assert_field_rejected, assert_semantic_error, assert_syntax_error,
};
use rulegate_test_utils::fixtures;
use serde_json::json;
use std::cell::RefCell;

fn ctx(before: Option<serde_json::Value>, after: serde_json::Value) -> EvaluationContext {
    EvaluationContext::from_json(before, after).expect("context")
}

fn eval(source: &str, context: &EvaluationContext) -> RuleResult<bool> {
    evaluate(source, context, &EvaluateOptions::new())
}

// ============================================================================
// OPERATORS
// ============================================================================

#[test]
fn test_numeric_threshold() {
    let context = ctx(None, json!({"x": 10}));
    assert!(eval("x >= 10", &context).unwrap());
    assert!(!eval("x > 10", &context).unwrap());
    assert!(eval("x < 10.5", &context).unwrap());
}

#[test]
fn test_numeric_string_coerces_for_ordering_only() {
    let context = ctx(None, json!({"amount": " 61000 "}));
    assert!(eval("amount >= 50000", &context).unwrap());
    assert!(!eval("amount == 61000", &context).unwrap());
}

#[test]
fn test_non_numeric_ordering_is_semantic_error() {
    let context = ctx(None, json!({"stage": "Lead", "flags": [1]}));
    let result = eval("stage > 3", &context);
    assert!(matches!(
        assert_semantic_error(&result),
        SemanticError::NotComparable { .. }
    ));
    assert!(eval("flags < 3", &context).unwrap_err().is_semantic());
    assert!(eval("missing > 3", &context).is_err());
}

#[test]
fn test_dates_compare_chronologically() {
    let context = fixtures::opportunity_update();
    assert!(eval("closeDate > '2026-12-01'", &context).unwrap());
    assert!(eval("closeDate <= '2026-12-15T00:00:00.000Z'", &context).unwrap());
}

#[test]
fn test_in_list() {
    let context = ctx(None, json!({"stage": "Closed Won"}));
    assert!(eval("stage in ['Closed Won', 'Closed Lost']", &context).unwrap());
    assert!(!eval("stage in ['Lead']", &context).unwrap());
    assert!(!eval("stage in []", &context).unwrap());
}

#[test]
fn test_in_requires_array() {
    let context = ctx(None, json!({"stage": "Lead"}));
    let result = eval("stage in 'Lead'", &context);
    assert!(matches!(
        assert_semantic_error(&result),
        SemanticError::InRequiresArray { found } if found == "string"
    ));
}

#[test]
fn test_contains_on_arrays_and_strings() {
    let context = fixtures::opportunity_update();
    assert!(eval("tags contains 'priority'", &context).unwrap());
    assert!(!eval("tags contains 'apac'", &context).unwrap());
    assert!(eval("name contains 'Lisboa'", &context).unwrap());
    assert!(!eval("name contains 'lisboa'", &context).unwrap());
    assert!(eval("amount contains 610", &context).unwrap());
}

#[test]
fn test_contains_rejects_non_container() {
    let context = ctx(None, json!({"n": 5}));
    let result = eval("n contains 5", &context);
    assert!(matches!(
        assert_semantic_error(&result),
        SemanticError::InvalidContainsOperand { .. }
    ));
}

#[test]
fn test_nested_paths() {
    let context = fixtures::opportunity_update();
    assert!(eval("billingAddress.city == 'Porto'", &context).unwrap());
    assert!(eval("billingAddress.zip == null", &context).unwrap());
    assert!(eval("tags.2 == 'priority'", &context).unwrap());
}

#[test]
fn test_structural_equality() {
    let context = ctx(None, json!({"tags": ["a", "b"], "n": 5}));
    assert!(eval("tags == ['a', 'b']", &context).unwrap());
    assert!(!eval("tags == ['b', 'a']", &context).unwrap());
    assert!(!eval("n == '5'", &context).unwrap());
}

#[test]
fn test_serialized_context_keeps_decimals_and_dates() {
    let mut after = Record::new();
    after.insert("amount".to_string(), Value::Decimal("5".parse::<Decimal>().unwrap()));
    after.insert(
        "closeDate".to_string(),
        Value::Date("2026-12-15T00:00:00Z".parse().unwrap()),
    );
    let context = EvaluationContext::create(after);
    let source = "amount == 5 and closeDate > '2026-12-01'";
    assert!(eval(source, &context).unwrap());

    let text = serde_json::to_string(&context).unwrap();
    let restored: EvaluationContext = serde_json::from_str(&text).unwrap();
    assert_eq!(restored, context);
    assert!(eval(source, &restored).unwrap());
}

// ============================================================================
// CHANGED
// ============================================================================

#[test]
fn test_changed_true_and_false() {
    let context = fixtures::opportunity_update();
    assert!(eval("changed('stage')", &context).unwrap());
    assert!(!eval("changed('name')", &context).unwrap());
    assert!(!eval("changed('owner')", &context).unwrap());
    assert!(eval("changed('billingAddress.city')", &context).unwrap());
    assert!(!eval("changed('billingAddress.country')", &context).unwrap());
}

#[test]
fn test_changed_on_create() {
    let context = fixtures::opportunity_create();
    assert!(eval("changed('stage')", &context).unwrap());
    assert!(!eval("changed('neverSet')", &context).unwrap());
}

#[test]
fn test_changed_combined_with_threshold() {
    let context = fixtures::opportunity_update();
    assert!(eval("amount >= 50000 and changed('stage')", &context).unwrap());
    assert!(!eval("amount >= 50000 and changed('name')", &context).unwrap());
}

// ============================================================================
// ERRORS AND SHORT-CIRCUIT
// ============================================================================

#[test]
fn test_unknown_operator_is_syntax_error() {
    let context = ctx(None, json!({"a": 1}));
    let result = eval("a ~~ 1", &context);
    let err = assert_syntax_error(&result);
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 3);
}

#[test]
fn test_syntax_error_positions() {
    let err = parse("amount >= 5 and\n  (stage == 'x'").unwrap_err();
    assert_eq!(err.line, 2);
    assert!(err.message.contains("Expected"));

    let err = parse("name == 'open").unwrap_err();
    assert_eq!((err.line, err.column), (1, 9));
}

#[test]
fn test_short_circuit_skips_unknown_function() {
    let context = ctx(None, json!({"active": false}));
    assert!(!eval("active and undefinedFn()", &context).unwrap());
    assert!(eval("active or undefinedFn()", &context).is_err());
    assert!(eval("active == false or undefinedFn()", &context).unwrap());
}

#[test]
fn test_unknown_function_is_reported_in_functions() {
    let parsed = parse("now() > 5 or changed('x')").unwrap();
    assert!(parsed.functions.contains("now"));
    assert!(parsed.functions.contains("changed"));
    assert!(parsed.identifiers.contains("x"));
}

// ============================================================================
// RULES
// ============================================================================

#[test]
fn test_validation_rule_then_required() {
    let rule: ValidationRule = serde_json::from_value(json!({
        "if": "amount >= 50000 and stage in ['Negotiation', 'Closed Won']",
        "then_required": ["discount", "closeDate"]
    }))
    .unwrap();

    let engine = RuleEngine::new(EngineConfig::default()).unwrap();
    let context = fixtures::opportunity_update();
    assert!(engine
        .evaluate_rule(&rule, &context, &EvaluateOptions::new())
        .unwrap());

    let missing: Vec<&str> = rule
        .then_required
        .iter()
        .filter(|field| context.after.get(field.as_str()).map_or(true, |v| v.is_null()))
        .map(String::as_str)
        .collect();
    assert_eq!(missing, vec!["discount"]);
}

#[test]
fn test_rule_without_condition_always_applies() {
    let rule: AssignmentRule = serde_json::from_value(json!({
        "when": "   ",
        "assign": {"priority": "high"}
    }))
    .unwrap();
    let engine = RuleEngine::new(EngineConfig::default()).unwrap();
    let context = ctx(None, json!({}));
    assert!(engine
        .evaluate_rule(&rule, &context, &EvaluateOptions::new())
        .unwrap());
}

// ============================================================================
// FIELD GUARD
// ============================================================================

#[test]
fn test_allowlist_rejects_before_evaluation() {
    let allowlist: FieldAllowlist = fixtures::opportunity_fields().into_iter().collect();
    let options = EvaluateOptions::new().with_validator(&allowlist);
    let context = fixtures::opportunity_update();

    assert!(evaluate("billingAddress.city == 'Porto'", &context, &options).unwrap());

    // The unknown function would fail evaluation; rejection comes first.
    let result = evaluate("owner.id == 'u-17' and undefinedFn()", &context, &options);
    assert_field_rejected(&result, "owner.id");
    let err = result.unwrap_err();
    let rejected = err.rejection::<FieldNotAllowed>().expect("allowlist rejection");
    assert_eq!(rejected.path, "owner.id");
}

#[test]
fn test_allowlist_sees_changed_and_get_paths() {
    let allowlist: FieldAllowlist = ["stage"].into_iter().collect();
    let options = EvaluateOptions::new().with_validator(&allowlist);
    let context = fixtures::opportunity_update();

    assert!(evaluate("changed('stage')", &context, &options).unwrap());
    assert_field_rejected(
        &evaluate("get('owner.region') == 'EMEA'", &context, &options),
        "owner.region",
    );
}

#[test]
fn test_validator_called_once_per_identifier() {
    let seen = RefCell::new(Vec::new());
    let validator = |path: &str| -> Result<(), std::convert::Infallible> {
        seen.borrow_mut().push(path.to_string());
        Ok(())
    };
    let options = EvaluateOptions::new().with_validator(&validator);
    let context = fixtures::opportunity_update();

    evaluate(
        "stage == 'x' or stage == 'y' or changed('stage') or amount > 1",
        &context,
        &options,
    )
    .unwrap();
    assert_eq!(*seen.borrow(), vec!["amount".to_string(), "stage".to_string()]);
}

#[test]
fn test_custom_rejection_is_preserved() {
    #[derive(Debug, thiserror::Error)]
    #[error("{0} is restricted for this tenant")]
    struct Restricted(String);

    let validator = |path: &str| -> Result<(), Restricted> {
        if path == "amount" {
            Err(Restricted(path.to_string()))
        } else {
            Ok(())
        }
    };
    let options = EvaluateOptions::new().with_validator(&validator);
    let err = evaluate("amount > 1", &fixtures::opportunity_update(), &options).unwrap_err();

    assert!(matches!(err, RuleError::FieldRejected { .. }));
    assert_eq!(
        err.rejection::<Restricted>().map(|r| r.0.as_str()),
        Some("amount")
    );
}
