//! rulegate Test Utilities
//!
//! Shared test infrastructure for the rulegate workspace:
//! - Proptest generators for record values, contexts and expression sources
//! - Fixtures for a CRM opportunity mutation
//! - Assertions on the error taxonomy

pub use rulegate_core::{
    Decimal, EvaluationContext, Record, RuleError, RuleResult, SemanticError, SyntaxError, Value,
};

use chrono::{DateTime, Utc};

/// Words the lexer reads as keywords regardless of case.
pub const KEYWORDS: [&str; 7] = ["and", "or", "in", "contains", "true", "false", "null"];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for values, records and rule expressions.

    use super::*;
    use proptest::prelude::*;

    // === Field paths ===

    /// One path segment. Never a keyword.
    pub fn arb_field_segment() -> impl Strategy<Value = String> {
        "[a-z][a-zA-Z0-9_]{0,7}".prop_filter("segment must not be a keyword", |s| !is_keyword(s))
    }

    /// Dotted path of one to three segments, e.g. `billingAddress.city`.
    pub fn arb_field_path() -> impl Strategy<Value = String> {
        prop::collection::vec(arb_field_segment(), 1..=3).prop_map(|segments| segments.join("."))
    }

    // === Values ===

    /// Generate a UTC timestamp between 2020 and 2030, millisecond precision.
    pub fn arb_date() -> impl Strategy<Value = DateTime<Utc>> {
        (1_577_836_800_000i64..1_893_456_000_000i64)
            .prop_map(|millis| DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    /// Generate a decimal such as `-1234.56`.
    pub fn arb_decimal() -> impl Strategy<Value = Decimal> {
        (any::<bool>(), 0u32..1_000_000, 0u32..100).prop_filter_map(
            "decimal text must parse",
            |(negative, whole, cents)| {
                let sign = if negative { "-" } else { "" };
                format!("{}{}.{:02}", sign, whole, cents).parse().ok()
            },
        )
    }

    /// Finite scalar values. Never NaN, so structural equality is reflexive.
    pub fn arb_scalar_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-1_000_000i64..1_000_000).prop_map(Value::from),
            (-1.0e6f64..1.0e6).prop_map(Value::Number),
            arb_decimal().prop_map(Value::Decimal),
            "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
            arb_date().prop_map(Value::Date),
        ]
    }

    /// Scalars, arrays and nested maps.
    pub fn arb_value() -> impl Strategy<Value = Value> {
        arb_scalar_value().prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map(arb_field_segment(), inner, 0..4)
                    .prop_map(Value::Map),
            ]
        })
    }

    /// A flat record with up to six fields.
    pub fn arb_record() -> impl Strategy<Value = Record> {
        prop::collection::btree_map(arb_field_segment(), arb_value(), 0..6)
    }

    /// A create (no `before`) or update context.
    pub fn arb_context() -> impl Strategy<Value = EvaluationContext> {
        (prop::option::of(arb_record()), arb_record()).prop_map(|(before, after)| match before {
            Some(before) => EvaluationContext::update(before, after),
            None => EvaluationContext::create(after),
        })
    }

    // === Expression sources ===

    /// Number literal as written in a rule, e.g. `42`, `-0.5`.
    pub fn arb_number_literal() -> impl Strategy<Value = String> {
        (any::<bool>(), 0u32..100_000, prop::option::of(0u32..1000)).prop_map(
            |(negative, whole, fraction)| {
                let sign = if negative { "-" } else { "" };
                match fraction {
                    Some(f) => format!("{}{}.{}", sign, whole, f),
                    None => format!("{}{}", sign, whole),
                }
            },
        )
    }

    /// Single-quoted string literal without escapes.
    pub fn arb_string_literal() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9 ]{0,8}".prop_map(|s| format!("'{}'", s))
    }

    fn arb_atom_source() -> impl Strategy<Value = String> {
        prop_oneof![
            4 => arb_field_path(),
            2 => arb_string_literal(),
            2 => arb_number_literal(),
            1 => prop_oneof![Just("true"), Just("false"), Just("null"), Just("TRUE")]
                .prop_map(|s| s.to_string()),
            1 => arb_field_path().prop_map(|p| format!("changed('{}')", p)),
            1 => arb_field_path().prop_map(|p| format!("get(\"{}\")", p)),
        ]
    }

    /// Operators as they may appear in source, including aliases.
    pub fn arb_operator() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("and"),
            Just("AND"),
            Just("&&"),
            Just("or"),
            Just("||"),
            Just("=="),
            Just("!="),
            Just(">"),
            Just(">="),
            Just("<"),
            Just("<="),
            Just("in"),
            Just("contains"),
        ]
    }

    /// Syntactically valid expression source.
    ///
    /// Any two expressions joined by a binary operator are again a valid
    /// expression, so the generator composes freely.
    pub fn arb_expression_source() -> impl Strategy<Value = String> {
        arb_atom_source().prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                3 => (inner.clone(), arb_operator(), inner.clone())
                    .prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
                1 => inner.clone().prop_map(|e| format!("({})", e)),
                1 => prop::collection::vec(inner, 0..4)
                    .prop_map(|items| format!("[{}]", items.join(", "))),
            ]
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! A CRM opportunity moving from Proposal to Negotiation.

    use super::*;
    use serde_json::json;

    pub fn opportunity_before() -> serde_json::Value {
        json!({
            "name": "Casa Lisboa renewal",
            "amount": 42000,
            "stage": "Proposal",
            "closeDate": "2026-11-30",
            "discount": null,
            "tags": ["renewal", "emea"],
            "billingAddress": {"city": "Lisboa", "country": "PT"},
            "owner": {"id": "u-17", "region": "EMEA"}
        })
    }

    pub fn opportunity_after() -> serde_json::Value {
        json!({
            "name": "Casa Lisboa renewal",
            "amount": "61000",
            "stage": "Negotiation",
            "closeDate": "2026-12-15T00:00:00Z",
            "discount": null,
            "tags": ["renewal", "emea", "priority"],
            "billingAddress": {"city": "Porto", "country": "PT"},
            "owner": {"id": "u-17", "region": "EMEA"}
        })
    }

    pub fn opportunity_update() -> EvaluationContext {
        EvaluationContext::from_json(Some(opportunity_before()), opportunity_after())
            .unwrap_or_default()
    }

    pub fn opportunity_create() -> EvaluationContext {
        EvaluationContext::from_json(None, opportunity_before()).unwrap_or_default()
    }

    /// Paths an opportunity rule may reference.
    pub fn opportunity_fields() -> Vec<&'static str> {
        vec![
            "name",
            "amount",
            "stage",
            "closeDate",
            "discount",
            "tags",
            "billingAddress.*",
            "owner.region",
        ]
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on rule results.

    use super::*;

    /// Assert that a result is a syntax error and return it.
    pub fn assert_syntax_error<T: std::fmt::Debug>(result: &RuleResult<T>) -> &SyntaxError {
        match result {
            Err(RuleError::Syntax(err)) => err,
            other => panic!("Expected syntax error, got {:?}", other),
        }
    }

    /// Assert that a result is a semantic error and return it.
    pub fn assert_semantic_error<T: std::fmt::Debug>(result: &RuleResult<T>) -> &SemanticError {
        match result {
            Err(RuleError::Semantic(err)) => err,
            other => panic!("Expected semantic error, got {:?}", other),
        }
    }

    /// Assert that a field validator rejected `path`.
    pub fn assert_field_rejected<T: std::fmt::Debug>(result: &RuleResult<T>, path: &str) {
        match result {
            Err(RuleError::FieldRejected { path: rejected, .. }) => {
                assert_eq!(rejected, path, "Wrong field rejected");
            }
            other => panic!("Expected rejection of '{}', got {:?}", path, other),
        }
    }
}
