//! Fuzz test for the rule expression parser and evaluator
//!
//! Any input must either fail with a located syntax error or parse into an
//! expression that pretty-prints to an equivalent AST and evaluates without
//! panicking.
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use rulegate_dsl::{
    evaluate_parsed, parse_with_max_depth, pretty_print, EvaluateOptions, EvaluationContext,
};

const MAX_DEPTH: usize = 64;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match parse_with_max_depth(input, MAX_DEPTH) {
            Ok(parsed) => {
                let printed = pretty_print(&parsed.ast);
                let reparsed = parse_with_max_depth(&printed, MAX_DEPTH)
                    .unwrap_or_else(|e| panic!("canonical form failed to parse: {} ({})", printed, e));
                // NaN literals make AST equality fail, so compare the printed fixed point
                assert_eq!(pretty_print(&reparsed.ast), printed);
                assert_eq!(parsed.identifiers, reparsed.identifiers);
                assert_eq!(parsed.functions, reparsed.functions);

                let context = EvaluationContext::from_json(
                    Some(serde_json::json!({"status": "New", "amount": 10})),
                    serde_json::json!({"status": "Won", "amount": "12", "tags": ["a"]}),
                )
                .expect("static context");
                let _ = evaluate_parsed(&parsed, &context, &EvaluateOptions::new());
            }
            Err(err) => {
                assert!(err.line >= 1, "Error line should be >= 1");
                assert!(err.column >= 1, "Error column should be >= 1");
                assert!(!err.message.is_empty(), "Error message should not be empty");
            }
        }
    }
});
