//! rulegate DSL - Rule Expression Engine
//!
//! Parses boolean business rules such as
//! `amount >= 50000 and changed('status')` and evaluates them against the
//! before/after snapshots of a record mutation.
//!
//! Architecture:
//! ```text
//! Expression source
//!     ↓
//! Lexer (tokens)
//!     ↓
//! Parser (AST + referenced identifiers + functions)
//!     ↓
//! FieldReferenceValidator (host allowlist, once per identifier)
//!     ↓
//! Evaluator (AST × EvaluationContext → bool)
//! ```

pub mod engine;
pub mod evaluator;
pub mod guard;
pub mod lexer;
pub mod parser;
pub mod pretty_printer;

// Re-export key types for convenience
pub use engine::RuleEngine;
pub use evaluator::{evaluate, evaluate_parsed, EvaluateOptions, Evaluator};
pub use guard::{FieldAllowlist, FieldNotAllowed, FieldReferenceValidator};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use parser::*;
pub use pretty_printer::{pretty_print, round_trip};
pub use rulegate_core::{
    EngineConfig, EvaluationContext, Record, RuleError, RuleResult, SemanticError, SyntaxError,
    Value,
};
