//! Evaluator - walk a parsed expression against a record mutation
//!
//! # Pipeline
//!
//! ```text
//! ParsedExpression ──► FieldReferenceValidator (every identifier, once)
//!                  └─► Evaluator::eval (AST × EvaluationContext) ──► truthiness ──► bool
//! ```
//!
//! Identifiers read `after` first and fall back to `before`. The built-ins
//! `changed(path)` and `get(path)` read each side explicitly instead.

pub mod compare;
pub mod path;

use crate::guard::FieldReferenceValidator;
use crate::parser::{parse, BinaryOp, Expr, Literal, LogicalOp, ParsedExpression};
use compare::{contains, deep_equal, is_member, is_truthy, normalize, to_comparable};
use rulegate_core::{EvaluationContext, RuleError, RuleResult, SemanticError, Value};

// ============================================================================
// OPTIONS
// ============================================================================

/// Per-call evaluation options.
#[derive(Clone, Copy, Default)]
pub struct EvaluateOptions<'v> {
    /// Called once per distinct identifier before anything is evaluated.
    pub field_validator: Option<&'v dyn FieldReferenceValidator>,
}

impl<'v> EvaluateOptions<'v> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: &'v dyn FieldReferenceValidator) -> Self {
        self.field_validator = Some(validator);
        self
    }
}

impl std::fmt::Debug for EvaluateOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluateOptions")
            .field("field_validator", &self.field_validator.is_some())
            .finish()
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Parse and evaluate `source` against `context`.
pub fn evaluate(
    source: &str,
    context: &EvaluationContext,
    options: &EvaluateOptions<'_>,
) -> RuleResult<bool> {
    let parsed = parse(source)?;
    evaluate_parsed(&parsed, context, options)
}

/// Evaluate an already parsed expression.
///
/// The field validator sees the complete identifier set before any record
/// value is read; the first rejection aborts the call with
/// [`RuleError::FieldRejected`].
pub fn evaluate_parsed(
    parsed: &ParsedExpression,
    context: &EvaluationContext,
    options: &EvaluateOptions<'_>,
) -> RuleResult<bool> {
    if let Some(validator) = options.field_validator {
        for path in &parsed.identifiers {
            validator.check_field(path).map_err(|source| {
                tracing::warn!(path = %path, error = %source, "Field reference rejected");
                RuleError::FieldRejected {
                    path: path.clone(),
                    source,
                }
            })?;
        }
    }

    let value = Evaluator::new(context).eval(&parsed.ast)?;
    let result = is_truthy(&value);
    tracing::trace!(result, "Expression evaluated");
    Ok(result)
}

// ============================================================================
// EVALUATOR
// ============================================================================

/// Tree-walking evaluator bound to one context. Never mutates the AST.
pub struct Evaluator<'a> {
    context: &'a EvaluationContext,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: &'a EvaluationContext) -> Self {
        Self { context }
    }

    /// Evaluate a node to a value. Missing fields evaluate to `Null`.
    pub fn eval(&self, expr: &Expr) -> Result<Value, SemanticError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Identifier(path) => Ok(self.lookup(path).cloned().unwrap_or(Value::Null)),
            Expr::Array(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Logical { op, left, right } => {
                let left = is_truthy(&self.eval(left)?);
                let result = match op {
                    LogicalOp::And => left && is_truthy(&self.eval(right)?),
                    LogicalOp::Or => left || is_truthy(&self.eval(right)?),
                };
                Ok(Value::Bool(result))
            }
            Expr::Binary { op, left, right } => {
                let left = normalize(self.eval(left)?);
                let right = normalize(self.eval(right)?);
                binary(*op, &left, &right).map(Value::Bool)
            }
            Expr::Call { name, args } => self.call(name, args),
        }
    }

    /// `after` first, then `before`.
    fn lookup(&self, path: &str) -> Option<&'a Value> {
        path::resolve(&self.context.after, path).or_else(|| {
            self.context
                .before
                .as_ref()
                .and_then(|before| path::resolve(before, path))
        })
    }

    fn call(&self, name: &str, args: &[Expr]) -> Result<Value, SemanticError> {
        match name {
            "changed" => {
                let path = self.path_argument(name, args)?;
                let before = self
                    .context
                    .before
                    .as_ref()
                    .and_then(|before| path::resolve(before, &path))
                    .cloned()
                    .map(normalize);
                let after = path::resolve(&self.context.after, &path)
                    .cloned()
                    .map(normalize);
                let unchanged = match (&before, &after) {
                    (None, None) => true,
                    (Some(b), Some(a)) => deep_equal(b, a),
                    _ => false,
                };
                Ok(Value::Bool(!unchanged))
            }
            "get" => {
                let path = self.path_argument(name, args)?;
                Ok(path::resolve(&self.context.after, &path)
                    .cloned()
                    .unwrap_or(Value::Null))
            }
            _ => Err(SemanticError::UnsupportedFunction {
                name: name.to_string(),
            }),
        }
    }

    /// First argument as a field path.
    ///
    /// A literal names the field directly. An identifier argument is read
    /// from the record and its *value* is used as the path, so a rule can
    /// watch a field chosen by another field.
    fn path_argument(&self, function: &str, args: &[Expr]) -> Result<String, SemanticError> {
        let arg = args
            .first()
            .ok_or_else(|| SemanticError::InvalidPathArgument {
                function: function.to_string(),
                found: "no argument".to_string(),
            })?;

        match self.eval(arg)? {
            Value::String(path) => Ok(path),
            other => Err(SemanticError::InvalidPathArgument {
                function: function.to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => Value::String(s.clone()),
        Literal::Number(n) => Value::Number(*n),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<bool, SemanticError> {
    match op {
        BinaryOp::Eq => Ok(deep_equal(left, right)),
        BinaryOp::Ne => Ok(!deep_equal(left, right)),
        BinaryOp::Gt => Ok(to_comparable(left)? > to_comparable(right)?),
        BinaryOp::Ge => Ok(to_comparable(left)? >= to_comparable(right)?),
        BinaryOp::Lt => Ok(to_comparable(left)? < to_comparable(right)?),
        BinaryOp::Le => Ok(to_comparable(left)? <= to_comparable(right)?),
        BinaryOp::In => is_member(left, right),
        BinaryOp::Contains => contains(left, right),
    }
}

// ============================================================================
// TESTS
// ============================================================================
