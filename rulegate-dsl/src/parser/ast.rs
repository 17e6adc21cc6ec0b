//! Abstract syntax tree for rule expressions

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Literal values written directly in an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

/// `and` / `or`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    Contains,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOp::And => write!(f, "and"),
            LogicalOp::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::In => "in",
            BinaryOp::Contains => "contains",
        };
        f.write_str(s)
    }
}

/// Expression node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    /// Dotted field path, e.g. `billingAddress.city`.
    Identifier(String),
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Function call. Any name parses; only the built-ins evaluate.
    Call { name: String, args: Vec<Expr> },
    Array(Vec<Expr>),
}

/// Result of parsing one expression string.
///
/// Carries no record state, so one instance can be shared (`Arc`) across
/// any number of evaluations and threads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedExpression {
    pub ast: Expr,
    /// Every dotted path the evaluator may dereference by name.
    pub identifiers: BTreeSet<String>,
    /// Every call name in the expression.
    pub functions: BTreeSet<String>,
}
