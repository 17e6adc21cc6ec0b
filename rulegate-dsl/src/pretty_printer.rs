//! Pretty-printer: AST back to canonical expression source
//!
//! The output re-parses to an identical AST. Parentheses are emitted only
//! where precedence or left-associativity require them.

use crate::parser::{parse, Expr, Literal};
use rulegate_core::{format_number, SyntaxError};

const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_COMPARISON: u8 = 3;
const PREC_PRIMARY: u8 = 4;

/// Print an expression in canonical form.
pub fn pretty_print(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

/// Parse and pretty-print an expression (for round-trip testing).
pub fn round_trip(source: &str) -> Result<String, SyntaxError> {
    let parsed = parse(source)?;
    Ok(pretty_print(&parsed.ast))
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Logical { op, .. } => match op {
            crate::parser::LogicalOp::Or => PREC_OR,
            crate::parser::LogicalOp::And => PREC_AND,
        },
        Expr::Binary { .. } => PREC_COMPARISON,
        _ => PREC_PRIMARY,
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal(literal) => write_literal(out, literal),
        Expr::Identifier(path) => out.push_str(path),
        Expr::Logical { op, left, right } => {
            write_operand(out, left, precedence(expr), false);
            out.push_str(&format!(" {} ", op));
            write_operand(out, right, precedence(expr), true);
        }
        Expr::Binary { op, left, right } => {
            write_operand(out, left, PREC_COMPARISON, false);
            out.push_str(&format!(" {} ", op));
            write_operand(out, right, PREC_COMPARISON, true);
        }
        Expr::Call { name, args } => {
            out.push_str(name);
            out.push('(');
            write_list(out, args);
            out.push(')');
        }
        Expr::Array(items) => {
            out.push('[');
            write_list(out, items);
            out.push(']');
        }
    }
}

/// Operators are left-associative, so a right operand of equal precedence
/// needs parentheses to keep its shape.
fn write_operand(out: &mut String, operand: &Expr, parent: u8, is_right: bool) {
    let child = precedence(operand);
    let wrap = child < parent || (is_right && child == parent);
    if wrap {
        out.push('(');
    }
    write_expr(out, operand);
    if wrap {
        out.push(')');
    }
}

fn write_list(out: &mut String, items: &[Expr]) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, item);
    }
}

fn write_literal(out: &mut String, literal: &Literal) {
    match literal {
        Literal::String(s) => {
            out.push('\'');
            out.push_str(&escape_string(s));
            out.push('\'');
        }
        Literal::Number(n) => out.push_str(&number_literal(*n)),
        Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Null => out.push_str("null"),
    }
}

/// Number source that lexes back to the same value. NaN and infinities have
/// no literal of their own, so they print as malformed or overflowing digits.
fn number_literal(n: f64) -> String {
    if n.is_nan() {
        "0.0.0".to_string()
    } else if n.is_infinite() {
        let sign = if n < 0.0 { "-" } else { "" };
        format!("{}1{}", sign, "0".repeat(400))
    } else {
        format_number(n)
    }
}

pub(crate) fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}
