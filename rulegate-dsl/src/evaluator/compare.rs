//! Value normalization, equality and coercion rules
//!
//! Every operator goes through [`normalize`] first, so decimals are compared
//! as plain numbers everywhere.

use chrono::{DateTime, NaiveDate};
use rulegate_core::{SemanticError, Value};

/// Replace decimals by their numeric value, recursively.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Decimal(d) => Value::Number(d.to_number()),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize).collect()),
        Value::Map(map) => Value::Map(map.into_iter().map(|(k, v)| (k, normalize(v))).collect()),
        other => other,
    }
}

/// Structural equality on normalized values.
///
/// Arrays compare element-wise in order, maps by key set and values. No
/// cross-type coercion: `5 == '5'` is false. NaN is never equal to anything.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Decimal(x), Value::Decimal(y)) => x.to_number() == y.to_number(),
        (Value::Decimal(x), Value::Number(y)) | (Value::Number(y), Value::Decimal(x)) => {
            x.to_number() == *y
        }
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x.timestamp_millis() == y.timestamp_millis(),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).map(|other| deep_equal(v, other)).unwrap_or(false))
        }
        _ => false,
    }
}

/// Numeric view of a value for `>`, `>=`, `<`, `<=`.
///
/// Numbers pass through, numeric strings parse, dates and date strings
/// become epoch milliseconds.
pub fn to_comparable(value: &Value) -> Result<f64, SemanticError> {
    match value {
        Value::Number(n) => Ok(*n),
        Value::Decimal(d) => Ok(d.to_number()),
        Value::Date(d) => Ok(d.timestamp_millis() as f64),
        Value::String(s) => parse_numeric(s)
            .or_else(|| parse_date_millis(s))
            .ok_or_else(|| not_comparable(value)),
        _ => Err(not_comparable(value)),
    }
}

fn not_comparable(value: &Value) -> SemanticError {
    SemanticError::NotComparable {
        value: format!("{} ({})", value, value.type_name()),
    }
}

fn parse_numeric(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    // Rust also accepts "inf" and "NaN"; record values never mean those.
    if trimmed.is_empty()
        || trimmed
            .chars()
            .any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E')
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

fn parse_date_millis(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis() as f64);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
}

/// Loose truthiness: null, false, 0, NaN and "" are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::Decimal(d) => {
            let n = d.to_number();
            n != 0.0 && !n.is_nan()
        }
        Value::String(s) => !s.is_empty(),
        Value::Date(_) | Value::Array(_) | Value::Map(_) => true,
    }
}

/// `left in right`.
pub fn is_member(left: &Value, right: &Value) -> Result<bool, SemanticError> {
    match right {
        Value::Array(items) => Ok(items.iter().any(|item| deep_equal(left, item))),
        other => Err(SemanticError::InRequiresArray {
            found: other.type_name().to_string(),
        }),
    }
}

/// Text a non-string needle is searched as. Arrays join their items with
/// `,` and nulls inside them render empty, so `'a,b' contains ['a', 'b']`.
fn needle_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => needle_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

/// `left contains right`: substring for strings, membership for arrays.
pub fn contains(left: &Value, right: &Value) -> Result<bool, SemanticError> {
    match left {
        Value::String(haystack) => Ok(match right {
            Value::String(needle) => haystack.contains(needle.as_str()),
            other => haystack.contains(needle_text(other).as_str()),
        }),
        Value::Array(items) => Ok(items.iter().any(|item| deep_equal(item, right))),
        other => Err(SemanticError::InvalidContainsOperand {
            found: other.type_name().to_string(),
        }),
    }
}
