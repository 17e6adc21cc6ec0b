//! Evaluation context: the before/after snapshots of a record mutation

use crate::{ContextError, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A record snapshot keyed by top-level field name.
pub type Record = BTreeMap<String, Value>;

/// State of a record before and after a pending mutation.
///
/// `before` is `None` for creates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    pub before: Option<Record>,
    pub after: Record,
}

impl EvaluationContext {
    /// Context for a record being created.
    pub fn create(after: Record) -> Self {
        Self {
            before: None,
            after,
        }
    }

    /// Context for a record being updated.
    pub fn update(before: Record, after: Record) -> Self {
        Self {
            before: Some(before),
            after,
        }
    }

    /// Build a context from raw JSON snapshots.
    ///
    /// A JSON `null` for `before` is accepted and treated as a create.
    pub fn from_json(
        before: Option<serde_json::Value>,
        after: serde_json::Value,
    ) -> Result<Self, ContextError> {
        let before = match before {
            None | Some(serde_json::Value::Null) => None,
            Some(value) => Some(record_from_json("before", value)?),
        };
        Ok(Self {
            before,
            after: record_from_json("after", after)?,
        })
    }
}

fn record_from_json(side: &str, value: serde_json::Value) -> Result<Record, ContextError> {
    match Value::from(value) {
        Value::Map(map) => Ok(map),
        other => Err(ContextError::NotAnObject {
            side: side.to_string(),
            found: other.type_name().to_string(),
        }),
    }
}
