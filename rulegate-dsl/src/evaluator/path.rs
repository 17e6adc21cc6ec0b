//! Dotted path lookup inside record snapshots

use rulegate_core::{Record, Value};

/// Resolve `a.b.0.c` against a record. Numeric segments index arrays.
///
/// Returns `None` when any segment is absent; an explicit `null` field is
/// `Some(&Value::Null)`.
pub fn resolve<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Map(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}
