//! Field reference validation
//!
//! The engine does not know which fields a tenant's object type exposes. The
//! host injects a [`FieldReferenceValidator`]; the evaluator calls it for
//! every identifier the parser collected, including paths named through
//! `changed('...')` and `get('...')`, before any record value is read.

use rulegate_core::BoxError;
use std::collections::BTreeSet;
use thiserror::Error;

/// Host hook deciding whether a dotted field path may be referenced.
pub trait FieldReferenceValidator {
    /// `Ok(())` permits the path. The error is returned to the caller
    /// unchanged inside `RuleError::FieldRejected`.
    fn check_field(&self, path: &str) -> Result<(), BoxError>;
}

impl<F, E> FieldReferenceValidator for F
where
    F: Fn(&str) -> Result<(), E>,
    E: Into<BoxError>,
{
    fn check_field(&self, path: &str) -> Result<(), BoxError> {
        self(path).map_err(Into::into)
    }
}

/// Rejection raised by [`FieldAllowlist`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Field '{path}' is not allowed in rule expressions")]
pub struct FieldNotAllowed {
    pub path: String,
}

/// Set of permitted dotted paths.
///
/// An entry `billingAddress.*` permits every path below `billingAddress`
/// (but not `billingAddress` itself).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAllowlist {
    exact: BTreeSet<String>,
    prefixes: BTreeSet<String>,
}

impl FieldAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&mut self, path: impl Into<String>) -> &mut Self {
        let path = path.into();
        match path.strip_suffix(".*") {
            Some(prefix) => {
                self.prefixes.insert(prefix.to_string());
            }
            None => {
                self.exact.insert(path);
            }
        }
        self
    }

    pub fn permits(&self, path: &str) -> bool {
        if self.exact.contains(path) {
            return true;
        }
        self.prefixes.iter().any(|prefix| {
            path.strip_prefix(prefix.as_str())
                .map(|rest| rest.starts_with('.') && rest.len() > 1)
                .unwrap_or(false)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.prefixes.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FieldAllowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = Self::new();
        for path in iter {
            list.allow(path);
        }
        list
    }
}

impl FieldReferenceValidator for FieldAllowlist {
    fn check_field(&self, path: &str) -> Result<(), BoxError> {
        if self.permits(path) {
            Ok(())
        } else {
            Err(Box::new(FieldNotAllowed {
                path: path.to_string(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowlist_exact_and_prefix() {
        let list: FieldAllowlist = ["amount", "status", "billingAddress.*"].into_iter().collect();
        assert!(list.permits("amount"));
        assert!(list.permits("billingAddress.city"));
        assert!(list.permits("billingAddress.geo.lat"));
        assert!(!list.permits("billingAddress"));
        assert!(!list.permits("billingAddressX.city"));
        assert!(!list.permits("billingAddress."));
        assert!(!list.permits("ownerSsn"));
    }

    #[test]
    fn test_allowlist_rejection_type() {
        let list: FieldAllowlist = ["amount"].into_iter().collect();
        let err = list.check_field("ssn").unwrap_err();
        let rejected = err.downcast_ref::<FieldNotAllowed>().expect("FieldNotAllowed");
        assert_eq!(rejected.path, "ssn");
        assert!(list.check_field("amount").is_ok());
    }

    #[test]
    fn test_closure_validator() {
        let validator = |path: &str| -> Result<(), String> {
            if path.starts_with("internal") {
                Err(format!("{} is internal", path))
            } else {
                Ok(())
            }
        };
        assert!(validator.check_field("amount").is_ok());
        let err = validator.check_field("internalScore").unwrap_err();
        assert_eq!(err.to_string(), "internalScore is internal");
    }

    #[test]
    fn test_empty_allowlist_rejects_everything() {
        let list = FieldAllowlist::new();
        assert!(list.is_empty());
        assert!(list.check_field("amount").is_err());
    }
}
