//! Error types for rulegate operations

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error returned by host-supplied field validators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed expression text, with the position of the offending token.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Syntax error at line {line}, column {column}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

/// Expression parsed, but cannot be evaluated against the given context.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Unsupported function: {name}")]
    UnsupportedFunction { name: String },

    #[error("Value is not comparable: {value}")]
    NotComparable { value: String },

    #[error("Left side of 'contains' must be a string or an array, got {found}")]
    InvalidContainsOperand { found: String },

    #[error("Right side of 'in' must be an array, got {found}")]
    InRequiresArray { found: String },

    #[error("{function}() expects a field path string, got {found}")]
    InvalidPathArgument { function: String, found: String },
}

/// Snapshot construction errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("Snapshot '{side}' must be a JSON object, got {found}")]
    NotAnObject { side: String, found: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Master error type for all rulegate errors.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The host validator refused a field reference. `source` is the host's
    /// error exactly as it was returned.
    #[error("Field reference '{path}' rejected: {source}")]
    FieldRejected {
        path: String,
        #[source]
        source: BoxError,
    },

    #[error("Expression is {len} bytes, maximum is {max}")]
    SourceTooLong { len: usize, max: usize },

    #[error("Expression cache lock poisoned")]
    CachePoisoned,
}

impl RuleError {
    /// Borrow the host validator's error as a concrete type, if this is a
    /// field rejection carrying one.
    pub fn rejection<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::FieldRejected { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, Self::Semantic(_))
    }
}

/// Result type alias for rulegate operations.
pub type RuleResult<T> = Result<T, RuleError>;

// =============================================================================
// TESTS
// =============================================================================
