//! rulegate Core - Data Types
//!
//! Pure data structures shared by the expression engine and its hosts:
//! record values, evaluation contexts, rule definitions, configuration and
//! the error taxonomy. No parsing or evaluation logic lives here.

pub mod config;
pub mod context;
pub mod error;
pub mod rule;
pub mod value;

pub use config::*;
pub use context::*;
pub use error::*;
pub use rule::*;
pub use value::*;
