//! Parser module for rule expressions

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::*;
