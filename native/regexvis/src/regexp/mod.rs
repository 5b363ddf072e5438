//! Immutable regular expression trees.
//!
//! This module provides the regex AST used to label automaton transitions:
//! - A precedence-aware recursive-descent parser
//! - Minimal-parenthesis printing
//! - A total order used for canonical sorting and deduplication
//! - A local rewrite optimiser

mod node;
mod optimise;
mod parser;
mod symbol;

pub use node::{Operator, RegexNode};
pub use parser::parse;
pub use symbol::{EPSILON, is_epsilon};
