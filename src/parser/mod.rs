//! Parser module for building an Abstract Syntax Tree (AST).
//!
//! Transforms a token stream into a [`crate::ast::ast::Program`]. Expressions
//! are parsed with a Pratt parser: NUD (null denotation) handlers for prefix
//! positions and LED (left denotation) handlers for infix operators, with
//! binding powers giving the precedence
//! `= < || < && < == < (< >) < (+ -) < (* /) < unary`.
//! Statements are dispatched on their leading token.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
