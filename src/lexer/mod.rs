//! Lexical analysis module for the compiler.
//!
//! Converts source text into a flat token stream using an ordered table of
//! anchored regex patterns. Keywords are recognised by looking identifiers up
//! in a reserved-word table, and `#` comments and whitespace are discarded.

pub mod lexer;
pub mod tokens;
