//! Type checking and semantic analysis module.
//!
//! Walks the AST once, in source order, producing a typed AST while:
//!
//! - Resolving variables against the enclosing function's scope
//! - Resolving calls against the signatures declared so far
//! - Enforcing the entry point, declaration, reference and cast rules
//! - Annotating every expression with its resolved type
//!
//! Checking stops at the first violation.

pub mod type_checker;
pub mod typed_ast;

#[cfg(test)]
mod tests;
