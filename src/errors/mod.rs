//! Error types and error handling for the compiler.
//!
//! Every pass reports failure through a single [`errors::Error`], which pairs
//! an [`errors::ErrorImpl`] variant with the source position it was raised at.
//! Runtime traps are not represented here: they live in the generated code.

pub mod errors;
