//! Code generation module for the compiler.
//!
//! This module lowers the typed AST into an LLVM module. It handles:
//!
//! - Function, extern and builtin accessor definitions
//! - Variable slots and reference indirection
//! - Overflow-checked `cint` arithmetic and division traps
//! - Control flow and printing

pub mod compiler;
pub mod expr;
pub mod runtime;
pub mod stmt;
pub mod value;
