//! Backend module.
//!
//! Takes a generated module the rest of the way: verification, the LLVM
//! optimization pipeline, JIT execution of `run`, and textual IR or native
//! object output.

pub mod backend;

#[cfg(test)]
mod tests;
