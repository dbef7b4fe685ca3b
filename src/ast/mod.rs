/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: the program, extern, function and block nodes
/// - expressions: the closed set of expression kinds and operators
/// - statements: the closed set of statement kinds
/// - types: the type system shared by the checker and the code generator
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
