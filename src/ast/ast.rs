//! Top-level AST nodes: the program and its declarations.

use serde::Serialize;

use crate::Span;

use super::{statements::Stmt, types::Type};

/// A whole source file: extern declarations followed by function definitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    pub externs: Vec<Extern>,
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extern {
    pub name: String,
    pub return_type: Type,
    pub param_types: Vec<Type>,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<Param>,
    pub body: Block,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    #[serde(skip)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub statements: Vec<Stmt>,
    #[serde(skip)]
    pub span: Span,
}
