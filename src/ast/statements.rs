use serde::Serialize;

use crate::Span;

use super::{ast::Block, expressions::Expr, types::Type};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    Block(Block),
    Return {
        value: Option<Expr>,
        #[serde(skip)]
        span: Span,
    },
    VarDecl {
        name: String,
        ty: Type,
        value: Expr,
        #[serde(skip)]
        span: Span,
    },
    Expression(Expr),
    While {
        condition: Expr,
        body: Box<Stmt>,
        #[serde(skip)]
        span: Span,
    },
    If {
        condition: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
        #[serde(skip)]
        span: Span,
    },
    Print {
        value: Expr,
        #[serde(skip)]
        span: Span,
    },
    PrintLiteral {
        value: String,
        #[serde(skip)]
        span: Span,
    },
}

impl Stmt {
    pub fn get_span(&self) -> &Span {
        match self {
            Stmt::Block(block) => &block.span,
            Stmt::Expression(expr) => &expr.span,
            Stmt::Return { span, .. }
            | Stmt::VarDecl { span, .. }
            | Stmt::While { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Print { span, .. }
            | Stmt::PrintLiteral { span, .. } => span,
        }
    }
}
