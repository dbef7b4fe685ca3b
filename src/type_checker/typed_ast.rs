//! The typed mirror of the AST.
//!
//! Produced by the type checker and consumed by the code generator. Every
//! expression carries exactly one resolved [`Type`]; calls also carry the
//! callee's parameter types so the code generator knows which arguments are
//! passed by address.

use crate::{
    ast::{
        expressions::{BinaryOperator, UnaryOperator},
        types::Type,
    },
    Span,
};

#[derive(Debug, Clone, PartialEq)]
pub struct TypedProgram {
    pub externs: Vec<TypedExtern>,
    pub functions: Vec<TypedFunction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExtern {
    pub name: String,
    pub return_type: Type,
    pub param_types: Vec<Type>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedFunction {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<TypedParam>,
    pub body: TypedBlock,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedParam {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedBlock {
    pub statements: Vec<TypedStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmt {
    Block(TypedBlock),
    Return(Option<TypedExpr>),
    VarDecl {
        name: String,
        ty: Type,
        value: TypedExpr,
    },
    Expression(TypedExpr),
    While {
        condition: TypedExpr,
        body: Box<TypedStmt>,
    },
    If {
        condition: TypedExpr,
        then_body: Box<TypedStmt>,
        else_body: Option<Box<TypedStmt>>,
    },
    Print(TypedExpr),
    PrintLiteral(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    Variable(String),
    Binary {
        operator: BinaryOperator,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<TypedExpr>,
    },
    Cast {
        target: Type,
        value: Box<TypedExpr>,
    },
    Assign {
        variable: String,
        value: Box<TypedExpr>,
    },
    Call {
        callee: String,
        arguments: Vec<TypedExpr>,
        parameter_types: Vec<Type>,
    },
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, ty: Type, span: Span) -> Self {
        TypedExpr { kind, ty, span }
    }
}

impl TypedStmt {
    /// Calls `f` on every expression directly or transitively owned by this statement.
    pub fn visit_expressions(&self, f: &mut dyn FnMut(&TypedExpr)) {
        match self {
            TypedStmt::Block(block) => block
                .statements
                .iter()
                .for_each(|stmt| stmt.visit_expressions(f)),
            TypedStmt::Return(value) => {
                if let Some(value) = value {
                    value.visit(f);
                }
            }
            TypedStmt::VarDecl { value, .. } => value.visit(f),
            TypedStmt::Expression(expr) | TypedStmt::Print(expr) => expr.visit(f),
            TypedStmt::While { condition, body } => {
                condition.visit(f);
                body.visit_expressions(f);
            }
            TypedStmt::If {
                condition,
                then_body,
                else_body,
            } => {
                condition.visit(f);
                then_body.visit_expressions(f);
                if let Some(else_body) = else_body {
                    else_body.visit_expressions(f);
                }
            }
            TypedStmt::PrintLiteral(_) => {}
        }
    }
}

impl TypedExpr {
    /// Pre-order walk over this expression and its subexpressions.
    pub fn visit(&self, f: &mut dyn FnMut(&TypedExpr)) {
        f(self);
        match &self.kind {
            TypedExprKind::Binary { left, right, .. } => {
                left.visit(f);
                right.visit(f);
            }
            TypedExprKind::Unary { operand, .. } => operand.visit(f),
            TypedExprKind::Cast { value, .. } | TypedExprKind::Assign { value, .. } => value.visit(f),
            TypedExprKind::Call { arguments, .. } => arguments.iter().for_each(|arg| arg.visit(f)),
            TypedExprKind::IntLiteral(_)
            | TypedExprKind::FloatLiteral(_)
            | TypedExprKind::BoolLiteral(_)
            | TypedExprKind::Variable(_) => {}
        }
    }
}
