use std::collections::HashMap;

use tracing::debug;

use crate::{
    ast::{
        ast::{Block, Extern, Function, Program},
        expressions::{Expr, ExprKind, UnaryOperator},
        statements::Stmt,
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::typed_ast::{
    TypedBlock, TypedExpr, TypedExprKind, TypedExtern, TypedFunction, TypedParam, TypedProgram,
    TypedStmt,
};

pub const ENTRY_POINT: &str = "run";

/// Symbols every generated module defines for itself.
pub const RUNTIME_SYMBOLS: [&str; 8] = [
    "printf",
    "exit",
    "fflush",
    "__cint_overflow_check",
    "__flush_stdout",
    "__fmt_int",
    "__fmt_float",
    "__fmt_str",
];

/// Externs the compiler defines from the command line operands.
fn accessor_signature(name: &str) -> Option<(Type, Vec<Type>)> {
    match name {
        "arg" => Some((Type::Int, vec![Type::Int])),
        "argf" => Some((Type::Float, vec![Type::Int])),
        _ => None,
    }
}

fn check_reserved_name(name: &str, position: &Position) -> Result<(), Error> {
    if RUNTIME_SYMBOLS.contains(&name) {
        return Err(Error::new(
            ErrorImpl::ReservedFunctionName {
                function: name.to_string(),
            },
            position.clone(),
        ));
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: Type,
    pub param_types: Vec<Type>,
}

impl FunctionSignature {
    /// Key under which the function's variables are scoped.
    pub fn scope_key(&self) -> String {
        format!("{} {}", self.return_type, self.name)
    }
}

/// Per-compilation checker state.
///
/// Signatures are registered in declaration order, so a call only resolves
/// against functions declared before it (or the enclosing function itself).
/// Variables are keyed by the enclosing function's scope key and purged when
/// that function's body has been checked.
#[derive(Debug, Default)]
pub struct TypeChecker {
    pub signatures: HashMap<String, FunctionSignature>,
    variables: HashMap<(String, String), Type>,
    current_scope: Option<String>,
    current_return_type: Option<Type>,
    has_entry_point: bool,
}

impl TypeChecker {
    pub fn new() -> Self {
        TypeChecker::default()
    }

    pub fn declare_variable(&mut self, name: &str, ty: Type) {
        let scope = self.current_scope.clone().unwrap_or_default();
        self.variables.insert((scope, name.to_string()), ty);
    }

    pub fn fetch_variable_type(&self, name: &str) -> Option<&Type> {
        let scope = self.current_scope.clone().unwrap_or_default();
        self.variables.get(&(scope, name.to_string()))
    }

    fn enter_scope(&mut self, signature: &FunctionSignature) {
        self.current_scope = Some(signature.scope_key());
        self.current_return_type = Some(signature.return_type.clone());
    }

    fn exit_scope(&mut self) {
        if let Some(scope) = self.current_scope.take() {
            self.variables.retain(|(owner, _), _| *owner != scope);
        }
        self.current_return_type = None;
    }

    fn check_declaration(&self, name: &str, ty: &Type, position: &Position) -> Result<(), Error> {
        if ty.is_valid_declaration() {
            Ok(())
        } else {
            Err(Error::new(
                ErrorImpl::InvalidDeclarationType {
                    name: name.to_string(),
                    type_: ty.to_string(),
                },
                position.clone(),
            ))
        }
    }

    pub fn check_program(&mut self, program: &Program) -> Result<TypedProgram, Error> {
        let externs = program
            .externs
            .iter()
            .map(|ext| self.check_extern(ext))
            .collect::<Result<Vec<_>, Error>>()?;

        let functions = program
            .functions
            .iter()
            .map(|function| self.check_function(function))
            .collect::<Result<Vec<_>, Error>>()?;

        if !self.has_entry_point {
            let position = program
                .functions
                .last()
                .map(|function| function.span.end.clone())
                .unwrap_or_else(Position::null);
            return Err(Error::new(ErrorImpl::MissingEntryPoint, position));
        }

        Ok(TypedProgram { externs, functions })
    }

    pub fn check_extern(&mut self, ext: &Extern) -> Result<TypedExtern, Error> {
        let position = ext.span.start.clone();

        if ext.name == ENTRY_POINT {
            return Err(Error::new(ErrorImpl::DuplicateEntryPoint, position));
        }
        check_reserved_name(&ext.name, &position)?;
        if self.signatures.contains_key(&ext.name) {
            return Err(Error::new(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: ext.name.clone(),
                },
                position,
            ));
        }
        if ext.return_type.is_reference() {
            return Err(Error::new(
                ErrorImpl::InvalidReturnType {
                    function: ext.name.clone(),
                    received: ext.return_type.to_string(),
                },
                position,
            ));
        }
        for ty in &ext.param_types {
            self.check_declaration(&ext.name, ty, &position)?;
        }
        if let Some((return_type, param_types)) = accessor_signature(&ext.name) {
            if ext.return_type != return_type || ext.param_types != param_types {
                return Err(Error::new(
                    ErrorImpl::InvalidAccessorSignature {
                        function: ext.name.clone(),
                        expected: format!("{} {}({})", return_type, ext.name, param_types[0]),
                    },
                    position,
                ));
            }
        }

        self.signatures.insert(
            ext.name.clone(),
            FunctionSignature {
                name: ext.name.clone(),
                return_type: ext.return_type.clone(),
                param_types: ext.param_types.clone(),
            },
        );

        Ok(TypedExtern {
            name: ext.name.clone(),
            return_type: ext.return_type.clone(),
            param_types: ext.param_types.clone(),
            span: ext.span.clone(),
        })
    }

    pub fn check_function(&mut self, function: &Function) -> Result<TypedFunction, Error> {
        let position = function.span.start.clone();

        if function.name == ENTRY_POINT {
            if self.has_entry_point || self.signatures.contains_key(ENTRY_POINT) {
                return Err(Error::new(ErrorImpl::DuplicateEntryPoint, position));
            }
            if function.return_type != Type::Int {
                return Err(Error::new(
                    ErrorImpl::EntryPointReturnType {
                        received: function.return_type.to_string(),
                    },
                    position,
                ));
            }
            if !function.params.is_empty() {
                return Err(Error::new(
                    ErrorImpl::EntryPointParameters {
                        received: function.params.len(),
                    },
                    position,
                ));
            }
            self.has_entry_point = true;
        } else {
            check_reserved_name(&function.name, &position)?;
            if self.signatures.contains_key(&function.name) {
                return Err(Error::new(
                    ErrorImpl::FunctionAlreadyDeclared {
                        function: function.name.clone(),
                    },
                    position,
                ));
            }
            if function.return_type.is_reference() {
                return Err(Error::new(
                    ErrorImpl::InvalidReturnType {
                        function: function.name.clone(),
                        received: function.return_type.to_string(),
                    },
                    position,
                ));
            }
        }

        for param in &function.params {
            self.check_declaration(&param.name, &param.ty, &param.span.start)?;
        }

        let signature = FunctionSignature {
            name: function.name.clone(),
            return_type: function.return_type.clone(),
            param_types: function.params.iter().map(|param| param.ty.clone()).collect(),
        };
        self.signatures
            .insert(function.name.clone(), signature.clone());

        self.enter_scope(&signature);
        for param in &function.params {
            self.declare_variable(&param.name, param.ty.clone());
        }

        let body = self.check_block(&function.body);
        self.exit_scope();

        debug!(function = %function.name, "type checked function");

        Ok(TypedFunction {
            name: function.name.clone(),
            return_type: function.return_type.clone(),
            params: function
                .params
                .iter()
                .map(|param| TypedParam {
                    name: param.name.clone(),
                    ty: param.ty.clone(),
                })
                .collect(),
            body: body?,
            span: function.span.clone(),
        })
    }

    pub fn check_block(&mut self, block: &Block) -> Result<TypedBlock, Error> {
        let statements = block
            .statements
            .iter()
            .map(|stmt| self.check_stmt(stmt))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(TypedBlock { statements })
    }

    pub fn check_stmt(&mut self, stmt: &Stmt) -> Result<TypedStmt, Error> {
        match stmt {
            Stmt::Block(block) => Ok(TypedStmt::Block(self.check_block(block)?)),
            Stmt::Expression(expr) => Ok(TypedStmt::Expression(self.check_expr(expr)?)),
            Stmt::VarDecl {
                name,
                ty,
                value,
                span,
            } => {
                self.check_declaration(name, ty, &span.start)?;

                let value = self.check_expr(value)?;
                if ty.is_reference() && !matches!(value.kind, TypedExprKind::Variable(_)) {
                    return Err(Error::new(
                        ErrorImpl::InvalidReferenceInitializer {
                            variable: name.clone(),
                        },
                        value.span.start.clone(),
                    ));
                }
                expect_equivalent(ty, &value)?;

                self.declare_variable(name, ty.clone());

                Ok(TypedStmt::VarDecl {
                    name: name.clone(),
                    ty: ty.clone(),
                    value,
                })
            }
            Stmt::Return { value, span } => {
                let return_type = self.current_return_type.clone().unwrap_or(Type::Void);

                match value {
                    Some(value) => {
                        let value = self.check_expr(value)?;
                        if return_type == Type::Void {
                            return Err(mismatch(&return_type, &value.ty, &value.span.start));
                        }
                        expect_equivalent(&return_type, &value)?;
                        Ok(TypedStmt::Return(Some(value)))
                    }
                    None if return_type == Type::Void => Ok(TypedStmt::Return(None)),
                    None => Err(mismatch(&return_type, &Type::Void, &span.start)),
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                let condition = self.check_condition(condition)?;
                let body = self.check_stmt(body)?;

                Ok(TypedStmt::While {
                    condition,
                    body: Box::new(body),
                })
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
                ..
            } => {
                let condition = self.check_condition(condition)?;
                let then_body = self.check_stmt(then_body)?;
                let else_body = match else_body {
                    Some(else_body) => Some(Box::new(self.check_stmt(else_body)?)),
                    None => None,
                };

                Ok(TypedStmt::If {
                    condition,
                    then_body: Box::new(then_body),
                    else_body,
                })
            }
            Stmt::Print { value, .. } => {
                let value = self.check_expr(value)?;
                if value.ty == Type::Void {
                    return Err(Error::new(
                        ErrorImpl::TypeMismatch {
                            expected: String::from("printable value"),
                            received: value.ty.to_string(),
                        },
                        value.span.start.clone(),
                    ));
                }

                Ok(TypedStmt::Print(value))
            }
            Stmt::PrintLiteral { value, .. } => Ok(TypedStmt::PrintLiteral(value.clone())),
        }
    }

    fn check_condition(&mut self, condition: &Expr) -> Result<TypedExpr, Error> {
        let condition = self.check_expr(condition)?;
        if *condition.ty.strip_reference() != Type::Bool {
            return Err(mismatch(&Type::Bool, &condition.ty, &condition.span.start));
        }

        Ok(condition)
    }

    pub fn check_expr(&mut self, expr: &Expr) -> Result<TypedExpr, Error> {
        let span = expr.span.clone();

        match &expr.kind {
            ExprKind::IntLiteral(value) => Ok(TypedExpr::new(
                TypedExprKind::IntLiteral(*value),
                Type::UntypedIntLiteral,
                span,
            )),
            ExprKind::FloatLiteral(value) => Ok(TypedExpr::new(
                TypedExprKind::FloatLiteral(*value),
                Type::Float,
                span,
            )),
            ExprKind::BoolLiteral(value) => Ok(TypedExpr::new(
                TypedExprKind::BoolLiteral(*value),
                Type::Bool,
                span,
            )),
            ExprKind::Variable(name) => {
                let Some(ty) = self.fetch_variable_type(name).cloned() else {
                    return Err(Error::new(
                        ErrorImpl::UndeclaredVariable {
                            variable: name.clone(),
                        },
                        span.start,
                    ));
                };

                Ok(TypedExpr::new(TypedExprKind::Variable(name.clone()), ty, span))
            }
            ExprKind::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.check_expr(left)?;
                let right = self.check_expr(right)?;

                if !left.ty.equivalent(&right.ty) {
                    return Err(mismatch(&left.ty, &right.ty, &right.span.start));
                }
                if operator.is_arithmetic() && !right.ty.is_numeric() {
                    return Err(mismatch(&Type::Int, &right.ty, &right.span.start));
                }

                // Arithmetic takes the right operand's type, so `$c + 1` with a
                // `cint` $c is typed `lit int` and `1 + $c` is typed `cint`.
                let ty = if operator.is_arithmetic() {
                    right.ty.strip_reference().clone()
                } else {
                    Type::Bool
                };

                Ok(TypedExpr::new(
                    TypedExprKind::Binary {
                        operator: *operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                    ty,
                    span,
                ))
            }
            ExprKind::Unary { operator, operand } => {
                let operand = self.check_expr(operand)?;
                let ty = operand.ty.strip_reference().clone();

                let rejected = match operator {
                    UnaryOperator::Not => matches!(ty, Type::Float | Type::Void),
                    UnaryOperator::Negate => matches!(ty, Type::Bool | Type::Void),
                };
                if rejected {
                    let expected = match operator {
                        UnaryOperator::Not => Type::Bool,
                        UnaryOperator::Negate => Type::Int,
                    };
                    return Err(mismatch(&expected, &ty, &operand.span.start));
                }

                Ok(TypedExpr::new(
                    TypedExprKind::Unary {
                        operator: *operator,
                        operand: Box::new(operand),
                    },
                    ty,
                    span,
                ))
            }
            ExprKind::Cast { target, value } => {
                let value = self.check_expr(value)?;

                if *target == Type::Void || !target.can_cast_from(&value.ty) {
                    return Err(Error::new(
                        ErrorImpl::InvalidCast {
                            from: value.ty.to_string(),
                            to: target.to_string(),
                        },
                        span.start,
                    ));
                }

                Ok(TypedExpr::new(
                    TypedExprKind::Cast {
                        target: target.clone(),
                        value: Box::new(value),
                    },
                    target.clone(),
                    span,
                ))
            }
            ExprKind::Assign { variable, value } => {
                let Some(target) = self.fetch_variable_type(variable).cloned() else {
                    return Err(Error::new(
                        ErrorImpl::UndeclaredVariable {
                            variable: variable.clone(),
                        },
                        span.start,
                    ));
                };

                let value = self.check_expr(value)?;
                expect_equivalent(&target, &value)?;

                Ok(TypedExpr::new(
                    TypedExprKind::Assign {
                        variable: variable.clone(),
                        value: Box::new(value),
                    },
                    target,
                    span,
                ))
            }
            ExprKind::Call { callee, arguments } => {
                let Some(signature) = self.signatures.get(callee).cloned() else {
                    return Err(Error::new(
                        ErrorImpl::UndeclaredFunction {
                            function: callee.clone(),
                        },
                        span.start,
                    ));
                };

                let expected = signature.param_types.len();
                if arguments.len() > expected {
                    return Err(Error::new(
                        ErrorImpl::UnexpectedArguments {
                            expected,
                            received: arguments.len(),
                        },
                        arguments[expected].span.start.clone(),
                    ));
                } else if arguments.len() < expected {
                    return Err(Error::new(
                        ErrorImpl::MissingArguments {
                            expected,
                            received: arguments.len(),
                        },
                        span.end,
                    ));
                }

                let mut typed_arguments = Vec::with_capacity(arguments.len());
                for (index, (argument, param_type)) in
                    arguments.iter().zip(&signature.param_types).enumerate()
                {
                    if param_type.is_reference() && argument.as_variable().is_none() {
                        return Err(Error::new(
                            ErrorImpl::InvalidReferenceArgument {
                                function: callee.clone(),
                                index,
                            },
                            argument.span.start.clone(),
                        ));
                    }

                    let argument = self.check_expr(argument)?;
                    if !param_type.equivalent(&argument.ty) {
                        return Err(Error::new(
                            ErrorImpl::ArgumentTypeMatchError {
                                expected: param_type.to_string(),
                                received: argument.ty.to_string(),
                            },
                            argument.span.start.clone(),
                        ));
                    }
                    typed_arguments.push(argument);
                }

                Ok(TypedExpr::new(
                    TypedExprKind::Call {
                        callee: callee.clone(),
                        arguments: typed_arguments,
                        parameter_types: signature.param_types,
                    },
                    signature.return_type,
                    span,
                ))
            }
        }
    }
}

fn mismatch(expected: &Type, received: &Type, position: &Position) -> Error {
    Error::new(
        ErrorImpl::TypeMismatch {
            expected: expected.to_string(),
            received: received.to_string(),
        },
        position.clone(),
    )
}

fn expect_equivalent(expected: &Type, value: &TypedExpr) -> Result<(), Error> {
    if expected.equivalent(&value.ty) {
        Ok(())
    } else {
        Err(mismatch(expected, &value.ty, &value.span.start))
    }
}

/// Checks a whole program, returning its typed mirror.
pub fn type_check(program: &Program) -> Result<TypedProgram, Error> {
    TypeChecker::new().check_program(program)
}
