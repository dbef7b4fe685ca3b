use std::fmt::Display;

use inkwell::builder::BuilderError;
use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_error_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UndeclaredVariable { .. } => "UndeclaredVariable",
            ErrorImpl::UndeclaredFunction { .. } => "UndeclaredFunction",
            ErrorImpl::DuplicateEntryPoint => "DuplicateEntryPoint",
            ErrorImpl::EntryPointReturnType { .. } => "EntryPointReturnType",
            ErrorImpl::EntryPointParameters { .. } => "EntryPointParameters",
            ErrorImpl::MissingEntryPoint => "MissingEntryPoint",
            ErrorImpl::InvalidReturnType { .. } => "InvalidReturnType",
            ErrorImpl::InvalidDeclarationType { .. } => "InvalidDeclarationType",
            ErrorImpl::InvalidReferenceInitializer { .. } => "InvalidReferenceInitializer",
            ErrorImpl::InvalidReferenceArgument { .. } => "InvalidReferenceArgument",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::TypeMismatch { .. } => "TypeMismatch",
            ErrorImpl::InvalidCast { .. } => "InvalidCast",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::ReservedFunctionName { .. } => "ReservedFunctionName",
            ErrorImpl::InvalidAccessorSignature { .. } => "InvalidAccessorSignature",
            ErrorImpl::LiteralOutOfRange { .. } => "LiteralOutOfRange",
            ErrorImpl::NotAddressable { .. } => "NotAddressable",
            ErrorImpl::CodegenError { .. } => "CodegenError",
            ErrorImpl::BackendError { .. } => "BackendError",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UndeclaredVariable { variable } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", variable))
            }
            ErrorImpl::UndeclaredFunction { function } => ErrorTip::Suggestion(format!(
                "Function `{}` not declared, functions must be declared before they are called",
                function
            )),
            ErrorImpl::DuplicateEntryPoint => ErrorTip::Suggestion(String::from(
                "Only one `run` function may be declared",
            )),
            ErrorImpl::EntryPointReturnType { received } => ErrorTip::Suggestion(format!(
                "`run` must return `int`, found `{}`",
                received
            )),
            ErrorImpl::EntryPointParameters { received } => ErrorTip::Suggestion(format!(
                "`run` takes no parameters, found {}",
                received
            )),
            ErrorImpl::MissingEntryPoint => {
                ErrorTip::Suggestion(String::from("Declare `def int run() { ... }`"))
            }
            ErrorImpl::InvalidReturnType { function, received } => ErrorTip::Suggestion(format!(
                "Function `{}` cannot return `{}`",
                function, received
            )),
            ErrorImpl::InvalidDeclarationType { name, type_ } => ErrorTip::Suggestion(format!(
                "`{}` cannot be declared with type `{}`",
                name, type_
            )),
            ErrorImpl::InvalidReferenceInitializer { variable } => ErrorTip::Suggestion(format!(
                "Reference `{}` must be initialized with a variable",
                variable
            )),
            ErrorImpl::InvalidReferenceArgument { function, index } => {
                ErrorTip::Suggestion(format!(
                    "Argument {} of `{}` is a reference and must be a variable",
                    index, function
                ))
            }
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::MissingArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::ArgumentTypeMatchError { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Expected argument type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::TypeMismatch { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::InvalidCast { from, to } => {
                ErrorTip::Suggestion(format!("Cannot cast `{}` to `{}`", from, to))
            }
            ErrorImpl::FunctionAlreadyDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already declared", function))
            }
            ErrorImpl::ReservedFunctionName { function } => ErrorTip::Suggestion(format!(
                "`{}` is used by the runtime, choose another name",
                function
            )),
            ErrorImpl::InvalidAccessorSignature { function, expected } => {
                ErrorTip::Suggestion(format!(
                    "`{}` is provided by the compiler and must be declared as `extern {};`",
                    function, expected
                ))
            }
            ErrorImpl::LiteralOutOfRange { literal } => ErrorTip::Suggestion(format!(
                "`{}` does not fit in a 32-bit `cint`",
                literal
            )),
            ErrorImpl::NotAddressable { function } => ErrorTip::Suggestion(format!(
                "Reference arguments to `{}` must refer to a variable",
                function
            )),
            ErrorImpl::CodegenError { .. } => ErrorTip::None,
            ErrorImpl::BackendError { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.position.1, self.internal_error)
    }
}

impl std::error::Error for Error {}

impl From<BuilderError> for ErrorImpl {
    fn from(value: BuilderError) -> Self {
        ErrorImpl::CodegenError {
            message: value.to_string(),
        }
    }
}

impl From<BuilderError> for Error {
    fn from(value: BuilderError) -> Self {
        Error::new(value.into(), Position::null())
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message:?}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("variable {variable:?} not declared")]
    UndeclaredVariable { variable: String },
    #[error("function {function:?} not declared")]
    UndeclaredFunction { function: String },
    #[error("entry point `run` declared more than once")]
    DuplicateEntryPoint,
    #[error("entry point `run` must return int, found {received}")]
    EntryPointReturnType { received: String },
    #[error("entry point `run` must take no parameters, found {received}")]
    EntryPointParameters { received: usize },
    #[error("no entry point `run` declared")]
    MissingEntryPoint,
    #[error("function {function:?} cannot return {received}")]
    InvalidReturnType { function: String, received: String },
    #[error("{name:?} cannot be declared as {type_}")]
    InvalidDeclarationType { name: String, type_: String },
    #[error("reference {variable:?} must be initialized with a variable")]
    InvalidReferenceInitializer { variable: String },
    #[error("argument {index} of {function:?} must be a variable")]
    InvalidReferenceArgument { function: String, index: usize },
    #[error("unexpected arguments: expected {expected:?}, received {received:?}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("missing arguments: expected {expected:?}, received {received:?}")]
    MissingArguments { expected: usize, received: usize },
    #[error("argument types do not match: expected {expected:?}, received {received:?}")]
    ArgumentTypeMatchError { expected: String, received: String },
    #[error("types do not match: expected {expected:?}, received {received:?}")]
    TypeMismatch { expected: String, received: String },
    #[error("invalid cast from {from} to {to}")]
    InvalidCast { from: String, to: String },
    #[error("function {function:?} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("function name {function:?} is reserved")]
    ReservedFunctionName { function: String },
    #[error("{function:?} must be declared as {expected}")]
    InvalidAccessorSignature { function: String, expected: String },
    #[error("literal {literal} out of range for cint")]
    LiteralOutOfRange { literal: i64 },
    #[error("reference argument to {function:?} is not addressable")]
    NotAddressable { function: String },
    #[error("code generation failed: {message}")]
    CodegenError { message: String },
    #[error("backend failed: {message}")]
    BackendError { message: String },
}
