//! Type parsing implementation.
//!
//! Types are a keyword, optionally prefixed by `ref` or `noalias ref`.
//! Nested references parse fine here and are rejected by the type checker.

use std::collections::HashMap;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::parser::Parser;

/// Type alias for type handler functions.
pub type TypeNUDHandler = fn(&mut Parser) -> Result<Type, Error>;

/// Type alias for type lookup table.
pub type TypeNUDLookup = HashMap<TokenKind, TypeNUDHandler>;

/// Initializes the type parsing lookup table.
pub fn create_token_type_lookups(parser: &mut Parser) {
    for kind in [
        TokenKind::Int,
        TokenKind::CInt,
        TokenKind::Float,
        TokenKind::Bool,
        TokenKind::Void,
    ] {
        parser.type_nud(kind, parse_primitive_type);
    }
    parser.type_nud(TokenKind::Ref, parse_reference_type);
    parser.type_nud(TokenKind::NoAlias, parse_reference_type);
}

pub fn parse_primitive_type(parser: &mut Parser) -> Result<Type, Error> {
    let token = parser.advance();
    match token.kind {
        TokenKind::Int => Ok(Type::Int),
        TokenKind::CInt => Ok(Type::CheckedInt),
        TokenKind::Float => Ok(Type::Float),
        TokenKind::Bool => Ok(Type::Bool),
        TokenKind::Void => Ok(Type::Void),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken { token: token.value },
            token.span.start,
        )),
    }
}

pub fn parse_reference_type(parser: &mut Parser) -> Result<Type, Error> {
    let noalias = parser.current_token_kind() == TokenKind::NoAlias;
    if noalias {
        parser.advance();
    }

    parser.expect_detailed(TokenKind::Ref, "expected `ref` after `noalias`")?;
    let inner = parse_type(parser)?;

    Ok(Type::reference(inner, noalias))
}

pub fn parse_type(parser: &mut Parser) -> Result<Type, Error> {
    let token_kind = parser.current_token_kind();
    let Some(handler) = parser.get_type_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected a type"),
            },
            parser.get_position(),
        ));
    };

    handler(parser)
}
