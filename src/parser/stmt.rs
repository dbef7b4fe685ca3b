use crate::{
    ast::{ast::Block, statements::Stmt},
    errors::errors::Error,
    lexer::tokens::TokenKind,
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::{parser::Parser, types::parse_type};

pub fn parse_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    if let Some(handler) = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied()
    {
        return handler(parser);
    }

    let expr = parse_expr(parser, BindingPower::Default)?;

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Expression(expr))
}

/// `type VAR = expr ;`
pub fn parse_var_decl_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.get_position();
    let ty = parse_type(parser)?;

    let name = parser
        .expect_detailed(TokenKind::Variable, "expected variable during variable declaration")?
        .value;

    parser.expect_detailed(TokenKind::Assignment, "variables must be initialized")?;
    let value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::VarDecl {
        name,
        ty,
        value,
        span: parser.span_from(start),
    })
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    parser.expect_detailed(TokenKind::OpenParen, "expected `(` after if")?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect_detailed(TokenKind::CloseParen, "expected `)` after if condition")?;

    let then_body = parse_stmt(parser)?;

    let else_body = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        Some(Box::new(parse_stmt(parser)?))
    } else {
        None
    };

    Ok(Stmt::If {
        condition,
        then_body: Box::new(then_body),
        else_body,
        span: parser.span_from(start),
    })
}

pub fn parse_while_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    parser.expect_detailed(TokenKind::OpenParen, "expected `(` after while")?;
    let condition = parse_expr(parser, BindingPower::Default)?;
    parser.expect_detailed(TokenKind::CloseParen, "expected `)` after while condition")?;

    let body = parse_stmt(parser)?;

    Ok(Stmt::While {
        condition,
        body: Box::new(body),
        span: parser.span_from(start),
    })
}

pub fn parse_block(parser: &mut Parser) -> Result<Block, Error> {
    let start = parser
        .expect_detailed(TokenKind::OpenCurly, "expected `{` to open a block")?
        .span
        .start;

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Block {
        statements,
        span: parser.span_from(start),
    })
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    Ok(Stmt::Block(parse_block(parser)?))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let value = if parser.current_token_kind() != TokenKind::Semicolon {
        Some(parse_expr(parser, BindingPower::Default)?)
    } else {
        None
    };

    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Return {
        value,
        span: parser.span_from(start),
    })
}

/// `print "literal" ;` or `print expr ;`
pub fn parse_print_stmt(parser: &mut Parser) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    if parser.current_token_kind() == TokenKind::String {
        let value = parser.advance().value;
        parser.expect(TokenKind::Semicolon)?;

        return Ok(Stmt::PrintLiteral {
            value,
            span: parser.span_from(start),
        });
    }

    let value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Stmt::Print {
        value,
        span: parser.span_from(start),
    })
}
