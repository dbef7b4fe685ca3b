use crate::{
    ast::expressions::{BinaryOperator, Expr, ExprKind, UnaryOperator},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{lookups::BindingPower, parser::Parser, types::parse_type};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Expr, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let Some(nud) = parser.get_nud_lookup().get(&token_kind).copied() else {
        return Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        ));
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    while let Some(next_bp) = parser.get_bp_lookup().get(&parser.current_token_kind()).copied() {
        if next_bp <= bp {
            break;
        }

        let token_kind = parser.current_token_kind();
        let Some(led) = parser.get_led_lookup().get(&token_kind).copied() else {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_position(),
            ));
        };

        left = led(parser, left, next_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance();
    let span = token.span.clone();

    let kind = match token.kind {
        TokenKind::Number if token.value.contains('.') => match token.value.parse::<f64>() {
            Ok(value) => ExprKind::FloatLiteral(value),
            Err(_) => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    span.start,
                ))
            }
        },
        TokenKind::Number => match token.value.parse::<i64>() {
            Ok(value) => ExprKind::IntLiteral(value),
            Err(_) => {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    span.start,
                ))
            }
        },
        TokenKind::True => ExprKind::BoolLiteral(true),
        TokenKind::False => ExprKind::BoolLiteral(false),
        TokenKind::Variable => ExprKind::Variable(token.value),
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken { token: token.value },
                span.start,
            ))
        }
    };

    Ok(Expr::new(kind, span))
}

pub fn parse_binary_expr(parser: &mut Parser, left: Expr, bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = match operator_token.kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Dash => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Equals => BinaryOperator::Equals,
        TokenKind::Less => BinaryOperator::Less,
        TokenKind::Greater => BinaryOperator::Greater,
        TokenKind::And => BinaryOperator::And,
        TokenKind::Or => BinaryOperator::Or,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: operator_token.value,
                },
                operator_token.span.start,
            ))
        }
    };

    let right = parse_expr(parser, bp)?;
    let span = Span {
        start: left.span.start.clone(),
        end: right.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    ))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let operator_token = parser.advance();
    let operator = if operator_token.kind == TokenKind::Not {
        UnaryOperator::Not
    } else {
        UnaryOperator::Negate
    };
    let rhs = parse_expr(parser, BindingPower::Unary)?;
    let span = Span {
        start: operator_token.span.start,
        end: rhs.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Unary {
            operator,
            operand: Box::new(rhs),
        },
        span,
    ))
}

/// `$var = expr`, right associative.
pub fn parse_assignment_expr(parser: &mut Parser, left: Expr, _bp: BindingPower) -> Result<Expr, Error> {
    let operator_token = parser.advance();

    let Some(variable) = left.as_variable().map(String::from) else {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: operator_token.value,
                message: String::from("only variables can be assigned to"),
            },
            operator_token.span.start,
        ));
    };

    let rhs = parse_expr(parser, BindingPower::Default)?;
    let span = Span {
        start: left.span.start,
        end: rhs.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Assign {
            variable,
            value: Box::new(rhs),
        },
        span,
    ))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect_detailed(TokenKind::CloseParen, "expected `)` to close the group")?;

    Ok(expr)
}

/// `[type] expr`. The operand extends as far right as the enclosing expression allows.
pub fn parse_cast_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let start = parser.advance().span.start;
    let target = parse_type(parser)?;
    parser.expect_detailed(TokenKind::CloseBracket, "expected `]` after cast type")?;

    let value = parse_expr(parser, BindingPower::Default)?;
    let span = Span {
        start,
        end: value.span.end.clone(),
    };

    Ok(Expr::new(
        ExprKind::Cast {
            target,
            value: Box::new(value),
        },
        span,
    ))
}

/// `IDENT ( args? )`
pub fn parse_call_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let callee = parser.advance();
    parser.expect_detailed(TokenKind::OpenParen, "expected `(` after function name")?;

    let mut arguments = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        arguments.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() != TokenKind::CloseParen {
            parser.expect_detailed(TokenKind::Comma, "expected `,` between arguments")?;
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(Expr::new(
        ExprKind::Call {
            callee: callee.value,
            arguments,
        },
        parser.span_from(callee.span.start),
    ))
}
