//! Unit tests for the parser module.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use super::parser::parse;
use crate::{
    ast::{
        ast::Program,
        expressions::{BinaryOperator, Expr, ExprKind, UnaryOperator},
        statements::Stmt,
        types::Type,
    },
    errors::errors::Error,
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<Program, Error> {
    let tokens = tokenize(source.to_string(), Some("test.ek".to_string()))?;
    parse(tokens, Rc::new("test.ek".to_string()))
}

fn parse_body(body: &str) -> Vec<Stmt> {
    let program = parse_source(&format!("def int run() {{ {} }}", body)).unwrap();
    program.functions[0].body.statements.clone()
}

fn expression_of(stmt: &Stmt) -> &Expr {
    match stmt {
        Stmt::Expression(expr) => expr,
        Stmt::VarDecl { value, .. } => value,
        Stmt::Return { value: Some(value), .. } => value,
        other => panic!("statement has no expression: {:?}", other),
    }
}

/// Renders an expression fully parenthesised, to make precedence visible.
fn render(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::IntLiteral(value) => value.to_string(),
        ExprKind::FloatLiteral(value) => format!("{:?}", value),
        ExprKind::BoolLiteral(value) => value.to_string(),
        ExprKind::Variable(name) => name.clone(),
        ExprKind::Binary { operator, left, right } => {
            format!("({} {} {})", render(left), operator, render(right))
        }
        ExprKind::Unary { operator, operand } => match operator {
            UnaryOperator::Negate => format!("(-{})", render(operand)),
            UnaryOperator::Not => format!("(!{})", render(operand)),
        },
        ExprKind::Cast { target, value } => format!("([{}] {})", target, render(value)),
        ExprKind::Assign { variable, value } => format!("({} = {})", variable, render(value)),
        ExprKind::Call { callee, arguments } => format!(
            "{}({})",
            callee,
            arguments.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn render_expression(source: &str) -> String {
    let statements = parse_body(&format!("{};", source));
    render(expression_of(&statements[0]))
}

#[test]
fn test_parse_variable_declaration() {
    let statements = parse_body("int $x = 42;");

    match &statements[0] {
        Stmt::VarDecl { name, ty, value, .. } => {
            assert_eq!(name, "$x");
            assert_eq!(*ty, Type::Int);
            assert_eq!(value.kind, ExprKind::IntLiteral(42));
        }
        other => panic!("expected declaration, got {:?}", other),
    }
}

#[test]
fn test_parse_reference_declarations() {
    let statements = parse_body("ref int $r = $x; noalias ref cint $n = $y;");

    match (&statements[0], &statements[1]) {
        (Stmt::VarDecl { ty: first, .. }, Stmt::VarDecl { ty: second, .. }) => {
            assert_eq!(*first, Type::reference(Type::Int, false));
            assert_eq!(*second, Type::reference(Type::CheckedInt, true));
        }
        other => panic!("expected declarations, got {:?}", other),
    }
}

#[test]
fn test_parse_program_structure() {
    let program = parse_source(
        "extern int arg(int);
         extern float argf(int);
         def void inc(ref int $y) { $y = $y + 1; }
         def int run() { return 0; }",
    )
    .unwrap();

    assert_eq!(program.externs.len(), 2);
    assert_eq!(program.externs[1].name, "argf");
    assert_eq!(program.externs[1].return_type, Type::Float);
    assert_eq!(program.externs[1].param_types, vec![Type::Int]);

    assert_eq!(program.functions.len(), 2);
    assert_eq!(program.functions[0].name, "inc");
    assert_eq!(program.functions[0].return_type, Type::Void);
    assert_eq!(program.functions[0].params[0].name, "$y");
    assert_eq!(
        program.functions[0].params[0].ty,
        Type::reference(Type::Int, false)
    );
}

#[test]
fn test_precedence() {
    assert_eq!(render_expression("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(render_expression("1 - 2 - 3"), "((1 - 2) - 3)");
    assert_eq!(render_expression("$a < $b == $c > $d"), "(($a < $b) == ($c > $d))");
    assert_eq!(
        render_expression("$a || $b && $c == 1"),
        "($a || ($b && ($c == 1)))"
    );
    assert_eq!(render_expression("(1 + 2) * 3"), "((1 + 2) * 3)");
}

#[test]
fn test_unary_binds_tightest() {
    assert_eq!(render_expression("-$a * $b"), "((-$a) * $b)");
    assert_eq!(render_expression("!$a && $b"), "((!$a) && $b)");
    assert_eq!(render_expression("1 - -2"), "(1 - (-2))");
}

#[test]
fn test_assignment_is_right_associative() {
    assert_eq!(render_expression("$a = $b = 1 + 2"), "($a = ($b = (1 + 2)))");
}

#[test]
fn test_assignment_requires_variable() {
    let result = parse_source("def int run() { 1 = 2; }");
    assert_eq!(result.unwrap_err().get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_cast_extends_right() {
    assert_eq!(render_expression("[int] 3.9"), "([int] 3.9)");
    assert_eq!(render_expression("[float] $a + 1"), "([float] ($a + 1))");
    assert_eq!(render_expression("1 + [int] $f"), "(1 + ([int] $f))");
}

#[test]
fn test_function_calls() {
    assert_eq!(render_expression("add(1, $b * 2, f())"), "add(1, ($b * 2), f())");
}

#[test]
fn test_literals() {
    assert_eq!(render_expression("true && false"), "(true && false)");
    assert_eq!(render_expression("2.5"), "2.5");
    assert_eq!(render_expression("2147483648"), "2147483648");
}

#[test]
fn test_control_flow() {
    let statements = parse_body(
        "while ($i < 10) { $i = $i + 1; }
         if ($i == 10) print \"done\"; else { print $i; }",
    );

    match &statements[0] {
        Stmt::While { condition, body, .. } => {
            assert_eq!(render(condition), "($i < 10)");
            assert!(matches!(body.as_ref(), Stmt::Block(_)));
        }
        other => panic!("expected while, got {:?}", other),
    }

    match &statements[1] {
        Stmt::If { then_body, else_body: Some(else_body), .. } => {
            assert!(
                matches!(then_body.as_ref(), Stmt::PrintLiteral { value, .. } if value == "done")
            );
            assert!(matches!(else_body.as_ref(), Stmt::Block(_)));
        }
        other => panic!("expected if/else, got {:?}", other),
    }
}

#[test]
fn test_bare_return() {
    let statements = parse_body("return;");
    assert!(matches!(statements[0], Stmt::Return { value: None, .. }));
}

#[test]
fn test_binary_operator_kinds() {
    let statements = parse_body("$a / $b;");
    match &expression_of(&statements[0]).kind {
        ExprKind::Binary { operator, .. } => assert_eq!(*operator, BinaryOperator::Divide),
        other => panic!("expected binary, got {:?}", other),
    }
}

#[test]
fn test_missing_semicolon() {
    let error = parse_source("def int run() { int $x = 1 }").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedToken");
}

#[test]
fn test_uninitialized_declaration_is_rejected() {
    let error = parse_source("def int run() { int $x; }").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_extern_after_function_is_rejected() {
    let error = parse_source("def int run() { return 0; } extern int f();").unwrap_err();
    assert_eq!(error.get_error_name(), "UnexpectedTokenDetailed");
}

#[test]
fn test_number_too_large() {
    let error = parse_source("def int run() { return 99999999999999999999; }").unwrap_err();
    assert_eq!(error.get_error_name(), "NumberParseError");
}

#[test]
fn test_unclosed_block() {
    assert!(parse_source("def int run() { return 0;").is_err());
}

#[test]
fn test_error_positions_point_at_token() {
    let error = parse_source("def int run() { int 5 = 1; }").unwrap_err();
    assert_eq!(error.get_position().0, 20);
}
