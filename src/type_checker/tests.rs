//! Unit tests for the type checker.

use std::rc::Rc;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
};

use super::{
    type_checker::type_check,
    typed_ast::{TypedExprKind, TypedProgram, TypedStmt},
};

fn check(source: &str) -> Result<TypedProgram, Error> {
    let tokens = tokenize(source.to_string(), Some("test.ek".to_string())).unwrap();
    let program = parse(tokens, Rc::new("test.ek".to_string())).unwrap();
    type_check(&program)
}

fn check_err(source: &str) -> ErrorImpl {
    check(source).unwrap_err().get_error_impl().clone()
}

fn check_run(body: &str) -> Result<TypedProgram, Error> {
    check(&format!("def int run() {{ {} return 0; }}", body))
}

fn run_err(body: &str) -> String {
    check_run(body).unwrap_err().get_error_name().to_string()
}

#[test]
fn test_well_typed_program() {
    let program = check(
        "extern int arg(int);
         def int add(int $a, int $b) { return $a + $b; }
         def void doubleIt(ref int $y) { $y = $y + $y; }
         def int run() {
             int $x = add(arg(0), 2);
             doubleIt($x);
             cint $c = 5;
             $c = $c * 2;
             float $f = [float] $x;
             bool $b = $x < 10 && !($f == 1.0);
             if ($b) print \"small\"; else print $x;
             while ($x > 0) { $x = $x - 1; }
             return $x;
         }",
    )
    .unwrap();

    assert_eq!(program.externs.len(), 1);
    assert_eq!(program.functions.len(), 3);
}

#[test]
fn test_every_expression_is_typed() {
    let program = check_run("int $a = 5; int $b = 7; print $a + $b * -$a;").unwrap();

    let mut types = vec![];
    for stmt in &program.functions[0].body.statements {
        stmt.visit_expressions(&mut |expr| types.push((format!("{:?}", expr.kind), expr.ty.clone())));
    }

    // 5, 7, the print tree ($a + ($b * -$a)) has six nodes, then the return literal.
    assert_eq!(types.len(), 9);
    assert!(types.iter().all(|(_, ty)| *ty != Type::Void));
}

#[test]
fn test_literal_types() {
    let program = check_run("print 1; print 1.5; print true;").unwrap();
    let statements = &program.functions[0].body.statements;

    let types: Vec<Type> = statements[..3]
        .iter()
        .map(|stmt| match stmt {
            TypedStmt::Print(expr) => expr.ty.clone(),
            other => panic!("expected print, got {:?}", other),
        })
        .collect();

    assert_eq!(types, vec![Type::UntypedIntLiteral, Type::Float, Type::Bool]);
}

#[test]
fn test_binary_result_follows_right_operand() {
    let program = check_run("cint $c = 1; int $a = $c + 1; cint $d = 1 + $c;").unwrap();
    let statements = &program.functions[0].body.statements;

    match (&statements[1], &statements[2]) {
        (TypedStmt::VarDecl { value: first, .. }, TypedStmt::VarDecl { value: second, .. }) => {
            assert_eq!(first.ty, Type::UntypedIntLiteral);
            assert_eq!(second.ty, Type::CheckedInt);
        }
        other => panic!("expected declarations, got {:?}", other),
    }
}

#[test]
fn test_comparisons_are_bool() {
    let program = check_run("bool $b = 1.0 < 2.0;").unwrap();
    match &program.functions[0].body.statements[0] {
        TypedStmt::VarDecl { value, .. } => assert_eq!(value.ty, Type::Bool),
        other => panic!("expected declaration, got {:?}", other),
    }
}

#[test]
fn test_reference_variable_keeps_reference_type() {
    let program = check_run("int $x = 1; ref int $r = $x; print $r;").unwrap();
    match &program.functions[0].body.statements[2] {
        TypedStmt::Print(expr) => assert_eq!(expr.ty, Type::reference(Type::Int, false)),
        other => panic!("expected print, got {:?}", other),
    }
}

#[test]
fn test_undeclared_variable() {
    assert_eq!(run_err("print $nope;"), "UndeclaredVariable");
    assert_eq!(run_err("$nope = 1;"), "UndeclaredVariable");
}

#[test]
fn test_variable_used_in_own_initializer() {
    assert_eq!(run_err("int $x = $x;"), "UndeclaredVariable");
}

#[test]
fn test_variables_do_not_leak_between_functions() {
    let error = check_err(
        "def void f() { int $x = 1; }
         def int run() { return $x; }",
    );
    assert_eq!(
        error,
        ErrorImpl::UndeclaredVariable {
            variable: "$x".to_string()
        }
    );
}

#[test]
fn test_undeclared_function() {
    assert_eq!(run_err("foo();"), "UndeclaredFunction");
}

#[test]
fn test_functions_must_be_declared_before_use() {
    let error = check_err(
        "def int run() { return later(); }
         def int later() { return 1; }",
    );
    assert_eq!(
        error,
        ErrorImpl::UndeclaredFunction {
            function: "later".to_string()
        }
    );
}

#[test]
fn test_recursion_is_allowed() {
    assert!(check(
        "def int fib(int $n) {
             if ($n < 2) return $n;
             return fib($n - 1) + fib($n - 2);
         }
         def int run() { return fib(10); }"
    )
    .is_ok());
}

#[test]
fn test_entry_point_rules() {
    assert_eq!(
        check_err("def int run() { return 0; } def int run() { return 1; }"),
        ErrorImpl::DuplicateEntryPoint
    );
    assert_eq!(
        check_err("extern int run(); def int run() { return 0; }"),
        ErrorImpl::DuplicateEntryPoint
    );
    assert_eq!(
        check_err("def float run() { return 1.0; }"),
        ErrorImpl::EntryPointReturnType {
            received: "float".to_string()
        }
    );
    assert_eq!(
        check_err("def int run(int $a) { return $a; }"),
        ErrorImpl::EntryPointParameters { received: 1 }
    );
    assert_eq!(
        check_err("def int main() { return 0; }"),
        ErrorImpl::MissingEntryPoint
    );
}

#[test]
fn test_reference_return_rejected() {
    assert_eq!(
        check(
            "def ref int f(ref int $a) { return $a; }
             def int run() { return 0; }"
        )
        .unwrap_err()
        .get_error_name(),
        "InvalidReturnType"
    );
}

#[test]
fn test_duplicate_function_rejected() {
    assert_eq!(
        check_err(
            "def int f() { return 0; }
             def int f() { return 1; }
             def int run() { return 0; }"
        ),
        ErrorImpl::FunctionAlreadyDeclared {
            function: "f".to_string()
        }
    );
}

#[test]
fn test_runtime_symbol_names_rejected() {
    assert_eq!(
        check_err(
            "def void exit(int $c) { print \"hijacked\"; }
             def int run() { return 0; }"
        ),
        ErrorImpl::ReservedFunctionName {
            function: "exit".to_string()
        }
    );

    for name in ["printf", "fflush", "__cint_overflow_check", "__flush_stdout"] {
        let source = format!("extern int {}(int); def int run() {{ return 0; }}", name);
        assert_eq!(
            check(&source).unwrap_err().get_error_name(),
            "ReservedFunctionName",
            "{}",
            name
        );
    }
}

#[test]
fn test_operand_accessor_signatures() {
    assert!(check("extern int arg(int); extern float argf(int); def int run() { return 0; }").is_ok());

    assert_eq!(
        check_err("extern float arg(int); def int run() { return 0; }"),
        ErrorImpl::InvalidAccessorSignature {
            function: "arg".to_string(),
            expected: "int arg(int)".to_string()
        }
    );
    assert_eq!(
        check("extern float argf(float); def int run() { return 0; }")
            .unwrap_err()
            .get_error_name(),
        "InvalidAccessorSignature"
    );
    assert_eq!(
        check("extern int arg(); def int run() { return 0; }")
            .unwrap_err()
            .get_error_name(),
        "InvalidAccessorSignature"
    );

    // only externs are bound to the operands
    assert!(check("def int arg(float $x) { return 1; } def int run() { return arg(1.0); }").is_ok());
}

#[test]
fn test_invalid_declaration_types() {
    assert_eq!(run_err("void $v = 1;"), "InvalidDeclarationType");
    assert_eq!(run_err("int $x = 1; ref ref int $r = $x;"), "InvalidDeclarationType");
    assert_eq!(
        check("def void f(ref void $v) { } def int run() { return 0; }")
            .unwrap_err()
            .get_error_name(),
        "InvalidDeclarationType"
    );
    assert_eq!(
        check("extern void f(void); def int run() { return 0; }")
            .unwrap_err()
            .get_error_name(),
        "InvalidDeclarationType"
    );
}

#[test]
fn test_reference_initializer_must_be_variable() {
    assert_eq!(run_err("ref int $r = 5;"), "InvalidReferenceInitializer");
    assert_eq!(run_err("int $x = 1; ref int $r = $x + 1;"), "InvalidReferenceInitializer");
}

#[test]
fn test_reference_argument_must_be_variable() {
    let error = check_err(
        "def void inc(ref int $y) { $y = $y + 1; }
         def int run() { inc(1 + 2); return 0; }",
    );
    assert_eq!(
        error,
        ErrorImpl::InvalidReferenceArgument {
            function: "inc".to_string(),
            index: 0
        }
    );
}

#[test]
fn test_argument_checks() {
    let prelude = "def int f(int $a, float $b) { return $a; }";

    assert_eq!(
        check_err(&format!("{} def int run() {{ return f(1); }}", prelude)),
        ErrorImpl::MissingArguments {
            expected: 2,
            received: 1
        }
    );
    assert_eq!(
        check_err(&format!("{} def int run() {{ return f(1, 2.0, 3); }}", prelude)),
        ErrorImpl::UnexpectedArguments {
            expected: 2,
            received: 3
        }
    );
    assert_eq!(
        check_err(&format!("{} def int run() {{ return f(1, 2); }}", prelude)),
        ErrorImpl::ArgumentTypeMatchError {
            expected: "float".to_string(),
            received: "lit int".to_string()
        }
    );
}

#[test]
fn test_binary_operand_mismatch() {
    assert_eq!(run_err("int $a = 1; cint $b = 2; print $a + $b;"), "TypeMismatch");
    assert_eq!(run_err("print 1 + 2.0;"), "TypeMismatch");
    assert_eq!(run_err("print true + false;"), "TypeMismatch");
}

#[test]
fn test_checked_integers_accept_literals() {
    assert!(check_run("cint $a = 2147483647; $a = $a + 1; print 1 + $a;").is_ok());
}

#[test]
fn test_declaration_and_assignment_mismatch() {
    assert_eq!(run_err("int $a = 1.0;"), "TypeMismatch");
    assert_eq!(run_err("cint $c = 1; int $a = 0; $a = $c;"), "TypeMismatch");
    assert_eq!(run_err("float $f = true;"), "TypeMismatch");
}

#[test]
fn test_return_checks() {
    assert_eq!(
        check_err("def int run() { return 1.5; }"),
        ErrorImpl::TypeMismatch {
            expected: "int".to_string(),
            received: "float".to_string()
        }
    );
    assert_eq!(
        check("def int run() { return; }").unwrap_err().get_error_name(),
        "TypeMismatch"
    );
    assert_eq!(
        check("def void f() { return 1; } def int run() { return 0; }")
            .unwrap_err()
            .get_error_name(),
        "TypeMismatch"
    );
    assert!(check("def void f() { return; } def int run() { f(); return 0; }").is_ok());
}

#[test]
fn test_conditions_must_be_bool() {
    assert_eq!(run_err("if (1) print 1;"), "TypeMismatch");
    assert_eq!(run_err("while (1.0) print 1;"), "TypeMismatch");
    assert!(check_run("bool $b = true; ref bool $r = $b; while ($r) $b = false;").is_ok());
}

#[test]
fn test_unary_checks() {
    assert_eq!(run_err("print !1.0;"), "TypeMismatch");
    assert_eq!(run_err("print -true;"), "TypeMismatch");
    assert!(check_run("print !true; print -1.5; print !1;").is_ok());
}

#[test]
fn test_cast_rules() {
    let program = check_run("print [int] 3.9; print [float] 3; print [cint] 2;").unwrap();
    match &program.functions[0].body.statements[0] {
        TypedStmt::Print(expr) => {
            assert_eq!(expr.ty, Type::Int);
            assert!(matches!(expr.kind, TypedExprKind::Cast { .. }));
        }
        other => panic!("expected print, got {:?}", other),
    }

    assert_eq!(run_err("print [bool] 1;"), "InvalidCast");
    assert_eq!(run_err("print [int] true;"), "InvalidCast");
    assert_eq!(
        check("def void f() { } def int run() { [void] f(); return 0; }")
            .unwrap_err()
            .get_error_name(),
        "InvalidCast"
    );
}

#[test]
fn test_print_void_rejected() {
    assert_eq!(
        check("def void f() { } def int run() { print f(); return 0; }")
            .unwrap_err()
            .get_error_name(),
        "TypeMismatch"
    );
}

#[test]
fn test_call_records_parameter_types() {
    let program = check(
        "def void inc(noalias ref int $y) { $y = $y + 1; }
         def int run() { int $x = 1; inc($x); return $x; }",
    )
    .unwrap();

    match &program.functions[1].body.statements[1] {
        TypedStmt::Expression(expr) => match &expr.kind {
            TypedExprKind::Call {
                parameter_types, ..
            } => {
                assert_eq!(parameter_types, &vec![Type::reference(Type::Int, true)]);
                assert_eq!(expr.ty, Type::Void);
            }
            other => panic!("expected call, got {:?}", other),
        },
        other => panic!("expected expression, got {:?}", other),
    }
}

#[test]
fn test_error_position() {
    let error = check("def int run() { return $missing; }").unwrap_err();
    assert_eq!(error.get_position().0, 23);
}
