//! Unit tests for the backend.

use std::fs;

use inkwell::context::Context;

use super::backend::{execute, optimize_module, write_ir, write_object, BackendOptions};
use crate::compile_to_module;

const FIB: &str = "
    def int fib(int $n) {
        if ($n < 2) return $n;
        return fib($n - 1) + fib($n - 2);
    }
    def int run() { return fib(15); }
";

#[test]
fn test_default_options() {
    let options = BackendOptions::default();

    assert!(!options.optimize);
    assert_eq!(options.opt_level, 3);
    assert!(options.unroll_loops);
    assert!(options.vectorize);
    assert_eq!(options.optimization_level(), inkwell::OptimizationLevel::None);

    let optimized = BackendOptions {
        optimize: true,
        ..BackendOptions::default()
    };
    assert_eq!(
        optimized.optimization_level(),
        inkwell::OptimizationLevel::Aggressive
    );
}

#[test]
fn test_execute_returns_run_result() {
    let context = Context::create();
    let module = compile_to_module(FIB, "fib.ek", &[], &context).unwrap();

    assert_eq!(execute(&module, &BackendOptions::default()).unwrap(), 610);
}

#[test]
fn test_optimized_execution_agrees() {
    let context = Context::create();
    let module = compile_to_module(FIB, "fib.ek", &[], &context).unwrap();

    let options = BackendOptions {
        optimize: true,
        inline_threshold: Some(500),
        size_level: 1,
        ..BackendOptions::default()
    };
    assert_eq!(execute(&module, &options).unwrap(), 610);
}

#[test]
fn test_optimizer_keeps_module_valid() {
    let context = Context::create();
    let module = compile_to_module(
        "def int run() { int $i = 0; int $s = 0; while ($i < 100) { $s = $s + $i; $i = $i + 1; } return $s; }",
        "loop.ek",
        &[],
        &context,
    )
    .unwrap();

    optimize_module(
        &module,
        &BackendOptions {
            optimize: true,
            unroll_loops: false,
            vectorize: false,
            ..BackendOptions::default()
        },
    );

    assert!(module.verify().is_ok());
}

#[test]
fn test_invalid_module_is_rejected() {
    let context = Context::create();
    let module = context.create_module("broken");
    let function = module.add_function("run", context.i32_type().fn_type(&[], false), None);
    context.append_basic_block(function, "entry");

    let error = execute(&module, &BackendOptions::default()).unwrap_err();
    assert_eq!(error.get_error_name(), "BackendError");
}

#[test]
fn test_write_ir_and_object() {
    let directory = tempfile::tempdir().unwrap();
    let context = Context::create();
    let module = compile_to_module(FIB, "fib.ek", &[], &context).unwrap();

    let ir_path = directory.path().join("fib.ll");
    write_ir(&module, &ir_path).unwrap();
    let ir = fs::read_to_string(&ir_path).unwrap();
    assert!(ir.contains("define i32 @fib(i32 %\"$n\")"));

    let object_path = directory.path().join("fib.o");
    write_object(&module, &object_path, &BackendOptions::default()).unwrap();
    assert!(fs::metadata(&object_path).unwrap().len() > 0);
}
