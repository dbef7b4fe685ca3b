//! Tests that drive the `ekc` binary.
//!
//! Runtime traps terminate the whole process, so programs that trap are only
//! exercised through the binary.

use std::{
    fs,
    io::Write,
    path::PathBuf,
    process::{Command, Output},
};

use tempfile::{NamedTempFile, TempDir};

fn source_file(source: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".ek").tempfile().unwrap();
    file.write_all(source.as_bytes()).unwrap();
    file
}

fn ekc(args: &[&str], source: &str) -> (Output, String) {
    let file = source_file(source);

    let output = Command::new(env!("CARGO_BIN_EXE_ekc"))
        .args(args)
        .arg(file.path())
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    (output, stdout)
}

fn ekc_with_operands(operands: &[&str], source: &str) -> (Output, String) {
    let file = source_file(source);

    let output = Command::new(env!("CARGO_BIN_EXE_ekc"))
        .arg(file.path())
        .args(operands)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    (output, stdout)
}

#[test]
fn test_prints_and_exit_code() {
    let (output, stdout) = ekc(
        &[],
        "def int run() { int $a = 5; int $b = 7; print $a + $b; print \"done\"; return 0; }",
    );

    assert!(output.status.success());
    assert_eq!(stdout, "12\ndone\nexit code: 0\n");
}

#[test]
fn test_prints_floats_and_bools() {
    let (_, stdout) = ekc(
        &[],
        "def int run() { float $f = 1.5; bool $b = true; print $f; print $b; return 0; }",
    );

    assert_eq!(stdout, "1.500000\n1\nexit code: 0\n");
}

#[test]
fn test_checked_overflow_traps() {
    let programs = [
        "def int run() { cint $x = 2147483647; $x = $x + 1; print \"unreachable\"; return 0; }",
        "def int run() { cint $x = 65536 * 65536; print \"unreachable\"; return 0; }",
        "def int run() { cint $x = -2147483648 - 1; print \"unreachable\"; return 0; }",
        "def int run() { cint $x = -2147483648; $x = -$x; print \"unreachable\"; return 0; }",
        "def int run() { cint $x = -2147483648; $x = $x / -1; print \"unreachable\"; return 0; }",
    ];

    for program in programs {
        let (output, stdout) = ekc(&[], program);

        assert!(output.status.success(), "{}", program);
        assert!(stdout.contains("cint overflows!"), "{}: {}", program, stdout);
        assert!(!stdout.contains("unreachable"), "{}", program);
        assert!(!stdout.contains("exit code"), "{}", program);
    }
}

#[test]
fn test_division_by_zero_traps() {
    let programs = [
        "def int run() { int $x = 1 / 0; return 0; }",
        "def int run() { cint $x = 1 / 0; return 0; }",
        "def int run() { float $x = 1.0 / 0.0; return 0; }",
    ];

    for program in programs {
        let (output, stdout) = ekc(&[], program);

        assert!(output.status.success(), "{}", program);
        assert_eq!(stdout, "divide by 0!\n", "{}", program);
    }
}

#[test]
fn test_static_error_report() {
    let (output, stdout) = ekc(&[], "def int run() {\n  int $a = 1.0;\n  return 0;\n}\n");

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.starts_with("Error: TypeMismatch"));
    assert!(stdout.contains("2 | int $a = 1.0;"));
    assert!(stdout.ends_with("exit code: 1\n"));
}

#[test]
fn test_runtime_exit_cannot_be_redefined() {
    let (output, stdout) = ekc(
        &[],
        "def void exit(int $c) { print \"hijacked\"; }
         def int run() { int $z = 0; print 7 / $z; return 0; }",
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.starts_with("Error: ReservedFunctionName"));
    assert!(!stdout.contains("hijacked"));
    assert!(stdout.ends_with("exit code: 1\n"));
}

#[test]
fn test_backend_error_report_has_no_excerpt() {
    let directory = TempDir::new().unwrap();
    let object_path = directory.path().join("missing").join("out.o");

    let (output, stdout) = ekc(
        &["--emit-obj", object_path.to_str().unwrap()],
        "def int run() {\n  return 0;\n}\n",
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout.starts_with("Error: BackendError\n-> backend failed: "));
    assert!(!stdout.contains(" | "));
    assert!(stdout.ends_with("exit code: 1\n"));
}

#[test]
fn test_operands() {
    let (output, stdout) = ekc_with_operands(
        &["3", "-4", "0.5"],
        "extern int arg(int);
         extern float argf(int);
         def int run() { print arg(0) * arg(1); print argf(2); return 0; }",
    );

    assert!(output.status.success());
    assert_eq!(stdout, "-12\n0.500000\nexit code: 0\n");
}

#[test]
fn test_emit_llvm_and_ast() {
    let directory = TempDir::new().unwrap();
    let ir_path: PathBuf = directory.path().join("out.ll");
    let ast_path: PathBuf = directory.path().join("out.json");
    let source = "def int run() { print \"jit\"; return 0; }";

    let (output, stdout) = ekc(&["--emit-llvm", "-o", ir_path.to_str().unwrap()], source);
    assert!(output.status.success());
    assert!(!stdout.contains("jit"));
    assert!(fs::read_to_string(&ir_path)
        .unwrap()
        .contains("define i32 @run()"));

    let (output, _) = ekc(&["--emit-ast", "-o", ast_path.to_str().unwrap()], source);
    assert!(output.status.success());
    let ast: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&ast_path).unwrap()).unwrap();
    assert_eq!(ast["functions"][0]["name"], "run");

    let (output, stdout) = ekc(&["--emit-llvm", "-o", ir_path.to_str().unwrap(), "--jit"], source);
    assert!(output.status.success());
    assert!(stdout.contains("jit\n"));
}

#[test]
fn test_optimized_run() {
    let (output, stdout) = ekc(
        &["-O", "--inline-threshold", "100", "--no-vectorize"],
        "def int sq(int $x) { return $x * $x; }
         def int run() { int $i = 0; while ($i < 4) { print sq($i); $i = $i + 1; } return 0; }",
    );

    assert!(output.status.success());
    assert_eq!(stdout, "0\n1\n4\n9\nexit code: 0\n");
}
