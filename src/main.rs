use std::{
    fs::{self, read_to_string},
    path::{Path, PathBuf},
    process,
    rc::Rc,
    time::Instant,
};

use clap::Parser;
use ekc::{
    backend::backend::{execute, write_ir, write_object, BackendOptions},
    compile_to_module, display_error,
    errors::errors::{Error, ErrorImpl},
    lexer::lexer::tokenize,
    parser::parser::parse,
    Position,
};
use inkwell::context::Context;
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(name = "ekc")]
#[command(version = "0.1.0")]
#[command(about = "Compiler for the ek language", long_about = None)]
struct Cli {
    /// Print debugging information to stderr
    #[arg(short)]
    verbose: bool,

    /// Enable optimization
    #[arg(short = 'O')]
    optimize: bool,

    /// Write the parsed AST as JSON
    #[arg(long, conflicts_with = "emit_llvm")]
    emit_ast: bool,

    /// Write the generated LLVM IR
    #[arg(long)]
    emit_llvm: bool,

    /// Write a native object file
    #[arg(long, value_name = "FILE")]
    emit_obj: Option<PathBuf>,

    /// Output file for --emit-ast and --emit-llvm, stdout when absent
    #[arg(short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Run the program through the JIT even when emitting
    #[arg(long)]
    jit: bool,

    /// Inliner threshold used with -O
    #[arg(long, value_name = "N")]
    inline_threshold: Option<u32>,

    /// Disable loop unrolling
    #[arg(long)]
    no_unroll: bool,

    /// Disable the loop and SLP vectorizers
    #[arg(long)]
    no_vectorize: bool,

    /// Size optimization level used with -O
    #[arg(long, value_name = "N", default_value_t = 0)]
    size_level: u32,

    /// Source file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Values returned by `arg(i)` and `argf(i)`
    #[arg(value_name = "OPERANDS", trailing_var_arg = true, allow_hyphen_values = true)]
    operands: Vec<String>,
}

impl Cli {
    fn backend_options(&self) -> BackendOptions {
        let defaults = BackendOptions::default();

        BackendOptions {
            optimize: self.optimize,
            inline_threshold: self.inline_threshold.or(defaults.inline_threshold),
            unroll_loops: !self.no_unroll,
            vectorize: !self.no_vectorize,
            size_level: self.size_level,
            ..defaults
        }
    }

    fn emits(&self) -> bool {
        self.emit_ast || self.emit_llvm || self.emit_obj.is_some()
    }
}

fn main() {
    let cli = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .with_writer(std::io::stderr)
        .try_init();

    let source = match read_to_string(&cli.input) {
        Ok(source) => source,
        Err(err) => {
            error!(path = %cli.input.display(), "failed to read input: {}", err);
            println!("exit code: 1");
            process::exit(1);
        }
    };

    let file_name = cli
        .input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| cli.input.display().to_string());

    if let Err(error) = run(&cli, &source, &file_name) {
        display_error(&error, &source);
        println!("exit code: 1");
        process::exit(1);
    }

    println!("exit code: 0");
}

fn run(cli: &Cli, source: &str, file_name: &str) -> Result<(), Error> {
    let start = Instant::now();

    if cli.emit_ast {
        let tokens = tokenize(source.to_string(), Some(file_name.to_string()))?;
        let program = parse(tokens, Rc::new(file_name.to_string()))?;
        debug!(elapsed = ?start.elapsed(), "parsed");

        let json = serde_json::to_string_pretty(&program)
            .map_err(|err| output_error(err.to_string()))?;
        write_output(cli.output.as_deref(), &json)?;
    }

    let context = Context::create();
    let module = compile_to_module(source, file_name, &cli.operands, &context)?;
    debug!(elapsed = ?start.elapsed(), "generated module");

    let options = cli.backend_options();

    if cli.emit_llvm {
        match &cli.output {
            Some(path) => write_ir(&module, path)?,
            None => print!("{}", module.print_to_string().to_string()),
        }
    }

    if let Some(path) = &cli.emit_obj {
        write_object(&module, path, &options)?;
    }

    if cli.jit || !cli.emits() {
        execute(&module, &options)?;
    }

    debug!(elapsed = ?start.elapsed(), "done");

    Ok(())
}

fn write_output(path: Option<&Path>, content: &str) -> Result<(), Error> {
    match path {
        Some(path) => fs::write(path, content)
            .map_err(|err| output_error(format!("failed to write {}: {}", path.display(), err))),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

fn output_error(message: String) -> Error {
    Error::new(ErrorImpl::BackendError { message }, Position::null())
}
