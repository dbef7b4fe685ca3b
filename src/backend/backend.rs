//! Optimization, execution and output of generated modules.

use std::{path::Path, time::Instant};

use inkwell::{
    module::{Linkage, Module},
    passes::{PassManager, PassManagerBuilder},
    targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine},
    AddressSpace, OptimizationLevel,
};
use lazy_static::lazy_static;
use tracing::{debug, info};

use crate::{
    errors::errors::{Error, ErrorImpl},
    type_checker::type_checker::ENTRY_POINT,
    Position,
};

const FLUSH_HOOK: &str = "__flush_stdout";

lazy_static! {
    static ref NATIVE_TARGET: Result<(), String> =
        Target::initialize_native(&InitializationConfig::default());
}

/// Knobs for the optimizer and the JIT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendOptions {
    /// Run the optimization pipeline before executing or writing objects
    pub optimize: bool,
    pub opt_level: u32,
    /// Inliner threshold, `None` leaves the inliner off
    pub inline_threshold: Option<u32>,
    pub unroll_loops: bool,
    pub vectorize: bool,
    pub size_level: u32,
}

impl Default for BackendOptions {
    fn default() -> Self {
        BackendOptions {
            optimize: false,
            opt_level: 3,
            inline_threshold: Some(250),
            unroll_loops: true,
            vectorize: true,
            size_level: 0,
        }
    }
}

impl BackendOptions {
    pub fn optimization_level(&self) -> OptimizationLevel {
        if !self.optimize {
            return OptimizationLevel::None;
        }

        match self.opt_level {
            0 => OptimizationLevel::None,
            1 => OptimizationLevel::Less,
            2 => OptimizationLevel::Default,
            _ => OptimizationLevel::Aggressive,
        }
    }
}

fn backend_error(message: impl Into<String>) -> Error {
    Error::new(
        ErrorImpl::BackendError {
            message: message.into(),
        },
        Position::null(),
    )
}

fn initialize_native_target() -> Result<(), Error> {
    NATIVE_TARGET.clone().map_err(backend_error)
}

pub fn verify_module(module: &Module<'_>) -> Result<(), Error> {
    module
        .verify()
        .map_err(|message| backend_error(message.to_string()))
}

/// Runs the module pass pipeline described by `options` over `module`.
pub fn optimize_module(module: &Module<'_>, options: &BackendOptions) {
    let start = Instant::now();

    let builder = PassManagerBuilder::create();
    builder.set_optimization_level(options.optimization_level());
    builder.set_size_level(options.size_level);
    builder.set_disable_unroll_loops(!options.unroll_loops);
    if let Some(threshold) = options.inline_threshold {
        builder.set_inliner_with_threshold(threshold);
    }

    let pass_manager = PassManager::create(());
    if options.vectorize {
        pass_manager.add_loop_vectorize_pass();
        pass_manager.add_slp_vectorize_pass();
    }
    builder.populate_module_pass_manager(&pass_manager);

    let changed = pass_manager.run_on(module);

    debug!(elapsed = ?start.elapsed(), changed, "optimized module");
}

/// Adds `void __flush_stdout()`, which flushes the C library's output
/// buffers so program output precedes anything the host prints afterwards.
fn add_flush_hook(module: &Module<'_>) -> Result<(), Error> {
    if module.get_function(FLUSH_HOOK).is_some() {
        return Ok(());
    }

    let context = module.get_context();
    let i8_ptr_type = context.i8_type().ptr_type(AddressSpace::default());

    let fflush = match module.get_function("fflush") {
        Some(function) => function,
        None => module.add_function(
            "fflush",
            context.i32_type().fn_type(&[i8_ptr_type.into()], false),
            Some(Linkage::External),
        ),
    };

    let hook = module.add_function(
        FLUSH_HOOK,
        context.void_type().fn_type(&[], false),
        Some(Linkage::External),
    );
    let builder = context.create_builder();
    builder.position_at_end(context.append_basic_block(hook, "entry"));
    builder.build_call(fflush, &[i8_ptr_type.const_null().into()], "")?;
    builder.build_return(None)?;

    Ok(())
}

/// Verifies `module`, optionally optimizes it, JIT compiles it and calls `run`.
///
/// Returns the value `run` returned.
pub fn execute(module: &Module<'_>, options: &BackendOptions) -> Result<i32, Error> {
    verify_module(module)?;
    if options.optimize {
        optimize_module(module, options);
    }
    add_flush_hook(module)?;

    initialize_native_target()?;
    let engine = module
        .create_jit_execution_engine(options.optimization_level())
        .map_err(|message| backend_error(message.to_string()))?;

    let start = Instant::now();
    let result = unsafe {
        let run = engine
            .get_function::<unsafe extern "C" fn() -> i32>(ENTRY_POINT)
            .map_err(|error| backend_error(error.to_string()))?;
        let flush = engine
            .get_function::<unsafe extern "C" fn()>(FLUSH_HOOK)
            .map_err(|error| backend_error(error.to_string()))?;

        let result = run.call();
        flush.call();
        result
    };

    info!(result, elapsed = ?start.elapsed(), "program finished");

    Ok(result)
}

/// Writes the textual IR of `module` to `path`.
pub fn write_ir(module: &Module<'_>, path: &Path) -> Result<(), Error> {
    module
        .print_to_file(path)
        .map_err(|message| backend_error(message.to_string()))
}

fn host_target_machine(level: OptimizationLevel) -> Result<TargetMachine, Error> {
    initialize_native_target()?;

    let triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&triple).map_err(|message| backend_error(message.to_string()))?;

    target
        .create_target_machine(
            &triple,
            &TargetMachine::get_host_cpu_name().to_string(),
            &TargetMachine::get_host_cpu_features().to_string(),
            level,
            RelocMode::PIC,
            CodeModel::Default,
        )
        .ok_or_else(|| backend_error(format!("no target machine for {:?}", triple)))
}

/// Writes a native object file for `module` to `path`.
pub fn write_object(module: &Module<'_>, path: &Path, options: &BackendOptions) -> Result<(), Error> {
    verify_module(module)?;
    if options.optimize {
        optimize_module(module, options);
    }

    let machine = host_target_machine(options.optimization_level())?;
    module.set_triple(&machine.get_triple());
    module.set_data_layout(&machine.get_target_data().get_data_layout());

    machine
        .write_to_file(module, FileType::Object, path)
        .map_err(|message| backend_error(message.to_string()))?;

    debug!(path = %path.display(), "wrote object file");

    Ok(())
}
