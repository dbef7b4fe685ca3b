//! Runtime support emitted into every module.
//!
//! Programs depend on two C library functions, `printf` and `exit`. Everything
//! else they need at run time (format strings, trap messages, the overflow
//! check helper and the `arg`/`argf` accessors) is generated here.

use inkwell::{
    module::Linkage,
    values::{BasicMetadataValueEnum, BasicValueEnum, FunctionValue, IntValue, PointerValue},
    AddressSpace,
};
use tracing::{debug, warn};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::compiler::Compiler;

pub const OVERFLOW_MESSAGE: &str = "cint overflows!";
pub const DIVIDE_BY_ZERO_MESSAGE: &str = "divide by 0!";

/// Exit status used by every runtime trap.
pub const TRAP_STATUS: u64 = 0;

pub const OVERFLOW_CHECK: &str = "__cint_overflow_check";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Int,
    Float,
    String,
}

impl Format {
    fn global_name(self) -> &'static str {
        match self {
            Format::Int => "__fmt_int",
            Format::Float => "__fmt_float",
            Format::String => "__fmt_str",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Format::Int => "%d\n",
            Format::Float => "%f\n",
            Format::String => "%s\n",
        }
    }
}

/// How a builtin accessor interprets the command line operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Int,
    Float,
}

pub(crate) fn codegen_error(message: impl Into<String>) -> Error {
    Error::new(
        ErrorImpl::CodegenError {
            message: message.into(),
        },
        Position::null(),
    )
}

/// Declares `printf` and `exit`, the format strings and the overflow helper.
pub fn declare_runtime(compiler: &mut Compiler<'_>) -> Result<(), Error> {
    let i8_ptr_type = compiler.context.i8_type().ptr_type(AddressSpace::default());

    let printf_type = compiler
        .context
        .i32_type()
        .fn_type(&[i8_ptr_type.into()], true);
    compiler
        .module
        .add_function("printf", printf_type, Some(Linkage::External));

    let exit_type = compiler
        .context
        .void_type()
        .fn_type(&[compiler.context.i32_type().into()], false);
    compiler
        .module
        .add_function("exit", exit_type, Some(Linkage::External));

    for format in [Format::String, Format::Int, Format::Float] {
        add_global_string(compiler, format.global_name(), format.pattern());
    }

    define_overflow_check(compiler)?;

    Ok(())
}

fn runtime_function<'a>(compiler: &Compiler<'a>, name: &str) -> Result<FunctionValue<'a>, Error> {
    compiler
        .module
        .get_function(name)
        .ok_or_else(|| codegen_error(format!("runtime function {} is not declared", name)))
}

/// Adds a private constant holding `text` plus a terminating zero and returns an `i8*` to it.
fn add_global_string<'a>(compiler: &Compiler<'a>, name: &str, text: &str) -> PointerValue<'a> {
    let bytes = compiler.context.const_string(text.as_bytes(), true);

    let global = compiler
        .module
        .add_global(bytes.get_type(), Some(AddressSpace::default()), name);
    global.set_initializer(&bytes);
    global.set_constant(true);
    global.set_linkage(Linkage::Internal);

    global
        .as_pointer_value()
        .const_cast(compiler.context.i8_type().ptr_type(AddressSpace::default()))
}

fn format_string<'a>(compiler: &Compiler<'a>, format: Format) -> Result<PointerValue<'a>, Error> {
    let global = compiler
        .module
        .get_global(format.global_name())
        .ok_or_else(|| codegen_error(format!("format {:?} is not declared", format)))?;

    Ok(global
        .as_pointer_value()
        .const_cast(compiler.context.i8_type().ptr_type(AddressSpace::default())))
}

/// Returns an `i8*` to a constant copy of `text`, reusing earlier copies.
pub fn string_constant<'a>(compiler: &mut Compiler<'a>, text: &str) -> PointerValue<'a> {
    if let Some(pointer) = compiler.string_constants.get(text) {
        return *pointer;
    }

    let name = format!("__str.{}", compiler.string_constants.len());
    let pointer = add_global_string(compiler, &name, text);
    compiler.string_constants.insert(text.to_string(), pointer);

    pointer
}

pub fn emit_printf<'a>(
    compiler: &Compiler<'a>,
    format: Format,
    value: BasicMetadataValueEnum<'a>,
) -> Result<(), Error> {
    let printf = runtime_function(compiler, "printf")?;
    let format = format_string(compiler, format)?;

    compiler
        .builder
        .build_call(printf, &[format.into(), value], "")?;

    Ok(())
}

/// Branches to a block that prints `message` and exits with `status` when
/// `condition` holds. The builder is left in the continuation block.
pub fn emit_guarded_trap<'a>(
    compiler: &mut Compiler<'a>,
    condition: IntValue<'a>,
    message: &str,
    status: u64,
) -> Result<(), Error> {
    let function = compiler
        .builder
        .get_insert_block()
        .and_then(|block| block.get_parent())
        .ok_or_else(|| codegen_error("trap emitted outside of a function"))?;

    let trap_block = compiler.context.append_basic_block(function, "trap");
    let continue_block = compiler.context.append_basic_block(function, "cont");

    compiler
        .builder
        .build_conditional_branch(condition, trap_block, continue_block)?;

    compiler.builder.position_at_end(trap_block);
    let text = string_constant(compiler, message);
    emit_printf(compiler, Format::String, text.into())?;

    let exit = runtime_function(compiler, "exit")?;
    compiler.builder.build_call(
        exit,
        &[compiler.context.i32_type().const_int(status, false).into()],
        "",
    )?;
    compiler.builder.build_unreachable()?;

    compiler.builder.position_at_end(continue_block);

    Ok(())
}

/// `void __cint_overflow_check(i1)`: traps when its flag is set.
fn define_overflow_check(compiler: &mut Compiler<'_>) -> Result<(), Error> {
    let function_type = compiler
        .context
        .void_type()
        .fn_type(&[compiler.context.bool_type().into()], false);
    let function =
        compiler
            .module
            .add_function(OVERFLOW_CHECK, function_type, Some(Linkage::Internal));

    let entry = compiler.context.append_basic_block(function, "entry");
    compiler.builder.position_at_end(entry);

    let flag = function
        .get_first_param()
        .ok_or_else(|| codegen_error("overflow check has no parameter"))?
        .into_int_value();
    flag.set_name("overflow");

    emit_guarded_trap(compiler, flag, OVERFLOW_MESSAGE, TRAP_STATUS)?;
    compiler.builder.build_return(None)?;

    Ok(())
}

/// Passes the overflow flag of a checked operation to the trap helper.
pub fn emit_overflow_check<'a>(compiler: &Compiler<'a>, flag: IntValue<'a>) -> Result<(), Error> {
    let check = runtime_function(compiler, OVERFLOW_CHECK)?;
    compiler.builder.build_call(check, &[flag.into()], "")?;

    Ok(())
}

/// Prints a string literal through a stack copy of its bytes.
pub fn emit_print_literal(compiler: &mut Compiler<'_>, text: &str) -> Result<(), Error> {
    let bytes = compiler.context.const_string(text.as_bytes(), true);
    let buffer = compiler.create_entry_alloca(bytes.get_type().into(), "slit")?;
    compiler.builder.build_store(buffer, bytes)?;

    let pointer = compiler.builder.build_pointer_cast(
        buffer,
        compiler.context.i8_type().ptr_type(AddressSpace::default()),
        "",
    )?;

    emit_printf(compiler, Format::String, pointer.into())
}

/// Defines `name` as a switch over operand positions.
///
/// Case `i` returns the i-th operand parsed as `kind`; any other index
/// returns zero. Operands that do not parse are left out of the switch.
pub fn define_arg_accessor(
    compiler: &mut Compiler<'_>,
    name: &str,
    kind: OperandKind,
) -> Result<(), Error> {
    let i32_type = compiler.context.i32_type();
    let f32_type = compiler.context.f32_type();

    let function_type = match kind {
        OperandKind::Int => i32_type.fn_type(&[i32_type.into()], false),
        OperandKind::Float => f32_type.fn_type(&[i32_type.into()], false),
    };
    let function = compiler.create_function(name, function_type, &[])?;

    let index = function
        .get_first_param()
        .ok_or_else(|| codegen_error(format!("{} has no parameter", name)))?
        .into_int_value();
    index.set_name("index");

    let default_block = compiler.context.append_basic_block(function, "default");

    let mut cases = Vec::with_capacity(compiler.operands.len());
    let operands = compiler.operands.clone();
    for (position, operand) in operands.iter().enumerate() {
        let value: Option<BasicValueEnum> = match kind {
            OperandKind::Int => operand
                .parse::<i64>()
                .ok()
                .map(|value| i32_type.const_int(value as u64, true).into()),
            OperandKind::Float => operand
                .parse::<f64>()
                .ok()
                .map(|value| f32_type.const_float(value).into()),
        };

        let Some(value) = value else {
            warn!(operand = %operand, position, accessor = name, "ignoring operand that does not parse");
            continue;
        };

        let block = compiler
            .context
            .append_basic_block(function, &format!("switch.{}", position));
        compiler.builder.position_at_end(block);
        compiler.builder.build_return(Some(&value))?;

        cases.push((i32_type.const_int(position as u64, false), block));
    }

    let entry = function
        .get_first_basic_block()
        .ok_or_else(|| codegen_error(format!("{} has no entry block", name)))?;
    compiler.builder.position_at_end(entry);
    compiler.builder.build_switch(index, default_block, &cases)?;

    compiler.builder.position_at_end(default_block);
    match kind {
        OperandKind::Int => compiler.builder.build_return(Some(&i32_type.const_zero()))?,
        OperandKind::Float => compiler.builder.build_return(Some(&f32_type.const_zero()))?,
    };

    debug!(accessor = name, cases = cases.len(), "defined operand accessor");

    Ok(())
}
