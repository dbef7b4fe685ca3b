//! Main compiler module.
//!
//! This module contains the [`Compiler`] structure, which owns everything one
//! lowering of a typed program needs: the LLVM module and builder, the slots
//! of the function being generated and the command line operands that are
//! baked into the argument accessors.

use std::collections::HashMap;

use inkwell::{
    attributes::{Attribute, AttributeLoc},
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType},
    values::{BasicValueEnum, FunctionValue, PointerValue},
    AddressSpace,
};
use tracing::debug;

use crate::{
    ast::types::Type,
    errors::errors::Error,
    type_checker::typed_ast::{TypedExtern, TypedFunction, TypedProgram},
};

use super::{
    runtime::{codegen_error, declare_runtime, define_arg_accessor, OperandKind},
    stmt::gen_block,
    value::GenValue,
};

/// The state of one lowering.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
pub struct Compiler<'a> {
    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,

    /// Slots of the variables visible in the current function
    pub named_allocas: HashMap<String, GenValue<'a>>,
    pub current_function: Option<FunctionValue<'a>>,
    pub current_return_type: Type,

    /// Command line operands, in order
    pub operands: Vec<String>,
    pub string_constants: HashMap<String, PointerValue<'a>>,
}

impl<'a> Compiler<'a> {
    pub fn new(context: &'a Context, file_name: &str, operands: &[String]) -> Self {
        Compiler {
            context,
            module: context.create_module(file_name),
            builder: context.create_builder(),
            named_allocas: HashMap::new(),
            current_function: None,
            current_return_type: Type::Void,
            operands: operands.to_vec(),
            string_constants: HashMap::new(),
        }
    }

    /// Converts a language type to the LLVM type its values are stored as.
    ///
    /// References become pointers to their referent. `void` has no value
    /// representation and is rejected.
    pub fn convert_type(&self, type_: &Type) -> Result<BasicTypeEnum<'a>, Error> {
        match type_ {
            Type::Int | Type::CheckedInt | Type::UntypedIntLiteral => {
                Ok(self.context.i32_type().into())
            }
            Type::Float => Ok(self.context.f32_type().into()),
            Type::Bool => Ok(self.context.bool_type().into()),
            Type::StringLiteralPointer => Ok(self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .into()),
            Type::Reference { inner, .. } => Ok(self
                .convert_type(inner)?
                .ptr_type(AddressSpace::default())
                .into()),
            Type::Void => Err(codegen_error("void has no value representation")),
        }
    }

    pub fn fn_type(&self, return_type: &Type, param_types: &[Type]) -> Result<FunctionType<'a>, Error> {
        let params = param_types
            .iter()
            .map(|param| self.convert_type(param).map(BasicMetadataTypeEnum::from))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(match return_type {
            Type::Void => self.context.void_type().fn_type(&params, false),
            other => self.convert_type(other)?.fn_type(&params, false),
        })
    }

    /// Returns the declaration of `name`, adding it if needed.
    ///
    /// `noalias` reference parameters get the matching LLVM attribute.
    pub fn declare_function(
        &self,
        name: &str,
        function_type: FunctionType<'a>,
        param_types: &[Type],
    ) -> FunctionValue<'a> {
        if let Some(function) = self.module.get_function(name) {
            return function;
        }

        let function = self
            .module
            .add_function(name, function_type, Some(Linkage::External));

        for (index, param_type) in param_types.iter().enumerate() {
            if let Type::Reference { noalias: true, .. } = param_type {
                function.add_attribute(
                    AttributeLoc::Param(index as u32),
                    self.context
                        .create_enum_attribute(Attribute::get_named_enum_kind_id("noalias"), 0),
                );
            }
        }

        function
    }

    /// Creates a function body and positions the builder in its entry block.
    ///
    /// Adds the `uwtable` and `nounwind` attributes.
    pub fn create_function(
        &mut self,
        name: &str,
        function_type: FunctionType<'a>,
        param_types: &[Type],
    ) -> Result<FunctionValue<'a>, Error> {
        let function = self.declare_function(name, function_type, param_types);

        if function.get_first_basic_block().is_some() {
            return Err(codegen_error(format!("function {} is already defined", name)));
        }

        let attributes = [
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("uwtable"), 0),
            self.context
                .create_enum_attribute(Attribute::get_named_enum_kind_id("nounwind"), 0),
        ];

        for attribute in attributes.iter() {
            function.add_attribute(AttributeLoc::Function, *attribute);
        }

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);
        self.current_function = Some(function);

        Ok(function)
    }

    pub fn current_function(&self) -> Result<FunctionValue<'a>, Error> {
        self.current_function
            .ok_or_else(|| codegen_error("no function is being generated"))
    }

    pub fn create_basic_block(&self, name: &str) -> Result<BasicBlock<'a>, Error> {
        Ok(self.context.append_basic_block(self.current_function()?, name))
    }

    /// Adds a stack slot to the entry block of the current function, so the
    /// slot dominates every block of the function.
    pub fn create_entry_alloca(
        &self,
        type_: BasicTypeEnum<'a>,
        name: &str,
    ) -> Result<PointerValue<'a>, Error> {
        let entry = self
            .current_function()?
            .get_first_basic_block()
            .ok_or_else(|| codegen_error("function has no entry block"))?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(type_, name)?)
    }

    /// Whether the block under the builder can still receive instructions.
    pub fn block_is_open(&self) -> bool {
        self.builder
            .get_insert_block()
            .map(|block| block.get_terminator().is_none())
            .unwrap_or(false)
    }

    fn zero_value(&self, type_: BasicTypeEnum<'a>) -> Result<BasicValueEnum<'a>, Error> {
        match type_ {
            BasicTypeEnum::IntType(int_type) => Ok(int_type.const_zero().into()),
            BasicTypeEnum::FloatType(float_type) => Ok(float_type.const_zero().into()),
            BasicTypeEnum::PointerType(pointer_type) => Ok(pointer_type.const_null().into()),
            other => Err(codegen_error(format!("no zero value for {:?}", other))),
        }
    }

    /// Declares an extern, or defines it when it is one of the builtin
    /// operand accessors `int arg(int)` and `float argf(int)`.
    pub fn compile_extern(&mut self, ext: &TypedExtern) -> Result<(), Error> {
        let accessor = match (ext.name.as_str(), &ext.return_type, ext.param_types.as_slice()) {
            ("arg", Type::Int, [Type::Int]) => Some(OperandKind::Int),
            ("argf", Type::Float, [Type::Int]) => Some(OperandKind::Float),
            _ => None,
        };

        match accessor {
            Some(kind) => define_arg_accessor(self, &ext.name, kind),
            None => {
                let function_type = self.fn_type(&ext.return_type, &ext.param_types)?;
                self.declare_function(&ext.name, function_type, &ext.param_types);
                Ok(())
            }
        }
    }

    pub fn compile_function(&mut self, function: &TypedFunction) -> Result<(), Error> {
        let param_types = function
            .params
            .iter()
            .map(|param| param.ty.clone())
            .collect::<Vec<_>>();
        let function_type = self.fn_type(&function.return_type, &param_types)?;
        let function_value = self.create_function(&function.name, function_type, &param_types)?;

        self.named_allocas.clear();
        self.current_return_type = function.return_type.clone();

        for (index, param) in function.params.iter().enumerate() {
            let value = function_value
                .get_nth_param(index as u32)
                .ok_or_else(|| codegen_error(format!("missing parameter {}", param.name)))?;
            value.set_name(&param.name);

            // Reference parameters already are the caller's slot
            if param.ty.is_reference() {
                self.named_allocas
                    .insert(param.name.clone(), GenValue::address(value.into_pointer_value()));
                continue;
            }

            let slot = self.create_entry_alloca(self.convert_type(&param.ty)?, &param.name)?;
            self.builder.build_store(slot, value)?;
            self.named_allocas
                .insert(param.name.clone(), GenValue::address(slot));
        }

        gen_block(self, &function.body)?;

        if self.block_is_open() {
            match &function.return_type {
                Type::Void => self.builder.build_return(None)?,
                other => {
                    let zero = self.zero_value(self.convert_type(other)?)?;
                    self.builder.build_return(Some(&zero))?
                }
            };
        }

        debug!(function = %function.name, "generated function");

        Ok(())
    }

    pub fn compile_program(&mut self, program: &TypedProgram) -> Result<(), Error> {
        declare_runtime(self)?;

        for ext in &program.externs {
            self.compile_extern(ext)?;
        }

        for function in &program.functions {
            self.compile_function(function)?;
        }

        self.current_function = None;

        Ok(())
    }
}

/// Lowers a checked program into a new module named after `file_name`.
///
/// `operands` are the command line values returned by `arg` and `argf`.
pub fn compile<'a>(
    program: &TypedProgram,
    operands: &[String],
    file_name: &str,
    context: &'a Context,
) -> Result<Module<'a>, Error> {
    let mut compiler = Compiler::new(context, file_name, operands);
    compiler.compile_program(program)?;

    Ok(compiler.module)
}
