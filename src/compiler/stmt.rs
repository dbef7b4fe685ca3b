use inkwell::values::BasicValueEnum;

use crate::{
    errors::errors::Error,
    type_checker::typed_ast::{TypedBlock, TypedExpr, TypedStmt},
};

use super::{
    compiler::Compiler,
    expr::{context_for, gen_condition, gen_expression},
    runtime::{codegen_error, emit_print_literal, emit_printf, Format},
    value::GenValue,
};

pub fn gen_block<'a>(compiler: &mut Compiler<'a>, block: &TypedBlock) -> Result<(), Error> {
    for statement in &block.statements {
        gen_statement(compiler, statement)?;
    }

    Ok(())
}

/// Generates LLVM IR for one statement.
///
/// Nothing is emitted once the current block has been terminated by a
/// `return`; the rest of that block is unreachable.
pub fn gen_statement<'a>(compiler: &mut Compiler<'a>, statement: &TypedStmt) -> Result<(), Error> {
    if !compiler.block_is_open() {
        return Ok(());
    }

    match statement {
        TypedStmt::Block(block) => gen_block(compiler, block),
        TypedStmt::Expression(expression) => {
            gen_expression(compiler, expression, None)?;
            Ok(())
        }
        TypedStmt::VarDecl { name, ty, value } => {
            if ty.is_reference() {
                let referent = gen_expression(compiler, value, None)?
                    .to_address(&compiler.builder)?
                    .ok_or_else(|| codegen_error(format!("{} must refer to a variable", name)))?;

                let slot = compiler.create_entry_alloca(compiler.convert_type(ty)?, name)?;
                compiler.builder.build_store(slot, referent)?;
                compiler
                    .named_allocas
                    .insert(name.clone(), GenValue::slot(slot, 2));
            } else {
                let value = gen_expression(compiler, value, context_for(ty))?
                    .to_value(&compiler.builder)?;

                let slot = compiler.create_entry_alloca(compiler.convert_type(ty)?, name)?;
                compiler.builder.build_store(slot, value)?;
                compiler
                    .named_allocas
                    .insert(name.clone(), GenValue::address(slot));
            }

            Ok(())
        }
        TypedStmt::Return(value) => {
            match value {
                Some(value) => {
                    let context = context_for(&compiler.current_return_type);
                    let value = gen_expression(compiler, value, context)?
                        .to_value(&compiler.builder)?;
                    compiler.builder.build_return(Some(&value))?;
                }
                None => {
                    compiler.builder.build_return(None)?;
                }
            }

            Ok(())
        }
        TypedStmt::If {
            condition,
            then_body,
            else_body,
        } => {
            let condition = gen_condition(compiler, condition)?;

            let then_block = compiler.create_basic_block("then")?;
            let else_block = match else_body {
                Some(_) => Some(compiler.create_basic_block("else")?),
                None => None,
            };
            let merge_block = compiler.create_basic_block("merge")?;

            compiler.builder.build_conditional_branch(
                condition,
                then_block,
                else_block.unwrap_or(merge_block),
            )?;

            compiler.builder.position_at_end(then_block);
            gen_statement(compiler, then_body)?;
            if compiler.block_is_open() {
                compiler.builder.build_unconditional_branch(merge_block)?;
            }

            if let (Some(else_block), Some(else_body)) = (else_block, else_body) {
                compiler.builder.position_at_end(else_block);
                gen_statement(compiler, else_body)?;
                if compiler.block_is_open() {
                    compiler.builder.build_unconditional_branch(merge_block)?;
                }
            }

            compiler.builder.position_at_end(merge_block);

            Ok(())
        }
        TypedStmt::While { condition, body } => {
            let header_block = compiler.create_basic_block("while.cond")?;
            let body_block = compiler.create_basic_block("while.body")?;
            let end_block = compiler.create_basic_block("while.end")?;

            compiler.builder.build_unconditional_branch(header_block)?;

            compiler.builder.position_at_end(header_block);
            let condition = gen_condition(compiler, condition)?;
            compiler
                .builder
                .build_conditional_branch(condition, body_block, end_block)?;

            compiler.builder.position_at_end(body_block);
            gen_statement(compiler, body)?;
            if compiler.block_is_open() {
                compiler.builder.build_unconditional_branch(header_block)?;
            }

            compiler.builder.position_at_end(end_block);

            Ok(())
        }
        TypedStmt::Print(expression) => gen_print(compiler, expression),
        TypedStmt::PrintLiteral(text) => emit_print_literal(compiler, text),
    }
}

fn gen_print<'a>(compiler: &mut Compiler<'a>, expression: &TypedExpr) -> Result<(), Error> {
    let value = gen_expression(compiler, expression, None)?.to_value(&compiler.builder)?;

    match value {
        BasicValueEnum::IntValue(value) => {
            let i32_type = compiler.context.i32_type();
            let value = if value.get_type().get_bit_width() < 32 {
                compiler.builder.build_int_z_extend(value, i32_type, "")?
            } else {
                value
            };

            emit_printf(compiler, Format::Int, value.into())
        }
        BasicValueEnum::FloatValue(value) => {
            let value = compiler
                .builder
                .build_float_ext(value, compiler.context.f64_type(), "")?;

            emit_printf(compiler, Format::Float, value.into())
        }
        BasicValueEnum::PointerValue(value) => emit_printf(compiler, Format::String, value.into()),
        other => Err(codegen_error(format!("cannot print {:?}", other))),
    }
}
