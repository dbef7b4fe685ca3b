use std::cmp::Ordering;

use inkwell::{
    intrinsics::Intrinsic,
    types::BasicTypeEnum,
    values::{BasicMetadataValueEnum, BasicValueEnum, FloatValue, IntValue},
    FloatPredicate, IntPredicate,
};

use crate::{
    ast::{
        expressions::{BinaryOperator, UnaryOperator},
        types::Type,
    },
    errors::errors::{Error, ErrorImpl},
    type_checker::typed_ast::{TypedExpr, TypedExprKind},
    Span,
};

use super::{
    compiler::Compiler,
    runtime::{
        codegen_error, emit_guarded_trap, emit_overflow_check, DIVIDE_BY_ZERO_MESSAGE,
        OVERFLOW_MESSAGE, TRAP_STATUS,
    },
    value::GenValue,
};

static CHECKED_INT: Type = Type::CheckedInt;

fn is_checked(type_: &Type) -> bool {
    *type_.strip_reference() == Type::CheckedInt
}

/// The context a value of `type_` is lowered in.
pub fn context_for(type_: &Type) -> Option<&'static Type> {
    if is_checked(type_) {
        Some(&CHECKED_INT)
    } else {
        None
    }
}

fn in_checked_context(expected_type: Option<&Type>) -> bool {
    expected_type.map(is_checked).unwrap_or(false)
}

fn check_literal_range(literal: i64, span: &Span) -> Result<i64, Error> {
    if literal < i32::MIN as i64 || literal > i32::MAX as i64 {
        return Err(Error::new(
            ErrorImpl::LiteralOutOfRange { literal },
            span.start.clone(),
        ));
    }

    Ok(literal)
}

/// Generates LLVM IR for the given expression.
///
/// `expected_type` is the checked-integer context: `Some(cint)` when the
/// value flows into a `cint` declaration, assignment, argument or return.
pub fn gen_expression<'a>(
    compiler: &mut Compiler<'a>,
    expression: &TypedExpr,
    expected_type: Option<&Type>,
) -> Result<GenValue<'a>, Error> {
    match &expression.kind {
        TypedExprKind::IntLiteral(value) => {
            let value = if in_checked_context(expected_type) {
                check_literal_range(*value, &expression.span)?
            } else {
                *value
            };

            Ok(GenValue::scalar(
                compiler.context.i32_type().const_int(value as u64, true),
            ))
        }
        TypedExprKind::FloatLiteral(value) => Ok(GenValue::scalar(
            compiler.context.f32_type().const_float(*value),
        )),
        TypedExprKind::BoolLiteral(value) => Ok(GenValue::scalar(
            compiler.context.bool_type().const_int(*value as u64, false),
        )),
        TypedExprKind::Variable(name) => compiler
            .named_allocas
            .get(name)
            .copied()
            .ok_or_else(|| codegen_error(format!("variable {} has no slot", name))),
        TypedExprKind::Binary {
            operator,
            left,
            right,
        } => gen_binary(compiler, expression, *operator, left, right, expected_type),
        TypedExprKind::Unary { operator, operand } => {
            gen_unary(compiler, expression, *operator, operand, expected_type)
        }
        TypedExprKind::Cast { target, value } => gen_cast(compiler, target, value),
        TypedExprKind::Assign { variable, value } => {
            let slot = compiler
                .named_allocas
                .get(variable)
                .copied()
                .ok_or_else(|| codegen_error(format!("variable {} has no slot", variable)))?;

            let value = gen_expression(compiler, value, context_for(&expression.ty))?
                .to_value(&compiler.builder)?;
            let address = slot
                .to_address(&compiler.builder)?
                .ok_or_else(|| codegen_error(format!("variable {} has no address", variable)))?;

            compiler.builder.build_store(address, value)?;

            Ok(GenValue::address(address))
        }
        TypedExprKind::Call {
            callee,
            arguments,
            parameter_types,
        } => {
            let function = compiler
                .module
                .get_function(callee)
                .ok_or_else(|| codegen_error(format!("function {} is not declared", callee)))?;

            let mut args: Vec<BasicMetadataValueEnum<'a>> = Vec::with_capacity(arguments.len());
            for (argument, parameter_type) in arguments.iter().zip(parameter_types) {
                let lowered = gen_expression(compiler, argument, context_for(parameter_type))?;

                if parameter_type.is_reference() {
                    let address = lowered.to_address(&compiler.builder)?.ok_or_else(|| {
                        Error::new(
                            ErrorImpl::NotAddressable {
                                function: callee.clone(),
                            },
                            argument.span.start.clone(),
                        )
                    })?;
                    args.push(address.into());
                } else {
                    args.push(lowered.to_value(&compiler.builder)?.into());
                }
            }

            let call = compiler.builder.build_call(function, &args, "")?;

            Ok(GenValue::scalar(
                call.try_as_basic_value()
                    .left()
                    .unwrap_or(compiler.context.i32_type().const_zero().into()),
            ))
        }
    }
}

/// Lowers `expression` and reduces it to an `i1` truth value.
pub fn gen_condition<'a>(
    compiler: &mut Compiler<'a>,
    expression: &TypedExpr,
) -> Result<IntValue<'a>, Error> {
    let value = gen_expression(compiler, expression, None)?.to_value(&compiler.builder)?;
    truth_value(compiler, value)
}

fn truth_value<'a>(
    compiler: &Compiler<'a>,
    value: BasicValueEnum<'a>,
) -> Result<IntValue<'a>, Error> {
    match value {
        BasicValueEnum::IntValue(value) if value.get_type().get_bit_width() == 1 => Ok(value),
        BasicValueEnum::IntValue(value) => Ok(compiler.builder.build_int_compare(
            IntPredicate::NE,
            value,
            value.get_type().const_zero(),
            "",
        )?),
        BasicValueEnum::FloatValue(value) => Ok(compiler.builder.build_float_compare(
            FloatPredicate::ONE,
            value,
            value.get_type().const_zero(),
            "",
        )?),
        other => Err(codegen_error(format!("{:?} has no truth value", other))),
    }
}

fn gen_binary<'a>(
    compiler: &mut Compiler<'a>,
    expression: &TypedExpr,
    operator: BinaryOperator,
    left: &TypedExpr,
    right: &TypedExpr,
    expected_type: Option<&Type>,
) -> Result<GenValue<'a>, Error> {
    if operator.is_logical() {
        let lhs = gen_condition(compiler, left)?;
        let rhs = gen_condition(compiler, right)?;

        let result = match operator {
            BinaryOperator::And => compiler.builder.build_and(lhs, rhs, "")?,
            _ => compiler.builder.build_or(lhs, rhs, "")?,
        };
        return Ok(GenValue::scalar(result));
    }

    let checked = operator.is_arithmetic()
        && (in_checked_context(expected_type)
            || is_checked(&expression.ty)
            || is_checked(&left.ty)
            || is_checked(&right.ty));
    let context = if checked { Some(&CHECKED_INT) } else { None };

    let lhs = gen_expression(compiler, left, context)?.to_value(&compiler.builder)?;
    let rhs = gen_expression(compiler, right, context)?.to_value(&compiler.builder)?;

    if operator.is_comparison() {
        return gen_comparison(compiler, operator, lhs, rhs).map(GenValue::scalar);
    }

    match (lhs, rhs) {
        (BasicValueEnum::FloatValue(lhs), BasicValueEnum::FloatValue(rhs)) => {
            gen_float_arithmetic(compiler, operator, lhs, rhs).map(GenValue::scalar)
        }
        (BasicValueEnum::IntValue(lhs), BasicValueEnum::IntValue(rhs)) if checked => {
            gen_checked_arithmetic(compiler, operator, lhs, rhs).map(GenValue::scalar)
        }
        (BasicValueEnum::IntValue(lhs), BasicValueEnum::IntValue(rhs)) => {
            gen_int_arithmetic(compiler, operator, lhs, rhs).map(GenValue::scalar)
        }
        (lhs, rhs) => Err(codegen_error(format!(
            "cannot apply {} to {:?} and {:?}",
            operator, lhs, rhs
        ))),
    }
}

fn gen_comparison<'a>(
    compiler: &Compiler<'a>,
    operator: BinaryOperator,
    lhs: BasicValueEnum<'a>,
    rhs: BasicValueEnum<'a>,
) -> Result<IntValue<'a>, Error> {
    match (lhs, rhs) {
        (BasicValueEnum::IntValue(lhs), BasicValueEnum::IntValue(rhs)) => {
            // Booleans compare unsigned so that true > false
            let signed = lhs.get_type().get_bit_width() > 1;
            let predicate = match (operator, signed) {
                (BinaryOperator::Equals, _) => IntPredicate::EQ,
                (BinaryOperator::Less, true) => IntPredicate::SLT,
                (BinaryOperator::Less, false) => IntPredicate::ULT,
                (BinaryOperator::Greater, true) => IntPredicate::SGT,
                (BinaryOperator::Greater, false) => IntPredicate::UGT,
                (other, _) => {
                    return Err(codegen_error(format!("{} is not a comparison", other)))
                }
            };

            Ok(compiler.builder.build_int_compare(predicate, lhs, rhs, "")?)
        }
        (BasicValueEnum::FloatValue(lhs), BasicValueEnum::FloatValue(rhs)) => {
            let predicate = match operator {
                BinaryOperator::Equals => FloatPredicate::OEQ,
                BinaryOperator::Less => FloatPredicate::OLT,
                BinaryOperator::Greater => FloatPredicate::OGT,
                other => return Err(codegen_error(format!("{} is not a comparison", other))),
            };

            Ok(compiler.builder.build_float_compare(predicate, lhs, rhs, "")?)
        }
        (lhs, rhs) => Err(codegen_error(format!(
            "cannot compare {:?} and {:?}",
            lhs, rhs
        ))),
    }
}

fn gen_int_arithmetic<'a>(
    compiler: &mut Compiler<'a>,
    operator: BinaryOperator,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<IntValue<'a>, Error> {
    match operator {
        BinaryOperator::Add => Ok(compiler.builder.build_int_add(lhs, rhs, "")?),
        BinaryOperator::Subtract => Ok(compiler.builder.build_int_sub(lhs, rhs, "")?),
        BinaryOperator::Multiply => Ok(compiler.builder.build_int_mul(lhs, rhs, "")?),
        BinaryOperator::Divide => {
            trap_on_zero_divisor(compiler, rhs)?;
            Ok(compiler.builder.build_int_signed_div(lhs, rhs, "")?)
        }
        other => Err(codegen_error(format!("{} is not arithmetic", other))),
    }
}

fn gen_float_arithmetic<'a>(
    compiler: &mut Compiler<'a>,
    operator: BinaryOperator,
    lhs: FloatValue<'a>,
    rhs: FloatValue<'a>,
) -> Result<FloatValue<'a>, Error> {
    match operator {
        BinaryOperator::Add => Ok(compiler.builder.build_float_add(lhs, rhs, "")?),
        BinaryOperator::Subtract => Ok(compiler.builder.build_float_sub(lhs, rhs, "")?),
        BinaryOperator::Multiply => Ok(compiler.builder.build_float_mul(lhs, rhs, "")?),
        BinaryOperator::Divide => {
            let is_zero = compiler.builder.build_float_compare(
                FloatPredicate::OEQ,
                rhs,
                rhs.get_type().const_zero(),
                "",
            )?;
            emit_guarded_trap(compiler, is_zero, DIVIDE_BY_ZERO_MESSAGE, TRAP_STATUS)?;

            Ok(compiler.builder.build_float_div(lhs, rhs, "")?)
        }
        other => Err(codegen_error(format!("{} is not arithmetic", other))),
    }
}

fn gen_checked_arithmetic<'a>(
    compiler: &mut Compiler<'a>,
    operator: BinaryOperator,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<IntValue<'a>, Error> {
    match operator {
        BinaryOperator::Add => gen_overflow_intrinsic(compiler, "llvm.sadd.with.overflow", lhs, rhs),
        BinaryOperator::Subtract => {
            gen_overflow_intrinsic(compiler, "llvm.ssub.with.overflow", lhs, rhs)
        }
        BinaryOperator::Multiply => {
            gen_overflow_intrinsic(compiler, "llvm.smul.with.overflow", lhs, rhs)
        }
        BinaryOperator::Divide => gen_checked_division(compiler, lhs, rhs),
        other => Err(codegen_error(format!("{} is not arithmetic", other))),
    }
}

/// Calls one of the `with.overflow` intrinsics and routes its flag through
/// the overflow check helper.
fn gen_overflow_intrinsic<'a>(
    compiler: &mut Compiler<'a>,
    name: &str,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<IntValue<'a>, Error> {
    let intrinsic =
        Intrinsic::find(name).ok_or_else(|| codegen_error(format!("unknown intrinsic {}", name)))?;
    let function = intrinsic
        .get_declaration(&compiler.module, &[BasicTypeEnum::IntType(lhs.get_type())])
        .ok_or_else(|| codegen_error(format!("cannot declare {}", name)))?;

    let result = compiler
        .builder
        .build_call(function, &[lhs.into(), rhs.into()], "")?
        .try_as_basic_value()
        .left()
        .ok_or_else(|| codegen_error(format!("{} returned no value", name)))?
        .into_struct_value();

    let value = compiler
        .builder
        .build_extract_value(result, 0, "")?
        .into_int_value();
    let overflow = compiler
        .builder
        .build_extract_value(result, 1, "")?
        .into_int_value();

    emit_overflow_check(compiler, overflow)?;

    Ok(value)
}

fn trap_on_zero_divisor<'a>(compiler: &mut Compiler<'a>, divisor: IntValue<'a>) -> Result<(), Error> {
    let is_zero = compiler.builder.build_int_compare(
        IntPredicate::EQ,
        divisor,
        divisor.get_type().const_zero(),
        "",
    )?;

    emit_guarded_trap(compiler, is_zero, DIVIDE_BY_ZERO_MESSAGE, TRAP_STATUS)
}

/// Divides in 64 bits and traps when the quotient leaves the 32-bit range,
/// which only happens for `-2147483648 / -1`.
fn gen_checked_division<'a>(
    compiler: &mut Compiler<'a>,
    lhs: IntValue<'a>,
    rhs: IntValue<'a>,
) -> Result<IntValue<'a>, Error> {
    trap_on_zero_divisor(compiler, rhs)?;

    let i64_type = compiler.context.i64_type();
    let wide_lhs = compiler.builder.build_int_s_extend(lhs, i64_type, "")?;
    let wide_rhs = compiler.builder.build_int_s_extend(rhs, i64_type, "")?;
    let quotient = compiler
        .builder
        .build_int_signed_div(wide_lhs, wide_rhs, "")?;

    let too_large = compiler.builder.build_int_compare(
        IntPredicate::SGT,
        quotient,
        i64_type.const_int(i32::MAX as u64, true),
        "",
    )?;
    let too_small = compiler.builder.build_int_compare(
        IntPredicate::SLT,
        quotient,
        i64_type.const_int(i32::MIN as i64 as u64, true),
        "",
    )?;
    let out_of_range = compiler.builder.build_or(too_large, too_small, "")?;
    emit_guarded_trap(compiler, out_of_range, OVERFLOW_MESSAGE, TRAP_STATUS)?;

    Ok(compiler
        .builder
        .build_int_truncate(quotient, lhs.get_type(), "")?)
}

fn gen_unary<'a>(
    compiler: &mut Compiler<'a>,
    expression: &TypedExpr,
    operator: UnaryOperator,
    operand: &TypedExpr,
    expected_type: Option<&Type>,
) -> Result<GenValue<'a>, Error> {
    match operator {
        UnaryOperator::Not => {
            let value = gen_expression(compiler, operand, None)?.to_value(&compiler.builder)?;
            match value {
                BasicValueEnum::IntValue(value) => {
                    Ok(GenValue::scalar(compiler.builder.build_not(value, "")?))
                }
                other => Err(codegen_error(format!("cannot negate {:?}", other))),
            }
        }
        UnaryOperator::Negate => {
            let checked = in_checked_context(expected_type)
                || is_checked(&expression.ty)
                || is_checked(&operand.ty);

            if checked {
                if let TypedExprKind::IntLiteral(literal) = operand.kind {
                    let folded = check_literal_range(-literal, &expression.span)?;
                    return Ok(GenValue::scalar(
                        compiler.context.i32_type().const_int(folded as u64, true),
                    ));
                }
            }

            let context = if checked { Some(&CHECKED_INT) } else { None };
            let value = gen_expression(compiler, operand, context)?.to_value(&compiler.builder)?;

            match value {
                BasicValueEnum::FloatValue(value) => {
                    Ok(GenValue::scalar(compiler.builder.build_float_neg(value, "")?))
                }
                BasicValueEnum::IntValue(value) if checked => {
                    let zero = value.get_type().const_zero();
                    gen_overflow_intrinsic(compiler, "llvm.ssub.with.overflow", zero, value)
                        .map(GenValue::scalar)
                }
                BasicValueEnum::IntValue(value) => {
                    Ok(GenValue::scalar(compiler.builder.build_int_neg(value, "")?))
                }
                other => Err(codegen_error(format!("cannot negate {:?}", other))),
            }
        }
    }
}

fn gen_cast<'a>(
    compiler: &mut Compiler<'a>,
    target: &Type,
    value: &TypedExpr,
) -> Result<GenValue<'a>, Error> {
    let value = gen_expression(compiler, value, None)?.to_value(&compiler.builder)?;
    let target_type = compiler.convert_type(target)?;

    let converted: BasicValueEnum<'a> = match (value, target_type) {
        (BasicValueEnum::IntValue(value), BasicTypeEnum::IntType(int_type)) => {
            match value
                .get_type()
                .get_bit_width()
                .cmp(&int_type.get_bit_width())
            {
                Ordering::Equal => value.into(),
                Ordering::Greater => compiler
                    .builder
                    .build_int_truncate(value, int_type, "")?
                    .into(),
                Ordering::Less => compiler
                    .builder
                    .build_int_s_extend(value, int_type, "")?
                    .into(),
            }
        }
        (BasicValueEnum::FloatValue(value), BasicTypeEnum::IntType(int_type)) => compiler
            .builder
            .build_float_to_unsigned_int(value, int_type, "")?
            .into(),
        (BasicValueEnum::IntValue(value), BasicTypeEnum::FloatType(float_type)) => compiler
            .builder
            .build_unsigned_int_to_float(value, float_type, "")?
            .into(),
        (BasicValueEnum::FloatValue(value), BasicTypeEnum::FloatType(float_type)) => {
            if value.get_type() == float_type {
                value.into()
            } else {
                compiler
                    .builder
                    .build_float_cast(value, float_type, "")?
                    .into()
            }
        }
        (value, target_type) => {
            return Err(codegen_error(format!(
                "cannot cast {:?} to {:?}",
                value, target_type
            )))
        }
    };

    Ok(GenValue::scalar(converted))
}
