//! Math operations for the VM.
//!
//! This module contains arithmetic operations:
//! - Add, Sub, Mul, Div, Mod, Exp: binary arithmetic
//! - UnaryMinus: negation
//! - Not: logical NOT

use moo_core::{ErrorCode, Value};

use crate::errors::Trap;
use crate::vm::stack::OperandStack;

type BinaryFn = fn(&Value, &Value) -> Result<Value, ErrorCode>;

#[inline(always)]
fn exec_binary_op(stack: &mut OperandStack, f: BinaryFn) -> Result<(), Trap> {
    let (a, b) = stack.pop2()?;
    stack.push(f(&a, &b)?);
    Ok(())
}

/// Execute Opcode::Add - addition and string concatenation
#[inline(always)]
pub(crate) fn op_add(stack: &mut OperandStack) -> Result<(), Trap> {
    exec_binary_op(stack, Value::add)
}

/// Execute Opcode::Sub - subtraction
#[inline(always)]
pub(crate) fn op_sub(stack: &mut OperandStack) -> Result<(), Trap> {
    exec_binary_op(stack, Value::sub)
}

/// Execute Opcode::Mul - multiplication
#[inline(always)]
pub(crate) fn op_mul(stack: &mut OperandStack) -> Result<(), Trap> {
    exec_binary_op(stack, Value::mul)
}

/// Execute Opcode::Div - division
#[inline(always)]
pub(crate) fn op_div(stack: &mut OperandStack) -> Result<(), Trap> {
    exec_binary_op(stack, Value::div)
}

/// Execute Opcode::Mod - remainder
#[inline(always)]
pub(crate) fn op_mod(stack: &mut OperandStack) -> Result<(), Trap> {
    exec_binary_op(stack, Value::rem)
}

/// Execute Opcode::Exp - exponentiation
#[inline(always)]
pub(crate) fn op_exp(stack: &mut OperandStack) -> Result<(), Trap> {
    exec_binary_op(stack, Value::pow)
}

/// Execute Opcode::UnaryMinus - negation
#[inline(always)]
pub(crate) fn op_neg(stack: &mut OperandStack) -> Result<(), Trap> {
    let v = stack.pop()?;
    stack.push(v.neg()?);
    Ok(())
}

/// Execute Opcode::Not - logical NOT
#[inline(always)]
pub(crate) fn op_not(stack: &mut OperandStack) -> Result<(), Trap> {
    let v = stack.pop()?;
    stack.push(Value::Int(!v.is_true() as i64));
    Ok(())
}
