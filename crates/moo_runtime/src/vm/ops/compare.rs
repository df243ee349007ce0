//! Comparison operations for the VM.

use std::cmp::Ordering;

use moo_core::Value;

use crate::errors::Trap;
use crate::vm::stack::OperandStack;

fn push_bool(stack: &mut OperandStack, b: bool) {
    stack.push(Value::Int(b as i64));
}

/// Execute Opcode::Eq
pub(crate) fn op_eq(stack: &mut OperandStack) -> Result<(), Trap> {
    let (a, b) = stack.pop2()?;
    push_bool(stack, a.equals(&b));
    Ok(())
}

/// Execute Opcode::Ne
pub(crate) fn op_ne(stack: &mut OperandStack) -> Result<(), Trap> {
    let (a, b) = stack.pop2()?;
    push_bool(stack, !a.equals(&b));
    Ok(())
}

/// Execute Opcode::Lt / Le / Gt / Ge; `accept` decides from the ordering.
pub(crate) fn op_order(stack: &mut OperandStack, accept: fn(Ordering) -> bool) -> Result<(), Trap> {
    let (a, b) = stack.pop2()?;
    let ord = a.compare(&b)?;
    push_bool(stack, accept(ord));
    Ok(())
}

/// Execute Opcode::In - 1-based position of an element, or 0
pub(crate) fn op_in(stack: &mut OperandStack) -> Result<(), Trap> {
    let (elem, seq) = stack.pop2()?;
    stack.push(Value::Int(elem.position_in(&seq)?));
    Ok(())
}
