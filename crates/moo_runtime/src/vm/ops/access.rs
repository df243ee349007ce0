//! Indexing and property access.
//!
//! This module contains:
//! - Ref / PushRef / RangeRef: reads through an index or range
//! - IndexSet / RangeSet: copy-on-write updates
//! - GetProp / PushGetProp / PutProp: property reads and writes through the store

use moo_core::{ErrorCode, Obj, Value};

use crate::errors::Trap;
use crate::store::Store;
use crate::vm::stack::OperandStack;

/// Execute Opcode::Ref - `base[idx]`
pub(crate) fn op_ref(stack: &mut OperandStack) -> Result<(), Trap> {
    let (base, idx) = stack.pop2()?;
    stack.push(base.index(&idx)?);
    Ok(())
}

/// Execute Opcode::PushRef - `base[idx]`, keeping base and index for a later IndexSet
pub(crate) fn op_push_ref(stack: &mut OperandStack) -> Result<(), Trap> {
    let v = stack.peek(1)?.index(stack.peek(0)?)?;
    stack.push(v);
    Ok(())
}

/// Execute Opcode::RangeRef - `base[from..to]`
pub(crate) fn op_range_ref(stack: &mut OperandStack) -> Result<(), Trap> {
    let (from, to) = stack.pop2()?;
    let base = stack.pop()?;
    stack.push(base.range(&from, &to)?);
    Ok(())
}

/// Execute Opcode::IndexSet - `base[idx] = value`
pub(crate) fn op_index_set(stack: &mut OperandStack) -> Result<(), Trap> {
    let (idx, value) = stack.pop2()?;
    let base = stack.pop()?;
    stack.push(base.index_set(&idx, value)?);
    Ok(())
}

/// Execute Opcode::RangeSet - `base[from..to] = value`
pub(crate) fn op_range_set(stack: &mut OperandStack) -> Result<(), Trap> {
    let (to, value) = stack.pop2()?;
    let (base, from) = stack.pop2()?;
    stack.push(base.range_set(&from, &to, &value)?);
    Ok(())
}

fn prop_operands(obj: &Value, name: &Value) -> Result<(Obj, String), ErrorCode> {
    match (obj, name) {
        (Value::Obj(o), Value::Str(n)) => Ok((*o, n.to_string())),
        _ => Err(ErrorCode::Type),
    }
}

/// Execute Opcode::GetProp - `obj.(name)`
pub(crate) fn op_get_prop(store: &dyn Store, stack: &mut OperandStack) -> Result<(), Trap> {
    let (obj, name) = stack.pop2()?;
    let (obj, name) = prop_operands(&obj, &name)?;
    stack.push(store.get_property(obj, &name)?);
    Ok(())
}

/// Execute Opcode::PushGetProp - `obj.(name)`, keeping object and name for a later PutProp
pub(crate) fn op_push_get_prop(store: &dyn Store, stack: &mut OperandStack) -> Result<(), Trap> {
    let (obj, name) = prop_operands(stack.peek(1)?, stack.peek(0)?)?;
    stack.push(store.get_property(obj, &name)?);
    Ok(())
}

/// Execute Opcode::PutProp - `obj.(name) = value`, leaving the value
pub(crate) fn op_put_prop(store: &dyn Store, stack: &mut OperandStack) -> Result<(), Trap> {
    let (name, value) = stack.pop2()?;
    let obj = stack.pop()?;
    let (obj, name) = prop_operands(&obj, &name)?;
    store.set_property(obj, &name, value.clone())?;
    stack.push(value);
    Ok(())
}
