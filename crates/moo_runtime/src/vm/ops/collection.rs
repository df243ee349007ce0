//! List and map construction.

use moo_core::{ErrorCode, Value};

use crate::errors::Trap;
use crate::vm::stack::OperandStack;

/// Execute Opcode::MakeSingletonList
pub(crate) fn op_make_singleton_list(stack: &mut OperandStack) -> Result<(), Trap> {
    let v = stack.pop()?;
    stack.push(Value::from(vec![v]));
    Ok(())
}

/// Execute Opcode::ListAddTail - append one element
pub(crate) fn op_list_add_tail(stack: &mut OperandStack) -> Result<(), Trap> {
    let (list, item) = stack.pop2()?;
    stack.push(list.push(item)?);
    Ok(())
}

/// Execute Opcode::ListAppend - splice a second list onto the first
pub(crate) fn op_list_append(stack: &mut OperandStack) -> Result<(), Trap> {
    let (list, items) = stack.pop2()?;
    stack.push(list.extend(&items)?);
    Ok(())
}

/// Execute Opcode::CheckListForSplice - only lists may be spliced with `@`
pub(crate) fn op_check_list_for_splice(stack: &mut OperandStack) -> Result<(), Trap> {
    match stack.peek(0)? {
        Value::List(_) => Ok(()),
        _ => Err(ErrorCode::Type.into()),
    }
}

/// Execute Opcode::MapInsert
pub(crate) fn op_map_insert(stack: &mut OperandStack) -> Result<(), Trap> {
    let (key, value) = stack.pop2()?;
    let map = stack.pop()?;
    stack.push(map.insert(key, value)?);
    Ok(())
}
