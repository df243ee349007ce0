//! Frame data made visible on the stack.

use moo_core::Value;
use moo_ir::ContextKind;

use crate::errors::{Fault, Trap};
use crate::vm::frame::Frame;
use crate::vm::stack::OperandStack;

/// Execute Opcode::Length - length of the sequence at a frame-relative slot (`$`)
pub(crate) fn op_length(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let slot = frame.read_u16()? as usize;
    let len = stack.get(frame.base + slot)?.len()?;
    stack.push(Value::Int(len as i64));
    Ok(())
}

/// Execute Opcode::Context - push `this`, `player`, `caller`, the verb name or the definer
pub(crate) fn op_context(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let kind = ContextKind::from_repr(frame.read_u8()?).ok_or(Fault::BadOperand("context"))?;
    let v = match kind {
        ContextKind::This => Value::Obj(frame.id.this),
        ContextKind::Player => Value::Obj(frame.id.player),
        ContextKind::Caller => Value::Obj(frame.id.caller),
        ContextKind::Verb => Value::Str(frame.id.verb.clone()),
        ContextKind::Definer => Value::Obj(frame.id.definer),
    };
    stack.push(v);
    Ok(())
}
