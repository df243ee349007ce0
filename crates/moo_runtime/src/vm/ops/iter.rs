//! `for` and `while` loops.
//!
//! A `BeginFor*` opcode checks its operands and pushes a loop state; the
//! matching `IterateFor*` binds the next value or, once the loop is spent,
//! pops the state and jumps past the body. `BeginWhile` pushes a state with
//! nothing to iterate; `While` closes it.

use moo_core::{ErrorCode, Obj, Value};
use moo_ir::Opcode;

use crate::errors::{Fault, Trap};
use crate::vm::frame::{Frame, LoopKind, LoopState};
use crate::vm::stack::OperandStack;

fn push_loop(frame: &mut Frame, stack: &OperandStack, kind: LoopKind) {
    let marks = frame.marks(stack);
    let handlers = frame.handlers.len();
    frame.loops.push(LoopState { kind, marks, handlers });
}

/// Execute Opcode::BeginWhile
pub(crate) fn op_begin_while(frame: &mut Frame, stack: &OperandStack) {
    push_loop(frame, stack, LoopKind::While);
}

/// Execute Opcode::BeginForList - open a loop over a list or map
pub(crate) fn op_begin_for_list(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let value_var = frame.read_var()?;
    let key_var = frame.read_opt_var()?;
    let seq = stack.pop()?;
    if !matches!(seq, Value::List(_) | Value::Map(_)) {
        return Err(ErrorCode::Type.into());
    }
    push_loop(
        frame,
        stack,
        LoopKind::List {
            seq,
            next: 0,
            value_var,
            key_var,
        },
    );
    Ok(())
}

/// Execute Opcode::IterateForList
pub(crate) fn op_iterate_for_list(frame: &mut Frame) -> Result<(), Trap> {
    let end = frame.read_addr()?;
    let Some(LoopState {
        kind: LoopKind::List { seq, next, value_var, key_var },
        ..
    }) = frame.loops.last_mut()
    else {
        return Err(Fault::LoopMismatch(Opcode::IterateForList).into());
    };
    let item = match seq {
        Value::List(items) => items.get(*next).map(|v| (v.clone(), Value::Int(*next as i64 + 1))),
        Value::Map(map) => map.get_index(*next).map(|(k, v)| (v.clone(), k.clone())),
        _ => None,
    };
    let Some((value, key)) = item else {
        frame.loops.pop();
        frame.ip = end;
        return Ok(());
    };
    *next += 1;
    let (value_var, key_var) = (*value_var, *key_var);
    frame.locals[value_var] = value;
    if let Some(key_var) = key_var {
        frame.locals[key_var] = key;
    }
    Ok(())
}

/// Execute Opcode::BeginForRange - open a loop over `from..to`, integers or objects
pub(crate) fn op_begin_for_range(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let var = frame.read_var()?;
    let (from, to) = stack.pop2()?;
    let (from, to, objs) = match (from, to) {
        (Value::Int(a), Value::Int(b)) => (a, b, false),
        (Value::Obj(a), Value::Obj(b)) => (a.id(), b.id(), true),
        _ => return Err(ErrorCode::Type.into()),
    };
    let next = (from <= to).then_some(from);
    push_loop(frame, stack, LoopKind::Range { next, end: to, var, objs });
    Ok(())
}

/// Execute Opcode::IterateForRange
pub(crate) fn op_iterate_for_range(frame: &mut Frame) -> Result<(), Trap> {
    let end_addr = frame.read_addr()?;
    let Some(LoopState {
        kind: LoopKind::Range { next, end, var, objs },
        ..
    }) = frame.loops.last_mut()
    else {
        return Err(Fault::LoopMismatch(Opcode::IterateForRange).into());
    };
    let current = match *next {
        Some(n) if n <= *end => n,
        _ => {
            frame.loops.pop();
            frame.ip = end_addr;
            return Ok(());
        }
    };
    *next = current.checked_add(1);
    let value = if *objs { Value::Obj(Obj(current)) } else { Value::Int(current) };
    let var = *var;
    frame.locals[var] = value;
    Ok(())
}
