//! Control flow for the VM.
//!
//! This module contains:
//! - Jump: unconditional jump, charged a tick when it goes backwards
//! - If: conditional branch on truthiness
//! - While: test a `while` condition, closing the loop when false
//! - And / Or: short-circuit branches that keep the deciding value
//! - ExitLoop: `break` out of one or more loops

use moo_ir::Opcode;

use crate::errors::{Fault, Trap};
use crate::vm::dispatch::charge_tick;
use crate::vm::exception::leave_guards;
use crate::vm::frame::{Frame, LoopKind, LoopState, Unwind};
use crate::vm::stack::OperandStack;

/// Execute Opcode::Jump
#[inline(always)]
pub(crate) fn op_jump(frame: &mut Frame, ticks: &mut usize, limit: usize) -> Result<(), Trap> {
    let to = frame.read_addr()?;
    if to <= frame.op_start {
        charge_tick(ticks, limit)?;
    }
    frame.ip = to;
    Ok(())
}

/// Execute Opcode::If - jump when the popped condition is false
#[inline(always)]
pub(crate) fn op_if(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let to = frame.read_addr()?;
    if !stack.pop()?.is_true() {
        frame.ip = to;
    }
    Ok(())
}

/// Execute Opcode::While - on a false condition, close the `while` loop and jump
#[inline(always)]
pub(crate) fn op_while(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let to = frame.read_addr()?;
    if stack.pop()?.is_true() {
        return Ok(());
    }
    match frame.loops.pop() {
        Some(LoopState { kind: LoopKind::While, .. }) => {
            frame.ip = to;
            Ok(())
        }
        _ => Err(Fault::LoopMismatch(Opcode::While).into()),
    }
}

/// Execute Opcode::And / Opcode::Or - jump keeping the top when its truthiness equals `jump_when`
pub(crate) fn op_short_circuit(frame: &mut Frame, stack: &mut OperandStack, jump_when: bool) -> Result<(), Trap> {
    let to = frame.read_addr()?;
    if stack.peek(0)?.is_true() == jump_when {
        frame.ip = to;
    } else {
        stack.pop()?;
    }
    Ok(())
}

/// Execute Opcode::ExitLoop - close the innermost `n` loops and jump
pub(crate) fn op_exit_loop(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let n = frame.read_u8()? as usize;
    let to = frame.read_addr()?;
    if n == 0 || n > frame.loops.len() {
        return Err(Fault::LoopMismatch(Opcode::ExitLoop).into());
    }
    exit_loops(frame, stack, frame.loops.len() - n, to)
}

/// Close the loops from index `depth` up and jump to `to`.
///
/// Guards opened inside those loops are left on the way out; a finally
/// block among them runs first, and the exit resumes when it ends.
pub(crate) fn exit_loops(frame: &mut Frame, stack: &mut OperandStack, depth: usize, to: usize) -> Result<(), Trap> {
    let Some(outer) = frame.loops.get(depth) else {
        return Err(Fault::LoopMismatch(Opcode::ExitLoop).into());
    };
    let (marks, handlers) = (outer.marks, outer.handlers);
    if leave_guards(frame, stack, handlers, Unwind::Exit { depth, to }).is_none() {
        return Ok(());
    }
    frame.restore(stack, marks);
    frame.ip = to;
    Ok(())
}
