//! Exception guards.
//!
//! This module contains:
//! - TryExcept / TryCatch: push an except guard
//! - EndExcept: pop it on normal completion of the guarded block
//! - TryFinally: push a finally guard over the block up to the finally code
//! - EndFinally: the exit shared by both paths into a finally block

use moo_ir::Opcode;
use smallvec::SmallVec;
use tracing::trace;

use crate::errors::{Fault, Trap};
use crate::vm::frame::{Bind, Codes, ExceptArm, Frame, Guard, Handler, Unwind};
use crate::vm::stack::OperandStack;

fn push_guard(frame: &mut Frame, stack: &OperandStack, guard: Guard) {
    let marks = frame.marks(stack);
    frame.handlers.push(Handler { guard, marks });
}

/// Execute Opcode::TryExcept - one guard holding every arm of the `try`
pub(crate) fn op_try_except(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let n = frame.read_u8()?;
    if n == 0 {
        return Err(Fault::BadOperand("except arm count").into());
    }
    let mut arms = SmallVec::new();
    for _ in 0..n {
        let codes = Codes::from_literal(&frame.read_literal()?)?;
        let bind = frame.read_opt_var()?.map_or(Bind::Nothing, Bind::Var);
        let resume = frame.read_addr()?;
        arms.push(ExceptArm { codes, bind, resume });
    }
    push_guard(frame, stack, Guard::Except(arms));
    Ok(())
}

/// Execute Opcode::TryCatch - guard for a catch expression
pub(crate) fn op_try_catch(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let codes = Codes::from_literal(&frame.read_literal()?)?;
    let resume = frame.read_addr()?;
    let arm = ExceptArm {
        codes,
        bind: Bind::Push,
        resume,
    };
    push_guard(frame, stack, Guard::Except(smallvec::smallvec![arm]));
    Ok(())
}

/// Execute Opcode::EndExcept
pub(crate) fn op_end_except(frame: &mut Frame) -> Result<(), Trap> {
    let to = frame.read_addr()?;
    match frame.handlers.pop() {
        Some(Handler {
            guard: Guard::Except(_),
            ..
        }) => {
            frame.ip = to;
            Ok(())
        }
        _ => Err(Fault::HandlerMismatch(Opcode::EndExcept).into()),
    }
}

/// Execute Opcode::TryFinally
pub(crate) fn op_try_finally(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let finally = frame.read_addr()?;
    let start = frame.op_start;
    push_guard(frame, stack, Guard::Finally { start, finally });
    Ok(())
}

/// Execute Opcode::EndFinally
///
/// Reached with the guard still on top after normal completion, or with an
/// error, return or break pending for this finally block. The pending exit
/// is handed back for the interpreter to resume. Anything else is a
/// malformed program.
pub(crate) fn op_end_finally(frame: &mut Frame) -> Result<Option<Unwind>, Trap> {
    let addr = frame.read_addr()?;
    if let Some(Handler {
        guard: Guard::Finally { finally, .. },
        ..
    }) = frame.handlers.last()
    {
        if *finally == addr {
            frame.handlers.pop();
            return Ok(None);
        }
    }
    if frame.pending.last().is_some_and(|p| p.finally == addr) {
        if let Some(pending) = frame.pending.pop() {
            trace!(finally = addr, reason = ?pending.reason, "resuming after finally");
            return Ok(Some(pending.reason));
        }
    }
    Err(Fault::HandlerMismatch(Opcode::EndFinally).into())
}
