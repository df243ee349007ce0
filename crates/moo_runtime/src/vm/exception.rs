use tracing::trace;

use super::frame::{Bind, Frame, Guard, Pending, Unwind};
use super::stack::OperandStack;
use crate::errors::Exception;

/// Offer `exc` to the frame's guards, innermost first.
///
/// Every guard scanned is discarded, the accepting one included. On a match
/// the frame resumes at the guard's address with its stack, loops and
/// pending errors cut back to where they stood when the guard was pushed.
/// An unmatched error is handed back for the caller's frame.
pub(crate) fn catch(frame: &mut Frame, stack: &mut OperandStack, exc: Exception) -> Result<(), Exception> {
    let at = frame.op_start;
    while let Some(handler) = frame.handlers.pop() {
        match handler.guard {
            Guard::Except(arms) => {
                let Some(arm) = arms.iter().find(|arm| arm.codes.accepts(exc.code)) else {
                    continue;
                };
                frame.restore(stack, handler.marks);
                match arm.bind {
                    Bind::Nothing => {}
                    Bind::Var(slot) => frame.locals[slot] = exc.to_value(),
                    Bind::Push => stack.push(exc.to_value()),
                }
                trace!(code = exc.code.name(), at, resume = arm.resume, "error caught");
                frame.ip = arm.resume;
                return Ok(());
            }
            Guard::Finally { start, finally } => {
                if !(start..finally).contains(&at) {
                    continue;
                }
                frame.restore(stack, handler.marks);
                trace!(code = exc.code.name(), at, finally, "error held for finally");
                frame.pending.push(Pending {
                    finally,
                    reason: Unwind::Raise(exc),
                });
                frame.ip = finally;
                return Ok(());
            }
        }
    }
    Err(exc)
}

/// Route a `return` or `break` through the finally blocks it leaves.
///
/// Guards above `floor` are the ones the exit leaves. The innermost finally
/// guard among them whose block holds the current instruction takes the
/// exit: guards above it are dropped, the frame is cut back to its marks,
/// and execution moves to its finally code with `reason` pending. When no
/// such guard exists the guards above `floor` are dropped and `reason` is
/// handed back for the caller to complete.
pub(crate) fn leave_guards(frame: &mut Frame, stack: &mut OperandStack, floor: usize, reason: Unwind) -> Option<Unwind> {
    let at = frame.op_start;
    let found = frame.handlers.iter().enumerate().skip(floor).rev().find_map(|(i, h)| match h.guard {
        Guard::Finally { start, finally } if (start..finally).contains(&at) => Some((i, finally, h.marks)),
        _ => None,
    });
    let Some((index, finally, marks)) = found else {
        frame.handlers.truncate(floor);
        return Some(reason);
    };
    frame.handlers.truncate(index);
    frame.restore(stack, marks);
    trace!(at, finally, "exit held for finally");
    frame.pending.push(Pending { finally, reason });
    frame.ip = finally;
    None
}
