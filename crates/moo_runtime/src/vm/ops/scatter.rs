//! Scatter assignment: `{a, ?b = 2, @rest} = list`.

use moo_core::{ErrorCode, Value};
use moo_ir::{NO_ADDR, ScatterKind};
use smallvec::SmallVec;

use crate::errors::{Fault, Trap};
use crate::vm::frame::Frame;
use crate::vm::stack::OperandStack;

struct Target {
    kind: ScatterKind,
    var: usize,
    default: Option<usize>,
}

fn read_target(frame: &mut Frame) -> Result<Target, Fault> {
    let kind = ScatterKind::from_repr(frame.read_u8()?).ok_or(Fault::BadOperand("scatter kind"))?;
    let var = frame.read_var()?;
    let default = match frame.read_u16()? {
        NO_ADDR => None,
        addr if addr as usize <= frame.program.code.len() => Some(addr as usize),
        addr => return Err(Fault::BadAddress(addr as usize)),
    };
    Ok(Target { kind, var, default })
}

/// Execute Opcode::Scatter
///
/// The list stays on the stack. Required targets take the leading values,
/// optional targets are filled left to right from what remains, and the
/// rest target takes any surplus. Execution continues at the default code
/// of the first optional target left unfilled, or at `done`.
pub(crate) fn op_scatter(frame: &mut Frame, stack: &mut OperandStack) -> Result<(), Trap> {
    let n = frame.read_u8()? as usize;
    let targets = (0..n)
        .map(|_| read_target(frame))
        .collect::<Result<SmallVec<[Target; 8]>, _>>()?;
    let done = frame.read_addr()?;

    let count = |kind| targets.iter().filter(|t| t.kind == kind).count();
    let (nreq, nopt, nrest) = (count(ScatterKind::Required), count(ScatterKind::Optional), count(ScatterKind::Rest));
    if nrest > 1 {
        return Err(Fault::BadOperand("scatter rest").into());
    }

    let Value::List(list) = stack.peek(0)? else {
        return Err(ErrorCode::Type.into());
    };
    let list = list.clone();
    let len = list.len();
    if len < nreq || (nrest == 0 && len > nreq + nopt) {
        return Err(ErrorCode::Args.into());
    }
    let mut opt_left = (len - nreq).min(nopt);
    let rest_len = len - nreq - opt_left;

    let mut pos = 0;
    let mut resume = None;
    for target in &targets {
        match target.kind {
            ScatterKind::Required => {
                frame.locals[target.var] = list[pos].clone();
                pos += 1;
            }
            ScatterKind::Optional if opt_left > 0 => {
                frame.locals[target.var] = list[pos].clone();
                pos += 1;
                opt_left -= 1;
            }
            ScatterKind::Optional => {
                if resume.is_none() {
                    resume = target.default;
                }
            }
            ScatterKind::Rest => {
                frame.locals[target.var] = Value::list(list[pos..pos + rest_len].iter().cloned());
                pos += rest_len;
            }
        }
    }
    frame.ip = resume.unwrap_or(done);
    Ok(())
}
