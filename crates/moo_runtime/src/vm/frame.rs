//! Activation records and the per-frame guard and loop state.
//!
//! This module contains the types one frame carries besides its locals:
//! - `Handler`: an active except or finally guard
//! - `LoopState`: an active `for` or `while` loop
//! - `Pending`: why a finally block is running, resumed when it ends

use std::sync::Arc;

use moo_core::{ErrorCode, Obj, Value};
use moo_ir::{NO_VAR, Program, READY_VARS};
use smallvec::SmallVec;

use crate::errors::{Exception, Fault, TraceFrame};
use crate::vm::stack::OperandStack;

/// Heights to restore when control returns to a guard or leaves a loop.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Marks {
    pub(crate) stack: usize,
    pub(crate) loops: usize,
    pub(crate) pending: usize,
}

/// Error codes an except arm accepts.
#[derive(Debug)]
pub(crate) enum Codes {
    Any,
    Only(SmallVec<[ErrorCode; 4]>),
}

impl Codes {
    /// `0` accepts any code; otherwise the literal is a list of errors.
    pub(crate) fn from_literal(v: &Value) -> Result<Self, Fault> {
        match v {
            Value::Int(0) => Ok(Codes::Any),
            Value::List(items) => items
                .iter()
                .map(|item| item.as_err().ok_or(Fault::BadOperand("except codes")))
                .collect::<Result<_, _>>()
                .map(Codes::Only),
            _ => Err(Fault::BadOperand("except codes")),
        }
    }

    pub(crate) fn accepts(&self, code: ErrorCode) -> bool {
        match self {
            Codes::Any => true,
            Codes::Only(codes) => codes.contains(&code),
        }
    }
}

/// Where an intercepted error goes.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Bind {
    Nothing,
    Var(usize),
    /// Catch expressions leave the error on the stack.
    Push,
}

#[derive(Debug)]
pub(crate) struct ExceptArm {
    pub(crate) codes: Codes,
    pub(crate) bind: Bind,
    pub(crate) resume: usize,
}

#[derive(Debug)]
pub(crate) enum Guard {
    /// All arms of one `try`, tested in order.
    Except(SmallVec<[ExceptArm; 2]>),
    /// Intercepts errors raised at addresses `start..finally`.
    Finally { start: usize, finally: usize },
}

/// Exception handler state.
#[derive(Debug)]
pub(crate) struct Handler {
    pub(crate) guard: Guard,
    pub(crate) marks: Marks,
}

/// How control left a block guarded by a finally clause.
#[derive(Debug)]
pub(crate) enum Unwind {
    Raise(Exception),
    Return(Value),
    /// `break` out of the loops from index `depth` up, then jump to `to`.
    Exit { depth: usize, to: usize },
}

/// Exit to resume when the finally block at `finally` ends.
#[derive(Debug)]
pub(crate) struct Pending {
    pub(crate) finally: usize,
    pub(crate) reason: Unwind,
}

#[derive(Debug)]
pub(crate) enum LoopKind {
    /// Over a list (key = 1-based index) or a map (key = map key).
    List {
        seq: Value,
        next: usize,
        value_var: usize,
        key_var: Option<usize>,
    },
    /// Over integers or object numbers, `next` is `None` once exhausted.
    Range {
        next: Option<i64>,
        end: i64,
        var: usize,
        objs: bool,
    },
    While,
}

#[derive(Debug)]
pub(crate) struct LoopState {
    pub(crate) kind: LoopKind,
    pub(crate) marks: Marks,
    pub(crate) handlers: usize,
}

/// Who a frame runs as.
#[derive(Clone, Debug)]
pub(crate) struct Identity {
    pub(crate) this: Obj,
    pub(crate) player: Obj,
    pub(crate) caller: Obj,
    pub(crate) verb: Arc<str>,
    pub(crate) definer: Obj,
}

impl Identity {
    /// Identity of a top-level run that is not a verb call.
    pub(crate) fn unestablished(player: Obj) -> Self {
        Self {
            this: Obj::NOTHING,
            player,
            caller: Obj::NOTHING,
            verb: Arc::from(""),
            definer: Obj::NOTHING,
        }
    }
}

pub(crate) struct Frame {
    pub(crate) program: Arc<Program>,
    pub(crate) ip: usize,
    /// Address of the instruction being executed.
    pub(crate) op_start: usize,
    pub(crate) base: usize,
    pub(crate) locals: Vec<Value>,
    pub(crate) id: Identity,
    pub(crate) loops: Vec<LoopState>,
    pub(crate) handlers: Vec<Handler>,
    pub(crate) pending: Vec<Pending>,
}

impl Frame {
    pub(crate) fn new(program: Arc<Program>, base: usize, id: Identity, args: Value) -> Self {
        let mut locals = vec![Value::ZERO; program.num_locals];
        let ready = [
            Value::Obj(id.this),
            Value::Obj(id.player),
            Value::Obj(id.caller),
            Value::Str(id.verb.clone()),
            args,
        ];
        for (name, value) in READY_VARS.iter().zip(ready) {
            if let Some(slot) = program.var_slot(name).filter(|&slot| slot < locals.len()) {
                locals[slot] = value;
            }
        }
        Self {
            program,
            ip: 0,
            op_start: 0,
            base,
            locals,
            id,
            loops: Vec::new(),
            handlers: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.ip >= self.program.code.len()
    }

    #[inline(always)]
    pub(crate) fn read_u8(&mut self) -> Result<u8, Fault> {
        let byte = *self.program.code.get(self.ip).ok_or(Fault::Truncated(self.ip))?;
        self.ip += 1;
        Ok(byte)
    }

    #[inline(always)]
    pub(crate) fn read_u16(&mut self) -> Result<u16, Fault> {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// A jump target. The end of the code is a valid target.
    pub(crate) fn read_addr(&mut self) -> Result<usize, Fault> {
        let addr = self.read_u16()? as usize;
        if addr > self.program.code.len() {
            return Err(Fault::BadAddress(addr));
        }
        Ok(addr)
    }

    fn local(&self, slot: u16) -> Result<usize, Fault> {
        let slot = slot as usize;
        if slot >= self.locals.len() {
            return Err(Fault::BadLocal(slot));
        }
        Ok(slot)
    }

    pub(crate) fn read_var(&mut self) -> Result<usize, Fault> {
        let slot = self.read_u16()?;
        self.local(slot)
    }

    pub(crate) fn read_opt_var(&mut self) -> Result<Option<usize>, Fault> {
        match self.read_u16()? {
            NO_VAR => Ok(None),
            slot => self.local(slot).map(Some),
        }
    }

    pub(crate) fn read_literal(&mut self) -> Result<Value, Fault> {
        let idx = self.read_u16()? as usize;
        self.program.literals.get(idx).cloned().ok_or(Fault::BadLiteral(idx))
    }

    pub(crate) fn marks(&self, stack: &OperandStack) -> Marks {
        Marks {
            stack: stack.len(),
            loops: self.loops.len(),
            pending: self.pending.len(),
        }
    }

    pub(crate) fn restore(&mut self, stack: &mut OperandStack, marks: Marks) {
        stack.truncate(marks.stack);
        self.loops.truncate(marks.loops);
        self.pending.truncate(marks.pending);
    }

    pub(crate) fn trace_frame(&self) -> TraceFrame {
        TraceFrame {
            this: self.id.this,
            verb: self.id.verb.clone(),
            definer: self.id.definer,
            ip: self.op_start,
        }
    }
}
