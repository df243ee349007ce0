use std::cmp::Ordering;
use std::sync::Arc;

use moo_core::{Obj, Value};
use moo_ir::{Decoded, Opcode, Program, Tick, decode};
use tracing::{debug, error, instrument, trace, warn};

use super::exception;
use super::frame::{Frame, Identity, Unwind};
use super::ops::{access, call, collection, compare, data, flow, guard, iter, math, scatter};
use super::stack::OperandStack;
use crate::builtins_registry::BuiltinRegistry;
use crate::config::VmConfig;
use crate::errors::{Exception, Fault, RunError, Trap};
use crate::store::Store;
use crate::task::TaskContext;

/// Charge one tick, or fail once `limit` ticks have been spent.
#[inline(always)]
pub(crate) fn charge_tick(ticks: &mut usize, limit: usize) -> Result<(), Trap> {
    if *ticks >= limit {
        return Err(Trap::Ticks);
    }
    *ticks += 1;
    Ok(())
}

/// The bytecode interpreter.
///
/// A `Vm` runs one verb at a time, single-threaded, to completion. Several
/// `Vm`s may share one store and one builtin registry.
pub struct Vm {
    pub(super) store: Arc<dyn Store>,
    pub(super) builtins: Arc<BuiltinRegistry>,
    pub(super) config: VmConfig,
    pub(super) stack: OperandStack,
    pub(super) frames: Vec<Frame>,
    pub(super) ticks: usize,
    pub(super) task: TaskContext,
}

impl Vm {
    pub fn new(store: Arc<dyn Store>, builtins: Arc<BuiltinRegistry>, config: VmConfig) -> Self {
        Self {
            store,
            builtins,
            config,
            stack: OperandStack::new(),
            frames: Vec::new(),
            ticks: 0,
            task: TaskContext::default(),
        }
    }

    pub fn config(&self) -> VmConfig {
        self.config
    }

    /// Ticks spent by the current or most recent run.
    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn ticks_left(&self) -> usize {
        self.config.tick_limit.saturating_sub(self.ticks)
    }

    /// Run a program outside any verb call.
    #[instrument(skip_all, fields(task = task.task_id))]
    pub fn run(&mut self, program: Arc<Program>, task: &TaskContext) -> Result<Value, RunError> {
        self.reset(task);
        let id = Identity::unestablished(task.player);
        self.push_frame(program, id, Value::empty_list());
        self.execute()
    }

    /// Invoke `this:name(@args)` as the entry point of a task.
    #[instrument(skip(self, args, task), fields(task = task.task_id, this = %this))]
    pub fn call_verb(&mut self, this: Obj, name: &str, args: Vec<Value>, task: &TaskContext) -> Result<Value, RunError> {
        self.reset(task);
        if !self.store.valid(this) {
            return Err(RunError::Raised(Exception::new(moo_core::ErrorCode::InvalidIndirection)));
        }
        let verb = self
            .store
            .find_verb(this, name)
            .map_err(|e| RunError::Raised(e.into()))?;
        let id = Identity {
            this,
            player: task.player,
            caller: task.player,
            verb: Arc::from(name),
            definer: verb.definer,
        };
        self.push_frame(verb.program, id, Value::from(args));
        self.execute()
    }

    fn reset(&mut self, task: &TaskContext) {
        self.stack.clear();
        self.frames.clear();
        self.ticks = 0;
        self.task = task.clone();
    }

    pub(super) fn frame(&self) -> Result<&Frame, Fault> {
        self.frames.last().ok_or(Fault::NoFrame)
    }

    pub(super) fn frame_mut(&mut self) -> Result<&mut Frame, Fault> {
        self.frames.last_mut().ok_or(Fault::NoFrame)
    }

    /// Enter a new frame whose stack starts at the current height.
    pub(super) fn push_frame(&mut self, program: Arc<Program>, id: Identity, args: Value) {
        let base = self.stack.len();
        trace!(verb = %id.verb, this = %id.this, depth = self.frames.len() + 1, "frame push");
        self.frames.push(Frame::new(program, base, id, args));
    }

    /// Leave the current frame, dropping its part of the stack. Yields the
    /// result once the entry frame returns.
    fn return_value(&mut self, v: Value) -> Result<Option<Value>, Trap> {
        let frame = self.frames.pop().ok_or(Fault::NoFrame)?;
        self.stack.truncate(frame.base);
        trace!(verb = %frame.id.verb, depth = self.frames.len(), "frame pop");
        if self.frames.is_empty() {
            return Ok(Some(v));
        }
        self.stack.push(v);
        Ok(None)
    }

    /// `return` from the current frame, running any finally block it leaves
    /// first.
    fn leave_frame(&mut self, v: Value) -> Result<Option<Value>, Trap> {
        let frame = self.frames.last_mut().ok_or(Fault::NoFrame)?;
        match exception::leave_guards(frame, &mut self.stack, 0, Unwind::Return(v)) {
            Some(Unwind::Return(v)) => self.return_value(v),
            _ => Ok(None),
        }
    }

    /// Route an error through the guards of each frame, innermost frame
    /// first, popping frames that cannot take it.
    fn unwind(&mut self, mut exc: Exception) -> Result<(), RunError> {
        while let Some(frame) = self.frames.last_mut() {
            match exception::catch(frame, &mut self.stack, exc) {
                Ok(()) => return Ok(()),
                Err(e) => exc = e,
            }
            exc.traceback.push(frame.trace_frame());
            let base = frame.base;
            self.frames.pop();
            self.stack.truncate(base);
            trace!(code = exc.code.name(), depth = self.frames.len(), "frame unwound");
        }
        Err(RunError::Raised(exc))
    }

    fn execute(&mut self) -> Result<Value, RunError> {
        let result = loop {
            match self.step() {
                Ok(None) => {}
                Ok(Some(v)) => break Ok(v),
                Err(Trap::Raise(exc)) => {
                    if let Err(e) = self.unwind(exc) {
                        break Err(e);
                    }
                }
                Err(Trap::Ticks) => {
                    warn!(limit = self.config.tick_limit, "tick limit exhausted");
                    break Err(RunError::TicksExhausted {
                        limit: self.config.tick_limit,
                    });
                }
                Err(Trap::Fault(fault)) => {
                    let ip = self.frames.last().map_or(0, |f| f.op_start);
                    error!(%fault, ip, "internal fault");
                    break Err(RunError::Fault { ip, fault });
                }
            }
        };
        debug!(ticks = self.ticks, ok = result.is_ok(), "run finished");
        self.stack.clear();
        self.frames.clear();
        result
    }

    fn step(&mut self) -> Result<Option<Value>, Trap> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(Fault::NoFrame.into());
        };
        if frame.at_end() {
            return self.return_value(Value::ZERO);
        }
        frame.op_start = frame.ip;
        let op = match decode(frame.read_u8()?) {
            Decoded::Op(op) => op,
            Decoded::Imm(i) => {
                self.stack.push(Value::Int(i));
                return Ok(None);
            }
            Decoded::Invalid(byte) => return Err(Fault::UnknownOpcode(byte).into()),
        };
        if op.tick() == Tick::Always {
            charge_tick(&mut self.ticks, self.config.tick_limit)?;
        }
        let stack = &mut self.stack;
        match op {
            Opcode::Pop => {
                stack.pop()?;
            }
            Opcode::PushLiteral => {
                let v = frame.read_literal()?;
                stack.push(v);
            }
            Opcode::Push => {
                let slot = frame.read_var()?;
                stack.push(frame.locals[slot].clone());
            }
            Opcode::Put => {
                let slot = frame.read_var()?;
                frame.locals[slot] = stack.peek(0)?.clone();
            }
            Opcode::Length => data::op_length(frame, stack)?,
            Opcode::Context => data::op_context(frame, stack)?,
            // Arithmetic operations
            Opcode::Add => math::op_add(stack)?,
            Opcode::Sub => math::op_sub(stack)?,
            Opcode::Mul => math::op_mul(stack)?,
            Opcode::Div => math::op_div(stack)?,
            Opcode::Mod => math::op_mod(stack)?,
            Opcode::Exp => math::op_exp(stack)?,
            Opcode::UnaryMinus => math::op_neg(stack)?,
            Opcode::Not => math::op_not(stack)?,
            // Comparison operations
            Opcode::Eq => compare::op_eq(stack)?,
            Opcode::Ne => compare::op_ne(stack)?,
            Opcode::Lt => compare::op_order(stack, Ordering::is_lt)?,
            Opcode::Le => compare::op_order(stack, Ordering::is_le)?,
            Opcode::Gt => compare::op_order(stack, Ordering::is_gt)?,
            Opcode::Ge => compare::op_order(stack, Ordering::is_ge)?,
            Opcode::In => compare::op_in(stack)?,
            // Collections
            Opcode::MakeEmptyList => stack.push(Value::empty_list()),
            Opcode::MakeSingletonList => collection::op_make_singleton_list(stack)?,
            Opcode::ListAddTail => collection::op_list_add_tail(stack)?,
            Opcode::ListAppend => collection::op_list_append(stack)?,
            Opcode::CheckListForSplice => collection::op_check_list_for_splice(stack)?,
            Opcode::MakeMap => stack.push(Value::empty_map()),
            Opcode::MapInsert => collection::op_map_insert(stack)?,
            // Indexing and properties
            Opcode::Ref => access::op_ref(stack)?,
            Opcode::PushRef => access::op_push_ref(stack)?,
            Opcode::RangeRef => access::op_range_ref(stack)?,
            Opcode::IndexSet => access::op_index_set(stack)?,
            Opcode::RangeSet => access::op_range_set(stack)?,
            Opcode::GetProp => access::op_get_prop(self.store.as_ref(), stack)?,
            Opcode::PushGetProp => access::op_push_get_prop(self.store.as_ref(), stack)?,
            Opcode::PutProp => access::op_put_prop(self.store.as_ref(), stack)?,
            // Control flow
            Opcode::Jump => flow::op_jump(frame, &mut self.ticks, self.config.tick_limit)?,
            Opcode::If => flow::op_if(frame, stack)?,
            Opcode::While => flow::op_while(frame, stack)?,
            Opcode::And => flow::op_short_circuit(frame, stack, false)?,
            Opcode::Or => flow::op_short_circuit(frame, stack, true)?,
            Opcode::ExitLoop => flow::op_exit_loop(frame, stack)?,
            // Iteration
            Opcode::BeginWhile => iter::op_begin_while(frame, stack),
            Opcode::BeginForList => iter::op_begin_for_list(frame, stack)?,
            Opcode::IterateForList => iter::op_iterate_for_list(frame)?,
            Opcode::BeginForRange => iter::op_begin_for_range(frame, stack)?,
            Opcode::IterateForRange => iter::op_iterate_for_range(frame)?,
            Opcode::Scatter => scatter::op_scatter(frame, stack)?,
            // Calls
            Opcode::CallVerb => call::op_call_verb(self)?,
            Opcode::Pass => call::op_pass(self)?,
            Opcode::CallBuiltin => call::op_call_builtin(self)?,
            Opcode::Return => {
                let v = stack.pop()?;
                return self.leave_frame(v);
            }
            Opcode::Return0 => return self.leave_frame(Value::ZERO),
            // Guards
            Opcode::TryExcept => guard::op_try_except(frame, stack)?,
            Opcode::TryCatch => guard::op_try_catch(frame, stack)?,
            Opcode::EndExcept => guard::op_end_except(frame)?,
            Opcode::TryFinally => guard::op_try_finally(frame, stack)?,
            Opcode::EndFinally => match guard::op_end_finally(frame)? {
                None => {}
                Some(Unwind::Raise(exc)) => return Err(Trap::Raise(exc)),
                Some(Unwind::Return(v)) => return self.leave_frame(v),
                Some(Unwind::Exit { depth, to }) => flow::exit_loops(frame, stack, depth, to)?,
            },
        }
        Ok(None)
    }
}
