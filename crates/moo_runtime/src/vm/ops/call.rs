//! Verb and builtin calls.

use std::sync::Arc;

use moo_core::{ErrorCode, Obj, Value};

use crate::builtins_registry::BuiltinCtx;
use crate::errors::{Fault, Trap};
use crate::store::ResolvedVerb;
use crate::vm::Vm;
use crate::vm::frame::Identity;

fn check_depth(vm: &Vm) -> Result<(), Trap> {
    if vm.frames.len() >= vm.config.max_depth {
        return Err(ErrorCode::MaxRecursion.into());
    }
    Ok(())
}

fn enter(vm: &mut Vm, this: Obj, verb_name: Arc<str>, verb: ResolvedVerb, args: Value) -> Result<(), Trap> {
    let caller = vm.frame()?.id.this;
    let id = Identity {
        this,
        player: vm.task.player,
        caller,
        verb: verb_name,
        definer: verb.definer,
    };
    vm.push_frame(verb.program, id, args);
    Ok(())
}

/// Execute Opcode::CallVerb - `obj:name(@args)`
pub(crate) fn op_call_verb(vm: &mut Vm) -> Result<(), Trap> {
    let args = vm.stack.pop()?;
    let (target, name) = vm.stack.pop2()?;
    let (Value::Obj(this), Value::Str(name), Value::List(_)) = (&target, &name, &args) else {
        return Err(ErrorCode::Type.into());
    };
    check_depth(vm)?;
    if !vm.store.valid(*this) {
        return Err(ErrorCode::InvalidIndirection.into());
    }
    let verb = vm.store.find_verb(*this, name)?;
    enter(vm, *this, name.clone(), verb, args)
}

/// Execute Opcode::Pass - run the same verb as defined on the definer's parent
pub(crate) fn op_pass(vm: &mut Vm) -> Result<(), Trap> {
    let args = vm.stack.pop()?;
    if !matches!(args, Value::List(_)) {
        return Err(ErrorCode::Type.into());
    }
    let frame = vm.frame()?;
    let (this, definer, verb_name) = (frame.id.this, frame.id.definer, frame.id.verb.clone());
    let parent = if vm.store.valid(definer) { vm.store.parent(definer)? } else { Obj::NOTHING };
    if parent.is_nothing() {
        return Err(ErrorCode::VerbNotFound.into());
    }
    check_depth(vm)?;
    let verb = vm.store.find_verb(parent, &verb_name)?;
    enter(vm, this, verb_name, verb, args)
}

/// Execute Opcode::CallBuiltin - `name(@args)`
pub(crate) fn op_call_builtin(vm: &mut Vm) -> Result<(), Trap> {
    let Value::Str(name) = vm.frame_mut()?.read_literal()? else {
        return Err(Fault::BadOperand("builtin name").into());
    };
    let Value::List(args) = vm.stack.pop()? else {
        return Err(ErrorCode::Type.into());
    };
    let fun = vm.builtins.get(&name).ok_or(ErrorCode::InvalidArg)?;
    let ticks_left = vm.ticks_left();
    let frame = vm.frame()?;
    let mut cx = BuiltinCtx {
        task: &vm.task,
        store: vm.store.as_ref(),
        this: frame.id.this,
        player: frame.id.player,
        caller: frame.id.caller,
        verb: &frame.id.verb,
        ticks_left,
    };
    let result = fun(&mut cx, &args)?;
    vm.stack.push(result);
    Ok(())
}
