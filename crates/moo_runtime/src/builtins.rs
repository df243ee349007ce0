use moo_core::{ErrorCode, Value};

use crate::builtins_registry::BuiltinCtx;
use crate::errors::Exception;

fn arity(args: &[Value], min: usize, max: usize) -> Result<(), Exception> {
    if args.len() < min || args.len() > max {
        return Err(Exception::new(ErrorCode::Args));
    }
    Ok(())
}

/// `raise(code [, message [, value]])`
pub(super) fn builtin_raise(_cx: &mut BuiltinCtx<'_>, args: &[Value]) -> Result<Value, Exception> {
    arity(args, 1, 3)?;
    let Value::Err(code) = args[0] else {
        return Err(Exception::new(ErrorCode::Type));
    };
    let mut exc = Exception::new(code);
    if let Some(message) = args.get(1) {
        let Value::Str(message) = message else {
            return Err(Exception::new(ErrorCode::Type));
        };
        exc = exc.with_message(message.as_ref());
    }
    if let Some(value) = args.get(2) {
        exc = exc.with_value(value.clone());
    }
    Err(exc)
}

pub(super) fn builtin_typeof(_cx: &mut BuiltinCtx<'_>, args: &[Value]) -> Result<Value, Exception> {
    arity(args, 1, 1)?;
    Ok(Value::Int(args[0].type_code() as i64))
}

pub(super) fn builtin_length(_cx: &mut BuiltinCtx<'_>, args: &[Value]) -> Result<Value, Exception> {
    arity(args, 1, 1)?;
    Ok(Value::Int(args[0].len()? as i64))
}

pub(super) fn builtin_tostr(_cx: &mut BuiltinCtx<'_>, args: &[Value]) -> Result<Value, Exception> {
    let mut out = String::new();
    for a in args {
        out.push_str(&a.to_str());
    }
    Ok(Value::from(out))
}

pub(super) fn builtin_toliteral(_cx: &mut BuiltinCtx<'_>, args: &[Value]) -> Result<Value, Exception> {
    arity(args, 1, 1)?;
    Ok(Value::from(args[0].to_literal()))
}

pub(super) fn builtin_valid(cx: &mut BuiltinCtx<'_>, args: &[Value]) -> Result<Value, Exception> {
    arity(args, 1, 1)?;
    let obj = args[0].as_obj().ok_or(ErrorCode::Type)?;
    Ok(Value::Int(cx.store.valid(obj) as i64))
}

pub(super) fn builtin_ticks_left(cx: &mut BuiltinCtx<'_>, args: &[Value]) -> Result<Value, Exception> {
    arity(args, 0, 0)?;
    Ok(Value::Int(cx.ticks_left as i64))
}
