//! Error types for the interpreter.
//!
//! There are two failure channels. An `Exception` is a scripting-level error
//! carrying an `ErrorCode`; verb code can catch it. A `Fault` is a broken
//! invariant of the bytecode or of the interpreter itself; it ends the run
//! and no handler ever sees it.

use std::error::Error as StdError;
use std::sync::Arc;

use moo_core::{ErrorCode, Obj, Value};
use moo_ir::Opcode;
use thiserror::Error;

use crate::store::StoreError;

/// One frame of an exception's traceback, innermost first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceFrame {
    pub this: Obj,
    pub verb: Arc<str>,
    pub definer: Obj,
    /// Address of the instruction that was executing.
    pub ip: usize,
}

/// A scripting-level error in flight.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("{}: {message}", .code.name())]
pub struct Exception {
    pub code: ErrorCode,
    pub message: String,
    pub value: Value,
    pub traceback: Vec<TraceFrame>,
}

impl Exception {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.to_string(),
            value: Value::ZERO,
            traceback: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    /// What an except arm binds: the error as a value.
    pub fn to_value(&self) -> Value {
        Value::Err(self.code)
    }

    /// Tag an arbitrary failure with an error code.
    ///
    /// Known error types (and known types anywhere in the `source()` chain)
    /// keep their code; anything else becomes `E_NONE` with the failure's
    /// text as the message.
    pub fn classify(err: &(dyn StdError + 'static)) -> Exception {
        let mut cur: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(e) = cur {
            if let Some(exc) = e.downcast_ref::<Exception>() {
                return exc.clone();
            }
            if let Some(code) = e.downcast_ref::<ErrorCode>() {
                return Exception::new(*code);
            }
            if let Some(store) = e.downcast_ref::<StoreError>() {
                if !matches!(store, StoreError::Backend(_)) {
                    return Exception::new(store.code());
                }
            }
            cur = e.source();
        }
        Exception::new(ErrorCode::None).with_message(err.to_string())
    }
}

impl From<ErrorCode> for Exception {
    fn from(code: ErrorCode) -> Self {
        Exception::new(code)
    }
}

impl From<StoreError> for Exception {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend(inner) => Exception::classify(inner.as_ref()),
            other => Exception::new(other.code()),
        }
    }
}

/// Broken bytecode or interpreter invariant.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Fault {
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("unknown opcode byte {0}")]
    UnknownOpcode(u8),
    #[error("instruction truncated at {0}")]
    Truncated(usize),
    #[error("address {0} is outside the program")]
    BadAddress(usize),
    #[error("literal index {0} is out of range")]
    BadLiteral(usize),
    #[error("local index {0} is out of range")]
    BadLocal(usize),
    #[error("stack slot {0} is out of range")]
    BadSlot(usize),
    #[error("malformed {0} operand")]
    BadOperand(&'static str),
    #[error("no matching guard for {0}")]
    HandlerMismatch(Opcode),
    #[error("no active loop for {0}")]
    LoopMismatch(Opcode),
    #[error("no active frame")]
    NoFrame,
}

/// How a run ended, when it did not produce a value.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RunError {
    #[error("uncaught {0}")]
    Raised(Exception),
    #[error("tick limit of {limit} exhausted")]
    TicksExhausted { limit: usize },
    #[error("internal fault at {ip}: {fault}")]
    Fault { ip: usize, fault: Fault },
}

impl RunError {
    /// Error code of an uncaught exception.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            RunError::Raised(exc) => Some(exc.code),
            _ => None,
        }
    }
}

/// Failure of a single instruction, before it is routed.
///
/// Only `Raise` enters the handler search.
#[derive(Debug)]
pub(crate) enum Trap {
    Raise(Exception),
    Ticks,
    Fault(Fault),
}

impl From<Exception> for Trap {
    fn from(exc: Exception) -> Self {
        Trap::Raise(exc)
    }
}

impl From<ErrorCode> for Trap {
    fn from(code: ErrorCode) -> Self {
        Trap::Raise(Exception::new(code))
    }
}

impl From<StoreError> for Trap {
    fn from(err: StoreError) -> Self {
        Trap::Raise(err.into())
    }
}

impl From<Fault> for Trap {
    fn from(fault: Fault) -> Self {
        Trap::Fault(fault)
    }
}
