//! MOO verb interpreter.

#![allow(clippy::new_without_default)]

pub mod errors;
pub mod vm;

mod builtins;
pub mod builtins_registry;
mod config;
mod store;
mod task;

pub use builtins_registry::{BuiltinCtx, BuiltinFn, BuiltinProvider, BuiltinRegistry, StdBuiltinProvider};
pub use config::VmConfig;
pub use errors::{Exception, Fault, RunError, TraceFrame};
pub use store::{MemoryStore, ResolvedVerb, Store, StoreError, verb_name_matches};
pub use task::TaskContext;
pub use vm::Vm;

pub use moo_core::{ErrorCode, Obj, Value};
pub use moo_ir::{Opcode, Program, ProgramBuilder};
