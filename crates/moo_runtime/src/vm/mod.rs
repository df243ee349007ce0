//! The interpreter proper: frames, the operand stack and the dispatch loop.

mod dispatch;
mod exception;
mod frame;
pub(crate) mod ops;
mod stack;

pub use dispatch::Vm;
