//! Bytecode format for compiled verb programs.
//!
//! Instructions are raw bytes: one opcode byte followed by its fixed
//! operands. A reserved range of opcode bytes encodes small integer
//! literals directly.
mod builder;
mod opcode;
mod program;

pub use builder::*;
pub use opcode::*;
pub use program::*;
