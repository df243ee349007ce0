//! Assembler for verb programs.
//!
//! `ProgramBuilder` stands in for the compiler: it writes opcode bytes and
//! operands, interns literals and variable names, and resolves forward jumps
//! through labels that are patched when the program is built.

use moo_core::{ErrorCode, Value};
use thiserror::Error;

use crate::opcode::{ContextKind, NO_ADDR, NO_VAR, Opcode, ScatterKind, imm_byte};
use crate::program::Program;

/// A jump target, bound to an address with `ProgramBuilder::bind`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Label(usize);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("label {0} is never bound")]
    UnboundLabel(usize),
    #[error("label {0} is bound twice")]
    Rebound(usize),
    #[error("program is {0} bytes, addresses only reach 65535")]
    TooLarge(usize),
    #[error("too many literals")]
    TooManyLiterals,
    #[error("too many variables")]
    TooManyVars,
}

/// Error codes accepted by an except arm.
#[derive(Clone, Copy, Debug)]
pub enum Codes<'a> {
    Any,
    Only(&'a [ErrorCode]),
}

impl Codes<'_> {
    /// The literal the interpreter reads back: `0` for any code, else a list
    /// of error values.
    pub fn to_literal(self) -> Value {
        match self {
            Codes::Any => Value::ZERO,
            Codes::Only(codes) => Value::list(codes.iter().map(|&c| Value::Err(c))),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ExceptArm<'a> {
    pub codes: Codes<'a>,
    pub var: Option<&'a str>,
    pub resume: Label,
}

#[derive(Clone, Copy, Debug)]
pub struct ScatterTarget<'a> {
    pub kind: ScatterKind,
    pub var: &'a str,
    pub default: Option<Label>,
}

impl<'a> ScatterTarget<'a> {
    pub fn required(var: &'a str) -> Self {
        Self { kind: ScatterKind::Required, var, default: None }
    }

    pub fn optional(var: &'a str, default: Option<Label>) -> Self {
        Self { kind: ScatterKind::Optional, var, default }
    }

    pub fn rest(var: &'a str) -> Self {
        Self { kind: ScatterKind::Rest, var, default: None }
    }
}

#[derive(Default)]
pub struct ProgramBuilder {
    code: Vec<u8>,
    literals: Vec<Value>,
    var_names: Vec<String>,
    labels: Vec<Option<usize>>,
    fixups: Vec<(usize, Label)>,
    error: Option<BuildError>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, err: BuildError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Slot of a named local, declaring it on first use.
    pub fn var(&mut self, name: &str) -> u16 {
        let slot = match self.var_names.iter().position(|n| n.eq_ignore_ascii_case(name)) {
            Some(slot) => slot,
            None => {
                self.var_names.push(name.to_string());
                self.var_names.len() - 1
            }
        };
        match u16::try_from(slot) {
            Ok(slot) if slot != NO_VAR => slot,
            _ => {
                self.fail(BuildError::TooManyVars);
                0
            }
        }
    }

    /// Index of a literal in the pool, reusing an identical entry.
    pub fn literal(&mut self, value: Value) -> u16 {
        let idx = match self.literals.iter().position(|l| *l == value) {
            Some(idx) => idx,
            None => {
                self.literals.push(value);
                self.literals.len() - 1
            }
        };
        u16::try_from(idx).unwrap_or_else(|_| {
            self.fail(BuildError::TooManyLiterals);
            0
        })
    }

    pub fn label(&mut self) -> Label {
        self.labels.push(None);
        Label(self.labels.len() - 1)
    }

    /// Bind `label` to the current address.
    pub fn bind(&mut self, label: Label) -> &mut Self {
        let here = self.here();
        if self.labels[label.0].is_some() {
            self.fail(BuildError::Rebound(label.0));
        } else {
            self.labels[label.0] = Some(here);
        }
        self
    }

    /// Address of the next byte to be written.
    pub fn here(&self) -> usize {
        self.code.len()
    }

    pub fn emit(&mut self, op: Opcode) -> &mut Self {
        self.code.push(op as u8);
        self
    }

    pub fn emit_u8(&mut self, byte: u8) -> &mut Self {
        self.code.push(byte);
        self
    }

    pub fn emit_u16(&mut self, value: u16) -> &mut Self {
        self.code.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Placeholder address, patched with `label`'s address by `build`.
    pub fn emit_addr(&mut self, label: Label) -> &mut Self {
        self.fixups.push((self.code.len(), label));
        self.emit_u16(NO_ADDR)
    }

    pub fn push_int(&mut self, value: i64) -> &mut Self {
        match imm_byte(value) {
            Some(byte) => self.emit_u8(byte),
            None => self.push_literal(Value::Int(value)),
        }
    }

    pub fn push_literal(&mut self, value: Value) -> &mut Self {
        let idx = self.literal(value);
        self.emit(Opcode::PushLiteral).emit_u16(idx)
    }

    pub fn push_str(&mut self, s: &str) -> &mut Self {
        self.push_literal(Value::str(s))
    }

    pub fn push_var(&mut self, name: &str) -> &mut Self {
        let slot = self.var(name);
        self.emit(Opcode::Push).emit_u16(slot)
    }

    /// `Put` without the trailing `Pop`: the value stays on the stack.
    pub fn put_var(&mut self, name: &str) -> &mut Self {
        let slot = self.var(name);
        self.emit(Opcode::Put).emit_u16(slot)
    }

    /// Store the top of the stack into `name` and discard it.
    pub fn assign(&mut self, name: &str) -> &mut Self {
        self.put_var(name).emit(Opcode::Pop)
    }

    pub fn context(&mut self, kind: ContextKind) -> &mut Self {
        self.emit(Opcode::Context).emit_u8(kind as u8)
    }

    pub fn length(&mut self, slot: u16) -> &mut Self {
        self.emit(Opcode::Length).emit_u16(slot)
    }

    /// Any opcode that takes a single address operand.
    pub fn jump(&mut self, op: Opcode, target: Label) -> &mut Self {
        self.emit(op).emit_addr(target)
    }

    pub fn exit_loop(&mut self, loops: u8, target: Label) -> &mut Self {
        self.emit(Opcode::ExitLoop).emit_u8(loops).emit_addr(target)
    }

    pub fn begin_for_list(&mut self, value: &str, key: Option<&str>) -> &mut Self {
        let value = self.var(value);
        let key = key.map_or(NO_VAR, |k| self.var(k));
        self.emit(Opcode::BeginForList).emit_u16(value).emit_u16(key)
    }

    pub fn begin_for_range(&mut self, var: &str) -> &mut Self {
        let var = self.var(var);
        self.emit(Opcode::BeginForRange).emit_u16(var)
    }

    pub fn scatter(&mut self, targets: &[ScatterTarget<'_>], done: Label) -> &mut Self {
        self.emit(Opcode::Scatter).emit_u8(targets.len() as u8);
        for target in targets {
            let var = self.var(target.var);
            self.emit_u8(target.kind as u8).emit_u16(var);
            match target.default {
                Some(label) => self.emit_addr(label),
                None => self.emit_u16(NO_ADDR),
            };
        }
        self.emit_addr(done)
    }

    pub fn call_builtin(&mut self, name: &str) -> &mut Self {
        let idx = self.literal(Value::str(name));
        self.emit(Opcode::CallBuiltin).emit_u16(idx)
    }

    pub fn try_except(&mut self, arms: &[ExceptArm<'_>]) -> &mut Self {
        self.emit(Opcode::TryExcept).emit_u8(arms.len() as u8);
        for arm in arms {
            let codes = self.literal(arm.codes.to_literal());
            let var = arm.var.map_or(NO_VAR, |v| self.var(v));
            self.emit_u16(codes).emit_u16(var).emit_addr(arm.resume);
        }
        self
    }

    pub fn try_catch(&mut self, codes: Codes<'_>, resume: Label) -> &mut Self {
        let codes = self.literal(codes.to_literal());
        self.emit(Opcode::TryCatch).emit_u16(codes).emit_addr(resume)
    }

    pub fn build(mut self) -> Result<Program, BuildError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if self.code.len() > u16::MAX as usize {
            return Err(BuildError::TooLarge(self.code.len()));
        }
        for &(at, label) in &self.fixups {
            let addr = self.labels[label.0].ok_or(BuildError::UnboundLabel(label.0))?;
            self.code[at..at + 2].copy_from_slice(&(addr as u16).to_le_bytes());
        }
        let num_locals = self.var_names.len();
        Ok(Program::new(self.code, self.literals, num_locals).with_var_names(self.var_names))
    }
}
