//! Opcode definitions.
//!
//! `Opcode` is a pure discriminant; operands follow in the byte stream and
//! are fetched separately by the interpreter.
//!
//! # Operand Encoding
//!
//! - `lit`, `var`, `addr`: u16, little-endian. Addresses are absolute byte
//!   offsets into the program's code.
//! - `n`, `kind`: u8.
//! - Bytes `IMM_NUM_START..=255` are not opcodes at all: each one pushes the
//!   integer `byte - IMM_NUM_START + IMM_NUM_LOW`.

use strum::{EnumIter, FromRepr, IntoStaticStr};

/// First opcode byte that encodes an immediate integer.
pub const IMM_NUM_START: u8 = 112;
/// Integer pushed by the byte `IMM_NUM_START`.
pub const IMM_NUM_LOW: i64 = -10;
/// Integer pushed by the byte `255`.
pub const IMM_NUM_HIGH: i64 = IMM_NUM_LOW + (u8::MAX - IMM_NUM_START) as i64;

/// Variable operand meaning "no variable".
pub const NO_VAR: u16 = 0xFFFF;
/// Address operand meaning "no address".
pub const NO_ADDR: u16 = 0xFFFF;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr, EnumIter)]
pub enum Opcode {
    // === Stack and variables ===
    /// Discard top of stack.
    Pop,
    /// Push a literal. Operand: lit.
    PushLiteral,
    /// Push a local variable. Operand: var.
    Push,
    /// Store top of stack into a local, leaving it on the stack. Operand: var.
    Put,
    /// Push the length of the value at a frame-relative stack slot. Operand: u16 slot.
    Length,
    /// Push one of the frame's identity values. Operand: kind (`ContextKind`).
    Context,

    // === Arithmetic: [a, b] -> [a op b] ===
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    /// [a] -> [-a]
    UnaryMinus,
    /// [a] -> [!a]
    Not,

    // === Comparison: [a, b] -> [int] ===
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// [elem, seq] -> [position]
    In,

    // === Collections ===
    /// -> [{}]
    MakeEmptyList,
    /// [v] -> [{v}]
    MakeSingletonList,
    /// [list, v] -> [{@list, v}]
    ListAddTail,
    /// [list, other] -> [{@list, @other}]
    ListAppend,
    /// [v] -> [v]; raises E_TYPE unless v is a list.
    CheckListForSplice,
    /// -> [[]]
    MakeMap,
    /// [map, key, value] -> [map']
    MapInsert,

    // === Indexing ===
    /// [base, idx] -> [base[idx]]
    Ref,
    /// [base, idx] -> [base, idx, base[idx]]
    PushRef,
    /// [base, from, to] -> [base[from..to]]
    RangeRef,
    /// [base, idx, value] -> [base']
    IndexSet,
    /// [base, from, to, value] -> [base']
    RangeSet,

    // === Properties ===
    /// [obj, name] -> [obj.(name)]
    GetProp,
    /// [obj, name] -> [obj, name, obj.(name)]
    PushGetProp,
    /// [obj, name, value] -> [value]
    PutProp,

    // === Control flow ===
    /// Operand: addr.
    Jump,
    /// Pop a condition; jump when false. Operand: addr.
    If,
    /// Loop head of a `while`: pop a condition; when false, close the loop
    /// opened by `BeginWhile` and jump. Operand: addr.
    While,
    /// Jump keeping the top when it is false, else pop it. Operand: addr.
    And,
    /// Jump keeping the top when it is true, else pop it. Operand: addr.
    Or,
    /// Leave `n` loops and jump. Operands: n, addr.
    ExitLoop,

    // === Iteration ===
    /// Open a `while` loop so `ExitLoop` can leave it.
    BeginWhile,
    /// [seq] -> []; opens a list/map loop. Operands: value var, key var (or `NO_VAR`).
    BeginForList,
    /// Bind the next element or close the loop and jump. Operand: end addr.
    IterateForList,
    /// [from, to] -> []; opens a range loop. Operand: var.
    BeginForRange,
    /// Bind the next integer or close the loop and jump. Operand: end addr.
    IterateForRange,

    // === Destructuring ===
    /// [list] -> [list]. Operands: n, n × (kind, var, default addr), done addr.
    Scatter,

    // === Calls ===
    /// [obj, name, args] -> [result]
    CallVerb,
    /// [args] -> [result]
    Pass,
    /// [args] -> [result]. Operand: lit (builtin name).
    CallBuiltin,
    /// [v] -> return v
    Return,
    /// Return 0.
    Return0,

    // === Guards ===
    /// Push an except guard. Operands: n, n × (codes lit, var, resume addr).
    TryExcept,
    /// Push a catch-expression guard. Operands: codes lit, resume addr.
    TryCatch,
    /// Pop the innermost except guard and jump. Operand: addr.
    EndExcept,
    /// Push a finally guard. Operand: finally addr.
    TryFinally,
    /// Close a finally block. Operand: finally addr.
    EndFinally,
}

/// How an opcode is charged against the tick budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Never,
    Always,
    /// Charged only when the jump goes backwards.
    BackEdge,
}

impl Opcode {
    pub fn tick(self) -> Tick {
        use Opcode::*;
        match self {
            Add | Sub | Mul | Div | Mod | Exp | UnaryMinus | Not => Tick::Always,
            Eq | Ne | Lt | Le | Gt | Ge | In => Tick::Always,
            Ref | PushRef | RangeRef | IndexSet | RangeSet => Tick::Always,
            GetProp | PushGetProp | PutProp => Tick::Always,
            If | While | IterateForList | IterateForRange => Tick::Always,
            CallVerb | Pass | CallBuiltin => Tick::Always,
            Jump => Tick::BackEdge,
            Pop | PushLiteral | Push | Put | Length | Context => Tick::Never,
            MakeEmptyList | MakeSingletonList | ListAddTail | ListAppend | CheckListForSplice => Tick::Never,
            MakeMap | MapInsert => Tick::Never,
            And | Or | ExitLoop | BeginWhile | BeginForList | BeginForRange | Scatter => Tick::Never,
            Return | Return0 => Tick::Never,
            TryExcept | TryCatch | EndExcept | TryFinally | EndFinally => Tick::Never,
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of decoding one opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Op(Opcode),
    Imm(i64),
    Invalid(u8),
}

pub fn decode(byte: u8) -> Decoded {
    if byte >= IMM_NUM_START {
        return Decoded::Imm(byte as i64 - IMM_NUM_START as i64 + IMM_NUM_LOW);
    }
    match Opcode::from_repr(byte) {
        Some(op) => Decoded::Op(op),
        None => Decoded::Invalid(byte),
    }
}

/// Opcode byte for an immediate integer, if `value` fits the packed range.
pub fn imm_byte(value: i64) -> Option<u8> {
    if (IMM_NUM_LOW..=IMM_NUM_HIGH).contains(&value) {
        Some((value - IMM_NUM_LOW) as u8 + IMM_NUM_START)
    } else {
        None
    }
}

/// Operand of `Context`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum ContextKind {
    This,
    Player,
    Caller,
    Verb,
    Definer,
}

/// Target kind in a `Scatter` instruction.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr)]
pub enum ScatterKind {
    Required,
    Optional,
    Rest,
}
