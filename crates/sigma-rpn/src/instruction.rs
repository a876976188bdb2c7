//! The RPN instruction set.
//!
//! A fixed opcode vocabulary with per-opcode operand requirements. The
//! operand stack is implicit: it is the runtime contract for whatever
//! consumes the IR (a bytecode backend or a VM), not a structure the
//! generator materializes.

use std::fmt;

use serde::Serialize;

use sigma_analysis::ty::Ty;
use sigma_common::span::Span;

/// Every opcode in the IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Opcode {
    // ── Stack ──────────────────────────────────────────────────────────
    Push,
    Load,
    Store,
    Pop,
    Dup,

    // ── Arithmetic ─────────────────────────────────────────────────────
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Neg,

    // ── Logical ────────────────────────────────────────────────────────
    And,
    Or,
    Not,

    // ── Comparison ─────────────────────────────────────────────────────
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // ── Control ────────────────────────────────────────────────────────
    Label,
    Jump,
    JumpIfFalse,
    JumpIfTrue,

    // ── Methods ────────────────────────────────────────────────────────
    Call,
    Return,
    ReturnVoid,
    InvokeSpecial,

    // ── Objects ────────────────────────────────────────────────────────
    New,
    GetField,
    SetField,

    // ── Misc ───────────────────────────────────────────────────────────
    Nop,
    Halt,
}

impl Opcode {
    /// Whether this opcode must carry an operand.
    pub fn requires_operand(self) -> bool {
        matches!(
            self,
            Opcode::Push
                | Opcode::Load
                | Opcode::Store
                | Opcode::Label
                | Opcode::Jump
                | Opcode::JumpIfFalse
                | Opcode::JumpIfTrue
                | Opcode::Call
                | Opcode::InvokeSpecial
                | Opcode::New
                | Opcode::GetField
                | Opcode::SetField
        )
    }

    /// Whether this opcode transfers control to a label.
    pub fn is_jump(self) -> bool {
        matches!(self, Opcode::Jump | Opcode::JumpIfFalse | Opcode::JumpIfTrue)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Push => "PUSH",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
            Opcode::Pop => "POP",
            Opcode::Dup => "DUP",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Pow => "POW",
            Opcode::Neg => "NEG",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::Lt => "LT",
            Opcode::Le => "LE",
            Opcode::Gt => "GT",
            Opcode::Ge => "GE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfFalse => "JUMP_IF_FALSE",
            Opcode::JumpIfTrue => "JUMP_IF_TRUE",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::ReturnVoid => "RETURN_VOID",
            Opcode::InvokeSpecial => "INVOKESPECIAL",
            Opcode::New => "NEW",
            Opcode::GetField => "GET_FIELD",
            Opcode::SetField => "SET_FIELD",
            Opcode::Nop => "NOP",
            Opcode::Halt => "HALT",
        };
        write!(f, "{name}")
    }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Operand {
    /// Immediate integer value for `PUSH`.
    Int(i64),
    /// Immediate double value for `PUSH`.
    Double(f64),
    /// Immediate string value for `PUSH` (escapes already processed).
    Str(String),
    /// Immediate boolean value for `PUSH`.
    Bool(bool),
    /// The `null` reference for `PUSH`.
    Null,
    /// A variable, label, field, or class name.
    Name(String),
    /// A call target with its argument count.
    Call { name: String, argc: usize },
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(v) => write!(f, "{v}"),
            Operand::Double(v) => write!(f, "{v}"),
            Operand::Str(s) => write!(f, "{s:?}"),
            Operand::Bool(b) => write!(f, "{b}"),
            Operand::Null => write!(f, "null"),
            Operand::Name(name) => write!(f, "{name}"),
            Operand::Call { name, argc } => write!(f, "{name}/{argc}"),
        }
    }
}

/// One IR instruction.
///
/// `ty` is the result type where one is meaningful (pushes, loads, stores,
/// arithmetic). `slot` is the JVM local index for `LOAD`/`STORE` of method
/// locals; it stays `None` for names the backend resolves differently
/// (globals, fields).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand: Option<Operand>,
    pub ty: Option<Ty>,
    pub span: Span,
    pub slot: Option<u16>,
}

impl Instruction {
    /// Create an instruction, enforcing the operand contract.
    ///
    /// # Panics
    ///
    /// Panics when an opcode that requires an operand is built without
    /// one, or vice versa. Both indicate a bug in the IR generator, not a
    /// user error.
    pub fn new(opcode: Opcode, operand: Option<Operand>, ty: Option<Ty>, span: Span) -> Self {
        if opcode.requires_operand() && operand.is_none() {
            panic!("opcode {opcode} requires an operand. This indicates a bug in the IR generator.");
        }
        if !opcode.requires_operand() && operand.is_some() {
            panic!("opcode {opcode} takes no operand. This indicates a bug in the IR generator.");
        }
        Self {
            opcode,
            operand,
            ty,
            span,
            slot: None,
        }
    }

    /// An operand-less instruction.
    pub fn simple(opcode: Opcode, span: Span) -> Self {
        Self::new(opcode, None, None, span)
    }

    /// Attach a local slot index.
    pub fn with_slot(mut self, slot: u16) -> Self {
        self.slot = Some(slot);
        self
    }

    /// The label name this instruction defines or jumps to, if any.
    pub fn label_name(&self) -> Option<&str> {
        if self.opcode == Opcode::Label || self.opcode.is_jump() {
            match &self.operand {
                Some(Operand::Name(name)) => Some(name),
                _ => None,
            }
        } else {
            None
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Some(operand) => write!(f, "{} {operand}", self.opcode),
            None => write!(f, "{}", self.opcode),
        }
    }
}
