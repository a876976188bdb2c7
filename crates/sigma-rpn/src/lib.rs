//! Sigma RPN intermediate representation.
//!
//! The IR is a flat, linear instruction sequence over an implicit operand
//! stack, the last stop before a bytecode backend. This crate defines the
//! instruction set, the program container with its label invariants, the
//! per-method local-slot allocator, and the AST lowering pass.
//!
//! # Architecture
//!
//! - [`instruction`]: opcodes, operands, the checked instruction constructor
//! - [`program`]: `Program` and the validating `ProgramBuilder`
//! - [`slots`]: per-method JVM local-slot assignment
//! - [`lower`]: the `generate` pass from AST + semantics to a program

pub mod instruction;
pub mod lower;
pub mod program;
pub mod slots;

pub use instruction::{Instruction, Opcode, Operand};
pub use lower::generate;
pub use program::{Program, ProgramBuilder};
pub use slots::SlotAllocator;
