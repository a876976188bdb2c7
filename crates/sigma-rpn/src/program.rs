//! The RPN program: a frozen instruction sequence with resolved labels.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Serialize;

use sigma_analysis::table::SymbolTable;

use crate::instruction::{Instruction, Opcode};

/// A complete lowered program.
///
/// Invariants, enforced by [`ProgramBuilder`]: every `LABEL` name is
/// unique, and every name referenced by a `JUMP*` instruction appears in
/// `labels`.
#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    /// Label name to instruction index.
    pub labels: FxHashMap<String, usize>,
    /// The symbol table produced by semantic analysis, carried for the
    /// backend. Not part of the serialized wire format.
    #[serde(skip)]
    pub symbols: SymbolTable,
}

impl Program {
    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The opcode sequence, convenient for structural assertions.
    pub fn opcodes(&self) -> Vec<Opcode> {
        self.instructions.iter().map(|i| i.opcode).collect()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{index:04}  {instruction}")?;
        }
        Ok(())
    }
}

/// Append-only builder that freezes into a [`Program`].
///
/// Instructions are appended during lowering; `build` validates the label
/// invariants and freezes the sequence.
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    labels: FxHashMap<String, usize>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            labels: FxHashMap::default(),
        }
    }

    /// Append an instruction.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate `LABEL` name: label uniqueness is a hard
    /// invariant of the IR and a duplicate means the generator's label
    /// counter is broken.
    pub fn push(&mut self, instruction: Instruction) {
        if instruction.opcode == Opcode::Label {
            let name = instruction
                .label_name()
                .expect("LABEL operand is always a name")
                .to_string();
            let index = self.instructions.len();
            if self.labels.insert(name.clone(), index).is_some() {
                panic!("duplicate label `{name}`. This indicates a bug in the IR generator.");
            }
        }
        self.instructions.push(instruction);
    }

    /// The opcode of the most recently appended instruction.
    pub fn last_opcode(&self) -> Option<Opcode> {
        self.instructions.last().map(|i| i.opcode)
    }

    /// Validate jump targets and freeze.
    ///
    /// # Panics
    ///
    /// Panics when a `JUMP*` instruction references a label that was never
    /// defined.
    pub fn build(self, symbols: SymbolTable) -> Program {
        for instruction in &self.instructions {
            if instruction.opcode.is_jump() {
                let target = instruction
                    .label_name()
                    .expect("jump operand is always a name");
                if !self.labels.contains_key(target) {
                    panic!(
                        "jump to undefined label `{target}`. This indicates a bug in the IR generator."
                    );
                }
            }
        }
        Program {
            instructions: self.instructions,
            labels: self.labels,
            symbols,
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Operand;
    use sigma_common::span::Span;

    fn label(name: &str) -> Instruction {
        Instruction::new(
            Opcode::Label,
            Some(Operand::Name(name.into())),
            None,
            Span::point(0),
        )
    }

    fn jump(name: &str) -> Instruction {
        Instruction::new(
            Opcode::Jump,
            Some(Operand::Name(name.into())),
            None,
            Span::point(0),
        )
    }

    #[test]
    fn labels_map_to_instruction_indices() {
        let mut builder = ProgramBuilder::new();
        builder.push(Instruction::simple(Opcode::Nop, Span::point(0)));
        builder.push(label("start"));
        builder.push(jump("start"));
        let program = builder.build(SymbolTable::new());
        assert_eq!(program.labels["start"], 1);
        assert_eq!(program.len(), 3);
    }

    #[test]
    #[should_panic(expected = "duplicate label `twice`")]
    fn duplicate_label_panics() {
        let mut builder = ProgramBuilder::new();
        builder.push(label("twice"));
        builder.push(label("twice"));
    }

    #[test]
    #[should_panic(expected = "jump to undefined label `nowhere`")]
    fn unresolved_jump_panics() {
        let mut builder = ProgramBuilder::new();
        builder.push(jump("nowhere"));
        builder.build(SymbolTable::new());
    }

    #[test]
    fn display_lists_one_instruction_per_line() {
        let mut builder = ProgramBuilder::new();
        builder.push(Instruction::new(
            Opcode::Push,
            Some(Operand::Int(10)),
            None,
            Span::point(0),
        ));
        builder.push(Instruction::simple(Opcode::Halt, Span::point(0)));
        let program = builder.build(SymbolTable::new());
        insta::assert_snapshot!(program.to_string(), @r"
        0000  PUSH 10
        0001  HALT
        ");
    }
}
