//! Built programs.
//!
//! A [`Program`] is an ordered instruction sequence (index = program counter)
//! plus a label table. It is immutable once built and can be shared read-only
//! between any number of engines.

use std::collections::{HashMap, HashSet};
use std::fmt;

use thiserror::Error;

use crate::instruction::{Callee, Instruction, Target};

/// A structural defect in a program that did not come from the builder.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    /// A label resolves past the end of the instruction stream.
    #[error("label `{name}` resolves to pc {pc}, past the end ({len} instructions)")]
    LabelOutOfRange {
        /// Label name.
        name: String,
        /// Recorded index.
        pc: usize,
        /// Number of instructions.
        len: usize,
    },

    /// The label list and the label index disagree about a name.
    #[error("label table is inconsistent for `{0}`")]
    LabelIndexMismatch(String),

    /// A label marker survived into the instruction stream.
    #[error("label marker `{name}:` at pc {pc}")]
    LabelMarker {
        /// Label name.
        name: String,
        /// Where the marker sits.
        pc: usize,
    },

    /// A jump or call target does not agree with the label table.
    #[error("instruction at pc {pc} targets `{name}`, which does not resolve as recorded")]
    BadTarget {
        /// Index of the offending instruction.
        pc: usize,
        /// Target name as written.
        name: String,
    },
}

/// A label-resolved instruction sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    /// Executable instructions. Never contains label markers.
    instructions: Vec<Instruction>,
    /// Labels in definition order, with the index each resolves to.
    labels: Vec<(String, usize)>,
    /// Label name to instruction index.
    label_index: HashMap<String, usize>,
}

impl Program {
    /// Assembles a program from already-resolved parts.
    ///
    /// Callers are expected to have checked label uniqueness; the builder is
    /// the normal way to obtain a `Program`.
    #[must_use]
    pub(crate) fn from_parts(instructions: Vec<Instruction>, labels: Vec<(String, usize)>) -> Self {
        let label_index = labels.iter().cloned().collect();
        Self {
            instructions,
            labels,
            label_index,
        }
    }

    /// Returns the instruction sequence.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the instruction at `pc`.
    #[must_use]
    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    /// Returns the number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Resolves a label to its instruction index.
    #[must_use]
    pub fn label(&self, name: &str) -> Option<usize> {
        self.label_index.get(name).copied()
    }

    /// Returns every label with its index, in definition order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(name, pc)| (name.as_str(), *pc))
    }

    /// Checks that the program is shaped the way the builder leaves it.
    ///
    /// Programs obtained through [`crate::build`] always pass. This is meant
    /// for programs that arrive by other routes, such as deserialized images.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProgramError`] found.
    pub fn validate(&self) -> Result<(), ProgramError> {
        let len = self.instructions.len();
        let mut seen = HashSet::new();
        for (name, pc) in &self.labels {
            if !seen.insert(name.as_str()) || self.label_index.get(name) != Some(pc) {
                return Err(ProgramError::LabelIndexMismatch(name.clone()));
            }
            if *pc > len {
                return Err(ProgramError::LabelOutOfRange {
                    name: name.clone(),
                    pc: *pc,
                    len,
                });
            }
        }
        if let Some(extra) = self
            .label_index
            .keys()
            .find(|name| !seen.contains(name.as_str()))
        {
            return Err(ProgramError::LabelIndexMismatch(extra.clone()));
        }

        for (pc, instruction) in self.instructions.iter().enumerate() {
            let unresolved = match instruction {
                Instruction::LabelMarker { name } => {
                    return Err(ProgramError::LabelMarker {
                        name: name.clone(),
                        pc,
                    });
                }
                Instruction::Goto { target } | Instruction::CondGoto { target, .. } => {
                    (!self.target_resolves(target)).then(|| target.to_string())
                }
                Instruction::Call { callee, .. } => {
                    (!self.callee_resolves(callee)).then(|| callee.to_string())
                }
                _ => None,
            };
            if let Some(name) = unresolved {
                return Err(ProgramError::BadTarget { pc, name });
            }
        }
        Ok(())
    }

    fn target_resolves(&self, target: &Target) -> bool {
        self.label(&target.name) == Some(target.pc)
    }

    /// A callee either names a label (and records its index) or is a
    /// `@name` external with no entry.
    fn callee_resolves(&self, callee: &Callee) -> bool {
        let label = self.label(&callee.name);
        callee.entry == label && (label.is_some() || callee.global)
    }

    /// Returns the labels that resolve to `pc`, in definition order.
    pub fn labels_at(&self, pc: usize) -> impl Iterator<Item = &str> {
        self.labels
            .iter()
            .filter(move |(_, at)| *at == pc)
            .map(|(name, _)| name.as_str())
    }
}

/// Re-serializes the program as IR text.
///
/// Labels sit on their own line ahead of the instruction they resolve to;
/// statements are indented. The output builds back into an equal program.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pc in 0..=self.instructions.len() {
            for label in self.labels_at(pc) {
                writeln!(f, "{label}:")?;
            }
            if let Some(instruction) = self.instructions.get(pc) {
                writeln!(f, "    {instruction}")?;
            }
        }
        Ok(())
    }
}
