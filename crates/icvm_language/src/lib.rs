//! Lexer, instruction set, and program builder for icvm intermediate code.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization of IR text
//! - [`Instruction`] - The three-address instruction set
//! - [`ProgramBuilder`] - Two-pass construction of a label-resolved [`Program`]

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod builder;
pub mod instruction;
pub mod lexer;
pub mod program;
pub mod span;
pub mod token;


pub use builder::{ProgramBuilder, build};
pub use instruction::{BinOp, Callee, Instruction, Operand, Polarity, Target};
pub use lexer::Lexer;
pub use program::{Program, ProgramError};
pub use span::Span;
pub use token::{Keyword, Operator, Token, TokenKind};
