//! Core types shared by every icvm layer.
//!
//! This crate provides:
//! - [`Value`] - The tagged runtime value (integer, text, global reference)
//! - [`BuildError`] - Errors raised while lexing and building a program
//! - [`Fault`] / [`FaultKind`] - Terminal runtime faults of the execution engine
//! - [`Error`] - Host-facing error type with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod value;

pub use error::{BuildError, Error, ErrorContext, ErrorKind, Fault, FaultKind, Result};
pub use value::{Value, ValueType};
