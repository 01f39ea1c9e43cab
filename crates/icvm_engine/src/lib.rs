//! Global table, call frames, and execution engine for icvm programs.
//!
//! This crate provides:
//! - [`GlobalTable`] - `@name` entries: program functions, natives, values
//! - [`Machine`] - Program-counter driven interpreter with an explicit call stack
//! - [`MachineConfig`] - Entry point, entry arguments, step and depth limits
//!
//! A [`Program`](icvm_language::Program) and a [`GlobalTable`] are read-only
//! once built; any number of machines may borrow them at the same time, each
//! owning its own frames and environments.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod frame;
pub mod globals;
pub mod machine;
pub mod native;

pub use config::MachineConfig;
pub use frame::{Environment, Frame};
pub use globals::{FunctionEntry, Global, GlobalError, GlobalTable};
pub use machine::{Machine, State, execute};
pub use native::{NativeFunction, PRELUDE, install_prelude};

use icvm_foundation::{Result, Value};

/// Builds `source` and runs it with labels registered as globals.
///
/// A convenience for hosts and tests that need no parameters or natives.
///
/// # Errors
///
/// Returns a build error or the runtime fault.
pub fn run_source(source: &str, config: MachineConfig) -> Result<Option<Value>> {
    let program = icvm_language::build(source)?;
    let globals = GlobalTable::from_program(&program);
    Ok(execute(&program, &globals, config)?)
}
