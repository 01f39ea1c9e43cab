//! icvm - Three-address intermediate code toolchain
//!
//! This crate re-exports all layers of the icvm system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: icvm_runtime    - Sessions, program images, debugger, CLI
//! Layer 2: icvm_engine     - Global table, frames, execution engine
//! Layer 1: icvm_language   - Lexer, instruction set, program builder
//! Layer 0: icvm_foundation - Core types (Value, BuildError, Fault, Error)
//! ```

pub use icvm_engine as engine;
pub use icvm_foundation as foundation;
pub use icvm_language as language;
pub use icvm_runtime as runtime;
