//! Host-side tooling for icvm: sessions, program images, and the debugger.
//!
//! This crate provides:
//! - [`Session`] - A built program with its global table and host setup
//! - [`image`] - `MessagePack` program images (`.icb`)
//! - [`Debugger`] - Interactive step debugger over rustyline
//! - [`logging`] - `tracing` subscriber setup for the `icvm` binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod debugger;
pub mod editor;
pub mod image;
pub mod logging;
pub mod session;

pub use debugger::{CommandOutput, Debugger};
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use image::ProgramImage;
pub use session::{ArgumentError, Session, SessionOptions, parse_params, parse_value};
