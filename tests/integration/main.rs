//! Integration tests across all layers
//!
//! Tests that load programs through sessions and images, run them, and drive
//! the debugger with scripted input.

mod debugger;
mod sessions;
