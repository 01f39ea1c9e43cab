//! Integration tests for Layer 0: Foundation
//!
//! Tests for values and error types.

mod errors;
mod values;
