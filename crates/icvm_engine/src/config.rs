//! Configuration for the execution engine.

use icvm_foundation::Value;

/// Default maximum number of live frames.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Configuration for a [`Machine`](crate::Machine).
///
/// The defaults run from `@main` (or instruction 0) with no arguments, no
/// step budget, and a call depth of [`DEFAULT_MAX_CALL_DEPTH`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    /// Maximum instructions to execute before faulting. `None` is unbounded.
    pub step_limit: Option<u64>,

    /// Maximum number of live frames, including the entry frame.
    pub max_call_depth: usize,

    /// Global to start at. `None` means `@main` if defined, else pc 0.
    pub entry: Option<String>,

    /// Values bound positionally to the entry function's parameters.
    pub args: Vec<Value>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            step_limit: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            entry: None,
            args: Vec::new(),
        }
    }
}

impl MachineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the step limit.
    #[must_use]
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Builder method to set the maximum call depth.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Builder method to set the entry global. A leading `@` is ignored.
    #[must_use]
    pub fn with_entry(mut self, entry: impl AsRef<str>) -> Self {
        let entry = entry.as_ref();
        self.entry = Some(entry.strip_prefix('@').unwrap_or(entry).to_string());
        self
    }

    /// Builder method to set the entry arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = Value>) -> Self {
        self.args = args.into_iter().collect();
        self
    }
}
