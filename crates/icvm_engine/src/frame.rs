//! Call stack frames.

use im::HashMap;

use icvm_foundation::Value;

/// A frame-local variable environment.
///
/// Persistent, so cloning a machine for a snapshot shares structure.
pub type Environment = HashMap<String, Value>;

/// One call-stack entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Name of the function this frame executes.
    pub function: String,
    /// Where the caller resumes. `None` for the entry frame.
    pub return_pc: Option<usize>,
    /// Local variables.
    pub env: Environment,
    /// Caller variable that receives the return value.
    pub dest: Option<String>,
}

impl Frame {
    /// Creates the entry frame.
    #[must_use]
    pub fn entry(function: impl Into<String>, env: Environment) -> Self {
        Self {
            function: function.into(),
            return_pc: None,
            env,
            dest: None,
        }
    }

    /// Creates a frame for a call that resumes the caller at `return_pc`.
    #[must_use]
    pub fn call(
        function: impl Into<String>,
        env: Environment,
        return_pc: usize,
        dest: Option<String>,
    ) -> Self {
        Self {
            function: function.into(),
            return_pc: Some(return_pc),
            env,
            dest,
        }
    }

    /// Binds parameter names to argument values positionally.
    ///
    /// Callers check that the lengths match.
    #[must_use]
    pub fn bind(params: &[String], args: Vec<Value>) -> Environment {
        params.iter().cloned().zip(args).collect()
    }

    /// Reads a local variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.env.get(name)
    }
}
