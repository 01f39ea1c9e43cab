//! The global table.
//!
//! Maps `@name` globals to program functions, host natives, or plain values.
//! It is populated before execution and read-only while machines run.

use std::collections::HashMap;

use icvm_foundation::Value;
use icvm_language::Program;
use thiserror::Error;

use crate::native::NativeFunction;

/// A program function: where it starts and what it binds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionEntry {
    /// Instruction index of the first instruction.
    pub entry: usize,
    /// Formal parameter names, bound positionally from pending arguments.
    pub params: Vec<String>,
}

/// A global table entry.
#[derive(Clone, Debug)]
pub enum Global {
    /// A function defined in the program.
    Function(FunctionEntry),
    /// A function implemented by the host.
    Native(NativeFunction),
    /// A plain value.
    Value(Value),
}

/// Errors from populating a global table.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GlobalError {
    /// The program defines no such label.
    #[error("no label `{0}` in program")]
    UnknownLabel(String),

    /// The global exists but is not a program function.
    #[error("global `@{0}` is not a program function")]
    NotAFunction(String),
}

/// Mapping from global name (without `@`) to entry.
#[derive(Clone, Debug, Default)]
pub struct GlobalTable {
    entries: HashMap<String, Global>,
}

fn normalize(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

impl GlobalTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table exposing every label of `program` as a zero-parameter
    /// function `@label`.
    #[must_use]
    pub fn from_program(program: &Program) -> Self {
        let mut table = Self::new();
        for (label, pc) in program.labels() {
            table.define_function(label, pc, Vec::<String>::new());
        }
        table
    }

    /// Defines (or replaces) a program function.
    pub fn define_function<I, S>(&mut self, name: &str, entry: usize, params: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params = params.into_iter().map(Into::into).collect();
        self.entries.insert(
            normalize(name).to_string(),
            Global::Function(FunctionEntry { entry, params }),
        );
        self
    }

    /// Defines a function at the label of the same name in `program`.
    ///
    /// # Errors
    ///
    /// Returns [`GlobalError::UnknownLabel`] if the program has no such label.
    pub fn bind_function<I, S>(
        &mut self,
        program: &Program,
        name: &str,
        params: I,
    ) -> Result<&mut Self, GlobalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = normalize(name);
        let entry = program
            .label(name)
            .ok_or_else(|| GlobalError::UnknownLabel(name.to_string()))?;
        Ok(self.define_function(name, entry, params))
    }

    /// Declares the formal parameters of an existing program function.
    ///
    /// # Errors
    ///
    /// Returns [`GlobalError::NotAFunction`] if `name` is missing or is not a
    /// program function.
    pub fn set_params<I, S>(&mut self, name: &str, params: I) -> Result<(), GlobalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = normalize(name);
        match self.entries.get_mut(name) {
            Some(Global::Function(function)) => {
                function.params = params.into_iter().map(Into::into).collect();
                Ok(())
            }
            _ => Err(GlobalError::NotAFunction(name.to_string())),
        }
    }

    /// Defines (or replaces) a host native.
    pub fn define_native(&mut self, native: NativeFunction) -> &mut Self {
        self.entries
            .insert(normalize(native.name).to_string(), Global::Native(native));
        self
    }

    /// Defines (or replaces) a global value.
    pub fn define_value(&mut self, name: &str, value: Value) -> &mut Self {
        self.entries
            .insert(normalize(name).to_string(), Global::Value(value));
        self
    }

    /// Looks up a global. A leading `@` is ignored.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Global> {
        self.entries.get(normalize(name))
    }

    /// Looks up a program function.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        match self.get(name) {
            Some(Global::Function(function)) => Some(function),
            _ => None,
        }
    }

    /// Returns true if the global is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(normalize(name))
    }

    /// Returns the number of globals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no globals are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all global names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the names of callable globals, for declaring program
    /// externals with `ProgramBuilder::with_externals`.
    #[must_use]
    pub fn external_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, global)| !matches!(global, Global::Value(_)))
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Iterates over all entries in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Global)> {
        self.entries.iter().map(|(name, global)| (name.as_str(), global))
    }
}
