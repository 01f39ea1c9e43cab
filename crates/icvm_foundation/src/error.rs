//! Error types for icvm.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//!
//! Two families exist. [`BuildError`] covers everything that can go wrong
//! while turning IR text into a program; construction aborts on the first one.
//! [`Fault`] is the terminal runtime state of the execution engine. Hosts that
//! want a single type use [`Error`], which wraps both.

use std::fmt;

use thiserror::Error;

use crate::value::ValueType;

/// An error raised while lexing or building a program.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuildError {
    /// Malformed token.
    #[error("lex error at {line}:{column} (offset {offset}): {message}")]
    Lex {
        /// Description of the problem.
        message: String,
        /// Byte offset of the offending input.
        offset: usize,
        /// 1-based line number.
        line: u32,
        /// 1-based column number.
        column: u32,
    },

    /// A statement does not match the grammar.
    #[error("syntax error on line {line}: {message}")]
    Syntax {
        /// Description of the problem.
        message: String,
        /// 1-based line number.
        line: u32,
    },

    /// A label was defined more than once.
    #[error("duplicate label `{name}` on line {line} (first defined on line {first_line})")]
    DuplicateLabel {
        /// The label name.
        name: String,
        /// Line of the second definition.
        line: u32,
        /// Line of the first definition.
        first_line: u32,
    },

    /// A jump or call target names no label or declared global.
    #[error("unresolved reference `{name}` on line {line}")]
    UnresolvedReference {
        /// The target as written (including `@` for globals).
        name: String,
        /// Line of the reference.
        line: u32,
    },
}

impl BuildError {
    /// Creates a syntax error.
    #[must_use]
    pub fn syntax(message: impl Into<String>, line: u32) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
        }
    }

    /// Returns the 1-based source line this error refers to.
    #[must_use]
    pub const fn line(&self) -> u32 {
        match self {
            Self::Lex { line, .. }
            | Self::Syntax { line, .. }
            | Self::DuplicateLabel { line, .. }
            | Self::UnresolvedReference { line, .. } => *line,
        }
    }
}

/// The kind of a runtime fault.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FaultKind {
    /// Division or modulo by zero, or integer overflow.
    #[error("arithmetic fault: {0}")]
    Arithmetic(String),

    /// An operand had the wrong tag for the operation.
    #[error("type fault in {context}: expected {expected}, got {actual}")]
    Type {
        /// What was expected (e.g. `integer`).
        expected: String,
        /// The tag actually found.
        actual: ValueType,
        /// The operation that rejected the value.
        context: String,
    },

    /// Number of pending arguments differs from the callee's parameters.
    #[error("arity fault calling `{callee}`: expected {expected} arguments, got {actual}")]
    Arity {
        /// Callee name.
        callee: String,
        /// Declared parameter count.
        expected: usize,
        /// Number of `arg` pushes.
        actual: usize,
    },

    /// The callee is not present in the global table (or is not callable).
    #[error("unknown callee `{0}`")]
    UnknownCallee(String),

    /// A local variable was read before it was assigned.
    #[error("unbound variable `{0}`")]
    UnboundVariable(String),

    /// A `@name` operand names no global.
    #[error("unknown global `@{0}`")]
    UnknownGlobal(String),

    /// Host-imposed instruction budget exhausted.
    #[error("step limit ({limit}) exceeded")]
    StepLimitExceeded {
        /// The configured limit.
        limit: u64,
    },

    /// Call stack grew beyond the configured depth.
    #[error("call depth ({limit}) exceeded")]
    CallDepthExceeded {
        /// The configured limit.
        limit: usize,
    },
}

impl FaultKind {
    /// Creates a type fault.
    #[must_use]
    pub fn type_mismatch(
        expected: impl Into<String>,
        actual: ValueType,
        context: impl Into<String>,
    ) -> Self {
        Self::Type {
            expected: expected.into(),
            actual,
            context: context.into(),
        }
    }

    /// Creates an arithmetic fault.
    #[must_use]
    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::Arithmetic(message.into())
    }

    /// Attaches the program counter at which the fault occurred.
    #[must_use]
    pub const fn at(self, pc: usize) -> Fault {
        Fault { kind: self, pc }
    }
}

/// A terminal runtime fault: what went wrong and where.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{kind} at pc {pc}")]
pub struct Fault {
    /// The kind of fault.
    pub kind: FaultKind,
    /// Index of the instruction that faulted.
    pub pc: usize,
}

/// The main error type for host-facing icvm operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io(message.into()))
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        Self::new(ErrorKind::Build(err))
    }
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        Self::new(ErrorKind::Fault(fault))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Program construction failed.
    #[error(transparent)]
    Build(BuildError),

    /// Execution faulted.
    #[error(transparent)]
    Fault(Fault),

    /// Reading or writing a file failed.
    #[error("io error: {0}")]
    Io(String),

    /// Program image encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A host-supplied argument was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<u32>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source file.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line.
    #[must_use]
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "{source}")?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
            }
        }
        Ok(())
    }
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
