//! Loaded programs and host-side setup.
//!
//! A [`Session`] owns a built program and the global table it runs against.
//! It is the single place where host configuration (parameter declarations,
//! the native prelude) meets the program, for both the CLI and the debugger.

use std::fs;
use std::path::Path;

use icvm_engine::{GlobalTable, Machine, MachineConfig, PRELUDE, execute};
use icvm_foundation::{BuildError, Error, ErrorContext, Result, Value};
use icvm_language::{Program, ProgramBuilder};
use thiserror::Error;
use tracing::debug;

use crate::image::{self, ProgramImage};

/// File extension of program images.
pub const IMAGE_EXTENSION: &str = "icb";

/// Malformed host-supplied arguments.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// A parameter declaration has no `=`.
    #[error("expected NAME=P0,P1,... in parameter declaration `{0}`")]
    MissingEquals(String),

    /// A function or parameter name is empty or not an identifier.
    #[error("invalid name `{name}` in parameter declaration `{spec}`")]
    InvalidName {
        /// The offending name.
        name: String,
        /// The whole declaration.
        spec: String,
    },

    /// A value is not an integer, `'text'` or `@name`.
    #[error("cannot parse `{0}` as a value (expected integer, 'text' or @name)")]
    InvalidValue(String),

    /// A declaration names a function the program does not define.
    #[error("no label `{0}` to declare parameters for")]
    UnknownFunction(String),
}

impl From<ArgumentError> for Error {
    fn from(err: ArgumentError) -> Self {
        Self::invalid_argument(err.to_string())
    }
}

/// Host configuration applied when a session is created.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    /// Parameter declarations, as produced by [`parse_params`].
    pub params: Vec<(String, Vec<String>)>,
    /// Whether to install the native prelude.
    pub prelude: bool,
}

impl SessionOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the parameters of a function.
    #[must_use]
    pub fn with_params<I, S>(mut self, function: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params
            .push((function.into(), params.into_iter().map(Into::into).collect()));
        self
    }

    /// Enables the native prelude.
    #[must_use]
    pub const fn with_prelude(mut self) -> Self {
        self.prelude = true;
        self
    }
}

/// A built program with its global table.
#[derive(Clone, Debug)]
pub struct Session {
    name: String,
    program: Program,
    globals: GlobalTable,
    params: Vec<(String, Vec<String>)>,
}

impl Session {
    /// Builds a session from IR text. `name` is used in error messages.
    ///
    /// # Errors
    ///
    /// Returns a build error (with file and line context) or an invalid
    /// parameter declaration.
    pub fn from_source(name: &str, source: &str, options: SessionOptions) -> Result<Self> {
        let mut builder = ProgramBuilder::new();
        if options.prelude {
            builder = builder.with_externals(PRELUDE.iter().map(|native| native.name));
        }
        let program = builder
            .build(source)
            .map_err(|err| build_error(name, err))?;
        Self::assemble(name, program, options)
    }

    /// Creates a session from a program image. Parameter declarations stored
    /// in the image come first; `options.params` may override them.
    ///
    /// # Errors
    ///
    /// Returns an error if the image's program is malformed or a parameter
    /// declaration names no label.
    pub fn from_image(name: &str, image: ProgramImage, mut options: SessionOptions) -> Result<Self> {
        image::check_program(&image.program)?;
        let mut params = image.params;
        params.append(&mut options.params);
        options.params = params;
        Self::assemble(name, image.program, options)
    }

    /// Loads a `.ic` text file or a `.icb` image.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the program is invalid.
    pub fn load(path: &Path, options: SessionOptions) -> Result<Self> {
        let name = path.display().to_string();
        let is_image = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(IMAGE_EXTENSION));
        if is_image {
            return Self::from_image(&name, image::load_from_file(path)?, options);
        }
        let source = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("failed to read {name}: {e}")))?;
        Self::from_source(&name, &source, options)
    }

    fn assemble(name: &str, program: Program, options: SessionOptions) -> Result<Self> {
        let mut globals = GlobalTable::from_program(&program);
        if options.prelude {
            for native in PRELUDE {
                if !globals.contains(native.name) {
                    globals.define_native(native);
                }
            }
        }
        for (function, params) in &options.params {
            globals
                .bind_function(&program, function, params.iter().cloned())
                .map_err(|_| ArgumentError::UnknownFunction(function.clone()))?;
        }
        debug!(
            name,
            instructions = program.len(),
            globals = globals.len(),
            "loaded program"
        );
        Ok(Self {
            name: name.to_string(),
            program,
            globals,
            params: options.params,
        })
    }

    /// Returns the name used in error messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the built program.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the global table.
    #[must_use]
    pub const fn globals(&self) -> &GlobalTable {
        &self.globals
    }

    /// Returns the parameter declarations applied to the globals.
    #[must_use]
    pub fn params(&self) -> &[(String, Vec<String>)] {
        &self.params
    }

    /// Creates a machine over this session's program.
    #[must_use]
    pub fn machine(&self, config: MachineConfig) -> Machine<'_> {
        Machine::with_config(&self.program, &self.globals, config)
    }

    /// Runs the program to completion.
    ///
    /// # Errors
    ///
    /// Returns the runtime fault.
    pub fn run(&self, config: MachineConfig) -> Result<Option<Value>> {
        Ok(execute(&self.program, &self.globals, config)?)
    }

    /// Packages the program and its parameter declarations as an image.
    #[must_use]
    pub fn to_image(&self) -> ProgramImage {
        ProgramImage::new(self.program.clone()).with_params(self.params.clone())
    }
}

fn build_error(name: &str, err: BuildError) -> Error {
    let context = ErrorContext::new()
        .with_source(name)
        .with_line(err.line());
    Error::from(err).with_context(context)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parses a parameter declaration of the form `NAME=P0,P1,...`.
///
/// The function name may carry a leading `@`. `NAME=` declares no
/// parameters.
///
/// # Errors
///
/// Returns [`ArgumentError`] if the declaration is malformed.
pub fn parse_params(spec: &str) -> std::result::Result<(String, Vec<String>), ArgumentError> {
    let (function, list) = spec
        .split_once('=')
        .ok_or_else(|| ArgumentError::MissingEquals(spec.to_string()))?;
    let function = function.trim();
    let function = function.strip_prefix('@').unwrap_or(function);
    let invalid = |name: &str| ArgumentError::InvalidName {
        name: name.to_string(),
        spec: spec.to_string(),
    };
    if !is_identifier(function) {
        return Err(invalid(function));
    }

    let list = list.trim();
    if list.is_empty() {
        return Ok((function.to_string(), Vec::new()));
    }
    let params = list
        .split(',')
        .map(str::trim)
        .map(|param| {
            if is_identifier(param) {
                Ok(param.to_string())
            } else {
                Err(invalid(param))
            }
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((function.to_string(), params))
}

/// Parses a host-supplied value: an integer (optionally negative),
/// `'text'`, or `@name`.
///
/// # Errors
///
/// Returns [`ArgumentError::InvalidValue`] for anything else.
pub fn parse_value(text: &str) -> std::result::Result<Value, ArgumentError> {
    let invalid = || ArgumentError::InvalidValue(text.to_string());
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::Int(n));
    }
    if let Some(inner) = text
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
    {
        return Ok(Value::text(inner));
    }
    match text.strip_prefix('@') {
        Some(name) if is_identifier(name) => Ok(Value::global(name)),
        _ => Err(invalid()),
    }
}
