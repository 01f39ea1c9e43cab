//! Tagged runtime value for icvm programs.

use std::fmt;
use std::sync::Arc;

/// A runtime value.
///
/// Values are immutable and cheaply cloneable. Text payloads are shared
/// behind an `Arc`, so an assignment copy can never be observed mutating
/// another variable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// Text value (from a `'...'` literal or a native).
    Text(Arc<str>),
    /// Reference to a global, written `@name`. Stores the name without `@`.
    GlobalRef(Arc<str>),
}

/// The tag of a [`Value`], used in type fault messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    /// [`Value::Int`]
    Integer,
    /// [`Value::Text`]
    Text,
    /// [`Value::GlobalRef`]
    Global,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => write!(f, "integer"),
            Self::Text => write!(f, "text"),
            Self::Global => write!(f, "global"),
        }
    }
}

impl Value {
    /// Creates a text value.
    #[must_use]
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(s.as_ref()))
    }

    /// Creates a global reference. A leading `@` is stripped if present.
    #[must_use]
    pub fn global(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        Self::GlobalRef(Arc::from(name.strip_prefix('@').unwrap_or(name)))
    }

    /// Returns the tag of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Integer,
            Self::Text(_) => ValueType::Text,
            Self::GlobalRef(_) => ValueType::Global,
        }
    }

    /// Attempts to extract an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a global name (without the `@`).
    #[must_use]
    pub fn as_global(&self) -> Option<&str> {
        match self {
            Self::GlobalRef(name) => Some(name),
            _ => None,
        }
    }

    /// Converts a boolean into the integer encoding used by comparisons.
    #[must_use]
    pub const fn from_bool(b: bool) -> Self {
        Self::Int(if b { 1 } else { 0 })
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(Arc::from(s))
    }
}

/// Renders the value in IR literal syntax.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "'{s}'"),
            Self::GlobalRef(name) => write!(f, "@{name}"),
        }
    }
}
