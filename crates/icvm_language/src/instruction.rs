//! The three-address instruction set.
//!
//! Every instruction names at most one destination and two source operands.
//! Operands refer to variables and globals by name, never by address.
//! `Display` renders an instruction back into IR syntax.

use std::fmt;

use icvm_foundation::Value;

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `==`
    Eq,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

impl BinOp {
    /// Every operator, in lexer precedence order.
    pub const ALL: [Self; 10] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::Eq,
        Self::Le,
        Self::Ge,
        Self::Gt,
        Self::Lt,
    ];

    /// Returns the operator's spelling.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Lt => "<",
        }
    }

    /// Returns true for the comparison operators, which yield 1 or 0.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(self, Self::Eq | Self::Le | Self::Ge | Self::Gt | Self::Lt)
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Which condition makes a conditional jump fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Polarity {
    /// `ifz`: jump when the condition is zero.
    IfZero,
    /// `ifnz`: jump when the condition is nonzero.
    IfNonZero,
}

impl Polarity {
    /// Returns true if a condition with this value takes the jump.
    #[must_use]
    pub const fn fires(self, cond: i64) -> bool {
        match self {
            Self::IfZero => cond == 0,
            Self::IfNonZero => cond != 0,
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IfZero => write!(f, "ifz"),
            Self::IfNonZero => write!(f, "ifnz"),
        }
    }
}

/// A source operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// A frame-local variable.
    Var(String),
    /// A `@name` global reference (name stored without `@`).
    Global(String),
    /// An integer or string literal.
    Literal(Value),
}

impl Operand {
    /// Creates a variable operand.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Creates an integer literal operand.
    #[must_use]
    pub const fn int(n: i64) -> Self {
        Self::Literal(Value::Int(n))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(name) => write!(f, "{name}"),
            Self::Global(name) => write!(f, "@{name}"),
            Self::Literal(value) => write!(f, "{value}"),
        }
    }
}

/// A resolved jump target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Target {
    /// Label name as written (without `@`).
    pub name: String,
    /// Whether the target was written as `@name`.
    pub global: bool,
    /// Instruction index the label resolves to.
    pub pc: usize,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            write!(f, "@{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A resolved call target.
///
/// The engine looks the callee up in the global table by `name`, so a host
/// may bind a function to a different entry than its label. `entry` records
/// what the builder resolved: the label index when the callee is defined in
/// this program, and `None` for a host-declared external.
/// [`Program::validate`](crate::Program::validate) checks it against the
/// label table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Callee {
    /// Callee name as written (without `@`).
    pub name: String,
    /// Whether the callee was written as `@name`.
    pub global: bool,
    /// Label index, if the callee is defined in the program.
    pub entry: Option<usize>,
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            write!(f, "@{}", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// A single instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    /// `dest := value`
    Assign {
        /// Destination variable.
        dest: String,
        /// Source operand.
        value: Operand,
    },
    /// `dest := lhs op rhs`
    BinaryOp {
        /// Destination variable.
        dest: String,
        /// Left operand.
        lhs: Operand,
        /// Operator.
        op: BinOp,
        /// Right operand.
        rhs: Operand,
    },
    /// `goto target`
    Goto {
        /// Jump target.
        target: Target,
    },
    /// `ifz cond goto target` / `ifnz cond goto target`
    CondGoto {
        /// Which condition fires the jump.
        polarity: Polarity,
        /// Condition operand; must evaluate to an integer.
        cond: Operand,
        /// Jump target.
        target: Target,
    },
    /// `arg value`
    Arg {
        /// The argument operand.
        value: Operand,
    },
    /// `call target` / `dest := call target`
    Call {
        /// Variable receiving the return value, if any.
        dest: Option<String>,
        /// The callee.
        callee: Callee,
    },
    /// `ret` / `ret value`
    Ret {
        /// Returned operand, if any.
        value: Option<Operand>,
    },
    /// `name:` placeholder. Only present in the builder's first pass.
    LabelMarker {
        /// Label name.
        name: String,
    },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assign { dest, value } => write!(f, "{dest} := {value}"),
            Self::BinaryOp { dest, lhs, op, rhs } => write!(f, "{dest} := {lhs} {op} {rhs}"),
            Self::Goto { target } => write!(f, "goto {target}"),
            Self::CondGoto {
                polarity,
                cond,
                target,
            } => write!(f, "{polarity} {cond} goto {target}"),
            Self::Arg { value } => write!(f, "arg {value}"),
            Self::Call {
                dest: Some(dest),
                callee,
            } => write!(f, "{dest} := call {callee}"),
            Self::Call { dest: None, callee } => write!(f, "call {callee}"),
            Self::Ret { value: Some(value) } => write!(f, "ret {value}"),
            Self::Ret { value: None } => write!(f, "ret"),
            Self::LabelMarker { name } => write!(f, "{name}:"),
        }
    }
}
