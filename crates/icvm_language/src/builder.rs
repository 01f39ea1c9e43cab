//! Program builder.
//!
//! Turns a flat token stream into a [`Program`] in two passes:
//!
//! 1. Group tokens into line statements and parse each into a draft. Label
//!    definitions become [`Instruction::LabelMarker`] drafts; jump and call
//!    targets stay symbolic. Duplicate labels are rejected here.
//! 2. Strip the markers, recording each label at the index of the next
//!    executable instruction, then resolve every symbolic target against the
//!    finished label table. Forward references are therefore legal.
//!
//! Construction is all-or-nothing: the first error aborts and no partial
//! program is returned.
//!
//! ```text
//! label      := IDENT ':'
//! assign     := IDENT ':=' operand [ op operand ]
//! branch     := ('ifz'|'ifnz') operand 'goto' target
//! jump       := 'goto' target
//! argpush    := 'arg' operand
//! call       := [ IDENT ':=' ] 'call' target
//! ret        := 'ret' [ operand ]
//! target     := IDENT | GLOBALREF
//! operand    := IDENT | GLOBALREF | NUMBER | STRING
//! ```

use std::collections::{HashMap, HashSet};

use icvm_foundation::{BuildError, Value};
use tracing::debug;

use crate::instruction::{Callee, Instruction, Operand, Polarity, Target};
use crate::lexer::Lexer;
use crate::program::Program;
use crate::token::{Keyword, Operator, Token, TokenKind};

/// Builds a program from IR text with no external globals.
///
/// # Errors
///
/// Returns the first lexical, syntax, duplicate-label, or unresolved-reference
/// error.
pub fn build(source: &str) -> Result<Program, BuildError> {
    ProgramBuilder::new().build(source)
}

/// Configurable program builder.
#[derive(Clone, Debug, Default)]
pub struct ProgramBuilder {
    /// Host-provided global names that `call @name` may target.
    externals: HashSet<String>,
}

impl ProgramBuilder {
    /// Creates a builder with no external globals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a host-provided global that calls may resolve to.
    #[must_use]
    pub fn with_external(mut self, name: impl AsRef<str>) -> Self {
        self.declare_external(name);
        self
    }

    /// Declares several host-provided globals.
    #[must_use]
    pub fn with_externals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.declare_external(name);
        }
        self
    }

    /// Declares a host-provided global in place.
    pub fn declare_external(&mut self, name: impl AsRef<str>) {
        let name = name.as_ref();
        self.externals
            .insert(name.strip_prefix('@').unwrap_or(name).to_string());
    }

    /// Lexes and builds `source`.
    ///
    /// # Errors
    ///
    /// See [`build`].
    pub fn build(&self, source: &str) -> Result<Program, BuildError> {
        let tokens = Lexer::tokenize(source)?;
        self.build_tokens(&tokens)
    }

    /// Builds a program from an already-lexed token sequence.
    ///
    /// # Errors
    ///
    /// See [`build`].
    pub fn build_tokens(&self, tokens: &[Token]) -> Result<Program, BuildError> {
        let drafts = parse_statements(tokens)?;
        let program = self.resolve(drafts)?;
        debug!(
            instructions = program.len(),
            labels = program.labels().count(),
            "built program"
        );
        Ok(program)
    }

    /// Second pass: strip label markers, index labels, resolve targets.
    fn resolve(&self, drafts: Vec<Draft>) -> Result<Program, BuildError> {
        let mut labels = Vec::new();
        let mut index = HashMap::new();
        let mut executable = Vec::with_capacity(drafts.len());

        for draft in drafts {
            if let Draft::Ready(Instruction::LabelMarker { name }) = draft {
                let pc = executable.len();
                index.insert(name.clone(), pc);
                labels.push((name, pc));
            } else {
                executable.push(draft);
            }
        }

        let instructions = executable
            .into_iter()
            .map(|draft| self.resolve_draft(draft, &index))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Program::from_parts(instructions, labels))
    }

    fn resolve_draft(
        &self,
        draft: Draft,
        labels: &HashMap<String, usize>,
    ) -> Result<Instruction, BuildError> {
        let resolve_jump = |reference: Reference| -> Result<Target, BuildError> {
            match labels.get(&reference.name) {
                Some(&pc) => Ok(Target {
                    name: reference.name,
                    global: reference.global,
                    pc,
                }),
                None => Err(reference.unresolved()),
            }
        };

        Ok(match draft {
            Draft::Ready(instruction) => instruction,
            Draft::Goto { target } => Instruction::Goto {
                target: resolve_jump(target)?,
            },
            Draft::CondGoto {
                polarity,
                cond,
                target,
            } => Instruction::CondGoto {
                polarity,
                cond,
                target: resolve_jump(target)?,
            },
            Draft::Call { dest, callee } => {
                let entry = labels.get(&callee.name).copied();
                let external = callee.global && self.externals.contains(&callee.name);
                if entry.is_none() && !external {
                    return Err(callee.unresolved());
                }
                Instruction::Call {
                    dest,
                    callee: Callee {
                        name: callee.name,
                        global: callee.global,
                        entry,
                    },
                }
            }
        })
    }
}

/// A symbolic target awaiting resolution.
#[derive(Debug)]
struct Reference {
    name: String,
    global: bool,
    line: u32,
}

impl Reference {
    fn unresolved(self) -> BuildError {
        BuildError::UnresolvedReference {
            name: if self.global {
                format!("@{}", self.name)
            } else {
                self.name
            },
            line: self.line,
        }
    }
}

/// A first-pass statement.
#[derive(Debug)]
enum Draft {
    /// Needs no resolution (includes label markers).
    Ready(Instruction),
    Goto {
        target: Reference,
    },
    CondGoto {
        polarity: Polarity,
        cond: Operand,
        target: Reference,
    },
    Call {
        dest: Option<String>,
        callee: Reference,
    },
}

/// First pass: one statement per line, with leading labels split off. A
/// statement continues past a line break inside a string literal.
fn parse_statements(tokens: &[Token]) -> Result<Vec<Draft>, BuildError> {
    let mut statements = Vec::new();
    let mut defined: HashMap<String, u32> = HashMap::new();

    for line_tokens in tokens.chunk_by(|a, b| a.end_line() == b.line()) {
        let line = line_tokens[0].line();
        let mut rest = line_tokens;

        while let Some((Token { kind: TokenKind::Label(name), .. }, tail)) = rest.split_first() {
            if let Some(&first_line) = defined.get(name) {
                return Err(BuildError::DuplicateLabel {
                    name: name.clone(),
                    line,
                    first_line,
                });
            }
            defined.insert(name.clone(), line);
            statements.push(Draft::Ready(Instruction::LabelMarker { name: name.clone() }));
            rest = tail;
        }

        if !rest.is_empty() {
            statements.push(StatementParser::new(rest, line).parse()?);
        }
    }

    Ok(statements)
}

/// Parses the tokens of a single statement.
struct StatementParser<'t> {
    tokens: &'t [Token],
    pos: usize,
    line: u32,
}

impl<'t> StatementParser<'t> {
    fn new(tokens: &'t [Token], line: u32) -> Self {
        Self {
            tokens,
            pos: 0,
            line,
        }
    }

    fn parse(mut self) -> Result<Draft, BuildError> {
        let draft = match self.next_kind() {
            Some(TokenKind::Ident(dest)) => {
                let dest = dest.clone();
                self.expect_assign()?;
                self.parse_assignment(dest)?
            }
            Some(TokenKind::Keyword(keyword @ (Keyword::Ifz | Keyword::Ifnz))) => {
                let polarity = if *keyword == Keyword::Ifz {
                    Polarity::IfZero
                } else {
                    Polarity::IfNonZero
                };
                let cond = self.parse_operand()?;
                match self.next_kind() {
                    Some(TokenKind::Keyword(Keyword::Goto)) => {}
                    other => return Err(self.unexpected("'goto'", other.cloned())),
                }
                Draft::CondGoto {
                    polarity,
                    cond,
                    target: self.parse_target()?,
                }
            }
            Some(TokenKind::Keyword(Keyword::Goto)) => Draft::Goto {
                target: self.parse_target()?,
            },
            Some(TokenKind::Keyword(Keyword::Arg)) => Draft::Ready(Instruction::Arg {
                value: self.parse_operand()?,
            }),
            Some(TokenKind::Keyword(Keyword::Call)) => Draft::Call {
                dest: None,
                callee: self.parse_target()?,
            },
            Some(TokenKind::Keyword(Keyword::Ret)) => {
                let value = if self.at_end() {
                    None
                } else {
                    Some(self.parse_operand()?)
                };
                Draft::Ready(Instruction::Ret { value })
            }
            Some(TokenKind::Label(name)) => {
                return Err(BuildError::syntax(
                    format!("label `{name}:` must start the line"),
                    self.line,
                ));
            }
            other => return Err(self.unexpected("a statement", other.cloned())),
        };

        if let Some(extra) = self.next_kind() {
            return Err(BuildError::syntax(
                format!("unexpected {} `{extra}` after statement", extra.name()),
                self.line,
            ));
        }
        Ok(draft)
    }

    /// Parses what follows `dest :=`.
    fn parse_assignment(&mut self, dest: String) -> Result<Draft, BuildError> {
        if matches!(self.peek_kind(), Some(TokenKind::Keyword(Keyword::Call))) {
            self.pos += 1;
            return Ok(Draft::Call {
                dest: Some(dest),
                callee: self.parse_target()?,
            });
        }

        let lhs = self.parse_operand()?;
        match self.peek_kind() {
            Some(TokenKind::Op(Operator::Binary(op))) => {
                let op = *op;
                self.pos += 1;
                let rhs = self.parse_operand()?;
                Ok(Draft::Ready(Instruction::BinaryOp { dest, lhs, op, rhs }))
            }
            _ => Ok(Draft::Ready(Instruction::Assign { dest, value: lhs })),
        }
    }

    fn expect_assign(&mut self) -> Result<(), BuildError> {
        match self.next_kind() {
            Some(TokenKind::Op(Operator::Assign)) => Ok(()),
            other => Err(self.unexpected("':='", other.cloned())),
        }
    }

    fn parse_operand(&mut self) -> Result<Operand, BuildError> {
        match self.next_kind() {
            Some(TokenKind::Ident(name)) => Ok(Operand::Var(name.clone())),
            Some(TokenKind::GlobalRef(name)) => Ok(Operand::Global(name.clone())),
            Some(TokenKind::Number(n)) => Ok(Operand::Literal(Value::Int(*n))),
            Some(TokenKind::Str(s)) => Ok(Operand::Literal(Value::text(s))),
            other => Err(self.unexpected("an operand", other.cloned())),
        }
    }

    fn parse_target(&mut self) -> Result<Reference, BuildError> {
        let line = self.line;
        match self.next_kind() {
            Some(TokenKind::Ident(name)) => Ok(Reference {
                name: name.clone(),
                global: false,
                line,
            }),
            Some(TokenKind::GlobalRef(name)) => Ok(Reference {
                name: name.clone(),
                global: true,
                line,
            }),
            other => Err(self.unexpected("a label or global", other.cloned())),
        }
    }

    fn peek_kind(&self) -> Option<&'t TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn next_kind(&mut self) -> Option<&'t TokenKind> {
        let kind = self.peek_kind();
        if kind.is_some() {
            self.pos += 1;
        }
        kind
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn unexpected(&self, expected: &str, found: Option<TokenKind>) -> BuildError {
        let message = match found {
            Some(kind) => format!("expected {expected}, found {} `{kind}`", kind.name()),
            None => format!("expected {expected}, found end of line"),
        };
        BuildError::syntax(message, self.line)
    }
}
