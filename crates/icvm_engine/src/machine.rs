//! The program-counter-driven execution engine.
//!
//! A [`Machine`] borrows an immutable [`Program`] and [`GlobalTable`] and owns
//! everything that changes while it runs: the call stack, the pending
//! argument list, the program counter and the step count. Any number of
//! machines may share one program and table, including across threads.
//!
//! # States
//!
//! A machine starts [`State::Running`] at its entry point and ends in exactly
//! one terminal state. [`State::Halted`] is reached by returning from the
//! outermost frame (or running off the end of the program with only the
//! entry frame left). [`State::Faulted`] carries the fault and the pc of the
//! instruction that raised it. Nothing executes after either.
//!
//! Frame environments are persistent maps, so cloning a machine is cheap.
//! Debuggers use this to keep a history of snapshots.

mod ops;

use std::fmt;
use std::iter;

use icvm_foundation::{Fault, FaultKind, Value};
use icvm_language::{Callee, Instruction, Operand, Program};
use tracing::{debug, trace};

use crate::config::MachineConfig;
use crate::frame::{Environment, Frame};
use crate::globals::{Global, GlobalTable};

/// Name of the entry frame when the program has no entry label.
const TOP_LEVEL: &str = "<top>";

/// Execution state of a [`Machine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// More instructions can execute.
    Running,
    /// Returned from the outermost frame, with the returned value if any.
    Halted(Option<Value>),
    /// Stopped by a fault.
    Faulted(Fault),
}

impl State {
    /// Returns true while the machine can still step.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true once the machine has halted or faulted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !self.is_running()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Halted(Some(value)) => write!(f, "halted with {value}"),
            Self::Halted(None) => write!(f, "halted"),
            Self::Faulted(fault) => write!(f, "faulted: {fault}"),
        }
    }
}

/// An execution engine instance.
#[derive(Clone, Debug)]
pub struct Machine<'p> {
    program: &'p Program,
    globals: &'p GlobalTable,
    config: MachineConfig,
    /// Suspended callers, outermost first.
    callers: Vec<Frame>,
    /// The executing frame. After halting, the outermost frame.
    frame: Frame,
    pending_args: Vec<Value>,
    pc: usize,
    steps: u64,
    state: State,
}

impl<'p> Machine<'p> {
    /// Creates a machine with the default configuration.
    #[must_use]
    pub fn new(program: &'p Program, globals: &'p GlobalTable) -> Self {
        Self::with_config(program, globals, MachineConfig::default())
    }

    /// Creates a machine positioned at the configured entry point.
    ///
    /// The entry is `config.entry` if set, else `@main` if defined, else the
    /// first instruction. `config.args` bind to the entry's parameters. An
    /// unknown entry or an argument count mismatch leaves the machine
    /// already faulted.
    #[must_use]
    pub fn with_config(
        program: &'p Program,
        globals: &'p GlobalTable,
        config: MachineConfig,
    ) -> Self {
        let mut machine = Self {
            program,
            globals,
            callers: Vec::new(),
            frame: Frame::entry(TOP_LEVEL, Environment::new()),
            pending_args: Vec::new(),
            pc: 0,
            steps: 0,
            state: State::Running,
            config,
        };
        if let Err(fault) = machine.enter_entry() {
            machine.state = State::Faulted(fault);
        }
        machine
    }

    fn enter_entry(&mut self) -> Result<(), Fault> {
        let named = self.config.entry.clone();
        let (name, entry, params) = match named.as_deref() {
            Some(name) => self
                .resolve_function(name)
                .ok_or_else(|| FaultKind::UnknownCallee(name.to_string()).at(0))?,
            None => self
                .resolve_function("main")
                .unwrap_or_else(|| (TOP_LEVEL.to_string(), 0, Vec::new())),
        };

        let args = std::mem::take(&mut self.config.args);
        if args.len() != params.len() {
            return Err(FaultKind::Arity {
                callee: name,
                expected: params.len(),
                actual: args.len(),
            }
            .at(entry));
        }
        debug!(entry = %name, pc = entry, "entering program");
        self.frame = Frame::entry(name, Frame::bind(&params, args));
        self.pc = entry;
        Ok(())
    }

    /// Finds a program function by global name, falling back to a label.
    fn resolve_function(&self, name: &str) -> Option<(String, usize, Vec<String>)> {
        match self.globals.function(name) {
            Some(function) => Some((name.to_string(), function.entry, function.params.clone())),
            None => self
                .program
                .label(name)
                .map(|pc| (name.to_string(), pc, Vec::new())),
        }
    }

    /// Executes one instruction and returns the resulting state.
    ///
    /// Does nothing once the machine is terminal. Reaching the end of the
    /// instruction stream performs an implicit `ret` without consuming a step.
    pub fn step(&mut self) -> &State {
        if self.state.is_running() {
            if let Err(fault) = self.advance() {
                debug!(%fault, "machine faulted");
                self.state = State::Faulted(fault);
            }
        }
        &self.state
    }

    fn advance(&mut self) -> Result<(), Fault> {
        let pc = self.pc;
        let program = self.program;
        let Some(instruction) = program.get(pc) else {
            trace!(pc, "implicit ret at end of program");
            self.return_from_frame(None);
            return Ok(());
        };

        if let Some(limit) = self.config.step_limit {
            if self.steps >= limit {
                return Err(FaultKind::StepLimitExceeded { limit }.at(pc));
            }
        }
        self.steps += 1;
        trace!(pc, %instruction, "step");
        self.execute(instruction).map_err(|kind| kind.at(pc))
    }

    fn execute(&mut self, instruction: &Instruction) -> Result<(), FaultKind> {
        match instruction {
            Instruction::Assign { dest, value } => {
                let value = self.eval(value)?;
                self.frame.env.insert(dest.clone(), value);
                self.pc += 1;
            }
            Instruction::BinaryOp { dest, lhs, op, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                let value = ops::binary(*op, &lhs, &rhs)?;
                self.frame.env.insert(dest.clone(), value);
                self.pc += 1;
            }
            Instruction::Goto { target } => self.pc = target.pc,
            Instruction::CondGoto {
                polarity,
                cond,
                target,
            } => {
                let value = self.eval(cond)?;
                let cond = value.as_int().ok_or_else(|| {
                    FaultKind::type_mismatch("integer", value.value_type(), polarity.to_string())
                })?;
                self.pc = if polarity.fires(cond) {
                    target.pc
                } else {
                    self.pc + 1
                };
            }
            Instruction::Arg { value } => {
                let value = self.eval(value)?;
                self.pending_args.push(value);
                self.pc += 1;
            }
            Instruction::Call { dest, callee } => self.call(dest.as_ref(), callee)?,
            Instruction::Ret { value } => {
                let value = value.as_ref().map(|value| self.eval(value)).transpose()?;
                self.return_from_frame(value);
            }
            Instruction::LabelMarker { .. } => self.pc += 1,
        }
        Ok(())
    }

    fn eval(&self, operand: &Operand) -> Result<Value, FaultKind> {
        match operand {
            Operand::Var(name) => self
                .frame
                .get(name)
                .cloned()
                .ok_or_else(|| FaultKind::UnboundVariable(name.clone())),
            Operand::Global(name) => match self.globals.get(name) {
                Some(Global::Value(value)) => Ok(value.clone()),
                Some(Global::Function(_) | Global::Native(_)) => Ok(Value::global(name)),
                None if self.program.label(name).is_some() => Ok(Value::global(name)),
                None => Err(FaultKind::UnknownGlobal(name.clone())),
            },
            Operand::Literal(value) => Ok(value.clone()),
        }
    }

    fn call(&mut self, dest: Option<&String>, callee: &Callee) -> Result<(), FaultKind> {
        let globals = self.globals;
        let args = std::mem::take(&mut self.pending_args);
        match globals.get(&callee.name) {
            Some(Global::Function(function)) => {
                if args.len() != function.params.len() {
                    return Err(FaultKind::Arity {
                        callee: callee.name.clone(),
                        expected: function.params.len(),
                        actual: args.len(),
                    });
                }
                let limit = self.config.max_call_depth;
                if self.depth() >= limit {
                    return Err(FaultKind::CallDepthExceeded { limit });
                }
                let env = Frame::bind(&function.params, args);
                let frame = Frame::call(callee.name.as_str(), env, self.pc + 1, dest.cloned());
                self.callers.push(std::mem::replace(&mut self.frame, frame));
                self.pc = function.entry;
                debug!(callee = %callee.name, depth = self.depth(), pc = self.pc, "call");
            }
            Some(Global::Native(native)) => {
                let value = native.call(&args)?;
                debug!(callee = native.name, result = %value, "native call");
                if let Some(dest) = dest {
                    self.frame.env.insert(dest.clone(), value);
                }
                self.pc += 1;
            }
            Some(Global::Value(_)) | None => {
                return Err(FaultKind::UnknownCallee(callee.name.clone()));
            }
        }
        Ok(())
    }

    /// Pops the executing frame, binding `value` into the caller if the call
    /// named a destination. Halts when the outermost frame returns.
    fn return_from_frame(&mut self, value: Option<Value>) {
        let Some(caller) = self.callers.pop() else {
            debug!(steps = self.steps, "halted");
            self.state = State::Halted(value);
            return;
        };
        let returning = std::mem::replace(&mut self.frame, caller);
        if let (Some(dest), Some(value)) = (returning.dest, value) {
            self.frame.env.insert(dest, value);
        }
        if let Some(return_pc) = returning.return_pc {
            self.pc = return_pc;
        }
        debug!(callee = %returning.function, pc = self.pc, "return");
    }

    /// Steps until the machine is terminal.
    pub fn run(&mut self) -> &State {
        while self.state.is_running() {
            self.step();
        }
        &self.state
    }

    /// Steps until the machine is terminal or `stop` returns true.
    ///
    /// `stop` is checked before every step, including the first.
    pub fn run_until<F>(&mut self, mut stop: F) -> &State
    where
        F: FnMut(&Self) -> bool,
    {
        while self.state.is_running() && !stop(self) {
            self.step();
        }
        &self.state
    }

    /// Runs to completion and returns the halted value or the fault.
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] that stopped the machine.
    pub fn outcome(&mut self) -> Result<Option<Value>, Fault> {
        loop {
            match self.step() {
                State::Running => {}
                State::Halted(value) => return Ok(value.clone()),
                State::Faulted(fault) => return Err(fault.clone()),
            }
        }
    }

    /// Stops the machine with a host-imposed fault at the current pc.
    pub fn abort(&mut self, kind: FaultKind) {
        if self.state.is_running() {
            self.state = State::Faulted(kind.at(self.pc));
        }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Returns the index of the next instruction to execute.
    #[must_use]
    pub const fn pc(&self) -> usize {
        self.pc
    }

    /// Returns the number of instructions executed so far.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the configuration this machine was created with.
    ///
    /// Entry arguments are consumed on entry, so `args` is always empty.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Returns the program being executed.
    #[must_use]
    pub const fn program(&self) -> &'p Program {
        self.program
    }

    /// Returns the global table.
    #[must_use]
    pub const fn globals(&self) -> &'p GlobalTable {
        self.globals
    }

    /// Returns the call stack depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.callers.len() + 1
    }

    /// Iterates over the call stack, outermost frame first.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.callers.iter().chain(iter::once(&self.frame))
    }

    /// Returns the executing frame.
    #[must_use]
    pub const fn current_frame(&self) -> &Frame {
        &self.frame
    }

    /// Returns arguments pushed by `arg` since the last call.
    #[must_use]
    pub fn pending_args(&self) -> &[Value] {
        &self.pending_args
    }

    /// Returns the executing frame's environment. After a halt this is the
    /// outermost frame's final environment.
    #[must_use]
    pub const fn environment(&self) -> &Environment {
        &self.frame.env
    }

    /// Looks up a variable in the executing frame.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.frame.get(name)
    }
}

/// Runs `program` to completion on a fresh machine.
///
/// # Errors
///
/// Returns the [`Fault`] that stopped execution.
pub fn execute(
    program: &Program,
    globals: &GlobalTable,
    config: MachineConfig,
) -> Result<Option<Value>, Fault> {
    Machine::with_config(program, globals, config).outcome()
}
