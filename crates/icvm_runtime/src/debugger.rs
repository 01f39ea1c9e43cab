//! Interactive step debugger.
//!
//! The debugger drives one [`Machine`] over a [`Session`] and answers
//! commands read from a [`LineEditor`]. Every command that moves the machine
//! first saves a snapshot, so `back` can undo it. Machine clones share their
//! environments structurally, which keeps the history cheap.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use icvm_engine::{Machine, MachineConfig, State};
use icvm_foundation::{Error, Result};

use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::Session;

/// Maximum number of snapshots kept for `back`.
pub const MAX_HISTORY: usize = 1024;

/// Instructions shown on either side of the pc by `list`.
const LIST_CONTEXT: usize = 4;

const COMMANDS: [&str; 13] = [
    "step", "continue", "break", "delete", "print", "locals", "frames", "args", "list", "back",
    "reset", "help", "quit",
];

const HELP: &str = "\
commands:
  step [n]         (s)  execute n instructions (default 1)
  continue         (c)  run to the next breakpoint or the end
  break <label|pc> (b)  set a breakpoint
  delete <label|pc>     remove a breakpoint
  print <var>      (p)  show a variable in the current frame
  locals                show every variable in the current frame
  frames          (bt)  show the call stack, innermost first
  args                  show arguments pushed since the last call
  list             (l)  show instructions around the pc
  back                  undo the last step or continue
  reset                 restart from the entry point
  help             (h)  show this help
  quit             (q)  leave the debugger
an empty line repeats the previous command";

/// What a command produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutput {
    /// Text to show the user.
    Text(String),
    /// The user asked to leave.
    Quit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Command {
    Step(usize),
    Continue,
    Break(String),
    Delete(String),
    Print(String),
    Locals,
    Frames,
    Args,
    List,
    Back,
    Reset,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();
        let operand = words.next();
        if let Some(extra) = words.next() {
            return Err(Error::invalid_argument(format!(
                "unexpected `{extra}` after `{name}`"
            )));
        }
        let required = |what: &str| {
            operand
                .map(str::to_string)
                .ok_or_else(|| Error::invalid_argument(format!("`{name}` needs {what}")))
        };

        let command = match name {
            "step" | "s" => match operand {
                Some(n) => Self::Step(n.parse().map_err(|_| {
                    Error::invalid_argument(format!("step count must be a number, got `{n}`"))
                })?),
                None => Self::Step(1),
            },
            "continue" | "c" => Self::Continue,
            "break" | "b" => Self::Break(required("a label or pc")?),
            "delete" | "d" => Self::Delete(required("a label or pc")?),
            "print" | "p" => Self::Print(required("a variable name")?),
            "locals" => Self::Locals,
            "frames" | "bt" => Self::Frames,
            "args" => Self::Args,
            "list" | "l" => Self::List,
            "back" => Self::Back,
            "reset" => Self::Reset,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" => Self::Quit,
            other => {
                return Err(Error::invalid_argument(format!(
                    "unknown command `{other}` (try `help`)"
                )));
            }
        };
        Ok(command)
    }
}

/// The interactive debugger.
pub struct Debugger<'s, E: LineEditor = RustylineEditor> {
    editor: E,
    session: &'s Session,
    config: MachineConfig,
    machine: Machine<'s>,
    history: Vec<Machine<'s>>,
    breakpoints: BTreeSet<usize>,
    last_command: Option<String>,
    prompt: String,
}

impl<'s> Debugger<'s, RustylineEditor> {
    /// Creates a debugger with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize.
    pub fn new(session: &'s Session, config: MachineConfig) -> Result<Self> {
        Ok(Self::with_editor(RustylineEditor::new()?, session, config))
    }
}

impl<'s, E: LineEditor> Debugger<'s, E> {
    /// Creates a debugger reading from `editor`.
    pub fn with_editor(editor: E, session: &'s Session, config: MachineConfig) -> Self {
        Self {
            editor,
            session,
            machine: session.machine(config.clone()),
            config,
            history: Vec::new(),
            breakpoints: BTreeSet::new(),
            last_command: None,
            prompt: "(icvm) ".to_string(),
        }
    }

    /// Sets the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns the machine being debugged.
    #[must_use]
    pub const fn machine(&self) -> &Machine<'s> {
        &self.machine
    }

    /// Returns the breakpoint pcs.
    #[must_use]
    pub const fn breakpoints(&self) -> &BTreeSet<usize> {
        &self.breakpoints
    }

    /// Runs the command loop until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails.
    pub fn run(&mut self) -> Result<()> {
        self.editor.set_completions(self.completions());
        println!(
            "debugging {} ({} instructions); type `help` for commands",
            self.session.name(),
            self.session.program().len()
        );
        println!("{}", self.position());

        loop {
            let line = match self.editor.read_line(&self.prompt)? {
                ReadResult::Line(line) => line,
                ReadResult::Interrupted => continue,
                ReadResult::Eof => break,
            };
            let line = if line.trim().is_empty() {
                match &self.last_command {
                    Some(previous) => previous.clone(),
                    None => continue,
                }
            } else {
                self.editor.add_history(&line);
                line
            };

            match self.execute(&line) {
                Ok(CommandOutput::Text(text)) => {
                    println!("{text}");
                    self.last_command = Some(line);
                }
                Ok(CommandOutput::Quit) => break,
                Err(e) => eprintln!("\x1b[31mError: {e}\x1b[0m"),
            }
        }
        Ok(())
    }

    /// Executes one command line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown commands, malformed operands, unknown
    /// breakpoint targets, or `back` with no history.
    pub fn execute(&mut self, line: &str) -> Result<CommandOutput> {
        let text = match Command::parse(line)? {
            Command::Step(n) => self.step(n),
            Command::Continue => self.continue_to_breakpoint(),
            Command::Break(target) => {
                let pc = self.resolve_target(&target)?;
                self.breakpoints.insert(pc);
                format!("breakpoint at pc {pc}")
            }
            Command::Delete(target) => {
                let pc = self.resolve_target(&target)?;
                if !self.breakpoints.remove(&pc) {
                    return Err(Error::invalid_argument(format!("no breakpoint at pc {pc}")));
                }
                format!("deleted breakpoint at pc {pc}")
            }
            Command::Print(name) => match self.machine.variable(&name) {
                Some(value) => format!("{name} = {value}"),
                None => format!("{name} is unbound"),
            },
            Command::Locals => self.locals(),
            Command::Frames => self.frames(),
            Command::Args => self.args(),
            Command::List => self.list(),
            Command::Back => {
                let previous = self
                    .history
                    .pop()
                    .ok_or_else(|| Error::invalid_argument("no earlier state"))?;
                self.machine = previous;
                self.position()
            }
            Command::Reset => {
                self.history.clear();
                self.machine = self.session.machine(self.config.clone());
                self.position()
            }
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(CommandOutput::Quit),
        };
        Ok(CommandOutput::Text(text))
    }

    fn snapshot(&mut self) {
        if self.history.len() == MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(self.machine.clone());
    }

    fn step(&mut self, n: usize) -> String {
        self.snapshot();
        for _ in 0..n {
            if self.machine.step().is_terminal() {
                break;
            }
        }
        self.position()
    }

    fn continue_to_breakpoint(&mut self) -> String {
        self.snapshot();
        self.machine.step();
        let breakpoints = &self.breakpoints;
        let state = self
            .machine
            .run_until(|machine| breakpoints.contains(&machine.pc()));
        if state.is_running() {
            format!("breakpoint: {}", self.position())
        } else {
            self.position()
        }
    }

    fn resolve_target(&self, target: &str) -> Result<usize> {
        let program = self.session.program();
        let pc = match target.parse::<usize>() {
            Ok(pc) => pc,
            Err(_) => program
                .label(target.strip_prefix('@').unwrap_or(target))
                .ok_or_else(|| Error::invalid_argument(format!("no label `{target}`")))?,
        };
        if pc > program.len() {
            return Err(Error::invalid_argument(format!(
                "pc {pc} is past the end of the program ({} instructions)",
                program.len()
            )));
        }
        Ok(pc)
    }

    /// Describes where the machine is, or how it stopped.
    fn position(&self) -> String {
        match self.machine.state() {
            State::Running => {
                let pc = self.machine.pc();
                match self.session.program().get(pc) {
                    Some(instruction) => format!("pc {pc}: {instruction}"),
                    None => format!("pc {pc}: <end of program>"),
                }
            }
            terminal => format!("{terminal} after {} steps", self.machine.steps()),
        }
    }

    fn locals(&self) -> String {
        let sorted: BTreeMap<_, _> = self.machine.environment().iter().collect();
        if sorted.is_empty() {
            return "no locals".to_string();
        }
        sorted
            .into_iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn frames(&self) -> String {
        let frames: Vec<_> = self.machine.frames().collect();
        let mut out = String::new();
        for (depth, frame) in frames.iter().rev().enumerate() {
            if depth > 0 {
                out.push('\n');
            }
            let _ = write!(out, "#{depth} {}", frame.function);
            match frame.return_pc {
                Some(pc) => {
                    let _ = write!(out, " (returns to pc {pc})");
                }
                None => out.push_str(" (entry)"),
            }
        }
        out
    }

    fn args(&self) -> String {
        let args = self.machine.pending_args();
        if args.is_empty() {
            return "no pending arguments".to_string();
        }
        args.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn list(&self) -> String {
        let program = self.session.program();
        let current = self.machine.pc();
        let start = current.saturating_sub(LIST_CONTEXT);
        let end = (current + LIST_CONTEXT + 1).min(program.len());

        let mut out = String::new();
        for pc in start..end {
            for label in program.labels_at(pc) {
                let _ = writeln!(out, "          {label}:");
            }
            let marker = if pc == current { "=>" } else { "  " };
            let breakpoint = if self.breakpoints.contains(&pc) { '*' } else { ' ' };
            if let Some(instruction) = program.get(pc) {
                let _ = writeln!(out, "{marker}{breakpoint} {pc:>4}    {instruction}");
            }
        }
        if current >= program.len() {
            let _ = writeln!(out, "=>  {current:>4}    <end of program>");
        }
        out.trim_end().to_string()
    }

    fn completions(&self) -> Vec<String> {
        COMMANDS
            .iter()
            .map(|command| (*command).to_string())
            .chain(self.session.program().labels().map(|(label, _)| label.to_string()))
            .collect()
    }
}
