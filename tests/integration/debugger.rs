//! Integration tests driving the debugger with scripted input

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use icvm_engine::{MachineConfig, State};
use icvm_foundation::{Result, Value};
use icvm_runtime::{CommandOutput, Debugger, LineEditor, ReadResult, Session, SessionOptions};

const FACTORIAL: &str = "
main:
    arg 4
    r := call @fact
    ret r
fact:
    ifz n goto base
    m := n - 1
    arg m
    t := call @fact
    p := n * t
    ret p
base:
    ret 1
";

/// What the scripted editor saw.
#[derive(Default)]
struct Transcript {
    history: Vec<String>,
    completions: Vec<String>,
}

/// Feeds fixed lines to the debugger, then reports end of input.
struct ScriptedEditor {
    lines: VecDeque<ReadResult>,
    transcript: Rc<RefCell<Transcript>>,
}

impl ScriptedEditor {
    fn new(lines: &[&str]) -> (Self, Rc<RefCell<Transcript>>) {
        let transcript = Rc::new(RefCell::new(Transcript::default()));
        let lines = lines
            .iter()
            .map(|line| match *line {
                "^C" => ReadResult::Interrupted,
                line => ReadResult::Line(line.to_string()),
            })
            .collect();
        (
            Self {
                lines,
                transcript: Rc::clone(&transcript),
            },
            transcript,
        )
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        Ok(self.lines.pop_front().unwrap_or(ReadResult::Eof))
    }

    fn add_history(&mut self, line: &str) {
        self.transcript.borrow_mut().history.push(line.to_string());
    }

    fn set_completions(&mut self, words: Vec<String>) {
        self.transcript.borrow_mut().completions = words;
    }
}

fn session() -> Session {
    Session::from_source(
        "fact.ic",
        FACTORIAL,
        SessionOptions::new().with_params("fact", ["n"]),
    )
    .expect("session failed")
}

fn text(output: Result<CommandOutput>) -> String {
    match output.expect("command failed") {
        CommandOutput::Text(text) => text,
        CommandOutput::Quit => panic!("unexpected quit"),
    }
}

#[test]
fn breakpoint_inside_recursion() {
    let session = session();
    let (editor, _) = ScriptedEditor::new(&[]);
    let mut debugger = Debugger::with_editor(editor, &session, MachineConfig::default());

    assert_eq!(text(debugger.execute("break base")), "breakpoint at pc 9");
    assert_eq!(text(debugger.execute("c")), "breakpoint: pc 9: ret 1");
    assert_eq!(text(debugger.execute("p n")), "n = 0");
    assert_eq!(debugger.machine().depth(), 6);
    assert_eq!(
        text(debugger.execute("bt")),
        "#0 fact (returns to pc 7)\n\
         #1 fact (returns to pc 7)\n\
         #2 fact (returns to pc 7)\n\
         #3 fact (returns to pc 7)\n\
         #4 fact (returns to pc 2)\n\
         #5 main (entry)"
    );
    assert_eq!(debugger.machine().steps(), 19);

    assert_eq!(text(debugger.execute("c")), "halted with 24 after 29 steps");
    assert_eq!(text(debugger.execute("back")), "pc 9: ret 1");
    assert_eq!(text(debugger.execute("back")), "pc 0: arg 4");
}

#[test]
fn entry_and_limit_come_from_config() {
    let session = session();
    let (editor, _) = ScriptedEditor::new(&[]);
    let config = MachineConfig::new()
        .with_entry("fact")
        .with_args([Value::Int(10)])
        .with_step_limit(12);
    let mut debugger = Debugger::with_editor(editor, &session, config);

    assert_eq!(text(debugger.execute("locals")), "n = 10");
    let stopped = text(debugger.execute("continue"));
    assert!(stopped.starts_with("faulted: step limit (12) exceeded"), "{stopped}");

    // reset rebuilds the machine from the same configuration
    assert_eq!(text(debugger.execute("reset")), "pc 3: ifz n goto base");
    assert_eq!(text(debugger.execute("locals")), "n = 10");
}

#[test]
fn scripted_session() {
    let session = session();
    let (editor, transcript) =
        ScriptedEditor::new(&["break fact", "continue", "^C", "", "delete fact", "c", "q"]);
    let mut debugger = Debugger::with_editor(editor, &session, MachineConfig::default());
    debugger.run().expect("run failed");

    // `continue` ran twice (once repeated by the empty line), then to the end.
    assert_eq!(
        debugger.machine().state(),
        &State::Halted(Some(Value::Int(24)))
    );
    assert!(debugger.breakpoints().is_empty());

    let transcript = transcript.borrow();
    assert_eq!(
        transcript.history,
        vec!["break fact", "continue", "delete fact", "c", "q"]
    );
    for word in ["step", "frames", "main", "fact", "base"] {
        assert!(
            transcript.completions.iter().any(|c| c == word),
            "missing completion {word}"
        );
    }
}

#[test]
fn errors_do_not_end_the_session() {
    let session = session();
    let (editor, _) = ScriptedEditor::new(&["break nowhere", "frobnicate", "step 2"]);
    let mut debugger = Debugger::with_editor(editor, &session, MachineConfig::default());
    debugger.run().expect("run failed");
    assert_eq!(debugger.machine().pc(), 3);
    assert_eq!(debugger.machine().steps(), 2);
}
