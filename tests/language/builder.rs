//! Integration tests for the program builder

use icvm_foundation::{BuildError, Value};
use icvm_language::{BinOp, Instruction, Lexer, Operand, Polarity, ProgramBuilder, build};

// =============================================================================
// Construction
// =============================================================================

#[test]
fn labels_resolve_to_next_instruction() {
    let program = build("start: x := 5\ny := 2\nz := x + y\nret z").expect("build failed");
    assert_eq!(program.len(), 4);
    assert_eq!(program.label("start"), Some(0));
    assert_eq!(
        program.get(2),
        Some(&Instruction::BinaryOp {
            dest: "z".into(),
            lhs: Operand::var("x"),
            op: BinOp::Add,
            rhs: Operand::var("y"),
        })
    );
}

#[test]
fn label_on_its_own_line() {
    let program = build("top:\n\n    ; comment\n    goto top").expect("build failed");
    assert_eq!(program.label("top"), Some(0));
    assert_eq!(program.len(), 1);
}

#[test]
fn stacked_labels_share_an_index() {
    let program = build("a:\nb: ret 1").expect("build failed");
    assert_eq!(program.label("a"), Some(0));
    assert_eq!(program.label("b"), Some(0));
    assert_eq!(program.labels_at(0).collect::<Vec<_>>(), vec!["a", "b"]);
}

#[test]
fn trailing_label_points_past_end() {
    let program = build("goto end\nend:").expect("build failed");
    assert_eq!(program.label("end"), Some(1));
    assert_eq!(program.len(), 1);
}

#[test]
fn forward_and_backward_jumps() {
    let program = build("goto fwd\nback: ret 0\nfwd: ifz 0 goto back").expect("build failed");
    match program.get(0) {
        Some(Instruction::Goto { target }) => assert_eq!(target.pc, 2),
        other => panic!("expected goto, got {other:?}"),
    }
    match program.get(2) {
        Some(Instruction::CondGoto {
            polarity, target, ..
        }) => {
            assert_eq!(*polarity, Polarity::IfZero);
            assert_eq!(target.pc, 1);
        }
        other => panic!("expected conditional jump, got {other:?}"),
    }
}

#[test]
fn literal_operands() {
    let program = build("s := 'a b'\nn := 12").expect("build failed");
    assert_eq!(
        program.get(0),
        Some(&Instruction::Assign {
            dest: "s".into(),
            value: Operand::Literal(Value::text("a b")),
        })
    );
}

#[test]
fn compiler_temporaries() {
    let program = build("_t0 := 1\n_L0: ifnz _t0 goto _L0").expect("build failed");
    assert_eq!(program.label("_L0"), Some(1));
}

#[test]
fn external_globals_are_call_targets() {
    let program = ProgramBuilder::new()
        .with_external("@print")
        .build("arg 'hi'\ncall @print\nret")
        .expect("build failed");
    match program.get(1) {
        Some(Instruction::Call { dest, callee }) => {
            assert!(dest.is_none());
            assert_eq!(callee.name, "print");
            assert_eq!(callee.entry, None);
        }
        other => panic!("expected call, got {other:?}"),
    }
}

#[test]
fn build_from_tokens() {
    let tokens = Lexer::tokenize("ret 1").expect("tokenize failed");
    let program = ProgramBuilder::new().build_tokens(&tokens).expect("build failed");
    assert_eq!(program.len(), 1);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn unresolved_jump_fails_construction() {
    assert_eq!(
        build("x := 1\ngoto missing"),
        Err(BuildError::UnresolvedReference {
            name: "missing".into(),
            line: 2,
        })
    );
}

#[test]
fn unresolved_global_call_keeps_sigil() {
    assert_eq!(
        build("r := call @nowhere"),
        Err(BuildError::UnresolvedReference {
            name: "@nowhere".into(),
            line: 1,
        })
    );
}

#[test]
fn externals_are_not_jump_targets() {
    let result = ProgramBuilder::new()
        .with_external("ext")
        .build("goto @ext");
    assert!(matches!(
        result,
        Err(BuildError::UnresolvedReference { .. })
    ));
}

#[test]
fn duplicate_label_reports_both_lines() {
    assert_eq!(
        build("top: x := 1\nret x\ntop: ret 0"),
        Err(BuildError::DuplicateLabel {
            name: "top".into(),
            line: 3,
            first_line: 1,
        })
    );
}

#[test]
fn malformed_statements_are_syntax_errors() {
    let cases = [
        ("x := ", 1),
        ("x 1", 1),
        ("ret 1\ngoto", 2),
        ("ifz x top", 1),
        ("x := 1 2", 1),
        ("x := a + b + c", 1),
        ("arg", 1),
        ("x := 1 ret", 1),
        ("x := 1 done:", 1),
    ];
    for (source, line) in cases {
        match build(source) {
            Err(BuildError::Syntax { line: got, .. }) => assert_eq!(got, line, "{source:?}"),
            other => panic!("expected syntax error for {source:?}, got {other:?}"),
        }
    }
}

#[test]
fn lex_errors_abort_construction() {
    assert!(matches!(
        build("x := 'unterminated"),
        Err(BuildError::Lex { .. })
    ));
}

// =============================================================================
// Printing
// =============================================================================

#[test]
fn display_is_canonical() {
    let program = build("start:   x := 5 ; five\n y:=2\nz := x+y\nret z").expect("build failed");
    assert_eq!(
        program.to_string(),
        "start:\n    x := 5\n    y := 2\n    z := x + y\n    ret z\n"
    );
}

#[test]
fn display_rebuilds_identically() {
    let source = "main:\narg 3\narg 4\nr := call @add\nifnz r goto done\nret 0\ndone: ret r\nadd: s := p0 + p1\nret s";
    let program = build(source).expect("build failed");
    let rebuilt = build(&program.to_string()).expect("rebuild failed");
    assert_eq!(program, rebuilt);
}
