//! Integration tests for error types

use icvm_foundation::{BuildError, Error, ErrorContext, ErrorKind, FaultKind, ValueType};

#[test]
fn build_errors_report_lines() {
    let errors = [
        BuildError::Lex {
            message: "unterminated string literal".into(),
            offset: 4,
            line: 1,
            column: 5,
        },
        BuildError::syntax("expected operand", 2),
        BuildError::DuplicateLabel {
            name: "top".into(),
            line: 3,
            first_line: 1,
        },
        BuildError::UnresolvedReference {
            name: "missing".into(),
            line: 4,
        },
    ];
    let lines: Vec<_> = errors.iter().map(BuildError::line).collect();
    assert_eq!(lines, vec![1, 2, 3, 4]);
    assert!(errors[2].to_string().contains("first defined on line 1"));
}

#[test]
fn faults_carry_pc() {
    let fault = FaultKind::Arity {
        callee: "add".into(),
        expected: 2,
        actual: 1,
    }
    .at(5);
    assert_eq!(fault.pc, 5);
    assert_eq!(
        fault.to_string(),
        "arity fault calling `add`: expected 2 arguments, got 1 at pc 5"
    );
}

#[test]
fn type_fault_message() {
    let kind = FaultKind::type_mismatch("integer", ValueType::Global, "ifnz");
    assert_eq!(
        kind.to_string(),
        "type fault in ifnz: expected integer, got global"
    );
}

#[test]
fn error_wraps_both_families() {
    let build: Error = BuildError::syntax("bad", 1).into();
    assert!(matches!(build.kind, ErrorKind::Build(_)));

    let fault: Error = FaultKind::StepLimitExceeded { limit: 10 }.at(0).into();
    assert!(matches!(fault.kind, ErrorKind::Fault(_)));
    assert_eq!(fault.to_string(), "step limit (10) exceeded at pc 0");
}

#[test]
fn error_context_display() {
    let context = ErrorContext::new().with_source("prog.ic").with_line(12);
    assert_eq!(context.to_string(), "prog.ic:12");
    let err = Error::io("disk full").with_context(context);
    assert!(err.context.is_some());
    assert_eq!(err.to_string(), "io error: disk full");
}
