//! Property tests for program construction

use icvm_language::{Instruction, build};
use proptest::prelude::*;

/// Straight-line statements with jumps between three fixed labels.
fn program_source() -> impl Strategy<Value = String> {
    let statement = prop_oneof![
        ("[a-c]", 0..50i64).prop_map(|(v, n)| format!("{v} := {n}")),
        ("[a-c]", "[a-c]", "[-+*%/<>]").prop_map(|(d, l, op)| format!("{d} := {l} {op} 3")),
        ("(ifz|ifnz)", "[a-c]", "l[0-2]").prop_map(|(k, v, l)| format!("{k} {v} goto {l}")),
        "l[0-2]".prop_map(|l| format!("goto {l}")),
        "l[0-2]".prop_map(|l| format!("r := call {l}")),
        Just("ret a".to_string()),
    ];
    (prop::collection::vec(statement, 0..20), 0usize..20, 0usize..20, 0usize..20).prop_map(
        |(statements, p0, p1, p2)| {
            let mut lines = statements;
            for (label, at) in [("l0", p0), ("l1", p1), ("l2", p2)] {
                let at = at.min(lines.len());
                lines.insert(at, format!("{label}:"));
            }
            lines.join("\n")
        },
    )
}

proptest! {
    #[test]
    fn targets_are_in_bounds(source in program_source()) {
        let program = build(&source).expect("generated program must build");
        for instruction in program.instructions() {
            match instruction {
                Instruction::Goto { target } | Instruction::CondGoto { target, .. } => {
                    prop_assert!(target.pc <= program.len());
                    prop_assert_eq!(program.label(&target.name), Some(target.pc));
                }
                Instruction::Call { callee, .. } => {
                    prop_assert_eq!(callee.entry, program.label(&callee.name));
                }
                Instruction::LabelMarker { .. } => prop_assert!(false, "marker survived"),
                _ => {}
            }
        }
    }

    #[test]
    fn printing_is_a_fixed_point(source in program_source()) {
        let printed = build(&source).expect("generated program must build").to_string();
        let reprinted = build(&printed).expect("printed program must build").to_string();
        prop_assert_eq!(printed, reprinted);
    }
}
