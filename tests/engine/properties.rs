//! Property-based tests for execution

use icvm_engine::{GlobalTable, MachineConfig, execute};
use icvm_foundation::{Fault, FaultKind, Value};
use icvm_language::build;
use proptest::prelude::*;

/// A chain of blocks, each adding its index to `acc` and jumping to the next.
/// The blocks may be laid out in any order.
fn chained_blocks(order: &[usize]) -> String {
    let count = order.len();
    let mut source = String::from("acc := 0\ngoto b0\n");
    for &i in order {
        let next = if i + 1 == count {
            "finish".to_string()
        } else {
            format!("b{}", i + 1)
        };
        source.push_str(&format!("b{i}: acc := acc * 10\nacc := acc + {i}\ngoto {next}\n"));
    }
    source.push_str("finish: ret acc\n");
    source
}

fn expected_chain(count: usize) -> i64 {
    (0..count as i64).fold(0, |acc, i| acc * 10 + i)
}

fn run(source: &str) -> Result<Option<Value>, Fault> {
    let program = build(source).expect("build failed");
    let globals = GlobalTable::from_program(&program);
    execute(&program, &globals, MachineConfig::new().with_step_limit(100_000))
}

proptest! {
    #[test]
    fn block_layout_does_not_change_result(
        order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle()
    ) {
        prop_assert_eq!(
            run(&chained_blocks(&order)),
            Ok(Some(Value::Int(expected_chain(order.len()))))
        );
    }

    #[test]
    fn multiplication_never_wraps(x in 0..=i64::MAX, y in 0..=i64::MAX) {
        let source = format!("x := {x}\ny := {y}\nz := x * y\nret z");
        match x.checked_mul(y) {
            Some(product) => prop_assert_eq!(run(&source), Ok(Some(Value::Int(product)))),
            None => {
                let fault = run(&source).expect_err("overflow must fault");
                prop_assert!(matches!(fault.kind, FaultKind::Arithmetic(_)));
                prop_assert_eq!(fault.pc, 2);
            }
        }
    }

    #[test]
    fn step_limit_is_exact(limit in 1u64..200) {
        let program = build("top: goto top").expect("build failed");
        let globals = GlobalTable::new();
        let fault = execute(&program, &globals, MachineConfig::new().with_step_limit(limit))
            .expect_err("infinite loop must fault");
        prop_assert_eq!(fault, FaultKind::StepLimitExceeded { limit }.at(0));
    }
}
