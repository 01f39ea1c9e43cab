//! Tests for sharing one program among many engines

use std::sync::Arc;
use std::thread;

use icvm_engine::{GlobalTable, Machine, MachineConfig, State};
use icvm_foundation::Value;
use icvm_language::{Program, build};

const SUM_TO: &str = "
sum:
    acc := 0
loop:
    ifz n goto done
    acc := acc + n
    n := n - 1
    goto loop
done:
    ret acc
";

fn shared() -> Arc<(Program, GlobalTable)> {
    let program = build(SUM_TO).expect("build failed");
    let mut globals = GlobalTable::from_program(&program);
    globals.set_params("sum", ["n"]).expect("sum is a label");
    Arc::new((program, globals))
}

#[test]
fn independent_engines_on_owned_threads() {
    let shared = shared();
    let handles: Vec<_> = (0..8i64)
        .map(|n| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let (program, globals) = &*shared;
                let config = MachineConfig::new()
                    .with_entry("sum")
                    .with_args([Value::Int(n * 10)]);
                let mut machine = Machine::with_config(program, globals, config);
                machine.run().clone()
            })
        })
        .collect();

    for (n, handle) in (0..8i64).zip(handles) {
        let m = n * 10;
        assert_eq!(
            handle.join().expect("thread panicked"),
            State::Halted(Some(Value::Int(m * (m + 1) / 2)))
        );
    }
}

#[test]
fn snapshot_resumes_on_another_thread() {
    let shared = shared();
    let (program, globals) = &*shared;
    let config = MachineConfig::new()
        .with_entry("sum")
        .with_args([Value::Int(100)]);
    let mut machine = Machine::with_config(program, globals, config);
    for _ in 0..50 {
        machine.step();
    }
    let snapshot = machine.clone();

    let resumed = thread::scope(|scope| {
        scope
            .spawn(move || {
                let mut snapshot = snapshot;
                snapshot.run().clone()
            })
            .join()
            .expect("thread panicked")
    });

    assert_eq!(machine.run(), &resumed);
    assert_eq!(resumed, State::Halted(Some(Value::Int(5050))));
}

#[test]
fn faults_in_one_engine_do_not_affect_others() {
    let shared = shared();
    let (program, globals) = &*shared;
    let results: Vec<_> = thread::scope(|scope| {
        let bad = scope.spawn(|| {
            let config = MachineConfig::new()
                .with_entry("sum")
                .with_args([Value::text("ten")]);
            let mut machine = Machine::with_config(program, globals, config);
            machine.run().clone()
        });
        let good = scope.spawn(|| {
            let config = MachineConfig::new()
                .with_entry("sum")
                .with_args([Value::Int(4)]);
            let mut machine = Machine::with_config(program, globals, config);
            machine.run().clone()
        });
        vec![
            bad.join().expect("thread panicked"),
            good.join().expect("thread panicked"),
        ]
    });
    assert!(matches!(results[0], State::Faulted(_)));
    assert_eq!(results[1], State::Halted(Some(Value::Int(10))));
}
