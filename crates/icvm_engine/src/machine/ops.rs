//! Binary operator semantics.
//!
//! Integer arithmetic is checked: overflow and division by zero are
//! arithmetic faults, never wrapped values. Division truncates toward zero
//! and the remainder takes the sign of the dividend.

use std::cmp::Ordering;

use icvm_foundation::{FaultKind, Value};
use icvm_language::BinOp;

/// Applies `op` to two evaluated operands.
pub(crate) fn binary(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, FaultKind> {
    match op {
        BinOp::Add => add_values(lhs, rhs),
        BinOp::Sub => int_op(op, lhs, rhs, i64::checked_sub),
        BinOp::Mul => int_op(op, lhs, rhs, i64::checked_mul),
        BinOp::Div => {
            check_divisor(op, lhs, rhs)?;
            int_op(op, lhs, rhs, i64::checked_div)
        }
        BinOp::Mod => {
            check_divisor(op, lhs, rhs)?;
            int_op(op, lhs, rhs, i64::checked_rem)
        }
        BinOp::Eq => Ok(Value::from_bool(lhs == rhs)),
        BinOp::Le => compare_values(op, lhs, rhs, Ordering::is_le),
        BinOp::Ge => compare_values(op, lhs, rhs, Ordering::is_ge),
        BinOp::Gt => compare_values(op, lhs, rhs, Ordering::is_gt),
        BinOp::Lt => compare_values(op, lhs, rhs, Ordering::is_lt),
    }
}

fn add_values(lhs: &Value, rhs: &Value) -> Result<Value, FaultKind> {
    match (lhs, rhs) {
        (Value::Text(a), Value::Text(b)) => Ok(Value::from(format!("{a}{b}"))),
        _ => int_op(BinOp::Add, lhs, rhs, i64::checked_add),
    }
}

fn int_op(
    op: BinOp,
    lhs: &Value,
    rhs: &Value,
    apply: fn(i64, i64) -> Option<i64>,
) -> Result<Value, FaultKind> {
    let a = expect_int(op, lhs)?;
    let b = expect_int(op, rhs)?;
    apply(a, b)
        .map(Value::Int)
        .ok_or_else(|| FaultKind::arithmetic(format!("overflow in {a} {op} {b}")))
}

fn check_divisor(op: BinOp, lhs: &Value, rhs: &Value) -> Result<(), FaultKind> {
    expect_int(op, lhs)?;
    if expect_int(op, rhs)? == 0 {
        let what = if op == BinOp::Div { "division" } else { "modulo" };
        return Err(FaultKind::arithmetic(format!("{what} by zero")));
    }
    Ok(())
}

fn compare_values(
    op: BinOp,
    lhs: &Value,
    rhs: &Value,
    pred: fn(Ordering) -> bool,
) -> Result<Value, FaultKind> {
    let ord = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::Int(_), other) | (other, _) => {
            return Err(FaultKind::type_mismatch(
                "comparable operands",
                other.value_type(),
                format!("`{op}`"),
            ));
        }
    };
    Ok(Value::from_bool(pred(ord)))
}

fn expect_int(op: BinOp, value: &Value) -> Result<i64, FaultKind> {
    value
        .as_int()
        .ok_or_else(|| FaultKind::type_mismatch("integer", value.value_type(), format!("`{op}`")))
}
