//! Integration tests for the value model

use icvm_foundation::{Value, ValueType};

#[test]
fn constructors_and_tags() {
    assert_eq!(Value::from(7i64).value_type(), ValueType::Integer);
    assert_eq!(Value::from("abc").value_type(), ValueType::Text);
    assert_eq!(Value::global("@main").value_type(), ValueType::Global);
}

#[test]
fn global_names_drop_sigil() {
    assert_eq!(Value::global("@main"), Value::global("main"));
    assert_eq!(Value::global("@main").as_global(), Some("main"));
}

#[test]
fn accessors_are_tag_exact() {
    let text = Value::text("7");
    assert_eq!(text.as_int(), None);
    assert_eq!(text.as_text(), Some("7"));
    assert_eq!(Value::Int(7).as_text(), None);
}

#[test]
fn booleans_are_integers() {
    assert_eq!(Value::from_bool(true), Value::Int(1));
    assert_eq!(Value::from_bool(false), Value::Int(0));
}

#[test]
fn display_matches_ir_syntax() {
    assert_eq!(Value::Int(-3).to_string(), "-3");
    assert_eq!(Value::text("hi there").to_string(), "'hi there'");
    assert_eq!(Value::global("add").to_string(), "@add");
}

#[test]
fn values_hash_by_content() {
    use std::collections::HashSet;

    let set: HashSet<Value> = [Value::text("a"), Value::text("a"), Value::Int(1)]
        .into_iter()
        .collect();
    assert_eq!(set.len(), 2);
}
