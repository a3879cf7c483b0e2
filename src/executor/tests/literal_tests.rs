//! Tests for literals, arrays, objects and member access

use super::helpers::{eval, eval_err, json, resolve};
use crate::executor::{ResolveError, Value};
use maplit::hashmap;
use serde_json::json as j;

/* ===================== Primitive Literals ===================== */

#[test]
fn test_primitive_literals() {
    assert_eq!(eval("42"), Value::Number(42.0));
    assert_eq!(eval("0x10"), Value::Number(16.0));
    assert_eq!(eval("'hi'"), Value::from("hi"));
    assert_eq!(eval("true"), Value::Bool(true));
    assert_eq!(eval("null"), Value::Null);
    assert_eq!(eval("undefined"), Value::Undefined);
}

#[test]
fn test_unassigned_identifier_is_undefined() {
    assert_eq!(eval("nothing"), Value::Undefined);
}

#[test]
fn test_empty_expression() {
    assert_eq!(eval(""), Value::Undefined);
    assert_eq!(eval("  // just a comment"), Value::Undefined);
}

/* ===================== Arrays ===================== */

#[test]
fn test_array_literal() {
    assert_eq!(eval("[1, 'a', [true]]"), json(j!([1, "a", [true]])));
}

#[test]
fn test_array_holes_are_dropped() {
    let value = eval("[1, , 3]");
    assert_eq!(value, json(j!([1, 3])));
    assert_eq!(eval("[, , 1, , ]"), json(j!([1])));
}

#[test]
fn test_array_elements_keep_undefined() {
    // an explicit undefined is a value, not a hole
    assert_eq!(
        eval("[1, undefined]"),
        Value::Array(vec![Value::Number(1.0), Value::Undefined])
    );
}

/* ===================== Objects ===================== */

#[test]
fn test_object_literal() {
    assert_eq!(
        eval("{a: 1, 'b': [2], 3: true, \"c d\": null}"),
        json(j!({"a": 1, "b": [2], "3": true, "c d": null}))
    );
}

#[test]
fn test_object_duplicate_keys_last_wins() {
    assert_eq!(eval("{a: 1, a: 2}"), json(j!({"a": 2})));
}

#[test]
fn test_object_shorthand_reads_local() {
    assert_eq!(eval("x = 5; {x}"), json(j!({"x": 5})));
}

#[test]
fn test_object_values_see_variables() {
    let vars = hashmap! {
        "a:b".to_string() => Value::from("v"),
    };
    assert_eq!(
        resolve("{key: $(a:b)}", vars).unwrap(),
        json(j!({"key": "v"}))
    );
}

#[test]
fn test_computed_object_key_rejected() {
    assert!(matches!(
        eval_err("k = 'a'; {[k]: 1}"),
        ResolveError::InvalidPropertyType { kind: "Identifier" }
    ));
}

/* ===================== Member Access ===================== */

#[test]
fn test_member_access() {
    assert_eq!(eval("{a: {b: [10, 20]}}.a.b[1]"), Value::Number(20.0));
    assert_eq!(eval("{a: 1}['a']"), Value::Number(1.0));
    assert_eq!(eval("[1, 2, 3][1]"), Value::Number(2.0));
    assert_eq!(eval("[1, 2, 3]['2']"), Value::Number(3.0));
}

#[test]
fn test_member_missing_is_undefined() {
    assert_eq!(eval("[1][5]"), Value::Undefined);
    assert_eq!(eval("{a: 1}.b"), Value::Undefined);
    assert_eq!(eval("(5).x"), Value::Undefined);
}

#[test]
fn test_member_on_strings() {
    assert_eq!(eval("'héllo'[1]"), Value::from("é"));
    assert_eq!(eval("'héllo'.length"), Value::Number(5.0));
    assert_eq!(eval("[1, 2].length"), Value::Number(2.0));
}

#[test]
fn test_member_null_safe() {
    assert_eq!(eval("null.a.b"), Value::Null);
    assert_eq!(eval("missing[0]"), Value::Undefined);
    // the property is not evaluated once the object is nullish
    assert_eq!(eval("missing[nope()]"), Value::Undefined);
}

#[test]
fn test_member_dot_uses_name_not_local() {
    assert_eq!(eval("b = 'a'; {a: 1, b: 2}.b"), Value::Number(2.0));
    assert_eq!(eval("b = 'a'; {a: 1, b: 2}[b]"), Value::Number(1.0));
}
