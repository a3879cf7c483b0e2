//! Tests for resolve-time errors and host error propagation

use super::helpers::{eval_err, parse};
use crate::executor::{resolve_expression, FunctionRegistry, NoVariables, ResolveError, Value};

#[test]
fn test_unsupported_function() {
    match eval_err("foo(1)") {
        ResolveError::UnsupportedFunction { name } => assert_eq!(name, "foo"),
        other => panic!("expected UnsupportedFunction, got {:?}", other),
    }
}

#[test]
fn test_function_names_are_case_sensitive() {
    assert!(matches!(
        eval_err("Round(1.5)"),
        ResolveError::UnsupportedFunction { .. }
    ));
}

#[test]
fn test_unsupported_function_skips_arguments() {
    // the callee is checked before its arguments run
    match eval_err("foo(bar())") {
        ResolveError::UnsupportedFunction { name } => assert_eq!(name, "foo"),
        other => panic!("expected UnsupportedFunction, got {:?}", other),
    }
}

#[test]
fn test_empty_registry_has_only_get_variable() {
    let node = parse("round(1)");
    let err = resolve_expression(&node, &NoVariables, &FunctionRegistry::new()).unwrap_err();
    assert!(matches!(err, ResolveError::UnsupportedFunction { .. }));

    let node = parse("getVariable('a:b')");
    let value = resolve_expression(&node, &NoVariables, &FunctionRegistry::new()).unwrap();
    assert_eq!(value, Value::Undefined);
}

#[test]
fn test_native_function_error_propagates() {
    let mut functions = FunctionRegistry::new();
    functions.register("fail", |args: &[Value]| {
        anyhow::bail!("fail called with {} argument(s)", args.len())
    });
    let err = resolve_expression(&parse("1 + fail(1, 2)"), &NoVariables, &functions).unwrap_err();
    assert!(matches!(err, ResolveError::Host(_)));
    assert_eq!(err.to_string(), "fail called with 2 argument(s)");
}

#[test]
fn test_native_function_receives_evaluated_arguments() {
    let mut functions = FunctionRegistry::new();
    functions.register("describe", |args: &[Value]| {
        let kinds: Vec<&str> = args.iter().map(Value::type_name).collect();
        Ok(Value::from(kinds.join(",")))
    });
    let value = resolve_expression(
        &parse("describe(1 + 1, 'a', [], {}, null, undefined, true)"),
        &NoVariables,
        &functions,
    )
    .unwrap();
    assert_eq!(
        value,
        Value::from("number,string,array,object,null,undefined,boolean")
    );
}

#[test]
fn test_error_messages() {
    assert_eq!(eval_err("foo()").to_string(), "Unsupported function \"foo\"");
    assert_eq!(eval_err("$()").to_string(), "Missing variable identifier");
    assert_eq!(eval_err("1 = 1").to_string(), "Cannot assign to Literal");
    assert_eq!(
        eval_err("a = [1]; a.x = 1").to_string(),
        "Cannot set property 'x' of array"
    );
}
