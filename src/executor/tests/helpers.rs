//! Test helpers for resolver tests
//!
//! Common utilities for parsing expressions and resolving them against
//! in-memory variables

use crate::config::MissingVariablePolicy;
use crate::executor::{FunctionRegistry, Node, Resolution, ResolveError, Resolver, Value};
use std::collections::HashMap;

/// Parse an expression and push it through a JSON round trip
///
/// Every resolver test therefore also checks that the normalized tree
/// survives serialization unchanged.
pub fn parse(source: &str) -> Node {
    let node = crate::parser::parse_expression(source).expect("Parse expression failed");
    let json = serde_json::to_string(&node).expect("Expression serialization failed");
    let restored: Node = serde_json::from_str(&json).expect("Expression deserialization failed");
    assert_eq!(restored, node, "JSON round trip changed the tree for {:?}", source);
    restored
}

/// Resolve against `vars` with the built-in function library
pub fn resolve(source: &str, vars: HashMap<String, Value>) -> Result<Value, ResolveError> {
    let functions = FunctionRegistry::with_stdlib();
    Resolver::new(&vars, &functions).resolve(&parse(source))
}

/// Resolve with the strict missing-variable policy
pub fn resolve_strict(source: &str, vars: HashMap<String, Value>) -> Result<Value, ResolveError> {
    let functions = FunctionRegistry::with_stdlib();
    Resolver::new(&vars, &functions)
        .with_missing_variable_policy(MissingVariablePolicy::Error)
        .resolve(&parse(source))
}

/// Resolve and also report the variables read
pub fn evaluate(source: &str, vars: HashMap<String, Value>) -> Resolution {
    let functions = FunctionRegistry::with_stdlib();
    Resolver::new(&vars, &functions)
        .evaluate(&parse(source))
        .unwrap_or_else(|err| panic!("failed to resolve {:?}: {}", source, err))
}

/// Resolve a source with no variables, panicking on error
pub fn eval(source: &str) -> Value {
    resolve(source, HashMap::new()).unwrap_or_else(|err| panic!("failed to resolve {:?}: {}", source, err))
}

/// Resolve a source with no variables, expecting an error
pub fn eval_err(source: &str) -> ResolveError {
    match resolve(source, HashMap::new()) {
        Ok(value) => panic!("expected {:?} to fail, got {:?}", source, value),
        Err(err) => err,
    }
}

/// Value from a JSON literal, for terse expectations
pub fn json(value: serde_json::Value) -> Value {
    Value::from(value)
}

pub fn assert_nan(value: &Value) {
    assert!(
        matches!(value, Value::Number(n) if n.is_nan()),
        "expected NaN, got {:?}",
        value
    );
}
