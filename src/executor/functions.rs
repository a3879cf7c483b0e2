//! Host interfaces: the variable provider and the native function registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;

use super::types::Value;

/// Name of the function every resolver provides on top of the registry
pub const GET_VARIABLE: &str = "getVariable";

/* ===================== Variable Provider ===================== */

/// Supplies values for `$(label:name)` references
///
/// Errors returned by the provider propagate through resolution unchanged.
pub trait VariableProvider {
    /// Look up a variable; unknown variables are `Value::Undefined`
    fn get_variable(&self, label: &str, name: &str) -> Result<Value>;

    /// Split reference text into `(label, name)`
    ///
    /// Returning `None` rejects the reference as having no usable name.
    fn split_variable_id<'s>(&self, id: &'s str) -> Option<(&'s str, &'s str)> {
        Some(split_variable_id(id))
    }
}

/// Default split: everything before the first `:` is the label; text without
/// a `:` is a name with an empty label
pub fn split_variable_id(id: &str) -> (&str, &str) {
    id.split_once(':').unwrap_or(("", id))
}

/// Canonical `label:name` id
pub fn join_variable_id(label: &str, name: &str) -> String {
    if label.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", label, name)
    }
}

impl<F> VariableProvider for F
where
    F: Fn(&str, &str) -> Result<Value>,
{
    fn get_variable(&self, label: &str, name: &str) -> Result<Value> {
        self(label, name)
    }
}

/// Variables keyed by their `label:name` id
impl VariableProvider for HashMap<String, Value> {
    fn get_variable(&self, label: &str, name: &str) -> Result<Value> {
        Ok(self
            .get(&join_variable_id(label, name))
            .cloned()
            .unwrap_or_default())
    }
}

/// Provider with no variables at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVariables;

impl VariableProvider for NoVariables {
    fn get_variable(&self, _label: &str, _name: &str) -> Result<Value> {
        Ok(Value::Undefined)
    }
}

/* ===================== Function Registry ===================== */

/// Native function callable from expressions
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Case-sensitive map of function name to native implementation
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, NativeFn>,
}

impl FunctionRegistry {
    /// Empty registry; only the implicit `getVariable` is callable
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in function library
    pub fn with_stdlib() -> Self {
        let mut registry = Self::new();
        super::stdlib::register_stdlib(&mut registry);
        registry
    }

    /// Register (or replace) a function
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn get(&self, name: &str) -> Option<&NativeFn> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<NativeFn> {
        self.functions.remove(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::hashmap;

    #[test]
    fn test_split_variable_id() {
        assert_eq!(split_variable_id("internal:time_hms"), ("internal", "time_hms"));
        assert_eq!(split_variable_id("a:b:c"), ("a", "b:c"));
        assert_eq!(split_variable_id("plain"), ("", "plain"));
        assert_eq!(split_variable_id(""), ("", ""));
    }

    #[test]
    fn test_map_provider() {
        let vars = hashmap! {
            "my:var".to_string() => Value::Number(4.0),
            "bare".to_string() => Value::Bool(true),
        };
        assert_eq!(vars.get_variable("my", "var").unwrap(), Value::Number(4.0));
        assert_eq!(vars.get_variable("", "bare").unwrap(), Value::Bool(true));
        assert_eq!(vars.get_variable("my", "other").unwrap(), Value::Undefined);
    }

    #[test]
    fn test_closure_provider() {
        let provider = |label: &str, name: &str| -> Result<Value> {
            Ok(Value::String(format!("{}/{}", label, name)))
        };
        assert_eq!(
            provider.get_variable("a", "b").unwrap(),
            Value::String("a/b".to_string())
        );
    }

    #[test]
    fn test_registry_register_and_lookup() {
        let mut registry = FunctionRegistry::new();
        registry
            .register("double", |args: &[Value]| {
                Ok(Value::Number(args.first().map(Value::to_number).unwrap_or(0.0) * 2.0))
            })
            .register("zero", |_: &[Value]| Ok(Value::Number(0.0)));

        assert_eq!(registry.names(), vec!["double", "zero"]);
        let double = registry.get("double").unwrap();
        assert_eq!(double(&[Value::Number(21.0)]).unwrap(), Value::Number(42.0));
        assert!(registry.get("Double").is_none());
    }
}
