//! # Executor - Tree-Walking Resolver
//!
//! Evaluates a normalized expression tree against a host-supplied variable
//! provider and function registry.
//!
//! ## Core Principles
//!
//! 1. **Pure evaluation**: no I/O of its own, no suspension points. Anything
//!    slow or fallible lives behind the host interfaces.
//! 2. **Call-scoped state**: locals and the completion flag are created fresh
//!    for every `resolve` call and dropped afterwards.
//! 3. **Copy on read**: values coming from the provider are owned copies, so
//!    assignments inside a script never reach host state.
//! 4. **Immutable trees**: the same `Node` can be resolved repeatedly and from
//!    several threads.

pub mod expressions;
pub mod functions;
pub mod operators;
pub mod stdlib;
pub mod types;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::{EngineConfig, MissingVariablePolicy};

// Re-export commonly used items
pub use expressions::{EvalResult, EvalState};
pub use functions::{
    join_variable_id, split_variable_id, FunctionRegistry, NativeFn, NoVariables,
    VariableProvider, GET_VARIABLE,
};
pub use types::{Node, Value};

/// Errors raised while resolving an expression
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Unsupported operator \"{operator}\"")]
    UnsupportedOperator { operator: String },

    #[error("Unsupported function \"{name}\"")]
    UnsupportedFunction { name: String },

    #[error("Missing variable identifier")]
    MissingVariableIdentifier,

    #[error("Missing variable value for \"{variable}\"")]
    MissingVariableValue { variable: String },

    #[error("Invalid property type: {kind}")]
    InvalidPropertyType { kind: &'static str },

    #[error("Cannot assign to {kind}")]
    CannotAssignTarget { kind: &'static str },

    #[error("Cannot update {kind}")]
    CannotUpdateTarget { kind: &'static str },

    #[error("Cannot set property '{property}' of {target}")]
    CannotSetProperty { property: String, target: String },

    #[error("Cannot execute nested return")]
    NestedReturn,

    /// Error raised by the variable provider or a native function
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

/// Result of an evaluation plus the variables it actually read
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: Value,
    /// `label:name` ids looked up, including dynamic `getVariable` calls
    pub variable_ids: BTreeSet<String>,
}

/// Resolver bound to one provider and one function registry
///
/// Cheap to construct; build one per evaluation or keep it around, it holds
/// no per-evaluation state.
pub struct Resolver<'a> {
    pub(crate) provider: &'a dyn VariableProvider,
    pub(crate) functions: &'a FunctionRegistry,
    pub(crate) missing_variable: MissingVariablePolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(provider: &'a dyn VariableProvider, functions: &'a FunctionRegistry) -> Self {
        Self {
            provider,
            functions,
            missing_variable: MissingVariablePolicy::default(),
        }
    }

    /// Apply the resolver-related settings of an engine config
    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_missing_variable_policy(config.missing_variable)
    }

    pub fn with_missing_variable_policy(mut self, policy: MissingVariablePolicy) -> Self {
        self.missing_variable = policy;
        self
    }

    /// Resolve a node to its final value
    pub fn resolve(&self, node: &Node) -> Result<Value, ResolveError> {
        self.evaluate(node).map(|resolution| resolution.value)
    }

    /// Resolve a node, also reporting which variables were read
    pub fn evaluate(&self, node: &Node) -> Result<Resolution, ResolveError> {
        debug!(kind = node.kind(), "resolving expression");

        let mut state = EvalState::default();
        let value = expressions::eval_node(self, &mut state, node)?;

        trace!(
            result = value.type_name(),
            variables = state.variable_ids.len(),
            "expression resolved"
        );
        Ok(Resolution {
            value,
            variable_ids: state.variable_ids,
        })
    }
}

/// Resolve a node with the default configuration
pub fn resolve_expression(
    node: &Node,
    provider: &dyn VariableProvider,
    functions: &FunctionRegistry,
) -> Result<Value, ResolveError> {
    Resolver::new(provider, functions).resolve(node)
}
