//! Expression evaluation
//!
//! One arm per node variant. Assignment and update targets are turned into a
//! [`Place`] (a root plus a path of property keys) and written through
//! [`modify_place`], which is the only code that mutates values in place.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::trace;

use super::functions::{join_variable_id, GET_VARIABLE};
use super::operators;
use super::types::{AssignOp, BinaryOp, Node, Property, TemplateElement, UpdateOp, Value, UNKNOWN_VALUE};
use super::{ResolveError, Resolver};
use crate::config::MissingVariablePolicy;

pub type EvalResult = Result<Value, ResolveError>;

/// Writes may grow an array up to this many elements
pub const MAX_ARRAY_GROWTH: usize = 1 << 16;

/// Per-evaluation mutable state
#[derive(Debug, Default)]
pub struct EvalState {
    /// Script locals, written by assignment and update
    pub locals: HashMap<String, Value>,
    /// Set once a `return` has executed
    pub is_complete: bool,
    /// Variable ids looked up so far
    pub variable_ids: BTreeSet<String>,
}

/// Evaluate a node to a value
pub fn eval_node(ctx: &Resolver<'_>, state: &mut EvalState, node: &Node) -> EvalResult {
    match node {
        Node::Literal { value, .. } => Ok(value.clone()),

        Node::Identifier { name } => Ok(state.locals.get(name).cloned().unwrap_or_default()),

        Node::VariableRef { name } => {
            let (label, name) = ctx
                .provider
                .split_variable_id(name)
                .ok_or(ResolveError::MissingVariableIdentifier)?;
            lookup_variable(ctx, state, label, name)
        }

        Node::Unary {
            operator, argument, ..
        } => {
            let value = eval_node(ctx, state, argument)?;
            Ok(operators::unary(*operator, &value))
        }

        Node::Binary {
            operator,
            left,
            right,
        } => eval_binary(ctx, state, *operator, left, right),

        Node::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if eval_node(ctx, state, test)?.is_truthy() {
                eval_node(ctx, state, consequent)
            } else {
                eval_node(ctx, state, alternate)
            }
        }

        Node::Call { callee, arguments } => eval_call(ctx, state, callee, arguments),

        Node::TemplateLiteral {
            quasis,
            expressions,
        } => eval_template(ctx, state, quasis, expressions),

        Node::Compound { body } => {
            let mut last = Value::Undefined;
            for statement in body {
                last = eval_node(ctx, state, statement)?;
                if state.is_complete {
                    break;
                }
            }
            Ok(last)
        }

        Node::Array { elements } => {
            // holes are dropped, not filled with undefined
            let mut items = Vec::with_capacity(elements.len());
            for element in elements.iter().flatten() {
                items.push(eval_node(ctx, state, element)?);
            }
            Ok(Value::Array(items))
        }

        Node::Object { properties } => eval_object(ctx, state, properties),

        Node::Member {
            object,
            property,
            computed,
        } => {
            let target = eval_node(ctx, state, object)?;
            if target.is_nullish() {
                return Ok(target);
            }
            let key = eval_member_key(ctx, state, property, *computed)?;
            Ok(get_property(&target, &key))
        }

        Node::Return { argument } => {
            if state.is_complete {
                return Err(ResolveError::NestedReturn);
            }
            let value = eval_node(ctx, state, argument)?;
            if state.is_complete {
                return Err(ResolveError::NestedReturn);
            }
            state.is_complete = true;
            Ok(value)
        }

        Node::Assignment {
            operator,
            left,
            right,
        } => eval_assignment(ctx, state, *operator, left, right),

        Node::Update {
            operator,
            argument,
            prefix,
        } => eval_update(ctx, state, *operator, argument, *prefix),
    }
}

/* ===================== Variables ===================== */

fn lookup_variable(
    ctx: &Resolver<'_>,
    state: &mut EvalState,
    label: &str,
    name: &str,
) -> EvalResult {
    if name.is_empty() {
        return Err(ResolveError::MissingVariableIdentifier);
    }

    let id = join_variable_id(label, name);
    state.variable_ids.insert(id.clone());

    let value = ctx.provider.get_variable(label, name)?;
    if matches!(value, Value::Undefined) && ctx.missing_variable == MissingVariablePolicy::Error {
        return Err(ResolveError::MissingVariableValue { variable: id });
    }
    Ok(value)
}

/// Implicit `getVariable(id)` / `getVariable(label, name)`
fn call_get_variable(ctx: &Resolver<'_>, state: &mut EvalState, args: &[Value]) -> EvalResult {
    match args {
        [] => Err(ResolveError::MissingVariableIdentifier),
        [id] => {
            let id = id.to_js_string();
            let (label, name) = ctx
                .provider
                .split_variable_id(&id)
                .ok_or(ResolveError::MissingVariableIdentifier)?;
            lookup_variable(ctx, state, label, name)
        }
        [label, name, ..] => {
            lookup_variable(ctx, state, &label.to_js_string(), &name.to_js_string())
        }
    }
}

/* ===================== Operators ===================== */

fn eval_binary(
    ctx: &Resolver<'_>,
    state: &mut EvalState,
    operator: BinaryOp,
    left: &Node,
    right: &Node,
) -> EvalResult {
    let left = eval_node(ctx, state, left)?;
    let short_circuit = match operator {
        BinaryOp::And => !left.is_truthy(),
        BinaryOp::Or => left.is_truthy(),
        BinaryOp::Nullish => !left.is_nullish(),
        _ => false,
    };
    if short_circuit {
        return Ok(left);
    }

    let right = eval_node(ctx, state, right)?;
    operators::binary(operator, &left, &right)
}

/* ===================== Calls ===================== */

fn eval_call(
    ctx: &Resolver<'_>,
    state: &mut EvalState,
    callee: &str,
    arguments: &[Node],
) -> EvalResult {
    let function = if callee == GET_VARIABLE {
        None
    } else {
        let function = ctx
            .functions
            .get(callee)
            .ok_or_else(|| ResolveError::UnsupportedFunction {
                name: callee.to_string(),
            })?;
        Some(function)
    };

    let mut args = Vec::with_capacity(arguments.len());
    for argument in arguments {
        args.push(eval_node(ctx, state, argument)?);
    }

    match function {
        Some(function) => {
            trace!(function = callee, args = args.len(), "calling native function");
            Ok(function(args.as_slice())?)
        }
        None => call_get_variable(ctx, state, &args),
    }
}

/* ===================== Literals ===================== */

fn eval_template(
    ctx: &Resolver<'_>,
    state: &mut EvalState,
    quasis: &[TemplateElement],
    expressions: &[Node],
) -> EvalResult {
    let mut out = String::new();
    for (index, quasi) in quasis.iter().enumerate() {
        out.push_str(&quasi.raw);
        if let Some(expression) = expressions.get(index) {
            let value = eval_node(ctx, state, expression)?;
            match value.to_template_string() {
                Some(text) => out.push_str(&text),
                None => out.push_str(UNKNOWN_VALUE),
            }
        }
    }
    Ok(Value::String(out))
}

fn eval_object(ctx: &Resolver<'_>, state: &mut EvalState, properties: &[Property]) -> EvalResult {
    let mut map = BTreeMap::new();
    for property in properties {
        let key = match &property.key {
            Node::Literal { value, .. } => value.to_property_key(),
            other => {
                return Err(ResolveError::InvalidPropertyType { kind: other.kind() });
            }
        };
        let value = eval_node(ctx, state, &property.value)?;
        map.insert(key, value);
    }
    Ok(Value::Object(map))
}

/* ===================== Member Access ===================== */

/// Key addressed by a member property; `a.b` uses the name `b` itself
fn eval_member_key(
    ctx: &Resolver<'_>,
    state: &mut EvalState,
    property: &Node,
    computed: bool,
) -> EvalResult {
    match property {
        Node::Identifier { name } if !computed => Ok(Value::String(name.clone())),
        other => eval_node(ctx, state, other),
    }
}

/// Read `target[key]`; missing entries are `undefined`
pub fn get_property(target: &Value, key: &Value) -> Value {
    let is_length = key.as_str() == Some("length");
    match target {
        Value::Array(items) => match key.to_array_index() {
            Some(index) => items.get(index).cloned().unwrap_or_default(),
            None if is_length => Value::Number(items.len() as f64),
            None => Value::Undefined,
        },
        Value::String(text) => match key.to_array_index() {
            Some(index) => text
                .chars()
                .nth(index)
                .map(|c| Value::String(c.to_string()))
                .unwrap_or_default(),
            None if is_length => Value::Number(text.chars().count() as f64),
            None => Value::Undefined,
        },
        Value::Object(map) => map.get(&key.to_property_key()).cloned().unwrap_or_default(),
        _ => Value::Undefined,
    }
}

/* ===================== Assignment ===================== */

enum PlaceRoot {
    /// Script local, written back in place
    Local(String),
    /// Value computed on the fly (e.g. a variable copy); writes are discarded
    /// with it
    Temporary(Value),
}

/// Writable location: a root and the chain of keys leading into it
struct Place {
    root: PlaceRoot,
    path: Vec<Value>,
}

fn resolve_place(ctx: &Resolver<'_>, state: &mut EvalState, node: &Node) -> Result<Place, ResolveError> {
    match node {
        Node::Identifier { name } => Ok(Place {
            root: PlaceRoot::Local(name.clone()),
            path: Vec::new(),
        }),
        Node::Member {
            object,
            property,
            computed,
        } => {
            let mut place = match object.as_ref() {
                inner @ (Node::Identifier { .. } | Node::Member { .. }) => {
                    resolve_place(ctx, state, inner)?
                }
                other => Place {
                    root: PlaceRoot::Temporary(eval_node(ctx, state, other)?),
                    path: Vec::new(),
                },
            };
            place.path.push(eval_member_key(ctx, state, property, *computed)?);
            Ok(place)
        }
        other => Err(ResolveError::CannotAssignTarget { kind: other.kind() }),
    }
}

/// Apply `apply` to the value at `place`, returning `(old, new)`
fn modify_place<F>(state: &mut EvalState, place: Place, apply: F) -> Result<(Value, Value), ResolveError>
where
    F: FnOnce(&Value) -> EvalResult,
{
    let Place { root, path } = place;

    if let PlaceRoot::Local(name) = &root {
        if path.is_empty() && !state.locals.contains_key(name) {
            state.locals.insert(name.clone(), Value::Undefined);
        }
    }

    let mut scratch = Value::Undefined;
    let slot = match root {
        PlaceRoot::Local(name) => match state.locals.get_mut(&name) {
            Some(value) => value,
            None => &mut scratch,
        },
        PlaceRoot::Temporary(value) => {
            scratch = value;
            &mut scratch
        }
    };
    modify_path(slot, &path, apply)
}

fn modify_path<F>(slot: &mut Value, path: &[Value], apply: F) -> Result<(Value, Value), ResolveError>
where
    F: FnOnce(&Value) -> EvalResult,
{
    match path.split_first() {
        None => {
            let old = std::mem::take(slot);
            let new = apply(&old)?;
            *slot = new.clone();
            Ok((old, new))
        }
        Some((key, rest)) => modify_path(child_slot(slot, key)?, rest, apply),
    }
}

fn child_slot<'v>(target: &'v mut Value, key: &Value) -> Result<&'v mut Value, ResolveError> {
    match target {
        Value::Array(items) => {
            let index = key
                .to_array_index()
                .ok_or_else(|| ResolveError::CannotSetProperty {
                    property: key.to_property_key(),
                    target: "array".to_string(),
                })?;
            if index >= items.len() {
                if index >= MAX_ARRAY_GROWTH {
                    return Err(ResolveError::CannotSetProperty {
                        property: key.to_property_key(),
                        target: "array".to_string(),
                    });
                }
                items.resize(index + 1, Value::Undefined);
            }
            Ok(&mut items[index])
        }
        Value::Object(map) => Ok(map.entry(key.to_property_key()).or_default()),
        other => Err(ResolveError::CannotSetProperty {
            property: key.to_property_key(),
            target: other.type_name().to_string(),
        }),
    }
}

fn assigned_value(operator: AssignOp, old: &Value, right: Value) -> EvalResult {
    match operator.binary_op() {
        None => Ok(right),
        Some(op) => operators::binary(op, old, &right),
    }
}

fn eval_assignment(
    ctx: &Resolver<'_>,
    state: &mut EvalState,
    operator: AssignOp,
    left: &Node,
    right: &Node,
) -> EvalResult {
    if !left.is_assignable() {
        return Err(ResolveError::CannotAssignTarget { kind: left.kind() });
    }

    let right = eval_node(ctx, state, right)?;
    let place = resolve_place(ctx, state, left)?;
    let (_, new) = modify_place(state, place, |old| assigned_value(operator, old, right))?;
    Ok(new)
}

fn eval_update(
    ctx: &Resolver<'_>,
    state: &mut EvalState,
    operator: UpdateOp,
    argument: &Node,
    prefix: bool,
) -> EvalResult {
    if !argument.is_assignable() {
        return Err(ResolveError::CannotUpdateTarget {
            kind: argument.kind(),
        });
    }

    let place = resolve_place(ctx, state, argument)?;
    let (old, new) = modify_place(state, place, |old| {
        Ok(Value::Number(operators::update(operator, old)))
    })?;

    // postfix yields the old value, coerced to a number
    Ok(if prefix {
        new
    } else {
        Value::Number(old.to_number())
    })
}
