//! Built-in native functions
//!
//! These are registered by `FunctionRegistry::with_stdlib()`. Every function
//! is pure, so resolving the same expression twice gives the same result.

pub mod convert;
pub mod math;
pub mod strings;
pub mod time;

use anyhow::{bail, Result};

use super::functions::FunctionRegistry;
use super::types::Value;

static UNDEFINED: Value = Value::Undefined;

/* ===================== Registration ===================== */

/// Register every built-in function, replacing entries with the same name
pub fn register_stdlib(registry: &mut FunctionRegistry) {
    registry
        // math
        .register("round", math::round)
        .register("floor", math::floor)
        .register("ceil", math::ceil)
        .register("abs", math::abs)
        .register("min", math::min)
        .register("max", math::max)
        .register("fromHex", math::from_hex)
        .register("toHex", math::to_hex)
        // strings
        .register("trim", strings::trim)
        .register("strlen", strings::strlen)
        .register("substr", strings::substr)
        .register("split", strings::split)
        .register("join", strings::join)
        .register("concat", strings::concat)
        .register("includes", strings::includes)
        .register("indexOf", strings::index_of)
        .register("lastIndexOf", strings::last_index_of)
        .register("toUpperCase", strings::to_upper_case)
        .register("toLowerCase", strings::to_lower_case)
        .register("replaceAll", strings::replace_all)
        // conversion
        .register("bool", convert::bool)
        .register("string", convert::string)
        .register("number", convert::number)
        .register("jsonstringify", convert::json_stringify)
        .register("jsonparse", convert::json_parse)
        // time
        .register("secondsToTimestamp", time::seconds_to_timestamp)
        .register("msToTimestamp", time::ms_to_timestamp)
        .register("timestampToSeconds", time::timestamp_to_seconds);
}

/* ===================== Argument Helpers ===================== */

/// Positional argument, `undefined` when absent
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&UNDEFINED)
}

/// Optional positional argument: absent and `undefined` both count as missing
pub(crate) fn optional_arg(args: &[Value], index: usize) -> Option<&Value> {
    args.get(index).filter(|v| !matches!(v, Value::Undefined))
}

pub(crate) fn require_args(name: &str, args: &[Value], count: usize) -> Result<()> {
    if args.len() < count {
        bail!(
            "{}() expects at least {} argument{}, got {}",
            name,
            count,
            if count == 1 { "" } else { "s" },
            args.len()
        );
    }
    Ok(())
}

/// String form used by the string functions (`null` and `undefined` become "")
pub(crate) fn string_arg(args: &[Value], index: usize) -> String {
    match arg(args, index) {
        Value::Undefined | Value::Null => String::new(),
        other => other.to_js_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdlib_registers_functions() {
        let registry = FunctionRegistry::with_stdlib();
        assert!(registry.contains("round"));
        assert!(registry.contains("secondsToTimestamp"));
        assert!(!registry.contains("getVariable"));
    }

    #[test]
    fn test_require_args_message() {
        let err = require_args("substr", &[], 2).unwrap_err();
        assert_eq!(err.to_string(), "substr() expects at least 2 arguments, got 0");
    }
}
