//! String functions
//!
//! Indices count characters, not bytes.

use anyhow::Result;

use super::{arg, optional_arg, require_args, string_arg};
use crate::executor::types::Value;

pub fn trim(args: &[Value]) -> Result<Value> {
    require_args("trim", args, 1)?;
    Ok(Value::String(string_arg(args, 0).trim().to_string()))
}

pub fn strlen(args: &[Value]) -> Result<Value> {
    require_args("strlen", args, 1)?;
    Ok(Value::Number(string_arg(args, 0).chars().count() as f64))
}

/// `slice` semantics: negative positions count back from the end
pub fn substr(args: &[Value]) -> Result<Value> {
    require_args("substr", args, 2)?;
    let chars: Vec<char> = string_arg(args, 0).chars().collect();
    let len = chars.len();

    let start = relative_index(arg(args, 1).to_number(), len);
    let end = optional_arg(args, 2)
        .map(|end| relative_index(end.to_number(), len))
        .unwrap_or(len);

    let out: String = if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(Value::String(out))
}

fn relative_index(position: f64, len: usize) -> usize {
    if position.is_nan() {
        return 0;
    }
    let position = position.trunc();
    if position < 0.0 {
        (len as f64 + position).max(0.0) as usize
    } else {
        position.min(len as f64) as usize
    }
}

pub fn split(args: &[Value]) -> Result<Value> {
    require_args("split", args, 2)?;
    let text = string_arg(args, 0);
    let separator = string_arg(args, 1);

    let parts: Vec<Value> = if separator.is_empty() {
        text.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        text.split(separator.as_str())
            .map(|part| Value::String(part.to_string()))
            .collect()
    };
    Ok(Value::Array(parts))
}

pub fn join(args: &[Value]) -> Result<Value> {
    require_args("join", args, 1)?;
    let separator = optional_arg(args, 1)
        .map(Value::to_js_string)
        .unwrap_or_else(|| ",".to_string());

    let joined = match arg(args, 0) {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                if item.is_nullish() {
                    String::new()
                } else {
                    item.to_js_string()
                }
            })
            .collect::<Vec<_>>()
            .join(&separator),
        other => other.to_js_string(),
    };
    Ok(Value::String(joined))
}

pub fn concat(args: &[Value]) -> Result<Value> {
    Ok(Value::String(
        args.iter().map(Value::to_js_string).collect::<String>(),
    ))
}

pub fn includes(args: &[Value]) -> Result<Value> {
    require_args("includes", args, 2)?;
    Ok(Value::Bool(
        string_arg(args, 0).contains(string_arg(args, 1).as_str()),
    ))
}

pub fn index_of(args: &[Value]) -> Result<Value> {
    require_args("indexOf", args, 2)?;
    let chars: Vec<char> = string_arg(args, 0).chars().collect();
    let needle: Vec<char> = string_arg(args, 1).chars().collect();
    let from = optional_arg(args, 2)
        .map(|from| relative_index(from.to_number().max(0.0), chars.len()))
        .unwrap_or(0);

    let found = (from..=chars.len())
        .find(|&start| chars[start..].starts_with(&needle));
    Ok(Value::Number(found.map(|i| i as f64).unwrap_or(-1.0)))
}

pub fn last_index_of(args: &[Value]) -> Result<Value> {
    require_args("lastIndexOf", args, 2)?;
    let chars: Vec<char> = string_arg(args, 0).chars().collect();
    let needle: Vec<char> = string_arg(args, 1).chars().collect();

    let found = (0..=chars.len())
        .rev()
        .find(|&start| chars[start..].starts_with(&needle));
    Ok(Value::Number(found.map(|i| i as f64).unwrap_or(-1.0)))
}

pub fn to_upper_case(args: &[Value]) -> Result<Value> {
    require_args("toUpperCase", args, 1)?;
    Ok(Value::String(string_arg(args, 0).to_uppercase()))
}

pub fn to_lower_case(args: &[Value]) -> Result<Value> {
    require_args("toLowerCase", args, 1)?;
    Ok(Value::String(string_arg(args, 0).to_lowercase()))
}

pub fn replace_all(args: &[Value]) -> Result<Value> {
    require_args("replaceAll", args, 3)?;
    let text = string_arg(args, 0);
    let find = string_arg(args, 1);
    let replacement = string_arg(args, 2);
    Ok(Value::String(text.replace(find.as_str(), &replacement)))
}
