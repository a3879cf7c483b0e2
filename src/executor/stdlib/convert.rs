//! Conversion functions

use anyhow::Result;

use super::{arg, require_args};
use crate::executor::types::Value;

pub fn bool(args: &[Value]) -> Result<Value> {
    require_args("bool", args, 1)?;
    Ok(Value::Bool(arg(args, 0).is_truthy()))
}

/// Template-literal string form; `undefined` becomes ""
pub fn string(args: &[Value]) -> Result<Value> {
    require_args("string", args, 1)?;
    Ok(Value::String(
        arg(args, 0).to_template_string().unwrap_or_default(),
    ))
}

pub fn number(args: &[Value]) -> Result<Value> {
    require_args("number", args, 1)?;
    Ok(Value::Number(arg(args, 0).to_number()))
}

pub fn json_stringify(args: &[Value]) -> Result<Value> {
    require_args("jsonstringify", args, 1)?;
    Ok(match arg(args, 0) {
        Value::Undefined => Value::Undefined,
        other => Value::String(other.to_json_string()),
    })
}

/// Parse JSON text, `null` when it is not valid JSON
pub fn json_parse(args: &[Value]) -> Result<Value> {
    require_args("jsonparse", args, 1)?;
    let text = arg(args, 0).to_js_string();
    Ok(serde_json::from_str::<Value>(&text).unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool() {
        assert_eq!(bool(&[Value::from("")]).unwrap(), Value::Bool(false));
        assert_eq!(bool(&[Value::from("0")]).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_string() {
        assert_eq!(string(&[Value::Number(1.5)]).unwrap(), Value::from("1.5"));
        assert_eq!(string(&[Value::Undefined]).unwrap(), Value::from(""));
        assert_eq!(
            string(&[Value::Array(vec![Value::Number(1.0)])]).unwrap(),
            Value::from("[1]")
        );
    }

    #[test]
    fn test_json_round_trip() {
        let parsed = json_parse(&[Value::from(r#"{"a":[1,2]}"#)]).unwrap();
        let Value::Object(map) = &parsed else {
            panic!("expected object, got {:?}", parsed);
        };
        assert_eq!(
            map.get("a"),
            Some(&Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]))
        );
        assert_eq!(
            json_stringify(&[parsed]).unwrap(),
            Value::from(r#"{"a":[1,2]}"#)
        );
    }

    #[test]
    fn test_json_parse_invalid_is_null() {
        assert_eq!(json_parse(&[Value::from("{oops")]).unwrap(), Value::Null);
    }
}
