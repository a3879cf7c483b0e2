//! Numeric functions

use anyhow::{bail, Result};

use super::{arg, optional_arg, require_args};
use crate::executor::types::values::{format_number, parse_radix};
use crate::executor::types::Value;

pub fn round(args: &[Value]) -> Result<Value> {
    require_args("round", args, 1)?;
    let n = arg(args, 0).to_number();
    // Math.round rounds halves towards +Infinity
    Ok(Value::Number((n + 0.5).floor()))
}

pub fn floor(args: &[Value]) -> Result<Value> {
    require_args("floor", args, 1)?;
    Ok(Value::Number(arg(args, 0).to_number().floor()))
}

pub fn ceil(args: &[Value]) -> Result<Value> {
    require_args("ceil", args, 1)?;
    Ok(Value::Number(arg(args, 0).to_number().ceil()))
}

pub fn abs(args: &[Value]) -> Result<Value> {
    require_args("abs", args, 1)?;
    Ok(Value::Number(arg(args, 0).to_number().abs()))
}

pub fn min(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(fold_numbers(args, f64::INFINITY, f64::min)))
}

pub fn max(args: &[Value]) -> Result<Value> {
    Ok(Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)))
}

/// Fold with NaN poisoning (`f64::min`/`max` would skip NaN)
fn fold_numbers(args: &[Value], init: f64, pick: fn(f64, f64) -> f64) -> f64 {
    args.iter().map(Value::to_number).fold(init, |acc, n| {
        if acc.is_nan() || n.is_nan() {
            f64::NAN
        } else {
            pick(acc, n)
        }
    })
}

/// `parseInt(value, 16)`: leading hex digits, optional sign and `0x` prefix
pub fn from_hex(args: &[Value]) -> Result<Value> {
    require_args("fromHex", args, 1)?;
    let text = arg(args, 0).to_js_string();
    let text = text.trim();

    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let rest = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .unwrap_or(rest);
    let digits: String = rest.chars().take_while(|c| c.is_ascii_hexdigit()).collect();

    let value = match parse_radix(&digits, 16) {
        Some(n) if negative => -n,
        Some(n) => n,
        None => f64::NAN,
    };
    Ok(Value::Number(value))
}

/// Lowercase hex of the integer part, zero-padded to `padding` digits
pub fn to_hex(args: &[Value]) -> Result<Value> {
    require_args("toHex", args, 1)?;
    let n = arg(args, 0).to_number();
    if !n.is_finite() {
        return Ok(Value::String(format_number(n)));
    }

    let padding = match optional_arg(args, 1).map(|p| p.to_number()) {
        Some(p) if p.is_finite() && p > f64::from(u16::MAX) => {
            bail!("toHex padding {} exceeds {}", format_number(p), u16::MAX)
        }
        Some(p) if p.is_finite() && p > 0.0 => p as usize,
        _ => 0,
    };

    let magnitude = n.trunc().abs();
    let mut digits = String::new();
    let mut rest = magnitude;
    while rest >= 1.0 {
        let digit = (rest % 16.0) as u32;
        digits.push(std::char::from_digit(digit, 16).unwrap_or('0'));
        rest = (rest / 16.0).floor();
    }
    if digits.is_empty() {
        digits.push('0');
    }
    let digits: String = digits.chars().rev().collect();

    let padded = format!("{:0>width$}", digits, width = padding);
    Ok(Value::String(if n < 0.0 && magnitude > 0.0 {
        format!("-{}", padded)
    } else {
        padded
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round(&[num(2.5)]).unwrap(), num(3.0));
        assert_eq!(round(&[num(-2.5)]).unwrap(), num(-2.0));
        assert_eq!(round(&["1.4".into()]).unwrap(), num(1.0));
    }

    #[test]
    fn test_to_hex_padding_limit() {
        assert_eq!(to_hex(&[num(255.0), num(4.0)]).unwrap(), "00ff".into());
        assert_eq!(to_hex(&[num(1.0), num(65535.0)]).unwrap().as_str().map(str::len), Some(65535));

        let err = to_hex(&[num(1.0), num(1e13)]).unwrap_err();
        assert!(err.to_string().contains("padding"), "{}", err);
        assert_eq!(to_hex(&[num(1.0), num(f64::INFINITY)]).unwrap(), "1".into());
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min(&[num(3.0), num(1.0), num(2.0)]).unwrap(), num(1.0));
        assert_eq!(max(&[num(3.0), "7".into()]).unwrap(), num(7.0));
        assert_eq!(max(&[]).unwrap(), num(f64::NEG_INFINITY));
        assert!(matches!(min(&[num(1.0), "x".into()]).unwrap(), Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_from_hex() {
        assert_eq!(from_hex(&["ff".into()]).unwrap(), num(255.0));
        assert_eq!(from_hex(&["0x1A".into()]).unwrap(), num(26.0));
        assert_eq!(from_hex(&["12zz".into()]).unwrap(), num(18.0));
        assert!(matches!(from_hex(&["zz".into()]).unwrap(), Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(&[num(255.0)]).unwrap(), Value::from("ff"));
        assert_eq!(to_hex(&[num(10.0), num(4.0)]).unwrap(), Value::from("000a"));
        assert_eq!(to_hex(&[num(0.0)]).unwrap(), Value::from("0"));
        assert_eq!(to_hex(&[num(-16.0)]).unwrap(), Value::from("-10"));
    }

    #[test]
    fn test_missing_argument_is_error() {
        assert!(floor(&[]).is_err());
    }
}
