//! Operator semantics
//!
//! Arithmetic, bitwise and relational operators coerce both operands to
//! numbers first, so `'1' + '2'` is `3`: string concatenation only happens in
//! template literals. Equality and the logical operators work on the raw
//! values.

use super::types::values::to_int32;
use super::types::{BinaryOp, UnaryOp, UpdateOp, Value};
use super::ResolveError;

/* ===================== Unary ===================== */

pub fn unary(op: UnaryOp, value: &Value) -> Value {
    match op {
        UnaryOp::Neg => Value::Number(-value.to_number()),
        UnaryOp::Plus => Value::Number(value.to_number()),
        UnaryOp::Not => Value::Bool(!value.is_truthy()),
        UnaryOp::BitNot => Value::Number(!to_int32(value.to_number()) as f64),
    }
}

/// Numeric result of applying `++`/`--` to the old value
pub fn update(op: UpdateOp, old: &Value) -> f64 {
    match op {
        UpdateOp::Increment => old.to_number() + 1.0,
        UpdateOp::Decrement => old.to_number() - 1.0,
    }
}

/* ===================== Binary ===================== */

/// Apply a binary operator to two already evaluated operands
///
/// The logical operators are normally short-circuited by the evaluator;
/// here they only select between the two values.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ResolveError> {
    let value = match op {
        BinaryOp::And => {
            if left.is_truthy() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOp::Or => {
            if left.is_truthy() {
                left.clone()
            } else {
                right.clone()
            }
        }
        BinaryOp::Nullish => {
            if left.is_nullish() {
                right.clone()
            } else {
                left.clone()
            }
        }
        BinaryOp::LooseEq => Value::Bool(loose_equals(left, right)),
        BinaryOp::LooseNe => Value::Bool(!loose_equals(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNe => Value::Bool(!strict_equals(left, right)),
        BinaryOp::Assign(assign) => {
            return Err(ResolveError::UnsupportedOperator {
                operator: assign.as_str().to_string(),
            })
        }
        numeric => numeric_binary(numeric, left.to_number(), right.to_number())?,
    };
    Ok(value)
}

fn numeric_binary(op: BinaryOp, l: f64, r: f64) -> Result<Value, ResolveError> {
    let value = match op {
        BinaryOp::Add => Value::Number(l + r),
        BinaryOp::Sub => Value::Number(l - r),
        BinaryOp::Mul => Value::Number(l * r),
        BinaryOp::Div => Value::Number(l / r),
        BinaryOp::Rem => Value::Number(l % r),
        BinaryOp::Pow => Value::Number(pow(l, r)),
        BinaryOp::BitAnd => Value::Number((to_int32(l) & to_int32(r)) as f64),
        BinaryOp::BitOr => Value::Number((to_int32(l) | to_int32(r)) as f64),
        BinaryOp::BitXor => Value::Number((to_int32(l) ^ to_int32(r)) as f64),
        BinaryOp::Shl => Value::Number(to_int32(l).wrapping_shl(shift_count(r)) as f64),
        BinaryOp::Shr => Value::Number(to_int32(l).wrapping_shr(shift_count(r)) as f64),
        BinaryOp::Lt => Value::Bool(l < r),
        BinaryOp::Gt => Value::Bool(l > r),
        BinaryOp::Le => Value::Bool(l <= r),
        BinaryOp::Ge => Value::Bool(l >= r),
        other => {
            return Err(ResolveError::UnsupportedOperator {
                operator: other.as_str().to_string(),
            })
        }
    };
    Ok(value)
}

fn shift_count(n: f64) -> u32 {
    (to_int32(n) as u32) & 31
}

/// `**` with the JS edge cases `powf` disagrees on
pub fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() {
        return f64::NAN;
    }
    if exponent.is_infinite() && base.abs() == 1.0 {
        return f64::NAN;
    }
    base.powf(exponent)
}

/* ===================== Equality ===================== */

/// `===`
///
/// Arrays and objects have no identity here, so they compare structurally.
pub fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| strict_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((ka, va), (kb, vb))| ka == kb && strict_equals(va, vb))
        }
        _ => false,
    }
}

/// `==`
pub fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (Value::Number(a), Value::String(_)) => *a == right.to_number(),
        (Value::String(_), Value::Number(b)) => left.to_number() == *b,
        (Value::Bool(_), _) => loose_equals(&Value::Number(left.to_number()), right),
        (_, Value::Bool(_)) => loose_equals(left, &Value::Number(right.to_number())),
        (Value::Array(_) | Value::Object(_), Value::Number(_) | Value::String(_)) => {
            loose_equals(&Value::String(left.to_js_string()), right)
        }
        (Value::Number(_) | Value::String(_), Value::Array(_) | Value::Object(_)) => {
            loose_equals(left, &Value::String(right.to_js_string()))
        }
        _ => strict_equals(left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_add_coerces_strings() {
        let result = binary(BinaryOp::Add, &"1".into(), &"2".into()).unwrap();
        assert_eq!(result, num(3.0));
    }

    #[test]
    fn test_add_undefined_is_nan() {
        let result = binary(BinaryOp::Add, &Value::Undefined, &num(1.0)).unwrap();
        assert!(matches!(result, Value::Number(n) if n.is_nan()));
    }

    #[test]
    fn test_bitwise_xor() {
        assert_eq!(binary(BinaryOp::BitXor, &num(6.0), &num(3.0)).unwrap(), num(5.0));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(binary(BinaryOp::Shl, &num(1.0), &num(4.0)).unwrap(), num(16.0));
        assert_eq!(binary(BinaryOp::Shr, &num(-16.0), &num(2.0)).unwrap(), num(-4.0));
        assert_eq!(binary(BinaryOp::Shl, &num(1.0), &num(33.0)).unwrap(), num(2.0));
    }

    #[test]
    fn test_remainder_keeps_dividend_sign() {
        assert_eq!(binary(BinaryOp::Rem, &num(-7.0), &num(3.0)).unwrap(), num(-1.0));
    }

    #[test]
    fn test_relational_coerces() {
        assert_eq!(binary(BinaryOp::Lt, &"2".into(), &"10".into()).unwrap(), Value::Bool(true));
        assert_eq!(binary(BinaryOp::Lt, &"a".into(), &"b".into()).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_pow_edge_cases() {
        assert!(pow(1.0, f64::NAN).is_nan());
        assert!(pow(-1.0, f64::INFINITY).is_nan());
        assert_eq!(pow(2.0, 10.0), 1024.0);
        assert_eq!(pow(f64::NAN, 0.0), 1.0);
    }

    #[test]
    fn test_loose_equality() {
        assert!(loose_equals(&Value::Null, &Value::Undefined));
        assert!(!loose_equals(&Value::Null, &num(0.0)));
        assert!(loose_equals(&num(1.0), &"1".into()));
        assert!(loose_equals(&Value::Bool(true), &num(1.0)));
        assert!(loose_equals(&Value::Array(vec![num(5.0)]), &"5".into()));
        assert!(!loose_equals(&num(f64::NAN), &num(f64::NAN)));
    }

    #[test]
    fn test_strict_equality() {
        assert!(!strict_equals(&num(1.0), &"1".into()));
        assert!(strict_equals(&num(0.0), &num(-0.0)));
        assert!(strict_equals(
            &Value::Array(vec![num(1.0)]),
            &Value::Array(vec![num(1.0)])
        ));
        assert!(!strict_equals(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Neg, &"5".into()), num(-5.0));
        assert_eq!(unary(UnaryOp::Not, &num(0.0)), Value::Bool(true));
        assert_eq!(unary(UnaryOp::BitNot, &num(5.0)), num(-6.0));
        assert_eq!(unary(UnaryOp::Plus, &Value::Null), num(0.0));
    }

    #[test]
    fn test_assignment_operator_is_not_binary() {
        let err = binary(BinaryOp::Assign(crate::executor::types::AssignOp::Add), &num(1.0), &num(1.0))
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedOperator { operator } if operator == "+="));
    }
}
