//! Arithmetic, logical, comparison, and cast operations for [`super::Value`] (§4.1).
//!
//! Each entry point here is the Value Kernel's "generic entry point [that] dispatches
//! via the operation table" — in this match-based mapping, dispatch is the `match` on
//! both operands' `ValueData` discriminants. Unsupported operand combinations return
//! the `not_supported` singleton, and [`binary_dispatch`] implements the mandated
//! retry-with-swapped-operands protocol (§4.1, §7) before giving up.

use super::{ErrorValue, Value, ValueData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Int,
    Float,
    Bool,
    String,
}

/// Numeric promotion: two integers stay integers; any float operand promotes both
/// sides to float (§4.1: "Mixed Integer/Float promotes to Float").
enum Numeric {
    Int(i64, i64),
    Float(f64, f64),
}

fn promote(lhs: &ValueData, rhs: &ValueData) -> Option<Numeric> {
    match (lhs, rhs) {
        (ValueData::Integer(a), ValueData::Integer(b)) => Some(Numeric::Int(*a, *b)),
        (ValueData::Integer(a), ValueData::Float(b)) => Some(Numeric::Float(*a as f64, *b)),
        (ValueData::Float(a), ValueData::Integer(b)) => Some(Numeric::Float(*a, *b as f64)),
        (ValueData::Float(a), ValueData::Float(b)) => Some(Numeric::Float(*a, *b)),
        _ => None,
    }
}

fn not_supported() -> Value {
    Value::error(ErrorValue::NotSupported)
}

fn not_implemented() -> Value {
    Value::error(ErrorValue::NotImplemented)
}

/// If either operand is already an error, it propagates per §7 ("any operation with
/// an error operand returns the error").
fn propagate_error(lhs: &Value, rhs: &Value) -> Option<Value> {
    if lhs.is_error() {
        Some(lhs.clone())
    } else if rhs.is_error() {
        Some(rhs.clone())
    } else {
        None
    }
}

fn add(lhs: &Value, rhs: &Value) -> Value {
    if let Some(e) = propagate_error(lhs, rhs) {
        return e;
    }
    match promote(&lhs.data, &rhs.data) {
        Some(Numeric::Int(a, b)) => Value::integer(a.wrapping_add(b)),
        Some(Numeric::Float(a, b)) => Value::float(a + b),
        None => match (&lhs.data, &rhs.data) {
            (ValueData::String(a), ValueData::String(b)) => Value::string(a.concat(b)),
            _ => not_supported(),
        },
    }
}

fn subtract(lhs: &Value, rhs: &Value) -> Value {
    if let Some(e) = propagate_error(lhs, rhs) {
        return e;
    }
    match promote(&lhs.data, &rhs.data) {
        Some(Numeric::Int(a, b)) => Value::integer(a.wrapping_sub(b)),
        Some(Numeric::Float(a, b)) => Value::float(a - b),
        None => not_supported(),
    }
}

fn multiply(lhs: &Value, rhs: &Value) -> Value {
    if let Some(e) = propagate_error(lhs, rhs) {
        return e;
    }
    match promote(&lhs.data, &rhs.data) {
        Some(Numeric::Int(a, b)) => Value::integer(a.wrapping_mul(b)),
        Some(Numeric::Float(a, b)) => Value::float(a * b),
        None => not_supported(),
    }
}

fn divide(lhs: &Value, rhs: &Value) -> Value {
    if let Some(e) = propagate_error(lhs, rhs) {
        return e;
    }
    match promote(&lhs.data, &rhs.data) {
        Some(Numeric::Int(_, 0)) => Value::error(ErrorValue::DivideByZero),
        Some(Numeric::Int(a, b)) => Value::integer(a.wrapping_div(b)),
        Some(Numeric::Float(a, b)) => {
            if b == 0.0 {
                Value::error(ErrorValue::DivideByZero)
            } else {
                Value::float(a / b)
            }
        }
        None => not_supported(),
    }
}

fn modulo(lhs: &Value, rhs: &Value) -> Value {
    if let Some(e) = propagate_error(lhs, rhs) {
        return e;
    }
    match promote(&lhs.data, &rhs.data) {
        Some(Numeric::Int(_, 0)) => Value::error(ErrorValue::ModuloByZero),
        Some(Numeric::Int(a, b)) => Value::integer(a.wrapping_rem(b)),
        Some(Numeric::Float(a, b)) => {
            if b == 0.0 {
                Value::error(ErrorValue::ModuloByZero)
            } else {
                Value::float(a % b)
            }
        }
        None => not_supported(),
    }
}

pub fn negate(v: &Value) -> Value {
    if v.is_error() {
        return v.clone();
    }
    match &v.data {
        ValueData::Integer(i) => Value::integer(-i),
        ValueData::Float(f) => Value::float(-f),
        _ => not_implemented(),
    }
}

pub fn logical_not(v: &Value) -> Value {
    if v.is_error() {
        return v.clone();
    }
    Value::boolean(!v.truthy())
}

fn numeric_order(lhs: &Value, rhs: &Value) -> Option<std::cmp::Ordering> {
    match promote(&lhs.data, &rhs.data) {
        Some(Numeric::Int(a, b)) => Some(a.cmp(&b)),
        Some(Numeric::Float(a, b)) => a.partial_cmp(&b),
        None => match (&lhs.data, &rhs.data) {
            (ValueData::String(a), ValueData::String(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        },
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    if let Some(e) = propagate_error(lhs, rhs) {
        return e;
    }
    let Some(ord) = numeric_order(lhs, rhs) else {
        return not_supported();
    };
    use std::cmp::Ordering::*;
    let result = match op {
        BinaryOp::LessThan => ord == Less,
        BinaryOp::LessThanEqual => ord != Greater,
        BinaryOp::GreaterThan => ord == Greater,
        BinaryOp::GreaterThanEqual => ord != Less,
        _ => unreachable!(),
    };
    Value::boolean(result)
}

/// Structural equality across numerically/textually comparable kinds; `==`/`!=` on
/// incomparable kinds (e.g. Array vs Integer) is simply `false`/`true`, not an error —
/// only an operand that is *itself* an error propagates (§4.1).
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (&lhs.data, &rhs.data) {
        (ValueData::Null, ValueData::Null) => true,
        (ValueData::Boolean(a), ValueData::Boolean(b)) => a == b,
        (ValueData::String(a), ValueData::String(b)) => a.as_str() == b.as_str(),
        (ValueData::Array(a), ValueData::Array(b)) => a == b,
        (ValueData::Map(a), ValueData::Map(b)) => a == b,
        (ValueData::Function(a), ValueData::Function(b)) => a == b,
        (ValueData::Library(a), ValueData::Library(b)) => a == b,
        _ => matches!(numeric_order(lhs, rhs), Some(std::cmp::Ordering::Equal)),
    }
}

fn and(lhs: &Value, rhs: &Value) -> Value {
    if let Some(e) = propagate_error(lhs, rhs) {
        return e;
    }
    Value::boolean(lhs.truthy() && rhs.truthy())
}

fn or(lhs: &Value, rhs: &Value) -> Value {
    if let Some(e) = propagate_error(lhs, rhs) {
        return e;
    }
    Value::boolean(lhs.truthy() || rhs.truthy())
}

/// Top-level dispatcher implementing the retry-with-swapped-operands protocol:
/// §4.1 "A binary operation returning the `not_supported` error is the signal that
/// the caller should retry with operands swapped"; §7 "Only if the retry also
/// returns `not_supported` is the error surfaced."
pub fn binary_dispatch(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    let result = apply(op, lhs, rhs);
    if matches!(&result.data, ValueData::Error(ErrorValue::NotSupported)) {
        let retry = apply(op, rhs, lhs);
        if matches!(&retry.data, ValueData::Error(ErrorValue::NotSupported)) {
            return result;
        }
        return retry;
    }
    result
}

fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> Value {
    match op {
        BinaryOp::Add => add(lhs, rhs),
        BinaryOp::Subtract => subtract(lhs, rhs),
        BinaryOp::Multiply => multiply(lhs, rhs),
        BinaryOp::Divide => divide(lhs, rhs),
        BinaryOp::Modulo => modulo(lhs, rhs),
        BinaryOp::LessThan | BinaryOp::LessThanEqual | BinaryOp::GreaterThan | BinaryOp::GreaterThanEqual => {
            compare(op, lhs, rhs)
        }
        BinaryOp::Equal => {
            if let Some(e) = propagate_error(lhs, rhs) {
                e
            } else {
                Value::boolean(values_equal(lhs, rhs))
            }
        }
        BinaryOp::NotEqual => {
            if let Some(e) = propagate_error(lhs, rhs) {
                e
            } else {
                Value::boolean(!values_equal(lhs, rhs))
            }
        }
        BinaryOp::And => and(lhs, rhs),
        BinaryOp::Or => or(lhs, rhs),
    }
}

pub fn cast(v: &Value, target: CastType) -> Value {
    if v.is_error() {
        return v.clone();
    }
    match (target, &v.data) {
        (CastType::Int, ValueData::Integer(_)) => v.clone(),
        (CastType::Int, ValueData::Float(f)) => Value::integer(*f as i64),
        (CastType::Int, ValueData::Boolean(b)) => Value::integer(i64::from(*b)),
        (CastType::Int, ValueData::String(s)) => s.as_str().trim().parse::<i64>().map(Value::integer).unwrap_or_else(|_| not_implemented()),
        (CastType::Float, ValueData::Float(_)) => v.clone(),
        (CastType::Float, ValueData::Integer(i)) => Value::float(*i as f64),
        (CastType::Float, ValueData::Boolean(b)) => Value::float(if *b { 1.0 } else { 0.0 }),
        (CastType::Float, ValueData::String(s)) => s.as_str().trim().parse::<f64>().map(Value::float).unwrap_or_else(|_| not_implemented()),
        (CastType::Bool, _) => Value::boolean(v.truthy()),
        (CastType::String, ValueData::String(_)) => v.clone(),
        (CastType::String, ValueData::Integer(i)) => Value::string(crate::string::TangString::new(i.to_string(), crate::string::StringType::Trusted)),
        (CastType::String, ValueData::Float(f)) => Value::string(crate::string::TangString::new(super::format_float(*f), crate::string::StringType::Trusted)),
        (CastType::String, ValueData::Boolean(b)) => Value::string(crate::string::TangString::new(b.to_string(), crate::string::StringType::Trusted)),
        _ => not_implemented(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_by_zero_is_the_error_singleton() {
        let result = binary_dispatch(BinaryOp::Divide, &Value::integer(10), &Value::integer(0));
        assert!(result.is_error());
        assert!(matches!(result.data, ValueData::Error(ErrorValue::DivideByZero)));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_float() {
        let result = binary_dispatch(BinaryOp::Add, &Value::integer(1), &Value::float(2.5));
        assert!(matches!(result.data, ValueData::Float(v) if v == 3.5));
    }

    #[test]
    fn unsupported_combo_reports_not_supported_after_retry() {
        let arr_id_lhs = Value::integer(1);
        let lib = Value::string(crate::string::TangString::new("x", crate::string::StringType::Trusted));
        // Integer + String is unsupported in both orders.
        let result = binary_dispatch(BinaryOp::Subtract, &arr_id_lhs, &lib);
        assert!(matches!(result.data, ValueData::Error(ErrorValue::NotSupported)));
    }
}
