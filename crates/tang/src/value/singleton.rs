//! Singleton Values (§3.1, §9 Design Notes).
//!
//! The specification's C heritage needs an `is_singleton` flag because C cannot
//! distinguish a heap allocation from a static cheaply. The Design Notes suggest
//! typing singleton references distinctly instead when the host language allows it;
//! full pointer-distinct typing would ripple through every call site that currently
//! takes `&Value` by value, so this implementation keeps the flag-based approach but
//! backs every singleton with a `OnceLock`-initialized template that is only ever
//! cloned, never mutated — "destroying" one is a no-op (`Value::destroy`) and
//! deep-copying one returns an equivalent singleton rather than allocating (see
//! `Value::deep_copy`). Structural equality between two calls to the same accessor
//! stands in for the pointer-identity test in §8's "Singleton identity" property.

use std::sync::OnceLock;

use super::{ErrorValue, Flags, Value, ValueData};
use crate::string::TangString;

fn singleton(data: ValueData, is_true: bool) -> Value {
    let is_error = matches!(data, ValueData::Error(_));
    Value {
        data,
        flags: Flags {
            is_true,
            is_error,
            is_singleton: true,
            ..Default::default()
        },
    }
}

static NULL: OnceLock<Value> = OnceLock::new();
static TRUE: OnceLock<Value> = OnceLock::new();
static FALSE: OnceLock<Value> = OnceLock::new();
static EMPTY_STRING: OnceLock<Value> = OnceLock::new();

pub fn null() -> Value {
    NULL.get_or_init(|| singleton(ValueData::Null, false)).clone()
}

pub fn truthy() -> Value {
    TRUE.get_or_init(|| singleton(ValueData::Boolean(true), true)).clone()
}

pub fn falsy() -> Value {
    FALSE.get_or_init(|| singleton(ValueData::Boolean(false), false)).clone()
}

pub fn empty_string() -> Value {
    EMPTY_STRING
        .get_or_init(|| singleton(ValueData::String(TangString::empty()), false))
        .clone()
}

macro_rules! error_singleton {
    ($fn_name:ident, $cell:ident, $kind:expr) => {
        static $cell: OnceLock<Value> = OnceLock::new();
        pub fn $fn_name() -> Value {
            $cell.get_or_init(|| singleton(ValueData::Error($kind), false)).clone()
        }
    };
}

error_singleton!(divide_by_zero, DIVIDE_BY_ZERO, ErrorValue::DivideByZero);
error_singleton!(modulo_by_zero, MODULO_BY_ZERO, ErrorValue::ModuloByZero);
error_singleton!(not_implemented_error, NOT_IMPLEMENTED, ErrorValue::NotImplemented);
error_singleton!(not_supported_error, NOT_SUPPORTED, ErrorValue::NotSupported);
error_singleton!(iterator_end, ITERATOR_END, ErrorValue::IteratorEnd);
error_singleton!(out_of_memory, OUT_OF_MEMORY, ErrorValue::OutOfMemory);

/// Dispatches to the matching cached singleton for well-known kinds, or builds a
/// fresh (non-singleton) error Value for an ad-hoc message.
pub fn error(kind: ErrorValue) -> Value {
    match kind {
        ErrorValue::DivideByZero => divide_by_zero(),
        ErrorValue::ModuloByZero => modulo_by_zero(),
        ErrorValue::NotImplemented => not_implemented_error(),
        ErrorValue::NotSupported => not_supported_error(),
        ErrorValue::IteratorEnd => iterator_end(),
        ErrorValue::OutOfMemory => out_of_memory(),
        ErrorValue::Message(m) => Value {
            data: ValueData::Error(ErrorValue::Message(m)),
            flags: Flags {
                is_error: true,
                ..Default::default()
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_singletons_carry_is_error_flag() {
        let e = error(ErrorValue::DivideByZero);
        assert!(e.is_error());
        assert!(e.is_singleton());
    }

    #[test]
    fn message_errors_are_not_singletons() {
        let e = error(ErrorValue::Message("boom".to_string()));
        assert!(e.is_error());
        assert!(!e.is_singleton());
    }
}
