//! Indexing, slicing, member access, iteration, and native calls (§3.1, §4.1).
//!
//! Invoking a script-defined `Function` Value is deliberately *not* handled here:
//! per §4.6, the `CALL` opcode inspects a `Function` Value directly and performs the
//! frame push/jump itself (the VM owns the pc/fp/call-stack discipline), so the
//! generic `call` entry point below only covers `NativeFunction`s, which can be
//! invoked immediately without VM involvement.

use super::{ErrorValue, HeapObject, Value, ValueData};
use crate::context::ExecutionContext;
use crate::gc::GcList;

fn not_implemented() -> Value {
    Value::error(ErrorValue::NotImplemented)
}

pub fn index_get(receiver: &Value, idx: &Value, gc: &GcList) -> Value {
    if receiver.is_error() {
        return receiver.clone();
    }
    if idx.is_error() {
        return idx.clone();
    }
    match (&receiver.data, &idx.data) {
        (ValueData::Array(id), ValueData::Integer(i)) => match gc.get(*id) {
            HeapObject::Array(elements) => {
                let normalized = normalize_index(*i, elements.len());
                elements
                    .get(normalized)
                    .cloned()
                    .map(|mut v| {
                        v.flags.is_temporary = true;
                        v
                    })
                    .unwrap_or_else(|| Value::error(ErrorValue::Message("array index out of range".to_string())))
            }
            _ => unreachable!(),
        },
        (ValueData::Map(id), ValueData::String(key)) => match gc.get(*id) {
            HeapObject::Map(entries) => entries
                .get(key.as_str())
                .cloned()
                .map(|mut v| {
                    v.flags.is_temporary = true;
                    v
                })
                .unwrap_or_else(|| Value::error(ErrorValue::Message(format!("no such key '{}'", key.as_str())))),
            _ => unreachable!(),
        },
        (ValueData::String(s), ValueData::Integer(i)) => {
            let normalized = normalize_index(*i, s.grapheme_len());
            if normalized >= s.grapheme_len() {
                Value::error(ErrorValue::Message("string index out of range".to_string()))
            } else {
                Value::string(s.substring(normalized, 1))
            }
        }
        _ => not_implemented(),
    }
}

fn normalize_index(i: i64, len: usize) -> usize {
    if i < 0 {
        (len as i64 + i).max(0) as usize
    } else {
        i as usize
    }
}

pub fn assign_index(receiver: &Value, idx: &Value, value: Value, gc: &mut GcList) -> Value {
    if receiver.is_error() {
        return receiver.clone();
    }
    match (&receiver.data, &idx.data) {
        (ValueData::Array(id), ValueData::Integer(i)) => {
            let HeapObject::Array(elements) = gc.get_mut(*id) else {
                unreachable!()
            };
            let normalized = normalize_index(*i, elements.len());
            if normalized >= elements.len() {
                return Value::error(ErrorValue::Message("array index out of range".to_string()));
            }
            elements[normalized] = value.clone();
            value
        }
        (ValueData::Map(id), ValueData::String(key)) => {
            let HeapObject::Map(entries) = gc.get_mut(*id) else {
                unreachable!()
            };
            entries.insert(key.as_str().to_string(), value.clone());
            value
        }
        _ => not_implemented(),
    }
}

pub fn slice(receiver: &Value, start: i64, end: Option<i64>, skip: i64, gc: &mut GcList) -> Value {
    if receiver.is_error() {
        return receiver.clone();
    }
    match &receiver.data {
        ValueData::String(s) => {
            let len = s.grapheme_len();
            let start = normalize_index(start, len).min(len);
            let end = end.map(|e| normalize_index(e, len)).unwrap_or(len).min(len);
            let count = end.saturating_sub(start);
            if skip == 1 {
                Value::string(s.substring(start, count))
            } else {
                // Stepped slicing builds the result grapheme-by-grapheme since
                // `TangString::substring` only models contiguous ranges.
                let mut result = crate::string::TangString::empty();
                let mut i = start;
                while i < end {
                    result = result.concat(&s.substring(i, 1));
                    i += skip.max(1);
                }
                Value::string(result)
            }
        }
        ValueData::Array(id) => {
            let HeapObject::Array(elements) = gc.get(*id) else {
                unreachable!()
            };
            let len = elements.len();
            let start = normalize_index(start, len).min(len);
            let end = end.map(|e| normalize_index(e, len)).unwrap_or(len).min(len);
            let mut out = Vec::new();
            let mut i = start;
            while i < end {
                out.push(elements[i].clone());
                i += skip.max(1) as usize;
            }
            let new_id = gc.register(HeapObject::Array(out));
            Value::reference(ValueData::Array(new_id), false)
        }
        _ => not_implemented(),
    }
}

/// Member access (`.name`). Per §4.1, the generic default "walks the operation
/// table's attribute table" — `Library` values carry one directly; `Rng` values
/// expose `next_int`/`next_float`/`next_bool` as zero-argument draws that mutate
/// the generator in place, per §6.4 ("per-RNG `next_int`, `next_float`,
/// `next_bool`"), rather than returning a bound callable.
pub fn period(receiver: &Value, name: &str, ctx: &mut ExecutionContext) -> Value {
    if receiver.is_error() {
        return receiver.clone();
    }
    match &receiver.data {
        ValueData::Library(id) => {
            let hash = crate::scope::hash_identifier(name);
            let attr = match ctx.gc.get(*id) {
                HeapObject::Library(lib) => lib.attrs.get(&hash).copied(),
                _ => unreachable!(),
            };
            match attr {
                Some(super::LibraryAttr::Value(f)) => f(),
                Some(super::LibraryAttr::Function(callback)) => {
                    let bound = receiver.clone();
                    let id = ctx.gc.register(HeapObject::NativeFunction {
                        name: name.to_string(),
                        callback,
                        bound_receiver: Some(Box::new(bound)),
                    });
                    Value::reference(ValueData::NativeFunction(id), false)
                }
                None => Value::error(ErrorValue::Message(format!("no such attribute '{name}'"))),
            }
        }
        ValueData::Rng(id) => {
            let HeapObject::Rng(rng) = ctx.gc.get_mut(*id) else { unreachable!() };
            match name {
                "next_int" => Value::integer(rng.state.next_u64() as i64),
                "next_float" => Value::float(rng.state.next_u64() as f64 / u64::MAX as f64),
                "next_bool" => Value::boolean(rng.state.next_u64() & 1 == 1),
                _ => Value::error(ErrorValue::Message(format!("no such attribute '{name}'"))),
            }
        }
        _ => not_implemented(),
    }
}

/// Invokes a `NativeFunction` Value directly. Script-defined `Function` values are
/// rejected here; the VM's `CALL` opcode never routes through this path for them.
pub fn call(receiver: &Value, args: &[Value], ctx: &mut ExecutionContext) -> Value {
    if receiver.is_error() {
        return receiver.clone();
    }
    let ValueData::NativeFunction(id) = &receiver.data else {
        return not_implemented();
    };
    let (callback, bound) = match ctx.gc.get(*id) {
        HeapObject::NativeFunction {
            callback, bound_receiver, ..
        } => (*callback, bound_receiver.clone()),
        _ => unreachable!(),
    };
    let mut full_args = Vec::with_capacity(args.len() + 1);
    if let Some(receiver) = bound {
        full_args.push(*receiver);
    }
    full_args.extend_from_slice(args);
    callback(ctx, &full_args)
}

pub fn iterator_get(receiver: &Value, gc: &mut GcList) -> Value {
    if receiver.is_error() {
        return receiver.clone();
    }
    match &receiver.data {
        ValueData::Array(_) | ValueData::String(_) => {
            let id = gc.register(HeapObject::Iterator {
                source: Box::new(receiver.clone()),
                position: 0,
            });
            Value::reference(ValueData::Iterator(id), false)
        }
        _ => not_implemented(),
    }
}

/// Returns `(value, has_more)`. When exhausted, `value` is the `iterator_end` error
/// singleton and `has_more` is `false`, matching the VM's `ITERATOR_NEXT` contract
/// (§4.3/§4.5: "leaves the value and a boolean on the stack").
pub fn iterator_next(receiver: &Value, gc: &mut GcList) -> (Value, bool) {
    let ValueData::Iterator(id) = &receiver.data else {
        return (not_implemented(), false);
    };
    let id = *id;
    let (source, position) = match gc.get(id) {
        HeapObject::Iterator { source, position } => (source.as_ref().clone(), *position),
        _ => unreachable!(),
    };
    let (value, len) = match &source.data {
        ValueData::Array(arr_id) => {
            let HeapObject::Array(elements) = gc.get(*arr_id) else {
                unreachable!()
            };
            (elements.get(position).cloned(), elements.len())
        }
        ValueData::String(s) => {
            if position < s.grapheme_len() {
                (Some(Value::string(s.substring(position, 1))), s.grapheme_len())
            } else {
                (None, s.grapheme_len())
            }
        }
        _ => (None, 0),
    };
    if position >= len {
        return (Value::error(ErrorValue::IteratorEnd), false);
    }
    let HeapObject::Iterator { position: slot, .. } = gc.get_mut(id) else {
        unreachable!()
    };
    *slot += 1;
    match value {
        Some(mut v) => {
            v.flags.is_temporary = true;
            (v, true)
        }
        None => (Value::error(ErrorValue::IteratorEnd), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::string::{StringType, TangString};

    #[test]
    fn array_index_reads_element() {
        let mut gc = GcList::new();
        let id = gc.register(HeapObject::Array(vec![Value::integer(10), Value::integer(20)]));
        let arr = Value::reference(ValueData::Array(id), false);
        let result = index_get(&arr, &Value::integer(1), &gc);
        assert!(matches!(result.data, ValueData::Integer(20)));
    }

    #[test]
    fn negative_index_wraps_from_end() {
        let mut gc = GcList::new();
        let id = gc.register(HeapObject::Array(vec![Value::integer(10), Value::integer(20), Value::integer(30)]));
        let arr = Value::reference(ValueData::Array(id), false);
        let result = index_get(&arr, &Value::integer(-1), &gc);
        assert!(matches!(result.data, ValueData::Integer(30)));
    }

    #[test]
    fn iterator_over_array_yields_then_ends() {
        let mut gc = GcList::new();
        let id = gc.register(HeapObject::Array(vec![Value::integer(1), Value::integer(2)]));
        let arr = Value::reference(ValueData::Array(id), false);
        let iter = iterator_get(&arr, &mut gc);
        let (v1, more1) = iterator_next(&iter, &mut gc);
        assert!(more1);
        assert!(matches!(v1.data, ValueData::Integer(1)));
        let (v2, more2) = iterator_next(&iter, &mut gc);
        assert!(more2);
        assert!(matches!(v2.data, ValueData::Integer(2)));
        let (_, more3) = iterator_next(&iter, &mut gc);
        assert!(!more3);
    }

    #[test]
    fn string_substring_is_grapheme_indexed() {
        let s = Value::string(TangString::new("hello", StringType::Trusted));
        let gc = GcList::new();
        let result = index_get(&s, &Value::integer(1), &gc);
        assert!(matches!(result.data, ValueData::String(_)));
    }
}
