//! The Value Kernel (§3.1, §4.1): the runtime value representation, its polymorphic
//! operation table, and the flags that drive the temporary/deep-copy/singleton
//! discipline described throughout the specification.
//!
//! A C-style vtable (a struct of function pointers per variant) would be the literal
//! translation of the original design; idiomatic Rust instead dispatches through a
//! `match` on [`ValueData`]'s discriminant inside each operation's entry point (see
//! `arith.rs`, `index.rs`), mirroring how the teacher's `PyTrait` impl for `Value`
//! (`examples/scostello-monty/crates/monty/src/value.rs`) centralizes per-variant
//! behavior in trait methods rather than a literal function-pointer table.

mod arith;
mod heap_data;
mod index;
pub mod singleton;

pub use arith::{binary_dispatch, cast, logical_not, negate, BinaryOp, CastType};
pub use heap_data::{FunctionObject, HeapObject, LibraryAttr, LibraryObject, NativeFn, RngObject};
pub use index::{assign_index, call, index_get, iterator_get, iterator_next, period, slice};

use crate::gc::{GcId, GcList};
use crate::string::TangString;

/// Flags carried by every `Value` occurrence, per §3.1.
///
/// These travel with the *occurrence* (a stack slot, a local variable, a freshly
/// returned result), not with the underlying heap payload, since the same heap
/// object can be referenced as temporary in one place and non-temporary in another
/// (e.g. after a `POKE_LOCAL` clears the flag on the stored copy but the expression
/// result left on the stack is a different occurrence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags {
    pub is_true: bool,
    pub is_error: bool,
    pub is_temporary: bool,
    pub requires_deep_copy: bool,
    pub is_singleton: bool,
    pub is_a_reference: bool,
}

/// A well-known or ad-hoc runtime error, per §7.
///
/// The well-known kinds are singletons; `Message` carries a one-off diagnostic (e.g.
/// a type-mismatch description) and is never a singleton.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorValue {
    DivideByZero,
    ModuloByZero,
    NotImplemented,
    NotSupported,
    IteratorEnd,
    OutOfMemory,
    Message(String),
}

impl ErrorValue {
    pub fn is_well_known(&self) -> bool {
        !matches!(self, Self::Message(_))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::DivideByZero => "Error: division by zero".to_string(),
            Self::ModuloByZero => "Error: modulo by zero".to_string(),
            Self::NotImplemented => "Error: operation not implemented".to_string(),
            Self::NotSupported => "Error: operation not supported".to_string(),
            Self::IteratorEnd => "Error: iterator exhausted".to_string(),
            Self::OutOfMemory => "Error: out of memory".to_string(),
            Self::Message(m) => format!("Error: {m}"),
        }
    }
}

/// The payload of a [`Value`]: the thirteen variants from §3.1.
///
/// Composite/reference variants (`Array`, `Map`, `Iterator`, `Function`,
/// `NativeFunction`, `Library`, `Rng`) hold a [`GcId`] pointing into the owning
/// Context's [`GcList`], which is where the actual [`HeapObject`] lives. Scalars
/// (`Null`, `Boolean`, `Integer`, `Float`, `String`, `Error`) are held inline: they
/// are `Copy`-cheap or uniquely owned already, so registering them in the GC list
/// would add bookkeeping with no payoff in a safe language (see the arena mapping
/// note in `SPEC_FULL.md` §3).
#[derive(Debug, Clone)]
pub enum ValueData {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(TangString),
    Array(GcId),
    Map(GcId),
    Iterator(GcId),
    Function(GcId),
    NativeFunction(GcId),
    Library(GcId),
    Rng(GcId),
    Error(ErrorValue),
}

/// A runtime Value: payload plus flags.
#[derive(Debug, Clone)]
pub struct Value {
    pub data: ValueData,
    pub flags: Flags,
}

impl Value {
    fn scalar(data: ValueData, is_true: bool) -> Self {
        Self {
            data,
            flags: Flags {
                is_true,
                is_temporary: true,
                ..Default::default()
            },
        }
    }

    pub fn integer(v: i64) -> Self {
        Self::scalar(ValueData::Integer(v), v != 0)
    }

    pub fn float(v: f64) -> Self {
        Self::scalar(ValueData::Float(v), v != 0.0)
    }

    pub fn string(s: TangString) -> Self {
        let is_true = !s.is_empty();
        Self::scalar(ValueData::String(s), is_true)
    }

    pub fn reference(data: ValueData, is_a_reference: bool) -> Self {
        Self {
            data,
            flags: Flags {
                is_true: true,
                is_temporary: true,
                is_a_reference,
                ..Default::default()
            },
        }
    }

    pub fn null() -> Self {
        singleton::null()
    }

    pub fn boolean(v: bool) -> Self {
        if v {
            singleton::truthy()
        } else {
            singleton::falsy()
        }
    }

    pub fn empty_string() -> Self {
        singleton::empty_string()
    }

    pub fn error(kind: ErrorValue) -> Self {
        singleton::error(kind)
    }

    pub fn is_error(&self) -> bool {
        self.flags.is_error
    }

    pub fn is_singleton(&self) -> bool {
        self.flags.is_singleton
    }

    pub fn is_temporary(&self) -> bool {
        self.flags.is_temporary
    }

    /// Marks a value as non-temporary without copying it — the `SET_NOT_TEMP`
    /// opcode (§4.3) and the `POKE_LOCAL`/`POKE_GLOBAL` adoption rule (§4.6).
    pub fn set_not_temporary(&mut self) {
        self.flags.is_temporary = false;
    }

    /// The inverse: marks a value temporary again when it is safe to do so — the
    /// `ADOPT` opcode (§4.3), used when handing a freshly loaded reference into an
    /// operation that will consume it exactly once.
    pub fn adopt(&mut self) {
        self.flags.is_temporary = true;
    }

    /// Destroys a value. A no-op for singletons (§3.1 invariant); for GC-backed
    /// variants the actual deallocation happens when the owning [`GcList`] is
    /// dropped at Context teardown, so `destroy` here only needs to honor the
    /// no-op contract for singletons and is otherwise a deliberate no-op too — Tang
    /// never reclaims mid-run (§3.1 "there is no intra-run reclamation").
    pub fn destroy(&self) {}

    /// Deep-copies a value. Singletons return themselves unchanged (§3.1: "deep-copy
    /// returns the same object"); composite values are recursively copied and
    /// re-registered in `gc` so the copy has independent identity from the original.
    pub fn deep_copy(&self, gc: &mut GcList) -> Value {
        if self.flags.is_singleton {
            return self.clone();
        }
        let mut copy = match &self.data {
            ValueData::Array(id) => {
                let elements = match gc.get(*id) {
                    HeapObject::Array(v) => v.clone(),
                    _ => unreachable!("Array GcId must point at HeapObject::Array"),
                };
                let copied: Vec<Value> = elements.iter().map(|v| v.deep_copy(gc)).collect();
                let new_id = gc.register(HeapObject::Array(copied));
                Value::reference(ValueData::Array(new_id), false)
            }
            ValueData::Map(id) => {
                let entries = match gc.get(*id) {
                    HeapObject::Map(m) => m.clone(),
                    _ => unreachable!("Map GcId must point at HeapObject::Map"),
                };
                let copied = entries
                    .into_iter()
                    .map(|(k, v)| (k, v.deep_copy(gc)))
                    .collect();
                let new_id = gc.register(HeapObject::Map(copied));
                Value::reference(ValueData::Map(new_id), false)
            }
            _ => self.clone(),
        };
        copy.flags.is_temporary = true;
        copy
    }

    /// The generic `to_string` entry point (§4.1). Composite variants need `gc` to
    /// read their elements; scalars ignore it.
    pub fn to_display_string(&self, gc: &GcList) -> String {
        match &self.data {
            ValueData::Null => "null".to_string(),
            ValueData::Boolean(b) => b.to_string(),
            ValueData::Integer(i) => i.to_string(),
            ValueData::Float(f) => format_float(*f),
            ValueData::String(s) => s.as_str().to_string(),
            ValueData::Error(e) => e.describe(),
            ValueData::Array(id) => match gc.get(*id) {
                HeapObject::Array(elements) => {
                    let parts: Vec<String> = elements.iter().map(|v| v.to_display_string(gc)).collect();
                    format!("[{}]", parts.join(", "))
                }
                _ => unreachable!(),
            },
            ValueData::Map(id) => match gc.get(*id) {
                HeapObject::Map(entries) => {
                    let parts: Vec<String> = entries
                        .iter()
                        .map(|(k, v)| format!("{k}: {}", v.to_display_string(gc)))
                        .collect();
                    format!("{{{}}}", parts.join(", "))
                }
                _ => unreachable!(),
            },
            ValueData::Function(_) => "<function>".to_string(),
            ValueData::NativeFunction(_) => "<native function>".to_string(),
            ValueData::Library(id) => match gc.get(*id) {
                HeapObject::Library(lib) => format!("<library {}>", lib.name),
                _ => unreachable!(),
            },
            ValueData::Rng(_) => "<rng>".to_string(),
            ValueData::Iterator(_) => "<iterator>".to_string(),
        }
    }

    /// Generic truthiness used by `not`, `&&`, `||`, and `if`/`while` conditions.
    pub fn truthy(&self) -> bool {
        self.flags.is_true
    }
}

/// Tang's float formatting follows the end-to-end example in §8 (`math.pi` →
/// `"3.141593"`): six digits after the decimal point, trimmed of trailing zeros only
/// when the value is an exact integer.
pub(crate) fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.1}")
    } else {
        format!("{f:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singletons_are_flagged_and_structurally_stable() {
        let a = Value::null();
        let b = Value::null();
        assert!(a.is_singleton());
        assert!(b.is_singleton());
        let gc = GcList::new();
        assert_eq!(a.to_display_string(&gc), b.to_display_string(&gc));
    }

    #[test]
    fn deep_copy_of_singleton_is_identity() {
        let n = Value::null();
        let mut gc = GcList::new();
        let copy = n.deep_copy(&mut gc);
        assert!(copy.is_singleton());
    }

    #[test]
    fn deep_copy_array_is_independent() {
        let mut gc = GcList::new();
        let id = gc.register(HeapObject::Array(vec![Value::integer(1), Value::integer(2)]));
        let original = Value::reference(ValueData::Array(id), false);
        let copy = original.deep_copy(&mut gc);
        let ValueData::Array(copy_id) = copy.data else { panic!() };
        assert_ne!(id, copy_id);
    }
}
