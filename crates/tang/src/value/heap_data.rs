//! Payloads for the composite/reference [`super::ValueData`] variants, stored behind
//! a [`crate::gc::GcId`] in the owning Context's [`crate::gc::GcList`].

use ahash::AHashMap;
use indexmap::IndexMap;

use super::Value;
use crate::context::ExecutionContext;

/// A native callback backing a `NativeFunction` Value or a `Library` attribute.
///
/// Matches §6.3/§6.4: libraries expose native callbacks keyed by name; `Math.pi` and
/// `Random`'s RNG methods are all instances of this.
pub type NativeFn = fn(&mut ExecutionContext, &[Value]) -> Value;

#[derive(Debug, Clone, Copy)]
pub enum LibraryAttr {
    Value(fn() -> Value),
    Function(NativeFn),
}

#[derive(Debug, Clone)]
pub struct LibraryObject {
    pub name: &'static str,
    pub attrs: AHashMap<u64, LibraryAttr>,
}

#[derive(Debug, Clone)]
pub struct FunctionObject {
    pub name: String,
    pub arity: usize,
    /// Absolute bytecode cell index of the function's entry point (set once the
    /// function body has been compiled, per §4.5's "back-patch... with the entry's
    /// offset"). Every call to a script-defined function, whether issued by the
    /// bytecode `Call` instruction or by native code through
    /// `jit::abi::tang_abi_call_value`, re-enters the VM at this offset — the JIT
    /// shares the Value Kernel and call stack with the interpreter rather than
    /// linking native-to-native calls across function boundaries (§4.7).
    pub bytecode_entry: usize,
}

/// A bound Mersenne Twister generator (§6.4: "a 64-bit Mersenne-Twister").
#[derive(Debug, Clone)]
pub struct RngObject {
    pub state: crate::library::random::MersenneTwister64,
}

/// The actual storage behind every GC-backed `Value` variant.
#[derive(Debug, Clone)]
pub enum HeapObject {
    Array(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// An iterator: the value being iterated plus the next grapheme/element index.
    Iterator { source: Box<Value>, position: usize },
    Function(FunctionObject),
    NativeFunction {
        name: String,
        callback: NativeFn,
        bound_receiver: Option<Box<Value>>,
    },
    Library(LibraryObject),
    Rng(RngObject),
}
