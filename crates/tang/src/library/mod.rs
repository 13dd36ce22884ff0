//! Built-in libraries (§6.4): native-backed `Library` Values the host registers with
//! an [`crate::context::ExecutionContext`] before running a script, and a script
//! reaches via `use`.

pub mod math;
pub mod random;

use ahash::AHashMap;

use crate::gc::GcList;
use crate::scope::hash_identifier;
use crate::value::{HeapObject, LibraryObject, Value, ValueData};

fn make_library(name: &'static str, attrs: AHashMap<u64, crate::value::LibraryAttr>, gc: &mut GcList) -> Value {
    let id = gc.register(HeapObject::Library(LibraryObject { name, attrs }));
    Value::reference(ValueData::Library(id), false)
}

/// Registers every built-in library with `ctx`, keyed by the name a script's `use`
/// statement names (§6.4: `use math, Math;` / `use rand, Random;`).
pub fn register_builtins(ctx: &mut crate::context::ExecutionContext) {
    ctx.register_library(hash_identifier("Math"), math::create);
    ctx.register_library(hash_identifier("Random"), random::create);
}
