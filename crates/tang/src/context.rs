//! Execution Context (§3.5, §4.8): everything a running program needs that isn't
//! shared across runs — the evaluation stack, the frame/call stack, the per-run
//! [`GcList`], the output buffer, global variable storage, and the registered library
//! factories a `use` statement resolves against.
//!
//! One `ExecutionContext` is created per `execute` call (§6.3's "create/destroy
//! Execution Context" pair); dropping it tears down its `GcList` in one pass, which is
//! the entire garbage collection story (§3.1, §5).

use ahash::AHashMap;

use crate::gc::GcList;
use crate::value::Value;

/// A native library's registration: a name (hashed for `use` resolution) plus a
/// factory that builds the `Library` `HeapObject` lazily, the first time a script
/// actually `use`s it (§6.3/§6.4).
pub type LibraryFactory = fn(&mut GcList) -> Value;

#[derive(Debug)]
struct CallFrame {
    return_pc: usize,
    saved_fp: usize,
    /// Stack height to restore to after popping the frame's locals, i.e. the height
    /// just before the arguments were pushed.
    saved_stack_base: usize,
}

/// A running program's mutable state. `Program` (see `crate::program`) is shared and
/// read-only across runs; everything here is exclusive to one `execute` call.
pub struct ExecutionContext {
    pub stack: Vec<Value>,
    /// Index into `stack` where the current frame's locals begin.
    pub fp: usize,
    call_stack: Vec<CallFrame>,
    pub gc: GcList,
    /// Accumulated text from `Print` statements (§4.5/§6.1: the CLI writes this to
    /// stdout after a successful run).
    pub output: String,
    /// `global`-declared slots, indexed by the slot number `Binding::Global` carries.
    pub globals: Vec<Value>,
    /// Host-registered library factories, keyed by the library's name hash. Populated
    /// once via [`ExecutionContext::register_library`] before `execute` runs (§6.3).
    library_factories: AHashMap<u64, LibraryFactory>,
    /// Library instances already materialized this run, keyed by the same hash, so a
    /// second `use` of the same library in the same run doesn't reallocate it.
    library_cache: AHashMap<u64, Value>,
    /// Script-defined `Function` Values already materialized this run, keyed by the
    /// mangled-name hash `LOAD_FUNCTION` carries.
    function_cache: AHashMap<u64, Value>,
    /// Heap-boxed `Value`s handed out across the JIT/Value-Kernel FFI boundary
    /// (§4.7): native code only ever holds a `*mut Value`, so each one is boxed here
    /// and reclaimed in one pass when the Context drops, the same non-reclaiming
    /// discipline `GcList` uses for composite values.
    native_box_ptrs: Vec<*mut Value>,
    /// The final expression/`Return` value of the run, read by the host after
    /// `execute` returns (§6.3).
    pub result: Value,
    /// `Random.global`'s shared generator (§6.4), materialized lazily on first
    /// access and reused for the rest of the run so repeated reads draw from one
    /// continuing stream instead of each restarting at the same seed.
    random_global: Option<Value>,
    /// The owning [`crate::program::Program`]'s bytecode and function table, set
    /// once by `Program::execute` before entering native code. Native-compiled
    /// code calls a script-defined `Function` Value by re-entering the bytecode
    /// VM through these (§4.7: the JIT "shares the Value Kernel and call stack
    /// with the VM" rather than linking native-to-native calls across functions).
    /// Null until `link_program` is called; every native entry point is only ever
    /// invoked after that happens.
    program_code: *const crate::bytecode::Code,
    program_functions: *const crate::program::FunctionTable,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            fp: 0,
            call_stack: Vec::new(),
            gc: GcList::new(),
            output: String::new(),
            globals: Vec::new(),
            library_factories: AHashMap::new(),
            library_cache: AHashMap::new(),
            function_cache: AHashMap::new(),
            native_box_ptrs: Vec::new(),
            result: Value::null(),
            random_global: None,
            program_code: std::ptr::null(),
            program_functions: std::ptr::null(),
        }
    }

    /// Records the owning `Program`'s compiled bytecode and function table so
    /// native-compiled code can re-enter the VM for script-to-script calls. Must
    /// be called before running either backend; `Program::execute` does this once
    /// per run.
    pub fn link_program(&mut self, code: &crate::bytecode::Code, functions: &crate::program::FunctionTable) {
        self.program_code = code as *const _;
        self.program_functions = functions as *const _;
    }

    /// Invokes a script-defined `Function` Value by re-entering the bytecode VM at
    /// its entry point, used by the native/Value-Kernel ABI bridge
    /// (`jit::abi::tang_abi_call_value`) when the callee turns out to be a script
    /// function rather than a native one. Panics if `link_program` was never
    /// called — a native entry point is never reachable before that happens.
    pub fn call_function_via_vm(&mut self, entry: usize, args: Vec<Value>) -> Value {
        assert!(!self.program_code.is_null(), "call_function_via_vm: Program never linked");
        // SAFETY: `program_code`/`program_functions` point at the owning Program's
        // fields, which outlive every `ExecutionContext` created against it.
        let code = unsafe { &*self.program_code };
        let functions = unsafe { &*self.program_functions };
        let arg_count = args.len();
        self.stack.extend(args);
        self.push_frame(usize::MAX, arg_count);
        let outcome = crate::bytecode::Vm::new(code, functions, self).run_from(entry);
        match outcome {
            crate::bytecode::VmOutcome::Finished(v) => v,
            crate::bytecode::VmOutcome::StackOverflow => Value::error(crate::value::ErrorValue::Message("call stack exhausted".to_string())),
        }
    }

    /// Returns `Random.global`, creating its backing generator on first access
    /// (seeded from the host clock, same as `Random.default`, but cached so every
    /// later access shares the one stream rather than reseeding).
    pub fn global_rng(&mut self) -> Value {
        if let Some(cached) = &self.random_global {
            return cached.clone();
        }
        let value = crate::library::random::make_rng_value(crate::library::random::MersenneTwister64::from_clock(), &mut self.gc);
        self.random_global = Some(value.clone());
        value
    }

    pub fn register_library(&mut self, name_hash: u64, factory: LibraryFactory) {
        self.library_factories.insert(name_hash, factory);
    }

    /// Resolves a `use`d library, instantiating it on first use and caching the
    /// `Library` Value for the remainder of this run.
    pub fn resolve_library(&mut self, name_hash: u64) -> Value {
        if let Some(cached) = self.library_cache.get(&name_hash) {
            return cached.clone();
        }
        let Some(factory) = self.library_factories.get(&name_hash).copied() else {
            return Value::error(crate::value::ErrorValue::Message("unregistered library".to_string()));
        };
        let value = factory(&mut self.gc);
        self.library_cache.insert(name_hash, value.clone());
        value
    }

    pub fn ensure_global_slot(&mut self, slot: u16) {
        let slot = slot as usize;
        if self.globals.len() <= slot {
            self.globals.resize_with(slot + 1, Value::null);
        }
    }

    /// Grows the evaluation stack so local slot `index` (absolute, i.e. already
    /// `fp`-relative) exists, filling any gap with `null`. Locals share the
    /// evaluation stack with expression temporaries (§4.6), so a local's slot may
    /// not exist yet the first time it's written.
    pub fn ensure_local_slot(&mut self, index: usize) {
        if self.stack.len() <= index {
            self.stack.resize_with(index + 1, Value::null);
        }
    }

    /// `resolve_function` against the owning Program's linked function table,
    /// for native code (`jit::abi::tang_abi_load_function`), which only ever
    /// holds `ctx` and a name hash, not a `&FunctionTable` reference.
    pub fn resolve_function_linked(&mut self, name_hash: u64) -> Value {
        assert!(!self.program_functions.is_null(), "resolve_function_linked: Program never linked");
        // SAFETY: see `call_function_via_vm`.
        let functions = unsafe { &*self.program_functions };
        self.resolve_function(name_hash, functions)
    }

    /// Resolves a script-defined function's `Function` Value, instantiating and
    /// caching it on first use, mirroring `resolve_library`.
    pub fn resolve_function(&mut self, name_hash: u64, table: &crate::program::FunctionTable) -> Value {
        if let Some(cached) = self.function_cache.get(&name_hash) {
            return cached.clone();
        }
        let Some(obj) = table.get(&name_hash) else {
            return Value::error(crate::value::ErrorValue::Message("unknown function".to_string()));
        };
        let id = self.gc.register(crate::value::HeapObject::Function(obj.clone()));
        let value = Value::reference(crate::value::ValueData::Function(id), false);
        self.function_cache.insert(name_hash, value.clone());
        value
    }

    /// Boxes `value` for the lifetime of this Context and returns a raw pointer to
    /// it, for handing across the JIT/Value-Kernel FFI boundary. The box is only
    /// ever reclaimed when the Context itself drops (§3.1: "no intra-run
    /// reclamation"), matching `GcList`'s discipline.
    pub fn register_native_box(&mut self, value: Value) -> *mut Value {
        let ptr = Box::into_raw(Box::new(value));
        self.native_box_ptrs.push(ptr);
        ptr
    }

    pub fn push_frame(&mut self, return_pc: usize, arg_count: usize) {
        let saved_stack_base = self.stack.len() - arg_count;
        self.call_stack.push(CallFrame {
            return_pc,
            saved_fp: self.fp,
            saved_stack_base,
        });
        self.fp = saved_stack_base;
    }

    /// Tears down the current frame and returns the pc to resume the caller at, or
    /// `None` if this was the outermost frame (the program itself returning).
    pub fn pop_frame(&mut self) -> Option<usize> {
        let frame = self.call_stack.pop()?;
        self.stack.truncate(frame.saved_stack_base);
        self.fp = frame.saved_fp;
        Some(frame.return_pc)
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExecutionContext {
    fn drop(&mut self) {
        for ptr in self.native_box_ptrs.drain(..) {
            // SAFETY: each pointer was produced by `Box::into_raw` in
            // `register_native_box` and is never freed anywhere else.
            unsafe {
                drop(Box::from_raw(ptr));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_library_resolves_to_error() {
        let mut ctx = ExecutionContext::new();
        let v = ctx.resolve_library(crate::scope::hash_identifier("Nope"));
        assert!(v.is_error());
    }

    #[test]
    fn global_slots_grow_on_demand() {
        let mut ctx = ExecutionContext::new();
        ctx.ensure_global_slot(3);
        assert_eq!(ctx.globals.len(), 4);
    }
}
