//! The native/Value-Kernel ABI bridge (§4.7).
//!
//! Generated native code never touches a [`Value`] or [`crate::context::ExecutionContext`]
//! directly — it only holds `*mut ExecutionContext` (pinned in `R15` for the duration
//! of a compiled function, per §4.7's calling convention) and `*mut Value` pointers
//! boxed via [`ExecutionContext::register_native_box`]. Every one of these functions
//! is `extern "C"` so `compile_native`'s `call_reg` sequences can call it with a plain
//! System V argument shuffle, and every one takes/returns raw pointers rather than
//! Rust references so the signature is FFI-safe.
//!
//! This mirrors the teacher's approach to crossing an unsafe boundary in one place
//! (`examples/scostello-monty/crates/monty/src/value.rs`'s narrow `unsafe { ptr::read(..) }`
//! for its own exception-value handoff): contain the `unsafe` in a small set of
//! narrow, single-purpose functions, with the surrounding machinery (encoder, code
//! generator) staying entirely safe Rust.
//!
//! Every function here corresponds to exactly one native-eligible `NodeKind` arm in
//! `ast::compile_native` — there is no bridge function here without a caller, and no
//! `NodeKind` arm compiles to native code without a bridge function it calls.

use crate::context::ExecutionContext;
use crate::value::{self, BinaryOp, CastType, ErrorValue, HeapObject, Value, ValueData};

/// # Safety
/// `ctx` must be a valid, exclusively-held pointer for the duration of the call, per
/// `compile_native`'s calling convention (R15 holds the live context for the whole
/// compiled function).
#[no_mangle]
pub unsafe extern "C" fn tang_abi_box_value(ctx: *mut ExecutionContext, value: Value) -> *mut Value {
    unsafe { (*ctx).register_native_box(value) }
}

#[no_mangle]
pub unsafe extern "C" fn tang_abi_make_null(ctx: *mut ExecutionContext) -> *mut Value {
    unsafe { tang_abi_box_value(ctx, Value::null()) }
}

#[no_mangle]
pub unsafe extern "C" fn tang_abi_make_boolean(ctx: *mut ExecutionContext, v: i64) -> *mut Value {
    unsafe { tang_abi_box_value(ctx, Value::boolean(v != 0)) }
}

#[no_mangle]
pub unsafe extern "C" fn tang_abi_make_integer(ctx: *mut ExecutionContext, v: i64) -> *mut Value {
    unsafe { tang_abi_box_value(ctx, Value::integer(v)) }
}

/// Takes the Float's bit pattern as a plain integer register rather than an `xmm`
/// register: this ABI is internal to the JIT (`compile_native` is the only caller),
/// so it is free to avoid the System V floating-point convention entirely.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_make_float(ctx: *mut ExecutionContext, bits: u64) -> *mut Value {
    unsafe { tang_abi_box_value(ctx, Value::float(f64::from_bits(bits))) }
}

/// Reads the Boolean `is_true` flag a native `test`/`jcc` sequence needs after
/// evaluating a condition, as a plain `i64` (`0`/`1`) so it lands directly in `RAX`.
///
/// # Safety
/// `value` must point at a live boxed [`Value`].
#[no_mangle]
pub unsafe extern "C" fn tang_abi_truthy(value: *const Value) -> i64 {
    let value = unsafe { &*value };
    value.truthy() as i64
}

/// # Safety
/// `ctx`, `lhs`, `rhs` must be valid per the module's ABI contract. `op` is one of
/// the `BinaryOp` discriminants the native compiler encodes inline as an immediate.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_binary(ctx: *mut ExecutionContext, op: u8, lhs: *const Value, rhs: *const Value) -> *mut Value {
    let lhs = unsafe { &*lhs };
    let rhs = unsafe { &*rhs };
    let op = decode_binary_op(op);
    let result = value::binary_dispatch(op, lhs, rhs);
    unsafe { tang_abi_box_value(ctx, result) }
}

/// # Safety
/// Same contract as [`tang_abi_binary`].
#[no_mangle]
pub unsafe extern "C" fn tang_abi_negate(ctx: *mut ExecutionContext, operand: *const Value) -> *mut Value {
    let operand = unsafe { &*operand };
    let result = value::negate(operand);
    unsafe { tang_abi_box_value(ctx, result) }
}

/// # Safety
/// Same contract as [`tang_abi_binary`].
#[no_mangle]
pub unsafe extern "C" fn tang_abi_logical_not(ctx: *mut ExecutionContext, operand: *const Value) -> *mut Value {
    let operand = unsafe { &*operand };
    let result = value::logical_not(operand);
    unsafe { tang_abi_box_value(ctx, result) }
}

/// # Safety
/// Same contract as [`tang_abi_binary`]. `kind` is a `CastType` discriminant.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_cast(ctx: *mut ExecutionContext, kind: u8, operand: *const Value) -> *mut Value {
    let operand = unsafe { &*operand };
    let kind = decode_cast_type(kind);
    let result = value::cast(operand, kind);
    unsafe { tang_abi_box_value(ctx, result) }
}

/// Loads local slot `offset` (`ctx.fp`-relative), growing the frame if needed — the
/// native equivalent of `Bytecode::PeekLocal`.
///
/// # Safety
/// `ctx` per the module's ABI contract.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_peek_local(ctx: *mut ExecutionContext, offset: i64) -> *mut Value {
    let ctx_ref = unsafe { &mut *ctx };
    let idx = ctx_ref.fp + offset as usize;
    ctx_ref.ensure_local_slot(idx);
    let mut v = ctx_ref.stack[idx].clone();
    v.flags.is_temporary = true;
    unsafe { tang_abi_box_value(ctx, v) }
}

/// Stores `value` into local slot `offset`, adopting it if temporary or
/// deep-copying it otherwise (mirrors `Bytecode::PokeLocal`'s discipline), and
/// returns the (now non-temporary) value back, for expression contexts where an
/// assignment is itself a value (`x = y = 1`).
///
/// # Safety
/// `ctx`, `value` per the module's ABI contract.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_poke_local(ctx: *mut ExecutionContext, offset: i64, value: *const Value) -> *mut Value {
    let ctx_ref = unsafe { &mut *ctx };
    let idx = ctx_ref.fp + offset as usize;
    ctx_ref.ensure_local_slot(idx);
    let incoming = unsafe { &*value };
    let mut stored = if incoming.is_temporary() {
        let mut adopted = incoming.clone();
        adopted.set_not_temporary();
        adopted
    } else {
        incoming.deep_copy(&mut ctx_ref.gc)
    };
    stored.flags.is_temporary = false;
    ctx_ref.stack[idx] = stored.clone();
    unsafe { tang_abi_box_value(ctx, stored) }
}

/// # Safety
/// `ctx` per the module's ABI contract.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_peek_global(ctx: *mut ExecutionContext, slot: i64) -> *mut Value {
    let ctx_ref = unsafe { &mut *ctx };
    ctx_ref.ensure_global_slot(slot as u16);
    let mut v = ctx_ref.globals[slot as usize].clone();
    v.flags.is_temporary = true;
    unsafe { tang_abi_box_value(ctx, v) }
}

/// # Safety
/// `ctx`, `value` per the module's ABI contract.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_poke_global(ctx: *mut ExecutionContext, slot: i64, value: *const Value) -> *mut Value {
    let ctx_ref = unsafe { &mut *ctx };
    ctx_ref.ensure_global_slot(slot as u16);
    let incoming = unsafe { &*value };
    let mut stored = if incoming.is_temporary() {
        let mut adopted = incoming.clone();
        adopted.set_not_temporary();
        adopted
    } else {
        incoming.deep_copy(&mut ctx_ref.gc)
    };
    stored.flags.is_temporary = false;
    ctx_ref.globals[slot as usize] = stored.clone();
    unsafe { tang_abi_box_value(ctx, stored) }
}

/// # Safety
/// `ctx` per the module's ABI contract.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_load_library(ctx: *mut ExecutionContext, name_hash: u64) -> *mut Value {
    let result = unsafe { (*ctx).resolve_library(name_hash) };
    unsafe { tang_abi_box_value(ctx, result) }
}

/// # Safety
/// `ctx`, `receiver` per the module's ABI contract; `name`/`name_len` must describe
/// a valid UTF-8 buffer compiled into the native code's embedded data segment
/// (`jit::NativeBuilder::load_data_ptr`), which outlives the call.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_period(ctx: *mut ExecutionContext, receiver: *const Value, name: *const u8, name_len: usize) -> *mut Value {
    let receiver = unsafe { &*receiver };
    let name = unsafe { std::str::from_utf8_unchecked(std::slice::from_raw_parts(name, name_len)) };
    let result = value::period(receiver, name, unsafe { &mut *ctx });
    unsafe { tang_abi_box_value(ctx, result) }
}

/// Builds a `String` Value from a buffer compiled into the native code's embedded
/// data segment. `ValueData::String` holds its `TangString` inline rather than
/// behind a `GcId` (see `value::mod`), so no GC registration is needed here.
///
/// # Safety
/// `ptr`/`len` must describe a valid UTF-8 buffer outliving the call.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_make_string(ctx: *mut ExecutionContext, ptr: *const u8, len: usize) -> *mut Value {
    let text = unsafe { std::str::from_utf8_unchecked(std::slice::from_raw_parts(ptr, len)) };
    let string = crate::string::TangString::new(text, crate::string::StringType::Trusted);
    unsafe { tang_abi_box_value(ctx, Value::string(string)) }
}

/// Resolves a script-defined function by its mangled-name hash, mirroring
/// `Bytecode::LoadFunction`.
///
/// # Safety
/// `ctx` per the module's ABI contract; the owning `Program` must already have
/// called `ExecutionContext::link_program` (true of every context a compiled
/// native entry point ever runs against).
#[no_mangle]
pub unsafe extern "C" fn tang_abi_load_function(ctx: *mut ExecutionContext, name_hash: u64) -> *mut Value {
    let result = unsafe { (*ctx).resolve_function_linked(name_hash) };
    unsafe { tang_abi_box_value(ctx, result) }
}

/// Calls `callee` with `arg_count` arguments, dispatching at runtime on its
/// `ValueData` rather than requiring `compile_native` to know statically whether
/// a callee is a native library function or a script-defined one (§4.7: the JIT
/// never links native-to-native calls across function boundaries — a script
/// function call always re-enters the VM, even when the call site itself is
/// native-compiled).
///
/// `args` points at `arg_count` argument pointers in **reverse evaluation
/// order** — `compile_native` pushes each evaluated argument onto its own native
/// stack left-to-right, so the last one pushed (the rightmost argument) ends up
/// first in memory, exactly as `args` is laid out. This function un-reverses them
/// before dispatch so callees see the normal left-to-right order.
///
/// # Safety
/// `ctx`, `callee` per the module's ABI contract; `args` must point at
/// `arg_count` valid, live `*const Value` pointers.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_call_value(ctx: *mut ExecutionContext, callee: *const Value, args: *const *const Value, arg_count: usize) -> *mut Value {
    let callee = unsafe { &*callee };
    let args_slice = unsafe { std::slice::from_raw_parts(args, arg_count) };
    let mut owned: Vec<Value> = args_slice.iter().map(|p| unsafe { (**p).clone() }).collect();
    owned.reverse();

    let result = {
        let ctx_ref = unsafe { &mut *ctx };
        match &callee.data {
            ValueData::NativeFunction(_) => value::call(callee, &owned, ctx_ref),
            ValueData::Function(id) => {
                let obj = match ctx_ref.gc.get(*id) {
                    HeapObject::Function(f) => f.clone(),
                    _ => unreachable!("ValueData::Function always boxes a FunctionObject"),
                };
                if owned.len() < obj.arity {
                    owned.resize_with(obj.arity, Value::null);
                }
                ctx_ref.call_function_via_vm(obj.bytecode_entry, owned)
            }
            ValueData::Error(_) => callee.clone(),
            _ => Value::error(ErrorValue::NotImplemented),
        }
    };
    unsafe { tang_abi_box_value(ctx, result) }
}

/// Appends `value`'s display form to the run's output buffer, returning `null`
/// (mirrors `Bytecode::Print`, which also leaves `null` as the statement's value).
///
/// # Safety
/// `ctx`, `value` per the module's ABI contract.
#[no_mangle]
pub unsafe extern "C" fn tang_abi_print(ctx: *mut ExecutionContext, value: *const Value) -> *mut Value {
    let ctx_ref = unsafe { &mut *ctx };
    let text = unsafe { (*value).to_display_string(&ctx_ref.gc) };
    ctx_ref.output.push_str(&text);
    unsafe { tang_abi_box_value(ctx, Value::null()) }
}

fn decode_binary_op(tag: u8) -> BinaryOp {
    // Kept in lockstep with `ast::compile_native`'s encoder, which emits these same
    // discriminant values as `mov` immediates — see that module for the table.
    const TABLE: [BinaryOp; 13] = [
        BinaryOp::Add,
        BinaryOp::Subtract,
        BinaryOp::Multiply,
        BinaryOp::Divide,
        BinaryOp::Modulo,
        BinaryOp::LessThan,
        BinaryOp::LessThanEqual,
        BinaryOp::GreaterThan,
        BinaryOp::GreaterThanEqual,
        BinaryOp::Equal,
        BinaryOp::NotEqual,
        BinaryOp::And,
        BinaryOp::Or,
    ];
    TABLE[tag as usize]
}

fn decode_cast_type(tag: u8) -> CastType {
    const TABLE: [CastType; 4] = [CastType::Int, CastType::Float, CastType::Bool, CastType::String];
    TABLE[tag as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_reads_the_flag() {
        let v = Value::integer(5);
        assert_eq!(unsafe { tang_abi_truthy(&v as *const Value) }, 1);
        let z = Value::integer(0);
        assert_eq!(unsafe { tang_abi_truthy(&z as *const Value) }, 0);
    }

    #[test]
    fn binary_dispatch_roundtrips_through_boxing() {
        let mut ctx = ExecutionContext::new();
        let lhs = Value::integer(2);
        let rhs = Value::integer(3);
        let ptr = unsafe { tang_abi_binary(&mut ctx as *mut ExecutionContext, 0, &lhs as *const Value, &rhs as *const Value) };
        let result = unsafe { &*ptr };
        assert!(matches!(result.data, crate::value::ValueData::Integer(5)));
    }

    #[test]
    fn local_roundtrips_through_peek_and_poke() {
        let mut ctx = ExecutionContext::new();
        let v = Value::integer(7);
        let stored = unsafe { tang_abi_poke_local(&mut ctx as *mut ExecutionContext, 0, &v as *const Value) };
        let read = unsafe { tang_abi_peek_local(&mut ctx as *mut ExecutionContext, 0) };
        assert!(matches!(unsafe { &*stored }.data, crate::value::ValueData::Integer(7)));
        assert!(matches!(unsafe { &*read }.data, crate::value::ValueData::Integer(7)));
    }

    #[test]
    fn make_string_builds_a_trusted_string() {
        let mut ctx = ExecutionContext::new();
        let bytes = b"hi";
        let ptr = unsafe { tang_abi_make_string(&mut ctx as *mut ExecutionContext, bytes.as_ptr(), bytes.len()) };
        let result = unsafe { &*ptr };
        match &result.data {
            ValueData::String(s) => assert_eq!(s.as_str(), "hi"),
            other => panic!("expected a String value, got {other:?}"),
        }
    }

    #[test]
    fn call_value_un_reverses_arguments_before_dispatching() {
        fn identity_first(_ctx: &mut ExecutionContext, args: &[Value]) -> Value {
            args.first().cloned().unwrap_or_else(Value::null)
        }
        let mut ctx = ExecutionContext::new();
        let id = ctx.gc.register(HeapObject::NativeFunction {
            name: "identity_first".to_string(),
            callback: identity_first,
            bound_receiver: None,
        });
        let callee = Value::reference(ValueData::NativeFunction(id), false);
        let a = Value::integer(1);
        let b = Value::integer(2);
        // Reverse evaluation order, per the native compiler's push convention: `b`
        // (evaluated second, pushed last) ends up first in memory.
        let args: [*const Value; 2] = [&b as *const Value, &a as *const Value];
        let ptr = unsafe { tang_abi_call_value(&mut ctx as *mut ExecutionContext, &callee as *const Value, args.as_ptr(), 2) };
        let result = unsafe { &*ptr };
        assert!(matches!(result.data, ValueData::Integer(1)), "expected the un-reversed first argument, got {:?}", result.data);
    }
}
