//! The bytecode interpreter (§4.6): a flat `match`-dispatch stack machine, sharing
//! the evaluation stack, frame/call-stack, and globals with the JIT backend through
//! one [`crate::context::ExecutionContext`].
//!
//! Grounded in shape on the teacher's bytecode-driving dispatch loop
//! (`examples/scostello-monty/crates/monty/src/run.rs`'s `Frame::execute`): both
//! dispatch on a single enum by `match` and push/pop a `Vec`-backed stack, but here
//! the stack holds `Value`s directly (no separate environment lookup — locals and
//! globals are plain stack/Vec slots resolved at compile time, per §3.4/§4.6).

use super::{Bytecode, CastKind, Code};
use crate::context::ExecutionContext;
use crate::program::FunctionTable;
use crate::value::{self, BinaryOp, CastType, HeapObject, Value, ValueData};

/// How a VM run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum VmOutcome {
    /// The program ran to `Halt`, leaving its last expression's value as the result.
    Finished(Value),
    /// A recursion guard (§4.6 "the call stack has a bound") tripped.
    StackOverflow,
}

/// Runs `code` to completion against `ctx`, starting at instruction 0.
///
/// `functions` backs `LoadFunction`/`Call` for script-defined functions; the same
/// table is shared by every frame, since Tang functions are only ever declared once,
/// at the root scope (§3.4).
pub struct Vm<'a> {
    code: &'a Code,
    functions: &'a FunctionTable,
    ctx: &'a mut ExecutionContext,
    pc: usize,
}

/// Matches the native stack guard rail the spec calls for in §4.6 ("a recursion
/// depth bound prevents a runaway script from exhausting the host stack"); this is
/// the frame-count bound, not a byte count, since every frame is a handful of `Vec`
/// slots rather than a real native stack frame.
const MAX_CALL_DEPTH: usize = 4096;

impl<'a> Vm<'a> {
    pub fn new(code: &'a Code, functions: &'a FunctionTable, ctx: &'a mut ExecutionContext) -> Self {
        Self { code, functions, ctx, pc: 0 }
    }

    pub fn run(mut self) -> VmOutcome {
        loop {
            let instr = &self.code.instructions[self.pc];
            match self.step(instr) {
                Step::Continue => self.pc += 1,
                Step::Jump(target) => self.pc = target,
                Step::Halt(v) => return VmOutcome::Finished(v),
                Step::Overflow => return VmOutcome::StackOverflow,
            }
        }
    }

    /// Runs starting from `entry` rather than instruction 0, treating a `Return`
    /// back past the frame this call pushed as completion rather than a jump to a
    /// real instruction. Used by `ExecutionContext::call_function_via_vm` (§4.7):
    /// native code re-entering the VM for one function call pushes a frame with
    /// `usize::MAX` as its bogus "return address", which `Return`'s normal
    /// `pop_frame`/jump logic treats as any other caller return — this just
    /// recognizes that sentinel instead of indexing the instruction stream with it.
    pub fn run_from(mut self, entry: usize) -> VmOutcome {
        self.pc = entry;
        loop {
            let instr = &self.code.instructions[self.pc];
            match self.step(instr) {
                Step::Continue => self.pc += 1,
                Step::Jump(target) if target == usize::MAX => {
                    let result = self.ctx.stack.pop().unwrap_or_else(Value::null);
                    return VmOutcome::Finished(result);
                }
                Step::Jump(target) => self.pc = target,
                Step::Halt(v) => return VmOutcome::Finished(v),
                Step::Overflow => return VmOutcome::StackOverflow,
            }
        }
    }

    fn push(&mut self, v: Value) {
        self.ctx.stack.push(v);
    }

    fn pop(&mut self) -> Value {
        self.ctx.stack.pop().expect("bytecode stack underflow: compiler left an unbalanced sequence")
    }

    fn peek(&self) -> &Value {
        self.ctx.stack.last().expect("bytecode stack underflow on peek")
    }

    fn local_index(&self, offset: u16) -> usize {
        self.ctx.fp + offset as usize
    }

    fn step(&mut self, instr: &Bytecode) -> Step {
        match instr {
            Bytecode::PushNull => {
                self.push(Value::null());
                Step::Continue
            }
            Bytecode::PushBoolean(b) => {
                self.push(Value::boolean(*b));
                Step::Continue
            }
            Bytecode::PushInteger(i) => {
                self.push(Value::integer(*i));
                Step::Continue
            }
            Bytecode::PushFloat(f) => {
                self.push(Value::float(*f));
                Step::Continue
            }
            Bytecode::PushString(idx) => {
                let s = self.code.constants[*idx as usize].clone();
                self.push(Value::string(s));
                Step::Continue
            }

            Bytecode::PeekLocal(offset) => {
                let idx = self.local_index(*offset);
                self.ctx.ensure_local_slot(idx);
                let mut v = self.ctx.stack[idx].clone();
                v.flags.is_temporary = true;
                self.push(v);
                Step::Continue
            }
            Bytecode::PokeLocal(offset) => {
                let idx = self.local_index(*offset);
                let top = self.pop();
                self.ctx.ensure_local_slot(idx);
                let mut stored = if top.is_temporary() {
                    let mut adopted = top.clone();
                    adopted.set_not_temporary();
                    adopted
                } else {
                    top.deep_copy(&mut self.ctx.gc)
                };
                stored.flags.is_temporary = false;
                self.ctx.stack[idx] = stored;
                let mut handed_back = top;
                handed_back.flags.is_temporary = false;
                self.push(handed_back);
                Step::Continue
            }
            Bytecode::PeekGlobal(offset) => {
                self.ctx.ensure_global_slot(*offset);
                let mut v = self.ctx.globals[*offset as usize].clone();
                v.flags.is_temporary = true;
                self.push(v);
                Step::Continue
            }
            Bytecode::PokeGlobal(offset) => {
                self.ctx.ensure_global_slot(*offset);
                let top = self.pop();
                let mut stored = if top.is_temporary() {
                    let mut adopted = top.clone();
                    adopted.set_not_temporary();
                    adopted
                } else {
                    top.deep_copy(&mut self.ctx.gc)
                };
                stored.flags.is_temporary = false;
                self.ctx.globals[*offset as usize] = stored;
                let mut handed_back = top;
                handed_back.flags.is_temporary = false;
                self.push(handed_back);
                Step::Continue
            }

            Bytecode::LoadLibrary(hash) => {
                let v = self.ctx.resolve_library(*hash);
                self.push(v);
                Step::Continue
            }
            Bytecode::LoadFunction(hash) => {
                let v = self.ctx.resolve_function(*hash, self.functions);
                self.push(v);
                Step::Continue
            }

            Bytecode::Pop => {
                self.pop();
                Step::Continue
            }
            Bytecode::Dup => {
                let v = self.peek().clone();
                self.push(v);
                Step::Continue
            }
            Bytecode::SetNotTemp => {
                self.ctx.stack.last_mut().expect("stack underflow").set_not_temporary();
                Step::Continue
            }
            Bytecode::Adopt => {
                self.ctx.stack.last_mut().expect("stack underflow").adopt();
                Step::Continue
            }

            Bytecode::Negate => {
                let v = self.pop();
                self.push(value::negate(&v));
                Step::Continue
            }
            Bytecode::Not => {
                let v = self.pop();
                self.push(value::logical_not(&v));
                Step::Continue
            }

            Bytecode::Add => self.binary(BinaryOp::Add),
            Bytecode::Subtract => self.binary(BinaryOp::Subtract),
            Bytecode::Multiply => self.binary(BinaryOp::Multiply),
            Bytecode::Divide => self.binary(BinaryOp::Divide),
            Bytecode::Modulo => self.binary(BinaryOp::Modulo),
            Bytecode::LessThan => self.binary(BinaryOp::LessThan),
            Bytecode::LessThanEqual => self.binary(BinaryOp::LessThanEqual),
            Bytecode::GreaterThan => self.binary(BinaryOp::GreaterThan),
            Bytecode::GreaterThanEqual => self.binary(BinaryOp::GreaterThanEqual),
            Bytecode::Equal => self.binary(BinaryOp::Equal),
            Bytecode::NotEqual => self.binary(BinaryOp::NotEqual),

            Bytecode::Cast(kind) => {
                let v = self.pop();
                let target = match kind {
                    CastKind::Int => CastType::Int,
                    CastKind::Float => CastType::Float,
                    CastKind::Bool => CastType::Bool,
                    CastKind::String => CastType::String,
                };
                self.push(value::cast(&v, target));
                Step::Continue
            }

            Bytecode::IndexGet => {
                let idx = self.pop();
                let receiver = self.pop();
                self.push(value::index_get(&receiver, &idx, &self.ctx.gc));
                Step::Continue
            }
            Bytecode::IndexSet => {
                let val = self.pop();
                let idx = self.pop();
                let receiver = self.pop();
                let result = value::assign_index(&receiver, &idx, val, &mut self.ctx.gc);
                self.push(result);
                Step::Continue
            }
            Bytecode::Slice => {
                let skip = self.pop();
                let end = self.pop();
                let start = self.pop();
                let receiver = self.pop();
                let start_i = as_i64(&start);
                let end_i = match &end.data {
                    ValueData::Null => None,
                    _ => Some(as_i64(&end)),
                };
                let skip_i = as_i64(&skip).max(1);
                self.push(value::slice(&receiver, start_i, end_i, skip_i, &mut self.ctx.gc));
                Step::Continue
            }
            Bytecode::Period(idx) => {
                let name = self.code.constants[*idx as usize].as_str().to_string();
                let receiver = self.pop();
                let result = value::period(&receiver, &name, self.ctx);
                self.push(result);
                Step::Continue
            }

            Bytecode::MakeArray(count) => {
                let mut items = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    items.push(self.pop());
                }
                items.reverse();
                let id = self.ctx.gc.register(HeapObject::Array(items));
                self.push(Value::reference(ValueData::Array(id), false));
                Step::Continue
            }
            Bytecode::MakeMap(count) => {
                let mut pairs = Vec::with_capacity(*count as usize);
                for _ in 0..*count {
                    let val = self.pop();
                    let key = self.pop();
                    let ValueData::String(key) = key.data else {
                        unreachable!("MakeMap keys are always compiled as string constants");
                    };
                    pairs.push((key.as_str().to_string(), val));
                }
                pairs.reverse();
                let map = pairs.into_iter().collect();
                let id = self.ctx.gc.register(HeapObject::Map(map));
                self.push(Value::reference(ValueData::Map(id), false));
                Step::Continue
            }

            Bytecode::Call(argc) => self.call(*argc as usize),

            Bytecode::IteratorGet => {
                let receiver = self.pop();
                self.push(value::iterator_get(&receiver, &mut self.ctx.gc));
                Step::Continue
            }
            Bytecode::IteratorNext => {
                let iter = self.peek().clone();
                let (val, has_more) = value::iterator_next(&iter, &mut self.ctx.gc);
                self.push(val);
                self.push(Value::boolean(has_more));
                Step::Continue
            }

            Bytecode::Print => {
                let v = self.pop();
                let text = v.to_display_string(&self.ctx.gc);
                self.ctx.output.push_str(&text);
                self.push(Value::null());
                Step::Continue
            }

            Bytecode::Jump(target) => Step::Jump(*target as usize),
            Bytecode::JumpIfFalse(target) => {
                let v = self.pop();
                if v.truthy() {
                    Step::Continue
                } else {
                    Step::Jump(*target as usize)
                }
            }
            Bytecode::JumpIfTrue(target) => {
                let v = self.pop();
                if v.truthy() {
                    Step::Jump(*target as usize)
                } else {
                    Step::Continue
                }
            }

            Bytecode::Return => {
                let result = self.pop();
                match self.ctx.pop_frame() {
                    Some(return_pc) => {
                        self.push(result);
                        Step::Jump(return_pc)
                    }
                    None => Step::Halt(result),
                }
            }
            Bytecode::Halt => {
                let result = self.ctx.stack.pop().unwrap_or_else(Value::null);
                Step::Halt(result)
            }
        }
    }

    fn binary(&mut self, op: BinaryOp) -> Step {
        let rhs = self.pop();
        let lhs = self.pop();
        self.push(value::binary_dispatch(op, &lhs, &rhs));
        Step::Continue
    }

    /// `Call` pops the callee (top of stack), then `argc` arguments beneath it in
    /// reverse push order (§4.3: "pops `argc` arguments followed by the callee").
    fn call(&mut self, argc: usize) -> Step {
        let callee = self.pop();
        let mut args = Vec::with_capacity(argc);
        for _ in 0..argc {
            args.push(self.pop());
        }
        args.reverse();

        match &callee.data {
            ValueData::Function(id) => {
                if self.ctx.call_depth() >= MAX_CALL_DEPTH {
                    return Step::Overflow;
                }
                let obj = match self.ctx.gc.get(*id) {
                    HeapObject::Function(f) => f.clone(),
                    _ => unreachable!(),
                };
                let return_pc = self.pc + 1;
                for arg in args {
                    self.push(arg);
                }
                // Pad missing trailing arguments with `null` up to the declared
                // arity; extras beyond arity are simply left as extra stack slots
                // the function body never names (`analyze` allocates its own locals
                // starting past them).
                if argc < obj.arity {
                    for _ in argc..obj.arity {
                        self.push(Value::null());
                    }
                }
                let frame_arg_count = argc.max(obj.arity);
                self.ctx.push_frame(return_pc, frame_arg_count);
                Step::Jump(obj.bytecode_entry)
            }
            ValueData::NativeFunction(_) => {
                let result = value::call(&callee, &args, self.ctx);
                self.push(result);
                Step::Continue
            }
            ValueData::Error(_) => {
                self.push(callee);
                Step::Continue
            }
            _ => {
                self.push(Value::error(crate::value::ErrorValue::NotImplemented));
                Step::Continue
            }
        }
    }
}

fn as_i64(v: &Value) -> i64 {
    match &v.data {
        ValueData::Integer(i) => *i,
        ValueData::Float(f) => *f as i64,
        _ => 0,
    }
}

enum Step {
    Continue,
    Jump(usize),
    Halt(Value),
    Overflow,
}
