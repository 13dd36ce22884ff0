//! Native code generation (§4.7): each native-eligible `NodeKind` arm emits the x86-64
//! sequence documented there, leaving a `*mut Value` result in `RAX`, exactly mirroring
//! `compile_bytecode`'s "one value per statement" convention but in a register instead
//! of on an explicit stack.
//!
//! Not every `NodeKind` has a native form. `Array`, `Map`, `Index`, `Slice`, and
//! `RangedFor` have no corresponding bridge function in `jit::abi` (composite
//! construction and the iterator protocol were judged not worth a native fast path —
//! see that module's doc comment), so `compile_native` returns `false` the moment it
//! meets one of these, and `Program::create` discards the whole native attempt rather
//! than emit a program that can only partially run (§4.8: native compilation is an
//! all-or-nothing attempt per `Program`, falling back to the bytecode VM on any miss).
//!
//! A script-defined `Function`'s body is never natively compiled; `NodeKind::Function`
//! here is a pure no-op (the bytecode pass already populated the shared
//! `FunctionTable`; `jit::abi::tang_abi_call_value` always re-enters the VM for a
//! script function call, never native-to-native).

use super::{BinOp, CastType, Node, NodeKind, UnaryOp};
use crate::scope::{Binding, ScopeArena};

#[cfg(all(feature = "jit", target_arch = "x86_64"))]
mod x86_64_impl {
    use super::*;
    use crate::jit::abi::*;
    use crate::jit::encode::Condition;
    use crate::jit::{NativeBuilder, Reg};

    fn binary_op_tag(op: BinOp) -> u8 {
        match op {
            BinOp::Add => 0,
            BinOp::Subtract => 1,
            BinOp::Multiply => 2,
            BinOp::Divide => 3,
            BinOp::Modulo => 4,
            BinOp::LessThan => 5,
            BinOp::LessThanEqual => 6,
            BinOp::GreaterThan => 7,
            BinOp::GreaterThanEqual => 8,
            BinOp::Equal => 9,
            BinOp::NotEqual => 10,
            BinOp::And | BinOp::Or => unreachable!("And/Or are short-circuited before reaching binary_op_tag"),
        }
    }

    fn cast_tag(target: CastType) -> u8 {
        match target {
            CastType::Int => 0,
            CastType::Float => 1,
            CastType::Bool => 2,
            CastType::String => 3,
        }
    }

    /// Loads a Rust ABI function's address into `RAX` and makes the aligned call,
    /// leaving its return value (a `*mut Value`) in `RAX` (§4.7: every native-eligible
    /// expression's result lives in `RAX` between sub-expressions).
    fn call_abi(nb: &mut NativeBuilder, fn_addr: usize) {
        nb.load_fn_ptr(Reg::Rax, fn_addr);
        nb.call_external(Reg::Rax);
    }

    /// Truthiness-tests the `*mut Value` currently in `RAX`, leaving a zero/non-zero
    /// flag `test`-ready in `RAX` itself (`tang_abi_truthy` takes the pointer in `RDI`
    /// and returns its `i64` boolean directly, so no separate register is needed).
    fn call_truthy(nb: &mut NativeBuilder) {
        nb.asm.mov_reg_reg(Reg::Rdi, Reg::Rax);
        call_abi(nb, tang_abi_truthy as usize);
    }

    impl Node {
        /// Compiles `self` (the root `Block`, already simplified and analyzed) to
        /// native x86-64 machine code, returning the assembled bytes plus
        /// `(code site, data offset)` relocations for literals embedded in the same
        /// buffer, or `None` if the tree uses a construct with no native form.
        pub fn compile_native_program(&self, arena: &ScopeArena) -> Option<(Vec<u8>, Vec<(usize, usize)>)> {
            let mut asm = crate::jit::encode::Assembler::new();
            let mut cctx = crate::compiler::CompilerContext::new();
            let mut data = Vec::new();
            let mut relocations = Vec::new();

            let epilogue_label = cctx.new_label();
            let previous_return = cctx.enter_function(epilogue_label);

            // Prologue: preserve the caller's R15, then pin it to the context
            // pointer for the whole compiled function (§4.7's calling convention).
            asm.push_reg(Reg::R15);
            asm.mov_reg_reg(Reg::R15, Reg::Rdi);

            let ok = {
                let mut nb = NativeBuilder::new(&mut asm, &mut cctx, &mut data, &mut relocations);
                self.compile_native(&mut nb, arena)
            };
            cctx.exit_function(previous_return);
            if !ok {
                return None;
            }

            {
                let mut nb = NativeBuilder::new(&mut asm, &mut cctx, &mut data, &mut relocations);
                nb.resolve_label(epilogue_label);
            }
            // Epilogue: RAX already holds the result (ours or a `Return`'s, jumped
            // straight here); restore R15 and return to the caller.
            asm.pop_reg(Reg::R15);
            asm.ret();

            let mut code = asm.into_bytes();
            let code_len = code.len();
            let relocations: Vec<(usize, usize)> = relocations.into_iter().map(|(site, offset)| (site, code_len + offset)).collect();
            code.extend_from_slice(&data);
            Some((code, relocations))
        }

        fn compile_native(&self, nb: &mut NativeBuilder, arena: &ScopeArena) -> bool {
            match &self.kind {
                NodeKind::Null => {
                    emit_make_null(nb);
                    true
                }
                NodeKind::Integer(i) => {
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    nb.asm.mov_reg_imm64(Reg::Rsi, *i as u64);
                    call_abi(nb, tang_abi_make_integer as usize);
                    true
                }
                NodeKind::Float(f) => {
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    nb.asm.mov_reg_imm64(Reg::Rsi, f.to_bits());
                    call_abi(nb, tang_abi_make_float as usize);
                    true
                }
                NodeKind::Boolean(b) => {
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    nb.asm.mov_reg_imm64(Reg::Rsi, *b as u64);
                    call_abi(nb, tang_abi_make_boolean as usize);
                    true
                }
                NodeKind::StringLiteral(s) => {
                    emit_make_string(nb, s.as_str().as_bytes());
                    true
                }

                NodeKind::Identifier(info) => {
                    match info.resolved {
                        Some(Binding::Local(offset)) => {
                            nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                            nb.asm.mov_reg_imm64(Reg::Rsi, offset as u64);
                            call_abi(nb, tang_abi_peek_local as usize);
                        }
                        Some(Binding::Global(offset)) => {
                            nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                            nb.asm.mov_reg_imm64(Reg::Rsi, offset as u64);
                            call_abi(nb, tang_abi_peek_global as usize);
                        }
                        Some(Binding::Library) => {
                            let root = arena.root();
                            let name = arena.get(root).library_declarations.get(&info.hash).cloned().unwrap_or_default();
                            nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                            nb.asm.mov_reg_imm64(Reg::Rsi, crate::scope::hash_identifier(&name));
                            call_abi(nb, tang_abi_load_library as usize);
                        }
                        Some(Binding::Function) => {
                            nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                            nb.asm.mov_reg_imm64(Reg::Rsi, info.hash);
                            call_abi(nb, tang_abi_load_function as usize);
                        }
                        None => {
                            emit_make_string(nb, info.name.as_bytes());
                        }
                    }
                    true
                }

                NodeKind::Library { hash, .. } => {
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    nb.asm.mov_reg_imm64(Reg::Rsi, *hash);
                    call_abi(nb, tang_abi_load_library as usize);
                    true
                }

                NodeKind::Array(_) | NodeKind::Map(_) => false,

                NodeKind::Unary { op, operand } => {
                    if !operand.compile_native(nb, arena) {
                        return false;
                    }
                    nb.asm.mov_reg_reg(Reg::Rsi, Reg::Rax);
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    call_abi(
                        nb,
                        match op {
                            UnaryOp::Negate => tang_abi_negate as usize,
                            UnaryOp::Not => tang_abi_logical_not as usize,
                        },
                    );
                    true
                }

                NodeKind::Binary { op: BinOp::And, lhs, rhs } => {
                    if !lhs.compile_native(nb, arena) {
                        return false;
                    }
                    let false_label = nb.ctx.new_label();
                    let end_label = nb.ctx.new_label();
                    call_truthy(nb);
                    nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                    nb.emit_jump(|asm| asm.jcc_rel32(Condition::Zero), false_label);
                    if !rhs.compile_native(nb, arena) {
                        return false;
                    }
                    call_truthy(nb);
                    nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                    nb.emit_jump(|asm| asm.jcc_rel32(Condition::Zero), false_label);
                    emit_make_boolean(nb, true);
                    nb.emit_jump(|asm| asm.jmp_rel32(), end_label);
                    nb.resolve_label(false_label);
                    emit_make_boolean(nb, false);
                    nb.resolve_label(end_label);
                    true
                }

                NodeKind::Binary { op: BinOp::Or, lhs, rhs } => {
                    if !lhs.compile_native(nb, arena) {
                        return false;
                    }
                    let true_label = nb.ctx.new_label();
                    let end_label = nb.ctx.new_label();
                    call_truthy(nb);
                    nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                    nb.emit_jump(|asm| asm.jcc_rel32(Condition::NotZero), true_label);
                    if !rhs.compile_native(nb, arena) {
                        return false;
                    }
                    call_truthy(nb);
                    nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                    nb.emit_jump(|asm| asm.jcc_rel32(Condition::NotZero), true_label);
                    emit_make_boolean(nb, false);
                    nb.emit_jump(|asm| asm.jmp_rel32(), end_label);
                    nb.resolve_label(true_label);
                    emit_make_boolean(nb, true);
                    nb.resolve_label(end_label);
                    true
                }

                NodeKind::Binary { op, lhs, rhs } => {
                    if !lhs.compile_native(nb, arena) {
                        return false;
                    }
                    nb.asm.push_reg(Reg::Rax);
                    if !rhs.compile_native(nb, arena) {
                        return false;
                    }
                    nb.asm.mov_reg_reg(Reg::Rcx, Reg::Rax);
                    nb.asm.pop_reg(Reg::Rdx);
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    nb.asm.mov_reg_imm64(Reg::Rsi, binary_op_tag(*op) as u64);
                    call_abi(nb, tang_abi_binary as usize);
                    true
                }

                NodeKind::Cast { expr, target } => {
                    if !expr.compile_native(nb, arena) {
                        return false;
                    }
                    nb.asm.mov_reg_reg(Reg::Rdx, Reg::Rax);
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    nb.asm.mov_reg_imm64(Reg::Rsi, cast_tag(*target) as u64);
                    call_abi(nb, tang_abi_cast as usize);
                    true
                }

                NodeKind::Ternary { cond, if_true, if_false } => {
                    if !cond.compile_native(nb, arena) {
                        return false;
                    }
                    let else_label = nb.ctx.new_label();
                    let end_label = nb.ctx.new_label();
                    call_truthy(nb);
                    nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                    nb.emit_jump(|asm| asm.jcc_rel32(Condition::Zero), else_label);
                    if !if_true.compile_native(nb, arena) {
                        return false;
                    }
                    nb.emit_jump(|asm| asm.jmp_rel32(), end_label);
                    nb.resolve_label(else_label);
                    if !if_false.compile_native(nb, arena) {
                        return false;
                    }
                    nb.resolve_label(end_label);
                    true
                }

                NodeKind::Index { .. } | NodeKind::Slice { .. } => false,

                NodeKind::Period { receiver, name } => {
                    if !receiver.compile_native(nb, arena) {
                        return false;
                    }
                    nb.asm.push_reg(Reg::Rax);
                    let bytes = name.clone().into_bytes();
                    nb.load_data_ptr(Reg::Rdx, &bytes);
                    nb.asm.mov_reg_imm64(Reg::Rcx, bytes.len() as u64);
                    nb.asm.pop_reg(Reg::Rsi);
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    call_abi(nb, tang_abi_period as usize);
                    true
                }

                NodeKind::FunctionCall { callee, args } => {
                    if !callee.compile_native(nb, arena) {
                        return false;
                    }
                    nb.asm.mov_reg_reg(Reg::R14, Reg::Rax);
                    for arg in args {
                        if !arg.compile_native(nb, arena) {
                            return false;
                        }
                        nb.asm.push_reg(Reg::Rax);
                    }
                    nb.asm.mov_reg_reg(Reg::Rdx, Reg::Rsp);
                    nb.asm.mov_reg_imm64(Reg::Rcx, args.len() as u64);
                    nb.asm.mov_reg_reg(Reg::Rsi, Reg::R14);
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    call_abi(nb, tang_abi_call_value as usize);
                    if !args.is_empty() {
                        nb.asm.add_reg_imm32(Reg::Rsp, 8 * args.len() as i32);
                    }
                    true
                }

                NodeKind::Assign { target, value } => match &target.kind {
                    NodeKind::Identifier(info) => {
                        if !value.compile_native(nb, arena) {
                            return false;
                        }
                        match info.resolved {
                            Some(Binding::Local(offset)) => {
                                nb.asm.mov_reg_reg(Reg::Rdx, Reg::Rax);
                                nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                                nb.asm.mov_reg_imm64(Reg::Rsi, offset as u64);
                                call_abi(nb, tang_abi_poke_local as usize);
                            }
                            Some(Binding::Global(offset)) => {
                                nb.asm.mov_reg_reg(Reg::Rdx, Reg::Rax);
                                nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                                nb.asm.mov_reg_imm64(Reg::Rsi, offset as u64);
                                call_abi(nb, tang_abi_poke_global as usize);
                            }
                            _ => {
                                emit_make_null(nb);
                            }
                        }
                        true
                    }
                    NodeKind::Index { .. } => false,
                    _ => value.compile_native(nb, arena),
                },

                NodeKind::Global { hash, initializer, .. } => {
                    match initializer {
                        Some(n) => {
                            if !n.compile_native(nb, arena) {
                                return false;
                            }
                        }
                        None => emit_make_null(nb),
                    }
                    let root = arena.root();
                    let slot = *arena.get(root).variable_positions.get(hash).expect("global slot assigned by analyze");
                    nb.asm.mov_reg_reg(Reg::Rdx, Reg::Rax);
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    nb.asm.mov_reg_imm64(Reg::Rsi, slot as u64);
                    call_abi(nb, tang_abi_poke_global as usize);
                    true
                }

                NodeKind::Use { library_name, .. } => {
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    nb.asm.mov_reg_imm64(Reg::Rsi, crate::scope::hash_identifier(library_name));
                    call_abi(nb, tang_abi_load_library as usize);
                    true
                }

                NodeKind::IfElse { cond, if_block, else_block } => {
                    if !cond.compile_native(nb, arena) {
                        return false;
                    }
                    let else_label = nb.ctx.new_label();
                    let end_label = nb.ctx.new_label();
                    call_truthy(nb);
                    nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                    nb.emit_jump(|asm| asm.jcc_rel32(Condition::Zero), else_label);
                    if !if_block.compile_native(nb, arena) {
                        return false;
                    }
                    nb.emit_jump(|asm| asm.jmp_rel32(), end_label);
                    nb.resolve_label(else_label);
                    match else_block {
                        Some(e) => {
                            if !e.compile_native(nb, arena) {
                                return false;
                            }
                        }
                        None => emit_make_null(nb),
                    }
                    nb.resolve_label(end_label);
                    true
                }

                NodeKind::While { cond, body } => {
                    let cond_label = nb.ctx.new_label();
                    let end_label = nb.ctx.new_label();
                    nb.ctx.push_loop(end_label, cond_label);
                    nb.resolve_label(cond_label);
                    if !cond.compile_native(nb, arena) {
                        return false;
                    }
                    call_truthy(nb);
                    nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                    nb.emit_jump(|asm| asm.jcc_rel32(Condition::Zero), end_label);
                    if !body.compile_native(nb, arena) {
                        return false;
                    }
                    nb.emit_jump(|asm| asm.jmp_rel32(), cond_label);
                    nb.resolve_label(end_label);
                    nb.ctx.pop_loop();
                    emit_make_null(nb);
                    true
                }

                NodeKind::DoWhile { cond, body } => {
                    let top_label = nb.ctx.new_label();
                    let cond_label = nb.ctx.new_label();
                    let end_label = nb.ctx.new_label();
                    nb.ctx.push_loop(end_label, cond_label);
                    nb.resolve_label(top_label);
                    if !body.compile_native(nb, arena) {
                        return false;
                    }
                    nb.resolve_label(cond_label);
                    if !cond.compile_native(nb, arena) {
                        return false;
                    }
                    call_truthy(nb);
                    nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                    nb.emit_jump(|asm| asm.jcc_rel32(Condition::NotZero), top_label);
                    nb.resolve_label(end_label);
                    nb.ctx.pop_loop();
                    emit_make_null(nb);
                    true
                }

                NodeKind::For { init, cond, step, body } => {
                    if let Some(n) = init {
                        if !n.compile_native(nb, arena) {
                            return false;
                        }
                    }
                    let cond_label = nb.ctx.new_label();
                    let continue_label = nb.ctx.new_label();
                    let end_label = nb.ctx.new_label();
                    nb.ctx.push_loop(end_label, continue_label);
                    nb.resolve_label(cond_label);
                    if let Some(n) = cond {
                        if !n.compile_native(nb, arena) {
                            return false;
                        }
                        call_truthy(nb);
                        nb.asm.test_reg_reg(Reg::Rax, Reg::Rax);
                        nb.emit_jump(|asm| asm.jcc_rel32(Condition::Zero), end_label);
                    }
                    if !body.compile_native(nb, arena) {
                        return false;
                    }
                    nb.resolve_label(continue_label);
                    if let Some(n) = step {
                        if !n.compile_native(nb, arena) {
                            return false;
                        }
                    }
                    nb.emit_jump(|asm| asm.jmp_rel32(), cond_label);
                    nb.resolve_label(end_label);
                    nb.ctx.pop_loop();
                    emit_make_null(nb);
                    true
                }

                NodeKind::RangedFor { .. } => false,

                NodeKind::Break => {
                    let label = nb.ctx.current_break_label().expect("break outside a loop");
                    nb.emit_jump(|asm| asm.jmp_rel32(), label);
                    true
                }

                NodeKind::Continue => {
                    let label = nb.ctx.current_continue_label().expect("continue outside a loop");
                    nb.emit_jump(|asm| asm.jmp_rel32(), label);
                    true
                }

                NodeKind::Return(expr) => {
                    match expr {
                        Some(e) => {
                            if !e.compile_native(nb, arena) {
                                return false;
                            }
                        }
                        None => emit_make_null(nb),
                    }
                    let label = nb.ctx.current_return_label().expect("compile_native_program always enters a function scope");
                    nb.emit_jump(|asm| asm.jmp_rel32(), label);
                    true
                }

                NodeKind::Print(expr) => {
                    if !expr.compile_native(nb, arena) {
                        return false;
                    }
                    nb.asm.mov_reg_reg(Reg::Rsi, Reg::Rax);
                    nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
                    call_abi(nb, tang_abi_print as usize);
                    true
                }

                NodeKind::Block(stmts) => {
                    if stmts.is_empty() {
                        emit_make_null(nb);
                        return true;
                    }
                    for stmt in stmts {
                        if !stmt.compile_native(nb, arena) {
                            return false;
                        }
                    }
                    true
                }

                NodeKind::Function { .. } => {
                    emit_make_null(nb);
                    true
                }

                NodeKind::ParseError(_) => {
                    emit_make_null(nb);
                    true
                }
            }
        }
    }

    fn emit_make_null(nb: &mut NativeBuilder) {
        nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
        call_abi(nb, tang_abi_make_null as usize);
    }

    fn emit_make_boolean(nb: &mut NativeBuilder, v: bool) {
        nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
        nb.asm.mov_reg_imm64(Reg::Rsi, v as u64);
        call_abi(nb, tang_abi_make_boolean as usize);
    }

    fn emit_make_string(nb: &mut NativeBuilder, bytes: &[u8]) {
        nb.asm.mov_reg_reg(Reg::Rdi, Reg::R15);
        nb.load_data_ptr(Reg::Rsi, bytes);
        nb.asm.mov_reg_imm64(Reg::Rdx, bytes.len() as u64);
        call_abi(nb, tang_abi_make_string as usize);
    }
}

/// Native compilation is unavailable off x86-64 or with the `jit` feature disabled;
/// `Program::create` treats a `None` here exactly like a mid-tree unsupported
/// construct and runs the bytecode VM instead (§4.8).
#[cfg(not(all(feature = "jit", target_arch = "x86_64")))]
impl Node {
    pub fn compile_native_program(&self, _arena: &ScopeArena) -> Option<(Vec<u8>, Vec<(usize, usize)>)> {
        None
    }
}

#[cfg(all(test, feature = "jit", target_arch = "x86_64"))]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;

    fn run(source: &str) -> crate::value::Value {
        let mut ast = crate::parser::parse(source);
        let mut vars = crate::ast::VariableMap::new();
        ast.simplify(&mut vars);
        let mut arena = ScopeArena::new();
        ast.analyze_program(&mut arena).expect("analysis should succeed");
        let (code, functions) = ast.compile_bytecode_program(&arena);
        let (native_code, relocations) = ast.compile_native_program(&arena).expect("program should be native-eligible");
        let page = crate::jit::ExecutablePage::with_relocations(&native_code, &relocations).expect("page allocation failed");
        let mut ctx = ExecutionContext::new();
        ctx.link_program(&code, &functions);
        crate::library::register_builtins(&mut ctx);
        let entry: unsafe extern "C" fn(*mut ExecutionContext) -> *mut crate::value::Value = unsafe { std::mem::transmute(page.as_ptr()) };
        let result_ptr = unsafe { entry(&mut ctx as *mut ExecutionContext) };
        unsafe { &*result_ptr }.clone()
    }

    #[test]
    fn arithmetic_runs_natively() {
        let v = run("3 + 4 * 2;");
        assert!(matches!(v.data, crate::value::ValueData::Integer(11)));
    }

    #[test]
    fn if_else_picks_the_true_branch() {
        let v = run("if (1 < 2) { 10 } else { 20 }");
        assert!(matches!(v.data, crate::value::ValueData::Integer(10)));
    }

    #[test]
    fn while_loop_accumulates_a_local() {
        let v = run("i = 0; while (i < 5) { i = i + 1; } i");
        assert!(matches!(v.data, crate::value::ValueData::Integer(5)));
    }

    #[test]
    fn array_literal_is_not_native_eligible() {
        let mut ast = crate::parser::parse("[1, 2, 3]");
        let mut vars = crate::ast::VariableMap::new();
        ast.simplify(&mut vars);
        let mut arena = ScopeArena::new();
        ast.analyze_program(&mut arena).expect("analysis should succeed");
        assert!(ast.compile_native_program(&arena).is_none());
    }

    #[test]
    fn early_return_jumps_past_remaining_statements() {
        let v = run("function f() { return 1; 2; } f();");
        assert!(matches!(v.data, crate::value::ValueData::Integer(1)));
    }
}
