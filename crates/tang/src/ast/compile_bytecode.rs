//! Bytecode code generation (§4.5): each `NodeKind` arm emits the instruction
//! sequence documented there, sharing `CompilerContext`'s label-patching discipline
//! with the native backend (`compile_native`).
//!
//! A statement always leaves exactly one value on the stack; a `Block` pops every
//! statement's value except the last, so its own result is whatever its last
//! statement produced (or `null` for an empty block) — the same convention the
//! teacher's `compiler.rs` uses for expression-statement popping.

use super::{BinOp, CastType, Node, NodeKind, UnaryOp};
use crate::bytecode::{Bytecode, CastKind, CodeBuilder};
use crate::program::FunctionTable;
use crate::scope::{Binding, ScopeArena};
use crate::string::{StringType, TangString};
use crate::value::FunctionObject;

fn bin_op_to_bytecode(op: BinOp) -> Option<Bytecode> {
    Some(match op {
        BinOp::Add => Bytecode::Add,
        BinOp::Subtract => Bytecode::Subtract,
        BinOp::Multiply => Bytecode::Multiply,
        BinOp::Divide => Bytecode::Divide,
        BinOp::Modulo => Bytecode::Modulo,
        BinOp::LessThan => Bytecode::LessThan,
        BinOp::LessThanEqual => Bytecode::LessThanEqual,
        BinOp::GreaterThan => Bytecode::GreaterThan,
        BinOp::GreaterThanEqual => Bytecode::GreaterThanEqual,
        BinOp::Equal => Bytecode::Equal,
        BinOp::NotEqual => Bytecode::NotEqual,
        BinOp::And | BinOp::Or => return None,
    })
}

fn cast_to_bytecode(target: CastType) -> CastKind {
    match target {
        CastType::Int => CastKind::Int,
        CastType::Float => CastKind::Float,
        CastType::Bool => CastKind::Bool,
        CastType::String => CastKind::String,
    }
}

impl Node {
    /// Compiles `self` (the root `Block`, already simplified and analyzed) into a
    /// fresh `Code` unit plus its function table.
    pub fn compile_bytecode_program(&self, arena: &ScopeArena) -> (crate::bytecode::Code, FunctionTable) {
        let mut code = crate::bytecode::Code::new();
        let mut ctx = crate::compiler::CompilerContext::new();
        let mut functions = FunctionTable::default();
        {
            let mut b = CodeBuilder::new(&mut code, &mut ctx);
            self.compile_bytecode(&mut b, &mut functions, arena);
        }
        code.instructions.push(Bytecode::Halt);
        (code, functions)
    }

    fn compile_bytecode(&self, b: &mut CodeBuilder, functions: &mut FunctionTable, arena: &ScopeArena) {
        match &self.kind {
            NodeKind::Null => {
                b.emit(Bytecode::PushNull);
            }
            NodeKind::Integer(i) => {
                b.emit(Bytecode::PushInteger(*i));
            }
            NodeKind::Float(f) => {
                b.emit(Bytecode::PushFloat(*f));
            }
            NodeKind::Boolean(v) => {
                b.emit(Bytecode::PushBoolean(*v));
            }
            NodeKind::StringLiteral(s) => {
                let idx = b.code.intern(s.clone());
                b.emit(Bytecode::PushString(idx));
            }
            NodeKind::Identifier(info) => match info.resolved {
                Some(Binding::Local(offset)) => {
                    b.emit(Bytecode::PeekLocal(offset));
                }
                Some(Binding::Global(offset)) => {
                    b.emit(Bytecode::PeekGlobal(offset));
                }
                Some(Binding::Library) => {
                    let root = arena.root();
                    let name = arena
                        .get(root)
                        .library_declarations
                        .get(&info.hash)
                        .cloned()
                        .unwrap_or_default();
                    b.emit(Bytecode::LoadLibrary(crate::scope::hash_identifier(&name)));
                }
                Some(Binding::Function) => {
                    b.emit(Bytecode::LoadFunction(info.hash));
                }
                None => {
                    // Unreachable after a successful `analyze`; fall back to a
                    // runtime error rather than panicking on a malformed tree.
                    let idx = b.code.intern(TangString::new(info.name.clone(), StringType::Trusted));
                    b.emit(Bytecode::PushString(idx));
                }
            },

            NodeKind::Library { hash, .. } => {
                b.emit(Bytecode::LoadLibrary(*hash));
            }

            NodeKind::Array(items) => {
                for item in items {
                    item.compile_bytecode(b, functions, arena);
                }
                b.emit(Bytecode::MakeArray(items.len() as u16));
            }

            NodeKind::Map(entries) => {
                for entry in entries {
                    let idx = b.code.intern(TangString::new(entry.key.clone(), StringType::Trusted));
                    b.emit(Bytecode::PushString(idx));
                    entry.value.compile_bytecode(b, functions, arena);
                }
                b.emit(Bytecode::MakeMap(entries.len() as u16));
            }

            NodeKind::Unary { op, operand } => {
                operand.compile_bytecode(b, functions, arena);
                b.emit(match op {
                    UnaryOp::Negate => Bytecode::Negate,
                    UnaryOp::Not => Bytecode::Not,
                });
            }

            NodeKind::Binary { op: BinOp::And, lhs, rhs } => {
                let false_label = b.ctx.new_label();
                let end_label = b.ctx.new_label();
                lhs.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::JumpIfFalse, false_label);
                rhs.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::JumpIfFalse, false_label);
                b.emit(Bytecode::PushBoolean(true));
                b.emit_jump(Bytecode::Jump, end_label);
                b.resolve_label(false_label);
                b.emit(Bytecode::PushBoolean(false));
                b.resolve_label(end_label);
            }

            NodeKind::Binary { op: BinOp::Or, lhs, rhs } => {
                let true_label = b.ctx.new_label();
                let end_label = b.ctx.new_label();
                lhs.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::JumpIfTrue, true_label);
                rhs.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::JumpIfTrue, true_label);
                b.emit(Bytecode::PushBoolean(false));
                b.emit_jump(Bytecode::Jump, end_label);
                b.resolve_label(true_label);
                b.emit(Bytecode::PushBoolean(true));
                b.resolve_label(end_label);
            }

            NodeKind::Binary { op, lhs, rhs } => {
                lhs.compile_bytecode(b, functions, arena);
                rhs.compile_bytecode(b, functions, arena);
                b.emit(bin_op_to_bytecode(*op).expect("and/or handled above"));
            }

            NodeKind::Cast { expr, target } => {
                expr.compile_bytecode(b, functions, arena);
                b.emit(Bytecode::Cast(cast_to_bytecode(*target)));
            }

            NodeKind::Ternary { cond, if_true, if_false } => {
                let else_label = b.ctx.new_label();
                let end_label = b.ctx.new_label();
                cond.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::JumpIfFalse, else_label);
                if_true.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::Jump, end_label);
                b.resolve_label(else_label);
                if_false.compile_bytecode(b, functions, arena);
                b.resolve_label(end_label);
            }

            NodeKind::Index { receiver, index } => {
                receiver.compile_bytecode(b, functions, arena);
                index.compile_bytecode(b, functions, arena);
                b.emit(Bytecode::IndexGet);
            }

            NodeKind::Period { receiver, name } => {
                receiver.compile_bytecode(b, functions, arena);
                let idx = b.code.intern(TangString::new(name.clone(), StringType::Trusted));
                b.emit(Bytecode::Period(idx));
            }

            NodeKind::Slice { receiver, start, end, skip } => {
                receiver.compile_bytecode(b, functions, arena);
                match start {
                    Some(n) => n.compile_bytecode(b, functions, arena),
                    None => {
                        b.emit(Bytecode::PushInteger(0));
                    }
                }
                match end {
                    Some(n) => n.compile_bytecode(b, functions, arena),
                    None => {
                        b.emit(Bytecode::PushNull);
                    }
                }
                match skip {
                    Some(n) => n.compile_bytecode(b, functions, arena),
                    None => {
                        b.emit(Bytecode::PushInteger(1));
                    }
                }
                b.emit(Bytecode::Slice);
            }

            NodeKind::FunctionCall { callee, args } => {
                callee.compile_bytecode(b, functions, arena);
                for arg in args {
                    arg.compile_bytecode(b, functions, arena);
                }
                b.emit(Bytecode::Call(args.len() as u16));
            }

            NodeKind::Assign { target, value } => match &target.kind {
                NodeKind::Identifier(info) => {
                    value.compile_bytecode(b, functions, arena);
                    match info.resolved {
                        Some(Binding::Local(offset)) => {
                            b.emit(Bytecode::PokeLocal(offset));
                        }
                        Some(Binding::Global(offset)) => {
                            b.emit(Bytecode::PokeGlobal(offset));
                        }
                        _ => {
                            // A function or library name isn't assignable;
                            // `analyze` never produces this shape, but degrade to a
                            // no-op write rather than panicking.
                            b.emit(Bytecode::Pop);
                            b.emit(Bytecode::PushNull);
                        }
                    }
                }
                NodeKind::Index { receiver, index } => {
                    receiver.compile_bytecode(b, functions, arena);
                    index.compile_bytecode(b, functions, arena);
                    value.compile_bytecode(b, functions, arena);
                    b.emit(Bytecode::IndexSet);
                }
                _ => {
                    value.compile_bytecode(b, functions, arena);
                }
            },

            NodeKind::Global { hash, initializer, .. } => {
                match initializer {
                    Some(n) => n.compile_bytecode(b, functions, arena),
                    None => {
                        b.emit(Bytecode::PushNull);
                    }
                }
                let root = arena.root();
                let slot = *arena.get(root).variable_positions.get(hash).expect("global slot assigned by analyze");
                b.emit(Bytecode::PokeGlobal(slot));
            }

            NodeKind::Use { library_name, .. } => {
                b.emit(Bytecode::LoadLibrary(crate::scope::hash_identifier(library_name)));
            }

            NodeKind::IfElse { cond, if_block, else_block } => {
                let else_label = b.ctx.new_label();
                let end_label = b.ctx.new_label();
                cond.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::JumpIfFalse, else_label);
                if_block.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::Jump, end_label);
                b.resolve_label(else_label);
                match else_block {
                    Some(e) => e.compile_bytecode(b, functions, arena),
                    None => {
                        b.emit(Bytecode::PushNull);
                    }
                }
                b.resolve_label(end_label);
            }

            NodeKind::While { cond, body } => {
                let cond_label = b.ctx.new_label();
                let end_label = b.ctx.new_label();
                b.ctx.push_loop(end_label, cond_label);
                b.resolve_label(cond_label);
                cond.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::JumpIfFalse, end_label);
                body.compile_bytecode(b, functions, arena);
                b.emit(Bytecode::Pop);
                b.emit_jump(Bytecode::Jump, cond_label);
                b.resolve_label(end_label);
                b.ctx.pop_loop();
                b.emit(Bytecode::PushNull);
            }

            NodeKind::DoWhile { cond, body } => {
                let top_label = b.ctx.new_label();
                let cond_label = b.ctx.new_label();
                let end_label = b.ctx.new_label();
                b.ctx.push_loop(end_label, cond_label);
                b.resolve_label(top_label);
                body.compile_bytecode(b, functions, arena);
                b.emit(Bytecode::Pop);
                b.resolve_label(cond_label);
                cond.compile_bytecode(b, functions, arena);
                b.emit_jump(Bytecode::JumpIfTrue, top_label);
                b.resolve_label(end_label);
                b.ctx.pop_loop();
                b.emit(Bytecode::PushNull);
            }

            NodeKind::For { init, cond, step, body } => {
                if let Some(n) = init {
                    n.compile_bytecode(b, functions, arena);
                    b.emit(Bytecode::Pop);
                }
                let cond_label = b.ctx.new_label();
                let continue_label = b.ctx.new_label();
                let end_label = b.ctx.new_label();
                b.ctx.push_loop(end_label, continue_label);
                b.resolve_label(cond_label);
                match cond {
                    Some(n) => n.compile_bytecode(b, functions, arena),
                    None => {
                        b.emit(Bytecode::PushBoolean(true));
                    }
                }
                b.emit_jump(Bytecode::JumpIfFalse, end_label);
                body.compile_bytecode(b, functions, arena);
                b.emit(Bytecode::Pop);
                b.resolve_label(continue_label);
                if let Some(n) = step {
                    n.compile_bytecode(b, functions, arena);
                    b.emit(Bytecode::Pop);
                }
                b.emit_jump(Bytecode::Jump, cond_label);
                b.resolve_label(end_label);
                b.ctx.pop_loop();
                b.emit(Bytecode::PushNull);
            }

            NodeKind::RangedFor { var_slot, iterable, body, .. } => {
                iterable.compile_bytecode(b, functions, arena);
                b.emit(Bytecode::IteratorGet);
                let top_label = b.ctx.new_label();
                // `exhausted_label` and `break_label` both run after the iterator
                // is spent, but `break` (jumping straight from inside `body`) only
                // ever leaves the iterator itself on the stack, one item short of
                // where the natural IteratorNext-exhausted path lands (which still
                // has the stale `value` half of the `(value, has_more)` pair on top).
                // `exhausted_label` pops that extra item and falls straight through
                // into `break_label`'s shared cleanup, so both paths reach the
                // `Pop`/`PushNull` below at the same stack depth.
                let exhausted_label = b.ctx.new_label();
                let break_label = b.ctx.new_label();
                b.ctx.push_loop(break_label, top_label);
                b.resolve_label(top_label);
                b.emit(Bytecode::IteratorNext);
                b.emit_jump(Bytecode::JumpIfFalse, exhausted_label);
                let slot = var_slot.expect("analyze assigns every RangedFor a local slot");
                b.emit(Bytecode::PokeLocal(slot));
                b.emit(Bytecode::Pop);
                body.compile_bytecode(b, functions, arena);
                b.emit(Bytecode::Pop);
                b.emit_jump(Bytecode::Jump, top_label);
                b.resolve_label(exhausted_label);
                b.emit(Bytecode::Pop);
                b.resolve_label(break_label);
                b.emit(Bytecode::Pop);
                b.ctx.pop_loop();
                b.emit(Bytecode::PushNull);
            }

            NodeKind::Break => {
                let label = b.ctx.current_break_label().expect("break outside a loop");
                b.emit_jump(Bytecode::Jump, label);
            }

            NodeKind::Continue => {
                let label = b.ctx.current_continue_label().expect("continue outside a loop");
                b.emit_jump(Bytecode::Jump, label);
            }

            NodeKind::Return(expr) => {
                match expr {
                    Some(e) => e.compile_bytecode(b, functions, arena),
                    None => {
                        b.emit(Bytecode::PushNull);
                    }
                }
                b.emit(Bytecode::Return);
            }

            NodeKind::Print(expr) => {
                expr.compile_bytecode(b, functions, arena);
                b.emit(Bytecode::Print);
            }

            NodeKind::Block(stmts) => {
                compile_statements(stmts, b, functions, arena);
            }

            NodeKind::Function { name, params, body, .. } => {
                let after_label = b.ctx.new_label();
                b.emit_jump(Bytecode::Jump, after_label);
                let entry = b.here();
                let return_label = b.ctx.new_label();
                let previous_return = b.ctx.enter_function(return_label);
                compile_statements(body, b, functions, arena);
                b.emit(Bytecode::Return);
                b.ctx.exit_function(previous_return);
                b.resolve_label(after_label);
                b.emit(Bytecode::PushNull);

                functions.insert(
                    crate::scope::hash_identifier(name),
                    FunctionObject {
                        name: name.clone(),
                        arity: params.len(),
                        bytecode_entry: entry,
                    },
                );
            }

            NodeKind::ParseError(_) => {
                b.emit(Bytecode::PushNull);
            }
        }
    }
}

/// Compiles a statement list, popping every value except the last's (the block's
/// own result). An empty list produces `null`.
fn compile_statements(stmts: &[Node], b: &mut CodeBuilder, functions: &mut FunctionTable, arena: &ScopeArena) {
    if stmts.is_empty() {
        b.emit(Bytecode::PushNull);
        return;
    }
    for (i, stmt) in stmts.iter().enumerate() {
        stmt.compile_bytecode(b, functions, arena);
        if i + 1 != stmts.len() {
            b.emit(Bytecode::Pop);
        }
    }
}
