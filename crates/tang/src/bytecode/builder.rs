//! Emission helpers shared by the bytecode compiler. A "label" is an instruction
//! index; jump opcodes carry the index directly (no relative-displacement
//! arithmetic is needed since `Code` is a flat `Vec`, not a packed byte stream).

use super::{Bytecode, Code};
use crate::compiler::{CompilerContext, LabelId};

pub struct CodeBuilder<'a> {
    pub code: &'a mut Code,
    pub ctx: &'a mut CompilerContext,
}

impl<'a> CodeBuilder<'a> {
    pub fn new(code: &'a mut Code, ctx: &'a mut CompilerContext) -> Self {
        Self { code, ctx }
    }

    pub fn here(&self) -> usize {
        self.code.len()
    }

    pub fn emit(&mut self, instr: Bytecode) -> usize {
        let idx = self.here();
        self.code.instructions.push(instr);
        idx
    }

    /// Emits a jump to `label`. If the label is already resolved, the jump's target is
    /// filled in immediately; otherwise a placeholder (`-1`) is emitted and the site is
    /// recorded for `resolve_label` to patch later.
    pub fn emit_jump(&mut self, make: impl FnOnce(i32) -> Bytecode, label: LabelId) -> usize {
        let site = self.here();
        let target = self.ctx.add_label_jump(label, site);
        let instr = match target {
            Some(t) => make(t as i32),
            None => make(-1),
        };
        self.code.instructions.push(instr);
        site
    }

    /// Resolves `label` to the current position, patching every jump site that was
    /// recorded against it while unresolved.
    pub fn resolve_label(&mut self, label: LabelId) {
        let target = self.here();
        let sites = self.ctx.set_label(label, target);
        for site in sites {
            patch_target(&mut self.code.instructions[site], target as i32);
        }
    }
}

fn patch_target(instr: &mut Bytecode, target: i32) {
    match instr {
        Bytecode::Jump(t) | Bytecode::JumpIfFalse(t) | Bytecode::JumpIfTrue(t) => *t = target,
        other => panic!("patch_target called on non-jump instruction {other}"),
    }
}
