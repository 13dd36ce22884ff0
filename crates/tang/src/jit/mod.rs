//! The x86-64 JIT emitter (§4.7).
//!
//! Shares `crate::compiler::CompilerContext`'s label discipline with the bytecode
//! backend: a label here is resolved to a *byte* offset into the growing
//! [`encode::Assembler`] buffer instead of a bytecode cell index, but `add_label_jump`/
//! `set_label` work identically either way.
//!
//! The emitter is deliberately straight-line and spill-heavy (§1 Non-goals:
//! "optimising register allocation in the JIT" is out of scope) — every intermediate
//! value that needs to survive a call is pushed to the native stack and popped back,
//! never kept live across a call in a register the callee might clobber.
//!
//! Code generation itself lives on `Node::compile_native` (`crate::ast::compile_native`);
//! this module owns the instruction encoder ([`encode`]), the Value-Kernel ABI bridge
//! functions native code calls into ([`abi`]), and executable page acquisition
//! ([`page`]).

pub mod abi;
pub mod encode;
mod page;

pub use encode::{Assembler, Reg};
pub use page::ExecutablePage;

use crate::compiler::{CompilerContext, LabelId};

/// Emission helpers shared by the native compiler, mirroring `bytecode::CodeBuilder`
/// but patching relative 32-bit jump displacements instead of absolute cell indices.
///
/// Every `jmp rel32`/`jcc rel32` the encoder emits is a fixed 4-byte displacement
/// occupying the instruction's last 4 bytes, so the displacement site's "instruction
/// end" is always `site + 4` — no separate bookkeeping is needed the way a
/// variable-length encoding would require.
pub struct NativeBuilder<'a> {
    pub asm: &'a mut Assembler,
    pub ctx: &'a mut CompilerContext,
    /// String literal bytes collected during emission, appended after the code
    /// once the whole function is assembled (§4.7: embedded constant data shares
    /// the function's executable page rather than a separate rodata mapping).
    pub data: &'a mut Vec<u8>,
    /// `(code site of the mov's 8-byte immediate, offset into `data`)`, patched to
    /// the data's final absolute address once the page is mapped.
    pub data_relocations: &'a mut Vec<(usize, usize)>,
}

impl<'a> NativeBuilder<'a> {
    pub fn new(asm: &'a mut Assembler, ctx: &'a mut CompilerContext, data: &'a mut Vec<u8>, data_relocations: &'a mut Vec<(usize, usize)>) -> Self {
        Self { asm, ctx, data, data_relocations }
    }

    pub fn here(&self) -> usize {
        self.asm.len()
    }

    /// Loads the absolute address of `bytes` (copied into the shared data segment)
    /// into `dst`, recording a relocation for `Program`'s link step to patch once
    /// the final page address is known.
    pub fn load_data_ptr(&mut self, dst: Reg, bytes: &[u8]) {
        let data_offset = self.data.len();
        self.data.extend_from_slice(bytes);
        let site = self.asm.mov_reg_imm64(dst, 0);
        self.data_relocations.push((site, data_offset));
    }

    /// Loads a Rust function's already-resolved runtime address into `dst`. Unlike
    /// data literals, a function pointer from this same binary is valid the moment
    /// it's taken — no relocation needed, even though ASLR may have relocated the
    /// binary itself, because `fn_addr` is read *after* that relocation already
    /// happened (§4.7: "the JIT never needs its own linker for code it calls into").
    pub fn load_fn_ptr(&mut self, dst: Reg, fn_addr: usize) {
        self.asm.mov_reg_imm64(dst, fn_addr as u64);
    }

    /// Emits a relative jump to `label`. `emit_rel32` appends the opcode plus a
    /// 4-byte placeholder displacement and returns the buffer offset of that
    /// displacement; if `label` is already resolved the displacement is filled in
    /// immediately, otherwise the site is recorded for `resolve_label` to patch.
    pub fn emit_jump(&mut self, emit_rel32: impl FnOnce(&mut Assembler) -> usize, label: LabelId) {
        let disp_site = emit_rel32(self.asm);
        let instr_end = disp_site + 4;
        if let Some(target) = self.ctx.add_label_jump(label, disp_site) {
            self.asm.patch_rel32(disp_site, target as i64 - instr_end as i64);
        }
    }

    /// Resolves `label` to the current position, patching every jump site recorded
    /// against it while unresolved.
    pub fn resolve_label(&mut self, label: LabelId) {
        let target = self.here();
        for site in self.ctx.set_label(label, target) {
            let instr_end = site + 4;
            self.asm.patch_rel32(site, target as i64 - instr_end as i64);
        }
    }
}
