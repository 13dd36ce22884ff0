//! Compiler Context (§4.4): the label-patching discipline shared by both code
//! generation backends — the bytecode compiler (`crate::bytecode::compiler`) and the
//! native JIT emitter (`crate::jit::emit`) each hold one and call the same methods,
//! which is why jump-target resolution lives here instead of in either backend.
//!
//! Grounded on `examples/original_source/include/tang/program/compilerContext.h`:
//! a label is allocated before its target offset is known (e.g. the jump past an
//! `if`'s else-branch), every jump site referencing it is recorded in `labels_from`,
//! and `set_label` later hands back every recorded site so the backend can patch in
//! the now-known absolute offset.

mod context;

pub use context::{CompilerContext, LabelId};
