//! Bytecode compiler and VM (§4.3, §4.6).
//!
//! Code generation itself lives on `Node` as `compile_bytecode` (see
//! `ast::compile_bytecode`), which calls into [`CodeBuilder`] for emission and label
//! patching; this module owns the instruction set, the compiled unit, and the stack
//! machine that executes it.

mod builder;
mod code;
mod op;
mod vm;

pub use builder::CodeBuilder;
pub use code::Code;
pub use op::{Bytecode, CastKind};
pub use vm::{Vm, VmOutcome};
