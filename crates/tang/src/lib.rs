//! Tang: an embeddable scripting language compiled to a portable bytecode and, on
//! x86-64 hosts, to native machine code via an in-process JIT.
//!
//! This crate is the language execution core described by the specification: the
//! AST with its `simplify`/`analyze` passes, the bytecode and native compilers, the
//! runtime value system, the stack-based VM, and the JIT emission discipline. The
//! lexer/parser is a bundled stand-in (`parser`); a host embedding Tang is free to
//! substitute any parser producing the same [`ast::Node`] shape.

mod ast;
mod bytecode;
mod compiler;
mod context;
mod error;
mod gc;
#[cfg(all(feature = "jit", target_arch = "x86_64"))]
mod jit;
mod library;
mod parser;
mod program;
mod scope;
mod string;
mod value;

pub use ast::{AnalyzeError, Node, NodeKind};
pub use bytecode::VmOutcome;
pub use context::ExecutionContext;
pub use error::{ParseErrorKind, TangError, TangResult};
pub use parser::{parse, parse_template, ParseOutcome};
pub use program::{Flags as ProgramFlags, Language, Program};
pub use string::{StringType, TangString};
pub use value::{ErrorValue, Value};
