//! Host-facing errors for the compile pipeline and context setup.
//!
//! These are distinct from in-language runtime errors (see [`crate::value::Value::Error`]),
//! which are first-class `Value`s that propagate through script execution and never
//! surface as a Rust `Result::Err`. `TangError` covers the things that happen *around*
//! a script: the parser failing to build an AST, the JIT failing to mmap an executable
//! page, or a host embedder misusing the API.

use std::fmt;

use crate::ast::Node;

/// Errors produced by the host-facing compile/execute pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TangError {
    /// The parser could not produce a usable AST; carries the `ParseError` node it
    /// would otherwise have returned, per §6.2/§7 of the specification.
    #[error("parse error: {0}")]
    Parse(ParseErrorKind),

    /// Semantic analysis rejected the program (redeclaration, misplaced `use`/`global`).
    #[error("semantic error: {0}")]
    Semantic(ParseErrorKind),

    /// The host allocator failed while building the Program (AST, bytecode, or the
    /// JIT's executable page).
    #[error("out of memory")]
    OutOfMemory,

    /// Creating an `ExecutionContext` failed (e.g. the evaluation stack could not be
    /// reserved).
    #[error("failed to create execution context")]
    ContextCreation,

    /// The JIT could not allocate or protect an executable page on this host.
    #[error("failed to allocate executable memory: {0}")]
    JitPageAllocation(String),

    /// A script ran but raised a runtime value error that the embedder chose to
    /// surface as a Rust error (e.g. via a convenience `run_to_string` helper).
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Mirrors the AST's `ParseError` singleton set (§3.3), as a plain Rust value so it
/// can travel inside a `TangError` without requiring an `Node` arena reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    OutOfMemory,
    FunctionRedeclared(String),
    IdentifierRedeclared(String),
    GlobalIdentifierRedeclared(String),
    MisplacedUse,
    MisplacedGlobal,
    Message(String),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::FunctionRedeclared(name) => write!(f, "function '{name}' redeclared"),
            Self::IdentifierRedeclared(name) => write!(f, "identifier '{name}' redeclared"),
            Self::GlobalIdentifierRedeclared(name) => write!(f, "global identifier '{name}' redeclared"),
            Self::MisplacedUse => write!(f, "'use' may only appear in the root scope"),
            Self::MisplacedGlobal => write!(f, "'global' may only appear in the root scope"),
            Self::Message(m) => write!(f, "{m}"),
        }
    }
}

impl ParseErrorKind {
    /// Converts a parse error into the AST singleton form used by `simplify`/`analyze`.
    pub fn into_node(self) -> Node {
        Node::parse_error(self)
    }
}

pub type TangResult<T> = Result<T, TangError>;
