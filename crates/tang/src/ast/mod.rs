//! The Abstract Syntax Tree (§3.3, §4.2).
//!
//! Every node carries a location, a `possible_type` hint used by `simplify`'s
//! constant folding, and an `is_singleton` flag for the shared `ParseError`
//! singletons. Dispatch for `simplify`/`analyze`/`walk`/`compile_to_bytecode`/
//! `compile_to_native` lives in sibling modules as `impl Node` blocks — a `match`
//! over `NodeKind` rather than a literal per-node operation-table struct, the same
//! idiom used for the Value Kernel (see `value/mod.rs`'s module doc).

mod analyze;
mod compile_bytecode;
mod compile_native;
mod simplify;
mod walk;

pub use analyze::AnalyzeError;
pub use simplify::VariableMap;

use crate::error::ParseErrorKind;
use crate::scope::ScopeId;
use crate::string::TangString;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub line_start: u32,
    pub col_start: u32,
    pub line_end: u32,
    pub col_end: u32,
}

/// The type hint carried by every node (§3.3), refined by `simplify`/`analyze` and
/// consumed by the compiler to pick a specialized opcode where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PossibleType {
    #[default]
    Unknown,
    Null,
    Boolean,
    Integer,
    Float,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Int,
    Float,
    Bool,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierInfo {
    pub name: String,
    pub hash: u64,
    /// Filled in by `analyze` the first time this identifier occurs in a scope.
    pub resolved: Option<crate::scope::Binding>,
    /// `parent-path + "/" + local-name`; owned by the enclosing function's scope's
    /// `allocated_mangled_names`, not by this node (§3.3 invariant) — this field is
    /// only a cached copy of that string for the compiler's convenience.
    pub mangled_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MapEntry {
    pub key: String,
    pub value: Node,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    StringLiteral(TangString),
    Identifier(IdentifierInfo),
    Library { name: String, hash: u64 },
    Array(Vec<Node>),
    Map(Vec<MapEntry>),
    Unary { op: UnaryOp, operand: Box<Node> },
    Binary { op: BinOp, lhs: Box<Node>, rhs: Box<Node> },
    Cast { expr: Box<Node>, target: CastType },
    Ternary { cond: Box<Node>, if_true: Box<Node>, if_false: Box<Node> },
    Index { receiver: Box<Node>, index: Box<Node> },
    Period { receiver: Box<Node>, name: String },
    Slice { receiver: Box<Node>, start: Option<Box<Node>>, end: Option<Box<Node>>, skip: Option<Box<Node>> },
    FunctionCall { callee: Box<Node>, args: Vec<Node> },
    Assign { target: Box<Node>, value: Box<Node> },
    Global { name: String, hash: u64, initializer: Option<Box<Node>> },
    Use { identifier: String, library_name: String },
    IfElse { cond: Box<Node>, if_block: Box<Node>, else_block: Option<Box<Node>> },
    While { cond: Box<Node>, body: Box<Node> },
    DoWhile { cond: Box<Node>, body: Box<Node> },
    For { init: Option<Box<Node>>, cond: Option<Box<Node>>, step: Option<Box<Node>>, body: Box<Node> },
    RangedFor {
        var_name: String,
        var_hash: u64,
        /// The loop variable's local slot, filled in by `analyze`.
        var_slot: Option<u16>,
        iterable: Box<Node>,
        body: Box<Node>,
    },
    Break,
    Continue,
    Return(Option<Box<Node>>),
    Print(Box<Node>),
    Block(Vec<Node>),
    Function {
        name: String,
        params: Vec<String>,
        body: Vec<Node>,
        /// Populated by `analyze`.
        scope: Option<ScopeId>,
    },
    ParseError(ParseErrorKind),
}

#[derive(Debug, Clone, Default)]
pub struct NodeMeta {
    pub location: Location,
    pub possible_type: PossibleType,
    pub is_singleton: bool,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub meta: NodeMeta,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        let possible_type = match &kind {
            NodeKind::Null => PossibleType::Null,
            NodeKind::Integer(_) => PossibleType::Integer,
            NodeKind::Float(_) => PossibleType::Float,
            NodeKind::Boolean(_) => PossibleType::Boolean,
            NodeKind::StringLiteral(_) => PossibleType::String,
            _ => PossibleType::Unknown,
        };
        Self {
            kind,
            meta: NodeMeta {
                possible_type,
                ..Default::default()
            },
        }
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.meta.location = location;
        self
    }

    pub fn parse_error(kind: ParseErrorKind) -> Self {
        Self {
            kind: NodeKind::ParseError(kind),
            meta: NodeMeta {
                is_singleton: true,
                ..Default::default()
            },
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self.kind, NodeKind::ParseError(_))
    }

    /// A node is a literal (for the purposes of constant folding / the variable map)
    /// when it is one of the scalar literal kinds.
    pub fn as_literal(&self) -> Option<&NodeKind> {
        match &self.kind {
            k @ (NodeKind::Null | NodeKind::Integer(_) | NodeKind::Float(_) | NodeKind::Boolean(_) | NodeKind::StringLiteral(_)) => Some(k),
            _ => None,
        }
    }
}
